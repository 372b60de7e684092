//! Name similarity between a Terraform name and a CloudFormation logical id

use std::collections::HashSet;

/// Score for normalized names where one contains the other.
const CONTAINMENT_SCORE: f64 = 0.8;

/// Score how likely `source_name` and `logical_id` name the same resource.
///
/// Always in `[0, 1]`:
/// - `1.0` when both are equal after dropping `-`/`_` and lower-casing
/// - `0.8` when one normalized form contains the other
/// - otherwise shared words over the larger word set, `0.0` if none are shared
pub fn name_similarity(source_name: &str, logical_id: &str) -> f64 {
    let source_norm = normalize(source_name);
    let target_norm = normalize(logical_id);

    if source_norm == target_norm {
        return 1.0;
    }
    if source_norm.contains(&target_norm) || target_norm.contains(&source_norm) {
        return CONTAINMENT_SCORE;
    }

    let source_words = separator_words(source_name);
    let target_words = case_words(logical_id);
    let shared = source_words.intersection(&target_words).count();
    if shared == 0 {
        return 0.0;
    }
    shared as f64 / source_words.len().max(target_words.len()) as f64
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '-' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// `keycloak-db_proxy` → {keycloak, db, proxy}. Empty segments from doubled or
/// edge separators count as a word.
fn separator_words(name: &str) -> HashSet<String> {
    name.to_lowercase()
        .split(['-', '_'])
        .map(str::to_string)
        .collect()
}

/// `KeycloakDBProxy` → {keycloak, d, b, proxy}
///
/// Every ASCII capital starts a new word.
fn case_words(id: &str) -> HashSet<String> {
    let mut words = HashSet::new();
    let mut current = String::new();
    for c in id.chars() {
        if c.is_ascii_uppercase() && !current.is_empty() {
            words.insert(std::mem::take(&mut current).to_lowercase());
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.insert(current.to_lowercase());
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_normalized_match() {
        assert_eq!(name_similarity("main_vpc", "MainVpc"), 1.0);
        assert_eq!(name_similarity("vpc", "VPC"), 1.0);
    }

    #[test]
    fn test_containment() {
        assert_eq!(name_similarity("registry", "RegistryService"), 0.8);
        assert_eq!(name_similarity("main-ecs-cluster", "Cluster"), 0.8);
    }

    #[test]
    fn test_word_overlap() {
        // {keycloak, db, proxy} vs {keycloak, proxy, role}
        let score = name_similarity("keycloak-db-proxy", "KeycloakProxyRole");
        assert!((score - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_disjoint_words() {
        assert_eq!(name_similarity("alpha", "BetaGamma"), 0.0);
    }

    #[test]
    fn test_bounds() {
        let pairs = [
            ("a", "A"),
            ("", "Anything"),
            ("x_y_z", "XYZ"),
            ("one-two-three-four", "TwoFiveSix"),
            ("__", "Id"),
        ];
        for (source, target) in pairs {
            let score = name_similarity(source, target);
            assert!((0.0..=1.0).contains(&score), "{source} vs {target}: {score}");
        }
    }

    #[test]
    fn test_case_words_split_before_every_capital() {
        let words = case_words("KeycloakDBProxy");
        let expected: HashSet<String> = ["keycloak", "d", "b", "proxy"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(words, expected);

        let words = case_words("PrivateSubnet1");
        assert!(words.contains("private"));
        assert!(words.contains("subnet1"));
    }

    #[test]
    fn test_acronym_does_not_overlap_lowercase_word() {
        assert_eq!(name_similarity("db-main", "DBSecret"), 0.0);
    }

    #[test]
    fn test_empty_separator_segment_counts() {
        // {app, "", proxy} vs {app, role}
        let score = name_similarity("app--proxy", "AppRole");
        assert!((score - 1.0 / 3.0).abs() < 1e-9);
    }
}
