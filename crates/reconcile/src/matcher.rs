//! Three-phase matching of Terraform resources against CloudFormation.
//!
//! For each Terraform resource the first phase that applies decides:
//!
//! 1. **Skip**: address matches a skip pattern, or the type maps to SKIP.
//! 2. **Explicit mapping**: unknown types go straight to `source_only`;
//!    otherwise an operator mapping to an available logical id matches at 1.0.
//! 3. **Similarity**: best-scoring available candidate of the mapped type,
//!    strictly above [`SIMILARITY_THRESHOLD`].
//!
//! Matching is greedy: a consumed target is gone for every later resource.
//! The candidate pool is ordered by logical id so ties and outcomes are
//! reproducible across runs.

use crate::mappings::MappingConfig;
use crate::similarity::name_similarity;
use crate::type_map::MappedType;
use crate::types::{Match, MatchResult, SourceResource, TargetResource};
use std::collections::HashMap;

/// Minimum (exclusive) name similarity for a fallback match.
pub const SIMILARITY_THRESHOLD: f64 = 0.3;

/// Confidence recorded for operator mappings.
pub const MAPPED_CONFIDENCE: f64 = 1.0;

/// Available targets, ordered by logical id.
struct TargetPool {
    targets: Vec<Option<TargetResource>>,
    by_id: HashMap<String, usize>,
}

impl TargetPool {
    fn new(mut targets: Vec<TargetResource>) -> Self {
        targets.sort_by(|a, b| a.logical_id.cmp(&b.logical_id));
        let by_id = targets
            .iter()
            .enumerate()
            .map(|(i, t)| (t.logical_id.clone(), i))
            .collect();
        Self {
            targets: targets.into_iter().map(Some).collect(),
            by_id,
        }
    }

    /// Remove and return the target with this logical id, if still available.
    fn take_by_id(&mut self, logical_id: &str) -> Option<TargetResource> {
        let index = *self.by_id.get(logical_id)?;
        self.targets[index].take()
    }

    /// Best available candidate of `target_type`, first in pool order on ties.
    fn take_best(&mut self, name: &str, target_type: &str) -> Option<(TargetResource, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for (index, target) in self.targets.iter().enumerate() {
            let Some(target) = target else { continue };
            if target.resource_type != target_type {
                continue;
            }
            let score = name_similarity(name, &target.logical_id);
            if score > SIMILARITY_THRESHOLD && best.is_none_or(|(_, top)| score > top) {
                best = Some((index, score));
            }
        }

        let (index, score) = best?;
        self.targets[index].take().map(|target| (target, score))
    }

    fn into_remaining(self) -> Vec<TargetResource> {
        self.targets.into_iter().flatten().collect()
    }
}

/// Partition Terraform and CloudFormation resources.
///
/// Terraform resources are processed in the order given; the result buckets
/// keep that order. Unconsumed targets come back ordered by logical id.
pub fn match_resources(
    sources: Vec<SourceResource>,
    targets: Vec<TargetResource>,
    config: &MappingConfig,
) -> MatchResult {
    let mut result = MatchResult::default();

    let (skipped_targets, available): (Vec<_>, Vec<_>) = targets
        .into_iter()
        .partition(|t| config.skips_target(&t.logical_id));
    result.skipped_target = skipped_targets;
    let mut pool = TargetPool::new(available);

    for source in sources {
        let address = source.match_address();

        // Phase 1: skip
        if config.skips_source(&address) {
            log::debug!("{address}: skipped by pattern");
            result.skipped_source.push(source);
            continue;
        }

        let target_type = match source.target_type() {
            MappedType::Skip => {
                log::debug!("{address}: type has no CloudFormation equivalent");
                result.skipped_source.push(source);
                continue;
            }
            MappedType::Unknown(_) => {
                log::debug!("{address}: unknown type {}", source.resource_type);
                result.source_only.push(source);
                continue;
            }
            MappedType::Target(target_type) => target_type,
        };

        // Phase 2: explicit mapping
        if let Some(target) = config
            .find_mapping(&address)
            .and_then(|logical_id| pool.take_by_id(logical_id))
        {
            log::debug!("{address}: mapped to {}", target.logical_id);
            result.matches.push(Match {
                source,
                target,
                confidence: MAPPED_CONFIDENCE,
            });
            continue;
        }

        // Phase 3: name similarity within the mapped type
        match pool.take_best(&source.name, target_type) {
            Some((target, confidence)) => {
                log::debug!(
                    "{address}: matched {} ({confidence:.2})",
                    target.logical_id
                );
                result.matches.push(Match {
                    source,
                    target,
                    confidence,
                });
            }
            None => {
                log::debug!("{address}: no candidate");
                result.source_only.push(source);
            }
        }
    }

    result.target_only = pool.into_remaining();

    log::info!(
        "Matched: {}, Terraform only: {}, CloudFormation only: {}, skipped: {}",
        result.matches.len(),
        result.source_only.len(),
        result.target_only.len(),
        result.skipped_source.len()
    );
    result
}
