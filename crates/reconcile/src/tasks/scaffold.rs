//! CloudFormation snippets and template routing for ADD tasks.
//!
//! Scaffolds are looked up by exact Terraform type. Adding a resource kind
//! means adding a row to [`SCAFFOLDS`]; existing rows are never touched.

use crate::types::{Properties, SourceResource};
use serde_json::Value;

/// Emits the property lines (already indented) for one resource kind.
type ScaffoldFn = fn(&SourceResource) -> Vec<String>;

const SCAFFOLDS: &[(&str, ScaffoldFn)] = &[
    ("aws_db_proxy", db_proxy),
    ("aws_ecs_service", ecs_service),
    ("aws_ecs_cluster", ecs_cluster),
    ("aws_security_group", security_group),
    ("aws_secretsmanager_secret", secretsmanager_secret),
    ("aws_rds_cluster", rds_cluster),
    ("aws_cloudwatch_metric_alarm", metric_alarm),
    ("aws_cloudwatch_log_group", log_group),
    ("aws_ecr_repository", ecr_repository),
    ("aws_ssm_parameter", ssm_parameter),
    ("aws_iam_role", iam_role),
];

/// Keyword routing, first match wins.
const ROUTES: &[(&[&str], &str)] = &[
    (
        &["vpc", "subnet", "gateway", "route", "security_group", "endpoint"],
        "network-stack.yaml",
    ),
    (
        &["efs", "rds", "db_", "secretsmanager", "ssm_parameter", "kms"],
        "data-stack.yaml",
    ),
    (
        &["ecs_cluster", "ecr", "lb", "alb", "target_group", "listener", "iam"],
        "compute-stack.yaml",
    ),
    (&["ecs_service", "ecs_task", "autoscaling"], "services-stack.yaml"),
];

const DEFAULT_TEMPLATE: &str = "compute-stack.yaml";

/// Template file a new resource most likely belongs in.
pub fn suggest_template(resource_type: &str) -> &'static str {
    ROUTES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| resource_type.contains(k)))
        .map_or(DEFAULT_TEMPLATE, |(_, file)| *file)
}

/// A CloudFormation resource snippet for `source`, indented to sit under
/// `Resources:`. Returns `None` when the type has no table entry.
pub fn snippet(source: &SourceResource) -> Option<String> {
    let target_type = source.target_type().target()?;
    let mut lines = vec![
        format!("  {}:", source.suggested_target_id()),
        format!("    Type: {target_type}"),
        "    Properties:".to_string(),
    ];

    match SCAFFOLDS.iter().find(|(t, _)| *t == source.resource_type) {
        Some((_, scaffold)) => lines.extend(scaffold(source)),
        None => lines.push("      # TODO: Add properties from the Terraform resource".to_string()),
    }
    Some(lines.join("\n"))
}

/// Literal property value rendered for YAML, or `default` when absent or
/// not a scalar.
fn prop(props: &Properties, key: &str, default: &str) -> String {
    match props.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(v @ (Value::Number(_) | Value::Bool(_))) => v.to_string(),
        _ => default.to_string(),
    }
}

fn env_name(source: &SourceResource, suffix: &str) -> String {
    format!("!Sub ${{EnvironmentName}}-{}{suffix}", source.name)
}

fn db_proxy(source: &SourceResource) -> Vec<String> {
    let p = &source.properties;
    vec![
        format!("      DBProxyName: {}", env_name(source, "-proxy")),
        format!("      EngineFamily: {}", prop(p, "engine_family", "MYSQL")),
        "      Auth:".into(),
        "        - AuthScheme: SECRETS".into(),
        "          SecretArn: !Ref TODO_DbSecret".into(),
        "          IAMAuth: DISABLED".into(),
        "      RoleArn: !GetAtt TODO_ProxyRole.Arn".into(),
        "      VpcSubnetIds:".into(),
        "        - !Ref PrivateSubnet1".into(),
        "        - !Ref PrivateSubnet2".into(),
        "      VpcSecurityGroupIds:".into(),
        "        - !Ref TODO_DatabaseSecurityGroup".into(),
        format!("      RequireTLS: {}", prop(p, "require_tls", "false")),
    ]
}

fn ecs_service(source: &SourceResource) -> Vec<String> {
    vec![
        format!("      ServiceName: {}", env_name(source, "")),
        "      Cluster: !Ref TODO_EcsCluster".into(),
        "      TaskDefinition: !Ref TODO_TaskDefinition".into(),
        format!(
            "      DesiredCount: {}",
            prop(&source.properties, "desired_count", "1")
        ),
        format!(
            "      LaunchType: {}",
            prop(&source.properties, "launch_type", "FARGATE")
        ),
    ]
}

fn ecs_cluster(source: &SourceResource) -> Vec<String> {
    vec![format!("      ClusterName: {}", env_name(source, ""))]
}

fn security_group(source: &SourceResource) -> Vec<String> {
    vec![
        format!(
            "      GroupDescription: {}",
            prop(&source.properties, "description", "TODO")
        ),
        "      VpcId: !Ref TODO_Vpc".into(),
    ]
}

fn secretsmanager_secret(source: &SourceResource) -> Vec<String> {
    vec![format!("      Name: {}", env_name(source, ""))]
}

fn rds_cluster(source: &SourceResource) -> Vec<String> {
    vec![
        format!("      DBClusterIdentifier: {}", env_name(source, "")),
        format!(
            "      Engine: {}",
            prop(&source.properties, "engine", "aurora-mysql")
        ),
        "      MasterUsername: !Ref TODO_DatabaseUsername".into(),
        "      MasterUserPassword: !Ref TODO_DatabasePassword".into(),
        "      DBSubnetGroupName: !Ref TODO_DbSubnetGroup".into(),
        "      VpcSecurityGroupIds:".into(),
        "        - !Ref TODO_DatabaseSecurityGroup".into(),
    ]
}

fn metric_alarm(source: &SourceResource) -> Vec<String> {
    let p = &source.properties;
    vec![
        format!("      AlarmName: {}", env_name(source, "")),
        format!(
            "      AlarmDescription: {}",
            prop(p, "alarm_description", "TODO")
        ),
        format!("      MetricName: {}", prop(p, "metric_name", "TODO")),
        format!("      Namespace: {}", prop(p, "namespace", "TODO")),
        format!("      Statistic: {}", prop(p, "statistic", "Average")),
        format!("      Period: {}", prop(p, "period", "300")),
        format!(
            "      EvaluationPeriods: {}",
            prop(p, "evaluation_periods", "2")
        ),
        format!("      Threshold: {}", prop(p, "threshold", "80")),
        format!(
            "      ComparisonOperator: {}",
            prop(p, "comparison_operator", "GreaterThanThreshold")
        ),
    ]
}

fn log_group(source: &SourceResource) -> Vec<String> {
    vec![
        format!("      LogGroupName: !Sub /ecs/${{EnvironmentName}}/{}", source.name),
        format!(
            "      RetentionInDays: {}",
            prop(&source.properties, "retention_in_days", "30")
        ),
    ]
}

fn ecr_repository(source: &SourceResource) -> Vec<String> {
    vec![
        format!("      RepositoryName: {}", env_name(source, "")),
        format!(
            "      ImageTagMutability: {}",
            prop(&source.properties, "image_tag_mutability", "MUTABLE")
        ),
    ]
}

fn ssm_parameter(source: &SourceResource) -> Vec<String> {
    let p = &source.properties;
    vec![
        format!("      Name: {}", prop(p, "name", "TODO")),
        format!("      Type: {}", prop(p, "type", "String")),
        "      Value: TODO".into(),
    ]
}

fn iam_role(source: &SourceResource) -> Vec<String> {
    vec![
        format!("      RoleName: {}", env_name(source, "")),
        "      AssumeRolePolicyDocument:".into(),
        "        Version: '2012-10-17'".into(),
        "        Statement:".into(),
        "          - Effect: Allow".into(),
        "            Principal:".into(),
        "              Service: TODO.amazonaws.com".into(),
        "            Action: sts:AssumeRole".into(),
    ]
}
