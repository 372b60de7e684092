//! Terraform → CloudFormation resource type table.
//!
//! Lookup is an exact key match. A type missing from the table is never
//! guessed: it comes back as [`MappedType::Unknown`] so a human decides.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Marker used in the table for types that have no CloudFormation counterpart.
const SKIP: &str = "SKIP";

/// Prefix rendered for types missing from the table.
pub const UNKNOWN_PREFIX: &str = "UNKNOWN:";

/// Static table. Append new entries; never reorder or rewrite existing ones.
const TYPE_TABLE: &[(&str, &str)] = &[
    ("aws_vpc", "AWS::EC2::VPC"),
    ("aws_subnet", "AWS::EC2::Subnet"),
    ("aws_internet_gateway", "AWS::EC2::InternetGateway"),
    ("aws_nat_gateway", "AWS::EC2::NatGateway"),
    ("aws_eip", "AWS::EC2::EIP"),
    ("aws_route_table", "AWS::EC2::RouteTable"),
    ("aws_route", "AWS::EC2::Route"),
    ("aws_security_group", "AWS::EC2::SecurityGroup"),
    ("aws_vpc_endpoint", "AWS::EC2::VPCEndpoint"),
    ("aws_ecs_cluster", "AWS::ECS::Cluster"),
    ("aws_ecs_service", "AWS::ECS::Service"),
    ("aws_ecs_task_definition", "AWS::ECS::TaskDefinition"),
    ("aws_lb", "AWS::ElasticLoadBalancingV2::LoadBalancer"),
    ("aws_lb_target_group", "AWS::ElasticLoadBalancingV2::TargetGroup"),
    ("aws_lb_listener", "AWS::ElasticLoadBalancingV2::Listener"),
    ("aws_rds_cluster", "AWS::RDS::DBCluster"),
    ("aws_rds_cluster_instance", "AWS::RDS::DBInstance"),
    ("aws_db_subnet_group", "AWS::RDS::DBSubnetGroup"),
    ("aws_db_proxy", "AWS::RDS::DBProxy"),
    ("aws_efs_file_system", "AWS::EFS::FileSystem"),
    ("aws_efs_mount_target", "AWS::EFS::MountTarget"),
    ("aws_efs_access_point", "AWS::EFS::AccessPoint"),
    ("aws_iam_role", "AWS::IAM::Role"),
    ("aws_secretsmanager_secret", "AWS::SecretsManager::Secret"),
    ("aws_ssm_parameter", "AWS::SSM::Parameter"),
    ("aws_kms_key", "AWS::KMS::Key"),
    ("aws_cloudwatch_log_group", "AWS::Logs::LogGroup"),
    ("aws_ecr_repository", "AWS::ECR::Repository"),
    ("aws_acm_certificate", "AWS::CertificateManager::Certificate"),
    ("aws_route53_record", "AWS::Route53::RecordSet"),
    ("aws_cloudfront_distribution", "AWS::CloudFront::Distribution"),
    (
        "aws_service_discovery_private_dns_namespace",
        "AWS::ServiceDiscovery::PrivateDnsNamespace",
    ),
    (
        "aws_appautoscaling_target",
        "AWS::ApplicationAutoScaling::ScalableTarget",
    ),
    (
        "aws_appautoscaling_policy",
        "AWS::ApplicationAutoScaling::ScalingPolicy",
    ),
    ("aws_kms_alias", "AWS::KMS::Alias"),
    ("aws_db_proxy_target", "AWS::RDS::DBProxyTargetGroup"),
    (
        "aws_rds_cluster_parameter_group",
        "AWS::RDS::DBClusterParameterGroup",
    ),
    ("aws_iam_role_policy", "AWS::IAM::Policy"),
    ("aws_iam_role_policy_attachment", "AWS::IAM::ManagedPolicy"),
    ("aws_iam_policy", "AWS::IAM::ManagedPolicy"),
    ("aws_secretsmanager_secret_version", "AWS::SecretsManager::Secret"),
    (
        "aws_ecs_cluster_capacity_providers",
        "AWS::ECS::ClusterCapacityProviderAssociations",
    ),
    ("aws_ecr_lifecycle_policy", "AWS::ECR::Repository"),
    ("aws_ecr_repository_policy", "AWS::ECR::Repository"),
    ("aws_security_group_rule", "AWS::EC2::SecurityGroupIngress"),
    (
        "aws_vpc_security_group_ingress_rule",
        "AWS::EC2::SecurityGroupIngress",
    ),
    (
        "aws_vpc_security_group_egress_rule",
        "AWS::EC2::SecurityGroupEgress",
    ),
    ("aws_cloudwatch_metric_alarm", "AWS::CloudWatch::Alarm"),
    ("aws_acm_certificate_validation", SKIP),
    // Generated values live in Secrets Manager or !Sub on the CloudFormation side
    ("random_string", SKIP),
    ("random_password", SKIP),
    // Folded into the file system resource in CloudFormation
    ("aws_efs_backup_policy", "AWS::EFS::FileSystem"),
    ("aws_efs_file_system_policy", "AWS::EFS::FileSystem"),
    // VPC defaults
    ("aws_default_network_acl", SKIP),
    ("aws_default_route_table", SKIP),
    ("aws_default_security_group", SKIP),
    (
        "aws_route_table_association",
        "AWS::EC2::SubnetRouteTableAssociation",
    ),
];

static TYPE_MAP: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| TYPE_TABLE.iter().copied().collect());

/// Result of looking up a Terraform type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(into = "String")]
pub enum MappedType {
    /// Concrete CloudFormation type, e.g. `AWS::EC2::VPC`
    Target(&'static str),
    /// Intentionally not represented in CloudFormation
    Skip,
    /// No table entry; carries the Terraform type
    Unknown(String),
}

impl MappedType {
    /// Look up a Terraform resource type.
    pub fn lookup(source_type: &str) -> Self {
        match TYPE_MAP.get(source_type) {
            Some(&SKIP) => Self::Skip,
            Some(target) => Self::Target(*target),
            None => Self::Unknown(source_type.to_string()),
        }
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, Self::Skip)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown(_))
    }

    /// The concrete CloudFormation type, if any.
    pub fn target(&self) -> Option<&'static str> {
        match self {
            Self::Target(t) => Some(*t),
            _ => None,
        }
    }
}

impl fmt::Display for MappedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Target(t) => f.write_str(t),
            Self::Skip => f.write_str(SKIP),
            Self::Unknown(source) => write!(f, "{UNKNOWN_PREFIX}{source}"),
        }
    }
}

impl From<MappedType> for String {
    fn from(value: MappedType) -> Self {
        value.to_string()
    }
}

/// All table entries in declaration order.
pub fn entries() -> impl Iterator<Item = (&'static str, MappedType)> {
    TYPE_TABLE
        .iter()
        .map(|(source, _)| (*source, MappedType::lookup(source)))
}
