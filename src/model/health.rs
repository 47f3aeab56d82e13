//! Purpose: Health states, events, evaluation trees, and health policies.
//! Exports: `HealthState`, `HealthStateFilter`, `HealthEvent`, `HealthEvaluation`,
//! `HealthEvaluationWrapper`, `ApplicationHealthPolicy`, `DeployedServicePackageHealth`, ...
//! Role: Wire shapes for health queries and the `UnhealthyEvaluations` trees in upgrade progress.
//! Invariants: Evaluation trees are recursive through `UnhealthyEvaluations` lists only.
use crate::core::schema::{polymorphic, record, wire_enum};
use crate::core::value::NumericString;
use crate::model::partition::PartitionId;
use std::ops::BitOr;
use time::OffsetDateTime;

wire_enum! {
    pub enum HealthState {
        Invalid = "Invalid",
        Ok = "Ok",
        Warning = "Warning",
        Error = "Error",
        Unknown = "Unknown",
    }
}

/// Flag set sent as the `EventsHealthStateFilter` query parameter.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct HealthStateFilter(u16);

impl HealthStateFilter {
    pub const DEFAULT: Self = Self(0);
    pub const NONE: Self = Self(1);
    pub const OK: Self = Self(2);
    pub const WARNING: Self = Self(4);
    pub const ERROR: Self = Self(8);
    pub const ALL: Self = Self(65535);

    pub fn bits(self) -> u16 {
        self.0
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "default" => Some(Self::DEFAULT),
            "none" => Some(Self::NONE),
            "ok" => Some(Self::OK),
            "warning" => Some(Self::WARNING),
            "error" => Some(Self::ERROR),
            "all" => Some(Self::ALL),
            _ => None,
        }
    }
}

impl BitOr for HealthStateFilter {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

record! {
    pub struct HealthEvent {
        required "SourceId" source_id: String,
        required "Property" property: String,
        required "HealthState" health_state: HealthState,
        /// ISO-8601 duration or `Infinity`, as the cluster reports it.
        optional "TimeToLiveInMilliSeconds" time_to_live: String,
        optional "Description" description: String,
        optional "SequenceNumber" sequence_number: i64 as NumericString,
        optional "RemoveWhenExpired" remove_when_expired: bool,
        optional "HealthReportId" health_report_id: String,
        optional "IsExpired" is_expired: bool,
        optional "SourceUtcTimestamp" source_utc_timestamp: OffsetDateTime,
        optional "LastModifiedUtcTimestamp" last_modified_utc_timestamp: OffsetDateTime,
        optional "LastOkTransitionAt" last_ok_transition_at: OffsetDateTime,
        optional "LastWarningTransitionAt" last_warning_transition_at: OffsetDateTime,
        optional "LastErrorTransitionAt" last_error_transition_at: OffsetDateTime,
    }
}

record! {
    pub struct HealthEvaluationWrapper {
        optional "HealthEvaluation" health_evaluation: HealthEvaluation,
    }
}

record! {
    pub struct ApplicationHealthEvaluation {
        optional "AggregatedHealthState" aggregated_health_state: HealthState,
        optional "Description" description: String,
        optional "ApplicationName" application_name: String,
        optional "UnhealthyEvaluations" unhealthy_evaluations: Vec<HealthEvaluationWrapper>,
    }
}

record! {
    pub struct ApplicationsHealthEvaluation {
        optional "AggregatedHealthState" aggregated_health_state: HealthState,
        optional "Description" description: String,
        optional "MaxPercentUnhealthyApplications" max_percent_unhealthy_applications: i32,
        optional "TotalCount" total_count: i64,
        optional "UnhealthyEvaluations" unhealthy_evaluations: Vec<HealthEvaluationWrapper>,
    }
}

record! {
    pub struct DeployedApplicationHealthEvaluation {
        optional "AggregatedHealthState" aggregated_health_state: HealthState,
        optional "Description" description: String,
        optional "NodeName" node_name: String,
        optional "ApplicationName" application_name: String,
        optional "UnhealthyEvaluations" unhealthy_evaluations: Vec<HealthEvaluationWrapper>,
    }
}

record! {
    pub struct DeployedApplicationsHealthEvaluation {
        optional "AggregatedHealthState" aggregated_health_state: HealthState,
        optional "Description" description: String,
        optional "MaxPercentUnhealthyDeployedApplications" max_percent_unhealthy_deployed_applications: i32,
        optional "TotalCount" total_count: i64,
        optional "UnhealthyEvaluations" unhealthy_evaluations: Vec<HealthEvaluationWrapper>,
    }
}

record! {
    pub struct DeployedServicePackageHealthEvaluation {
        optional "AggregatedHealthState" aggregated_health_state: HealthState,
        optional "Description" description: String,
        optional "NodeName" node_name: String,
        optional "ApplicationName" application_name: String,
        optional "ServiceManifestName" service_manifest_name: String,
        optional "UnhealthyEvaluations" unhealthy_evaluations: Vec<HealthEvaluationWrapper>,
    }
}

record! {
    pub struct DeployedServicePackagesHealthEvaluation {
        optional "AggregatedHealthState" aggregated_health_state: HealthState,
        optional "Description" description: String,
        optional "TotalCount" total_count: i64,
        optional "UnhealthyEvaluations" unhealthy_evaluations: Vec<HealthEvaluationWrapper>,
    }
}

record! {
    /// A single health report that pushed its entity out of `Ok`.
    pub struct EventHealthEvaluation {
        optional "AggregatedHealthState" aggregated_health_state: HealthState,
        optional "Description" description: String,
        optional "ConsiderWarningAsError" consider_warning_as_error: bool,
        optional "UnhealthyEvent" unhealthy_event: HealthEvent,
    }
}

record! {
    pub struct NodeHealthEvaluation {
        optional "AggregatedHealthState" aggregated_health_state: HealthState,
        optional "Description" description: String,
        optional "NodeName" node_name: String,
        optional "UnhealthyEvaluations" unhealthy_evaluations: Vec<HealthEvaluationWrapper>,
    }
}

record! {
    pub struct NodesHealthEvaluation {
        optional "AggregatedHealthState" aggregated_health_state: HealthState,
        optional "Description" description: String,
        optional "MaxPercentUnhealthyNodes" max_percent_unhealthy_nodes: i32,
        optional "TotalCount" total_count: i64,
        optional "UnhealthyEvaluations" unhealthy_evaluations: Vec<HealthEvaluationWrapper>,
    }
}

record! {
    pub struct PartitionHealthEvaluation {
        optional "AggregatedHealthState" aggregated_health_state: HealthState,
        optional "Description" description: String,
        optional "PartitionId" partition_id: PartitionId,
        optional "UnhealthyEvaluations" unhealthy_evaluations: Vec<HealthEvaluationWrapper>,
    }
}

record! {
    pub struct PartitionsHealthEvaluation {
        optional "AggregatedHealthState" aggregated_health_state: HealthState,
        optional "Description" description: String,
        optional "MaxPercentUnhealthyPartitionsPerService" max_percent_unhealthy_partitions_per_service: i32,
        optional "TotalCount" total_count: i64,
        optional "UnhealthyEvaluations" unhealthy_evaluations: Vec<HealthEvaluationWrapper>,
    }
}

record! {
    pub struct ReplicaHealthEvaluation {
        optional "AggregatedHealthState" aggregated_health_state: HealthState,
        optional "Description" description: String,
        optional "PartitionId" partition_id: PartitionId,
        optional "ReplicaOrInstanceId" replica_or_instance_id: i64 as NumericString,
        optional "UnhealthyEvaluations" unhealthy_evaluations: Vec<HealthEvaluationWrapper>,
    }
}

record! {
    pub struct ReplicasHealthEvaluation {
        optional "AggregatedHealthState" aggregated_health_state: HealthState,
        optional "Description" description: String,
        optional "MaxPercentUnhealthyReplicasPerPartition" max_percent_unhealthy_replicas_per_partition: i32,
        optional "TotalCount" total_count: i64,
        optional "UnhealthyEvaluations" unhealthy_evaluations: Vec<HealthEvaluationWrapper>,
    }
}

record! {
    pub struct ServiceHealthEvaluation {
        optional "AggregatedHealthState" aggregated_health_state: HealthState,
        optional "Description" description: String,
        optional "ServiceName" service_name: String,
        optional "UnhealthyEvaluations" unhealthy_evaluations: Vec<HealthEvaluationWrapper>,
    }
}

record! {
    pub struct ServicesHealthEvaluation {
        optional "AggregatedHealthState" aggregated_health_state: HealthState,
        optional "Description" description: String,
        optional "ServiceTypeName" service_type_name: String,
        optional "MaxPercentUnhealthyServices" max_percent_unhealthy_services: i32,
        optional "TotalCount" total_count: i64,
        optional "UnhealthyEvaluations" unhealthy_evaluations: Vec<HealthEvaluationWrapper>,
    }
}

record! {
    pub struct SystemApplicationHealthEvaluation {
        optional "AggregatedHealthState" aggregated_health_state: HealthState,
        optional "Description" description: String,
        optional "UnhealthyEvaluations" unhealthy_evaluations: Vec<HealthEvaluationWrapper>,
    }
}

record! {
    pub struct UpgradeDomainNodesHealthEvaluation {
        optional "AggregatedHealthState" aggregated_health_state: HealthState,
        optional "Description" description: String,
        optional "UpgradeDomainName" upgrade_domain_name: String,
        optional "MaxPercentUnhealthyNodes" max_percent_unhealthy_nodes: i32,
        optional "TotalCount" total_count: i64,
        optional "UnhealthyEvaluations" unhealthy_evaluations: Vec<HealthEvaluationWrapper>,
    }
}

record! {
    pub struct UpgradeDomainDeployedApplicationsHealthEvaluation {
        optional "AggregatedHealthState" aggregated_health_state: HealthState,
        optional "Description" description: String,
        optional "UpgradeDomainName" upgrade_domain_name: String,
        optional "MaxPercentUnhealthyDeployedApplications" max_percent_unhealthy_deployed_applications: i32,
        optional "TotalCount" total_count: i64,
        optional "UnhealthyEvaluations" unhealthy_evaluations: Vec<HealthEvaluationWrapper>,
    }
}

polymorphic! {
    /// Why an entity was judged unhealthy; nests through `UnhealthyEvaluations`.
    pub enum HealthEvaluation tagged "Kind" {
        "Application" => Application(ApplicationHealthEvaluation),
        "Applications" => Applications(ApplicationsHealthEvaluation),
        "DeployedApplication" => DeployedApplication(DeployedApplicationHealthEvaluation),
        "DeployedApplications" => DeployedApplications(DeployedApplicationsHealthEvaluation),
        "DeployedServicePackage" => DeployedServicePackage(DeployedServicePackageHealthEvaluation),
        "DeployedServicePackages" => DeployedServicePackages(DeployedServicePackagesHealthEvaluation),
        "Event" => Event(EventHealthEvaluation),
        "Node" => Node(NodeHealthEvaluation),
        "Nodes" => Nodes(NodesHealthEvaluation),
        "Partition" => Partition(PartitionHealthEvaluation),
        "Partitions" => Partitions(PartitionsHealthEvaluation),
        "Replica" => Replica(ReplicaHealthEvaluation),
        "Replicas" => Replicas(ReplicasHealthEvaluation),
        "Service" => Service(ServiceHealthEvaluation),
        "Services" => Services(ServicesHealthEvaluation),
        "SystemApplication" => SystemApplication(SystemApplicationHealthEvaluation),
        "UpgradeDomainNodes" => UpgradeDomainNodes(UpgradeDomainNodesHealthEvaluation),
        "UpgradeDomainDeployedApplications" => UpgradeDomainDeployedApplications(UpgradeDomainDeployedApplicationsHealthEvaluation),
    }
}

impl HealthEvaluation {
    pub fn aggregated_health_state(&self) -> Option<HealthState> {
        match self {
            HealthEvaluation::Application(eval) => eval.aggregated_health_state,
            HealthEvaluation::Applications(eval) => eval.aggregated_health_state,
            HealthEvaluation::DeployedApplication(eval) => eval.aggregated_health_state,
            HealthEvaluation::DeployedApplications(eval) => eval.aggregated_health_state,
            HealthEvaluation::DeployedServicePackage(eval) => eval.aggregated_health_state,
            HealthEvaluation::DeployedServicePackages(eval) => eval.aggregated_health_state,
            HealthEvaluation::Event(eval) => eval.aggregated_health_state,
            HealthEvaluation::Node(eval) => eval.aggregated_health_state,
            HealthEvaluation::Nodes(eval) => eval.aggregated_health_state,
            HealthEvaluation::Partition(eval) => eval.aggregated_health_state,
            HealthEvaluation::Partitions(eval) => eval.aggregated_health_state,
            HealthEvaluation::Replica(eval) => eval.aggregated_health_state,
            HealthEvaluation::Replicas(eval) => eval.aggregated_health_state,
            HealthEvaluation::Service(eval) => eval.aggregated_health_state,
            HealthEvaluation::Services(eval) => eval.aggregated_health_state,
            HealthEvaluation::SystemApplication(eval) => eval.aggregated_health_state,
            HealthEvaluation::UpgradeDomainNodes(eval) => eval.aggregated_health_state,
            HealthEvaluation::UpgradeDomainDeployedApplications(eval) => {
                eval.aggregated_health_state
            }
        }
    }

    /// Child evaluations; `Event` is always a leaf.
    pub fn unhealthy_evaluations(&self) -> &[HealthEvaluationWrapper] {
        let children = match self {
            HealthEvaluation::Application(eval) => &eval.unhealthy_evaluations,
            HealthEvaluation::Applications(eval) => &eval.unhealthy_evaluations,
            HealthEvaluation::DeployedApplication(eval) => &eval.unhealthy_evaluations,
            HealthEvaluation::DeployedApplications(eval) => &eval.unhealthy_evaluations,
            HealthEvaluation::DeployedServicePackage(eval) => &eval.unhealthy_evaluations,
            HealthEvaluation::DeployedServicePackages(eval) => &eval.unhealthy_evaluations,
            HealthEvaluation::Event(_) => return &[],
            HealthEvaluation::Node(eval) => &eval.unhealthy_evaluations,
            HealthEvaluation::Nodes(eval) => &eval.unhealthy_evaluations,
            HealthEvaluation::Partition(eval) => &eval.unhealthy_evaluations,
            HealthEvaluation::Partitions(eval) => &eval.unhealthy_evaluations,
            HealthEvaluation::Replica(eval) => &eval.unhealthy_evaluations,
            HealthEvaluation::Replicas(eval) => &eval.unhealthy_evaluations,
            HealthEvaluation::Service(eval) => &eval.unhealthy_evaluations,
            HealthEvaluation::Services(eval) => &eval.unhealthy_evaluations,
            HealthEvaluation::SystemApplication(eval) => &eval.unhealthy_evaluations,
            HealthEvaluation::UpgradeDomainNodes(eval) => &eval.unhealthy_evaluations,
            HealthEvaluation::UpgradeDomainDeployedApplications(eval) => {
                &eval.unhealthy_evaluations
            }
        };
        children.as_deref().unwrap_or(&[])
    }
}

record! {
    pub struct ServiceTypeHealthPolicy {
        optional "MaxPercentUnhealthyPartitionsPerService" max_percent_unhealthy_partitions_per_service: i32,
        optional "MaxPercentUnhealthyReplicasPerPartition" max_percent_unhealthy_replicas_per_partition: i32,
        optional "MaxPercentUnhealthyServices" max_percent_unhealthy_services: i32,
    }
}

record! {
    pub struct ServiceTypeHealthPolicyMapItem {
        /// Service type name.
        required "Key" key: String,
        required "Value" value: ServiceTypeHealthPolicy,
    }
}

record! {
    pub struct ApplicationHealthPolicy {
        optional "ConsiderWarningAsError" consider_warning_as_error: bool,
        /// 0..=100; the cluster rounds up to tolerate one failure on small deployments.
        optional "MaxPercentUnhealthyDeployedApplications" max_percent_unhealthy_deployed_applications: i32,
        optional "DefaultServiceTypeHealthPolicy" default_service_type_health_policy: ServiceTypeHealthPolicy,
        optional "ServiceTypeHealthPolicyMap" service_type_health_policy_map: Vec<ServiceTypeHealthPolicyMapItem>,
    }
}

record! {
    pub struct DeployedServicePackageHealth {
        optional "AggregatedHealthState" aggregated_health_state: HealthState,
        optional "HealthEvents" health_events: Vec<HealthEvent>,
        optional "UnhealthyEvaluations" unhealthy_evaluations: Vec<HealthEvaluationWrapper>,
        optional "ApplicationName" application_name: String,
        optional "ServiceManifestName" service_manifest_name: String,
        optional "ServicePackageActivationId" service_package_activation_id: String,
        optional "NodeName" node_name: String,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ApplicationHealthPolicy, HealthEvaluation, HealthEvaluationWrapper, HealthState,
        HealthStateFilter,
    };
    use crate::core::codec::{from_value, to_value};
    use crate::core::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn filter_flags_combine() {
        let filter = HealthStateFilter::OK | HealthStateFilter::WARNING;
        assert_eq!(filter.bits(), 6);
        assert!(filter.contains(HealthStateFilter::OK));
        assert!(!filter.contains(HealthStateFilter::ERROR));
        assert_eq!(HealthStateFilter::from_name("Error"), Some(HealthStateFilter::ERROR));
        assert_eq!(HealthStateFilter::from_name("sideways"), None);
    }

    #[test]
    fn health_state_is_case_sensitive() {
        let err = from_value::<HealthState>(json!("ok")).expect_err("lowercase");
        assert_eq!(err.kind(), ErrorKind::UnknownEnumerationValue);
        assert_eq!("Warning".parse::<HealthState>().expect("parse"), HealthState::Warning);
    }

    #[test]
    fn evaluation_tree_decodes_recursively() {
        let wrapper: HealthEvaluationWrapper = from_value(json!({
            "HealthEvaluation": {
                "Kind": "DeployedServicePackages",
                "AggregatedHealthState": "Error",
                "TotalCount": 2,
                "UnhealthyEvaluations": [{
                    "HealthEvaluation": {
                        "Kind": "Event",
                        "AggregatedHealthState": "Error",
                        "ConsiderWarningAsError": false,
                        "UnhealthyEvent": {
                            "SourceId": "System.Hosting",
                            "Property": "Activation",
                            "HealthState": "Error",
                            "SequenceNumber": "42",
                            "SourceUtcTimestamp": "2024-03-01T08:30:00.000Z"
                        }
                    }
                }]
            }
        }))
        .expect("tree");
        let root = wrapper.health_evaluation.as_ref().expect("root");
        assert_eq!(root.aggregated_health_state(), Some(HealthState::Error));
        let children = root.unhealthy_evaluations();
        assert_eq!(children.len(), 1);
        let Some(HealthEvaluation::Event(event)) = &children[0].health_evaluation else {
            panic!("expected event evaluation");
        };
        let unhealthy = event.unhealthy_event.as_ref().expect("event");
        assert_eq!(unhealthy.sequence_number, Some(42));
        assert!(children[0]
            .health_evaluation
            .as_ref()
            .map(HealthEvaluation::unhealthy_evaluations)
            .is_some_and(<[_]>::is_empty));
    }

    #[test]
    fn nested_errors_carry_full_path() {
        let err = from_value::<HealthEvaluationWrapper>(json!({
            "HealthEvaluation": {
                "Kind": "Nodes",
                "UnhealthyEvaluations": [
                    {"HealthEvaluation": {"Kind": "Node", "NodeName": "n0"}},
                    {"HealthEvaluation": {"Kind": "Node", "AggregatedHealthState": "Sick"}}
                ]
            }
        }))
        .expect_err("bad state");
        assert_eq!(err.kind(), ErrorKind::UnknownEnumerationValue);
        assert_eq!(
            err.path(),
            Some("$.HealthEvaluation.UnhealthyEvaluations[1].HealthEvaluation.AggregatedHealthState")
        );
    }

    #[test]
    fn policy_body_omits_unset_fields() {
        let policy = ApplicationHealthPolicy {
            consider_warning_as_error: Some(true),
            max_percent_unhealthy_deployed_applications: None,
            default_service_type_health_policy: None,
            service_type_health_policy_map: Some(Vec::new()),
        };
        assert_eq!(
            to_value(&policy).expect("encode"),
            json!({"ConsiderWarningAsError": true, "ServiceTypeHealthPolicyMap": []})
        );
    }
}
