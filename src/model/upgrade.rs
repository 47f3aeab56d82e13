//! Purpose: Application upgrade descriptions, progress reports, and safety checks.
//! Exports: `ApplicationUpgradeProgressInfo`, `ApplicationUpgradeDescription`, `SafetyCheck`, ...
//! Role: Wire shapes for `GetUpgradeProgress` and `Upgrade` on `/Applications/{id}`.
//! Invariants: Progress reports write their three state enumerations before any other field.
use crate::core::schema::{polymorphic, record, wire_enum};
use crate::model::health::{ApplicationHealthPolicy, HealthEvaluationWrapper};
use crate::model::partition::PartitionId;
use serde_json::Value;
use time::OffsetDateTime;

wire_enum! {
    pub enum UpgradeState {
        Invalid = "Invalid",
        RollingBackInProgress = "RollingBackInProgress",
        RollingBackCompleted = "RollingBackCompleted",
        RollingForwardPending = "RollingForwardPending",
        RollingForwardInProgress = "RollingForwardInProgress",
        RollingForwardCompleted = "RollingForwardCompleted",
        Failed = "Failed",
    }
}

wire_enum! {
    pub enum UpgradeMode {
        Invalid = "Invalid",
        UnmonitoredAuto = "UnmonitoredAuto",
        UnmonitoredManual = "UnmonitoredManual",
        Monitored = "Monitored",
        UnmonitoredDeferred = "UnmonitoredDeferred",
    }
}

wire_enum! {
    /// Why an upgrade stopped; only set once `UpgradeState` is `Failed` or rolling back.
    pub enum FailureReason {
        None = "None",
        Interrupted = "Interrupted",
        HealthCheck = "HealthCheck",
        UpgradeDomainTimeout = "UpgradeDomainTimeout",
        OverallUpgradeTimeout = "OverallUpgradeTimeout",
    }
}

wire_enum! {
    pub enum UpgradeKind {
        Invalid = "Invalid",
        Rolling = "Rolling",
    }
}

wire_enum! {
    pub enum FailureAction {
        Invalid = "Invalid",
        Rollback = "Rollback",
        Manual = "Manual",
    }
}

wire_enum! {
    pub enum UpgradeDomainState {
        Invalid = "Invalid",
        Pending = "Pending",
        InProgress = "InProgress",
        Completed = "Completed",
    }
}

wire_enum! {
    pub enum NodeUpgradePhase {
        Invalid = "Invalid",
        PreUpgradeSafetyCheck = "PreUpgradeSafetyCheck",
        Upgrading = "Upgrading",
        PostUpgradeSafetyCheck = "PostUpgradeSafetyCheck",
    }
}

wire_enum! {
    pub enum UpgradeSortOrder {
        Invalid = "Invalid",
        Default = "Default",
        Numeric = "Numeric",
        Lexicographical = "Lexicographical",
        ReverseNumeric = "ReverseNumeric",
        ReverseLexicographical = "ReverseLexicographical",
    }
}

record! {
    pub struct UpgradeDomainInfo {
        optional "Name" name: String,
        optional "State" state: UpgradeDomainState,
    }
}

record! {
    pub struct ApplicationParameter {
        required "Key" key: String,
        required "Value" value: String,
    }
}

record! {
    /// Timeouts are ISO-8601 durations or plain millisecond counts, as the gateway accepts both.
    pub struct MonitoringPolicyDescription {
        optional "FailureAction" failure_action: FailureAction,
        optional "HealthCheckWaitDurationInMilliseconds" health_check_wait_duration: String,
        optional "HealthCheckStableDurationInMilliseconds" health_check_stable_duration: String,
        optional "HealthCheckRetryTimeoutInMilliseconds" health_check_retry_timeout: String,
        optional "UpgradeTimeoutInMilliseconds" upgrade_timeout: String,
        optional "UpgradeDomainTimeoutInMilliseconds" upgrade_domain_timeout: String,
    }
}

record! {
    pub struct ApplicationUpgradeDescription {
        required "Name" name: String,
        required "TargetApplicationTypeVersion" target_application_type_version: String,
        optional "Parameters" parameters: Vec<ApplicationParameter>,
        required "UpgradeKind" upgrade_kind: UpgradeKind,
        optional "RollingUpgradeMode" rolling_upgrade_mode: UpgradeMode,
        optional "UpgradeReplicaSetCheckTimeoutInSeconds" upgrade_replica_set_check_timeout_in_seconds: i64,
        optional "ForceRestart" force_restart: bool,
        optional "SortOrder" sort_order: UpgradeSortOrder,
        optional "MonitoringPolicy" monitoring_policy: MonitoringPolicyDescription,
        optional "ApplicationHealthPolicy" application_health_policy: ApplicationHealthPolicy,
        optional "InstanceCloseDelayDurationInSeconds" instance_close_delay_duration_in_seconds: i64,
        optional "ManagedApplicationIdentity" managed_application_identity: Value,
    }
}

impl ApplicationUpgradeDescription {
    /// Minimal rolling upgrade: only the required fields are set.
    pub fn rolling(name: impl Into<String>, target_version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target_application_type_version: target_version.into(),
            parameters: None,
            upgrade_kind: UpgradeKind::Rolling,
            rolling_upgrade_mode: None,
            upgrade_replica_set_check_timeout_in_seconds: None,
            force_restart: None,
            sort_order: None,
            monitoring_policy: None,
            application_health_policy: None,
            instance_close_delay_duration_in_seconds: None,
            managed_application_identity: None,
        }
    }
}

record! {
    pub struct SeedNodeSafetyCheck {}
}

record! {
    /// Shared by every partition-scoped safety check kind.
    pub struct PartitionSafetyCheck {
        optional "PartitionId" partition_id: PartitionId,
    }
}

polymorphic! {
    pub enum SafetyCheck tagged "Kind" {
        "EnsureSeedNodeQuorum" => EnsureSeedNodeQuorum(SeedNodeSafetyCheck),
        "EnsurePartitionQuorum" => EnsurePartitionQuorum(PartitionSafetyCheck),
        "WaitForPrimaryPlacement" => WaitForPrimaryPlacement(PartitionSafetyCheck),
        "WaitForPrimarySwap" => WaitForPrimarySwap(PartitionSafetyCheck),
        "WaitForReconfiguration" => WaitForReconfiguration(PartitionSafetyCheck),
        "WaitForInbuildReplica" => WaitForInbuildReplica(PartitionSafetyCheck),
        "EnsureAvailability" => EnsureAvailability(PartitionSafetyCheck),
    }
}

impl SafetyCheck {
    pub fn partition_id(&self) -> Option<&PartitionId> {
        match self {
            SafetyCheck::EnsureSeedNodeQuorum(_) => None,
            SafetyCheck::EnsurePartitionQuorum(check)
            | SafetyCheck::WaitForPrimaryPlacement(check)
            | SafetyCheck::WaitForPrimarySwap(check)
            | SafetyCheck::WaitForReconfiguration(check)
            | SafetyCheck::WaitForInbuildReplica(check)
            | SafetyCheck::EnsureAvailability(check) => check.partition_id.as_ref(),
        }
    }
}

record! {
    pub struct SafetyCheckWrapper {
        optional "SafetyCheck" safety_check: SafetyCheck,
    }
}

record! {
    pub struct NodeUpgradeProgressInfo {
        optional "NodeName" node_name: String,
        optional "UpgradePhase" upgrade_phase: NodeUpgradePhase,
        optional "PendingSafetyChecks" pending_safety_checks: Vec<SafetyCheckWrapper>,
    }
}

record! {
    pub struct CurrentUpgradeDomainProgressInfo {
        optional "DomainName" domain_name: String,
        optional "NodeUpgradeProgressList" node_upgrade_progress_list: Vec<NodeUpgradeProgressInfo>,
    }
}

record! {
    pub struct FailureUpgradeDomainProgressInfo {
        optional "DomainName" domain_name: String,
        optional "NodeUpgradeProgressList" node_upgrade_progress_list: Vec<NodeUpgradeProgressInfo>,
    }
}

record! {
    /// Snapshot returned by `GET /Applications/{id}/$/GetUpgradeProgress`.
    pub struct ApplicationUpgradeProgressInfo {
        optional "UpgradeState" upgrade_state: UpgradeState,
        optional "RollingUpgradeMode" rolling_upgrade_mode: UpgradeMode,
        optional "FailureReason" failure_reason: FailureReason,
        optional "Name" name: String,
        optional "TypeName" type_name: String,
        optional "TargetApplicationTypeVersion" target_application_type_version: String,
        optional "UpgradeDomains" upgrade_domains: Vec<UpgradeDomainInfo>,
        optional "NextUpgradeDomain" next_upgrade_domain: String,
        optional "UpgradeDescription" upgrade_description: ApplicationUpgradeDescription,
        /// ISO-8601 duration such as `PT0H2M0S`, despite the key name.
        optional "UpgradeDurationInMilliseconds" upgrade_duration_in_milliseconds: String,
        optional "UpgradeDomainDurationInMilliseconds" upgrade_domain_duration_in_milliseconds: String,
        optional "UnhealthyEvaluations" unhealthy_evaluations: Vec<HealthEvaluationWrapper>,
        optional "CurrentUpgradeDomainProgress" current_upgrade_domain_progress: CurrentUpgradeDomainProgressInfo,
        optional "StartTimestampUtc" start_timestamp_utc: OffsetDateTime,
        optional "FailureTimestampUtc" failure_timestamp_utc: OffsetDateTime,
        optional "UpgradeDomainProgressAtFailure" upgrade_domain_progress_at_failure: FailureUpgradeDomainProgressInfo,
        optional "UpgradeStatusDetails" upgrade_status_details: String,
    }
}

impl ApplicationUpgradeProgressInfo {
    /// Upgrade domains that have not reached `Completed`.
    pub fn pending_domains(&self) -> impl Iterator<Item = &UpgradeDomainInfo> {
        self.upgrade_domains
            .iter()
            .flatten()
            .filter(|domain| domain.state != Some(UpgradeDomainState::Completed))
    }
}
