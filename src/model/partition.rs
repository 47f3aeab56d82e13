//! Purpose: Partition identity, partition information, and partition scheme families.
//! Exports: `PartitionId`, `PartitionInformation`, `PartitionSchemeDescription`,
//! `ServicePartitionInfo` and their variant records.
//! Role: Wire shapes for the `/Partitions` and `/Services/{id}/$/GetPartitions` surfaces.
//! Invariants: Int64 range keys travel as numeric strings (full i64 range is legal).
use crate::core::error::{Error, ErrorKind};
use crate::core::path::WirePath;
use crate::core::schema::{polymorphic, record, serde_via_wire, wire_enum};
use crate::core::value::{FromWire, NumericString, ToWire, WireResult, describe};
use crate::model::health::HealthState;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Partition GUID in its canonical hyphenated form.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct PartitionId(String);

impl PartitionId {
    pub fn parse(text: &str) -> Result<Self, Error> {
        if is_guid(text) {
            Ok(Self(text.to_ascii_lowercase()))
        } else {
            Err(Error::new(ErrorKind::UnexpectedToken)
                .with_message("partition id is not a GUID")
                .with_expected("GUID string")
                .with_actual(format!("string \"{text}\"")))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PartitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PartitionId {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Self::parse(text)
    }
}

impl FromWire for PartitionId {
    fn from_wire(value: Value, path: &WirePath<'_>) -> WireResult<Self> {
        match &value {
            Value::String(text) => {
                Self::parse(text).map_err(|err| err.with_path(path.to_string()))
            }
            _ => Err(Error::new(ErrorKind::UnexpectedToken)
                .with_message("partition id is not a GUID")
                .with_path(path.to_string())
                .with_expected("GUID string")
                .with_actual(describe(&value))),
        }
    }
}

impl ToWire for PartitionId {
    fn to_wire(&self) -> WireResult<Value> {
        Ok(Value::String(self.0.clone()))
    }
}

serde_via_wire!(PartitionId);

fn is_guid(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() == 36
        && bytes.iter().enumerate().all(|(idx, byte)| match idx {
            8 | 13 | 18 | 23 => *byte == b'-',
            _ => byte.is_ascii_hexdigit(),
        })
}

record! {
    pub struct Int64RangePartitionInformation {
        optional "Id" id: PartitionId,
        optional "LowKey" low_key: i64 as NumericString,
        optional "HighKey" high_key: i64 as NumericString,
    }
}

record! {
    pub struct NamedPartitionInformation {
        optional "Id" id: PartitionId,
        /// Name of the partition, unique within the service.
        optional "Name" name: String,
    }
}

record! {
    pub struct SingletonPartitionInformation {
        optional "Id" id: PartitionId,
    }
}

polymorphic! {
    /// How a service's key space maps onto this partition.
    pub enum PartitionInformation tagged "ServicePartitionKind" {
        "Int64Range" => Int64Range(Int64RangePartitionInformation),
        "Named" => Named(NamedPartitionInformation),
        "Singleton" => Singleton(SingletonPartitionInformation),
    }
}

impl PartitionInformation {
    pub fn id(&self) -> Option<&PartitionId> {
        match self {
            PartitionInformation::Int64Range(info) => info.id.as_ref(),
            PartitionInformation::Named(info) => info.id.as_ref(),
            PartitionInformation::Singleton(info) => info.id.as_ref(),
        }
    }
}

record! {
    pub struct SingletonPartitionSchemeDescription {}
}

record! {
    pub struct UniformInt64RangePartitionSchemeDescription {
        required "Count" count: i32,
        required "LowKey" low_key: i64 as NumericString,
        required "HighKey" high_key: i64 as NumericString,
    }
}

record! {
    pub struct NamedPartitionSchemeDescription {
        required "Count" count: i32,
        required "Names" names: Vec<String>,
    }
}

polymorphic! {
    pub enum PartitionSchemeDescription tagged "PartitionScheme" {
        "Singleton" => Singleton(SingletonPartitionSchemeDescription),
        "UniformInt64Range" => UniformInt64Range(UniformInt64RangePartitionSchemeDescription),
        "Named" => Named(NamedPartitionSchemeDescription),
    }
}

wire_enum! {
    pub enum ServicePartitionStatus {
        Invalid = "Invalid",
        Ready = "Ready",
        NotReady = "NotReady",
        InQuorumLoss = "InQuorumLoss",
        Reconfiguring = "Reconfiguring",
        Deleting = "Deleting",
    }
}

record! {
    pub struct Epoch {
        optional "ConfigurationVersion" configuration_version: i64 as NumericString,
        optional "DataLossVersion" data_loss_version: i64 as NumericString,
    }
}

record! {
    pub struct StatefulServicePartitionInfo {
        optional "HealthState" health_state: HealthState,
        optional "PartitionStatus" partition_status: ServicePartitionStatus,
        optional "PartitionInformation" partition_information: PartitionInformation,
        optional "TargetReplicaSetSize" target_replica_set_size: i64,
        optional "MinReplicaSetSize" min_replica_set_size: i64,
        /// ISO-8601 duration as reported by the cluster, e.g. `PT0S`.
        optional "LastQuorumLossDuration" last_quorum_loss_duration: String,
        optional "PrimaryEpoch" primary_epoch: Epoch,
    }
}

record! {
    pub struct StatelessServicePartitionInfo {
        optional "HealthState" health_state: HealthState,
        optional "PartitionStatus" partition_status: ServicePartitionStatus,
        optional "PartitionInformation" partition_information: PartitionInformation,
        optional "InstanceCount" instance_count: i64,
        optional "MinInstanceCount" min_instance_count: i32,
        optional "MinInstancePercentage" min_instance_percentage: i32,
    }
}

polymorphic! {
    pub enum ServicePartitionInfo tagged "ServiceKind" {
        "Stateful" => Stateful(StatefulServicePartitionInfo),
        "Stateless" => Stateless(StatelessServicePartitionInfo),
    }
}

impl ServicePartitionInfo {
    pub fn partition_information(&self) -> Option<&PartitionInformation> {
        match self {
            ServicePartitionInfo::Stateful(info) => info.partition_information.as_ref(),
            ServicePartitionInfo::Stateless(info) => info.partition_information.as_ref(),
        }
    }
}
