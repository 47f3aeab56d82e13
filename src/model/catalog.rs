//! Purpose: Read-only registry of every wire type the crate can decode by name.
//! Exports: `CatalogEntry`, `EntryKind`, `lookup`, `entries`.
//! Role: Backs `sfwire types` and `sfwire decode --type <Name>`.
//! Invariants: Built at compile time; names are unique and sorted.
use crate::core::dispatch::{PolymorphicFamily, WireEnum};
use crate::core::path::WirePath;
use crate::core::record::WireRecord;
use crate::core::value::{FromWire, ToWire, WireResult};
use crate::model::health::*;
use crate::model::image_store::*;
use crate::model::paged::PagedList;
use crate::model::partition::*;
use crate::model::service::*;
use crate::model::upgrade::*;
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    Record,
    Enumeration {
        values: &'static [&'static str],
    },
    Family {
        discriminator: &'static str,
        kinds: &'static [&'static str],
    },
}

impl EntryKind {
    pub fn label(&self) -> &'static str {
        match self {
            EntryKind::Record => "record",
            EntryKind::Enumeration { .. } => "enumeration",
            EntryKind::Family { .. } => "family",
        }
    }
}

#[derive(Clone, Copy)]
pub struct CatalogEntry {
    pub name: &'static str,
    pub kind: EntryKind,
    normalize: fn(Value) -> WireResult<Value>,
}

impl CatalogEntry {
    /// Decodes `value` as this type and re-encodes it in canonical form.
    pub fn normalize(&self, value: Value) -> WireResult<Value> {
        tracing::debug!(type_name = self.name, "normalizing payload");
        (self.normalize)(value)
    }
}

impl std::fmt::Debug for CatalogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogEntry")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

fn normalize<T: FromWire + ToWire>(value: Value) -> WireResult<Value> {
    T::from_wire(value, &WirePath::Root)?.to_wire()
}

macro_rules! entry {
    (record $ty:ty) => {
        entry!(record $ty, <$ty as WireRecord>::TYPE_NAME)
    };
    (record $ty:ty, $name:expr) => {
        CatalogEntry {
            name: $name,
            kind: EntryKind::Record,
            normalize: normalize::<$ty>,
        }
    };
    (enumeration $ty:ty) => {
        CatalogEntry {
            name: <$ty as WireEnum>::NAME,
            kind: EntryKind::Enumeration {
                values: <$ty as WireEnum>::VALUES,
            },
            normalize: normalize::<$ty>,
        }
    };
    (family $ty:ty) => {
        CatalogEntry {
            name: <$ty as PolymorphicFamily>::FAMILY,
            kind: EntryKind::Family {
                discriminator: <$ty as PolymorphicFamily>::DISCRIMINATOR,
                kinds: <$ty as PolymorphicFamily>::KINDS,
            },
            normalize: normalize::<$ty>,
        }
    };
}

static CATALOG: &[CatalogEntry] = &[
    entry!(record ApplicationHealthEvaluation),
    entry!(record ApplicationHealthPolicy),
    entry!(enumeration ApplicationPackageCleanupPolicy),
    entry!(record ApplicationParameter),
    entry!(record ApplicationUpgradeDescription),
    entry!(record ApplicationUpgradeProgressInfo),
    entry!(record ApplicationsHealthEvaluation),
    entry!(record CurrentUpgradeDomainProgressInfo),
    entry!(record DeployedApplicationHealthEvaluation),
    entry!(record DeployedApplicationsHealthEvaluation),
    entry!(record DeployedServicePackageHealth),
    entry!(record DeployedServicePackageHealthEvaluation),
    entry!(record DeployedServicePackagesHealthEvaluation),
    entry!(record Epoch),
    entry!(record EventHealthEvaluation),
    entry!(record ExternalStoreProvision),
    entry!(enumeration FailureAction),
    entry!(enumeration FailureReason),
    entry!(record FailureUpgradeDomainProgressInfo),
    entry!(record FileInfo),
    entry!(record FileVersion),
    entry!(record FolderInfo),
    entry!(family HealthEvaluation),
    entry!(record HealthEvaluationWrapper),
    entry!(record HealthEvent),
    entry!(enumeration HealthState),
    entry!(record ImageStoreContent),
    entry!(record ImageStorePathProvision),
    entry!(record Int64RangePartitionInformation),
    entry!(record MonitoringPolicyDescription),
    entry!(record NamedPartitionInformation),
    entry!(record NamedPartitionSchemeDescription),
    entry!(record NodeHealthEvaluation),
    entry!(enumeration NodeUpgradePhase),
    entry!(record NodeUpgradeProgressInfo),
    entry!(record NodesHealthEvaluation),
    entry!(record PagedServiceInfoList, "PagedServiceInfoList"),
    entry!(record PagedServicePartitionInfoList, "PagedServicePartitionInfoList"),
    entry!(record PartitionHealthEvaluation),
    entry!(family PartitionInformation),
    entry!(record PartitionSafetyCheck),
    entry!(family PartitionSchemeDescription),
    entry!(record PartitionsHealthEvaluation),
    entry!(family ProvisionApplicationTypeDescription),
    entry!(record ReplicaHealthEvaluation),
    entry!(record ReplicasHealthEvaluation),
    entry!(family SafetyCheck),
    entry!(record SafetyCheckWrapper),
    entry!(record SeedNodeSafetyCheck),
    entry!(record ServiceHealthEvaluation),
    entry!(family ServiceInfo),
    entry!(family ServicePartitionInfo),
    entry!(enumeration ServicePartitionStatus),
    entry!(enumeration ServiceStatus),
    entry!(record ServiceTypeHealthPolicy),
    entry!(record ServiceTypeHealthPolicyMapItem),
    entry!(record ServicesHealthEvaluation),
    entry!(record SingletonPartitionInformation),
    entry!(record SingletonPartitionSchemeDescription),
    entry!(record StatefulServiceInfo),
    entry!(record StatefulServicePartitionInfo),
    entry!(record StatelessServiceInfo),
    entry!(record StatelessServicePartitionInfo),
    entry!(record SystemApplicationHealthEvaluation),
    entry!(record UniformInt64RangePartitionSchemeDescription),
    entry!(record UpgradeDomainDeployedApplicationsHealthEvaluation),
    entry!(record UpgradeDomainInfo),
    entry!(record UpgradeDomainNodesHealthEvaluation),
    entry!(enumeration UpgradeDomainState),
    entry!(enumeration UpgradeKind),
    entry!(enumeration UpgradeMode),
    entry!(enumeration UpgradeSortOrder),
    entry!(enumeration UpgradeState),
];

type PagedServiceInfoList = PagedList<ServiceInfo>;
type PagedServicePartitionInfoList = PagedList<ServicePartitionInfo>;

pub fn entries() -> &'static [CatalogEntry] {
    CATALOG
}

/// Exact, case-sensitive lookup by wire type name.
pub fn lookup(name: &str) -> Option<&'static CatalogEntry> {
    CATALOG
        .binary_search_by(|entry| entry.name.cmp(name))
        .ok()
        .map(|idx| &CATALOG[idx])
}
