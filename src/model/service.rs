//! Purpose: Service descriptions returned by `GET /Applications/{id}/$/GetServices`.
//! Exports: `ServiceInfo`, `StatefulServiceInfo`, `StatelessServiceInfo`, `ServiceStatus`.
use crate::core::schema::{polymorphic, record, wire_enum};
use crate::model::health::HealthState;

wire_enum! {
    pub enum ServiceStatus {
        Unknown = "Unknown",
        Active = "Active",
        Upgrading = "Upgrading",
        Deleting = "Deleting",
        Creating = "Creating",
        Failed = "Failed",
    }
}

record! {
    pub struct StatefulServiceInfo {
        optional "Id" id: String,
        optional "Name" name: String,
        optional "TypeName" type_name: String,
        optional "ManifestVersion" manifest_version: String,
        optional "HealthState" health_state: HealthState,
        optional "ServiceStatus" service_status: ServiceStatus,
        optional "IsServiceGroup" is_service_group: bool,
        optional "HasPersistedState" has_persisted_state: bool,
    }
}

record! {
    pub struct StatelessServiceInfo {
        optional "Id" id: String,
        optional "Name" name: String,
        optional "TypeName" type_name: String,
        optional "ManifestVersion" manifest_version: String,
        optional "HealthState" health_state: HealthState,
        optional "ServiceStatus" service_status: ServiceStatus,
        optional "IsServiceGroup" is_service_group: bool,
    }
}

polymorphic! {
    pub enum ServiceInfo tagged "ServiceKind" {
        "Stateful" => Stateful(StatefulServiceInfo),
        "Stateless" => Stateless(StatelessServiceInfo),
    }
}

impl ServiceInfo {
    pub fn name(&self) -> Option<&str> {
        match self {
            ServiceInfo::Stateful(info) => info.name.as_deref(),
            ServiceInfo::Stateless(info) => info.name.as_deref(),
        }
    }
}
