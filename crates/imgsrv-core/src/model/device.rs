use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::codes::{code_enum, entity_fields};
use super::{Entity, EntityKey};
use crate::criteria::UpdateColumns;

code_enum! {
    /// Role of a remote DICOM application entity
    DeviceType {
        Workstation => "Workstation",
        Modality => "Modality",
        Server => "Server",
        Broker => "Broker",
        PriorsServer => "PriorsServer",
    }
}

/// A remote application entity known to a partition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub key: EntityKey,
    pub server_partition_key: EntityKey,
    pub ae_title: String,
    pub description: String,
    pub ip_address: String,
    pub port: u16,
    pub enabled: bool,
    pub dhcp: bool,
    pub allow_storage: bool,
    pub allow_retrieve: bool,
    pub allow_query: bool,
    pub allow_auto_route: bool,
    pub throttle_max_connections: i32,
    pub device_type: DeviceType,
    pub last_accessed_time: Option<DateTime<Utc>>,
}

entity_fields! {
    /// Columns of [`Device`]
    DeviceField {
        Key => "key",
        ServerPartitionKey => "server_partition_key",
        AeTitle => "ae_title",
        Description => "description",
        IpAddress => "ip_address",
        Port => "port",
        Enabled => "enabled",
        Dhcp => "dhcp",
        AllowStorage => "allow_storage",
        AllowRetrieve => "allow_retrieve",
        AllowQuery => "allow_query",
        AllowAutoRoute => "allow_auto_route",
        ThrottleMaxConnections => "throttle_max_connections",
        DeviceType => "device_type",
        LastAccessedTime => "last_accessed_time",
    }
}

impl Entity for Device {
    type Field = DeviceField;
    const NAME: &'static str = "Device";
    const TABLE: &'static str = "device";

    fn key(&self) -> &EntityKey {
        &self.key
    }
}

impl Device {
    /// Columns for a new device on `partition`
    pub fn columns(
        partition: &EntityKey,
        ae_title: impl Into<String>,
        ip_address: impl Into<String>,
        port: u16,
    ) -> UpdateColumns<Device> {
        UpdateColumns::new()
            .set(DeviceField::ServerPartitionKey, partition)
            .set(DeviceField::AeTitle, ae_title.into())
            .set(DeviceField::IpAddress, ip_address.into())
            .set(DeviceField::Port, port)
    }

    pub fn to_columns(&self) -> UpdateColumns<Device> {
        use DeviceField as F;
        UpdateColumns::new()
            .set(F::ServerPartitionKey, &self.server_partition_key)
            .set(F::AeTitle, &self.ae_title)
            .set(F::Description, &self.description)
            .set(F::IpAddress, &self.ip_address)
            .set(F::Port, self.port)
            .set(F::Enabled, self.enabled)
            .set(F::Dhcp, self.dhcp)
            .set(F::AllowStorage, self.allow_storage)
            .set(F::AllowRetrieve, self.allow_retrieve)
            .set(F::AllowQuery, self.allow_query)
            .set(F::AllowAutoRoute, self.allow_auto_route)
            .set(F::ThrottleMaxConnections, self.throttle_max_connections)
            .set(F::DeviceType, self.device_type)
            .set(F::LastAccessedTime, self.last_accessed_time)
    }
}
