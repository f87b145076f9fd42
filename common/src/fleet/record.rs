use serde::{Deserialize, Serialize};

use super::host::HostId;

/// Canonical output of a device mapper for one polled host.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub id: HostId,
    /// Name of the strategy that produced this record.
    pub mapper: String,
    pub type_identifier: String,
    #[serde(default)]
    pub system: SystemInfo,
    #[serde(default)]
    pub interfaces: Vec<InterfaceRecord>,
}

impl DeviceRecord {
    pub fn new(id: HostId, mapper: impl Into<String>, type_identifier: impl Into<String>) -> Self {
        Self {
            id,
            mapper: mapper.into(),
            type_identifier: type_identifier.into(),
            system: SystemInfo::default(),
            interfaces: Vec::new(),
        }
    }
}

/// Values from the MIB-II system group.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SystemInfo {
    pub description: Option<String>,
    pub name: Option<String>,
    pub contact: Option<String>,
    pub location: Option<String>,
    pub uptime_ticks: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InterfaceRecord {
    pub index: u32,
    pub name: Option<String>,
    pub description: Option<String>,
    pub if_type: Option<i64>,
    pub speed_bps: Option<u64>,
    pub mac: Option<String>,
    pub up: bool,
    #[serde(default)]
    pub ip_addresses: Vec<String>,
    /// MACs learned on this port through the bridge forwarding table.
    #[serde(default)]
    pub connected_l2_macs: Vec<String>,
    /// MACs found in the ARP table behind this interface.
    #[serde(default)]
    pub connected_l3_macs: Vec<String>,
}
