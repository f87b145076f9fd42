use serde::{Deserialize, Serialize};

use super::template::{SnmpOverrides, TemplateId, TemplateTable};

pub type HostId = u64;

const NETWORK_SITES: &str = "network_sites";

/// Coarse classification of a host, as supplied by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum HostCategory {
    /// A network site (tower, POP, ...).
    NetworkSite,
    /// Any other piece of equipment. The original label is kept for round-tripping.
    #[default]
    Equipment,
    Other(String),
}

impl HostCategory {
    pub fn is_network_site(&self) -> bool {
        matches!(self, Self::NetworkSite)
    }
}

impl From<String> for HostCategory {
    fn from(value: String) -> Self {
        match value.as_str() {
            NETWORK_SITES => Self::NetworkSite,
            "" | "equipment" => Self::Equipment,
            _ => Self::Other(value),
        }
    }
}

impl From<HostCategory> for String {
    fn from(category: HostCategory) -> Self {
        match category {
            HostCategory::NetworkSite => NETWORK_SITES.to_string(),
            HostCategory::Equipment => "equipment".to_string(),
            HostCategory::Other(label) => label,
        }
    }
}

/// One device to poll. Produced upstream and only ever read here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostDescriptor {
    pub id: HostId,
    #[serde(rename = "ip")]
    pub address: String,
    pub template_id: TemplateId,
    #[serde(rename = "snmp_overrides", default)]
    pub overrides: SnmpOverrides,
    #[serde(rename = "type", default)]
    pub category: HostCategory,
}

impl HostDescriptor {
    pub fn new(id: HostId, address: impl Into<String>, template_id: TemplateId) -> Self {
        Self {
            id,
            address: address.into(),
            template_id,
            overrides: SnmpOverrides::default(),
            category: HostCategory::default(),
        }
    }

    pub fn with_category(mut self, category: HostCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_overrides(mut self, overrides: SnmpOverrides) -> Self {
        self.overrides = overrides;
        self
    }
}

/// A complete unit of work: the hosts and the templates they reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PollRequest {
    pub hosts: Vec<HostDescriptor>,
    #[serde(default)]
    pub templates: TemplateTable,
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
