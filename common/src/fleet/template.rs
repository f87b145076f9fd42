//! # Configuration Templates
//!
//! A template is a named bundle of SNMP settings shared by many hosts. Each
//! host may override any field of its template through [`SnmpOverrides`].

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub type TemplateId = u64;

/// Templates keyed by id, as handed to a poll.
pub type TemplateTable = HashMap<TemplateId, ConfigTemplate>;

/// Protocol version. Any number other than 2 or 3 means v1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum SnmpVersion {
    #[default]
    V1,
    V2c,
    V3,
}

impl From<u8> for SnmpVersion {
    fn from(value: u8) -> Self {
        match value {
            2 => Self::V2c,
            3 => Self::V3,
            _ => Self::V1,
        }
    }
}

impl From<SnmpVersion> for u8 {
    fn from(version: SnmpVersion) -> Self {
        match version {
            SnmpVersion::V1 => 1,
            SnmpVersion::V2c => 2,
            SnmpVersion::V3 => 3,
        }
    }
}

impl fmt::Display for SnmpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V1 => write!(f, "v1"),
            Self::V2c => write!(f, "v2c"),
            Self::V3 => write!(f, "v3"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SecurityLevel {
    #[default]
    #[serde(rename = "noAuthNoPriv")]
    NoAuthNoPriv,
    #[serde(rename = "authNoPriv")]
    AuthNoPriv,
    #[serde(rename = "authPriv")]
    AuthPriv,
}

impl SecurityLevel {
    pub fn authenticated(self) -> bool {
        !matches!(self, Self::NoAuthNoPriv)
    }

    pub fn private(self) -> bool {
        matches!(self, Self::AuthPriv)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthProtocol {
    #[serde(rename = "MD5")]
    Md5,
    #[serde(rename = "SHA")]
    Sha1,
    #[serde(rename = "SHA-224")]
    Sha224,
    #[serde(rename = "SHA-256")]
    Sha256,
    #[serde(rename = "SHA-384")]
    Sha384,
    #[serde(rename = "SHA-512")]
    Sha512,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrivProtocol {
    #[serde(rename = "DES")]
    Des,
    #[serde(rename = "AES")]
    Aes,
}

/// Default SNMP settings for every host that references this template.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConfigTemplate {
    #[serde(rename = "snmp_version", default)]
    pub version: SnmpVersion,
    #[serde(rename = "snmp_community", default)]
    pub community: String,
    #[serde(rename = "snmp3_sec_level", default)]
    pub sec_level: Option<SecurityLevel>,
    #[serde(rename = "snmp3_auth_protocol", default)]
    pub auth_protocol: Option<AuthProtocol>,
    #[serde(rename = "snmp3_auth_passphrase", default)]
    pub auth_passphrase: Option<String>,
    #[serde(rename = "snmp3_priv_protocol", default)]
    pub priv_protocol: Option<PrivProtocol>,
    #[serde(rename = "snmp3_priv_passphrase", default)]
    pub priv_passphrase: Option<String>,
    #[serde(rename = "snmp3_context_name", default)]
    pub context_name: Option<String>,
    #[serde(rename = "snmp3_context_engine_id", default)]
    pub context_engine_id: Option<String>,
}

/// Per-host replacements for individual template fields. `None` keeps the template value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SnmpOverrides {
    #[serde(rename = "snmp_version", default)]
    pub version: Option<SnmpVersion>,
    #[serde(rename = "snmp_community", default)]
    pub community: Option<String>,
    #[serde(rename = "snmp3_sec_level", default)]
    pub sec_level: Option<SecurityLevel>,
    #[serde(rename = "snmp3_auth_protocol", default)]
    pub auth_protocol: Option<AuthProtocol>,
    #[serde(rename = "snmp3_auth_passphrase", default)]
    pub auth_passphrase: Option<String>,
    #[serde(rename = "snmp3_priv_protocol", default)]
    pub priv_protocol: Option<PrivProtocol>,
    #[serde(rename = "snmp3_priv_passphrase", default)]
    pub priv_passphrase: Option<String>,
    #[serde(rename = "snmp3_context_name", default)]
    pub context_name: Option<String>,
    #[serde(rename = "snmp3_context_engine_id", default)]
    pub context_engine_id: Option<String>,
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
