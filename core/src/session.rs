//! # Session Builder
//!
//! Resolves the effective protocol parameters of one host: every field the
//! host overrides wins, every other field comes from its template. Timeout
//! and retries are process-wide and never taken from either.

use std::time::Duration;

use fleetpoll_common::config::PollerConfig;
use fleetpoll_common::fleet::host::HostDescriptor;
use fleetpoll_common::fleet::template::{ConfigTemplate, SnmpVersion};
use fleetpoll_protocols::{SecurityProfile, SessionProfile, SnmpSession, UdpSession};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionBuilder {
    timeout: Duration,
    retries: u32,
}

impl SessionBuilder {
    pub fn new(timeout: Duration, retries: u32) -> Self {
        Self { timeout, retries }
    }

    pub fn from_config(config: &PollerConfig) -> Self {
        Self::new(config.timeout, config.retries)
    }

    /// Never fails and never touches the network. Problems with the resolved
    /// parameters surface on the first query.
    pub fn build(&self, host: &HostDescriptor, template: &ConfigTemplate) -> SessionProfile {
        let o = &host.overrides;
        let version: SnmpVersion = o.version.unwrap_or(template.version);
        let community: String = o.community.clone().unwrap_or_else(|| template.community.clone());

        let security: Option<SecurityProfile> = (version == SnmpVersion::V3).then(|| SecurityProfile {
            level: o.sec_level.or(template.sec_level).unwrap_or_default(),
            auth_protocol: o.auth_protocol.or(template.auth_protocol),
            auth_passphrase: o.auth_passphrase.clone().or_else(|| template.auth_passphrase.clone()),
            priv_protocol: o.priv_protocol.or(template.priv_protocol),
            priv_passphrase: o.priv_passphrase.clone().or_else(|| template.priv_passphrase.clone()),
            context_name: o.context_name.clone().or_else(|| template.context_name.clone()),
            context_engine_id: o
                .context_engine_id
                .clone()
                .or_else(|| template.context_engine_id.clone()),
        });

        SessionProfile {
            address: host.address.clone(),
            version,
            community,
            security,
            timeout: self.timeout,
            retries: self.retries,
        }
    }
}

/// Opens the live session for a resolved profile.
pub trait SessionFactory: Send + Sync {
    fn open(&self, profile: SessionProfile) -> Box<dyn SnmpSession>;
}

/// Opens real UDP sessions.
#[derive(Debug, Clone, Copy, Default)]
pub struct UdpSessionFactory;

impl SessionFactory for UdpSessionFactory {
    fn open(&self, profile: SessionProfile) -> Box<dyn SnmpSession> {
        Box::new(UdpSession::new(profile))
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
