//! # Device Mapper Contract
//!
//! A mapper turns a live session into a [`DeviceRecord`]. It may issue as many
//! queries as it needs, but it only borrows the session for the duration of
//! [`DeviceMapper::map`] and cannot keep it.

use fleetpoll_common::PollError;
use fleetpoll_common::fleet::host::{HostCategory, HostId};
use fleetpoll_common::fleet::record::DeviceRecord;
use fleetpoll_protocols::SnmpSession;

use crate::kind::MapperKind;

/// What a mapper knows about the host it is decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostContext {
    pub id: HostId,
    pub address: String,
    pub kind: MapperKind,
    pub type_identifier: String,
    pub category: HostCategory,
}

impl HostContext {
    /// Starts a record stamped with this host's id, strategy and identifier.
    pub fn record(&self) -> DeviceRecord {
        DeviceRecord::new(self.id, self.kind.name(), self.type_identifier.clone())
    }
}

pub trait DeviceMapper: Send + Sync {
    fn map(&self, session: &mut dyn SnmpSession, ctx: &HostContext) -> Result<DeviceRecord, PollError>;
}
