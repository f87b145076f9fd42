use std::collections::HashMap;
use std::sync::Arc;

use fleetpoll_common::PollError;
use fleetpoll_common::fleet::record::DeviceRecord;
use fleetpoll_protocols::SnmpSession;
use tracing::trace;

use crate::generic::GenericDeviceMapper;
use crate::kind::MapperKind;
use crate::mapper::{DeviceMapper, HostContext};

/// Binds each vendor strategy to the mapper that decodes it.
///
/// Shared read-only between workers once built.
#[derive(Clone)]
pub struct MapperRegistry {
    vendors: HashMap<MapperKind, Arc<dyn DeviceMapper>>,
    generic: Arc<dyn DeviceMapper>,
}

impl MapperRegistry {
    /// A registry with nothing but the generic fallback bound.
    pub fn empty() -> Self {
        Self {
            vendors: HashMap::new(),
            generic: Arc::new(GenericDeviceMapper::new()),
        }
    }

    /// Every vendor strategy decoded by the generic interface mapper.
    pub fn standard() -> Self {
        let generic: Arc<dyn DeviceMapper> = Arc::new(GenericDeviceMapper::new());
        let vendors: HashMap<MapperKind, Arc<dyn DeviceMapper>> = MapperKind::VENDOR
            .iter()
            .map(|kind| (*kind, Arc::clone(&generic)))
            .collect();
        Self { vendors, generic }
    }

    /// Binds `mapper` to `kind`. Binding a generic kind replaces the fallback.
    pub fn register(&mut self, kind: MapperKind, mapper: Arc<dyn DeviceMapper>) -> &mut Self {
        match kind {
            MapperKind::Generic { .. } => self.generic = mapper,
            vendor => {
                self.vendors.insert(vendor, mapper);
            }
        }
        self
    }

    pub fn resolve(&self, kind: MapperKind) -> Option<&Arc<dyn DeviceMapper>> {
        match kind {
            MapperKind::Generic { .. } => Some(&self.generic),
            vendor => self.vendors.get(&vendor),
        }
    }

    /// Runs the mapper bound to `ctx.kind`.
    pub fn map(&self, session: &mut dyn SnmpSession, ctx: &HostContext) -> Result<DeviceRecord, PollError> {
        let mapper: &Arc<dyn DeviceMapper> = self
            .resolve(ctx.kind)
            .ok_or_else(|| PollError::unsupported(format!("no mapper bound for {}", ctx.kind)))?;
        trace!(id = ctx.id, mapper = %ctx.kind, "running mapper");
        mapper.map(session, ctx)
    }
}

impl Default for MapperRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for MapperRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut bound: Vec<&'static str> = self.vendors.keys().map(|k| k.name()).collect();
        bound.sort_unstable();
        f.debug_struct("MapperRegistry").field("vendors", &bound).finish()
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
