//! # Mapper Dispatch
//!
//! Exact-match table from type identifier to mapping strategy. One identifier
//! is shared by two Ubiquiti product lines and needs one more query to tell
//! them apart; everything the table does not know goes to the generic mapper.

use fleetpoll_common::PollError;
use fleetpoll_common::fleet::host::HostCategory;
use fleetpoll_plugins::MapperKind;
use fleetpoll_protocols::{ErrorStatus, Oid, OidExt, SnmpError, SnmpSession, ValueExt, value};
use tracing::trace;

use crate::identify::TypeIdentifier;

/// Where a table entry leads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Mapper(MapperKind),
    Disambiguate(Disambiguation),
}

/// Identifiers that name more than one strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disambiguation {
    /// airOS radios and EdgeOS routers share one enterprise identifier.
    Ubiquiti,
}

/// dot11manufacturerProductVersion, only populated by airOS radios.
pub const DOT11_MANUFACTURER_PRODUCT_VERSION: &[u32] = &[1, 2, 840, 10036, 3, 1, 2, 1, 3];

pub const DISPATCH_TABLE: &[(&str, Route)] = &[
    ("1.3.6.1.4.1.161.19.250.256", Route::Mapper(MapperKind::CambiumCanopyPmp)),
    ("1.3.6.1.4.1.17713.21", Route::Mapper(MapperKind::CambiumEpmp)),
    ("1.3.6.1.4.1.17713.21.1.1.2", Route::Mapper(MapperKind::CambiumEpmp)),
    ("1.3.6.1.4.1.41112.1.4", Route::Mapper(MapperKind::UbiquitiAirMax)),
    ("1.3.6.1.4.1.17713.7", Route::Mapper(MapperKind::CambiumPtp650)),
    ("1.3.6.1.4.1.17713.6", Route::Mapper(MapperKind::CambiumPtp600)),
    ("1.3.6.1.4.1.17713.250", Route::Mapper(MapperKind::CambiumPtp250)),
    ("1.3.6.1.4.1.17713.5", Route::Mapper(MapperKind::CambiumPtp500)),
    ("1.3.6.1.4.1.17713.11", Route::Mapper(MapperKind::CambiumPtp670)),
    ("1.3.6.1.4.1.17713.9", Route::Mapper(MapperKind::CambiumPtp700)),
    ("1.3.6.1.4.1.17713.8", Route::Mapper(MapperKind::CambiumPtp800)),
    ("1.3.6.1.4.1.10002.1", Route::Disambiguate(Disambiguation::Ubiquiti)),
    ("1.3.6.1.4.1.43356.1.1.1", Route::Mapper(MapperKind::MimosaBx)),
    ("1.3.6.1.4.1.43356.1.1.2", Route::Mapper(MapperKind::MimosaBx)),
    ("1.3.6.1.4.1.43356.1.1.3", Route::Mapper(MapperKind::MimosaAx)),
    ("1.3.6.1.4.1.2736.1.1", Route::Mapper(MapperKind::EtherwanSwitch)),
    ("1.3.6.1.4.1.14988.1", Route::Mapper(MapperKind::MikroTik)),
];

/// Table lookup without any network traffic.
pub fn route(id: &TypeIdentifier, category: &HostCategory) -> Route {
    DISPATCH_TABLE
        .iter()
        .find(|(key, _)| *key == id.as_str())
        .map(|(_, route)| *route)
        .unwrap_or(Route::Mapper(MapperKind::Generic {
            network_site: category.is_network_site(),
        }))
}

/// Picks the strategy for a host, querying it once more when the identifier is shared.
pub fn select(
    session: &mut dyn SnmpSession,
    id: &TypeIdentifier,
    category: &HostCategory,
) -> Result<MapperKind, PollError> {
    match route(id, category) {
        Route::Mapper(kind) => Ok(kind),
        Route::Disambiguate(Disambiguation::Ubiquiti) => disambiguate_ubiquiti(session),
    }
}

fn disambiguate_ubiquiti(session: &mut dyn SnmpSession) -> Result<MapperKind, PollError> {
    let root: Oid = value::oid(DOT11_MANUFACTURER_PRODUCT_VERSION);
    let has_radio: bool = match session.get_next(&root) {
        Ok(vb) => vb.oid.is_within(&root) && !vb.value.is_exception(),
        Err(SnmpError::Agent(ErrorStatus::NoSuchName)) => false,
        Err(e) => return Err(e.into()),
    };

    let kind: MapperKind = if has_radio {
        MapperKind::UbiquitiAirMax
    } else {
        MapperKind::UbiquitiEdge
    };
    trace!(%kind, "resolved shared Ubiquiti identifier");
    Ok(kind)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
