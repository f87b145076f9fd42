//! # Generic Device Mapper
//!
//! Decodes what every SNMP agent is expected to expose: the MIB-II system
//! group, the interface tables, the IPv4 address table and the bridge
//! forwarding table. Network sites additionally have their ARP table read.

use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use fleetpoll_common::PollError;
use fleetpoll_common::fleet::record::{DeviceRecord, InterfaceRecord, SystemInfo};
use fleetpoll_protocols::value;
use fleetpoll_protocols::{ErrorStatus, Oid, OidExt, SnmpError, SnmpSession, Value, ValueExt, VarBind};
use pnet::ipnetwork::Ipv4Network;
use pnet::util::MacAddr;
use tracing::debug;

use crate::kind::MapperKind;
use crate::mapper::{DeviceMapper, HostContext};

const SYS_DESCR: &[u32] = &[1, 3, 6, 1, 2, 1, 1, 1, 0];
const SYS_UPTIME: &[u32] = &[1, 3, 6, 1, 2, 1, 1, 3, 0];
const SYS_CONTACT: &[u32] = &[1, 3, 6, 1, 2, 1, 1, 4, 0];
const SYS_NAME: &[u32] = &[1, 3, 6, 1, 2, 1, 1, 5, 0];
const SYS_LOCATION: &[u32] = &[1, 3, 6, 1, 2, 1, 1, 6, 0];

const IF_DESCR: &[u32] = &[1, 3, 6, 1, 2, 1, 2, 2, 1, 2];
const IF_TYPE: &[u32] = &[1, 3, 6, 1, 2, 1, 2, 2, 1, 3];
const IF_SPEED: &[u32] = &[1, 3, 6, 1, 2, 1, 2, 2, 1, 5];
const IF_PHYS_ADDRESS: &[u32] = &[1, 3, 6, 1, 2, 1, 2, 2, 1, 6];
const IF_OPER_STATUS: &[u32] = &[1, 3, 6, 1, 2, 1, 2, 2, 1, 8];
const IF_NAME: &[u32] = &[1, 3, 6, 1, 2, 1, 31, 1, 1, 1, 1];

const IP_AD_ENT_IF_INDEX: &[u32] = &[1, 3, 6, 1, 2, 1, 4, 20, 1, 2];
const IP_AD_ENT_NET_MASK: &[u32] = &[1, 3, 6, 1, 2, 1, 4, 20, 1, 3];

const DOT1D_BASE_PORT_IF_INDEX: &[u32] = &[1, 3, 6, 1, 2, 1, 17, 1, 4, 1, 2];
const DOT1D_TP_FDB_PORT: &[u32] = &[1, 3, 6, 1, 2, 1, 17, 4, 3, 1, 2];

const IP_NET_TO_MEDIA_PHYS_ADDRESS: &[u32] = &[1, 3, 6, 1, 2, 1, 4, 22, 1, 2];

const IF_OPER_UP: i64 = 1;

#[derive(Debug, Clone, Copy, Default)]
pub struct GenericDeviceMapper;

impl GenericDeviceMapper {
    pub fn new() -> Self {
        Self
    }
}

impl DeviceMapper for GenericDeviceMapper {
    fn map(&self, session: &mut dyn SnmpSession, ctx: &HostContext) -> Result<DeviceRecord, PollError> {
        let mut record: DeviceRecord = ctx.record();
        record.system = read_system(session)?;

        let mut interfaces: BTreeMap<u32, InterfaceRecord> = read_interfaces(session)?;
        read_addresses(session, &mut interfaces)?;
        read_forwarding_table(session, &mut interfaces)?;

        let gather_arp: bool = match ctx.kind {
            MapperKind::Generic { network_site } => network_site,
            _ => ctx.category.is_network_site(),
        };
        if gather_arp {
            read_arp_table(session, &mut interfaces)?;
        }

        for iface in interfaces.values_mut() {
            iface.connected_l2_macs.sort();
            iface.connected_l2_macs.dedup();
            iface.connected_l3_macs.sort();
            iface.connected_l3_macs.dedup();
        }
        record.interfaces = interfaces.into_values().collect();

        debug!(
            id = ctx.id,
            mapper = %ctx.kind,
            interfaces = record.interfaces.len(),
            "mapped device"
        );
        Ok(record)
    }
}

fn read_system(session: &mut dyn SnmpSession) -> Result<SystemInfo, PollError> {
    let text = |v: Option<Value>| v.and_then(|v| v.text());

    Ok(SystemInfo {
        description: text(scalar(session, SYS_DESCR)?),
        uptime_ticks: scalar(session, SYS_UPTIME)?.and_then(|v| match v {
            Value::TimeTicks(t) => Some(t),
            other => other.unsigned().and_then(|t| u32::try_from(t).ok()),
        }),
        contact: text(scalar(session, SYS_CONTACT)?),
        name: text(scalar(session, SYS_NAME)?),
        location: text(scalar(session, SYS_LOCATION)?),
    })
}

/// GETs one scalar. Missing objects are `None`, transport failures are errors.
fn scalar(session: &mut dyn SnmpSession, arcs: &[u32]) -> Result<Option<Value>, PollError> {
    match session.get(&value::oid(arcs)) {
        Ok(vb) if vb.value.is_exception() => Ok(None),
        Ok(vb) => Ok(Some(vb.value)),
        Err(SnmpError::Agent(ErrorStatus::NoSuchName)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Walks a table column and keys each row by its instance suffix.
fn column(session: &mut dyn SnmpSession, arcs: &[u32]) -> Result<Vec<(Vec<u32>, Value)>, PollError> {
    let root: Oid = value::oid(arcs);
    let rows: Vec<VarBind> = session.walk(&root)?;
    Ok(rows
        .into_iter()
        .filter_map(|vb| {
            let suffix: Vec<u32> = vb.oid.arcs_after(&root)?.to_vec();
            Some((suffix, vb.value))
        })
        .collect())
}

/// Rows of a column indexed by a single integer, such as ifIndex.
fn indexed_column(session: &mut dyn SnmpSession, arcs: &[u32]) -> Result<Vec<(u32, Value)>, PollError> {
    Ok(column(session, arcs)?
        .into_iter()
        .filter_map(|(suffix, value)| match suffix.as_slice() {
            [index] => Some((*index, value)),
            _ => None,
        })
        .collect())
}

fn read_interfaces(session: &mut dyn SnmpSession) -> Result<BTreeMap<u32, InterfaceRecord>, PollError> {
    let mut interfaces: BTreeMap<u32, InterfaceRecord> = BTreeMap::new();

    for (index, value) in indexed_column(session, IF_DESCR)? {
        interface(&mut interfaces, index).description = value.text();
    }
    for (index, value) in indexed_column(session, IF_NAME)? {
        interface(&mut interfaces, index).name = value.text();
    }
    for (index, value) in indexed_column(session, IF_TYPE)? {
        interface(&mut interfaces, index).if_type = value.signed();
    }
    for (index, value) in indexed_column(session, IF_SPEED)? {
        interface(&mut interfaces, index).speed_bps = value.unsigned();
    }
    for (index, value) in indexed_column(session, IF_PHYS_ADDRESS)? {
        interface(&mut interfaces, index).mac = value.raw_bytes().and_then(format_mac);
    }
    for (index, value) in indexed_column(session, IF_OPER_STATUS)? {
        interface(&mut interfaces, index).up = value.signed() == Some(IF_OPER_UP);
    }
    Ok(interfaces)
}

fn interface(map: &mut BTreeMap<u32, InterfaceRecord>, index: u32) -> &mut InterfaceRecord {
    map.entry(index).or_insert_with(|| InterfaceRecord {
        index,
        ..InterfaceRecord::default()
    })
}

fn read_addresses(
    session: &mut dyn SnmpSession,
    interfaces: &mut BTreeMap<u32, InterfaceRecord>,
) -> Result<(), PollError> {
    let masks: BTreeMap<Ipv4Addr, Ipv4Addr> = column(session, IP_AD_ENT_NET_MASK)?
        .into_iter()
        .filter_map(|(suffix, value)| Some((ipv4_from_arcs(&suffix)?, value.ipv4()?)))
        .collect();

    for (suffix, value) in column(session, IP_AD_ENT_IF_INDEX)? {
        let (Some(ip), Some(index)) = (ipv4_from_arcs(&suffix), value.unsigned()) else {
            continue;
        };
        let Ok(index) = u32::try_from(index) else {
            continue;
        };
        let prefix: u8 = masks.get(&ip).and_then(|m| prefix_len(*m)).unwrap_or(32);
        if let Ok(network) = Ipv4Network::new(ip, prefix) {
            interface(interfaces, index).ip_addresses.push(network.to_string());
        }
    }
    Ok(())
}

fn read_forwarding_table(
    session: &mut dyn SnmpSession,
    interfaces: &mut BTreeMap<u32, InterfaceRecord>,
) -> Result<(), PollError> {
    let port_to_if: BTreeMap<u32, u32> = indexed_column(session, DOT1D_BASE_PORT_IF_INDEX)?
        .into_iter()
        .filter_map(|(port, value)| Some((port, u32::try_from(value.unsigned()?).ok()?)))
        .collect();
    if port_to_if.is_empty() {
        return Ok(());
    }

    for (suffix, value) in column(session, DOT1D_TP_FDB_PORT)? {
        let Some(mac) = mac_from_arcs(&suffix) else {
            continue;
        };
        let port: Option<u32> = value.unsigned().and_then(|p| u32::try_from(p).ok());
        if let Some(index) = port.and_then(|p| port_to_if.get(&p)) {
            interface(interfaces, *index).connected_l2_macs.push(mac);
        }
    }
    Ok(())
}

fn read_arp_table(
    session: &mut dyn SnmpSession,
    interfaces: &mut BTreeMap<u32, InterfaceRecord>,
) -> Result<(), PollError> {
    for (suffix, value) in column(session, IP_NET_TO_MEDIA_PHYS_ADDRESS)? {
        let Some(index) = suffix.first().copied() else {
            continue;
        };
        if let Some(mac) = value.raw_bytes().and_then(format_mac) {
            interface(interfaces, index).connected_l3_macs.push(mac);
        }
    }
    Ok(())
}

fn format_mac(bytes: &[u8]) -> Option<String> {
    match bytes {
        [a, b, c, d, e, f] => Some(MacAddr::new(*a, *b, *c, *d, *e, *f).to_string()),
        _ => None,
    }
}

fn mac_from_arcs(arcs: &[u32]) -> Option<String> {
    let bytes: Vec<u8> = arcs.iter().map(|a| u8::try_from(*a).ok()).collect::<Option<_>>()?;
    format_mac(&bytes)
}

fn ipv4_from_arcs(arcs: &[u32]) -> Option<Ipv4Addr> {
    match arcs {
        [a, b, c, d] => Some(Ipv4Addr::new(
            u8::try_from(*a).ok()?,
            u8::try_from(*b).ok()?,
            u8::try_from(*c).ok()?,
            u8::try_from(*d).ok()?,
        )),
        _ => None,
    }
}

/// Prefix length of a contiguous netmask.
fn prefix_len(mask: Ipv4Addr) -> Option<u8> {
    let bits: u32 = u32::from(mask);
    (bits.leading_ones() == bits.count_ones()).then(|| bits.count_ones() as u8)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
