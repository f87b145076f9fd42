//! Typed access to the values and identifiers the SNMP client hands back.

use std::net::Ipv4Addr;

pub use async_snmp::{Oid, Value, VarBind};

/// Builds an OID from its arcs.
pub fn oid(arcs: &[u32]) -> Oid {
    Oid::from_slice(arcs)
}

/// Parses dotted notation, with or without the leading dot.
pub fn parse_oid(s: &str) -> Result<Oid, String> {
    let trimmed: &str = s.trim().trim_start_matches('.');
    if trimmed.is_empty() {
        return Err(format!("empty object identifier: {s:?}"));
    }
    let arcs: Vec<u32> = trimmed
        .split('.')
        .map(|arc| arc.parse::<u32>().map_err(|_| format!("bad arc {arc:?} in {s:?}")))
        .collect::<Result<_, _>>()?;
    Ok(Oid::from_slice(&arcs))
}

pub fn string(text: &str) -> Value {
    Value::OctetString(text.as_bytes().to_vec().into())
}

pub fn octets(bytes: &[u8]) -> Value {
    Value::OctetString(bytes.to_vec().into())
}

pub trait OidExt {
    fn is_within(&self, root: &Oid) -> bool;

    /// Arcs following `prefix`, or `None` when `prefix` is not a prefix of this OID.
    fn arcs_after(&self, prefix: &Oid) -> Option<&[u32]>;
}

impl OidExt for Oid {
    fn is_within(&self, root: &Oid) -> bool {
        self.arcs().starts_with(root.arcs())
    }

    fn arcs_after(&self, prefix: &Oid) -> Option<&[u32]> {
        self.arcs().strip_prefix(prefix.arcs())
    }
}

pub trait ValueExt {
    /// v2 exception values stand in for data the agent does not have.
    fn is_exception(&self) -> bool;

    fn text(&self) -> Option<String>;

    fn raw_bytes(&self) -> Option<&[u8]>;

    fn unsigned(&self) -> Option<u64>;

    fn signed(&self) -> Option<i64>;

    fn ipv4(&self) -> Option<Ipv4Addr>;

    /// The net-snmp text form (`OID: .1.3.6...`, `STRING: "..."`).
    fn render(&self) -> String;
}

impl ValueExt for Value {
    fn is_exception(&self) -> bool {
        matches!(self, Value::NoSuchObject | Value::NoSuchInstance | Value::EndOfMibView)
    }

    fn text(&self) -> Option<String> {
        self.raw_bytes()
            .filter(|_| matches!(self, Value::OctetString(_)))
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    fn raw_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::OctetString(bytes) | Value::Opaque(bytes) => Some(&bytes[..]),
            _ => None,
        }
    }

    fn unsigned(&self) -> Option<u64> {
        match self {
            Value::Integer(v) => u64::try_from(*v).ok(),
            Value::Counter32(v) | Value::Gauge32(v) | Value::TimeTicks(v) => Some(u64::from(*v)),
            Value::Counter64(v) => Some(*v),
            _ => None,
        }
    }

    fn signed(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(i64::from(*v)),
            Value::Counter32(v) | Value::Gauge32(v) | Value::TimeTicks(v) => Some(i64::from(*v)),
            _ => None,
        }
    }

    fn ipv4(&self) -> Option<Ipv4Addr> {
        match self {
            Value::IpAddress(octets) => Some(Ipv4Addr::from(*octets)),
            _ => None,
        }
    }

    fn render(&self) -> String {
        match self {
            Value::Integer(v) => format!("INTEGER: {v}"),
            Value::OctetString(bytes) => match std::str::from_utf8(bytes) {
                Ok(text) => format!("STRING: \"{text}\""),
                Err(_) => {
                    let hex: Vec<String> = bytes.iter().map(|b| format!("{b:02X}")).collect();
                    format!("Hex-STRING: {}", hex.join(" "))
                }
            },
            Value::Null => "NULL".to_string(),
            Value::ObjectIdentifier(oid) => format!("OID: .{oid}"),
            Value::IpAddress(octets) => format!("IpAddress: {}", Ipv4Addr::from(*octets)),
            Value::Counter32(v) => format!("Counter32: {v}"),
            Value::Gauge32(v) => format!("Gauge32: {v}"),
            Value::TimeTicks(v) => format!("Timeticks: ({v})"),
            Value::Counter64(v) => format!("Counter64: {v}"),
            Value::NoSuchObject => "No Such Object available on this agent at this OID".to_string(),
            Value::NoSuchInstance => "No Such Instance currently exists at this OID".to_string(),
            Value::EndOfMibView => "No more variables left in this MIB View".to_string(),
            other => format!("{other:?}"),
        }
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
