//! SNMP access for the poller: a blocking session over the `async-snmp`
//! client, typed value accessors and an in-memory MIB for scripted sessions.

pub mod client;
pub mod mib;
pub mod value;

pub use async_snmp::ErrorStatus;
pub use client::{SecurityProfile, SessionProfile, SnmpError, SnmpSession, UdpSession};
pub use value::{Oid, OidExt, Value, ValueExt, VarBind};
