//! # Type Identification
//!
//! A device announces what it is through `sysObjectID.0`. The value is read
//! in its rendered library form (`OID: .1.3.6.1.4.1.14988.1`) and reduced to
//! the bare dotted identifier the dispatch table is keyed on.

use std::fmt;

use fleetpoll_common::PollError;
use fleetpoll_protocols::{SnmpSession, ValueExt, VarBind, value};

/// sysObjectID.0
pub const SYS_OBJECT_ID: &[u32] = &[1, 3, 6, 1, 2, 1, 1, 2, 0];

/// Dotted numeric identifier without a leading dot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeIdentifier(String);

impl TypeIdentifier {
    /// Takes the text after the final `:`, trims it and drops one leading `.`.
    pub fn parse(rendered: &str) -> Result<Self, PollError> {
        let tail: &str = rendered.rsplit(':').next().unwrap_or_default().trim();
        let tail: &str = tail.strip_prefix('.').unwrap_or(tail);

        let valid: bool = !tail.is_empty() && tail.split('.').all(|arc| arc.parse::<u32>().is_ok());
        if !valid {
            return Err(PollError::malformed(format!("unusable sysObjectID {rendered:?}")));
        }
        Ok(Self(tail.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Issues exactly one GET for `sysObjectID.0`.
pub fn identify(session: &mut dyn SnmpSession) -> Result<TypeIdentifier, PollError> {
    let vb: VarBind = session.get(&value::oid(SYS_OBJECT_ID))?;
    if vb.value.is_exception() {
        return Err(PollError::malformed(format!("sysObjectID not available: {}", vb.value.render())));
    }
    TypeIdentifier::parse(&vb.value.render())
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
