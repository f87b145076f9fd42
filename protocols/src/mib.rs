//! In-memory MIB view.
//!
//! Answers GET and GETNEXT the way an agent does. Backs the loopback agent in
//! the integration tests and, through [`MibSession`], wherever a session has to
//! be scripted without a network.

use std::collections::BTreeMap;

use async_snmp::ErrorStatus;
use tracing::warn;

use crate::client::{SnmpError, SnmpSession};
use crate::value::{self, Oid, Value, ValueExt, VarBind};

#[derive(Debug, Clone, Default)]
pub struct MibView {
    rows: BTreeMap<Oid, Value>,
}

impl MibView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, oid: Oid, value: Value) -> &mut Self {
        self.rows.insert(oid, value);
        self
    }

    /// Builder form of [`insert`](Self::insert). Unparsable OIDs are skipped.
    pub fn with(mut self, oid: &str, value: Value) -> Self {
        match value::parse_oid(oid) {
            Ok(oid) => {
                self.rows.insert(oid, value);
            }
            Err(e) => warn!(oid, error = %e, "skipping MIB row"),
        }
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, oid: &Oid) -> Option<&Value> {
        self.rows.get(oid)
    }

    /// First row strictly after `oid` in lexicographic order.
    pub fn next_after(&self, oid: &Oid) -> Option<(&Oid, &Value)> {
        self.rows.range(oid.clone()..).find(|(k, _)| *k > oid)
    }

    /// v2c-style GET answer: missing rows become `noSuchObject`.
    pub fn answer_get(&self, oid: &Oid) -> VarBind {
        let value: Value = self.get(oid).cloned().unwrap_or(Value::NoSuchObject);
        VarBind::new(oid.clone(), value)
    }

    /// v2c-style GETNEXT answer: `endOfMibView` past the last row.
    pub fn answer_get_next(&self, oid: &Oid) -> VarBind {
        match self.next_after(oid) {
            Some((k, v)) => VarBind::new(k.clone(), v.clone()),
            None => VarBind::new(oid.clone(), Value::EndOfMibView),
        }
    }
}

/// A session answered from a [`MibView`], counting the requests it serves.
#[derive(Debug, Clone)]
pub struct MibSession {
    view: MibView,
    v1: bool,
    requests: usize,
    fail_with: Option<fn() -> SnmpError>,
}

impl MibSession {
    pub fn new(view: MibView) -> Self {
        Self {
            view,
            v1: false,
            requests: 0,
            fail_with: None,
        }
    }

    /// Reports missing rows with the v1 `noSuchName` error status.
    pub fn v1(mut self) -> Self {
        self.v1 = true;
        self
    }

    /// Makes every request fail with the error `make` builds.
    pub fn failing(mut self, make: fn() -> SnmpError) -> Self {
        self.fail_with = Some(make);
        self
    }

    pub fn requests(&self) -> usize {
        self.requests
    }

    fn answer(&mut self, vb: VarBind) -> Result<VarBind, SnmpError> {
        self.requests += 1;
        if let Some(make) = self.fail_with {
            return Err(make());
        }
        if self.v1 && vb.value.is_exception() {
            return Err(SnmpError::Agent(ErrorStatus::NoSuchName));
        }
        Ok(vb)
    }
}

impl SnmpSession for MibSession {
    fn get(&mut self, oid: &Oid) -> Result<VarBind, SnmpError> {
        let vb: VarBind = self.view.answer_get(oid);
        self.answer(vb)
    }

    fn get_next(&mut self, oid: &Oid) -> Result<VarBind, SnmpError> {
        let vb: VarBind = self.view.answer_get_next(oid);
        self.answer(vb)
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
