//! Scripted agents for the unit tests of this crate.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use fleetpoll_common::fleet::template::{ConfigTemplate, SnmpVersion, TemplateId, TemplateTable};
use fleetpoll_protocols::mib::{MibSession, MibView};
use fleetpoll_protocols::{Oid, SessionProfile, SnmpError, SnmpSession, Value, VarBind, value};

use crate::session::SessionFactory;

pub const TEMPLATE_V2C: TemplateId = 1;

pub fn templates() -> TemplateTable {
    let mut table: TemplateTable = TemplateTable::new();
    table.insert(
        TEMPLATE_V2C,
        ConfigTemplate {
            version: SnmpVersion::V2c,
            community: "public".into(),
            ..ConfigTemplate::default()
        },
    );
    table
}

fn device(sys_object_id: &str, name: &str) -> MibView {
    let oid: Oid = value::parse_oid(sys_object_id).unwrap();
    MibView::new()
        .with("1.3.6.1.2.1.1.1.0", value::string("test device"))
        .with("1.3.6.1.2.1.1.2.0", Value::ObjectIdentifier(oid))
        .with("1.3.6.1.2.1.1.5.0", value::string(name))
        .with("1.3.6.1.2.1.2.2.1.2.1", value::string("eth0"))
        .with("1.3.6.1.2.1.2.2.1.8.1", Value::Integer(1))
}

pub fn mikrotik_view() -> MibView {
    device("1.3.6.1.4.1.14988.1", "mikrotik")
}

pub fn unknown_vendor_view() -> MibView {
    device("1.3.6.1.4.1.9.1.1", "cisco")
}

pub fn ubiquiti_radio_view() -> MibView {
    device("1.3.6.1.4.1.10002.1", "airos")
        .with("1.2.840.10036.3.1.2.1.3.5", value::string("XW.ar934x.v6.3.6"))
}

pub fn ubiquiti_edge_view() -> MibView {
    device("1.3.6.1.4.1.10002.1", "edgeos")
}

/// Answers sessions from per-address MIB views. Unknown addresses never respond.
#[derive(Default)]
pub struct FakeAgents {
    views: HashMap<String, MibView>,
    opened: Arc<AtomicUsize>,
    requests: Arc<AtomicUsize>,
}

impl FakeAgents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_agent(mut self, address: &str, view: MibView) -> Self {
        self.views.insert(address.to_string(), view);
        self
    }

    pub fn opened(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.opened)
    }

    pub fn requests(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.requests)
    }
}

impl SessionFactory for FakeAgents {
    fn open(&self, profile: SessionProfile) -> Box<dyn SnmpSession> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        let inner: MibSession = match self.views.get(&profile.address) {
            Some(view) => MibSession::new(view.clone()),
            None => MibSession::new(MibView::new()).failing(|| SnmpError::NoResponse {
                attempts: 1,
                answered_before: false,
            }),
        };
        Box::new(Counted {
            inner,
            requests: Arc::clone(&self.requests),
        })
    }
}

struct Counted {
    inner: MibSession,
    requests: Arc<AtomicUsize>,
}

impl SnmpSession for Counted {
    fn get(&mut self, oid: &Oid) -> Result<VarBind, SnmpError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.inner.get(oid)
    }

    fn get_next(&mut self, oid: &Oid) -> Result<VarBind, SnmpError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.inner.get_next(oid)
    }
}
