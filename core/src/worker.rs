//! # Poll Worker
//!
//! Runs one chunk of hosts strictly in order: open a session, identify the
//! device, select a strategy, map it. A host that fails at any step yields no
//! record and the worker moves on to the next one.

use std::sync::Arc;

use fleetpoll_common::PollError;
use fleetpoll_common::fleet::host::HostDescriptor;
use fleetpoll_common::fleet::record::DeviceRecord;
use fleetpoll_common::fleet::template::{ConfigTemplate, TemplateTable};
use fleetpoll_plugins::{HostContext, MapperKind, MapperRegistry};
use fleetpoll_protocols::SnmpSession;
use tracing::{debug, error, trace};

use crate::dispatch;
use crate::identify::{self, TypeIdentifier};
use crate::session::{SessionBuilder, SessionFactory};

/// One worker's share of a poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkChunk {
    pub index: usize,
    pub hosts: Vec<HostDescriptor>,
}

pub struct Worker {
    chunk: WorkChunk,
    templates: TemplateTable,
    builder: SessionBuilder,
    factory: Arc<dyn SessionFactory>,
    registry: Arc<MapperRegistry>,
    debug: bool,
}

impl Worker {
    pub fn new(
        chunk: WorkChunk,
        templates: TemplateTable,
        builder: SessionBuilder,
        factory: Arc<dyn SessionFactory>,
        registry: Arc<MapperRegistry>,
    ) -> Self {
        Self {
            chunk,
            templates,
            builder,
            factory,
            registry,
            debug: false,
        }
    }

    /// Logs every per-host failure at `error` instead of `trace`.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn index(&self) -> usize {
        self.chunk.index
    }

    pub fn run(&self) -> Vec<DeviceRecord> {
        let mut records: Vec<DeviceRecord> = Vec::with_capacity(self.chunk.hosts.len());

        for host in &self.chunk.hosts {
            match self.poll_host(host) {
                Ok(record) => records.push(record),
                Err(e) => self.report(host, &e),
            }
        }

        debug!(
            worker = self.chunk.index,
            hosts = self.chunk.hosts.len(),
            records = records.len(),
            "worker finished"
        );
        records
    }

    pub fn poll_host(&self, host: &HostDescriptor) -> Result<DeviceRecord, PollError> {
        let template: &ConfigTemplate = self
            .templates
            .get(&host.template_id)
            .ok_or(PollError::UnknownTemplate(host.template_id))?;

        let mut session: Box<dyn SnmpSession> = self.factory.open(self.builder.build(host, template));
        let type_identifier: TypeIdentifier = identify::identify(session.as_mut())?;
        let kind: MapperKind = dispatch::select(session.as_mut(), &type_identifier, &host.category)?;
        trace!(id = host.id, identifier = %type_identifier, mapper = %kind, "dispatching host");

        let ctx = HostContext {
            id: host.id,
            address: host.address.clone(),
            kind,
            type_identifier: type_identifier.to_string(),
            category: host.category.clone(),
        };
        self.registry.map(session.as_mut(), &ctx)
    }

    fn report(&self, host: &HostDescriptor, err: &PollError) {
        if self.debug {
            error!(
                worker = self.chunk.index,
                id = host.id,
                address = %host.address,
                kind = err.kind(),
                "host failed: {err}"
            );
        } else {
            trace!(worker = self.chunk.index, id = host.id, kind = err.kind(), "host failed: {err}");
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
