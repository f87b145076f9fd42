//! # Poll Orchestrator
//!
//! Splits the host list into at most `workers` chunks, runs one OS thread per
//! non-empty chunk, joins every thread and merges what came back. A worker
//! that dies contributes nothing; the poll itself never fails.

use std::any::Any;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use fleetpoll_common::PollError;
use fleetpoll_common::config::PollerConfig;
use fleetpoll_common::fleet::host::{HostDescriptor, PollRequest};
use fleetpoll_common::fleet::record::DeviceRecord;
use fleetpoll_common::fleet::template::{ConfigTemplate, TemplateTable};
use fleetpoll_plugins::{MapperKind, MapperRegistry};
use fleetpoll_protocols::SnmpSession;
use tracing::{debug, info, warn};

use crate::dispatch;
use crate::exchange::{Exchange, Parcel, RunGuard, RunId};
use crate::identify::{self, TypeIdentifier};
use crate::session::{SessionBuilder, SessionFactory, UdpSessionFactory};
use crate::worker::{WorkChunk, Worker};

pub struct Poller {
    config: PollerConfig,
    factory: Arc<dyn SessionFactory>,
    registry: Arc<MapperRegistry>,
}

impl Poller {
    pub fn new(config: PollerConfig) -> Self {
        Self {
            config,
            factory: Arc::new(UdpSessionFactory),
            registry: Arc::new(MapperRegistry::standard()),
        }
    }

    pub fn with_session_factory(mut self, factory: Arc<dyn SessionFactory>) -> Self {
        self.factory = factory;
        self
    }

    pub fn with_registry(mut self, registry: MapperRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    pub fn poll_request(&self, request: &PollRequest) -> Vec<DeviceRecord> {
        self.poll(&request.hosts, &request.templates)
    }

    pub fn poll(&self, hosts: &[HostDescriptor], templates: &TemplateTable) -> Vec<DeviceRecord> {
        if hosts.is_empty() {
            info!("nothing to poll");
            return Vec::new();
        }

        let run: RunId = RunId::new();
        let exchange: Exchange = Exchange::from(&self.config.exchange);
        let _guard: RunGuard = exchange.guard(run);
        let builder: SessionBuilder = SessionBuilder::from_config(&self.config);

        let chunks: Vec<Vec<HostDescriptor>> = partition(hosts, self.config.workers);
        let chunk_count: usize = chunks.len();
        debug!(%run, hosts = hosts.len(), chunks = chunk_count, "starting workers");

        let mut handles: Vec<(usize, JoinHandle<Result<Parcel, PollError>>)> = Vec::with_capacity(chunk_count);
        let mut failed_workers: usize = 0;

        for (index, hosts) in chunks.into_iter().enumerate() {
            let worker: Worker = Worker::new(
                WorkChunk { index, hosts },
                templates.clone(),
                builder,
                Arc::clone(&self.factory),
                Arc::clone(&self.registry),
            )
            .with_debug(self.config.debug);
            let exchange: Exchange = exchange.clone();

            let spawned = thread::Builder::new()
                .name(format!("poll-worker-{index}"))
                .spawn(move || -> Result<Parcel, PollError> {
                    let records: Vec<DeviceRecord> = worker.run();
                    exchange.deliver(run, index, records)
                });

            match spawned {
                Ok(handle) => handles.push((index, handle)),
                Err(e) => {
                    failed_workers += 1;
                    warn!(worker = index, "failed to spawn worker: {e}");
                }
            }
        }

        let mut records: Vec<DeviceRecord> = Vec::with_capacity(hosts.len());
        for (index, handle) in handles {
            let outcome: Result<Vec<DeviceRecord>, PollError> = match handle.join() {
                Ok(Ok(parcel)) => exchange.collect(run, index, parcel),
                Ok(Err(e)) => Err(e),
                Err(payload) => Err(PollError::WorkerFailure {
                    index,
                    reason: panic_message(payload.as_ref()),
                }),
            };

            match outcome {
                Ok(batch) => records.extend(batch),
                Err(e) => {
                    failed_workers += 1;
                    warn!(worker = index, "{e}");
                }
            }
        }

        info!(
            %run,
            hosts = hosts.len(),
            chunks = chunk_count,
            records = records.len(),
            failed_workers,
            "poll finished"
        );
        records
    }

    /// Identifies one host and selects its strategy without mapping it.
    pub fn identify_host(
        &self,
        host: &HostDescriptor,
        template: &ConfigTemplate,
    ) -> Result<(TypeIdentifier, MapperKind), PollError> {
        let builder: SessionBuilder = SessionBuilder::from_config(&self.config);
        let mut session: Box<dyn SnmpSession> = self.factory.open(builder.build(host, template));
        let id: TypeIdentifier = identify::identify(session.as_mut())?;
        let kind: MapperKind = dispatch::select(session.as_mut(), &id, &host.category)?;
        Ok((id, kind))
    }
}

/// Splits `items` into at most `workers` contiguous chunks whose sizes differ
/// by at most one. No chunk is empty and none exceeds `ceil(len / workers)`.
pub fn partition<T: Clone>(items: &[T], workers: usize) -> Vec<Vec<T>> {
    if items.is_empty() {
        return Vec::new();
    }
    let count: usize = workers.clamp(1, items.len());
    let base: usize = items.len() / count;
    let extra: usize = items.len() % count;

    let mut chunks: Vec<Vec<T>> = Vec::with_capacity(count);
    let mut start: usize = 0;
    for i in 0..count {
        let len: usize = base + usize::from(i < extra);
        chunks.push(items[start..start + len].to_vec());
        start += len;
    }
    chunks
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("panicked: {msg}")
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("panicked: {msg}")
    } else {
        "panicked".to_string()
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
