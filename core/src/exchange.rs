//! # Result Exchange
//!
//! How a worker hands its records back to the coordinator. In memory the
//! records travel as the worker's join value. Spooled, each worker writes one
//! JSON slot named `<run-id>_<worker-index>.json` which the coordinator reads
//! once and deletes. A [`RunGuard`] removes whatever a run left behind.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use fleetpoll_common::PollError;
use fleetpoll_common::config::ExchangeMode;
use fleetpoll_common::fleet::record::DeviceRecord;
use tracing::{debug, warn};
use uuid::Uuid;

/// Identifies one poll run. Slot names are derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunId(Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    fn slot_prefix(&self) -> String {
        format!("{}_", self.0)
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a worker thread returns when it finishes.
#[derive(Debug)]
pub enum Parcel {
    Records(Vec<DeviceRecord>),
    /// Records are waiting in the worker's spool slot.
    Spooled,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Exchange {
    #[default]
    InMemory,
    Spool(PathBuf),
}

impl From<&ExchangeMode> for Exchange {
    fn from(mode: &ExchangeMode) -> Self {
        match mode {
            ExchangeMode::InMemory => Self::InMemory,
            ExchangeMode::Spool(dir) => Self::Spool(dir.clone()),
        }
    }
}

impl Exchange {
    /// Worker side: packs the records for the coordinator.
    pub fn deliver(&self, run: RunId, index: usize, records: Vec<DeviceRecord>) -> Result<Parcel, PollError> {
        match self {
            Self::InMemory => Ok(Parcel::Records(records)),
            Self::Spool(dir) => {
                write_slot(dir, run, index, &records).map_err(|e| PollError::WorkerFailure {
                    index,
                    reason: format!("cannot write result slot: {e}"),
                })?;
                Ok(Parcel::Spooled)
            }
        }
    }

    /// Coordinator side: unpacks what a joined worker delivered. A spooled slot is consumed.
    pub fn collect(&self, run: RunId, index: usize, parcel: Parcel) -> Result<Vec<DeviceRecord>, PollError> {
        match (self, parcel) {
            (_, Parcel::Records(records)) => Ok(records),
            (Self::Spool(dir), Parcel::Spooled) => take_slot(dir, run, index),
            (Self::InMemory, Parcel::Spooled) => Err(PollError::WorkerFailure {
                index,
                reason: "worker spooled records without a spool directory".into(),
            }),
        }
    }

    pub fn guard(&self, run: RunId) -> RunGuard {
        RunGuard {
            dir: match self {
                Self::InMemory => None,
                Self::Spool(dir) => Some(dir.clone()),
            },
            run,
        }
    }
}

pub fn slot_path(dir: &Path, run: RunId, index: usize) -> PathBuf {
    dir.join(format!("{}{index}.json", run.slot_prefix()))
}

fn write_slot(dir: &Path, run: RunId, index: usize, records: &[DeviceRecord]) -> io::Result<()> {
    let path: PathBuf = slot_path(dir, run, index);
    let staging: PathBuf = path.with_extension("json.partial");
    let body: Vec<u8> = serde_json::to_vec(records).map_err(io::Error::other)?;
    fs::write(&staging, body)?;
    fs::rename(&staging, &path)?;
    debug!(slot = %path.display(), records = records.len(), "wrote result slot");
    Ok(())
}

fn take_slot(dir: &Path, run: RunId, index: usize) -> Result<Vec<DeviceRecord>, PollError> {
    let path: PathBuf = slot_path(dir, run, index);
    let failure = |reason: String| PollError::WorkerFailure { index, reason };

    let body: Vec<u8> = fs::read(&path).map_err(|e| failure(format!("cannot read result slot: {e}")))?;
    if let Err(e) = fs::remove_file(&path) {
        warn!(slot = %path.display(), "failed to remove result slot: {e}");
    }
    serde_json::from_slice(&body).map_err(|e| failure(format!("corrupt result slot: {e}")))
}

/// Removes every spool file of a run when dropped.
#[derive(Debug)]
pub struct RunGuard {
    dir: Option<PathBuf>,
    run: RunId,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        let Some(dir) = &self.dir else {
            return;
        };
        let entries: fs::ReadDir = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %dir.display(), "cannot scan spool directory: {e}");
                return;
            }
        };

        let prefix: String = self.run.slot_prefix();
        for entry in entries.flatten() {
            if !entry.file_name().to_string_lossy().starts_with(&prefix) {
                continue;
            }
            match fs::remove_file(entry.path()) {
                Ok(()) => debug!(slot = %entry.path().display(), "removed leftover slot"),
                Err(e) => warn!(slot = %entry.path().display(), "failed to remove leftover slot: {e}"),
            }
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
