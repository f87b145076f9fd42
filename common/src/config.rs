//! # Poller Configuration
//!
//! Process-wide settings shared by every worker of a poll. Values come from
//! the environment (after loading a `.env` file, if any) and fall back to the
//! defaults below when missing or out of range.

use std::path::PathBuf;
use std::time::Duration;

use tracing::debug;

pub const DEFAULT_WORKERS: usize = 25;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(500);
pub const DEFAULT_RETRIES: u32 = 0;

/// Where workers leave their results for the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ExchangeMode {
    /// Records travel back as the value of each worker's join handle.
    #[default]
    InMemory,
    /// Records are spooled to one JSON file per worker in this directory.
    Spool(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollerConfig {
    /// Upper bound on chunks, and therefore on concurrently running workers.
    pub workers: usize,
    /// Timeout of a single request attempt.
    pub timeout: Duration,
    /// Extra attempts after the first one times out.
    pub retries: u32,
    /// Log every per-host failure.
    pub debug: bool,
    pub exchange: ExchangeMode,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            timeout: DEFAULT_TIMEOUT,
            retries: DEFAULT_RETRIES,
            debug: false,
            exchange: ExchangeMode::InMemory,
        }
    }
}

impl PollerConfig {
    /// Loads `.env` (when present) and reads the configuration from the process environment.
    pub fn from_env() -> Self {
        match dotenvy::dotenv() {
            Ok(path) => debug!("loaded environment from {}", path.display()),
            Err(e) if e.not_found() => {}
            Err(e) => debug!("ignoring unreadable .env file: {e}"),
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let int = |key: &str| -> i64 {
            lookup(key)
                .and_then(|v| v.trim().parse::<i64>().ok())
                .unwrap_or(0)
        };

        let forks: i64 = int("SNMP_FORKS");
        let timeout_secs: i64 = int("SNMP_TIMEOUT");
        let retries: i64 = int("SNMP_RETRIES");

        let exchange: ExchangeMode = match lookup("POLL_EXCHANGE").as_deref().map(str::trim) {
            Some("spool") => {
                let dir: PathBuf = lookup("POLL_SPOOL_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(std::env::temp_dir);
                ExchangeMode::Spool(dir)
            }
            _ => ExchangeMode::InMemory,
        };

        Self {
            workers: if forks > 0 { forks as usize } else { DEFAULT_WORKERS },
            timeout: if timeout_secs > 0 {
                Duration::from_secs(timeout_secs as u64)
            } else {
                DEFAULT_TIMEOUT
            },
            retries: u32::try_from(retries).unwrap_or(DEFAULT_RETRIES),
            debug: lookup("DEBUG").as_deref() == Some("true"),
            exchange,
        }
    }

    /// Worst-case wall time of one query: every attempt runs into its timeout.
    pub fn query_budget(&self) -> Duration {
        self.timeout * (self.retries + 1)
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
