//! # Polling Errors
//!
//! Every failure a host or a worker can run into while being polled.
//!
//! None of these ever reach the caller of a poll: host errors are contained at
//! the host boundary and worker errors at the worker boundary. They exist so the
//! containment points can log what went wrong.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PollError {
    /// No response within the session's timeout budget.
    #[error("host unreachable: {0}")]
    Unreachable(String),

    /// The host answered earlier queries but went silent on a later one.
    #[error("query timed out after {attempts} attempt(s)")]
    Timeout { attempts: u32 },

    /// A response arrived but could not be turned into the expected shape.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The device was identified but nothing can decode it.
    #[error("unsupported device: {0}")]
    Unsupported(String),

    /// The host references a template that is not in the template table.
    #[error("unknown template {0}")]
    UnknownTemplate(u64),

    /// A worker terminated abnormally. No further detail is available.
    #[error("worker {index} failed: {reason}")]
    WorkerFailure { index: usize, reason: String },
}

impl PollError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    /// Short label used as a structured logging field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unreachable(_) => "unreachable",
            Self::Timeout { .. } => "timeout",
            Self::Malformed(_) => "malformed",
            Self::Unsupported(_) => "unsupported",
            Self::UnknownTemplate(_) => "unknown_template",
            Self::WorkerFailure { .. } => "worker_failure",
        }
    }
}
