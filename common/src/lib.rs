//! Shared model for the fleet poller: hosts, templates, device records,
//! the error taxonomy and process-wide configuration.

pub mod config;
pub mod error;

pub mod fleet {
    pub mod host;
    pub mod record;
    pub mod template;
}

pub use error::PollError;
