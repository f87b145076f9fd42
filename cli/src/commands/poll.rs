use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, anyhow};
use colored::*;
use fleetpoll_common::config::{ExchangeMode, PollerConfig};
use fleetpoll_common::fleet::host::PollRequest;
use fleetpoll_common::fleet::record::DeviceRecord;
use fleetpoll_core::Poller;
use tracing::debug;

use crate::commands::PollArgs;
use crate::terminal::{colors, print};

pub async fn poll(args: PollArgs) -> anyhow::Result<()> {
    let request: PollRequest = load_request(&args.work)?;
    let mut config: PollerConfig = PollerConfig::from_env();
    apply_flags(&mut config, &args);
    debug!(?config, "effective configuration");

    let host_count: usize = request.hosts.len();
    let poller: Poller = Poller::new(config);
    let started: Instant = Instant::now();

    let task = tokio::task::spawn_blocking(move || poller.poll_request(&request));
    let records: Vec<DeviceRecord> = match args.deadline {
        Some(secs) => tokio::time::timeout(Duration::from_secs(secs), task)
            .await
            .map_err(|_| anyhow!("poll did not finish within {secs}s"))??,
        None => task.await?,
    };

    write_records(&records, args.output.as_deref())?;
    print_summary(host_count, &records, started.elapsed());
    Ok(())
}

pub fn load_request(path: &Path) -> anyhow::Result<PollRequest> {
    let body: String = fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    serde_json::from_str(&body).with_context(|| format!("{} is not a valid work file", path.display()))
}

/// Command-line flags override the environment.
pub fn apply_flags(config: &mut PollerConfig, args: &PollArgs) {
    if let Some(workers) = args.workers.filter(|w| *w > 0) {
        config.workers = workers;
    }
    if let Some(secs) = args.timeout.filter(|t| *t > 0) {
        config.timeout = Duration::from_secs(secs);
    }
    if let Some(retries) = args.retries {
        config.retries = retries;
    }
    if args.debug {
        config.debug = true;
    }
    if let Some(dir) = &args.spool {
        config.exchange = ExchangeMode::Spool(dir.clone());
    }
}

fn write_records(records: &[DeviceRecord], output: Option<&Path>) -> anyhow::Result<()> {
    let body: String = serde_json::to_string_pretty(records)?;
    match output {
        Some(path) => fs::write(path, body).with_context(|| format!("cannot write {}", path.display())),
        None => {
            println!("{body}");
            Ok(())
        }
    }
}

fn print_summary(host_count: usize, records: &[DeviceRecord], elapsed: Duration) {
    print::header("poll summary");

    for (idx, record) in records.iter().enumerate() {
        let name: &str = record.system.name.as_deref().unwrap_or("unnamed");
        print::tree_head(idx, name);
        let macs: usize = record.interfaces.iter().filter(|i| i.mac.is_some()).count();
        print::as_tree_one_level(&[
            ("Id".to_string(), record.id.to_string().normal()),
            ("Mapper".to_string(), record.mapper.color(colors::ACCENT)),
            ("Type".to_string(), record.type_identifier.color(colors::IPV4_ADDR)),
            (
                "Ports".to_string(),
                format!("{} ({} with MAC)", record.interfaces.len(), macs).color(colors::MAC_ADDR),
            ),
        ]);
    }

    let failed: usize = host_count.saturating_sub(records.len());
    let failed_text: ColoredString = if failed == 0 {
        failed.to_string().green()
    } else {
        failed.to_string().color(colors::FAILURE).bold()
    };

    print::fat_separator();
    print::aligned_line("Hosts", host_count.to_string().bold(), 7);
    print::aligned_line("Mapped", records.len().to_string().green().bold(), 7);
    print::aligned_line("Failed", failed_text, 7);
    print::aligned_line("Elapsed", format!("{:.2}s", elapsed.as_secs_f64()).yellow(), 7);
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
