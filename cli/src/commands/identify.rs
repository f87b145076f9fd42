use colored::*;
use fleetpoll_common::config::PollerConfig;
use fleetpoll_common::fleet::host::{HostCategory, HostDescriptor};
use fleetpoll_common::fleet::template::{ConfigTemplate, SnmpVersion};
use fleetpoll_core::{Poller, TypeIdentifier};
use fleetpoll_plugins::MapperKind;

use crate::commands::IdentifyArgs;
use crate::terminal::{colors, print};

pub async fn identify(args: IdentifyArgs) -> anyhow::Result<()> {
    let (host, template) = target(&args);
    let poller: Poller = Poller::new(PollerConfig::from_env());

    let (id, kind): (TypeIdentifier, MapperKind) =
        tokio::task::spawn_blocking(move || poller.identify_host(&host, &template)).await??;

    print::header("device identified");
    print::aligned_line("Address", args.address.color(colors::IPV4_ADDR), 10);
    print::aligned_line("Identifier", id.as_str().color(colors::ACCENT), 10);
    print::aligned_line("Strategy", kind.name().green().bold(), 10);
    Ok(())
}

fn target(args: &IdentifyArgs) -> (HostDescriptor, ConfigTemplate) {
    let category: HostCategory = if args.site {
        HostCategory::NetworkSite
    } else {
        HostCategory::Equipment
    };
    let host: HostDescriptor = HostDescriptor::new(0, args.address.clone(), 0).with_category(category);
    let template = ConfigTemplate {
        version: SnmpVersion::from(args.version),
        community: args.community.clone(),
        ..ConfigTemplate::default()
    };
    (host, template)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
