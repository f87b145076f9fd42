mod commands;
mod terminal;

use commands::{CommandLine, Commands, identify, poll};
use terminal::{logging, print};
use tracing::error;

#[tokio::main]
async fn main() {
    let commands = CommandLine::parse_args();

    let debug: bool = match &commands.command {
        Commands::Poll(args) => args.debug || std::env::var("DEBUG").is_ok_and(|v| v == "true"),
        Commands::Identify(_) => false,
    };
    logging::init(debug);

    let result: anyhow::Result<()> = match commands.command {
        Commands::Poll(args) => {
            print::header("polling fleet");
            poll::poll(args).await
        }
        Commands::Identify(args) => {
            print::header("identifying device");
            identify::identify(args).await
        }
    };

    if let Err(e) = result {
        error!("{e:#}");
        // A poll abandoned at its deadline may still hold a blocking thread.
        std::process::exit(1);
    }
}
