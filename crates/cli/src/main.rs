mod cli;
mod config;
mod menu;
mod terminal;

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, IsTerminal};
use std::sync::mpsc;
use tracing::info;

use microsched::{ChannelObserver, Scheduler, Worker};

use crate::cli::CliArgs;
use crate::config::CliConfig;
use crate::menu::Menu;
use crate::terminal::Terminal;

fn main() -> Result<()> {
    microsched::config::load_dotenv();
    let args = CliArgs::parse();

    let config = CliConfig::load(args.config.as_deref()).context("failed to load configuration")?;

    // Initialize tracing before env overrides so bad values get reported.
    // Logs go to stderr so they never interleave with the menu.
    let log_filter = args.log_filter.as_deref().unwrap_or(&config.log_filter);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_filter)),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    // File, then env, then flags
    let config = config.with_overrides(args.time_unit_ms, args.log_filter);

    info!(
        time_unit_ms = config.scheduler.time_unit_ms,
        worker = %config.scheduler.worker_name,
        "Starting scheduler"
    );

    let (events_tx, events_rx) = mpsc::channel();
    let scheduler =
        Scheduler::from_config(&config.scheduler).with_observer(ChannelObserver::new(events_tx));
    let worker = Worker::spawn(scheduler).context("failed to start scheduler worker")?;

    let stdout = io::stdout();
    let color = stdout.is_terminal();
    let terminal = Terminal::new(stdout.lock(), color);
    let stdin = io::stdin();

    Menu::new(stdin.lock(), terminal, worker, events_rx).run()
}
