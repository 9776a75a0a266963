use clap::Parser;

/// Interactive menu for the microsched priority scheduler.
///
/// Add tasks with a priority and a duration, pause and resume them, and run
/// every runnable task in priority order.
#[derive(Parser, Debug)]
#[command(name = "microsched-cli", version, about = "Interactive priority micro-scheduler")]
pub struct CliArgs {
    /// Path to config file (default: ~/.config/microsched/config.toml)
    #[arg(long)]
    pub config: Option<String>,

    /// Wall-clock milliseconds per simulated time slot (overrides env and config file)
    #[arg(long)]
    pub time_unit_ms: Option<u64>,

    /// Log filter used when RUST_LOG is unset, e.g. "info" or "microsched=debug"
    #[arg(long)]
    pub log_filter: Option<String>,
}
