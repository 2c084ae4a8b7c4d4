//! `spinup` — a thin command surface over `spinup-core`, wired to the
//! in-memory capability doubles so the orchestration pipelines can be
//! exercised locally without a provider account. Business logic lives
//! entirely in `spinup-core`; this binary only parses arguments, loads
//! configuration, and prints results.

mod commands;
mod config;
mod logging;
mod state;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "spinup", about = "Container-platform orchestration CLI", version)]
struct Cli {
  #[command(subcommand)]
  command: commands::Command,

  #[command(flatten)]
  config: config::ConfigArgs,

  /// Emit logs as JSON instead of the default compact text format.
  #[arg(long, global = true)]
  json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  let cli = Cli::parse();
  logging::init(cli.json_logs)?;

  let org = config::load(&cli.config)?;
  let caps = state::build();

  match &cli.command {
    commands::Command::Service(cmd) => commands::service::handle(cmd, &caps, &org).await,
    commands::Command::TaskDefinition(cmd) => {
      commands::task_definition::handle(cmd, &caps, &org).await
    }
  }
}
