//! `spinup service <create|update|delete>` — thin argument parsing over
//! the service pipeline. Complex nested input (containers, tags,
//! credentials) is supplied as a JSON request body; only the handful of
//! fields an operator would reasonably type by hand are exposed as flags.

use clap::{Args, Subcommand};
use spinup_capabilities::Capabilities;
use spinup_types::{
  org::OrgContext,
  service::{ServiceCreateInput, ServiceDeleteInput, ServiceUpdateInput},
};
use tokio_util::sync::CancellationToken;

use super::{print_json, read_json};

#[derive(Debug, Subcommand)]
pub enum ServiceCommand {
  /// Create a service from a `ServiceCreateInput` JSON document.
  Create(FileArgs),
  /// Update a service from a `ServiceUpdateInput` JSON document.
  Update(FileArgs),
  /// Delete a service by cluster + name.
  Delete(DeleteArgs),
}

#[derive(Debug, Args)]
pub struct FileArgs {
  /// Path to the request JSON, or omit/pass `-` to read from stdin.
  #[arg(long)]
  file: Option<String>,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
  #[arg(long)]
  cluster: String,
  #[arg(long)]
  name: String,
  /// Also tear down the cluster, execution role, registry, and every
  /// task-definition revision once the synchronous delete returns.
  #[arg(long)]
  recursive: bool,
}

pub async fn handle(
  cmd: &ServiceCommand,
  caps: &Capabilities,
  org: &OrgContext,
) -> anyhow::Result<()> {
  let cancel = CancellationToken::new();
  match cmd {
    ServiceCommand::Create(args) => {
      let input: ServiceCreateInput = read_json(&args.file)?;
      let service = spinup_core::pipelines::service::create(caps, org, &input, &cancel).await?;
      print_json(&service)?;
    }
    ServiceCommand::Update(args) => {
      let input: ServiceUpdateInput = read_json(&args.file)?;
      let service = spinup_core::pipelines::service::update(caps, org, &input, &cancel).await?;
      print_json(&service)?;
    }
    ServiceCommand::Delete(args) => {
      let input = ServiceDeleteInput {
        name: args.name.clone(),
        cluster: args.cluster.clone(),
        recursive: args.recursive,
      };
      spinup_core::pipelines::service::delete(caps, org, &input, &cancel).await?;
      tracing::info!(cluster = %args.cluster, name = %args.name, recursive = args.recursive, "service delete accepted");
    }
  }
  Ok(())
}
