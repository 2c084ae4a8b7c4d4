//! `spinup task-definition <create|update|delete|run|list|show>` — thin
//! argument parsing over the task-definition pipeline.

use clap::{Args, Subcommand};
use spinup_capabilities::Capabilities;
use spinup_types::{
  org::OrgContext,
  requests::{
    CreateTaskDefinitionRequest, DeleteTaskDefinitionRequest, ListTaskDefinitionsRequest,
    RunTaskDefinitionRequest, ShowTaskDefinitionRequest, UpdateTaskDefinitionRequest,
  },
};
use tokio_util::sync::CancellationToken;

use super::{print_json, read_json};

#[derive(Debug, Subcommand)]
pub enum TaskDefinitionCommand {
  /// Create a family from a `CreateTaskDefinitionRequest` JSON document.
  Create(FileArgs),
  /// Register a new revision from an `UpdateTaskDefinitionRequest` JSON document.
  Update(FileArgs),
  /// Delete a family's current revision (and, async, the rest).
  Delete(DeleteArgs),
  /// Launch one-shot tasks from the family's current revision.
  Run(RunArgs),
  /// List every family this org owns, optionally scoped to a cluster.
  List(ListArgs),
  /// Show the current revision of a family.
  Show(ShowArgs),
}

#[derive(Debug, Args)]
pub struct FileArgs {
  #[arg(long)]
  file: Option<String>,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
  #[arg(long)]
  cluster: String,
  #[arg(long)]
  family: String,
  /// Stop running tasks instead of rejecting the delete.
  #[arg(long)]
  force: bool,
  /// Also tear down the cluster and execution role once the family is empty.
  #[arg(long)]
  recursive: bool,
}

#[derive(Debug, Args)]
pub struct RunArgs {
  #[arg(long)]
  cluster: String,
  #[arg(long)]
  family: String,
  #[arg(long, default_value_t = 1)]
  count: i32,
}

#[derive(Debug, Args)]
pub struct ListArgs {
  #[arg(long)]
  cluster: Option<String>,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
  #[arg(long)]
  cluster: String,
  #[arg(long)]
  family: String,
}

pub async fn handle(
  cmd: &TaskDefinitionCommand,
  caps: &Capabilities,
  org: &OrgContext,
) -> anyhow::Result<()> {
  let cancel = CancellationToken::new();
  match cmd {
    TaskDefinitionCommand::Create(args) => {
      let request: CreateTaskDefinitionRequest = read_json(&args.file)?;
      let def = spinup_core::pipelines::task_definition::create(caps, org, &request).await?;
      print_json(&def)?;
    }
    TaskDefinitionCommand::Update(args) => {
      let request: UpdateTaskDefinitionRequest = read_json(&args.file)?;
      let def = spinup_core::pipelines::task_definition::update(caps, org, &request).await?;
      print_json(&def)?;
    }
    TaskDefinitionCommand::Delete(args) => {
      let request = DeleteTaskDefinitionRequest {
        cluster: args.cluster.clone(),
        family: args.family.clone(),
        force: args.force,
        recursive: args.recursive,
      };
      spinup_core::pipelines::task_definition::delete(caps, org, &request, &cancel).await?;
      tracing::info!(cluster = %args.cluster, family = %args.family, "task-definition delete accepted");
    }
    TaskDefinitionCommand::Run(args) => {
      let request = RunTaskDefinitionRequest {
        cluster: args.cluster.clone(),
        family: args.family.clone(),
        count: args.count,
        capacity_provider_strategy: None,
      };
      let response = spinup_core::pipelines::task_definition::run(caps, org, &request).await?;
      print_json(&response)?;
    }
    TaskDefinitionCommand::List(args) => {
      let request = ListTaskDefinitionsRequest { cluster: args.cluster.clone() };
      let response = spinup_core::pipelines::task_definition::list(caps, org, &request).await?;
      print_json(&response)?;
    }
    TaskDefinitionCommand::Show(args) => {
      let request = ShowTaskDefinitionRequest {
        cluster: args.cluster.clone(),
        family: args.family.clone(),
      };
      let def = spinup_core::pipelines::task_definition::show(caps, &request).await?;
      print_json(&def)?;
    }
  }
  Ok(())
}
