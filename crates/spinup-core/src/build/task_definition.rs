//! Task-definition builder: assembles a new immutable revision from
//! input + defaults + the reconciled execution role + log configuration.

use spinup_capabilities::Capabilities;
use spinup_types::{
  error::OrchestrationError,
  org::OrgContext,
  task_definition::{Compatibility, NetworkMode, TaskDefinition, TaskDefinitionInput},
  tag::TagSet,
};

use crate::reconcile::{execution_role, log_group};

/// Builds a new revision and registers it with the provider. `tags` is
/// the already-normalised tag set for this family.
pub async fn build(
  caps: &Capabilities,
  org: &OrgContext,
  cluster: &str,
  input: &TaskDefinitionInput,
  tags: &TagSet,
) -> Result<TaskDefinition, OrchestrationError> {
  let role_name = org.default_execution_role_name(cluster);
  let role_arn =
    execution_role::reconcile(caps, org, cluster, &role_name, tags).await?;

  let log_config = log_group::reconcile(caps, org, cluster, &input.family).await?;

  let mut containers = input.containers.clone();
  for container in &mut containers {
    container.log_configuration = Some(log_config.clone());
  }

  let def = TaskDefinition {
    family: input.family.clone(),
    // Assigned by the provider on registration; the mock's create_task_definition
    // fills in the real values.
    revision: 0,
    containers,
    cpu: input.cpu.clone(),
    memory: input.memory.clone(),
    // Always overridden, never merely defaulted, to prevent drift.
    network_mode: NetworkMode::Awsvpc,
    requires_compatibilities: vec![Compatibility::Fargate],
    execution_role_arn: role_arn.clone(),
    task_role_arn: role_arn,
    tags: tags.clone(),
    arn: String::new(),
  };

  caps
    .container_platform
    .create_task_definition(&def)
    .await
    .map_err(spinup_types::error::internal_from_anyhow)
}
