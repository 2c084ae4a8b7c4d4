//! Task-definition pipeline: end-to-end create / update / delete /
//! list / show / run for a task-definition family.

use std::collections::HashSet;
use std::time::Duration;

use spinup_capabilities::{Capabilities, secret_store::RecoveryWindow, tag_search::TagFilter};
use spinup_types::{
  error::OrchestrationError,
  org::{LaunchType, NetworkConfiguration, OrgContext, RunTaskOptions},
  requests::{
    CreateTaskDefinitionRequest, DeleteTaskDefinitionRequest, ListTaskDefinitionsRequest,
    ListTaskDefinitionsResponse, RunTaskDefinitionRequest, RunTaskDefinitionResponse,
    ShowTaskDefinitionRequest, UpdateTaskDefinitionRequest,
  },
  tag::{self, TagSet},
  task_definition::{ContainerCredentialInput, TaskDefinition},
};
use tokio_util::sync::CancellationToken;

use crate::{
  build::task_definition as build_task_definition,
  cluster::{handler as cluster_handler, retry as cluster_retry},
  propagate::{self, PropagateTarget},
  reconcile::credentials::{self, ContainerCredentialState},
  rollback::{RollbackEntry, RollbackStack},
  tags,
};

const ROLE_TAG_TYPE: &str = "container";
const ROLE_TAG_FLAVOR: &str = "task";

pub async fn create(
  caps: &Capabilities,
  org: &OrgContext,
  request: &CreateTaskDefinitionRequest,
) -> Result<TaskDefinition, OrchestrationError> {
  let mut rollback = RollbackStack::new();

  let tag_set = tags::normalise(
    tags::NormaliseParams {
      org: &org.organisation,
      space: &request.cluster.name,
      resource_type: ROLE_TAG_TYPE,
      flavor: ROLE_TAG_FLAVOR,
    },
    &request.tags,
  )?;

  let result = create_inner(caps, org, request, &tag_set, &mut rollback).await;
  if result.is_err() {
    rollback.spawn_drain();
  }
  result
}

async fn create_inner(
  caps: &Capabilities,
  org: &OrgContext,
  request: &CreateTaskDefinitionRequest,
  tag_set: &TagSet,
  rollback: &mut RollbackStack,
) -> Result<TaskDefinition, OrchestrationError> {
  let mut cluster_input = request.cluster.clone();
  cluster_input.tags = spinup_types::tag::tags_to_vec(tag_set);
  let (cluster, created_cluster) =
    cluster_handler::get_or_create(caps, &cluster_input).await?;
  if created_cluster {
    let caps = caps.clone();
    let name = cluster.name.clone();
    rollback.push(RollbackEntry::named("create-cluster", move || async move {
      caps.container_platform.delete_cluster(&name).await
    }));
  } else {
    rollback.push(RollbackEntry::noop("lookup-cluster"));
  }

  let mut containers = request.task_definition.containers.clone();
  let mut created_secret_arns = Vec::new();
  for container in &mut containers {
    let default_input = ContainerCredentialInput::default();
    let cred_input = request.credentials.get(&container.name).unwrap_or(&default_input);
    let state = ContainerCredentialState {
      container_name: &container.name,
      active_arn: None,
      input: cred_input,
    };
    let outcomes = credentials::reconcile(
      caps,
      org,
      &cluster.name,
      tag_set,
      &request.tags,
      std::slice::from_ref(&state),
    )
    .await?;
    let outcome = &outcomes[&container.name];
    container.repository_credentials = outcome.bound_arn.clone();
    if outcome.created {
      if let Some(arn) = &outcome.bound_arn {
        created_secret_arns.push(arn.clone());
      }
    }
  }
  if !created_secret_arns.is_empty() {
    let caps = caps.clone();
    rollback.push(RollbackEntry::named("create-credentials", move || async move {
      for arn in created_secret_arns {
        caps.secret_store.delete_secret(&arn, RecoveryWindow::IMMEDIATE).await?;
      }
      Ok(())
    }));
  } else {
    rollback.push(RollbackEntry::noop("create-credentials"));
  }

  let mut tdi = request.task_definition.clone();
  tdi.containers = containers;
  let task_def =
    build_task_definition::build(caps, org, &cluster.name, &tdi, tag_set).await?;
  {
    let caps = caps.clone();
    let arn = task_def.arn.clone();
    rollback.push(RollbackEntry::named("build-task-definition", move || async move {
      caps.container_platform.delete_task_definition(&arn).await
    }));
  }

  let role_name = org.default_execution_role_name(&cluster.name);
  let log_group = caps
    .log_groups
    .get_log_group(&cluster.name)
    .await
    .map_err(spinup_types::error::internal_from_anyhow)?;
  let secret_arns = propagate::secret_arns_from_containers(&task_def.containers);

  let mut targets = vec![
    PropagateTarget::SharedNamed { arn: &cluster.arn, name: &cluster.name },
    PropagateTarget::Role { arn: &task_def.execution_role_arn, role_name: &role_name },
    PropagateTarget::Specific { arn: &task_def.arn },
  ];
  if let Some(log_group) = &log_group {
    targets.push(PropagateTarget::SharedNamed { arn: &log_group.arn, name: &cluster.name });
  }
  for arn in &secret_arns {
    targets.push(PropagateTarget::Specific { arn });
  }
  propagate::propagate(caps, tag_set, &targets).await?;
  rollback.push(RollbackEntry::noop("propagate-tags"));

  Ok(task_def)
}

pub async fn update(
  caps: &Capabilities,
  org: &OrgContext,
  request: &UpdateTaskDefinitionRequest,
) -> Result<TaskDefinition, OrchestrationError> {
  let cluster = caps
    .container_platform
    .get_cluster(&request.cluster)
    .await
    .map_err(spinup_types::error::internal_from_anyhow)?
    .ok_or_else(|| OrchestrationError::not_found(format!("cluster {} not found", request.cluster)))?;

  let revisions = caps
    .container_platform
    .list_task_definition_revisions(&request.family)
    .await
    .map_err(spinup_types::error::internal_from_anyhow)?;
  let current_arn = revisions.last().cloned().ok_or_else(|| {
    OrchestrationError::not_found(format!("no revisions for family {}", request.family))
  })?;
  let (current_def, _) = caps
    .container_platform
    .get_task_definition(&current_arn)
    .await
    .map_err(spinup_types::error::internal_from_anyhow)?
    .ok_or_else(|| OrchestrationError::not_found("current revision vanished"))?;

  let mut containers = request.task_definition.containers.clone();
  let mut cred_states = Vec::new();
  for container in &containers {
    let active_arn = current_def
      .containers
      .iter()
      .find(|c| c.name == container.name)
      .and_then(|c| c.repository_credentials.clone());
    cred_states.push((container.name.clone(), active_arn));
  }
  let default_input = ContainerCredentialInput::default();
  let states: Vec<ContainerCredentialState> = cred_states
    .iter()
    .map(|(name, active)| ContainerCredentialState {
      container_name: name,
      active_arn: active.clone(),
      input: request.credentials.get(name).unwrap_or(&default_input),
    })
    .collect();
  let outcomes = credentials::reconcile(
    caps,
    org,
    &request.cluster,
    &current_def.tags,
    &request.tags,
    &states,
  )
  .await?;
  for container in &mut containers {
    container.repository_credentials =
      outcomes.get(&container.name).and_then(|o| o.bound_arn.clone());
  }

  let mut tdi = request.task_definition.clone();
  tdi.containers = containers;
  let mut desired_tags = current_def.tags.clone();
  for t in &request.tags {
    desired_tags.insert(t.key.clone(), t.value.clone());
  }
  let new_def =
    build_task_definition::build(caps, org, &cluster.name, &tdi, &desired_tags).await?;

  let role_name = org.default_execution_role_name(&cluster.name);
  let log_group = caps
    .log_groups
    .get_log_group(&cluster.name)
    .await
    .map_err(spinup_types::error::internal_from_anyhow)?;
  let secret_arns = propagate::secret_arns_from_containers(&new_def.containers);

  let mut targets = vec![
    PropagateTarget::SharedNamed { arn: &cluster.arn, name: &cluster.name },
    PropagateTarget::Role { arn: &new_def.execution_role_arn, role_name: &role_name },
    PropagateTarget::Specific { arn: &new_def.arn },
  ];
  if let Some(log_group) = &log_group {
    targets.push(PropagateTarget::SharedNamed { arn: &log_group.arn, name: &cluster.name });
  }
  for arn in &secret_arns {
    targets.push(PropagateTarget::Specific { arn });
  }
  propagate::propagate(caps, &desired_tags, &targets).await?;

  Ok(new_def)
}

pub async fn delete(
  caps: &Capabilities,
  org: &OrgContext,
  request: &DeleteTaskDefinitionRequest,
  cancel: &CancellationToken,
) -> Result<(), OrchestrationError> {
  let running = caps
    .container_platform
    .list_tasks(&request.cluster, &request.family)
    .await
    .map_err(spinup_types::error::internal_from_anyhow)?;
  if !running.is_empty() && !request.force {
    return Err(OrchestrationError::bad_request(format!(
      "family {} has {} running task(s); pass force to stop them",
      request.family,
      running.len()
    )));
  }

  let mut revisions = caps
    .container_platform
    .list_task_definition_revisions(&request.family)
    .await
    .map_err(spinup_types::error::internal_from_anyhow)?;
  if let Some(current) = revisions.pop() {
    caps
      .container_platform
      .delete_task_definition(&current)
      .await
      .map_err(spinup_types::error::internal_from_anyhow)?;
  }
  let remaining_revisions = revisions;

  let caps = caps.clone();
  let org = org.clone();
  let cluster = request.cluster.clone();
  let family = request.family.clone();
  let recursive = request.recursive;
  let parent = cancel.clone();
  tokio::spawn(async move {
    let _ = parent;
    run_delete_cleanup(&caps, &org, &cluster, &family, remaining_revisions, running, recursive)
      .await;
  });

  Ok(())
}

async fn run_delete_cleanup(
  caps: &Capabilities,
  org: &OrgContext,
  cluster: &str,
  family: &str,
  remaining_revisions: Vec<String>,
  running_tasks: Vec<String>,
  recursive: bool,
) {
  for task_arn in &running_tasks {
    if let Err(err) = caps.container_platform.stop_task(cluster, task_arn).await {
      tracing::error!(%task_arn, error = %err, "stop_task failed during family delete cleanup");
    }
  }
  wait_for_tasks_stopped(caps, cluster, &running_tasks).await;

  let mut deleted_secrets = HashSet::new();
  for arn in remaining_revisions {
    if let Err(err) = teardown_revision(caps, &arn, &mut deleted_secrets).await {
      tracing::error!(revision = %arn, error = %err, "failed tearing down task-definition revision");
    }
  }

  if recursive {
    let background = CancellationToken::new();
    match cluster_retry::delete_when_empty(
      caps,
      cluster,
      &background,
      cluster_retry::CLUSTER_DELETE_DEADLINE,
    )
    .await
    {
      Ok(true) => {
        let role_name = org.default_execution_role_name(cluster);
        if let Ok(policies) = caps.access_control.list_role_policies(&role_name).await {
          for policy_name in policies {
            let _ = caps.access_control.delete_role_policy(&role_name, &policy_name).await;
          }
        }
        let _ = caps.access_control.delete_role(&role_name).await;
      }
      Ok(false) => {
        tracing::warn!(%cluster, "cluster delete retry abandoned during family teardown");
      }
      Err(err) => {
        tracing::error!(%cluster, error = %err, "cluster delete failed during family teardown");
      }
    }
  }

  let _ = family;
}

const TASK_STOPPED_POLL_INTERVAL: Duration = Duration::from_secs(10);
const TASK_STOPPED_POLL_ATTEMPTS: u32 = 10;

async fn wait_for_tasks_stopped(caps: &Capabilities, cluster: &str, task_arns: &[String]) {
  if task_arns.is_empty() {
    return;
  }
  for _ in 0..TASK_STOPPED_POLL_ATTEMPTS {
    match caps.container_platform.describe_tasks(cluster, task_arns).await {
      Ok(statuses) => {
        if statuses.iter().all(|s| s.last_status == "STOPPED") {
          return;
        }
      }
      Err(err) => {
        tracing::error!(error = %err, "describe_tasks failed while polling for stop");
      }
    }
    tokio::time::sleep(TASK_STOPPED_POLL_INTERVAL).await;
  }
  tracing::warn!(%cluster, "tasks did not reach STOPPED within the poll budget");
}

/// Deletes the revision's owned secrets (tracked in `deleted_secrets` to
/// avoid double-delete across revisions sharing a container name) then
/// deregisters the revision itself.
pub async fn teardown_revision(
  caps: &Capabilities,
  arn: &str,
  deleted_secrets: &mut HashSet<String>,
) -> anyhow::Result<()> {
  if let Some((def, _)) = caps.container_platform.get_task_definition(arn).await? {
    for container in &def.containers {
      if let Some(secret_arn) = &container.repository_credentials {
        if deleted_secrets.insert(secret_arn.clone()) {
          caps
            .secret_store
            .delete_secret(secret_arn, RecoveryWindow::IMMEDIATE)
            .await?;
        }
      }
    }
  }
  caps.container_platform.delete_task_definition(arn).await
}

pub async fn run(
  caps: &Capabilities,
  org: &OrgContext,
  request: &RunTaskDefinitionRequest,
) -> Result<RunTaskDefinitionResponse, OrchestrationError> {
  let cluster = caps
    .container_platform
    .get_cluster(&request.cluster)
    .await
    .map_err(spinup_types::error::internal_from_anyhow)?
    .ok_or_else(|| OrchestrationError::not_found(format!("cluster {} not found", request.cluster)))?;

  let revisions = caps
    .container_platform
    .list_task_definition_revisions(&request.family)
    .await
    .map_err(spinup_types::error::internal_from_anyhow)?;
  let current_arn = revisions.last().cloned().ok_or_else(|| {
    OrchestrationError::not_found(format!("no revisions for family {}", request.family))
  })?;

  // Run defaults: managed tags on, FARGATE whenever no capacity-provider
  // strategy is in play, and the org's default network configuration.
  let launch_type = match &request.capacity_provider_strategy {
    Some(strategy) if !strategy.is_empty() => None,
    _ => Some(LaunchType::Fargate),
  };
  let run_options = RunTaskOptions {
    launch_type,
    capacity_provider_strategy: request.capacity_provider_strategy.clone(),
    network_configuration: NetworkConfiguration {
      subnets: org.default_network.subnets.clone(),
      security_groups: org.default_network.security_groups.clone(),
      assign_public_ip: org.default_network.assign_public_ip,
    },
    enable_ecs_managed_tags: true,
  };

  let task_arns = caps
    .container_platform
    .run_task(&cluster.name, &current_arn, request.count, &run_options)
    .await
    .map_err(spinup_types::error::internal_from_anyhow)?;

  if let Some((def, _)) = caps
    .container_platform
    .get_task_definition(&current_arn)
    .await
    .map_err(spinup_types::error::internal_from_anyhow)?
  {
    for task_arn in &task_arns {
      propagate::propagate(
        caps,
        &def.tags,
        &[PropagateTarget::Specific { arn: task_arn }],
      )
      .await?;
    }
  }

  Ok(RunTaskDefinitionResponse { task_arns })
}

pub async fn list(
  caps: &Capabilities,
  org: &OrgContext,
  request: &ListTaskDefinitionsRequest,
) -> Result<ListTaskDefinitionsResponse, OrchestrationError> {
  let mut filters = vec![
    TagFilter::new(tag::TAG_ORG, &org.organisation),
    TagFilter::new(tag::TAG_TYPE, ROLE_TAG_TYPE),
    TagFilter::new(tag::TAG_FLAVOR, ROLE_TAG_FLAVOR),
  ];
  if let Some(cluster) = &request.cluster {
    filters.push(TagFilter::new(tag::TAG_SPACE_ID, cluster));
  }

  let arns = caps
    .tag_search
    .get_resources_with_tags(&["ecs:task-definition"], &filters)
    .await
    .map_err(spinup_types::error::internal_from_anyhow)?;

  let mut families: Vec<String> =
    arns.iter().map(|arn| crate::arn::extract_family(arn)).collect();
  families.sort();
  families.dedup();

  Ok(ListTaskDefinitionsResponse { families })
}

pub async fn show(
  caps: &Capabilities,
  request: &ShowTaskDefinitionRequest,
) -> Result<TaskDefinition, OrchestrationError> {
  let _cluster = caps
    .container_platform
    .get_cluster(&request.cluster)
    .await
    .map_err(spinup_types::error::internal_from_anyhow)?
    .ok_or_else(|| OrchestrationError::not_found(format!("cluster {} not found", request.cluster)))?;

  let revisions = caps
    .container_platform
    .list_task_definition_revisions(&request.family)
    .await
    .map_err(spinup_types::error::internal_from_anyhow)?;
  let current_arn = revisions.last().cloned().ok_or_else(|| {
    OrchestrationError::not_found(format!("no revisions for family {}", request.family))
  })?;
  let (def, tags) = caps
    .container_platform
    .get_task_definition(&current_arn)
    .await
    .map_err(spinup_types::error::internal_from_anyhow)?
    .ok_or_else(|| OrchestrationError::not_found("current revision vanished"))?;

  // Space isolation: the family must carry this cluster's spaceid tag.
  let space_tag =
    tags.iter().find(|t| t.key == tag::TAG_SPACE_ID).map(|t| t.value.as_str());
  if space_tag != Some(request.cluster.as_str()) {
    return Err(OrchestrationError::not_found(format!(
      "family {} is not owned by cluster {}",
      request.family, request.cluster
    )));
  }

  Ok(def)
}
