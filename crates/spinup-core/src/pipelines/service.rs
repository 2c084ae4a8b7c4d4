//! Service pipeline: end-to-end create / update / delete for a
//! service.

use std::collections::HashSet;

use spinup_capabilities::Capabilities;
use spinup_types::{
  error::OrchestrationError,
  org::{NetworkConfiguration, OrgContext},
  service::{PropagateTags, Service, ServiceCreateInput, ServiceDeleteInput, ServiceStatus, ServiceUpdateInput},
  task_definition::ContainerCredentialInput,
};
use tokio_util::sync::CancellationToken;

use crate::{
  build::{service_registry, task_definition as build_task_definition},
  cluster::{handler as cluster_handler, retry as cluster_retry},
  propagate::{self, PropagateTarget},
  reconcile::credentials::{self, ContainerCredentialState},
  rollback::{RollbackEntry, RollbackStack},
  tags,
};

const ROLE_TAG_TYPE: &str = "container";
const ROLE_TAG_FLAVOR: &str = "service";

pub async fn create(
  caps: &Capabilities,
  org: &OrgContext,
  input: &ServiceCreateInput,
  cancel: &CancellationToken,
) -> Result<Service, OrchestrationError> {
  let mut rollback = RollbackStack::new();

  let tag_set = tags::normalise(
    tags::NormaliseParams {
      org: &org.organisation,
      space: &input.cluster.name,
      resource_type: ROLE_TAG_TYPE,
      flavor: ROLE_TAG_FLAVOR,
    },
    &input.tags,
  )?;

  let result = create_inner(caps, org, input, &tag_set, &mut rollback).await;
  match result {
    Ok(service) => Ok(service),
    Err(err) => {
      rollback.spawn_drain();
      Err(err)
    }
  }
}

async fn create_inner(
  caps: &Capabilities,
  org: &OrgContext,
  input: &ServiceCreateInput,
  tag_set: &spinup_types::tag::TagSet,
  rollback: &mut RollbackStack,
) -> Result<Service, OrchestrationError> {
  let mut cluster_input = input.cluster.clone();
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

  let mut containers = input.task_definition.containers.clone();
  let mut created_secret_arns = Vec::new();
  for container in &mut containers {
    let default_input = ContainerCredentialInput::default();
    let cred_input = input.credentials.get(&container.name).unwrap_or(&default_input);
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
      &input.tags,
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
        caps
          .secret_store
          .delete_secret(&arn, spinup_capabilities::secret_store::RecoveryWindow::IMMEDIATE)
          .await?;
      }
      Ok(())
    }));
  } else {
    rollback.push(RollbackEntry::noop("create-credentials"));
  }

  let mut tdi = input.task_definition.clone();
  tdi.containers = containers;
  let task_def = build_task_definition::build(caps, org, &cluster.name, &tdi, tag_set).await?;
  {
    let caps = caps.clone();
    let arn = task_def.arn.clone();
    rollback.push(RollbackEntry::named("build-task-definition", move || async move {
      caps.container_platform.delete_task_definition(&arn).await
    }));
  }

  let (registry_arn, created_registry) = service_registry::bind(
    caps,
    input.registry_arn.as_deref(),
    input.registry_create.as_ref(),
  )
  .await?;
  if let (true, Some(arn)) = (created_registry, registry_arn.clone()) {
    let caps = caps.clone();
    rollback.push(RollbackEntry::named("bind-service-registry", move || async move {
      caps.discovery.delete_service_registry_with_retry(&arn).await.await.map_err(|_| {
        anyhow::anyhow!("service-registry delete outcome channel dropped")
      })?
    }));
  } else {
    rollback.push(RollbackEntry::noop("bind-service-registry"));
  }

  let network_configuration = input.network_configuration.clone().or_else(|| {
    Some(NetworkConfiguration {
      subnets: org.default_network.subnets.clone(),
      security_groups: org.default_network.security_groups.clone(),
      assign_public_ip: false,
    })
  });

  let service = Service {
    name: input.name.clone(),
    arn: String::new(),
    cluster: cluster.name.clone(),
    task_definition_arn: task_def.arn.clone(),
    desired_count: input.desired_count,
    network_configuration,
    capacity_provider_strategy: input.capacity_provider_strategy.clone(),
    registries: registry_arn
      .into_iter()
      .map(|registry_arn| spinup_types::service::ServiceRegistryBinding { registry_arn })
      .collect(),
    tags: tag_set.clone(),
    status: ServiceStatus::Active,
    propagate_tags: PropagateTags::Service,
    client_token: Some(org.request_uniqueness_token.clone()),
  };

  let created = caps
    .container_platform
    .create_service(&service)
    .await
    .map_err(spinup_types::error::internal_from_anyhow)?;
  {
    let caps = caps.clone();
    let cluster_name = created.cluster.clone();
    let name = created.name.clone();
    rollback.push(RollbackEntry::named("create-service", move || async move {
      caps.container_platform.delete_service(&cluster_name, &name, true).await
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
    PropagateTarget::Specific { arn: &created.arn },
  ];
  if let Some(log_group) = &log_group {
    targets.push(PropagateTarget::SharedNamed { arn: &log_group.arn, name: &cluster.name });
  }
  for arn in &secret_arns {
    targets.push(PropagateTarget::Specific { arn });
  }
  propagate::propagate(caps, tag_set, &targets).await?;
  rollback.push(RollbackEntry::noop("propagate-tags"));

  Ok(created)
}

pub async fn update(
  caps: &Capabilities,
  org: &OrgContext,
  input: &ServiceUpdateInput,
  _cancel: &CancellationToken,
) -> Result<Service, OrchestrationError> {
  let mut service = caps
    .container_platform
    .get_service(&input.cluster, &input.name)
    .await
    .map_err(spinup_types::error::internal_from_anyhow)?
    .ok_or_else(|| OrchestrationError::not_found(format!("service {} not found", input.name)))?;

  let existing_tags = caps
    .container_platform
    .list_tags(&service.arn)
    .await
    .map_err(spinup_types::error::internal_from_anyhow)?;
  for t in existing_tags {
    service.tags.entry(t.key).or_insert(t.value);
  }

  let current_def = caps
    .container_platform
    .get_task_definition(&service.task_definition_arn)
    .await
    .map_err(spinup_types::error::internal_from_anyhow)?
    .map(|(def, _)| def);

  if let Some(new_input) = &input.task_definition {
    let current_def = current_def.ok_or_else(|| {
      OrchestrationError::not_found("current task definition not found")
    })?;

    let mut containers = new_input.containers.clone();
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
        input: input.credentials.get(name).unwrap_or(&default_input),
      })
      .collect();
    let outcomes = credentials::reconcile(
      caps,
      org,
      &input.cluster,
      &current_def.tags,
      &input.tags,
      &states,
    )
    .await?;
    for container in &mut containers {
      container.repository_credentials =
        outcomes.get(&container.name).and_then(|o| o.bound_arn.clone());
    }

    let mut tdi = new_input.clone();
    tdi.containers = containers;
    let new_def =
      build_task_definition::build(caps, org, &input.cluster, &tdi, &current_def.tags).await?;
    service.task_definition_arn = new_def.arn;
  }

  // Network config merge: subnets/security-groups independently fall back
  // to the active configuration; public-IP is always forced DISABLED.
  let active_network = service.network_configuration.clone();
  if let Some(requested) = &input.network_configuration {
    let fallback = active_network.unwrap_or(org.default_network.clone());
    service.network_configuration = Some(NetworkConfiguration {
      subnets: if requested.subnets.is_empty() {
        fallback.subnets
      } else {
        requested.subnets.clone()
      },
      security_groups: if requested.security_groups.is_empty() {
        fallback.security_groups
      } else {
        requested.security_groups.clone()
      },
      assign_public_ip: false,
    });
  } else if let Some(active) = &mut service.network_configuration {
    active.assign_public_ip = false;
  }

  // A non-empty strategy both overrides the launch type and, like an
  // explicit `force_new_deployment`, forces the provider to roll the
  // service even if nothing else about it changed.
  let strategy_forces_deployment = match &input.capacity_provider_strategy {
    Some(strategy) if !strategy.is_empty() => {
      service.capacity_provider_strategy = Some(strategy.clone());
      true
    }
    // An empty (non-nil) strategy retains the service's original launch type.
    _ => false,
  };
  let force_new_deployment = input.force_new_deployment || strategy_forces_deployment;

  for t in &input.tags {
    service.tags.insert(t.key.clone(), t.value.clone());
  }

  let updated = caps
    .container_platform
    .update_service(&service, force_new_deployment)
    .await
    .map_err(spinup_types::error::internal_from_anyhow)?;

  let cluster = caps
    .container_platform
    .get_cluster(&input.cluster)
    .await
    .map_err(spinup_types::error::internal_from_anyhow)?;
  let role_name = org.default_execution_role_name(&input.cluster);
  let role = caps
    .access_control
    .get_role(&role_name)
    .await
    .map_err(spinup_types::error::internal_from_anyhow)?;
  let log_group = caps
    .log_groups
    .get_log_group(&input.cluster)
    .await
    .map_err(spinup_types::error::internal_from_anyhow)?;
  let updated_def = caps
    .container_platform
    .get_task_definition(&updated.task_definition_arn)
    .await
    .map_err(spinup_types::error::internal_from_anyhow)?
    .map(|(def, _)| def);
  let secret_arns = updated_def
    .as_ref()
    .map(|def| propagate::secret_arns_from_containers(&def.containers))
    .unwrap_or_default();

  let mut targets = vec![
    PropagateTarget::Specific { arn: &updated.arn },
    PropagateTarget::Specific { arn: &updated.task_definition_arn },
  ];
  if let Some(cluster) = &cluster {
    targets.push(PropagateTarget::SharedNamed { arn: &cluster.arn, name: &cluster.name });
  }
  if let Some(log_group) = &log_group {
    targets.push(PropagateTarget::SharedNamed { arn: &log_group.arn, name: &input.cluster });
  }
  if let Some(role) = &role {
    targets.push(PropagateTarget::Role { arn: &role.arn, role_name: &role_name });
  }
  for arn in &secret_arns {
    targets.push(PropagateTarget::Specific { arn });
  }
  propagate::propagate(caps, &updated.tags, &targets).await?;

  Ok(updated)
}

pub async fn delete(
  caps: &Capabilities,
  org: &OrgContext,
  input: &ServiceDeleteInput,
  cancel: &CancellationToken,
) -> Result<(), OrchestrationError> {
  let service = caps
    .container_platform
    .get_service(&input.cluster, &input.name)
    .await
    .map_err(spinup_types::error::internal_from_anyhow)?
    .ok_or_else(|| OrchestrationError::not_found(format!("service {} not found", input.name)))?;

  caps
    .container_platform
    .delete_service(&input.cluster, &input.name, true)
    .await
    .map_err(spinup_types::error::internal_from_anyhow)?;

  if input.recursive {
    let caps = caps.clone();
    let org = org.clone();
    let cluster = input.cluster.clone();
    let family = service.task_definition_arn.clone();
    let registries = service.registries.clone();
    let parent = cancel.clone();
    tokio::spawn(async move {
      // Detaches from the caller's token: cleanup runs on a fresh
      // background token so an HTTP client disconnect can't abort it.
      let _ = parent;
      run_delete_cleanup(&caps, &org, &cluster, &family, &registries).await;
    });
  }

  Ok(())
}

async fn run_delete_cleanup(
  caps: &Capabilities,
  org: &OrgContext,
  cluster: &str,
  family_or_arn: &str,
  registries: &[spinup_types::service::ServiceRegistryBinding],
) {
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
      if let Err(err) = delete_default_execution_role(caps, org, cluster).await {
        tracing::error!(%cluster, error = %err, "failed to delete default execution role during recursive service delete");
      }
    }
    Ok(false) => {
      tracing::warn!(%cluster, "cluster delete retry abandoned (deadline or cancellation)");
    }
    Err(err) => {
      tracing::error!(%cluster, error = %err, "cluster delete failed fatally during recursive service delete");
    }
  }

  for binding in registries {
    let rx = caps.discovery.delete_service_registry_with_retry(&binding.registry_arn).await;
    match rx.await {
      Ok(Ok(())) => {}
      Ok(Err(err)) => {
        tracing::error!(registry_arn = %binding.registry_arn, error = %err, "registry delete failed")
      }
      Err(_) => {
        tracing::error!(registry_arn = %binding.registry_arn, "registry delete outcome channel dropped")
      }
    }
  }

  let mut deleted_secrets = HashSet::new();
  let family = crate::arn::extract_family(family_or_arn);
  match caps.container_platform.list_task_definition_revisions(&family).await {
    Ok(revisions) => {
      for arn in revisions {
        if let Err(err) = crate::pipelines::task_definition::teardown_revision(
          caps,
          &arn,
          &mut deleted_secrets,
        )
        .await
        {
          tracing::error!(revision = %arn, error = %err, "failed tearing down task-definition revision");
        }
      }
    }
    Err(err) => {
      tracing::error!(%family, error = %err, "failed to list task-definition revisions for cleanup");
    }
  }
}

async fn delete_default_execution_role(
  caps: &Capabilities,
  org: &OrgContext,
  cluster: &str,
) -> anyhow::Result<()> {
  let role_name = org.default_execution_role_name(cluster);
  let policies = caps.access_control.list_role_policies(&role_name).await?;
  for policy_name in policies {
    caps.access_control.delete_role_policy(&role_name, &policy_name).await?;
  }
  caps.access_control.delete_role(&role_name).await
}
