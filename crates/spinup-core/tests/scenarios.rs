//! End-to-end coverage of the concrete orchestration scenarios: one
//! integration test per scenario, driven entirely against `MockProvider`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use spinup_capabilities::{Capabilities, mock::MockProvider};
use spinup_core::pipelines::{service, task_definition};
use spinup_types::{
  cluster::ClusterCreateInput,
  org::{LaunchType, NetworkConfiguration, OrgContext, RunTaskOptions},
  requests::{
    CreateTaskDefinitionRequest, DeleteTaskDefinitionRequest, ListTaskDefinitionsRequest,
    ShowTaskDefinitionRequest, UpdateTaskDefinitionRequest,
  },
  service::{ServiceCreateInput, ServiceDeleteInput, ServiceUpdateInput},
  tag::Tag,
  task_definition::{
    ContainerCredentialInput, ContainerDefinition, NewCredentialPayload, TaskDefinitionInput,
  },
};
use tokio_util::sync::CancellationToken;

fn org() -> OrgContext {
  OrgContext {
    organisation: "acme".to_string(),
    default_network: NetworkConfiguration {
      subnets: vec!["subnet-a".to_string(), "subnet-b".to_string()],
      security_groups: vec!["sg-default".to_string()],
      assign_public_ip: false,
    },
    default_log_retention_days: 365,
    default_launch_type: LaunchType::Fargate,
    default_capacity_provider_strategy: vec![],
    default_kms_key_id: "arn:mock:kms:key/default".to_string(),
    request_uniqueness_token: "req-token-1".to_string(),
    region: "us-east-1".to_string(),
    account_id: "123456789012".to_string(),
    secret_store_prefix: "spinup".to_string(),
    parameter_store_prefix: "/spinup".to_string(),
  }
}

fn caps_from(mock: Arc<MockProvider>) -> Capabilities {
  Capabilities {
    container_platform: mock.clone(),
    access_control: mock.clone(),
    secret_store: mock.clone(),
    discovery: mock.clone(),
    log_groups: mock.clone(),
    tag_search: mock,
  }
}

fn nginx_container() -> ContainerDefinition {
  ContainerDefinition {
    name: "nginx".to_string(),
    image: "nginx:alpine".to_string(),
    port_mappings: vec![],
    log_configuration: None,
    repository_credentials: None,
  }
}

#[tokio::test]
async fn create_service_from_scratch() {
  let mock = Arc::new(MockProvider::new());
  let caps = caps_from(mock.clone());
  let org = org();
  let cancel = CancellationToken::new();

  let input = ServiceCreateInput {
    name: "web".to_string(),
    cluster: ClusterCreateInput { name: "clu1".to_string(), ..Default::default() },
    task_definition: TaskDefinitionInput {
      family: "web".to_string(),
      containers: vec![nginx_container()],
      cpu: "256".to_string(),
      memory: "512".to_string(),
      tags: vec![],
    },
    credentials: HashMap::new(),
    desired_count: 1,
    network_configuration: None,
    capacity_provider_strategy: None,
    registry_arn: None,
    registry_create: None,
    tags: vec![Tag::new("Application", "demo")],
  };

  let created = service::create(&caps, &org, &input, &cancel).await.unwrap();

  let cluster = mock.clusters.lock().unwrap().get("clu1").cloned().unwrap();
  assert!(cluster.capacity_providers.contains(&"FARGATE".to_string()));
  assert!(cluster.capacity_providers.contains(&"FARGATE_SPOT".to_string()));

  let role = mock.roles.lock().unwrap().get("clu1-ecsTaskExecution").cloned().unwrap();

  let log_group = mock.log_groups.lock().unwrap().get("clu1").cloned().unwrap();
  assert_eq!(log_group.retention_days, 365);

  let def = mock
    .task_definitions
    .lock()
    .unwrap()
    .get(&created.task_definition_arn)
    .cloned()
    .unwrap();
  assert_eq!(def.revision, 1);
  assert_eq!(def.execution_role_arn, role.arn);
  assert_eq!(def.task_role_arn, role.arn);
  let log_config = def.containers[0].log_configuration.as_ref().unwrap();
  assert_eq!(log_config.options.get("group").unwrap(), "clu1");
  assert_eq!(log_config.options.get("stream-prefix").unwrap(), "web");

  assert_eq!(created.network_configuration.as_ref().unwrap().assign_public_ip, false);

  for expected in [
    ("spinup:org", "acme"),
    ("spinup:spaceid", "clu1"),
    ("spinup:type", "container"),
    ("spinup:flavor", "service"),
    ("Application", "demo"),
  ] {
    assert_eq!(created.tags.get(expected.0).map(|s| s.as_str()), Some(expected.1));
  }
}

async fn create_service_with_credential(
  caps: &Capabilities,
  org: &OrgContext,
) -> (spinup_types::service::Service, String) {
  let mut credentials = HashMap::new();
  credentials.insert(
    "api".to_string(),
    ContainerCredentialInput {
      repository_credentials_arn: None,
      new_credential: Some(NewCredentialPayload {
        name: "api-cred".to_string(),
        secret_string: "initial".to_string(),
      }),
    },
  );
  let input = ServiceCreateInput {
    name: "api-svc".to_string(),
    cluster: ClusterCreateInput { name: "clu2".to_string(), ..Default::default() },
    task_definition: TaskDefinitionInput {
      family: "api".to_string(),
      containers: vec![ContainerDefinition {
        name: "api".to_string(),
        image: "example/api:1".to_string(),
        port_mappings: vec![],
        log_configuration: None,
        repository_credentials: None,
      }],
      cpu: "256".to_string(),
      memory: "512".to_string(),
      tags: vec![],
    },
    credentials,
    desired_count: 1,
    network_configuration: None,
    capacity_provider_strategy: None,
    registry_arn: None,
    registry_create: Some(spinup_types::service::ServiceDiscoveryCreateInput {
      name: "api-svc".to_string(),
      namespace_id: "ns-demo".to_string(),
    }),
    tags: vec![],
  };
  let cancel = CancellationToken::new();
  let created = service::create(caps, org, &input, &cancel).await.unwrap();
  let (def, _) = caps
    .container_platform
    .get_task_definition(&created.task_definition_arn)
    .await
    .unwrap()
    .unwrap();
  let active_arn = def.containers[0].repository_credentials.clone().unwrap();
  (created, active_arn)
}

#[tokio::test]
async fn update_rotates_credentials_in_place() {
  let mock = Arc::new(MockProvider::new());
  let caps = caps_from(mock.clone());
  let org = org();

  let (_created, active_arn) = create_service_with_credential(&caps, &org).await;

  let mut credentials = HashMap::new();
  credentials.insert(
    "api".to_string(),
    ContainerCredentialInput {
      repository_credentials_arn: None,
      new_credential: Some(NewCredentialPayload {
        name: "api-cred".to_string(),
        secret_string: "new".to_string(),
      }),
    },
  );
  let update = ServiceUpdateInput {
    name: "api-svc".to_string(),
    cluster: "clu2".to_string(),
    task_definition: Some(TaskDefinitionInput {
      family: "api".to_string(),
      containers: vec![ContainerDefinition {
        name: "api".to_string(),
        image: "example/api:1".to_string(),
        port_mappings: vec![],
        log_configuration: None,
        repository_credentials: None,
      }],
      cpu: "256".to_string(),
      memory: "512".to_string(),
      tags: vec![],
    }),
    credentials,
    desired_count: None,
    network_configuration: None,
    capacity_provider_strategy: None,
    force_new_deployment: false,
    tags: vec![],
  };

  let cancel = CancellationToken::new();
  let updated = service::update(&caps, &org, &update, &cancel).await.unwrap();

  let (new_def, _) =
    caps.container_platform.get_task_definition(&updated.task_definition_arn).await.unwrap().unwrap();
  assert_eq!(new_def.containers[0].repository_credentials.as_deref(), Some(active_arn.as_str()));

  let payload = caps.secret_store.get_secret_value(&active_arn).await.unwrap().unwrap();
  assert_eq!(payload, "new");
  assert!(mock.secrets.lock().unwrap().contains_key(&active_arn));
}

#[tokio::test]
async fn update_drops_credential_schedules_deletion() {
  let mock = Arc::new(MockProvider::new());
  let caps = caps_from(mock.clone());
  let org = org();

  let (_created, active_arn) = create_service_with_credential(&caps, &org).await;

  let update = ServiceUpdateInput {
    name: "api-svc".to_string(),
    cluster: "clu2".to_string(),
    task_definition: Some(TaskDefinitionInput {
      family: "api".to_string(),
      containers: vec![ContainerDefinition {
        name: "api".to_string(),
        image: "example/api:1".to_string(),
        port_mappings: vec![],
        log_configuration: None,
        repository_credentials: None,
      }],
      cpu: "256".to_string(),
      memory: "512".to_string(),
      tags: vec![],
    }),
    credentials: HashMap::new(),
    desired_count: None,
    network_configuration: None,
    capacity_provider_strategy: None,
    force_new_deployment: false,
    tags: vec![],
  };

  let cancel = CancellationToken::new();
  let updated = service::update(&caps, &org, &update, &cancel).await.unwrap();

  let (new_def, _) =
    caps.container_platform.get_task_definition(&updated.task_definition_arn).await.unwrap().unwrap();
  assert!(new_def.containers[0].repository_credentials.is_none());
  assert!(!mock.secrets.lock().unwrap().contains_key(&active_arn));
}

#[tokio::test]
async fn recursive_service_delete_cleans_up_async() {
  let mock = Arc::new(MockProvider::new());
  let caps = caps_from(mock.clone());
  let org = org();
  let (created, active_arn) = create_service_with_credential(&caps, &org).await;
  assert_eq!(created.registries.len(), 1);
  let registry_arn = created.registries[0].registry_arn.clone();

  let delete_input = ServiceDeleteInput {
    name: created.name.clone(),
    cluster: created.cluster.clone(),
    recursive: true,
  };
  let cancel = CancellationToken::new();
  service::delete(&caps, &org, &delete_input, &cancel).await.unwrap();

  assert!(mock.services.lock().unwrap().is_empty());

  tokio::time::sleep(Duration::from_millis(50)).await;

  assert!(mock.clusters.lock().unwrap().get(&created.cluster).is_none());
  assert!(mock.roles.lock().unwrap().get("clu2-ecsTaskExecution").is_none());
  assert!(!mock.secrets.lock().unwrap().contains_key(&active_arn));
  assert!(mock.discovery_services.lock().unwrap().get(&registry_arn).is_none());
  assert!(
    mock
      .task_definitions
      .lock()
      .unwrap()
      .values()
      .filter(|d| d.family == "api")
      .count()
      == 0
  );
}

#[tokio::test]
async fn force_delete_family_with_running_tasks() {
  let mock = Arc::new(MockProvider::new());
  let caps = caps_from(mock.clone());
  let org = org();

  let request = CreateTaskDefinitionRequest {
    cluster: ClusterCreateInput { name: "clu3".to_string(), ..Default::default() },
    task_definition: TaskDefinitionInput {
      family: "worker".to_string(),
      containers: vec![ContainerDefinition {
        name: "worker".to_string(),
        image: "example/worker:1".to_string(),
        port_mappings: vec![],
        log_configuration: None,
        repository_credentials: None,
      }],
      cpu: "256".to_string(),
      memory: "512".to_string(),
      tags: vec![],
    },
    credentials: HashMap::new(),
    tags: vec![],
  };
  let def = task_definition::create(&caps, &org, &request).await.unwrap();

  let run_options = RunTaskOptions {
    launch_type: Some(LaunchType::Fargate),
    capacity_provider_strategy: None,
    network_configuration: org.default_network.clone(),
    enable_ecs_managed_tags: true,
  };
  let running_arns = caps
    .container_platform
    .run_task("clu3", &def.arn, 2, &run_options)
    .await
    .unwrap();
  assert_eq!(running_arns.len(), 2);

  let delete_request = DeleteTaskDefinitionRequest {
    cluster: "clu3".to_string(),
    family: "worker".to_string(),
    force: true,
    recursive: true,
  };
  let cancel = CancellationToken::new();
  task_definition::delete(&caps, &org, &delete_request, &cancel).await.unwrap();

  tokio::time::sleep(Duration::from_millis(150)).await;

  let tasks = mock.tasks.lock().unwrap();
  assert!(tasks.values().all(|t| t.last_status == "STOPPED"));
  drop(tasks);

  assert!(
    mock
      .task_definitions
      .lock()
      .unwrap()
      .values()
      .filter(|d| d.family == "worker")
      .count()
      == 0
  );
  assert!(mock.clusters.lock().unwrap().get("clu3").is_none());
}

#[tokio::test]
async fn policy_drift_is_repaired() {
  use spinup_core::reconcile::execution_role;
  use spinup_types::{
    policy::{Effect, PolicyDocument, Statement},
    tag::TagSet,
  };

  let mock = Arc::new(MockProvider::new());
  let caps = caps_from(mock.clone());
  let org = org();

  let first_arn =
    execution_role::reconcile(&caps, &org, "clu4", "clu4-ecsTaskExecution", &TagSet::new())
      .await
      .unwrap();

  let drifted = PolicyDocument {
    version: "2012-10-17".to_string(),
    statement: vec![Statement {
      effect: Effect::Allow,
      action: vec!["s3:GetObject".to_string()],
      resource: Some(vec!["*".to_string()]),
      principal: None,
      condition: None,
    }],
  };
  caps
    .access_control
    .put_role_policy("clu4-ecsTaskExecution", "ECSTaskAccessPolicy", &drifted)
    .await
    .unwrap();

  let second_arn =
    execution_role::reconcile(&caps, &org, "clu4", "clu4-ecsTaskExecution", &TagSet::new())
      .await
      .unwrap();
  assert_eq!(first_arn, second_arn);

  let repaired = caps
    .access_control
    .get_role_policy("clu4-ecsTaskExecution", "ECSTaskAccessPolicy")
    .await
    .unwrap()
    .unwrap();
  let desired = execution_role::default_task_execution_policy(&org, "clu4");
  assert!(!PolicyDocument::needs_update(&desired, &repaired));
}

#[tokio::test]
async fn created_family_is_visible_to_list_and_show() {
  let mock = Arc::new(MockProvider::new());
  let caps = caps_from(mock.clone());
  let org = org();

  let request = CreateTaskDefinitionRequest {
    cluster: ClusterCreateInput { name: "clu5".to_string(), ..Default::default() },
    task_definition: TaskDefinitionInput {
      family: "indexer".to_string(),
      containers: vec![ContainerDefinition {
        name: "indexer".to_string(),
        image: "example/indexer:1".to_string(),
        port_mappings: vec![],
        log_configuration: None,
        repository_credentials: None,
      }],
      cpu: "256".to_string(),
      memory: "512".to_string(),
      tags: vec![],
    },
    credentials: HashMap::new(),
    tags: vec![],
  };
  task_definition::create(&caps, &org, &request).await.unwrap();

  let listed = task_definition::list(
    &caps,
    &org,
    &ListTaskDefinitionsRequest { cluster: Some("clu5".to_string()) },
  )
  .await
  .unwrap();
  assert_eq!(listed.families, vec!["indexer".to_string()]);

  let listed_all =
    task_definition::list(&caps, &org, &ListTaskDefinitionsRequest { cluster: None })
      .await
      .unwrap();
  assert!(listed_all.families.contains(&"indexer".to_string()));

  let shown = task_definition::show(
    &caps,
    &ShowTaskDefinitionRequest { cluster: "clu5".to_string(), family: "indexer".to_string() },
  )
  .await
  .unwrap();
  assert_eq!(shown.family, "indexer");

  let wrong_cluster = task_definition::show(
    &caps,
    &ShowTaskDefinitionRequest { cluster: "clu6".to_string(), family: "indexer".to_string() },
  )
  .await;
  assert!(wrong_cluster.is_err());
}

#[tokio::test]
async fn show_returns_the_newest_revision_after_update() {
  let mock = Arc::new(MockProvider::new());
  let caps = caps_from(mock.clone());
  let org = org();

  let request = CreateTaskDefinitionRequest {
    cluster: ClusterCreateInput { name: "clu7".to_string(), ..Default::default() },
    task_definition: TaskDefinitionInput {
      family: "worker".to_string(),
      containers: vec![ContainerDefinition {
        name: "worker".to_string(),
        image: "example/worker:1".to_string(),
        port_mappings: vec![],
        log_configuration: None,
        repository_credentials: None,
      }],
      cpu: "256".to_string(),
      memory: "512".to_string(),
      tags: vec![],
    },
    credentials: HashMap::new(),
    tags: vec![],
  };
  task_definition::create(&caps, &org, &request).await.unwrap();

  let update = UpdateTaskDefinitionRequest {
    cluster: "clu7".to_string(),
    family: "worker".to_string(),
    task_definition: TaskDefinitionInput {
      family: "worker".to_string(),
      containers: vec![ContainerDefinition {
        name: "worker".to_string(),
        image: "example/worker:2".to_string(),
        port_mappings: vec![],
        log_configuration: None,
        repository_credentials: None,
      }],
      cpu: "256".to_string(),
      memory: "512".to_string(),
      tags: vec![],
    },
    credentials: HashMap::new(),
    tags: vec![],
  };
  task_definition::update(&caps, &org, &update).await.unwrap();

  let shown = task_definition::show(
    &caps,
    &ShowTaskDefinitionRequest { cluster: "clu7".to_string(), family: "worker".to_string() },
  )
  .await
  .unwrap();
  assert_eq!(shown.revision, 2);
  assert_eq!(shown.containers[0].image, "example/worker:2");
}
