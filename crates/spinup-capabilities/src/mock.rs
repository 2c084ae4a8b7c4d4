//! In-memory doubles for every capability trait, used by `spinup-core`'s
//! integration tests and by `spinup-cli` for offline demonstration runs.
//! None of this is meant to model real provider latency or consistency —
//! it exists purely so the pipelines can be driven end-to-end without a
//! network.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use spinup_types::{
  cluster::{Cluster, ClusterCreateInput},
  log_group::LogGroup,
  org::RunTaskOptions,
  policy::PolicyDocument,
  role::Role,
  secret::Secret,
  service::Service,
  tag::{Tag, TagSet},
  task_definition::TaskDefinition,
};
use tokio::sync::oneshot;

use crate::{
  access_control::AccessControl,
  container_platform::{ContainerPlatform, TaskStatus},
  discovery::{Discovery, ServiceDiscoveryService},
  logging::LogGroups,
  secret_store::{RecoveryWindow, SecretStore},
  tag_search::{TagFilter, TagSearch},
};

fn tags_to_set(tags: &[Tag]) -> TagSet {
  tags.iter().map(|t| (t.key.clone(), t.value.clone())).collect()
}

/// A single fixture backing every capability trait. Cheap to clone (each
/// handle is an `Arc` over shared `Mutex` state) so tests can hold onto it
/// after handing `Arc<dyn Trait>` clones to the pipeline under test.
#[derive(Default)]
pub struct MockProvider {
  pub clusters: Mutex<HashMap<String, Cluster>>,
  pub task_definitions: Mutex<HashMap<String, TaskDefinition>>,
  pub revision_counters: Mutex<HashMap<String, i32>>,
  pub services: Mutex<HashMap<(String, String), Service>>,
  pub tasks: Mutex<HashMap<String, TaskStatus>>,
  pub resource_tags: Mutex<HashMap<String, TagSet>>,

  pub roles: Mutex<HashMap<String, Role>>,
  pub role_policies: Mutex<HashMap<(String, String), PolicyDocument>>,

  pub secrets: Mutex<HashMap<String, Secret>>,

  pub discovery_services: Mutex<HashMap<String, ServiceDiscoveryService>>,

  pub log_groups: Mutex<HashMap<String, LogGroup>>,

  next_arn_suffix: Mutex<u64>,
}

impl MockProvider {
  pub fn new() -> Self {
    Self::default()
  }

  fn next_id(&self) -> u64 {
    let mut n = self.next_arn_suffix.lock().unwrap();
    *n += 1;
    *n
  }
}

#[async_trait]
impl ContainerPlatform for MockProvider {
  async fn get_cluster(&self, name: &str) -> anyhow::Result<Option<Cluster>> {
    Ok(self.clusters.lock().unwrap().get(name).cloned())
  }

  async fn create_cluster(
    &self,
    input: &ClusterCreateInput,
  ) -> anyhow::Result<Cluster> {
    let cluster = Cluster {
      name: input.name.clone(),
      arn: format!("arn:mock:ecs:cluster/{}", input.name),
      capacity_providers: input.capacity_providers.clone().unwrap_or_default(),
      default_capacity_provider_strategy: input
        .default_capacity_provider_strategy
        .clone()
        .unwrap_or_default(),
      active_task_count: 0,
      pending_task_count: 0,
      running_task_count: 0,
      registered_container_instances_count: 0,
      active_services_count: 0,
      tags: tags_to_set(&input.tags),
    };
    self
      .clusters
      .lock()
      .unwrap()
      .insert(cluster.name.clone(), cluster.clone());
    Ok(cluster)
  }

  async fn delete_cluster(&self, name: &str) -> anyhow::Result<()> {
    self.clusters.lock().unwrap().remove(name);
    Ok(())
  }

  async fn get_task_definition(
    &self,
    arn: &str,
  ) -> anyhow::Result<Option<(TaskDefinition, Vec<Tag>)>> {
    let defs = self.task_definitions.lock().unwrap();
    Ok(defs.get(arn).map(|def| {
      let tags = def.tags.iter().map(|(k, v)| Tag::new(k.clone(), v.clone())).collect();
      (def.clone(), tags)
    }))
  }

  async fn create_task_definition(
    &self,
    def: &TaskDefinition,
  ) -> anyhow::Result<TaskDefinition> {
    let revision = {
      let mut counters = self.revision_counters.lock().unwrap();
      let entry = counters.entry(def.family.clone()).or_insert(0);
      *entry += 1;
      *entry
    };
    let mut def = def.clone();
    def.revision = revision;
    def.arn = format!("arn:mock:ecs:task-definition/{}:{}", def.family, revision);
    self
      .task_definitions
      .lock()
      .unwrap()
      .insert(def.arn.clone(), def.clone());
    Ok(def)
  }

  async fn delete_task_definition(&self, arn: &str) -> anyhow::Result<()> {
    self.task_definitions.lock().unwrap().remove(arn);
    Ok(())
  }

  async fn list_task_definition_revisions(
    &self,
    family: &str,
  ) -> anyhow::Result<Vec<String>> {
    let defs = self.task_definitions.lock().unwrap();
    let mut matching: Vec<&TaskDefinition> =
      defs.values().filter(|d| d.family == family).collect();
    matching.sort_by_key(|d| d.revision);
    Ok(matching.into_iter().map(|d| d.arn.clone()).collect())
  }

  async fn get_service(
    &self,
    cluster: &str,
    name: &str,
  ) -> anyhow::Result<Option<Service>> {
    let key = (cluster.to_string(), name.to_string());
    Ok(self.services.lock().unwrap().get(&key).cloned())
  }

  async fn create_service(&self, service: &Service) -> anyhow::Result<Service> {
    let mut service = service.clone();
    service.arn = format!("arn:mock:ecs:service/{}/{}", service.cluster, service.name);
    let key = (service.cluster.clone(), service.name.clone());
    self.services.lock().unwrap().insert(key, service.clone());
    if let Some(cluster) = self.clusters.lock().unwrap().get_mut(&service.cluster) {
      cluster.active_services_count += 1;
    }
    Ok(service)
  }

  async fn update_service(
    &self,
    service: &Service,
    _force_new_deployment: bool,
  ) -> anyhow::Result<Service> {
    let key = (service.cluster.clone(), service.name.clone());
    self.services.lock().unwrap().insert(key, service.clone());
    Ok(service.clone())
  }

  async fn delete_service(
    &self,
    cluster: &str,
    name: &str,
    _force: bool,
  ) -> anyhow::Result<()> {
    let key = (cluster.to_string(), name.to_string());
    self.services.lock().unwrap().remove(&key);
    if let Some(c) = self.clusters.lock().unwrap().get_mut(cluster) {
      c.active_services_count = c.active_services_count.saturating_sub(1);
    }
    Ok(())
  }

  async fn list_tasks(
    &self,
    _cluster: &str,
    family: &str,
  ) -> anyhow::Result<Vec<String>> {
    let tasks = self.tasks.lock().unwrap();
    Ok(
      tasks
        .keys()
        .filter(|arn| arn.contains(family))
        .cloned()
        .collect(),
    )
  }

  async fn describe_tasks(
    &self,
    _cluster: &str,
    task_arns: &[String],
  ) -> anyhow::Result<Vec<TaskStatus>> {
    let tasks = self.tasks.lock().unwrap();
    Ok(task_arns.iter().filter_map(|a| tasks.get(a).cloned()).collect())
  }

  async fn stop_task(&self, _cluster: &str, task_arn: &str) -> anyhow::Result<()> {
    if let Some(status) = self.tasks.lock().unwrap().get_mut(task_arn) {
      status.last_status = "STOPPED".to_string();
    }
    Ok(())
  }

  async fn run_task(
    &self,
    _cluster: &str,
    task_definition_arn: &str,
    count: i32,
    _options: &RunTaskOptions,
  ) -> anyhow::Result<Vec<String>> {
    let mut arns = Vec::with_capacity(count.max(0) as usize);
    let mut tasks = self.tasks.lock().unwrap();
    for _ in 0..count.max(0) {
      let arn = format!("arn:mock:ecs:task/{}-{}", task_definition_arn, self.next_id());
      tasks.insert(
        arn.clone(),
        TaskStatus { task_arn: arn.clone(), last_status: "RUNNING".to_string() },
      );
      arns.push(arn);
    }
    Ok(arns)
  }

  async fn tag_resource(&self, arn: &str, tags: &[Tag]) -> anyhow::Result<()> {
    let mut store = self.resource_tags.lock().unwrap();
    let set = store.entry(arn.to_string()).or_default();
    for tag in tags {
      set.insert(tag.key.clone(), tag.value.clone());
    }
    Ok(())
  }

  async fn list_tags(&self, arn: &str) -> anyhow::Result<Vec<Tag>> {
    let store = self.resource_tags.lock().unwrap();
    Ok(
      store
        .get(arn)
        .map(|set| set.iter().map(|(k, v)| Tag::new(k.clone(), v.clone())).collect())
        .unwrap_or_default(),
    )
  }
}

#[async_trait]
impl AccessControl for MockProvider {
  async fn get_role(&self, name: &str) -> anyhow::Result<Option<Role>> {
    Ok(self.roles.lock().unwrap().get(name).cloned())
  }

  async fn create_role(
    &self,
    name: &str,
    path: &str,
    _assume_role_policy: &str,
    tags: &[Tag],
  ) -> anyhow::Result<Role> {
    let role = Role {
      name: name.to_string(),
      path: path.to_string(),
      arn: format!("arn:mock:iam:role/{name}"),
      inline_policy: None,
      tags: tags_to_set(tags),
    };
    self.roles.lock().unwrap().insert(name.to_string(), role.clone());
    Ok(role)
  }

  async fn delete_role(&self, name: &str) -> anyhow::Result<()> {
    self.roles.lock().unwrap().remove(name);
    Ok(())
  }

  async fn put_role_policy(
    &self,
    role_name: &str,
    policy_name: &str,
    document: &PolicyDocument,
  ) -> anyhow::Result<()> {
    self
      .role_policies
      .lock()
      .unwrap()
      .insert((role_name.to_string(), policy_name.to_string()), document.clone());
    Ok(())
  }

  async fn get_role_policy(
    &self,
    role_name: &str,
    policy_name: &str,
  ) -> anyhow::Result<Option<String>> {
    let policies = self.role_policies.lock().unwrap();
    Ok(
      policies
        .get(&(role_name.to_string(), policy_name.to_string()))
        .map(|doc| doc.to_json())
        .transpose()?,
    )
  }

  async fn list_role_policies(&self, role_name: &str) -> anyhow::Result<Vec<String>> {
    let policies = self.role_policies.lock().unwrap();
    Ok(
      policies
        .keys()
        .filter(|(r, _)| r == role_name)
        .map(|(_, p)| p.clone())
        .collect(),
    )
  }

  async fn delete_role_policy(
    &self,
    role_name: &str,
    policy_name: &str,
  ) -> anyhow::Result<()> {
    self
      .role_policies
      .lock()
      .unwrap()
      .remove(&(role_name.to_string(), policy_name.to_string()));
    Ok(())
  }

  async fn tag_role(&self, role_name: &str, tags: &[Tag]) -> anyhow::Result<()> {
    if let Some(role) = self.roles.lock().unwrap().get_mut(role_name) {
      for tag in tags {
        role.tags.insert(tag.key.clone(), tag.value.clone());
      }
    }
    Ok(())
  }
}

#[async_trait]
impl SecretStore for MockProvider {
  async fn create_secret(
    &self,
    name: &str,
    payload: &str,
    tags: &[Tag],
  ) -> anyhow::Result<Secret> {
    let secret = Secret {
      name: name.to_string(),
      arn: format!("arn:mock:secretsmanager:secret/{name}"),
      version_id: uuid::Uuid::new_v4().to_string(),
      tags: tags_to_set(tags),
      payload: payload.to_string(),
    };
    self.secrets.lock().unwrap().insert(secret.arn.clone(), secret.clone());
    Ok(secret)
  }

  async fn get_secret_value(&self, id: &str) -> anyhow::Result<Option<String>> {
    Ok(self.secrets.lock().unwrap().get(id).map(|s| s.payload.clone()))
  }

  async fn put_secret_value(&self, id: &str, payload: &str) -> anyhow::Result<()> {
    if let Some(secret) = self.secrets.lock().unwrap().get_mut(id) {
      secret.payload = payload.to_string();
      secret.version_id = uuid::Uuid::new_v4().to_string();
    }
    Ok(())
  }

  async fn delete_secret(
    &self,
    id: &str,
    _recovery_window: RecoveryWindow,
  ) -> anyhow::Result<()> {
    self.secrets.lock().unwrap().remove(id);
    Ok(())
  }

  async fn update_secret_tags(&self, id: &str, tags: &[Tag]) -> anyhow::Result<()> {
    if let Some(secret) = self.secrets.lock().unwrap().get_mut(id) {
      secret.tags = tags_to_set(tags);
    }
    Ok(())
  }

  async fn list_secrets_with_filter(
    &self,
    name_prefix: &str,
  ) -> anyhow::Result<Vec<Secret>> {
    let secrets = self.secrets.lock().unwrap();
    Ok(
      secrets
        .values()
        .filter(|s| s.name.starts_with(name_prefix))
        .cloned()
        .collect(),
    )
  }

  async fn describe_secret(&self, id: &str) -> anyhow::Result<Option<Secret>> {
    Ok(self.secrets.lock().unwrap().get(id).cloned())
  }
}

#[async_trait]
impl Discovery for MockProvider {
  async fn get_service_discovery_service(
    &self,
    name: &str,
    namespace_id: &str,
  ) -> anyhow::Result<Option<ServiceDiscoveryService>> {
    let services = self.discovery_services.lock().unwrap();
    Ok(
      services
        .values()
        .find(|s| s.name == name && s.namespace_id == namespace_id)
        .cloned(),
    )
  }

  async fn create_service_discovery_service(
    &self,
    name: &str,
    namespace_id: &str,
    health_check_failure_threshold: i32,
  ) -> anyhow::Result<ServiceDiscoveryService> {
    let service = ServiceDiscoveryService {
      arn: format!("arn:mock:servicediscovery:service/{name}"),
      name: name.to_string(),
      namespace_id: namespace_id.to_string(),
      health_check_failure_threshold,
    };
    self
      .discovery_services
      .lock()
      .unwrap()
      .insert(service.arn.clone(), service.clone());
    Ok(service)
  }

  async fn delete_service_registry_with_retry(
    &self,
    arn: &str,
  ) -> oneshot::Receiver<anyhow::Result<()>> {
    let (tx, rx) = oneshot::channel();
    self.discovery_services.lock().unwrap().remove(arn);
    let _ = tx.send(Ok(()));
    rx
  }
}

#[async_trait]
impl LogGroups for MockProvider {
  async fn get_log_group(&self, name: &str) -> anyhow::Result<Option<LogGroup>> {
    Ok(self.log_groups.lock().unwrap().get(name).cloned())
  }

  async fn create_log_group(&self, name: &str) -> anyhow::Result<LogGroup> {
    let group = LogGroup {
      name: name.to_string(),
      arn: format!("arn:mock:logs:log-group:{name}"),
      retention_days: 0,
      tags: TagSet::new(),
    };
    self.log_groups.lock().unwrap().insert(name.to_string(), group.clone());
    Ok(group)
  }

  async fn put_retention_policy(
    &self,
    name: &str,
    retention_days: i32,
  ) -> anyhow::Result<()> {
    if let Some(group) = self.log_groups.lock().unwrap().get_mut(name) {
      group.retention_days = retention_days;
    }
    Ok(())
  }
}

#[async_trait]
impl TagSearch for MockProvider {
  async fn get_resources_with_tags(
    &self,
    _resource_types: &[&str],
    tag_filters: &[TagFilter],
  ) -> anyhow::Result<Vec<String>> {
    let store = self.resource_tags.lock().unwrap();
    Ok(
      store
        .iter()
        .filter(|(_, tags)| {
          tag_filters
            .iter()
            .all(|f| tags.get(&f.key).map(|v| v == &f.value).unwrap_or(false))
        })
        .map(|(arn, _)| arn.clone())
        .collect(),
    )
  }
}
