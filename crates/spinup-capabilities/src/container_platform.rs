use async_trait::async_trait;
use spinup_types::{
  cluster::{Cluster, ClusterCreateInput},
  org::RunTaskOptions,
  service::Service,
  tag::Tag,
  task_definition::TaskDefinition,
};

/// A running or recently-stopped task, as reported by `ListTasks`/`DescribeTasks`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskStatus {
  pub task_arn: String,
  pub last_status: String,
}

/// The container-platform capability : cluster, task-definition, service,
/// and task lifecycle calls. Implementations talk to the real provider SDK;
/// the core only ever sees this trait.
#[async_trait]
pub trait ContainerPlatform: Send + Sync {
  async fn get_cluster(&self, name: &str) -> anyhow::Result<Option<Cluster>>;
  async fn create_cluster(&self, input: &ClusterCreateInput) -> anyhow::Result<Cluster>;
  async fn delete_cluster(&self, name: &str) -> anyhow::Result<()>;

  /// Returns the revision plus its tags, fetched with `includeTags = true`.
  async fn get_task_definition(
    &self,
    arn: &str,
  ) -> anyhow::Result<Option<(TaskDefinition, Vec<Tag>)>>;
  async fn create_task_definition(
    &self,
    def: &TaskDefinition,
  ) -> anyhow::Result<TaskDefinition>;
  async fn delete_task_definition(&self, arn: &str) -> anyhow::Result<()>;
  async fn list_task_definition_revisions(
    &self,
    family: &str,
  ) -> anyhow::Result<Vec<String>>;

  async fn get_service(
    &self,
    cluster: &str,
    name: &str,
  ) -> anyhow::Result<Option<Service>>;
  async fn create_service(&self, service: &Service) -> anyhow::Result<Service>;
  /// `force_new_deployment` is true when the caller asked for it explicitly
  /// or supplied a non-empty capacity-provider strategy; either forces the
  /// provider to roll the service even if nothing else about it changed.
  async fn update_service(
    &self,
    service: &Service,
    force_new_deployment: bool,
  ) -> anyhow::Result<Service>;
  async fn delete_service(
    &self,
    cluster: &str,
    name: &str,
    force: bool,
  ) -> anyhow::Result<()>;

  async fn list_tasks(
    &self,
    cluster: &str,
    family: &str,
  ) -> anyhow::Result<Vec<String>>;
  async fn describe_tasks(
    &self,
    cluster: &str,
    task_arns: &[String],
  ) -> anyhow::Result<Vec<TaskStatus>>;
  async fn stop_task(&self, cluster: &str, task_arn: &str) -> anyhow::Result<()>;
  async fn run_task(
    &self,
    cluster: &str,
    task_definition_arn: &str,
    count: i32,
    options: &RunTaskOptions,
  ) -> anyhow::Result<Vec<String>>;

  async fn tag_resource(&self, arn: &str, tags: &[Tag]) -> anyhow::Result<()>;
  async fn list_tags(&self, arn: &str) -> anyhow::Result<Vec<Tag>>;
}
