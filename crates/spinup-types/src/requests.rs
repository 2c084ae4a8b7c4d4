//! Public request/response shapes for the task-definition pipeline.
//! Service pipeline requests live alongside the `Service` entity in
//! [`crate::service`].

use serde::{Deserialize, Serialize};

use crate::{
  cluster::ClusterCreateInput,
  org::CapacityProviderStrategyItem,
  task_definition::{ContainerCredentialInput, TaskDefinitionInput},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTaskDefinitionRequest {
  pub cluster: ClusterCreateInput,
  pub task_definition: TaskDefinitionInput,
  #[serde(default)]
  pub credentials: std::collections::HashMap<String, ContainerCredentialInput>,
  #[serde(default)]
  pub tags: Vec<crate::tag::Tag>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTaskDefinitionRequest {
  pub cluster: String,
  pub family: String,
  pub task_definition: TaskDefinitionInput,
  #[serde(default)]
  pub credentials: std::collections::HashMap<String, ContainerCredentialInput>,
  #[serde(default)]
  pub tags: Vec<crate::tag::Tag>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteTaskDefinitionRequest {
  pub cluster: String,
  pub family: String,
  /// When false and tasks of this family are running, the delete is
  /// rejected with BadRequest rather than stopping them.
  #[serde(default)]
  pub force: bool,
  /// When true, the cluster and its default execution role are also torn
  /// down once the family has no remaining revisions.
  #[serde(default)]
  pub recursive: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunTaskDefinitionRequest {
  pub cluster: String,
  pub family: String,
  pub count: i32,
  /// Overrides the default FARGATE launch type; `Some(vec![])` behaves the
  /// same as `None` (default to FARGATE).
  #[serde(default)]
  pub capacity_provider_strategy: Option<Vec<CapacityProviderStrategyItem>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunTaskDefinitionResponse {
  pub task_arns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListTaskDefinitionsRequest {
  /// Restricts the listing to a single cluster's `spinup:spaceid`; omitted
  /// means "every family this org owns".
  pub cluster: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListTaskDefinitionsResponse {
  pub families: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShowTaskDefinitionRequest {
  pub cluster: String,
  pub family: String,
}
