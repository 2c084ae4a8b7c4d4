use serde::{Deserialize, Serialize};

use crate::{org::{CapacityProviderStrategyItem, NetworkConfiguration}, tag::TagSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceStatus {
  Active,
  Draining,
  Inactive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropagateTags {
  Service,
  TaskDefinition,
  None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceRegistryBinding {
  pub registry_arn: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
  pub name: String,
  pub arn: String,
  pub cluster: String,
  pub task_definition_arn: String,
  pub desired_count: i32,
  pub network_configuration: Option<NetworkConfiguration>,
  pub capacity_provider_strategy: Option<Vec<CapacityProviderStrategyItem>>,
  pub registries: Vec<ServiceRegistryBinding>,
  pub tags: TagSet,
  pub status: ServiceStatus,
  pub propagate_tags: PropagateTags,
  pub client_token: Option<String>,
}

/// Input for creating a service-discovery registration. Absence
/// means "create the service without discovery registration".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceDiscoveryCreateInput {
  pub name: String,
  pub namespace_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceCreateInput {
  pub name: String,
  pub cluster: crate::cluster::ClusterCreateInput,
  pub task_definition: crate::task_definition::TaskDefinitionInput,
  pub credentials:
    std::collections::HashMap<String, crate::task_definition::ContainerCredentialInput>,
  pub desired_count: i32,
  pub network_configuration: Option<NetworkConfiguration>,
  pub capacity_provider_strategy: Option<Vec<CapacityProviderStrategyItem>>,
  pub registry_arn: Option<String>,
  pub registry_create: Option<ServiceDiscoveryCreateInput>,
  pub tags: Vec<crate::tag::Tag>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceUpdateInput {
  pub name: String,
  pub cluster: String,
  /// Present when the caller wants a new task-definition revision built.
  pub task_definition: Option<crate::task_definition::TaskDefinitionInput>,
  pub credentials:
    std::collections::HashMap<String, crate::task_definition::ContainerCredentialInput>,
  pub desired_count: Option<i32>,
  pub network_configuration: Option<NetworkConfiguration>,
  /// `Some(vec![])` is normalised to `None` to retain the service's
  /// original launch type.
  pub capacity_provider_strategy: Option<Vec<CapacityProviderStrategyItem>>,
  pub force_new_deployment: bool,
  pub tags: Vec<crate::tag::Tag>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceDeleteInput {
  pub name: String,
  pub cluster: String,
  pub recursive: bool,
}
