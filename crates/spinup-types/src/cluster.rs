use serde::{Deserialize, Serialize};

use crate::{org::CapacityProviderStrategyItem, tag::TagSet};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cluster {
  pub name: String,
  pub arn: String,
  pub capacity_providers: Vec<String>,
  pub default_capacity_provider_strategy: Vec<CapacityProviderStrategyItem>,
  pub active_task_count: i32,
  pub pending_task_count: i32,
  pub running_task_count: i32,
  pub registered_container_instances_count: i32,
  pub active_services_count: i32,
  pub tags: TagSet,
}

impl Cluster {
  /// A cluster may only be deleted when it has no registered instances
  /// and no active services.
  pub fn is_deletable(&self) -> bool {
    self.registered_container_instances_count == 0
      && self.active_services_count == 0
  }
}

/// Input for creating a cluster. Anything left `None` is defaulted
/// by the cluster handler.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterCreateInput {
  pub name: String,
  pub capacity_providers: Option<Vec<String>>,
  pub default_capacity_provider_strategy:
    Option<Vec<CapacityProviderStrategyItem>>,
  pub tags: Vec<crate::tag::Tag>,
}
