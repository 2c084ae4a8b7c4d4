use serde::{Deserialize, Serialize};

/// A weighted capacity-provider strategy entry: which compute pool to draw
/// nodes from, and in what proportion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityProviderStrategyItem {
  pub capacity_provider: String,
  #[serde(default)]
  pub base: i32,
  #[serde(default)]
  pub weight: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LaunchType {
  Fargate,
  Ec2,
}

/// The default network configuration applied to services/tasks that don't
/// supply one of their own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfiguration {
  pub subnets: Vec<String>,
  pub security_groups: Vec<String>,
  pub assign_public_ip: bool,
}

/// The launch-time defaults a bare `RunTask` call is filled in with: managed
/// tags on, `FARGATE` whenever no capacity-provider strategy is in play, and
/// the org's default network configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunTaskOptions {
  pub launch_type: Option<LaunchType>,
  pub capacity_provider_strategy: Option<Vec<CapacityProviderStrategyItem>>,
  pub network_configuration: NetworkConfiguration,
  pub enable_ecs_managed_tags: bool,
}

/// Process-wide configuration, constructed once at startup and treated as
/// immutable for the rest of the process lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrgContext {
  pub organisation: String,
  pub default_network: NetworkConfiguration,
  pub default_log_retention_days: i32,
  pub default_launch_type: LaunchType,
  pub default_capacity_provider_strategy: Vec<CapacityProviderStrategyItem>,
  pub default_kms_key_id: String,
  /// Injected as `ClientToken` on every idempotent create call within one
  /// request; distinct per incoming request, not per-process.
  pub request_uniqueness_token: String,
  /// Account-scoped identifiers needed to build ARNs / policy resources.
  pub region: String,
  pub account_id: String,
  pub secret_store_prefix: String,
  pub parameter_store_prefix: String,
}

impl OrgContext {
  pub fn default_execution_role_name(&self, cluster: &str) -> String {
    format!("{cluster}-ecsTaskExecution")
  }

  /// Namespace prefix used to scope the execution role's secret/parameter
  /// resources to this cluster; not the role's own IAM path.
  pub fn execution_role_path(&self, cluster: &str) -> String {
    format!("{}/{}", self.organisation, cluster)
  }

  pub fn secret_prefix(&self, cluster: &str) -> String {
    format!(
      "{}/{}/{}/",
      self.secret_store_prefix, self.organisation, cluster
    )
  }
}
