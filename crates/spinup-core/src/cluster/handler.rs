//! Cluster handler: look up or create, with default capacity-provider
//! strategy when the caller supplies none.

use spinup_capabilities::Capabilities;
use spinup_types::{
  cluster::{Cluster, ClusterCreateInput},
  error::OrchestrationError,
  org::CapacityProviderStrategyItem,
};

fn default_capacity_provider_strategy() -> Vec<CapacityProviderStrategyItem> {
  vec![
    CapacityProviderStrategyItem {
      capacity_provider: "FARGATE".to_string(),
      base: 1,
      weight: 0,
    },
    CapacityProviderStrategyItem {
      capacity_provider: "FARGATE_SPOT".to_string(),
      base: 0,
      weight: 1,
    },
  ]
}

/// Fetches the named cluster if it exists, otherwise creates it from
/// `input`, applying the default Fargate/Fargate-Spot split when the
/// caller didn't supply a strategy of its own.
pub async fn get_or_create(
  caps: &Capabilities,
  input: &ClusterCreateInput,
) -> Result<(Cluster, bool), OrchestrationError> {
  if let Some(existing) = caps
    .container_platform
    .get_cluster(&input.name)
    .await
    .map_err(spinup_types::error::internal_from_anyhow)?
  {
    return Ok((existing, false));
  }

  let mut input = input.clone();
  if input.capacity_providers.is_none() {
    input.capacity_providers =
      Some(vec!["FARGATE".to_string(), "FARGATE_SPOT".to_string()]);
  }
  if input.default_capacity_provider_strategy.is_none() {
    input.default_capacity_provider_strategy =
      Some(default_capacity_provider_strategy());
  }

  let created = caps
    .container_platform
    .create_cluster(&input)
    .await
    .map_err(spinup_types::error::internal_from_anyhow)?;
  Ok((created, true))
}
