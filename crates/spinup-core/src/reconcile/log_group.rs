//! Log-group reconciler: ensure the cluster's log group exists, pin
//! retention to the org default, and hand back the descriptor every
//! container definition in the family gets.

use spinup_capabilities::Capabilities;
use spinup_types::{
  error::OrchestrationError, log_group::LogConfiguration, org::OrgContext,
};

pub async fn reconcile(
  caps: &Capabilities,
  org: &OrgContext,
  cluster: &str,
  family: &str,
) -> Result<LogConfiguration, OrchestrationError> {
  match caps
    .log_groups
    .get_log_group(cluster)
    .await
    .map_err(spinup_types::error::internal_from_anyhow)?
  {
    Some(_) => {}
    None => {
      // Create is idempotent: a Conflict from the provider is swallowed.
      match caps.log_groups.create_log_group(cluster).await {
        Ok(_) => {}
        Err(err) => {
          let classified = spinup_types::error::internal_from_anyhow(err);
          if !matches!(classified, OrchestrationError::Conflict(_)) {
            return Err(classified);
          }
        }
      }
    }
  }

  // Retention is always re-asserted, whether the group was just created or
  // already existed, so drift from an out-of-band change self-heals.
  caps
    .log_groups
    .put_retention_policy(cluster, org.default_log_retention_days)
    .await
    .map_err(spinup_types::error::internal_from_anyhow)?;

  Ok(LogConfiguration::awslogs(cluster, family, &org.region))
}
