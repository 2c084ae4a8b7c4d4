//! Service-registry binder: attach an existing discovery service or
//! create a new one; absence of both inputs means "no discovery binding".

use spinup_capabilities::Capabilities;
use spinup_types::{error::OrchestrationError, service::ServiceDiscoveryCreateInput};

/// Every discovery service this orchestrator creates uses a custom
/// health-check with a failure threshold of 1; this is a fixed design
/// decision, not a caller-configurable input, so it's hardcoded here
/// rather than threaded through `ServiceDiscoveryCreateInput`.
const HEALTH_CHECK_FAILURE_THRESHOLD: i32 = 1;

/// Returns the bound registry ARN, if any, and whether this call created a
/// brand-new discovery service (as opposed to reusing a caller-supplied
/// one) — callers need the latter to know whether to register a
/// compensating rollback action.
pub async fn bind(
  caps: &Capabilities,
  registry_arn: Option<&str>,
  create_input: Option<&ServiceDiscoveryCreateInput>,
) -> Result<(Option<String>, bool), OrchestrationError> {
  if let Some(arn) = registry_arn {
    // Reuse as-is; the binder's contract with the discovery capability is
    // lookup-by-name, not by ARN, so a caller-supplied ARN is trusted
    // directly rather than re-confirmed against a fresh lookup.
    return Ok((Some(arn.to_string()), false));
  }

  if let Some(create) = create_input {
    let created = caps
      .discovery
      .create_service_discovery_service(
        &create.name,
        &create.namespace_id,
        HEALTH_CHECK_FAILURE_THRESHOLD,
      )
      .await
      .map_err(spinup_types::error::internal_from_anyhow)?;
    return Ok((Some(created.arn), true));
  }

  Ok((None, false))
}
