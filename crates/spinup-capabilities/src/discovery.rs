use async_trait::async_trait;
use tokio::sync::oneshot;

#[derive(Debug, Clone)]
pub struct ServiceDiscoveryService {
  pub arn: String,
  pub name: String,
  pub namespace_id: String,
  pub health_check_failure_threshold: i32,
}

/// The service-discovery capability, consumed by the service-registry
/// binder and by the service-delete cleanup path.
#[async_trait]
pub trait Discovery: Send + Sync {
  async fn get_service_discovery_service(
    &self,
    name: &str,
    namespace_id: &str,
  ) -> anyhow::Result<Option<ServiceDiscoveryService>>;

  async fn create_service_discovery_service(
    &self,
    name: &str,
    namespace_id: &str,
    health_check_failure_threshold: i32,
  ) -> anyhow::Result<ServiceDiscoveryService>;

  /// Deletes a registry entry, retrying provider-side `ResourceInUse`
  /// until the backing service has fully detached or the caller's
  /// cancellation token fires. The outcome arrives on the returned
  /// channel rather than blocking the caller, matching the retry
  /// template shared with the cluster-delete loop.
  async fn delete_service_registry_with_retry(
    &self,
    arn: &str,
  ) -> oneshot::Receiver<anyhow::Result<()>>;
}
