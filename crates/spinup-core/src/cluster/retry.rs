//! Cluster-delete retry loop: polls until the cluster is empty, then
//! deletes, with exponential backoff. Respects cancellation and a bounded
//! deadline. The registry-delete rollback path reuses this same template
//! with its own 60 s deadline.

use std::time::Duration;

use spinup_capabilities::Capabilities;
use spinup_types::error::OrchestrationError;
use tokio_util::sync::CancellationToken;

pub const CLUSTER_DELETE_DEADLINE: Duration = Duration::from_secs(120);
const INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// An error surfaced by a polling attempt that should be retried rather
/// than treated as fatal — provider update-in-progress or
/// still-has-container-instances responses.
pub fn is_retryable_cluster_error(err: &OrchestrationError) -> bool {
  err.is_retryable()
}

/// Polls the cluster every `backoff` (doubling each attempt, uncapped)
/// until `registeredContainerInstancesCount == 0`, then deletes it.
/// Returns `Ok(true)` if the cluster was deleted, `Ok(false)` if the
/// deadline or cancellation fired first, and `Err` on a non-retryable
/// provider error.
pub async fn delete_when_empty(
  caps: &Capabilities,
  cluster_name: &str,
  cancel: &CancellationToken,
  deadline: Duration,
) -> Result<bool, OrchestrationError> {
  let bounded = cancel.child_token();
  let guard = bounded.clone();
  let sleeper = tokio::spawn(async move {
    tokio::time::sleep(deadline).await;
    guard.cancel();
  });

  let mut backoff = INITIAL_BACKOFF;
  let result = loop {
    if bounded.is_cancelled() {
      break Ok(false);
    }

    let cluster = match caps.container_platform.get_cluster(cluster_name).await {
      Ok(Some(c)) => c,
      Ok(None) => break Ok(true),
      Err(err) => break Err(spinup_types::error::internal_from_anyhow(err)),
    };

    if cluster.is_deletable() {
      match caps.container_platform.delete_cluster(cluster_name).await {
        Ok(()) => break Ok(true),
        Err(err) => {
          let classified = spinup_types::error::internal_from_anyhow(err);
          if is_retryable_cluster_error(&classified) {
            // fall through to backoff-and-retry below
          } else {
            break Err(classified);
          }
        }
      }
    }

    tokio::select! {
      _ = tokio::time::sleep(backoff) => {}
      _ = bounded.cancelled() => break Ok(false),
    }
    backoff *= 2;
  };

  sleeper.abort();
  result
}

#[cfg(test)]
mod tests {
  use super::*;
  use spinup_capabilities::mock::MockProvider;
  use spinup_types::{cluster::ClusterCreateInput, tag::TagSet};
  use std::sync::Arc;

  fn caps(mock: Arc<MockProvider>) -> Capabilities {
    Capabilities {
      container_platform: mock.clone(),
      access_control: mock.clone(),
      secret_store: mock.clone(),
      discovery: mock.clone(),
      log_groups: mock.clone(),
      tag_search: mock,
    }
  }

  #[tokio::test]
  async fn deletes_immediately_when_already_empty() {
    let mock = Arc::new(MockProvider::new());
    mock.clusters.lock().unwrap().insert(
      "demo".to_string(),
      spinup_types::cluster::Cluster {
        name: "demo".to_string(),
        arn: "arn:mock:ecs:cluster/demo".to_string(),
        capacity_providers: vec![],
        default_capacity_provider_strategy: vec![],
        active_task_count: 0,
        pending_task_count: 0,
        running_task_count: 0,
        registered_container_instances_count: 0,
        active_services_count: 0,
        tags: TagSet::new(),
      },
    );
    let caps = caps(mock);
    let cancel = CancellationToken::new();
    let deleted = delete_when_empty(&caps, "demo", &cancel, Duration::from_secs(5))
      .await
      .unwrap();
    assert!(deleted);
  }

  #[tokio::test]
  async fn missing_cluster_counts_as_deleted() {
    let mock = Arc::new(MockProvider::new());
    let caps = caps(mock);
    let cancel = CancellationToken::new();
    let _ = ClusterCreateInput::default();
    let deleted = delete_when_empty(&caps, "ghost", &cancel, Duration::from_secs(5))
      .await
      .unwrap();
    assert!(deleted);
  }
}
