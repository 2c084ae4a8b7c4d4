use async_trait::async_trait;
use spinup_types::{secret::Secret, tag::Tag};

/// Deletion grace period, in days. `0` requests immediate (non-recoverable)
/// deletion; the provider otherwise requires a value in `[7, 30]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryWindow(pub i32);

impl RecoveryWindow {
  pub const IMMEDIATE: RecoveryWindow = RecoveryWindow(0);

  pub fn is_valid(self) -> bool {
    self.0 == 0 || (7..=30).contains(&self.0)
  }
}

/// The secret-store capability, consumed by the credential reconciler
/// and by task-definition-family teardown.
#[async_trait]
pub trait SecretStore: Send + Sync {
  async fn create_secret(
    &self,
    name: &str,
    payload: &str,
    tags: &[Tag],
  ) -> anyhow::Result<Secret>;
  async fn get_secret_value(&self, id: &str) -> anyhow::Result<Option<String>>;
  async fn put_secret_value(&self, id: &str, payload: &str) -> anyhow::Result<()>;
  async fn delete_secret(
    &self,
    id: &str,
    recovery_window: RecoveryWindow,
  ) -> anyhow::Result<()>;
  async fn update_secret_tags(&self, id: &str, tags: &[Tag]) -> anyhow::Result<()>;
  async fn list_secrets_with_filter(
    &self,
    name_prefix: &str,
  ) -> anyhow::Result<Vec<Secret>>;
  async fn describe_secret(&self, id: &str) -> anyhow::Result<Option<Secret>>;
}
