use async_trait::async_trait;
use spinup_types::log_group::LogGroup;

/// The logging capability, consumed by the log-group reconciler.
#[async_trait]
pub trait LogGroups: Send + Sync {
  async fn get_log_group(&self, name: &str) -> anyhow::Result<Option<LogGroup>>;
  async fn create_log_group(&self, name: &str) -> anyhow::Result<LogGroup>;
  async fn put_retention_policy(
    &self,
    name: &str,
    retention_days: i32,
  ) -> anyhow::Result<()>;
}
