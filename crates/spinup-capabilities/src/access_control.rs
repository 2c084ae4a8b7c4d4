use async_trait::async_trait;
use spinup_types::{policy::PolicyDocument, role::Role, tag::Tag};

/// The access-control capability: IAM-style role and inline-policy
/// lifecycle, consumed exclusively by the execution-role reconciler.
#[async_trait]
pub trait AccessControl: Send + Sync {
  async fn get_role(&self, name: &str) -> anyhow::Result<Option<Role>>;
  async fn create_role(
    &self,
    name: &str,
    path: &str,
    assume_role_policy: &str,
    tags: &[Tag],
  ) -> anyhow::Result<Role>;
  async fn delete_role(&self, name: &str) -> anyhow::Result<()>;

  async fn put_role_policy(
    &self,
    role_name: &str,
    policy_name: &str,
    document: &PolicyDocument,
  ) -> anyhow::Result<()>;
  async fn get_role_policy(
    &self,
    role_name: &str,
    policy_name: &str,
  ) -> anyhow::Result<Option<String>>;
  async fn list_role_policies(
    &self,
    role_name: &str,
  ) -> anyhow::Result<Vec<String>>;
  async fn delete_role_policy(
    &self,
    role_name: &str,
    policy_name: &str,
  ) -> anyhow::Result<()>;

  async fn tag_role(&self, role_name: &str, tags: &[Tag]) -> anyhow::Result<()>;
}
