use async_trait::async_trait;

/// One `key = value` filter term in a tag search.
#[derive(Debug, Clone)]
pub struct TagFilter {
  pub key: String,
  pub value: String,
}

impl TagFilter {
  pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
    TagFilter { key: key.into(), value: value.into() }
  }
}

/// The tag-search capability: the only way the task-definition
/// pipeline's `List` operation discovers families without iterating every
/// cluster.
#[async_trait]
pub trait TagSearch: Send + Sync {
  async fn get_resources_with_tags(
    &self,
    resource_types: &[&str],
    tag_filters: &[TagFilter],
  ) -> anyhow::Result<Vec<String>>;
}
