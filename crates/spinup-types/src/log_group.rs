use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::tag::TagSet;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogGroup {
  /// Named after the cluster; never carries a `:*` ARN suffix.
  pub name: String,
  pub arn: String,
  pub retention_days: i32,
  pub tags: TagSet,
}

/// The `logConfiguration` descriptor the log-group reconciler hands back
/// for every container definition in the family.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfiguration {
  pub driver: String,
  pub options: HashMap<String, String>,
}

impl LogConfiguration {
  pub fn awslogs(cluster: &str, family: &str, region: &str) -> Self {
    let mut options = HashMap::new();
    options.insert("group".to_string(), cluster.to_string());
    options.insert("stream-prefix".to_string(), family.to_string());
    options.insert("region".to_string(), region.to_string());
    options.insert("create-group".to_string(), "true".to_string());
    LogConfiguration { driver: "awslogs".to_string(), options }
  }
}
