use serde::{Deserialize, Serialize};

use crate::{policy::PolicyDocument, tag::TagSet};

pub const DEFAULT_INLINE_POLICY_NAME: &str = "ECSTaskAccessPolicy";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
  pub name: String,
  pub path: String,
  pub arn: String,
  pub inline_policy: Option<PolicyDocument>,
  pub tags: TagSet,
}
