use serde::{Deserialize, Serialize};

use crate::tag::TagSet;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Secret {
  /// Basename only; the full naming convention is
  /// `<prefix>/<org>/<space>/<logical-name>`.
  pub name: String,
  pub arn: String,
  pub version_id: String,
  pub tags: TagSet,
  pub payload: String,
}

/// Extracts the resource-path portion of a secret ARN, i.e. everything
/// after the `secret/` resource-type marker, so prefix comparisons operate
/// on `<prefix>/<org>/<space>/<name>` rather than the full `arn:...` string.
pub fn resource_path(arn: &str) -> &str {
  arn.rsplit_once("secret/").map(|(_, rest)| rest).unwrap_or(arn)
}

/// Splits a secret ARN's resource path on the canonical prefix, returning
/// the basename with any existing path prefix stripped so re-creation
/// under a new prefix doesn't double-nest.
pub fn strip_known_prefix(arn: &str) -> &str {
  resource_path(arn).rsplit('/').next().unwrap_or(arn)
}

pub fn is_under_prefix(arn: &str, prefix: &str) -> bool {
  resource_path(arn).starts_with(prefix)
}
