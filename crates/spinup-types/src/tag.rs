use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A single key/value resource tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
  pub key: String,
  pub value: String,
}

impl Tag {
  pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
    Tag { key: key.into(), value: value.into() }
  }
}

/// An ordered key -> value tag set. Order is preserved so downstream
/// serialisation (and the tests asserting against it) are deterministic.
pub type TagSet = IndexMap<String, String>;

pub fn tag_set_from_pairs(
  pairs: impl IntoIterator<Item = (String, String)>,
) -> TagSet {
  pairs.into_iter().collect()
}

pub fn tags_to_vec(tags: &TagSet) -> Vec<Tag> {
  tags
    .iter()
    .map(|(k, v)| Tag::new(k.clone(), v.clone()))
    .collect()
}

/// The reserved tag keys the orchestrator manages itself, plus their
/// vendor-prefixed legacy synonyms. Centralised here so the normaliser,
/// the propagator, and the role-tag builder all agree on what
/// "reserved" means.
pub const TAG_ORG: &str = "spinup:org";
pub const TAG_SPACE_ID: &str = "spinup:spaceid";
pub const TAG_TYPE: &str = "spinup:type";
pub const TAG_FLAVOR: &str = "spinup:flavor";
pub const TAG_CATEGORY: &str = "spinup:category";

pub const LEGACY_TAG_ORG: &str = "yale:org";
pub const LEGACY_TAG_SPACE_ID: &str = "yale:spaceid";
pub const LEGACY_TAG_TYPE: &str = "yale:type";
pub const LEGACY_TAG_FLAVOR: &str = "yale:flavor";
pub const LEGACY_TAG_CATEGORY: &str = "yale:category";

/// The full reserved set, API-controlled: any of these supplied by a
/// caller is either validated (org) or silently dropped (the rest).
pub const RESERVED_KEYS: &[&str] = &[
  TAG_ORG,
  TAG_SPACE_ID,
  TAG_TYPE,
  TAG_FLAVOR,
  TAG_CATEGORY,
  LEGACY_TAG_ORG,
  LEGACY_TAG_SPACE_ID,
  LEGACY_TAG_TYPE,
  LEGACY_TAG_FLAVOR,
  LEGACY_TAG_CATEGORY,
];

/// Keys that alias `spinup:org` for the purposes of the org-lock check.
pub const ORG_KEY_SYNONYMS: &[&str] = &[TAG_ORG, LEGACY_TAG_ORG];

pub fn is_reserved_key(key: &str) -> bool {
  RESERVED_KEYS.contains(&key)
}

pub fn is_org_key(key: &str) -> bool {
  ORG_KEY_SYNONYMS.contains(&key)
}
