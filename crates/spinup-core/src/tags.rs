//! Tag normalisation — the first step of every pipeline.

use spinup_types::{
  error::OrchestrationError,
  tag::{self, Tag, TagSet},
};

/// The four reserved tags every normalised resource carries, plus the
/// caller-supplied extras that survive normalisation.
pub struct NormaliseParams<'a> {
  pub org: &'a str,
  pub space: &'a str,
  pub resource_type: &'a str,
  pub flavor: &'a str,
}

/// `clean(org, space, type, flavor, input) -> tagset | Invalid`.
///
/// Reserved keys other than `spinup:org` (and its legacy synonym) are
/// always dropped rather than validated — they're API-controlled, so a
/// caller-supplied value can never be authoritative.
pub fn normalise(
  params: NormaliseParams<'_>,
  input: &[Tag],
) -> Result<TagSet, OrchestrationError> {
  let mut out = TagSet::new();
  out.insert(tag::TAG_ORG.to_string(), params.org.to_string());
  out.insert(tag::TAG_SPACE_ID.to_string(), params.space.to_string());
  out.insert(tag::TAG_TYPE.to_string(), params.resource_type.to_string());
  out.insert(tag::TAG_FLAVOR.to_string(), params.flavor.to_string());

  for t in input {
    if tag::is_org_key(&t.key) {
      if t.value != params.org {
        return Err(OrchestrationError::bad_request(format!(
          "tag {} must equal the organisation ({}), got {}",
          t.key, params.org, t.value
        )));
      }
      continue;
    }
    if tag::is_reserved_key(&t.key) {
      continue;
    }
    out.insert(t.key.clone(), t.value.clone());
  }

  Ok(out)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn params<'a>() -> NormaliseParams<'a> {
    NormaliseParams { org: "yale", space: "prod-cluster", resource_type: "container", flavor: "service" }
  }

  #[test]
  fn injects_the_four_reserved_tags() {
    let out = normalise(params(), &[]).unwrap();
    assert_eq!(out.get(tag::TAG_ORG).unwrap(), "yale");
    assert_eq!(out.get(tag::TAG_SPACE_ID).unwrap(), "prod-cluster");
    assert_eq!(out.get(tag::TAG_TYPE).unwrap(), "container");
    assert_eq!(out.get(tag::TAG_FLAVOR).unwrap(), "service");
  }

  #[test]
  fn matching_org_tag_is_accepted_idempotently() {
    let out = normalise(params(), &[Tag::new(tag::TAG_ORG, "yale")]).unwrap();
    assert_eq!(out.get(tag::TAG_ORG).unwrap(), "yale");
  }

  #[test]
  fn mismatched_org_tag_is_rejected() {
    let err = normalise(params(), &[Tag::new(tag::TAG_ORG, "other")]).unwrap_err();
    assert!(matches!(err, OrchestrationError::BadRequest(_)));
  }

  #[test]
  fn legacy_org_synonym_is_also_validated() {
    let err =
      normalise(params(), &[Tag::new(tag::LEGACY_TAG_ORG, "other")]).unwrap_err();
    assert!(matches!(err, OrchestrationError::BadRequest(_)));
  }

  #[test]
  fn other_reserved_keys_are_silently_dropped() {
    let out =
      normalise(params(), &[Tag::new(tag::TAG_CATEGORY, "whatever")]).unwrap();
    assert!(out.get(tag::TAG_CATEGORY).is_none());
  }

  #[test]
  fn caller_extras_survive() {
    let out = normalise(params(), &[Tag::new("team", "infra")]).unwrap();
    assert_eq!(out.get("team").unwrap(), "infra");
  }
}
