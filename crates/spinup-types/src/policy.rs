//! In-memory model of an access-control policy document.
//!
//! Equality is always structural, never textual: the provider echoes policy
//! documents back URL-encoded, and `Principal`/`Condition` are unordered
//! maps, so two documents that are "the same policy" rarely round-trip to
//! byte-identical JSON. `PolicyDocument::equals` parses and compares the
//! parsed tree; it never compares strings.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
  Allow,
  Deny,
}

/// One policy statement. Field order on the wire is always
/// `(Effect, Action, Resource?, Principal?, Condition?)`; optional fields
/// are omitted entirely when empty rather than serialised as `null` or `[]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statement {
  #[serde(rename = "Effect")]
  pub effect: Effect,
  #[serde(rename = "Action")]
  pub action: Vec<String>,
  #[serde(rename = "Resource", skip_serializing_if = "Option::is_none")]
  pub resource: Option<Vec<String>>,
  #[serde(rename = "Principal", skip_serializing_if = "Option::is_none")]
  pub principal: Option<BTreeMap<String, Vec<String>>>,
  #[serde(rename = "Condition", skip_serializing_if = "Option::is_none")]
  pub condition: Option<BTreeMap<String, BTreeMap<String, Vec<String>>>>,
}

impl PartialEq for Statement {
  fn eq(&self, other: &Self) -> bool {
    // BTreeMap already orders keys, and we sort each value list before
    // comparing so differently-ordered-but-equal lists still match.
    self.effect == other.effect
      && sorted(&self.action) == sorted(&other.action)
      && self.resource.as_ref().map(|r| sorted(r))
        == other.resource.as_ref().map(|r| sorted(r))
      && principal_eq(&self.principal, &other.principal)
      && condition_eq(&self.condition, &other.condition)
  }
}
impl Eq for Statement {}

fn sorted(list: &[String]) -> Vec<String> {
  let mut v = list.to_vec();
  v.sort();
  v
}

fn principal_eq(
  a: &Option<BTreeMap<String, Vec<String>>>,
  b: &Option<BTreeMap<String, Vec<String>>>,
) -> bool {
  match (a, b) {
    (None, None) => true,
    (Some(a), Some(b)) => {
      a.len() == b.len()
        && a.iter().all(|(k, v)| {
          b.get(k).map(|bv| sorted(v) == sorted(bv)).unwrap_or(false)
        })
    }
    _ => false,
  }
}

fn condition_eq(
  a: &Option<BTreeMap<String, BTreeMap<String, Vec<String>>>>,
  b: &Option<BTreeMap<String, BTreeMap<String, Vec<String>>>>,
) -> bool {
  match (a, b) {
    (None, None) => true,
    (Some(a), Some(b)) => {
      a.len() == b.len()
        && a.iter().all(|(op, keys)| {
          b.get(op)
            .map(|bkeys| principal_eq(&Some(keys.clone()), &Some(bkeys.clone())))
            .unwrap_or(false)
        })
    }
    _ => false,
  }
}

/// A `(Version, Statement-list)` policy document. Statement *order*
/// matters for equality — the provider preserves it, so we don't sort it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDocument {
  #[serde(rename = "Version")]
  pub version: String,
  #[serde(rename = "Statement")]
  pub statement: Vec<Statement>,
}

impl PolicyDocument {
  /// Parses a policy document that may be URL-encoded (the shape the
  /// provider returns it in) or plain JSON.
  pub fn parse(raw: &str) -> anyhow::Result<Self> {
    let decoded = urlencoding::decode(raw)
      .map(|cow| cow.into_owned())
      .unwrap_or_else(|_| raw.to_string());
    // `decode` is a no-op (and harmless) on already-plain JSON, since `{`,
    // `"` etc. aren't percent-escape sequences.
    serde_json::from_str(&decoded)
      .or_else(|_| serde_json::from_str(raw))
      .map_err(|e| anyhow::anyhow!("failed to parse policy document: {e}"))
  }

  pub fn to_json(&self) -> anyhow::Result<String> {
    serde_json::to_string(self)
      .map_err(|e| anyhow::anyhow!("failed to serialise policy document: {e}"))
  }

  /// `needsUpdate(desired, actual) = !deepEqual(desired, parse(decode(actual)))`
  pub fn needs_update(desired: &PolicyDocument, actual_raw: &str) -> bool {
    match PolicyDocument::parse(actual_raw) {
      Ok(actual) => desired != &actual,
      // an unparseable actual policy is always drift.
      Err(_) => true,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn statement(
    actions: &[&str],
    resources: Option<&[&str]>,
  ) -> Statement {
    Statement {
      effect: Effect::Allow,
      action: actions.iter().map(|s| s.to_string()).collect(),
      resource: resources
        .map(|rs| rs.iter().map(|s| s.to_string()).collect()),
      principal: None,
      condition: None,
    }
  }

  #[test]
  fn equality_is_structural_not_textual() {
    let a = PolicyDocument {
      version: "2012-10-17".to_string(),
      statement: vec![statement(
        &["ecr:GetAuthorizationToken", "logs:CreateLogStream"],
        Some(&["*"]),
      )],
    };
    // action order differs, resource list differs in formatting — still equal.
    let b_json = r#"{"Version":"2012-10-17","Statement":[{"Effect":"Allow","Action":["logs:CreateLogStream","ecr:GetAuthorizationToken"],"Resource":["*"]}]}"#;
    assert!(!PolicyDocument::needs_update(&a, b_json));
  }

  #[test]
  fn url_encoded_actual_is_decoded_before_compare() {
    let a = PolicyDocument {
      version: "2012-10-17".to_string(),
      statement: vec![statement(&["ecr:GetAuthorizationToken"], Some(&["*"]))],
    };
    let encoded = urlencoding::encode(
      r#"{"Version":"2012-10-17","Statement":[{"Effect":"Allow","Action":["ecr:GetAuthorizationToken"],"Resource":["*"]}]}"#,
    )
    .into_owned();
    assert!(!PolicyDocument::needs_update(&a, &encoded));
  }

  #[test]
  fn drift_is_detected() {
    let a = PolicyDocument {
      version: "2012-10-17".to_string(),
      statement: vec![statement(&["ecr:GetAuthorizationToken"], Some(&["*"]))],
    };
    let b_json = r#"{"Version":"2012-10-17","Statement":[{"Effect":"Allow","Action":["s3:GetObject"],"Resource":["*"]}]}"#;
    assert!(PolicyDocument::needs_update(&a, b_json));
  }

  /// Equality must be transitive, since the reconciler relies on it to
  /// short-circuit repeated drift checks.
  #[test]
  fn equality_is_transitive() {
    let a = PolicyDocument {
      version: "2012-10-17".to_string(),
      statement: vec![statement(&["a:One", "a:Two"], None)],
    };
    let b = PolicyDocument {
      version: "2012-10-17".to_string(),
      statement: vec![statement(&["a:Two", "a:One"], None)],
    };
    let c = PolicyDocument {
      version: "2012-10-17".to_string(),
      statement: vec![statement(&["a:One", "a:Two"], None)],
    };
    assert_eq!(a, b);
    assert_eq!(b, c);
    assert_eq!(a, c);
  }

  #[test]
  fn statement_order_matters() {
    let a = PolicyDocument {
      version: "2012-10-17".to_string(),
      statement: vec![
        statement(&["a:One"], None),
        statement(&["a:Two"], None),
      ],
    };
    let b = PolicyDocument {
      version: "2012-10-17".to_string(),
      statement: vec![
        statement(&["a:Two"], None),
        statement(&["a:One"], None),
      ],
    };
    assert_ne!(a, b);
  }
}
