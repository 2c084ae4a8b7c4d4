//! Credential reconciler: governs per-container repository-credential
//! secrets during an update, per the decision table in the design notes.
//! `A` = active ARN, `I` = input ARN, `N` = input new-credential payload.

use std::collections::HashMap;

use spinup_capabilities::{Capabilities, secret_store::RecoveryWindow};
use spinup_types::{
  error::OrchestrationError,
  org::OrgContext,
  secret,
  tag::{Tag, TagSet},
  task_definition::ContainerCredentialInput,
};

/// One container's reconciliation inputs: its name, the currently-bound
/// ARN (`A`), and the caller's input (`I`/`N`).
pub struct ContainerCredentialState<'a> {
  pub container_name: &'a str,
  pub active_arn: Option<String>,
  pub input: &'a ContainerCredentialInput,
}

/// The outcome for one container: the ARN to bind (`None` means public
/// image), the ARNs, if any, this container's reconciliation marked for
/// deletion, and whether `bound_arn` names a secret freshly created by
/// this call (as opposed to an existing one that was merely updated in
/// place or passed through unchanged) — callers need this distinction to
/// know which ARNs their own rollback should own.
#[derive(Debug, Default)]
pub struct ContainerCredentialOutcome {
  pub bound_arn: Option<String>,
  pub deleted_arns: Vec<String>,
  pub created: bool,
}

/// Reconciles credentials across every container and returns one outcome
/// per container name, in input order. Deletions are issued only after
/// every create/update across all containers has completed.
pub async fn reconcile(
  caps: &Capabilities,
  org: &OrgContext,
  cluster: &str,
  task_def_tags: &TagSet,
  request_tags: &[Tag],
  containers: &[ContainerCredentialState<'_>],
) -> Result<HashMap<String, ContainerCredentialOutcome>, OrchestrationError> {
  let prefix = org.secret_prefix(cluster);
  let secret_tags = merge_tags(task_def_tags, request_tags);

  let mut outcomes = HashMap::new();
  let mut pending_deletes: Vec<String> = Vec::new();

  for c in containers {
    let outcome = reconcile_one(caps, &prefix, &secret_tags, c).await?;
    pending_deletes.extend(outcome.deleted_arns.clone());
    outcomes.insert(c.container_name.to_string(), outcome);
  }

  for arn in pending_deletes {
    caps
      .secret_store
      .delete_secret(&arn, RecoveryWindow::IMMEDIATE)
      .await
      .map_err(spinup_types::error::internal_from_anyhow)?;
  }

  Ok(outcomes)
}

fn merge_tags(task_def_tags: &TagSet, request_tags: &[Tag]) -> Vec<Tag> {
  let mut merged: TagSet = task_def_tags.clone();
  for t in request_tags {
    merged.insert(t.key.clone(), t.value.clone());
  }
  merged.into_iter().map(|(k, v)| Tag::new(k, v)).collect()
}

async fn reconcile_one(
  caps: &Capabilities,
  prefix: &str,
  secret_tags: &[Tag],
  c: &ContainerCredentialState<'_>,
) -> Result<ContainerCredentialOutcome, OrchestrationError> {
  let a = c.active_arn.as_deref();
  let i = c.input.repository_credentials_arn.as_deref();
  let n = c.input.new_credential.as_ref();

  match (a, i, n) {
    (Some(a), _, Some(new)) => {
      // ✓_✓ and ✓✗✓: update in place at A(c), ignoring I(c).
      caps
        .secret_store
        .put_secret_value(a, &new.secret_string)
        .await
        .map_err(spinup_types::error::internal_from_anyhow)?;
      Ok(ContainerCredentialOutcome {
        bound_arn: Some(a.to_string()),
        deleted_arns: vec![],
        created: false,
      })
    }
    (Some(a), Some(_), None) => {
      // ✓✓✗: A(c) is the source of truth; input ARN is overridden.
      Ok(ContainerCredentialOutcome {
        bound_arn: Some(a.to_string()),
        deleted_arns: vec![],
        created: false,
      })
    }
    (Some(a), None, None) => {
      // ✓✗✗: mark for deletion, container becomes public.
      Ok(ContainerCredentialOutcome {
        bound_arn: None,
        deleted_arns: vec![a.to_string()],
        created: false,
      })
    }
    (None, Some(i), maybe_new) => {
      reconcile_input_arn(caps, prefix, secret_tags, i, maybe_new).await
    }
    (None, None, Some(new)) => {
      // ✗✗✓: create a new secret under the canonical prefix.
      let name = format!("{prefix}{}", new.name);
      let created = caps
        .secret_store
        .create_secret(&name, &new.secret_string, secret_tags)
        .await
        .map_err(spinup_types::error::internal_from_anyhow)?;
      Ok(ContainerCredentialOutcome {
        bound_arn: Some(created.arn),
        deleted_arns: vec![],
        created: true,
      })
    }
    (None, None, None) => {
      // ✗✗✗: public image, nothing to bind.
      Ok(ContainerCredentialOutcome::default())
    }
  }
}

/// Handles the `(None, Some(i), _)` arm, including the legacy-prefix
/// migration rule: an input ARN outside the canonical prefix is migrated
/// to a freshly created secret under the prefix, and the old ARN is
/// scheduled for deletion.
async fn reconcile_input_arn(
  caps: &Capabilities,
  prefix: &str,
  secret_tags: &[Tag],
  input_arn: &str,
  new: Option<&spinup_types::task_definition::NewCredentialPayload>,
) -> Result<ContainerCredentialOutcome, OrchestrationError> {
  if !secret::is_under_prefix(input_arn, prefix) {
    let basename = secret::strip_known_prefix(input_arn);
    let payload = match new {
      Some(new) => new.secret_string.clone(),
      None => caps
        .secret_store
        .get_secret_value(input_arn)
        .await
        .map_err(spinup_types::error::internal_from_anyhow)?
        .ok_or_else(|| {
          OrchestrationError::not_found(format!(
            "legacy secret {input_arn} has no retrievable value"
          ))
        })?,
    };
    let name = format!("{prefix}{basename}");
    let created = caps
      .secret_store
      .create_secret(&name, &payload, secret_tags)
      .await
      .map_err(spinup_types::error::internal_from_anyhow)?;
    return Ok(ContainerCredentialOutcome {
      bound_arn: Some(created.arn),
      deleted_arns: vec![input_arn.to_string()],
      created: true,
    });
  }

  match new {
    Some(new) => {
      // ✗✓✓: update in place at I(c).
      caps
        .secret_store
        .put_secret_value(input_arn, &new.secret_string)
        .await
        .map_err(spinup_types::error::internal_from_anyhow)?;
      Ok(ContainerCredentialOutcome {
        bound_arn: Some(input_arn.to_string()),
        deleted_arns: vec![],
        created: false,
      })
    }
    None => {
      // ✗✓✗: keep I(c) unchanged.
      Ok(ContainerCredentialOutcome {
        bound_arn: Some(input_arn.to_string()),
        deleted_arns: vec![],
        created: false,
      })
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use spinup_capabilities::mock::MockProvider;
  use spinup_types::task_definition::NewCredentialPayload;
  use std::sync::Arc;

  fn caps(mock: Arc<MockProvider>) -> Capabilities {
    Capabilities {
      container_platform: mock.clone(),
      access_control: mock.clone(),
      secret_store: mock.clone(),
      discovery: mock.clone(),
      log_groups: mock.clone(),
      tag_search: mock,
    }
  }

  fn org() -> OrgContext {
    OrgContext {
      organisation: "yale".to_string(),
      default_network: spinup_types::org::NetworkConfiguration {
        subnets: vec![],
        security_groups: vec![],
        assign_public_ip: false,
      },
      default_log_retention_days: 30,
      default_launch_type: spinup_types::org::LaunchType::Fargate,
      default_capacity_provider_strategy: vec![],
      default_kms_key_id: "arn:mock:kms:key/default".to_string(),
      request_uniqueness_token: "tok".to_string(),
      region: "us-east-1".to_string(),
      account_id: "123456789012".to_string(),
      secret_store_prefix: "spinup".to_string(),
      parameter_store_prefix: "/spinup".to_string(),
    }
  }

  #[tokio::test]
  async fn no_inputs_means_public() {
    let mock = Arc::new(MockProvider::new());
    let caps = caps(mock);
    let org = org();
    let input = ContainerCredentialInput::default();
    let state = ContainerCredentialState {
      container_name: "app",
      active_arn: None,
      input: &input,
    };
    let out = reconcile(&caps, &org, "demo", &TagSet::new(), &[], &[state])
      .await
      .unwrap();
    assert!(out["app"].bound_arn.is_none());
  }

  #[tokio::test]
  async fn active_only_is_marked_for_deletion() {
    let mock = Arc::new(MockProvider::new());
    let caps = caps(mock);
    let org = org();
    let input = ContainerCredentialInput::default();
    let state = ContainerCredentialState {
      container_name: "app",
      active_arn: Some("arn:mock:secretsmanager:secret/spinup/yale/demo/app".to_string()),
      input: &input,
    };
    let out = reconcile(&caps, &org, "demo", &TagSet::new(), &[], &[state])
      .await
      .unwrap();
    assert!(out["app"].bound_arn.is_none());
    assert_eq!(out["app"].deleted_arns.len(), 1);
  }

  #[tokio::test]
  async fn new_only_creates_under_prefix() {
    let mock = Arc::new(MockProvider::new());
    let caps = caps(mock);
    let org = org();
    let input = ContainerCredentialInput {
      repository_credentials_arn: None,
      new_credential: Some(NewCredentialPayload {
        name: "app".to_string(),
        secret_string: "hunter2".to_string(),
      }),
    };
    let state =
      ContainerCredentialState { container_name: "app", active_arn: None, input: &input };
    let out = reconcile(&caps, &org, "demo", &TagSet::new(), &[], &[state])
      .await
      .unwrap();
    let arn = out["app"].bound_arn.as_ref().unwrap();
    assert!(arn.contains("spinup/yale/demo/app"));
    assert!(out["app"].created);
  }

  #[tokio::test]
  async fn active_plus_new_updates_in_place_and_is_not_created() {
    let mock = Arc::new(MockProvider::new());
    let caps = caps(mock.clone());
    let org = org();
    let active_arn = "arn:mock:secretsmanager:secret/spinup/yale/demo/app".to_string();
    mock.secrets.lock().unwrap().insert(
      active_arn.clone(),
      spinup_types::secret::Secret {
        name: "app".to_string(),
        arn: active_arn.clone(),
        version_id: "v1".to_string(),
        tags: TagSet::new(),
        payload: "old".to_string(),
      },
    );
    let input = ContainerCredentialInput {
      repository_credentials_arn: None,
      new_credential: Some(NewCredentialPayload {
        name: "app".to_string(),
        secret_string: "new".to_string(),
      }),
    };
    let state = ContainerCredentialState {
      container_name: "app",
      active_arn: Some(active_arn.clone()),
      input: &input,
    };
    let out = reconcile(&caps, &org, "demo", &TagSet::new(), &[], &[state])
      .await
      .unwrap();
    assert_eq!(out["app"].bound_arn.as_deref(), Some(active_arn.as_str()));
    assert!(!out["app"].created);
  }

  #[tokio::test]
  async fn legacy_input_arn_migration_is_created_and_old_arn_deleted() {
    let mock = Arc::new(MockProvider::new());
    let caps = caps(mock.clone());
    let org = org();
    let legacy_arn = "arn:mock:secretsmanager:secret/legacy/app-cred".to_string();
    mock.secrets.lock().unwrap().insert(
      legacy_arn.clone(),
      spinup_types::secret::Secret {
        name: "app-cred".to_string(),
        arn: legacy_arn.clone(),
        version_id: "v1".to_string(),
        tags: TagSet::new(),
        payload: "legacy-value".to_string(),
      },
    );
    let input = ContainerCredentialInput {
      repository_credentials_arn: Some(legacy_arn.clone()),
      new_credential: None,
    };
    let state =
      ContainerCredentialState { container_name: "app", active_arn: None, input: &input };
    let out = reconcile(&caps, &org, "demo", &TagSet::new(), &[], &[state])
      .await
      .unwrap();
    let arn = out["app"].bound_arn.as_ref().unwrap();
    assert!(arn.contains("spinup/yale/demo/"));
    assert!(out["app"].created);
    assert!(!mock.secrets.lock().unwrap().contains_key(&legacy_arn));
  }
}
