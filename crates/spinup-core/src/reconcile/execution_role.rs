//! Execution-role reconciler: idempotently ensure the default
//! execution role for a cluster exists with the correct inline policy and
//! tags.

use std::sync::OnceLock;

use spinup_capabilities::Capabilities;
use spinup_types::{
  error::OrchestrationError,
  org::OrgContext,
  policy::{Effect, PolicyDocument, Statement},
  role::{DEFAULT_INLINE_POLICY_NAME, Role},
  tag::{Tag, TagSet},
};
use std::collections::BTreeMap;

/// The assume-role trust document is identical for every role this
/// orchestrator creates, so it's computed once and cached process-wide.
fn assume_role_policy() -> &'static str {
  static POLICY: OnceLock<String> = OnceLock::new();
  POLICY.get_or_init(|| {
    let doc = PolicyDocument {
      version: "2012-10-17".to_string(),
      statement: vec![Statement {
        effect: Effect::Allow,
        action: vec!["sts:AssumeRole".to_string()],
        resource: None,
        principal: Some(BTreeMap::from([(
          "Service".to_string(),
          vec!["ecs-tasks.amazonaws.com".to_string()],
        )])),
        condition: None,
      }],
    };
    doc.to_json().expect("static assume-role policy always serialises")
  })
}

/// The default task-execution inline policy: image-pull and logging
/// actions unrestricted, secret/parameter access scoped to the cluster's
/// namespace, and an EFS-mount Allow gated on matching org/space
/// principal tags.
pub fn default_task_execution_policy(
  org: &OrgContext,
  cluster: &str,
) -> PolicyDocument {
  let pull_and_log = Statement {
    effect: Effect::Allow,
    action: vec![
      "ecr:GetAuthorizationToken".to_string(),
      "ecr:BatchCheckLayerAvailability".to_string(),
      "ecr:GetDownloadUrlForLayer".to_string(),
      "ecr:BatchGetImage".to_string(),
      "logs:CreateLogStream".to_string(),
      "logs:PutLogEvents".to_string(),
    ],
    resource: Some(vec!["*".to_string()]),
    principal: None,
    condition: None,
  };

  let secret_access = Statement {
    effect: Effect::Allow,
    action: vec![
      "secretsmanager:GetSecretValue".to_string(),
      "ssm:GetParameters".to_string(),
      "kms:Decrypt".to_string(),
    ],
    resource: Some(vec![
      org.default_kms_key_id.clone(),
      format!("{}{}/*", org.parameter_store_prefix, org.execution_role_path(cluster)),
      format!("{}*", org.secret_prefix(cluster)),
    ]),
    principal: None,
    condition: None,
  };

  let efs_mount = Statement {
    effect: Effect::Allow,
    action: vec![
      "elasticfilesystem:ClientMount".to_string(),
      "elasticfilesystem:ClientWrite".to_string(),
    ],
    resource: Some(vec!["*".to_string()]),
    principal: None,
    condition: Some(BTreeMap::from([
      (
        "Bool".to_string(),
        BTreeMap::from([(
          "elasticfilesystem:AccessedViaMountTarget".to_string(),
          vec!["true".to_string()],
        )]),
      ),
      (
        "StringEqualsIgnoreCase".to_string(),
        BTreeMap::from([
          (
            "aws:ResourceTag/spinup:org".to_string(),
            vec!["${aws:PrincipalTag/spinup:org}".to_string()],
          ),
          (
            "aws:ResourceTag/spinup:spaceid".to_string(),
            vec!["${aws:PrincipalTag/spinup:spaceid}".to_string()],
          ),
        ]),
      ),
    ])),
  };

  PolicyDocument {
    version: "2012-10-17".to_string(),
    statement: vec![pull_and_log, secret_access, efs_mount],
  }
}

/// Idempotently ensures the role exists and returns its ARN. `tags` is the already
/// normalised tag set to apply.
pub async fn reconcile(
  caps: &Capabilities,
  org: &OrgContext,
  cluster: &str,
  role_name: &str,
  tags: &TagSet,
) -> Result<String, OrchestrationError> {
  let role = match caps
    .access_control
    .get_role(role_name)
    .await
    .map_err(spinup_types::error::internal_from_anyhow)?
  {
    Some(role) => role,
    None => create_role(caps, role_name, tags).await?,
  };

  let desired = default_task_execution_policy(org, cluster);
  let needs_write = match caps
    .access_control
    .get_role_policy(role_name, DEFAULT_INLINE_POLICY_NAME)
    .await
    .map_err(spinup_types::error::internal_from_anyhow)?
  {
    None => true,
    Some(actual) => PolicyDocument::needs_update(&desired, &actual),
  };

  if needs_write {
    caps
      .access_control
      .put_role_policy(role_name, DEFAULT_INLINE_POLICY_NAME, &desired)
      .await
      .map_err(spinup_types::error::internal_from_anyhow)?;
  }

  let tag_vec: Vec<Tag> =
    tags.iter().map(|(k, v)| Tag::new(k.clone(), v.clone())).collect();
  caps
    .access_control
    .tag_role(role_name, &tag_vec)
    .await
    .map_err(spinup_types::error::internal_from_anyhow)?;

  Ok(role.arn)
}

/// New roles are always created at the default IAM path; namespacing by
/// org/cluster happens in the resource ARNs of the inline policy, not here.
async fn create_role(
  caps: &Capabilities,
  role_name: &str,
  tags: &TagSet,
) -> Result<Role, OrchestrationError> {
  let tag_vec: Vec<Tag> =
    tags.iter().map(|(k, v)| Tag::new(k.clone(), v.clone())).collect();
  caps
    .access_control
    .create_role(role_name, "/", assume_role_policy(), &tag_vec)
    .await
    .map_err(spinup_types::error::internal_from_anyhow)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn assume_role_policy_is_cached_across_calls() {
    let a = assume_role_policy();
    let b = assume_role_policy();
    assert_eq!(a.as_ptr(), b.as_ptr());
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

  #[test]
  fn default_policy_has_three_statements() {
    let doc = default_task_execution_policy(&org(), "demo-cluster");
    assert_eq!(doc.statement.len(), 3);
  }
}
