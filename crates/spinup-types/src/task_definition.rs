use serde::{Deserialize, Serialize};

use crate::{log_group::LogConfiguration, tag::TagSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Compatibility {
  Fargate,
  Ec2,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetworkMode {
  Awsvpc,
  Bridge,
  Host,
  None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortMapping {
  pub container_port: u16,
  pub host_port: Option<u16>,
  pub protocol: Option<String>,
}

/// A container whose image is non-public must carry a
/// `repository_credentials` reference resolvable in the deployer's secret
/// namespace. This is enforced by the credential reconciler, not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerDefinition {
  pub name: String,
  pub image: String,
  #[serde(default)]
  pub port_mappings: Vec<PortMapping>,
  pub log_configuration: Option<LogConfiguration>,
  pub repository_credentials: Option<String>,
}

/// An immutable task-definition revision. A new revision never mutates
/// an existing one; the "current" revision of a family is the
/// highest-numbered ACTIVE one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDefinition {
  pub family: String,
  pub revision: i32,
  pub containers: Vec<ContainerDefinition>,
  pub cpu: String,
  pub memory: String,
  pub network_mode: NetworkMode,
  pub requires_compatibilities: Vec<Compatibility>,
  pub execution_role_arn: String,
  pub task_role_arn: String,
  pub tags: TagSet,
  pub arn: String,
}

impl TaskDefinition {
  pub fn family_revision(&self) -> String {
    format!("{}:{}", self.family, self.revision)
  }
}

/// Caller-supplied input for building a new revision. Defaults not
/// supplied here are filled in by the builder; `network_mode` and
/// `requires_compatibilities` are always overridden regardless of what's
/// supplied, to prevent drift.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskDefinitionInput {
  pub family: String,
  pub containers: Vec<ContainerDefinition>,
  pub cpu: String,
  pub memory: String,
  #[serde(default)]
  pub tags: Vec<crate::tag::Tag>,
}

/// Per-container credential inputs to the reconciler; see its decision
/// table. `new_credential` corresponds to `N(c)`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContainerCredentialInput {
  /// `I(c)`: an existing ARN the caller wants bound.
  pub repository_credentials_arn: Option<String>,
  /// `N(c)`: a new credential payload/name to create or rotate in.
  pub new_credential: Option<NewCredentialPayload>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCredentialPayload {
  pub name: String,
  pub secret_string: String,
}
