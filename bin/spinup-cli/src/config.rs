//! Process-wide [`OrgContext`] loading: `dotenv` first, then environment
//! variables via `envy`, with individual fields overridable by CLI flags.

use anyhow::Context;
use clap::Args;
use serde::Deserialize;
use spinup_types::org::{LaunchType, NetworkConfiguration, OrgContext};

/// Shape read from the environment via `envy` (prefix `SPINUP_`). Every
/// field has a sensible local default so the CLI runs out of the box
/// against the in-memory capability doubles without any `.env` file.
#[derive(Debug, Deserialize)]
struct EnvConfig {
  #[serde(default = "default_organisation")]
  organisation: String,
  #[serde(default)]
  default_subnets: String,
  #[serde(default)]
  default_security_groups: String,
  #[serde(default = "default_retention")]
  default_log_retention_days: i32,
  #[serde(default = "default_kms_key_id")]
  default_kms_key_id: String,
  #[serde(default = "default_region")]
  region: String,
  #[serde(default = "default_account_id")]
  account_id: String,
  #[serde(default = "default_secret_prefix")]
  secret_store_prefix: String,
  #[serde(default = "default_parameter_prefix")]
  parameter_store_prefix: String,
}

fn default_organisation() -> String {
  "acme".to_string()
}
fn default_retention() -> i32 {
  365
}
fn default_kms_key_id() -> String {
  "arn:aws:kms:us-east-1:000000000000:key/default".to_string()
}
fn default_region() -> String {
  "us-east-1".to_string()
}
fn default_account_id() -> String {
  "000000000000".to_string()
}
fn default_secret_prefix() -> String {
  "spinup".to_string()
}
fn default_parameter_prefix() -> String {
  "/spinup".to_string()
}

/// CLI-level overrides for the handful of `OrgContext` fields an operator
/// is likely to want to flip per-invocation rather than per-environment.
#[derive(Debug, Args)]
pub struct ConfigArgs {
  /// Overrides `SPINUP_ORGANISATION`.
  #[arg(long, global = true)]
  pub organisation: Option<String>,
}

/// Loads `.env` (if present), layers environment variables over the
/// defaults, then applies any CLI overrides, and materialises the
/// immutable `OrgContext` the pipelines run against.
pub fn load(overrides: &ConfigArgs) -> anyhow::Result<OrgContext> {
  // Absence of a `.env` file is not an error — environment variables and
  // CLI flags are enough on their own.
  dotenvy::dotenv().ok();

  let env: EnvConfig =
    envy::prefixed("SPINUP_").from_env().context("failed to read SPINUP_* environment")?;

  let organisation = overrides.organisation.clone().unwrap_or(env.organisation);

  Ok(OrgContext {
    organisation,
    default_network: NetworkConfiguration {
      subnets: split_csv(&env.default_subnets),
      security_groups: split_csv(&env.default_security_groups),
      assign_public_ip: false,
    },
    default_log_retention_days: env.default_log_retention_days,
    default_launch_type: LaunchType::Fargate,
    default_capacity_provider_strategy: vec![],
    default_kms_key_id: env.default_kms_key_id,
    request_uniqueness_token: uuid::Uuid::new_v4().to_string(),
    region: env.region,
    account_id: env.account_id,
    secret_store_prefix: env.secret_store_prefix,
    parameter_store_prefix: env.parameter_store_prefix,
  })
}

fn split_csv(raw: &str) -> Vec<String> {
  raw.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect()
}
