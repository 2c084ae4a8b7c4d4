pub mod service;
pub mod task_definition;

use std::io::Read;

use anyhow::Context;
use clap::Subcommand;

#[derive(Debug, Subcommand)]
pub enum Command {
  /// Create, update, or delete a long-running service.
  #[command(subcommand)]
  Service(service::ServiceCommand),
  /// Create, update, delete, run, list, or show a task-definition family.
  #[command(subcommand, name = "task-definition")]
  TaskDefinition(task_definition::TaskDefinitionCommand),
}

/// Reads a JSON request body from `--file <path>`, or from stdin when the
/// path is `-` or omitted entirely.
pub fn read_json<T: serde::de::DeserializeOwned>(
  file: &Option<String>,
) -> anyhow::Result<T> {
  let raw = match file.as_deref() {
    None | Some("-") => {
      let mut buf = String::new();
      std::io::stdin()
        .read_to_string(&mut buf)
        .context("failed to read request JSON from stdin")?;
      buf
    }
    Some(path) => std::fs::read_to_string(path)
      .with_context(|| format!("failed to read request file {path}"))?,
  };
  serde_json::from_str(&raw).context("failed to parse request JSON")
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}
