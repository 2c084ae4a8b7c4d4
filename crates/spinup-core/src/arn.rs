//! Small ARN-parsing helpers shared across pipelines.

/// Extracts the task-definition family name from either a task-definition
/// ARN (`.../task-definition/<family>:<revision>`) or a bare family name
/// (returned unchanged).
pub(crate) fn extract_family(arn_or_family: &str) -> String {
  arn_or_family
    .rsplit('/')
    .next()
    .unwrap_or(arn_or_family)
    .split(':')
    .next()
    .unwrap_or(arn_or_family)
    .to_string()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn strips_path_and_revision_suffix() {
    assert_eq!(
      extract_family("arn:mock:ecs:task-definition/worker:3"),
      "worker"
    );
  }

  #[test]
  fn bare_family_name_passes_through() {
    assert_eq!(extract_family("worker"), "worker");
  }
}
