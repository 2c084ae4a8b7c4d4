//! Tag propagator: fans a desired tag set out across every resource
//! a successful pipeline touched.

use spinup_capabilities::Capabilities;
use spinup_types::{
  error::OrchestrationError,
  tag::{self, Tag, TagSet},
};

/// One resource this propagation step must tag, plus which shape applies.
pub enum PropagateTarget<'a> {
  /// Cluster or log group: tags carry `Name = <cluster>`, category omitted.
  SharedNamed { arn: &'a str, name: &'a str },
  /// Service, task-definition, or secret: full tag-set passthrough.
  Specific { arn: &'a str },
  /// Execution role: `Name = <role>`, category dropped, any caller tag
  /// literally named `Name` (any case) is dropped in favour of the
  /// canonical one.
  Role { arn: &'a str, role_name: &'a str },
}

fn shared_named_tags(tags: &TagSet, name: &str) -> Vec<Tag> {
  tags
    .iter()
    .filter(|(k, _)| {
      k.as_str() != tag::TAG_CATEGORY && !k.eq_ignore_ascii_case("name")
    })
    .map(|(k, v)| Tag::new(k.clone(), v.clone()))
    .chain(std::iter::once(Tag::new("Name", name)))
    .collect()
}

fn role_tags(tags: &TagSet, role_name: &str) -> Vec<Tag> {
  tags
    .iter()
    .filter(|(k, _)| {
      k.as_str() != tag::TAG_CATEGORY && !k.eq_ignore_ascii_case("name")
    })
    .map(|(k, v)| Tag::new(k.clone(), v.clone()))
    .chain(std::iter::once(Tag::new("Name", role_name)))
    .collect()
}

fn specific_tags(tags: &TagSet) -> Vec<Tag> {
  tags.iter().map(|(k, v)| Tag::new(k.clone(), v.clone())).collect()
}

/// Applies `tags` to every target, stopping at the first failure ("all
/// tag applications are individually fallible; the first failure
/// surfaces").
pub async fn propagate(
  caps: &Capabilities,
  tags: &TagSet,
  targets: &[PropagateTarget<'_>],
) -> Result<(), OrchestrationError> {
  for target in targets {
    match target {
      PropagateTarget::SharedNamed { arn, name } => {
        let tag_vec = shared_named_tags(tags, name);
        caps
          .container_platform
          .tag_resource(arn, &tag_vec)
          .await
          .map_err(spinup_types::error::internal_from_anyhow)?;
      }
      PropagateTarget::Specific { arn } => {
        let tag_vec = specific_tags(tags);
        caps
          .container_platform
          .tag_resource(arn, &tag_vec)
          .await
          .map_err(spinup_types::error::internal_from_anyhow)?;
      }
      PropagateTarget::Role { arn, role_name } => {
        let tag_vec = role_tags(tags, role_name);
        caps
          .access_control
          .tag_role(arn, &tag_vec)
          .await
          .map_err(spinup_types::error::internal_from_anyhow)?;
      }
    }
  }
  Ok(())
}

/// Harvests secret ARNs from every container's repository-credentials
/// reference, for the caller to add as `Specific` propagation targets.
pub fn secret_arns_from_containers(
  containers: &[spinup_types::task_definition::ContainerDefinition],
) -> Vec<String> {
  containers.iter().filter_map(|c| c.repository_credentials.clone()).collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use spinup_types::tag::tag_set_from_pairs;

  #[test]
  fn shared_named_drops_category_and_sets_name() {
    let tags = tag_set_from_pairs([
      (tag::TAG_CATEGORY.to_string(), "x".to_string()),
      ("team".to_string(), "infra".to_string()),
    ]);
    let out = shared_named_tags(&tags, "demo-cluster");
    assert!(!out.iter().any(|t| t.key == tag::TAG_CATEGORY));
    assert!(out.iter().any(|t| t.key == "Name" && t.value == "demo-cluster"));
    assert!(out.iter().any(|t| t.key == "team"));
  }

  #[test]
  fn shared_named_drops_caller_name_in_favour_of_canonical() {
    let tags = tag_set_from_pairs([("name".to_string(), "whatever".to_string())]);
    let out = shared_named_tags(&tags, "demo-cluster");
    let names: Vec<_> = out.iter().filter(|t| t.key.eq_ignore_ascii_case("name")).collect();
    assert_eq!(names.len(), 1);
    assert_eq!(names[0].value, "demo-cluster");
  }

  #[test]
  fn role_tags_drop_caller_name_in_favour_of_canonical() {
    let tags = tag_set_from_pairs([("Name".to_string(), "whatever".to_string())]);
    let out = role_tags(&tags, "demo-ecsTaskExecution");
    let names: Vec<_> = out.iter().filter(|t| t.key.eq_ignore_ascii_case("name")).collect();
    assert_eq!(names.len(), 1);
    assert_eq!(names[0].value, "demo-ecsTaskExecution");
  }
}
