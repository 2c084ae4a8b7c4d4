//! Capability interfaces the orchestration core is injected with.
//! Nothing in here talks to a real cloud provider — these are
//! narrow trait boundaries only; concrete provider-SDK adapters live
//! outside this crate (or, for tests and local runs, the `mock` feature's
//! in-memory doubles live right here).

pub mod access_control;
pub mod container_platform;
pub mod discovery;
pub mod error;
pub mod logging;
pub mod secret_store;
pub mod tag_search;

#[cfg(feature = "mock")]
pub mod mock;

use std::sync::Arc;

pub use access_control::AccessControl;
pub use container_platform::ContainerPlatform;
pub use discovery::Discovery;
pub use logging::LogGroups;
pub use secret_store::SecretStore;
pub use tag_search::TagSearch;

/// The full set of collaborators a pipeline needs. Cloning is cheap — it's
/// six `Arc` clones — so a `Capabilities` can be stamped into every
/// per-request pipeline instance without synchronisation.
#[derive(Clone)]
pub struct Capabilities {
  pub container_platform: Arc<dyn ContainerPlatform>,
  pub access_control: Arc<dyn AccessControl>,
  pub secret_store: Arc<dyn SecretStore>,
  pub discovery: Arc<dyn Discovery>,
  pub log_groups: Arc<dyn LogGroups>,
  pub tag_search: Arc<dyn TagSearch>,
}
