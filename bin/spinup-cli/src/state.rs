//! Wires the six capability traits to the in-memory `MockProvider`. Real
//! provider-SDK adapters live outside this repo; the CLI only ever
//! exercises the orchestration engine against the mock, same as
//! `spinup-core`'s own integration tests.

use std::sync::Arc;

use spinup_capabilities::{Capabilities, mock::MockProvider};

pub fn build() -> Capabilities {
  let mock = Arc::new(MockProvider::new());
  Capabilities {
    container_platform: mock.clone(),
    access_control: mock.clone(),
    secret_store: mock.clone(),
    discovery: mock.clone(),
    log_groups: mock.clone(),
    tag_search: mock,
  }
}
