//! Logging init: a single `tracing-subscriber` `fmt` layer, level from
//! `RUST_LOG` via `EnvFilter`, switchable to JSON. `spinup-core` never
//! touches a subscriber itself — it only emits `tracing` events.

use anyhow::Context;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init(json: bool) -> anyhow::Result<()> {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let registry = tracing_subscriber::Registry::default().with(filter);

  if json {
    registry.with(tracing_subscriber::fmt::layer().json()).try_init()
  } else {
    registry.with(tracing_subscriber::fmt::layer().with_target(false)).try_init()
  }
  .context("failed to init logger")
}
