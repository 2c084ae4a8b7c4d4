//! The orchestration engine: tag normalisation, per-resource reconcilers,
//! the rollback stack, and the public service/task-definition pipelines.
//!
//! Nothing here imports a concrete provider SDK — every collaborator is
//! consumed through the trait objects in [`spinup_capabilities`], injected
//! as a [`spinup_capabilities::Capabilities`] bundle into each pipeline
//! call. Tests (and `spinup-cli`'s offline mode) substitute
//! `spinup_capabilities::mock::MockProvider` for the real thing.

mod arn;
pub mod build;
pub mod cluster;
pub mod pipelines;
pub mod propagate;
pub mod reconcile;
pub mod rollback;
pub mod tags;
