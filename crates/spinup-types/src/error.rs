use thiserror::Error;

/// The five (plus `Internal`) error kinds every public pipeline operation
/// collapses to. Collaborator errors are mapped into this taxonomy by
/// `spinup_capabilities::error::classify_error`; anything raised inside
/// `spinup-core` itself that isn't a collaborator error is `Internal`.
#[derive(Error, Debug, Clone)]
pub enum OrchestrationError {
  #[error("bad request | {0}")]
  BadRequest(String),

  #[error("not found | {0}")]
  NotFound(String),

  #[error("conflict | {0}")]
  Conflict(String),

  #[error("limit exceeded | {0}")]
  LimitExceeded(String),

  #[error("service unavailable | {0}")]
  ServiceUnavailable(String),

  #[error("internal error | {0}")]
  Internal(String),
}

impl OrchestrationError {
  pub fn bad_request(msg: impl Into<String>) -> Self {
    Self::BadRequest(msg.into())
  }

  pub fn not_found(msg: impl Into<String>) -> Self {
    Self::NotFound(msg.into())
  }

  pub fn conflict(msg: impl Into<String>) -> Self {
    Self::Conflict(msg.into())
  }

  pub fn internal(msg: impl Into<String>) -> Self {
    Self::Internal(msg.into())
  }

  /// True for the errors that classify as retryable preconditions
  /// (cluster-delete gating, task-stopped polling); everything else
  /// is fatal on the first synchronous step of a pipeline.
  pub fn is_retryable(&self) -> bool {
    matches!(self, Self::Conflict(_) | Self::ServiceUnavailable(_))
  }
}

/// Converts an ad-hoc internal error (plumbed with `anyhow::Context`
/// through a pipeline step) into the public taxonomy. Anything that
/// reaches here without already being an `OrchestrationError` surfaces
/// as `Internal`.
pub fn internal_from_anyhow(err: anyhow::Error) -> OrchestrationError {
  match err.downcast::<OrchestrationError>() {
    Ok(classified) => classified,
    Err(err) => OrchestrationError::Internal(format!("{err:#}")),
  }
}
