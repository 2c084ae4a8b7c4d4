//! Provider error classification. This is the one place a raw
//! provider error code becomes an [`OrchestrationError`] — collaborator
//! implementations are expected to call [`classify_error`] rather than let
//! their own error type leak into the core.

use spinup_types::OrchestrationError;

/// The provider error codes the classifier recognises by name. Anything
/// else falls through to the `default` arm in [`classify_error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorCode {
  EntityAlreadyExists,
  ResourceInUseException,
  NoSuchEntity,
  ResourceNotFoundException,
  LimitExceeded,
  ServiceFailure,
  ThrottlingException,
  MalformedPolicyDocument,
  InvalidParameterException,
  Other(&'static str),
}

/// Pure mapping from a provider error code to the orchestration taxonomy.
/// `message` is preserved verbatim inside the classified variant.
pub fn classify_error(
  code: ProviderErrorCode,
  message: impl Into<String>,
) -> OrchestrationError {
  let message = message.into();
  match code {
    ProviderErrorCode::EntityAlreadyExists
    | ProviderErrorCode::ResourceInUseException => {
      OrchestrationError::Conflict(message)
    }
    ProviderErrorCode::NoSuchEntity
    | ProviderErrorCode::ResourceNotFoundException => {
      OrchestrationError::NotFound(message)
    }
    ProviderErrorCode::LimitExceeded => {
      OrchestrationError::LimitExceeded(message)
    }
    ProviderErrorCode::ServiceFailure
    | ProviderErrorCode::ThrottlingException => {
      OrchestrationError::ServiceUnavailable(message)
    }
    ProviderErrorCode::MalformedPolicyDocument
    | ProviderErrorCode::InvalidParameterException => {
      OrchestrationError::BadRequest(message)
    }
    ProviderErrorCode::Other(_) => OrchestrationError::BadRequest(message),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn entity_already_exists_is_conflict() {
    let err = classify_error(ProviderErrorCode::EntityAlreadyExists, "boom");
    assert!(matches!(err, OrchestrationError::Conflict(_)));
  }

  #[test]
  fn unknown_code_defaults_to_bad_request() {
    let err = classify_error(ProviderErrorCode::Other("Weird"), "boom");
    assert!(matches!(err, OrchestrationError::BadRequest(_)));
  }
}
