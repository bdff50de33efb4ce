//! LLM error types
//!
//! Re-exports thinkloop-error and maps provider failures onto it.

pub use thinkloop_error::{Error, ErrorKind, ErrorStatus, Result};

use crate::provider::ProviderError;

/// Convert a provider failure into a thinkloop error.
///
/// Server-side and transport failures stay retryable; client-side
/// rejections (bad key, malformed request) are permanent.
pub fn provider_error(err: ProviderError) -> Error {
    let message = err.to_string();
    let error = match &err {
        ProviderError::Network(_) => Error::new(ErrorKind::NetworkFailed, message),
        ProviderError::Api { status, .. } if *status >= 500 => {
            Error::new(ErrorKind::ProviderUnavailable, message)
                .with_context("status", status.to_string())
        }
        ProviderError::Api { status, .. } => Error::new(ErrorKind::InferenceFailed, message)
            .with_context("status", status.to_string())
            .permanent(),
        ProviderError::Parse(_) => Error::parse_failed(message),
        ProviderError::RateLimited { retry_after } => {
            let error = Error::new(ErrorKind::RateLimited, message);
            match retry_after {
                Some(secs) => error.with_context("retry_after", secs.to_string()),
                None => error,
            }
        }
        ProviderError::Unauthenticated => Error::new(ErrorKind::Unauthenticated, message),
        ProviderError::EmptyResponse => Error::inference_failed(message),
        ProviderError::Other(_) => Error::unexpected(message),
    };
    error.set_source(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_errors_are_retryable() {
        let err = provider_error(ProviderError::Api { status: 503, message: "overloaded".into() });
        assert_eq!(err.kind(), ErrorKind::ProviderUnavailable);
        assert!(err.is_retryable());
        assert_eq!(err.context_value("status"), Some("503"));
        assert!(err.source_ref().is_some());
    }

    #[test]
    fn test_client_errors_are_permanent() {
        let err = provider_error(ProviderError::Api { status: 400, message: "bad".into() });
        assert_eq!(err.kind(), ErrorKind::InferenceFailed);
        assert!(!err.is_retryable());

        let err = provider_error(ProviderError::Unauthenticated);
        assert_eq!(err.kind(), ErrorKind::Unauthenticated);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_rate_limit_keeps_retry_after() {
        let err = provider_error(ProviderError::RateLimited { retry_after: Some(7) });
        assert_eq!(err.kind(), ErrorKind::RateLimited);
        assert_eq!(err.status(), ErrorStatus::Temporary);
        assert_eq!(err.context_value("retry_after"), Some("7"));
    }

    #[test]
    fn test_empty_response_is_retryable_inference_failure() {
        let err = provider_error(ProviderError::EmptyResponse);
        assert_eq!(err.kind(), ErrorKind::InferenceFailed);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_malformed_body_is_parse_failure() {
        let err = provider_error(ProviderError::Parse("expected value at line 1".into()));
        assert_eq!(err.kind(), ErrorKind::ParseFailed);
        assert!(!err.is_retryable());
    }
}
