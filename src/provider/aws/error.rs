//! Conversion from AWS SDK failures into [`ProviderError`].

use aws_sdk_cloudformation::error::{DisplayErrorContext, ProvideErrorMetadata};

use crate::provider::ProviderError;

impl ProviderError {
    /// Captures the code and message from any AWS SDK error.
    ///
    /// Every service crate re-exports the same metadata trait, so this single
    /// conversion serves `CloudFormation`, EC2, and IAM alike. When the SDK
    /// carries no service message (for example on connector failures) the
    /// full error chain is rendered instead.
    pub(crate) fn from_sdk<E>(err: &E) -> Self
    where
        E: ProvideErrorMetadata + std::error::Error,
    {
        Self {
            code: err.code().map(str::to_owned),
            message: err.message().map_or_else(
                || DisplayErrorContext(err).to_string(),
                str::to_owned,
            ),
        }
    }
}

/// Normalises SDK accessors that return either `Option<&T>` or `&T`
/// depending on whether the service model marks the member as required.
pub(super) trait Present<'a, T: ?Sized> {
    fn present(self) -> Option<&'a T>;
}

impl<'a, T: ?Sized> Present<'a, T> for Option<&'a T> {
    fn present(self) -> Option<&'a T> {
        self
    }
}

impl<'a, T: ?Sized> Present<'a, T> for &'a T {
    fn present(self) -> Option<&'a T> {
        Some(self)
    }
}

/// Builds the error raised when a response omits a field the workflow needs.
pub(super) fn missing_field(operation: &str, field: &str) -> ProviderError {
    ProviderError::uncoded(format!("{operation} response did not include {field}"))
}
