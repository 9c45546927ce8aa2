//! Per-request customization hooks, e.g. signing or timestamp headers.

use crate::effects::HttpRequest;
use crate::error::BoxError;

/// Mutates an outgoing request after the endpoint's static headers are set.
///
/// Returning an error aborts that request before anything is sent.
pub trait RequestCustomizer: Send + Sync {
    fn customize(&self, request: &mut HttpRequest) -> Result<(), BoxError>;
}

impl<F> RequestCustomizer for F
where
    F: Fn(&mut HttpRequest) -> Result<(), BoxError> + Send + Sync,
{
    fn customize(&self, request: &mut HttpRequest) -> Result<(), BoxError> {
        self(request)
    }
}
