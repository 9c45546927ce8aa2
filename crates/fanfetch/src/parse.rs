//! Response parsing: turning a body and status code into a domain value.
//!
//! The parser alone decides which status codes are failures; the executor
//! hands over whatever the server answered.

use std::marker::PhantomData;

use http::StatusCode;
use serde::de::DeserializeOwned;

use crate::error::BoxError;

/// Converts a raw response into a typed result.
pub trait ResponseParser: Send + Sync {
    type Output: Send + 'static;

    fn parse(&self, body: &[u8], status: StatusCode) -> Result<Self::Output, BoxError>;
}

/// Closure-backed parser, see [`parser_fn`].
pub struct FnParser<F, T> {
    f: F,
    _output: PhantomData<fn() -> T>,
}

/// Wrap a closure as a [`ResponseParser`].
///
/// ```
/// use fanfetch::{BoxError, ResponseParser, StatusCode, parser_fn};
///
/// let parser = parser_fn(|body: &[u8], status: StatusCode| -> Result<usize, BoxError> {
///     if status.is_success() { Ok(body.len()) } else { Err(format!("status {status}").into()) }
/// });
/// assert_eq!(parser.parse(b"abc", StatusCode::OK).unwrap(), 3);
/// ```
pub fn parser_fn<F, T>(f: F) -> FnParser<F, T>
where
    F: Fn(&[u8], StatusCode) -> Result<T, BoxError> + Send + Sync,
    T: Send + 'static,
{
    FnParser { f, _output: PhantomData }
}

impl<F, T> ResponseParser for FnParser<F, T>
where
    F: Fn(&[u8], StatusCode) -> Result<T, BoxError> + Send + Sync,
    T: Send + 'static,
{
    type Output = T;

    fn parse(&self, body: &[u8], status: StatusCode) -> Result<T, BoxError> {
        (self.f)(body, status)
    }
}

fn ensure_success(status: StatusCode) -> Result<(), BoxError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(format!("unexpected status {status}").into())
    }
}

/// Accepts 2xx responses and returns the body as (lossy) UTF-8 text.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextParser;

impl ResponseParser for TextParser {
    type Output = String;

    fn parse(&self, body: &[u8], status: StatusCode) -> Result<String, BoxError> {
        ensure_success(status)?;
        Ok(String::from_utf8_lossy(body).into_owned())
    }
}

/// Accepts 2xx responses and decodes the body as JSON into `T`.
pub struct JsonParser<T> {
    _output: PhantomData<fn() -> T>,
}

impl<T> JsonParser<T> {
    pub fn new() -> Self {
        Self { _output: PhantomData }
    }
}

impl<T> Default for JsonParser<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for JsonParser<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> ResponseParser for JsonParser<T>
where
    T: DeserializeOwned + Send + 'static,
{
    type Output = T;

    fn parse(&self, body: &[u8], status: StatusCode) -> Result<T, BoxError> {
        ensure_success(status)?;
        serde_json::from_slice(body).map_err(|e| format!("decoding JSON body: {e}").into())
    }
}
