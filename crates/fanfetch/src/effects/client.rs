use std::future::Future;
use std::pin::Pin;

use bytes::{Bytes, BytesMut};
use futures_util::{Stream, TryStreamExt, stream};
use http::StatusCode;

/// Outgoing request handed to customizers and clients. An empty body means
/// the request is sent without one.
pub type HttpRequest = http::Request<Bytes>;

/// A boxed stream type for HTTP response bodies.
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// Response as returned by an [`HttpClient`]; the body is read separately and
/// that read may fail on its own.
pub struct HttpResponse<E> {
    pub status: StatusCode,
    pub body: BoxStream<'static, Result<Bytes, E>>,
}

impl<E: Send + 'static> HttpResponse<E> {
    pub fn new(status: StatusCode, body: BoxStream<'static, Result<Bytes, E>>) -> Self {
        Self { status, body }
    }

    /// Response with the whole body available up front.
    pub fn full(status: StatusCode, body: impl Into<Bytes>) -> Self {
        let body: Bytes = body.into();
        Self::new(status, Box::pin(stream::iter(vec![Ok(body)])))
    }

    /// Drain the body stream. Dropping the response closes the body.
    pub async fn bytes(mut self) -> Result<Bytes, E> {
        let mut buf = BytesMut::new();
        while let Some(chunk) = self.body.try_next().await? {
            buf.extend_from_slice(&chunk);
        }
        Ok(buf.freeze())
    }
}

/// Asynchronous HTTP client abstraction.
///
/// One instance is shared by every worker of a dispatch, so implementations
/// must tolerate concurrent `send` calls. Timeouts and other transport
/// settings belong to the implementation.
///
/// # Implementations
///
/// - [`ReqwestClient`]: production implementation using `reqwest`
/// - Mock implementations for testing
pub trait HttpClient: Send + Sync {
    /// Transport error: connection failures, timeouts, body read failures.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Execute `request` and return the status with an unread body.
    fn send(
        &self,
        request: &HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse<Self::Error>, Self::Error>> + Send;
}

#[cfg(feature = "reqwest")]
mod reqwest_impl {
    use super::*;
    use crate::data::ClientSettings;
    use crate::error::ConfigError;
    use reqwest::{Client, Proxy};

    /// Production HTTP client implementation using reqwest.
    #[derive(Debug, Clone, Default)]
    pub struct ReqwestClient {
        client: Client,
    }

    impl ReqwestClient {
        pub fn new(client: Client) -> Self {
            Self { client }
        }

        pub fn from_settings(settings: &ClientSettings) -> Result<Self, ConfigError> {
            let mut cb = Client::builder();

            if let Some(timeout) = settings.timeout() {
                cb = cb.timeout(timeout);
            }
            if let Some(timeout) = settings.connect_timeout() {
                cb = cb.connect_timeout(timeout);
            }
            if let Some(agent) = &settings.user_agent {
                cb = cb.user_agent(agent.clone());
            }

            let (secure, insecure): (Vec<&String>, Vec<&String>) = settings
                .proxies
                .iter()
                .partition(|u| u.starts_with("https://"));

            for u in secure {
                let proxy =
                    Proxy::https(u.as_str()).map_err(|e| ConfigError::Client(Box::new(e)))?;
                cb = cb.proxy(proxy);
            }
            for u in insecure {
                let proxy =
                    Proxy::http(u.as_str()).map_err(|e| ConfigError::Client(Box::new(e)))?;
                cb = cb.proxy(proxy);
            }

            cb.build()
                .map(Self::new)
                .map_err(|e| ConfigError::Client(Box::new(e)))
        }
    }

    impl HttpClient for ReqwestClient {
        type Error = reqwest::Error;

        async fn send(
            &self,
            request: &HttpRequest,
        ) -> Result<HttpResponse<Self::Error>, Self::Error> {
            let mut builder = self
                .client
                .request(request.method().clone(), request.uri().to_string())
                .headers(request.headers().clone());

            if !request.body().is_empty() {
                builder = builder.body(request.body().clone());
            }

            let response = builder.send().await?;
            let status = response.status();
            Ok(HttpResponse::new(status, Box::pin(response.bytes_stream())))
        }
    }

}

#[cfg(feature = "reqwest")]
pub use reqwest_impl::ReqwestClient;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[tokio::test]
    async fn test_bytes_joins_chunks() {
        let chunks = vec![Ok(Bytes::from_static(b"Straw")), Ok(Bytes::from_static(b"berry"))];
        let response = HttpResponse::<io::Error>::new(StatusCode::OK, Box::pin(stream::iter(chunks)));
        assert_eq!(response.bytes().await.unwrap(), Bytes::from_static(b"Strawberry"));
    }

    #[tokio::test]
    async fn test_bytes_surfaces_read_error() {
        let chunks = vec![
            Ok(Bytes::from_static(b"partial")),
            Err(io::Error::new(io::ErrorKind::UnexpectedEof, "connection closed")),
        ];
        let response = HttpResponse::new(StatusCode::OK, Box::pin(stream::iter(chunks)));
        let err = response.bytes().await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[tokio::test]
    async fn test_full() {
        let response = HttpResponse::<io::Error>::full(StatusCode::CREATED, "done");
        assert_eq!(response.status, StatusCode::CREATED);
        assert_eq!(response.bytes().await.unwrap(), "done");
    }
}
