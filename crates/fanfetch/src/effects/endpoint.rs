use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::{Method, StatusCode};
use tracing::{debug, info, warn};

use crate::core::{retry_delay, retry_rate};
use crate::customize::RequestCustomizer;
use crate::data::{EndpointConfig, Outcome, ResultOrder};
use crate::effects::dispatch::{self, Executor};
use crate::effects::client::{HttpClient, HttpRequest};
use crate::error::{BoxError, ConfigError, RequestError};
use crate::parse::ResponseParser;

#[cfg(feature = "reqwest")]
use crate::effects::client::ReqwestClient;

/// A target resource: where to send requests, how to prepare them and how
/// to read the answers.
///
/// Cloning is cheap and clones share the retry counter. Build one with
/// [`Endpoint::builder`] or [`EndpointBuilder::with_client`].
pub struct Endpoint<P, C> {
    inner: Arc<Inner<P, C>>,
}

struct Inner<P, C> {
    base_url: String,
    method: Method,
    headers: HeaderMap,
    customizer: Option<Box<dyn RequestCustomizer>>,
    client: C,
    max_parallel: usize,
    max_retries: u32,
    retry_backoff: Duration,
    order: ResultOrder,
    retries: AtomicU64,
    parser: P,
}

impl<P, C> Clone for Endpoint<P, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P, C> fmt::Debug for Endpoint<P, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("base_url", &self.inner.base_url)
            .field("method", &self.inner.method)
            .field("headers", &self.inner.headers)
            .field("customizer", &self.inner.customizer.is_some())
            .field("max_parallel", &self.inner.max_parallel)
            .field("max_retries", &self.inner.max_retries)
            .field("retry_backoff", &self.inner.retry_backoff)
            .field("order", &self.inner.order)
            .field("retries", &self.retries())
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "reqwest")]
impl<P> Endpoint<P, ReqwestClient> {
    /// Start building an endpoint that uses a default [`ReqwestClient`].
    pub fn builder(base_url: impl Into<String>) -> EndpointBuilder<P, ReqwestClient> {
        EndpointBuilder::with_client(base_url, ReqwestClient::default())
    }
}

impl<P, C> Endpoint<P, C> {
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub fn method(&self) -> &Method {
        &self.inner.method
    }

    pub fn max_parallel(&self) -> usize {
        self.inner.max_parallel
    }

    pub fn max_retries(&self) -> u32 {
        self.inner.max_retries
    }

    /// Retries performed by all requests of this endpoint (and its clones)
    /// since creation or the last [`reset_retries`](Self::reset_retries).
    pub fn retries(&self) -> u64 {
        self.inner.retries.load(Ordering::Relaxed)
    }

    pub fn reset_retries(&self) {
        self.inner.retries.store(0, Ordering::Relaxed);
    }

    /// Assemble the request for `identifier`: URL, body, static headers,
    /// then the customizer.
    fn prepare(&self, identifier: &str, payload: &str) -> Result<HttpRequest, RequestError> {
        let inner = &*self.inner;
        let mut request = http::Request::builder()
            .method(inner.method.clone())
            .uri(format!("{}{}", inner.base_url, identifier))
            .body(Bytes::copy_from_slice(payload.as_bytes()))
            .map_err(|source| RequestError::Build {
                id: identifier.to_string(),
                source,
            })?;

        for (name, value) in &inner.headers {
            request.headers_mut().append(name.clone(), value.clone());
        }

        if let Some(customizer) = &inner.customizer {
            customizer
                .customize(&mut request)
                .map_err(RequestError::Customize)?;
        }

        Ok(request)
    }
}

impl<P, C> Endpoint<P, C>
where
    P: ResponseParser,
    C: HttpClient,
{
    /// Request `base_url + identifier`, retrying transport failures, and
    /// parse the answer. A non-empty `payload` is sent as the request body.
    pub async fn execute(&self, identifier: &str, payload: &str) -> Result<P::Output, RequestError> {
        let request = self.prepare(identifier, payload)?;
        let (status, body) = self.fetch(identifier, &request).await?;

        debug!(identifier, %status, bytes = body.len(), "response received");

        self.inner
            .parser
            .parse(&body, status)
            .map_err(|source| RequestError::Parse {
                id: identifier.to_string(),
                source,
            })
    }

    /// Send and read the body, up to `max_retries + 1` times.
    async fn fetch(
        &self,
        identifier: &str,
        request: &HttpRequest,
    ) -> Result<(StatusCode, Bytes), RequestError> {
        let inner = &*self.inner;
        let mut attempt = 0u32;

        loop {
            match Self::attempt(&inner.client, identifier, request).await {
                Ok(read) => return Ok(read),
                Err(e) if e.is_retryable() && attempt < inner.max_retries => {
                    attempt += 1;
                    inner.retries.fetch_add(1, Ordering::Relaxed);
                    warn!(identifier, attempt, error = %e, "retrying request");

                    let delay = retry_delay(attempt - 1, inner.retry_backoff);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn attempt(
        client: &C,
        identifier: &str,
        request: &HttpRequest,
    ) -> Result<(StatusCode, Bytes), RequestError> {
        let transport = |source: C::Error| RequestError::Transport {
            id: identifier.to_string(),
            source: Box::new(source),
        };
        let response = client.send(request).await.map_err(transport)?;
        let status = response.status;
        let body = response.bytes().await.map_err(transport)?;
        Ok((status, body))
    }
}

impl<P, C> Endpoint<P, C>
where
    P: ResponseParser + 'static,
    C: HttpClient + 'static,
{
    /// Request every identifier in order, one at a time.
    pub async fn run_sequential<S: AsRef<str>>(&self, identifiers: &[S]) -> Vec<Outcome<P::Output>> {
        let started = Instant::now();
        let retries_before = self.retries();
        let results = dispatch::run_sequential(self, identifiers).await;
        self.report("sequential", &results, started, retries_before);
        results
    }

    /// Request identifiers on a bounded worker pool.
    ///
    /// Result order follows the endpoint's [`ResultOrder`].
    pub async fn run_concurrent<S: AsRef<str>>(&self, identifiers: &[S]) -> Vec<Outcome<P::Output>> {
        let started = Instant::now();
        let retries_before = self.retries();
        let results = dispatch::run_concurrent(
            self,
            identifiers,
            self.inner.max_parallel,
            self.inner.order,
        )
        .await;
        self.report("concurrent", &results, started, retries_before);
        results
    }

    /// Log a dispatch summary. `retries` covers this dispatch only, though
    /// other work sharing the endpoint at the same time is counted as well.
    fn report(
        &self,
        mode: &str,
        results: &[Outcome<P::Output>],
        started: Instant,
        retries_before: u64,
    ) {
        let failures = results.iter().filter(|r| r.is_error()).count();
        let retries = self.retries().saturating_sub(retries_before);
        info!(
            mode,
            requests = results.len(),
            failures,
            retries,
            retry_rate = retry_rate(retries, results.len()),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "dispatch finished"
        );
    }
}

impl<P, C> Executor for Endpoint<P, C>
where
    P: ResponseParser + 'static,
    C: HttpClient + 'static,
{
    type Output = P::Output;
    type Error = RequestError;

    async fn execute(&self, identifier: &str, payload: &str) -> Result<P::Output, RequestError> {
        Endpoint::execute(self, identifier, payload).await
    }
}

/// Collects endpoint settings and validates them in [`build`](Self::build).
pub struct EndpointBuilder<P, C> {
    base_url: String,
    method: String,
    headers: Vec<(String, String)>,
    customizer: Option<Box<dyn RequestCustomizer>>,
    client: C,
    max_parallel: usize,
    max_retries: u32,
    retry_backoff: Duration,
    order: ResultOrder,
    parser: Option<P>,
}

#[cfg(feature = "reqwest")]
impl<P> EndpointBuilder<P, ReqwestClient> {
    /// Builder pre-filled from a loaded config, with a reqwest client built
    /// from its `client` settings.
    pub fn from_config(config: &EndpointConfig) -> Result<Self, ConfigError> {
        let client = ReqwestClient::from_settings(&config.client)?;
        Ok(Self::with_client(String::new(), client).apply(config))
    }
}

impl<P, C> EndpointBuilder<P, C> {
    pub fn with_client(base_url: impl Into<String>, client: C) -> Self {
        Self {
            base_url: base_url.into(),
            method: "GET".to_string(),
            headers: Vec::new(),
            customizer: None,
            client,
            max_parallel: 0,
            max_retries: 0,
            retry_backoff: Duration::ZERO,
            order: ResultOrder::Input,
            parser: None,
        }
    }

    /// Copy every declarative setting from `config` except the client.
    pub fn apply(mut self, config: &EndpointConfig) -> Self {
        self.base_url = config.base_url.clone();
        self.method = config.method.clone();
        self.headers
            .extend(config.headers.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.max_parallel = config.max_parallel;
        self.max_retries = config.max_retries;
        self.retry_backoff = config.retry_backoff();
        self.order = config.order;
        self
    }

    /// Swap in another HTTP client.
    pub fn client<D>(self, client: D) -> EndpointBuilder<P, D> {
        EndpointBuilder {
            base_url: self.base_url,
            method: self.method,
            headers: self.headers,
            customizer: self.customizer,
            client,
            max_parallel: self.max_parallel,
            max_retries: self.max_retries,
            retry_backoff: self.retry_backoff,
            order: self.order,
            parser: self.parser,
        }
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    /// Add a header sent with every request. Repeated names are all sent.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn customizer(mut self, customizer: impl RequestCustomizer + 'static) -> Self {
        self.customizer = Some(Box::new(customizer));
        self
    }

    /// Closure form of [`customizer`](Self::customizer).
    pub fn customize_with<F>(self, f: F) -> Self
    where
        F: Fn(&mut HttpRequest) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.customizer(f)
    }

    pub fn max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel;
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn retry_backoff(mut self, base: Duration) -> Self {
        self.retry_backoff = base;
        self
    }

    pub fn order(mut self, order: ResultOrder) -> Self {
        self.order = order;
        self
    }

    pub fn parser(mut self, parser: P) -> Self {
        self.parser = Some(parser);
        self
    }

    pub fn build(self) -> Result<Endpoint<P, C>, ConfigError>
    where
        P: ResponseParser,
        C: HttpClient,
    {
        let parser = self.parser.ok_or(ConfigError::MissingParser)?;
        if self.method.trim().is_empty() {
            return Err(ConfigError::MissingMethod);
        }
        if self.base_url.is_empty() {
            return Err(ConfigError::MissingUrl);
        }
        let method = Method::from_bytes(self.method.trim().to_ascii_uppercase().as_bytes())
            .map_err(|_| ConfigError::InvalidMethod(self.method.clone()))?;

        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            let invalid = |reason: String| ConfigError::InvalidHeader {
                name: name.clone(),
                reason,
            };
            let header_name = HeaderName::from_str(name).map_err(|e| invalid(e.to_string()))?;
            let header_value = HeaderValue::from_str(value).map_err(|e| invalid(e.to_string()))?;
            headers.append(header_name, header_value);
        }

        Ok(Endpoint {
            inner: Arc::new(Inner {
                base_url: self.base_url,
                method,
                headers,
                customizer: self.customizer,
                client: self.client,
                max_parallel: self.max_parallel,
                max_retries: self.max_retries,
                retry_backoff: self.retry_backoff,
                order: self.order,
                retries: AtomicU64::new(0),
                parser,
            }),
        })
    }
}
