//! Bounded-concurrency HTTP fetch-and-parse dispatcher.
//!
//! An [`Endpoint`] describes a resource (`base_url`, method, static headers,
//! an optional [`RequestCustomizer`] and a [`ResponseParser`]). Given a list
//! of identifiers it issues one request per identifier against
//! `base_url + identifier`, retries transport failures, parses each answer
//! and returns one [`Outcome`] per identifier.
//!
//! # Architecture
//!
//! - [`data`] - Configuration and result types
//! - [`core`] - Pure helpers (worker sizing, backoff)
//! - [`effects`] - HTTP client abstraction, executor and dispatchers
//!
//! # Example
//!
//! ```no_run
//! use fanfetch::{Endpoint, TextParser};
//!
//! # async fn run() -> Result<(), fanfetch::ConfigError> {
//! let endpoint = Endpoint::builder("https://example.com/dictionary/")
//!     .max_parallel(8)
//!     .max_retries(3)
//!     .parser(TextParser)
//!     .build()?;
//!
//! let results = endpoint.run_concurrent(&["Fruit", "Seed", "Flower"]).await;
//! for result in &results {
//!     println!("{result}");
//! }
//! println!("{} retries", endpoint.retries());
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod customize;
pub mod data;
pub mod effects;
mod error;
pub mod parse;

pub use customize::RequestCustomizer;
pub use data::{ClientSettings, EndpointConfig, Outcome, ResultOrder};
pub use effects::{
    BoxStream, Endpoint, EndpointBuilder, Executor, HttpClient, HttpRequest, HttpResponse,
};
pub use error::{BoxError, ConfigError, RequestError};
pub use parse::{FnParser, JsonParser, ResponseParser, TextParser, parser_fn};

pub use http::{Method, StatusCode};

#[cfg(feature = "reqwest")]
pub use effects::ReqwestClient;
