//! I/O side of the crate: the HTTP client seam, the request executor and
//! the dispatchers that drive it.

pub mod dispatch;
mod endpoint;
mod client;

pub use dispatch::{Executor, run_concurrent, run_sequential};
pub use endpoint::{Endpoint, EndpointBuilder};
pub use client::{BoxStream, HttpClient, HttpRequest, HttpResponse};

#[cfg(feature = "reqwest")]
pub use client::ReqwestClient;
