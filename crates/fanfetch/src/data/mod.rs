//! Immutable configuration and result types.
//!
//! Nothing in here performs I/O apart from reading the config file in
//! [`EndpointConfig::load`].

pub mod config;
pub mod outcome;

pub use config::{ClientSettings, EndpointConfig, ResultOrder};
pub use outcome::Outcome;
