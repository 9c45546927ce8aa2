//! Pure helpers for dispatching: worker sizing and retry backoff.

mod retry;
mod workers;

pub use retry::{retry_delay, retry_rate};
pub use workers::worker_count;
