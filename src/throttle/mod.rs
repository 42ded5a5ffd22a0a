//! Request throttling: a fixed-rate limiter for the metadata path and a
//! bounded retry policy shared by metadata fetches and downloads.

pub mod rate;
pub mod retry;

pub use rate::RateLimiter;
pub use retry::RetryPolicy;
