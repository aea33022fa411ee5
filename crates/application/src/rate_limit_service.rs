//! Fixed-window rate limiting ports and application service.
//!
//! Each rule owns a key prefix so route classes never share counters. The
//! counting algorithm lives in the service; repositories only store records.

mod config;
mod ports;
mod service;

pub use config::RateLimitRule;
pub use ports::RateLimitRepository;
pub use service::RateLimitService;

#[cfg(test)]
mod tests;
