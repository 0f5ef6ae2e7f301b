pub mod client_ip;
pub mod honeypot;
pub mod rate_limit;

pub use client_ip::{client_identity, resolve_client_identity, UNKNOWN_CLIENT};
pub use honeypot::is_spam;
pub use rate_limit::{Quota, RateLimitResult, RateLimiter};
