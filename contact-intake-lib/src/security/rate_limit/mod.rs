//! Rate limiting for contact submissions.
//!
//! A fixed-window counter keyed by client identifier:
//!
//! - The first request from a key opens a window of `quota.window` and
//!   counts 1.
//! - Requests inside the window increment the count until it reaches
//!   `quota.max_requests`; further requests are denied without extending
//!   the window.
//! - The first request after the window has passed replaces the entry
//!   wholesale (count 1, fresh window).
//!
//! Entries whose window has passed are dropped by [`RateLimiter::sweep`],
//! which [`RateLimiter::spawn_sweeper`] runs on a fixed interval until its
//! cancellation token fires.
//!
//! State lives in this process only. Several instances behind a load
//! balancer each enforce their own quota; a shared store is needed for a
//! global one.
//!
//! # Example Usage
//!
//! ```ignore
//! use contact_intake_lib::security::rate_limit::{Quota, RateLimiter, RateLimitResult};
//!
//! let limiter = RateLimiter::new();
//! let quota = Quota::default(); // 3 per hour
//!
//! match limiter.check("1.2.3.4", quota) {
//!     RateLimitResult::Allowed { remaining, .. } => println!("{remaining} left"),
//!     RateLimitResult::Limited { reset_after, .. } => println!("retry in {reset_after:?}"),
//! }
//! ```

mod clock;
mod limiter;

pub use clock::{Clock, ManualClock, SystemClock};
pub use limiter::{Quota, MAX_WINDOW, RateLimitEntry, RateLimitResult, RateLimiter};
