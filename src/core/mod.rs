//! Core functionality for the IP gate service.
//! This module contains CIDR matching, access evaluation,
//! the expiry sweeper and the per-IP rate limiter.

pub mod cidr;
mod clock;
mod evaluator;
mod rate_limiter;
mod sweeper;

pub use clock::{Clock, SystemClock};
pub use evaluator::{decide, AccessDecision, AccessEvaluator};
pub use rate_limiter::RateLimiter;
pub use sweeper::ExpirySweeper;
