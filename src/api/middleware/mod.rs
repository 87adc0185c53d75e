//! API middleware.

pub mod rate_limit;
