//! Business logic services.

pub mod analytics_service;
pub mod release_service;
pub mod resolver_service;
