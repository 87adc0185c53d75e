//! API request handlers.

pub mod analytics;
pub mod apps;
pub mod health;
pub mod releases;
pub mod update;
