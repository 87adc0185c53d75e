//! Liftgate backend - update server for desktop applications.
//!
//! Apps publish versioned releases with per-platform artifacts; installed
//! clients poll the public update-check API and receive either the newest
//! applicable update or a 204. Download analytics and per-policy rate
//! limiting ride along.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod platform;
pub mod semver;
pub mod services;
pub mod store;
pub mod telemetry;

pub use config::Config;
pub use error::{AppError, Result};
