//! Domain entities.

pub mod app;
pub mod download;
pub mod release;

pub use app::App;
pub use download::{DownloadEvent, DownloadType};
pub use release::{Artifact, Release, ReleaseStatus};
