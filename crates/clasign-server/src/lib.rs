//! CLA signing server: configuration, service wiring and the sweep of
//! expired records.

pub mod app;
pub mod config;
pub mod sweep;

pub use app::Services;
pub use config::ServerConfig;
pub use sweep::Sweeper;
