#[cfg(feature = "desktop")]
pub mod camera;
pub mod config;
pub mod mailbox;
pub mod metrics;
pub mod pose;
pub mod render;
pub mod session;
pub mod sink;
