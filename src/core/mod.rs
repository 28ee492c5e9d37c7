//! Core module - configuration, workspace discovery, loading and logging

pub mod config;
pub mod loader;
pub mod logging;
pub mod project;

pub use config::Config;
pub use project::{Project, ProjectError};
