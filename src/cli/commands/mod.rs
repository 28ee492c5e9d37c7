//! Command implementations

pub mod catalog;
pub mod completions;
pub mod estimate;
pub mod init;
pub mod solve;
