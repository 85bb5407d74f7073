//! CLI commands

pub mod classify;
pub mod config;
pub mod maintain;
pub mod patterns;
pub mod stats;
