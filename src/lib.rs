//! Sisyphus - workflow-side helpers for an AI coding agent on GitHub

pub mod commands;
pub mod config;
pub mod error;
pub mod github;
pub mod mode;
pub mod output;
pub mod prompt;
pub mod replay;
pub mod subprocess;
pub mod telemetry;
pub mod template;
pub mod threads;
pub mod transcript;
