pub mod config;
pub mod detect_mode;
pub mod format_output;
pub mod prompt;
pub mod replay;
pub mod substitute;
pub mod threads;
pub mod vars;
