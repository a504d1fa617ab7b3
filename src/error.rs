use std::process::ExitCode;

/// Errors that cause sisyphus to exit with a specific code.
#[derive(Debug, thiserror::Error)]
pub enum ExitError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("tool not found: {tool}")]
    ToolNotFound { tool: String },

    #[error("{tool} failed (exit {code}): {message}")]
    ToolFailed {
        tool: String,
        code: i32,
        message: String,
    },

    #[error("{tool} timed out after {timeout_secs}s")]
    Timeout { tool: String, timeout_secs: u64 },

    #[error("{0}")]
    Policy(String),

    /// The wrapped agent process exited unsuccessfully; its code is mirrored.
    #[error("{tool} exited with code {code}")]
    ChildExit { tool: String, code: i32 },

    #[error("{0}")]
    Other(String),
}

impl ExitError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            ExitError::InvalidInput(_) => ExitCode::from(2),
            ExitError::ToolNotFound { .. } => ExitCode::from(3),
            ExitError::ToolFailed { .. } => ExitCode::from(4),
            ExitError::Timeout { .. } => ExitCode::from(5),
            ExitError::Policy(_) => ExitCode::from(6),
            ExitError::ChildExit { code, .. } => {
                ExitCode::from(u8::try_from(*code).ok().filter(|c| *c != 0).unwrap_or(1))
            }
            ExitError::Other(_) => ExitCode::from(1),
        }
    }
}
