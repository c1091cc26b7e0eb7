use std::time::Duration;

#[derive(thiserror::Error, Debug)]
pub enum MetricsError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("The `{binary}` command was not found on PATH. Install Terminus or set terminus.binary.")]
    ToolNotFound { binary: String },
    #[error("terminus exited with status {exit_code}: {stderr}")]
    ToolExecution { exit_code: i32, stderr: String },
    #[error("terminus did not finish within {} seconds", .timeout.as_secs())]
    ToolTimeout { timeout: Duration },
    #[error("Could not parse terminus output: {0}")]
    Parse(String),
    #[error("Running terminus failed: {0}")]
    Io(#[from] std::io::Error),
}

impl MetricsError {
    /// Short machine-readable name, used in logs and JSON responses.
    pub fn kind(&self) -> &'static str {
        match self {
            MetricsError::InvalidRequest(_) => "invalid_request",
            MetricsError::ToolNotFound { .. } => "tool_not_found",
            MetricsError::ToolExecution { .. } => "tool_execution",
            MetricsError::ToolTimeout { .. } => "tool_timeout",
            MetricsError::Parse(_) => "parse",
            MetricsError::Io(_) => "io",
        }
    }
}
