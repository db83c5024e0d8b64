//! Error types for virt-kickstart-rs

use thiserror::Error;

/// Main error type for virt-kickstart-rs operations
#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("{0}")]
    Usage(String),

    #[error("{0}")]
    Precondition(String),

    #[error("Failed to run '{program}': {message}")]
    Spawn { program: String, message: String },

    #[error("'{program}' exited with status {status}")]
    Command { program: String, status: i32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Password hashing error: {0}")]
    Hash(String),
}

impl ProvisionError {
    /// Create a usage error (maps to exit code 2)
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage(message.into())
    }

    /// Create a precondition error (maps to exit code 1)
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition(message.into())
    }

    /// Create a spawn error for an external command that could not start
    pub fn spawn(program: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Spawn {
            program: program.into(),
            message: message.into(),
        }
    }

    /// Create an error for an external command that exited non-zero
    pub fn command(program: impl Into<String>, status: i32) -> Self {
        Self::Command {
            program: program.into(),
            status,
        }
    }

    /// Process exit code for this error: 2 for malformed invocations,
    /// 1 for everything that fails after the command line parsed
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Usage(_) => 2,
            _ => 1,
        }
    }
}
