//! @acp:module "Errors"
//! @acp:summary "Crate error taxonomy and exit-code carrying domain errors"
//! @acp:domain cli
//! @acp:layer model

use std::fmt;
use std::process::ExitStatus;

use thiserror::Error;

/// Errors raised by the library itself (never by user commands)
#[derive(Debug, Error)]
pub enum Error {
    /// A callable or struct does not match a supported shape
    #[error("invalid shape: {0}")]
    InvalidShapeKind(String),

    /// The metadata payload could not be decoded
    #[error("malformed metadata: {0}")]
    MalformedMetadata(#[from] serde_json::Error),

    /// Two children of one command share a name
    #[error("duplicate command name: {0}")]
    DuplicateCommand(String),
}

/// Result type alias for library operations
pub type Result<T> = std::result::Result<T, Error>;

/// A domain error that asks for a specific process exit code.
///
/// Return it (or anything wrapping it) from a command to control the code
/// reported by [`run`](crate::run). Without a message nothing is printed.
#[derive(Debug)]
pub struct ExitError {
    code: i32,
    message: Option<String>,
}

impl ExitError {
    pub fn new(code: i32) -> Self {
        Self {
            code,
            message: None,
        }
    }

    pub fn with_message(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: Some(message.into()),
        }
    }

    pub fn code(&self) -> i32 {
        self.code
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => f.write_str(message),
            None => write!(f, "exit status {}", self.code),
        }
    }
}

impl std::error::Error for ExitError {}

/// Shorthand for `ExitError::new(code).into()`, for `return Err(climate::exit(2))`
pub fn exit(code: i32) -> anyhow::Error {
    ExitError::new(code).into()
}

/// An external process that terminated unsuccessfully
#[derive(Debug, Error)]
#[error("`{program}` exited with {status}")]
pub struct SubprocessError {
    program: String,
    status: ExitStatus,
}

impl SubprocessError {
    /// Turn a finished process status into `Ok(())` or a `SubprocessError`
    pub fn check(program: impl Into<String>, status: ExitStatus) -> std::result::Result<(), Self> {
        if status.success() {
            Ok(())
        } else {
            Err(Self {
                program: program.into(),
                status,
            })
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn status(&self) -> ExitStatus {
        self.status
    }

    /// The child's own exit code, `-1` if it was killed by a signal
    pub fn exit_code(&self) -> i32 {
        self.status.code().unwrap_or(-1)
    }
}
