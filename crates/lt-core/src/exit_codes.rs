//! Exit codes for the lt-core CLI.
//!
//! Exit codes communicate the outcome without requiring output parsing.

/// Exit codes for lt-core operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Nothing known found / command succeeded
    Clean = 0,

    /// At least one line matched a known signature
    FindingsReady = 1,

    /// Rule table or category selection error
    ConfigError = 10,

    /// I/O error
    IoError = 13,

    /// Input could not be decoded
    InvalidInput = 14,

    /// Internal/unknown error
    InternalError = 99,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Map a failure to its exit code.
    pub fn for_error(err: &lt_common::Error) -> Self {
        match err {
            e if e.is_config() => ExitCode::ConfigError,
            lt_common::Error::Io(_) => ExitCode::IoError,
            lt_common::Error::InvalidInput(_) => ExitCode::InvalidInput,
            _ => ExitCode::InternalError,
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}
