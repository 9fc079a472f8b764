use std::path::{Path, PathBuf};

pub type PaddiResult<T> = Result<T, PaddiError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    InputValidation,
    IoSystem,
    Internal,
}

impl ErrorCategory {
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::InputValidation => 2,
            Self::IoSystem => 3,
            Self::Internal => 5,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InputValidation => "InputValidationError",
            Self::IoSystem => "IoSystemError",
            Self::Internal => "InternalError",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PaddiError {
    #[error("failed to access '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed '{}' at line {line}: {reason}", path.display())]
    Format {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("required parameter '{name}' is missing and cannot be derived")]
    MissingParameter { name: String },

    #[error("parameter '{name}' not found under its canonical or storage name")]
    KeyNotFound { name: String },

    #[error("parameter '{name}' has an unusable value: {reason}")]
    InvalidValue { name: String, reason: String },

    #[error(
        "parameter mismatch for '{name}' (stored as '{storage_name}'): expected {expected}, snapshot holds {stored}"
    )]
    ParameterMismatch {
        name: String,
        storage_name: String,
        expected: String,
        stored: String,
    },

    #[error("invalid container '{}': {reason}", path.display())]
    Container { path: PathBuf, reason: String },

    #[error("invalid reader configuration: {reason}")]
    InvalidSchema { reason: String },
}

impl PaddiError {
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn format(path: impl AsRef<Path>, line: usize, reason: impl Into<String>) -> Self {
        Self::Format {
            path: path.as_ref().to_path_buf(),
            line,
            reason: reason.into(),
        }
    }

    pub fn container(path: impl AsRef<Path>, reason: impl Into<String>) -> Self {
        Self::Container {
            path: path.as_ref().to_path_buf(),
            reason: reason.into(),
        }
    }

    pub fn missing_parameter(name: impl Into<String>) -> Self {
        Self::MissingParameter { name: name.into() }
    }

    pub fn invalid_schema(reason: impl Into<String>) -> Self {
        Self::InvalidSchema {
            reason: reason.into(),
        }
    }

    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Io { .. } => ErrorCategory::IoSystem,
            Self::Format { .. }
            | Self::MissingParameter { .. }
            | Self::KeyNotFound { .. }
            | Self::InvalidValue { .. }
            | Self::ParameterMismatch { .. }
            | Self::Container { .. } => ErrorCategory::InputValidation,
            Self::InvalidSchema { .. } => ErrorCategory::Internal,
        }
    }

    pub const fn exit_code(&self) -> i32 {
        self.category().exit_code()
    }

    pub fn diagnostic_line(&self) -> String {
        format!("ERROR: [{}] {}", self.category().as_str(), self)
    }
}
