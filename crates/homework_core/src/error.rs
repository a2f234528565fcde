use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    #[error("duplicate_name - {0}")]
    DuplicateName(String),
    #[error("not_found - {0}")]
    NotFound(String),
    #[error("invalid_task_kind - {0}")]
    InvalidTaskKind(String),
    #[error("malformed_data - {0}")]
    MalformedData(String),
    #[error("invalid_input - {0}")]
    InvalidInput(String),
    #[error("io_error - {0}")]
    Io(String),
}

impl AppError {
    pub fn duplicate_name<M: Into<String>>(message: M) -> Self {
        Self::DuplicateName(message.into())
    }

    pub fn not_found<M: Into<String>>(message: M) -> Self {
        Self::NotFound(message.into())
    }

    pub fn invalid_task_kind<M: Into<String>>(message: M) -> Self {
        Self::InvalidTaskKind(message.into())
    }

    pub fn malformed_data<M: Into<String>>(message: M) -> Self {
        Self::MalformedData(message.into())
    }

    pub fn invalid_input<M: Into<String>>(message: M) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn io<M: Into<String>>(message: M) -> Self {
        Self::Io(message.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::DuplicateName(_) => "duplicate_name",
            Self::NotFound(_) => "not_found",
            Self::InvalidTaskKind(_) => "invalid_task_kind",
            Self::MalformedData(_) => "malformed_data",
            Self::InvalidInput(_) => "invalid_input",
            Self::Io(_) => "io_error",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::DuplicateName(message)
            | Self::NotFound(message)
            | Self::InvalidTaskKind(message)
            | Self::MalformedData(message)
            | Self::InvalidInput(message)
            | Self::Io(message) => message,
        }
    }
}
