//! Error types for morphognosis

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid persisted state: {0}")]
    Format(String),

    #[error("structural mismatch: {what} ({left} vs {right})")]
    StructuralMismatch {
        what: &'static str,
        left: usize,
        right: usize,
    },

    #[error("invalid event: {0}")]
    InvalidEvent(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("csv error: line {line}: {message}")]
    Csv { line: usize, message: String },

    #[error("csv write error: {0}")]
    CsvWrite(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn invalid_event(message: impl Into<String>) -> Self {
        Self::InvalidEvent(message.into())
    }

    pub fn mismatch(what: &'static str, left: usize, right: usize) -> Self {
        Self::StructuralMismatch { what, left, right }
    }

    pub fn csv(line: usize, message: impl Into<String>) -> Self {
        Self::Csv {
            line,
            message: message.into(),
        }
    }
}
