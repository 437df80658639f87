use std::path::PathBuf;

use snafu::Snafu;

/// Fatal errors while loading the poll CSV. No partial dataset is ever returned.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum LoadError {
    #[snafu(display("Failed to open CSV '{}': {source}", path.display()))]
    Open {
        source: std::io::Error,
        path: PathBuf,
    },

    #[snafu(display("Failed to read CSV headers: {source}"))]
    Headers { source: csv::Error },

    #[snafu(display("Missing required column: `{name}`"))]
    MissingColumn { name: String },

    #[snafu(display("CSV parse error on line {line}: {source}"))]
    Record { source: csv::Error, line: usize },

    #[snafu(display("Missing `{column}` value on line {line}"))]
    MissingValue { column: String, line: usize },

    #[snafu(display(
        "Invalid date '{value}' on line {line}. Expected one of: YYYY-MM-DD, YYYY/MM/DD, MM/DD/YYYY (optionally with a time)."
    ))]
    InvalidDate { value: String, line: usize },
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<LoadError> for AppError {
    fn from(err: LoadError) -> Self {
        AppError::new(2, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
