use thiserror::Error;

#[derive(Error, Debug)]
pub enum SalesError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Flat file error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Required column '{column}' missing from {source_name}")]
    MissingColumn { column: String, source_name: String },

    #[error("Malformed value {value:?} in column '{column}' at line {line}")]
    MalformedValue {
        line:   usize,
        column: String,
        value:  String,
    },

    #[error("No rows with a valid sale date in {source_name}")]
    NoValidDates { source_name: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type SalesResult<T> = Result<T, SalesError>;
