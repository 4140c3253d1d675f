use thiserror::Error;

#[derive(Error, Debug)]
pub enum TsodError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(String),

    #[error("Not enough data in series {series} ({points} points) to meet forecast horizon ({required})")]
    InsufficientData {
        series: String,
        points: usize,
        required: usize,
    },

    #[error("Series {series} has an empty {partition} partition")]
    EmptyPartition {
        series: String,
        partition: &'static str,
    },

    #[error("Invalid timestamp {raw:?} in series {series}")]
    InvalidTimestamp { series: String, raw: String },

    #[error("Invalid value {raw:?} in series {series}")]
    InvalidValue { series: String, raw: String },

    #[error("Series {0} has no training statistics (data not prepared)")]
    NotPrepared(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for TsodError {
    fn from(e: serde_json::Error) -> Self {
        TsodError::Serialize(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TsodError>;
