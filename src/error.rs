use thiserror::Error;

#[derive(Error, Debug)]
pub enum MaxWaterError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Forecast service error: {0}")]
    Network(#[from] NetworkError),

    #[error("Missing join data: {0}")]
    DataJoin(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),
}

/// Problems with an uploaded table. Always recoverable by the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing columns in {table} data: {}", .missing.join(", "))]
    MissingColumns { table: String, missing: Vec<String> },

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Could not parse {0}")]
    Unparseable(String),

    #[error("No date columns found in {0} data")]
    NoDateColumns(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

/// Failure kinds for the forecast service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("service unreachable: {0}")]
    Unreachable(String),

    #[error("service returned {status}: {body}")]
    BadResponse { status: u16, body: String },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("request cancelled")]
    Cancelled,
}

impl NetworkError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            NetworkError::Timeout(_) | NetworkError::Unreachable(_) => true,
            NetworkError::BadResponse { status, .. } => *status >= 500 || *status == 429,
            NetworkError::Malformed(_) | NetworkError::Cancelled => false,
        }
    }
}

impl From<reqwest::Error> for NetworkError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            NetworkError::Timeout(e.to_string())
        } else if e.is_decode() {
            NetworkError::Malformed(e.to_string())
        } else if let Some(status) = e.status() {
            NetworkError::BadResponse {
                status: status.as_u16(),
                body: e.to_string(),
            }
        } else {
            NetworkError::Unreachable(e.to_string())
        }
    }
}

impl From<reqwest::Error> for MaxWaterError {
    fn from(e: reqwest::Error) -> Self {
        MaxWaterError::Network(e.into())
    }
}

pub type Result<T> = std::result::Result<T, MaxWaterError>;
