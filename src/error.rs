use thiserror::Error;

/// Startup failures while loading the historical dataset. Fatal: the service
/// refuses to come up without a usable store.
#[derive(Debug, Error)]
pub enum DataLoadError {
    #[error("failed to open dataset at {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse dataset row: {0}")]
    Csv(#[from] csv::Error),
    #[error("unparseable timestamp {value:?} on line {line}")]
    Timestamp { line: usize, value: String },
    #[error("invalid vehicle count {value} on line {line}")]
    InvalidCount { line: usize, value: f64 },
    #[error("dataset contains no records")]
    Empty,
}

/// Startup failures while loading the regression artifact.
#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("failed to read model artifact at {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid model artifact: {0}")]
    Json(#[from] serde_json::Error),
    #[error("model feature schema mismatch: {0}")]
    Schema(String),
}

/// Per-request failures. Each one fails a single prediction; none of them
/// invalidate the loaded store or model.
#[derive(Debug, Error, PartialEq)]
pub enum PredictError {
    /// The caller selected a junction outside the set known at load time.
    #[error("unknown junction {0}")]
    UnknownJunction(u32),
    /// A known junction with zero historical records; no mean to fall back on.
    #[error("junction {0} has no historical records")]
    EmptyJunction(u32),
    /// A trailing rolling window matched no records. The artifact cannot
    /// accept missing values, so the request fails rather than feeding it NaN.
    #[error("no records in the trailing {window_hours}h window before {target} for junction {junction}")]
    InsufficientHistory {
        junction: u32,
        window_hours: i64,
        target: chrono::NaiveDateTime,
    },
    /// The artifact rejected the feature vector (dimension or value problem).
    #[error("model inference failed: {0}")]
    ModelInference(String),
}

impl PredictError {
    /// Status the serve layer reports for this failure: caller mistakes are
    /// 400, requests the data cannot answer are 422, artifact failures 500.
    pub fn http_status(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            PredictError::UnknownJunction(_) => StatusCode::BAD_REQUEST,
            PredictError::EmptyJunction(_) | PredictError::InsufficientHistory { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            PredictError::ModelInference(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
