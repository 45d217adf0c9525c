use std::fmt;

#[cfg(feature = "api")]
use actix_web::{http::StatusCode, HttpResponse, ResponseError};

#[cfg(feature = "api")]
use crate::models::ErrorResponse;

/// Fatal pipeline error taxonomy
///
/// Every variant aborts the pipeline invocation that raised it. Recoverable
/// conditions (a single missing model, a degenerate single-class probability
/// output, a dimension lookup miss) are handled locally with a warning and
/// degraded output instead of an error value.
#[derive(Debug)]
pub enum PipelineError {
    /// Invalid split configuration (overlapping or out-of-order year ranges)
    Config(String),
    /// Source table unreachable, empty, or missing required columns
    Data(String),
    /// Model loading or inference failure, or no models available at all
    Model(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Config(msg) => write!(f, "Configuration error: {}", msg),
            PipelineError::Data(msg) => write!(f, "Data access error: {}", msg),
            PipelineError::Model(msg) => write!(f, "Model error: {}", msg),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<polars::prelude::PolarsError> for PipelineError {
    fn from(e: polars::prelude::PolarsError) -> Self {
        PipelineError::Data(e.to_string())
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(e: std::io::Error) -> Self {
        PipelineError::Data(e.to_string())
    }
}

#[cfg(feature = "api")]
impl ResponseError for PipelineError {
    fn status_code(&self) -> StatusCode {
        match self {
            PipelineError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            PipelineError::Data(_) => StatusCode::NOT_FOUND,
            PipelineError::Model(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let (error_code, message) = match self {
            PipelineError::Config(msg) => ("config_error", msg.clone()),
            PipelineError::Data(msg) => ("data_error", msg.clone()),
            PipelineError::Model(msg) => ("model_error", msg.clone()),
        };

        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: error_code.to_string(),
            message,
        })
    }
}
