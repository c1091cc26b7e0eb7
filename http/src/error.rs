use axum::{
    http::StatusCode,
    response::{
        IntoResponse,
        Response,
    },
};
use terminus_metrics_pipeline::MetricsError;

#[derive(thiserror::Error, Debug)]
#[error(transparent)]
pub struct AppError(#[from] pub MetricsError);

impl AppError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            MetricsError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            MetricsError::ToolNotFound { .. } | MetricsError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            MetricsError::ToolExecution { .. } => StatusCode::BAD_GATEWAY,
            MetricsError::ToolTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            MetricsError::Parse(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (
            self.status(),
            axum::Json(serde_json::json!({ "error": self.to_string(), "kind": self.0.kind() })),
        )
            .into_response()
    }
}
