//! API error types with HTTP response mapping.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::InventoryError;
use reports::ReportError;
use saga::MoveError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed request the domain never saw.
    BadRequest(String),
    /// Inventory operation error.
    Inventory(InventoryError),
    /// Move saga error.
    Move(MoveError),
    /// Report error.
    Report(ReportError),
}

impl ApiError {
    fn status_and_message(self) -> (StatusCode, String) {
        match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Inventory(err) => inventory_error_to_response(err),
            ApiError::Move(MoveError::Inventory(err)) => inventory_error_to_response(err),
            ApiError::Move(err @ MoveError::CompensationFailed { .. }) => {
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            ApiError::Report(ReportError::Inventory(err)) => inventory_error_to_response(err),
            ApiError::Report(err @ ReportError::InvalidSetting(_)) => {
                (StatusCode::BAD_REQUEST, err.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        metrics::counter!("api_errors_total", "status" => status.as_u16().to_string()).increment(1);
        if status.is_server_error() {
            tracing::error!(error = %message, "internal server error");
        }

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn inventory_error_to_response(err: InventoryError) -> (StatusCode, String) {
    let status = match &err {
        InventoryError::Validation(_) => StatusCode::BAD_REQUEST,
        InventoryError::Duplicate(_) | InventoryError::Conflict { .. } => StatusCode::CONFLICT,
        InventoryError::NotFound(_) => StatusCode::NOT_FOUND,
        InventoryError::InsufficientStock { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        InventoryError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string())
}

impl From<InventoryError> for ApiError {
    fn from(err: InventoryError) -> Self {
        ApiError::Inventory(err)
    }
}

impl From<MoveError> for ApiError {
    fn from(err: MoveError) -> Self {
        ApiError::Move(err)
    }
}

impl From<ReportError> for ApiError {
    fn from(err: ReportError) -> Self {
        ApiError::Report(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: impl Into<ApiError>) -> StatusCode {
        err.into().into_response().status()
    }

    #[test]
    fn test_inventory_error_statuses() {
        assert_eq!(
            status_of(InventoryError::validation("bad")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(InventoryError::duplicate("B1")),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(InventoryError::not_found("111")),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(InventoryError::InsufficientStock {
                requested: 5,
                available: 1
            }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(InventoryError::Conflict {
                entity: "inbound/111".to_string()
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(InventoryError::Internal("boom".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_move_errors_map_through() {
        assert_eq!(
            status_of(MoveError::Inventory(InventoryError::not_found("B9"))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(MoveError::CompensationFailed {
                placement: InventoryError::Internal("a".to_string()),
                compensation: InventoryError::Internal("b".to_string()),
            }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_report_setting_is_bad_request() {
        assert_eq!(
            status_of(ReportError::InvalidSetting("fraction".to_string())),
            StatusCode::BAD_REQUEST
        );
    }
}
