//! Response mapping.
//!
//! # Responsibilities
//! - Map operation errors to HTTP status codes and bodies
//! - Pin the status returned by a successful delete
//!
//! # Status Codes
//! - `NotFound` → 404 `Todo not found`
//! - `Internal` → 500
//! - successful delete → 204 with an empty body. One reference service
//!   answered with the literal `24` here, which is not a valid HTTP status;
//!   the tests below keep both values on record.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::observability::OperationError;

/// Status for a successful `DELETE /todos/{id}`.
pub const DELETE_SUCCESS_STATUS: StatusCode = StatusCode::NO_CONTENT;

/// Status code a reference implementation returned after a delete.
pub const OBSERVED_DELETE_STATUS: u16 = 24;

/// Body sent with a 404.
pub const NOT_FOUND_BODY: &str = "Todo not found";

impl IntoResponse for OperationError {
    fn into_response(self) -> Response {
        match self {
            OperationError::NotFound(_) => (StatusCode::NOT_FOUND, NOT_FOUND_BODY).into_response(),
            OperationError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}
