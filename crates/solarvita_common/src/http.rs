// --- File: crates/solarvita_common/src/http.rs ---
//! Axum glue for the callable protocol.
//!
//! Callables answer `{"result": ...}` on success and
//! `{"error": {"status": ..., "message": ...}}` on failure.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{HttpStatusCode, SolarvitaError};

/// Request body of a callable: the arguments are wrapped in `data`.
#[derive(Debug, Deserialize)]
pub struct CallableRequest<T> {
    pub data: T,
}

/// Success body of a callable.
#[derive(Debug, Serialize)]
pub struct CallableResponse<T> {
    pub result: T,
}

impl<T: Serialize> CallableResponse<T> {
    pub fn new(result: T) -> Self {
        Self { result }
    }
}

impl<T: Serialize> IntoResponse for CallableResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

impl IntoResponse for SolarvitaError {
    fn into_response(self) -> Response {
        let status_code =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let body = Json(json!({
            "error": {
                "status": self.callable_status(),
                "message": self.client_message(),
            }
        }));

        (status_code, body).into_response()
    }
}
