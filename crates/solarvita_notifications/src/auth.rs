// --- File: crates/solarvita_notifications/src/auth.rs ---

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use constant_time_eq::constant_time_eq;
use solarvita_common::{unauthenticated, CallerIdentity, SolarvitaError};
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::handlers::NotificationState;

pub const TRIGGER_SECRET_HEADER: &str = "X-Trigger-Secret";

/// The verified caller of a callable, if the request carried an ID token.
///
/// A missing `Authorization` header yields `Caller(None)` and the operation
/// decides; a token that fails verification rejects the request.
#[derive(Debug, Clone)]
pub struct Caller(pub Option<CallerIdentity>);

impl Caller {
    pub fn identity(&self) -> Option<&CallerIdentity> {
        self.0.as_ref()
    }
}

impl FromRequestParts<Arc<NotificationState>> for Caller {
    type Rejection = SolarvitaError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<NotificationState>,
    ) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(header::AUTHORIZATION) else {
            return Ok(Caller(None));
        };

        let id_token = value
            .to_str()
            .ok()
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| unauthenticated("Malformed Authorization header"))?;

        let identity = state.verifier.verify(id_token).await.map_err(|err| {
            debug!(error = %err, "Rejected ID token");
            err
        })?;
        Ok(Caller(Some(identity)))
    }
}

/// Shared secret expected from the hosting platform on trigger endpoints.
#[derive(Clone)]
pub struct TriggerAuthState {
    pub shared_secret: Option<String>,
}

/// Checks the `X-Trigger-Secret` header against the configured secret.
pub async fn trigger_auth_middleware(
    State(auth_state): State<Arc<TriggerAuthState>>,
    req: Request,
    next: Next,
) -> Response {
    let Some(expected) = auth_state.shared_secret.as_deref().filter(|s| !s.is_empty()) else {
        error!("Trigger shared secret is not configured");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Server configuration error for trigger auth.",
        )
            .into_response();
    };

    let provided = req
        .headers()
        .get(TRIGGER_SECRET_HEADER)
        .and_then(|value| value.to_str().ok());

    match provided {
        Some(provided) if constant_time_eq(provided.as_bytes(), expected.as_bytes()) => {
            next.run(req).await
        }
        Some(_) => {
            warn!("Trigger request with invalid secret");
            unauthenticated("Invalid trigger secret").into_response()
        }
        None => {
            warn!("Trigger request without {} header", TRIGGER_SECRET_HEADER);
            unauthenticated(format!("Missing {} header", TRIGGER_SECRET_HEADER)).into_response()
        }
    }
}
