//! # WebSocket Endpoint
//!
//! `GET /ws` with an `Email` header. The email is resolved to a signer key
//! before the upgrade; the upgraded socket becomes one hub connection for
//! that signer.

use axum::{
    extract::{ws::WebSocketUpgrade, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use cl_01_document_lifecycle::{LifecycleError, SignerDirectory};
use cl_02_notification_hub::{adapters::serve_socket, FanoutHub, HubError};
use shared_types::UserId;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const WS_PATH: &str = "/ws";
pub const EMAIL_HEADER: &str = "Email";

#[derive(Clone)]
pub struct EndpointState {
    pub directory: Arc<dyn SignerDirectory>,
    pub hub: Arc<FanoutHub>,
}

/// Why an upgrade request was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    MissingEmail,
    UnknownSigner,
    DirectoryUnavailable,
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Rejection::MissingEmail => (StatusCode::BAD_REQUEST, "Email header required"),
            Rejection::UnknownSigner => (StatusCode::FORBIDDEN, "Unknown signer"),
            Rejection::DirectoryUnavailable => {
                (StatusCode::SERVICE_UNAVAILABLE, "Signer directory unavailable")
            }
        };
        (status, message).into_response()
    }
}

/// Resolve the caller from the `Email` header.
pub async fn authenticate(
    directory: &dyn SignerDirectory,
    headers: &HeaderMap,
) -> Result<UserId, Rejection> {
    let email = headers
        .get(EMAIL_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|email| !email.is_empty())
        .ok_or(Rejection::MissingEmail)?;

    match directory.resolve(email).await {
        Ok(user_id) => Ok(user_id),
        Err(LifecycleError::NotFound { .. }) | Err(LifecycleError::InvalidInput { .. }) => {
            debug!(email, "Rejected connection for unknown signer");
            Err(Rejection::UnknownSigner)
        }
        Err(err) => {
            warn!(error = %err, "Signer directory lookup failed");
            Err(Rejection::DirectoryUnavailable)
        }
    }
}

pub fn router(state: EndpointState) -> Router {
    Router::new()
        .route(WS_PATH, get(upgrade))
        .with_state(state)
}

async fn upgrade(
    State(state): State<EndpointState>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    let user_id = match authenticate(state.directory.as_ref(), &headers).await {
        Ok(user_id) => user_id,
        Err(rejection) => return rejection.into_response(),
    };

    let hub = Arc::clone(&state.hub);
    ws.on_upgrade(move |socket| async move {
        match serve_socket(hub, user_id.clone(), socket).await {
            Ok(summary) => info!(
                user_id = %user_id,
                sent = summary.sent,
                received = summary.received,
                "WebSocket session closed"
            ),
            Err(HubError::TooManyConnections { limit, .. }) => {
                warn!(user_id = %user_id, limit, "Connection refused, per-user limit reached")
            }
            Err(err) => warn!(user_id = %user_id, error = %err, "WebSocket session failed"),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use cl_01_document_lifecycle::InMemorySignerDirectory;
    use shared_types::SignerKey;

    fn directory() -> InMemorySignerDirectory {
        InMemorySignerDirectory::new().with_entry("ada@example.com", SignerKey::new("ada-key"))
    }

    fn headers(email: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(EMAIL_HEADER, HeaderValue::from_str(email).unwrap());
        headers
    }

    #[tokio::test]
    async fn test_authenticate_resolves_signer_key() {
        let user = authenticate(&directory(), &headers("Ada@Example.com")).await;
        assert_eq!(user, Ok(SignerKey::new("ada-key")));
    }

    #[tokio::test]
    async fn test_missing_or_blank_email() {
        assert_eq!(
            authenticate(&directory(), &HeaderMap::new()).await,
            Err(Rejection::MissingEmail)
        );
        assert_eq!(
            authenticate(&directory(), &headers("   ")).await,
            Err(Rejection::MissingEmail)
        );
    }

    #[tokio::test]
    async fn test_unknown_email() {
        assert_eq!(
            authenticate(&directory(), &headers("eve@example.com")).await,
            Err(Rejection::UnknownSigner)
        );
    }

    #[test]
    fn test_rejection_status_codes() {
        assert_eq!(
            Rejection::MissingEmail.into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Rejection::UnknownSigner.into_response().status(),
            StatusCode::FORBIDDEN
        );
    }
}
