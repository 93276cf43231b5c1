//! Webhook ingress — provider verification handshake and event delivery.

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::event::WebhookEnvelope;
use crate::http::AppState;

/// Query parameters of the provider's subscription handshake.
#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    #[serde(rename = "hub.mode")]
    mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    challenge: Option<String>,
}

/// GET /webhook — echo the challenge iff the shared token matches.
pub async fn verify(
    State(state): State<AppState>,
    Query(params): Query<VerifyParams>,
) -> impl IntoResponse {
    let subscribed = params.mode.as_deref() == Some("subscribe")
        && params.verify_token.as_deref() == Some(state.verify_token.as_str());

    if subscribed {
        (StatusCode::OK, params.challenge.unwrap_or_default())
    } else {
        (StatusCode::FORBIDDEN, "Verification failed".to_string())
    }
}

/// POST /webhook — always 200, immediately. Reconciliation happens off the
/// request path; the provider must not retry on application failures.
pub async fn receive(State(state): State<AppState>, body: Bytes) -> StatusCode {
    match serde_json::from_slice::<WebhookEnvelope>(&body) {
        Ok(envelope) => {
            if let Some(event) = envelope.into_event() {
                if state.events.send(event).is_err() {
                    warn!("Reconcile worker is gone; dropping event");
                }
            } else {
                // Status-only deliveries carry no message. Routine.
                debug!("Webhook delivery without messages, ignored");
            }
        }
        Err(e) => warn!(error = %e, "Unparseable webhook payload ignored"),
    }
    StatusCode::OK
}
