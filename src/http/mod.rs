//! HTTP surface — webhook ingress and the operator send endpoint.

mod send;
mod webhook;

use axum::Router;
use axum::routing::get;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::error;

use crate::config::Config;
use crate::event::InboundEvent;
use crate::reconcile::Reconciler;
use crate::relay::Relay;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    verify_token: String,
    events: mpsc::UnboundedSender<InboundEvent>,
    relay: Arc<Relay>,
}

/// Build the router and spawn the reconciliation worker behind it.
pub fn app(config: &Config, reconciler: Reconciler, relay: Arc<Relay>) -> Router {
    let (events, rx) = mpsc::unbounded_channel();
    spawn_reconcile_worker(reconciler, rx);

    let state = AppState {
        verify_token: config.verify_token.clone(),
        events,
        relay,
    };

    Router::new()
        .route("/", get(health))
        .route("/webhook", get(webhook::verify).post(webhook::receive))
        .route("/send", get(send::form).post(send::submit))
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

/// Drains events acknowledged by the webhook handler. Failures are logged
/// and the event is dropped — the provider already got its 200 and must
/// never be told to retry for an application-level failure.
fn spawn_reconcile_worker(
    reconciler: Reconciler,
    mut rx: mpsc::UnboundedReceiver<InboundEvent>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if let Err(e) = reconciler.reconcile(&event).await {
                error!(
                    message_id = %event.external_message_id,
                    error = %e,
                    "Reconciliation failed; event dropped"
                );
            }
        }
    })
}
