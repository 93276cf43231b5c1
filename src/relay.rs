//! Outbound relay — sends an operator message and mirrors it into the CRM.

use std::sync::Arc;

use serde_json::json;
use tracing::{info, warn};

use crate::crm::{DEALS, MESSAGES, ObjectClient};
use crate::error::RelayError;
use crate::gateway::MessageGateway;

/// An operator-submitted outbound message.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub secret: String,
    pub destination: String,
    pub body: String,
    /// Deal to mirror the send into, if any.
    pub deal_id: Option<i64>,
}

/// Sends through the gateway, then best-effort logs into the CRM.
pub struct Relay {
    gateway: Arc<dyn MessageGateway>,
    crm: Arc<dyn ObjectClient>,
    send_secret: String,
}

impl Relay {
    pub fn new(gateway: Arc<dyn MessageGateway>, crm: Arc<dyn ObjectClient>, send_secret: String) -> Self {
        Self {
            gateway,
            crm,
            send_secret,
        }
    }

    /// Check an operator-supplied secret against the configured one.
    pub fn authorize(&self, secret: &str) -> Result<(), RelayError> {
        if secret == self.send_secret {
            Ok(())
        } else {
            Err(RelayError::Unauthorized)
        }
    }

    /// Send the message, then append an audit entry to the referenced deal.
    ///
    /// A failed audit write must not flip the operation into a failure:
    /// the message already left through the gateway.
    pub async fn relay(&self, request: &OutboundRequest) -> Result<(), RelayError> {
        self.authorize(&request.secret)?;
        if request.destination.is_empty() {
            return Err(RelayError::InvalidInput("phone"));
        }
        if request.body.is_empty() {
            return Err(RelayError::InvalidInput("message"));
        }

        let response = self
            .gateway
            .send_text(&request.destination, &request.body)
            .await?;
        info!(destination = %request.destination, "Outbound message sent");

        if let Some(deal_id) = request.deal_id {
            let entry = json!({
                "model": DEALS,
                "res_id": deal_id,
                "message_type": "comment",
                "body": format!(
                    "WhatsApp sent to {}: {}<br/><small>Provider: {}</small>",
                    request.destination, request.body, response
                ),
            });
            if let Err(e) = self.crm.create(MESSAGES, entry).await {
                warn!(deal_id, error = %e, "Failed to mirror outbound message into CRM");
            }
        }
        Ok(())
    }
}
