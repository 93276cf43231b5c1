//! Reconciliation engine — maps inbound events onto CRM records.
//!
//! Guarantees at-most-once application per external message id via a
//! search-before-create check on the message log. That check and the final
//! log create are not transactional: two near-simultaneous deliveries of
//! the same id can both pass the check and leave duplicate records. Known
//! race, accepted — the provider rarely double-delivers and the CRM schema
//! is not ours to put a uniqueness constraint on.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info};

use crate::crm::{CONTACTS, DEALS, MESSAGES, ObjectClient, SearchOptions};
use crate::error::CrmError;
use crate::event::InboundEvent;

/// Reconciliation settings.
#[derive(Debug, Clone)]
pub struct ReconcileConfig {
    /// Sales team assigned to every deal this bridge touches.
    pub team_id: i64,
}

/// Maps one inbound event onto a contact, an open deal and a log entry.
pub struct Reconciler {
    crm: Arc<dyn ObjectClient>,
    config: ReconcileConfig,
}

impl Reconciler {
    pub fn new(crm: Arc<dyn ObjectClient>, config: ReconcileConfig) -> Self {
        Self { crm, config }
    }

    /// Apply one inbound event to the CRM.
    ///
    /// The provider already received its 200 by the time this runs; the
    /// caller logs any error and drops the event. Re-delivery of the same
    /// external id redoes the work safely.
    pub async fn reconcile(&self, event: &InboundEvent) -> Result<(), CrmError> {
        // Malformed or non-message payloads are routine, not errors.
        if event.sender_address.is_empty() || event.external_message_id.is_empty() {
            debug!("Ignoring event without sender address or message id");
            return Ok(());
        }

        if self.already_logged(&event.external_message_id).await? {
            debug!(
                message_id = %event.external_message_id,
                "Duplicate delivery, skipping"
            );
            return Ok(());
        }

        let phone = format!("+{}", event.sender_address);
        let display_name = event.sender_display_name.as_deref();

        let contact_id = self.resolve_contact(&phone, display_name).await?;
        let deal_id = self
            .resolve_deal(contact_id, &phone, display_name, &event.text)
            .await?;
        self.append_log(deal_id, contact_id, &phone, event).await?;

        info!(
            message_id = %event.external_message_id,
            contact_id,
            deal_id,
            "Reconciled inbound message"
        );
        Ok(())
    }

    /// Has this external id already been applied?
    async fn already_logged(&self, external_id: &str) -> Result<bool, CrmError> {
        let existing = self
            .crm
            .search(
                MESSAGES,
                json!([["message_id", "=", external_id]]),
                SearchOptions::default().limit(1),
            )
            .await?;
        Ok(!existing.is_empty())
    }

    /// Find the contact for a phone address, creating it on first contact.
    /// First match wins; the CRM does not enforce phone uniqueness.
    async fn resolve_contact(
        &self,
        phone: &str,
        display_name: Option<&str>,
    ) -> Result<i64, CrmError> {
        let found = self
            .crm
            .search(
                CONTACTS,
                json!([["phone", "=", phone]]),
                SearchOptions::default().limit(1),
            )
            .await?;
        if let Some(&id) = found.first() {
            return Ok(id);
        }

        let name = display_name
            .map(str::to_string)
            .unwrap_or_else(|| format!("WhatsApp {phone}"));
        self.crm
            .create(CONTACTS, json!({ "name": name, "phone": phone }))
            .await
    }

    /// Reuse the newest open deal for the contact, or create a fresh one.
    /// "Open" = active and not yet won.
    async fn resolve_deal(
        &self,
        contact_id: i64,
        phone: &str,
        display_name: Option<&str>,
        description: &str,
    ) -> Result<i64, CrmError> {
        let found = self
            .crm
            .search(
                DEALS,
                json!([
                    ["partner_id", "=", contact_id],
                    ["active", "=", true],
                    ["probability", "<", 100],
                ]),
                SearchOptions::default().limit(1).order("id desc"),
            )
            .await?;

        if let Some(&id) = found.first() {
            // Re-assert team ownership on every inbound message, even if the
            // deal was reassigned elsewhere.
            self.crm
                .write(DEALS, &[id], json!({ "team_id": self.config.team_id }))
                .await?;
            return Ok(id);
        }

        self.crm
            .create(
                DEALS,
                json!({
                    "name": format!("WhatsApp: {}", display_name.unwrap_or(phone)),
                    "partner_id": contact_id,
                    "phone": phone,
                    "team_id": self.config.team_id,
                    "description": description,
                }),
            )
            .await
    }

    /// Append the message to the deal's activity stream, carrying the
    /// external id as the idempotency marker.
    async fn append_log(
        &self,
        deal_id: i64,
        contact_id: i64,
        phone: &str,
        event: &InboundEvent,
    ) -> Result<(), CrmError> {
        self.crm
            .create(
                MESSAGES,
                json!({
                    "model": DEALS,
                    "res_id": deal_id,
                    "message_type": "comment",
                    "body": format!("WhatsApp ({phone}): {}", event.body_text()),
                    "author_id": contact_id,
                    "message_id": event.external_message_id,
                }),
            )
            .await?;
        Ok(())
    }
}
