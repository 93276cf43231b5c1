//! Inbound event shape and the provider's webhook envelope.

use serde::Deserialize;

/// Kind of inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageKind {
    Text,
    /// Any non-text type, carrying the provider's type tag (image, audio...).
    Other(String),
}

/// A parsed inbound messaging event. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct InboundEvent {
    /// Channel-specific sender id, digits only (e.g. `573001112233`).
    pub sender_address: String,
    /// Provider-assigned unique message id — the idempotency key.
    pub external_message_id: String,
    pub kind: MessageKind,
    pub text: String,
    pub sender_display_name: Option<String>,
}

impl InboundEvent {
    /// Body text for the CRM log: the literal message text, or a typed
    /// placeholder for anything we don't download.
    pub fn body_text(&self) -> String {
        match &self.kind {
            MessageKind::Text => self.text.clone(),
            MessageKind::Other(kind) => format!("[{kind}] non-text message received."),
        }
    }
}

// ── Webhook envelope ────────────────────────────────────────────────────

/// Top level of the provider's webhook POST body.
#[derive(Debug, Deserialize)]
pub struct WebhookEnvelope {
    #[serde(default)]
    pub entry: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
pub struct Entry {
    #[serde(default)]
    pub changes: Vec<Change>,
}

#[derive(Debug, Deserialize)]
pub struct Change {
    #[serde(default)]
    pub value: ChangeValue,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChangeValue {
    #[serde(default)]
    pub messages: Vec<RawMessage>,
    #[serde(default)]
    pub contacts: Vec<RawContact>,
}

#[derive(Debug, Deserialize)]
pub struct RawMessage {
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    pub text: Option<TextBody>,
}

#[derive(Debug, Deserialize)]
pub struct TextBody {
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct RawContact {
    pub profile: Option<Profile>,
}

#[derive(Debug, Deserialize)]
pub struct Profile {
    pub name: Option<String>,
}

impl WebhookEnvelope {
    /// Extract the first message of the first change of the first entry.
    ///
    /// Status-only deliveries (no `messages`) yield `None`.
    pub fn into_event(self) -> Option<InboundEvent> {
        let value = self
            .entry
            .into_iter()
            .next()?
            .changes
            .into_iter()
            .next()?
            .value;

        let display_name = value
            .contacts
            .into_iter()
            .next()
            .and_then(|c| c.profile)
            .and_then(|p| p.name)
            .filter(|n| !n.is_empty());

        let message = value.messages.into_iter().next()?;
        let kind = if message.kind == "text" {
            MessageKind::Text
        } else {
            MessageKind::Other(message.kind)
        };

        Some(InboundEvent {
            sender_address: message.from,
            external_message_id: message.id,
            kind,
            text: message.text.map(|t| t.body).unwrap_or_default(),
            sender_display_name: display_name,
        })
    }
}
