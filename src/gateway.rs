//! Messaging Gateway Client — sends WhatsApp texts via the Cloud API.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};

use crate::error::GatewayError;

const GRAPH_API_BASE: &str = "https://graph.facebook.com/v19.0";

/// Upper bound for a single send.
const SEND_TIMEOUT: Duration = Duration::from_secs(20);

/// Strip everything but digits. The provider rejects `+`, spaces and dashes.
pub fn normalize_address(address: &str) -> String {
    address.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Outbound message transport.
#[async_trait]
pub trait MessageGateway: Send + Sync {
    /// Send a text message, returning the provider's response payload.
    async fn send_text(&self, destination: &str, body: &str) -> Result<Value, GatewayError>;
}

/// WhatsApp Cloud API implementation.
pub struct CloudApiGateway {
    http: reqwest::Client,
    messages_url: String,
    access_token: SecretString,
}

impl CloudApiGateway {
    pub fn new(phone_number_id: &str, access_token: SecretString) -> Self {
        Self::with_base_url(GRAPH_API_BASE, phone_number_id, access_token)
    }

    /// Base URL override for tests.
    pub fn with_base_url(base: &str, phone_number_id: &str, access_token: SecretString) -> Self {
        Self {
            http: reqwest::Client::new(),
            messages_url: format!("{}/{}/messages", base.trim_end_matches('/'), phone_number_id),
            access_token,
        }
    }
}

#[async_trait]
impl MessageGateway for CloudApiGateway {
    async fn send_text(&self, destination: &str, body: &str) -> Result<Value, GatewayError> {
        let payload = json!({
            "messaging_product": "whatsapp",
            "to": normalize_address(destination),
            "type": "text",
            "text": { "body": body },
        });

        let response = self
            .http
            .post(&self.messages_url)
            .bearer_auth(self.access_token.expose_secret())
            .timeout(SEND_TIMEOUT)
            .json(&payload)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;

    use super::*;

    #[test]
    fn normalize_strips_non_digits() {
        assert_eq!(normalize_address("+57 300-111-2233"), "573001112233");
        assert_eq!(normalize_address("573001112233"), "573001112233");
        assert_eq!(normalize_address(""), "");
    }

    #[tokio::test]
    async fn send_posts_normalized_payload() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/12345/messages")
            .match_header("authorization", "Bearer token-abc")
            .match_body(Matcher::PartialJson(json!({
                "messaging_product": "whatsapp",
                "to": "573001112233",
                "type": "text",
                "text": { "body": "Hola" },
            })))
            .with_body(json!({ "messages": [{ "id": "wamid.out" }] }).to_string())
            .create_async()
            .await;

        let gateway =
            CloudApiGateway::with_base_url(&server.url(), "12345", SecretString::from("token-abc"));
        let response = gateway.send_text("+573001112233", "Hola").await.unwrap();
        assert_eq!(response["messages"][0]["id"], "wamid.out");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_success_status_is_rejected() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/12345/messages")
            .with_status(401)
            .with_body("bad token")
            .create_async()
            .await;

        let gateway =
            CloudApiGateway::with_base_url(&server.url(), "12345", SecretString::from("nope"));
        let err = gateway.send_text("57300", "Hola").await.unwrap_err();
        match err {
            GatewayError::Rejected { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "bad token");
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
    }
}
