//! Operator send endpoint — a small HTML form plus the submit handler.

use axum::Form;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use serde::Deserialize;
use tracing::error;

use crate::error::RelayError;
use crate::http::AppState;
use crate::relay::OutboundRequest;

/// Query parameters for pre-filling the form.
#[derive(Debug, Deserialize)]
pub struct FormParams {
    #[serde(default)]
    secret: String,
    deal_id: Option<i64>,
    phone: Option<String>,
}

/// Fields of the submitted form.
#[derive(Debug, Deserialize)]
pub struct SendForm {
    #[serde(default)]
    secret: String,
    #[serde(default)]
    deal_id: String,
    #[serde(default)]
    phone: String,
    #[serde(default)]
    message: String,
}

/// GET /send — render the operator form behind the shared secret.
pub async fn form(State(state): State<AppState>, Query(params): Query<FormParams>) -> Response {
    if state.relay.authorize(&params.secret).is_err() {
        return (StatusCode::FORBIDDEN, "Forbidden").into_response();
    }

    let deal_id = params.deal_id.map(|id| id.to_string()).unwrap_or_default();
    let phone = params.phone.unwrap_or_default();
    Html(render_form(&params.secret, &deal_id, &phone)).into_response()
}

/// POST /send — relay the message, mapping relay errors to status codes.
pub async fn submit(State(state): State<AppState>, Form(form): Form<SendForm>) -> Response {
    let request = OutboundRequest {
        secret: form.secret.clone(),
        destination: form.phone.clone(),
        body: form.message,
        deal_id: form.deal_id.trim().parse().ok(),
    };

    match state.relay.relay(&request).await {
        Ok(()) => Html(format!(
            "<p>Message sent.</p>\
             <p><a href=\"/send?secret={}&deal_id={}&phone={}\">Send another</a></p>",
            form.secret,
            form.deal_id,
            form.phone.replace('+', "%2B"),
        ))
        .into_response(),
        Err(RelayError::Unauthorized) => (StatusCode::FORBIDDEN, "Forbidden").into_response(),
        Err(e @ RelayError::InvalidInput(_)) => {
            (StatusCode::BAD_REQUEST, e.to_string()).into_response()
        }
        Err(RelayError::Gateway(e)) => {
            error!(error = %e, "Outbound send failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to send message. Check logs.",
            )
                .into_response()
        }
    }
}

fn render_form(secret: &str, deal_id: &str, phone: &str) -> String {
    format!(
        r#"<html>
  <body style="font-family: Arial; max-width: 720px; margin: 24px auto;">
    <h2>Send WhatsApp</h2>
    <form method="POST" action="/send">
      <input type="hidden" name="secret" value="{secret}" />
      <label>Deal ID (optional)</label><br/>
      <input name="deal_id" value="{deal_id}" style="width: 100%; padding: 8px;" /><br/><br/>

      <label>Phone (E.164, e.g. +573001112233)</label><br/>
      <input name="phone" value="{phone}" style="width: 100%; padding: 8px;" /><br/><br/>

      <label>Message</label><br/>
      <textarea name="message" rows="6" style="width: 100%; padding: 8px;"></textarea><br/><br/>

      <button type="submit" style="padding: 10px 16px;">Send</button>
    </form>
  </body>
</html>"#
    )
}
