use std::sync::Arc;

use wa_crm_bridge::config::Config;
use wa_crm_bridge::crm::ObjectClient;
use wa_crm_bridge::crm::jsonrpc::JsonRpcClient;
use wa_crm_bridge::gateway::{CloudApiGateway, MessageGateway};
use wa_crm_bridge::http;
use wa_crm_bridge::reconcile::{ReconcileConfig, Reconciler};
use wa_crm_bridge::relay::Relay;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = Config::from_env()?;

    let crm: Arc<dyn ObjectClient> = Arc::new(JsonRpcClient::new(
        &config.odoo_url,
        &config.odoo_db,
        &config.odoo_user,
        config.odoo_api_key.clone(),
    ));
    let gateway: Arc<dyn MessageGateway> = Arc::new(CloudApiGateway::new(
        &config.wa_phone_number_id,
        config.wa_access_token.clone(),
    ));

    let reconciler = Reconciler::new(
        Arc::clone(&crm),
        ReconcileConfig {
            team_id: config.team_id,
        },
    );
    let relay = Arc::new(Relay::new(gateway, crm, config.send_secret.clone()));

    let app = http::app(&config, reconciler, relay);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "Listening");
    axum::serve(listener, app).await?;
    Ok(())
}
