//! JSON-RPC implementation of the remote object protocol.
//!
//! Speaks the CRM's two services: `common.authenticate` for login and
//! `object.execute_kw` for everything else. One uid is cached for the
//! process lifetime; the cache lock is held across authentication so
//! concurrent first callers collapse into a single login instead of racing.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::Mutex;

use crate::crm::{ObjectClient, SearchOptions};
use crate::error::CrmError;

/// Upper bound for a single call to the CRM.
const CALL_TIMEOUT: Duration = Duration::from_secs(20);

/// Client for the CRM's JSON-RPC endpoint.
pub struct JsonRpcClient {
    http: reqwest::Client,
    endpoint: String,
    db: String,
    user: String,
    api_key: SecretString,
    /// Cached session uid. `None` until the first successful login.
    uid: Mutex<Option<i64>>,
    next_id: AtomicU64,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

impl JsonRpcClient {
    pub fn new(base_url: &str, db: &str, user: &str, api_key: SecretString) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: format!("{}/jsonrpc", base_url.trim_end_matches('/')),
            db: db.to_string(),
            user: user.to_string(),
            api_key,
            uid: Mutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    /// Issue one raw JSON-RPC call.
    async fn rpc(&self, service: &str, method: &str, args: Value) -> Result<Value, CrmError> {
        let payload = json!({
            "jsonrpc": "2.0",
            "method": "call",
            "params": {
                "service": service,
                "method": method,
                "args": args,
            },
            "id": self.next_id.fetch_add(1, Ordering::Relaxed),
        });

        let response = self
            .http
            .post(&self.endpoint)
            .timeout(CALL_TIMEOUT)
            .json(&payload)
            .send()
            .await
            .map_err(|e| CrmError::Transport(e.to_string()))?;

        let body: RpcResponse = response
            .json()
            .await
            .map_err(|e| CrmError::Transport(e.to_string()))?;

        if let Some(error) = body.error {
            return Err(CrmError::Remote(error));
        }
        body.result.ok_or_else(|| {
            CrmError::Protocol("response carried neither result nor error".to_string())
        })
    }

    /// Return the cached uid, authenticating on first use.
    async fn uid(&self) -> Result<i64, CrmError> {
        let mut guard = self.uid.lock().await;
        if let Some(uid) = *guard {
            return Ok(uid);
        }

        let result = self
            .rpc(
                "common",
                "authenticate",
                json!([self.db, self.user, self.api_key.expose_secret(), {}]),
            )
            .await?;

        // A failed login comes back as `false`, not as an error envelope.
        let uid = result.as_i64().filter(|id| *id > 0).ok_or(CrmError::Auth)?;
        *guard = Some(uid);
        tracing::info!(uid, "Authenticated against CRM");
        Ok(uid)
    }

    /// Call a method on a named collection via `object.execute_kw`.
    async fn execute_kw(
        &self,
        collection: &str,
        method: &str,
        args: Value,
        kwargs: Value,
    ) -> Result<Value, CrmError> {
        let uid = self.uid().await?;
        self.rpc(
            "object",
            "execute_kw",
            json!([
                self.db,
                uid,
                self.api_key.expose_secret(),
                collection,
                method,
                args,
                kwargs,
            ]),
        )
        .await
    }
}

#[async_trait]
impl ObjectClient for JsonRpcClient {
    async fn search(
        &self,
        collection: &str,
        domain: Value,
        options: SearchOptions,
    ) -> Result<Vec<i64>, CrmError> {
        let mut kwargs = serde_json::Map::new();
        if let Some(limit) = options.limit {
            kwargs.insert("limit".to_string(), json!(limit));
        }
        if let Some(order) = &options.order {
            kwargs.insert("order".to_string(), json!(order));
        }

        let result = self
            .execute_kw(collection, "search", json!([domain]), Value::Object(kwargs))
            .await?;

        result
            .as_array()
            .map(|ids| ids.iter().filter_map(Value::as_i64).collect())
            .ok_or_else(|| {
                CrmError::Protocol(format!("search on {collection} did not return an id list"))
            })
    }

    async fn create(&self, collection: &str, values: Value) -> Result<i64, CrmError> {
        let result = self
            .execute_kw(collection, "create", json!([values]), json!({}))
            .await?;

        result.as_i64().ok_or_else(|| {
            CrmError::Protocol(format!("create on {collection} did not return an id"))
        })
    }

    async fn write(&self, collection: &str, ids: &[i64], values: Value) -> Result<(), CrmError> {
        self.execute_kw(collection, "write", json!([ids, values]), json!({}))
            .await?;
        Ok(())
    }
}
