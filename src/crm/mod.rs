//! Remote Object Client — generic calls against the CRM's named collections.
//!
//! No business knowledge lives here; the engines decide which collections
//! and domains to use. The trait seam exists so the engines can be tested
//! against an in-memory backend.

pub mod jsonrpc;

#[cfg(test)]
pub mod fake;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::CrmError;

/// Contact collection (`res.partner`).
pub const CONTACTS: &str = "res.partner";
/// Deal / lead collection (`crm.lead`).
pub const DEALS: &str = "crm.lead";
/// Message log collection (`mail.message`).
pub const MESSAGES: &str = "mail.message";

/// Options for a `search` call.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub limit: Option<u32>,
    pub order: Option<String>,
}

impl SearchOptions {
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn order(mut self, order: &str) -> Self {
        self.order = Some(order.to_string());
        self
    }
}

/// Generic call surface over the CRM's remote object protocol.
#[async_trait]
pub trait ObjectClient: Send + Sync {
    /// Search a collection, returning matching record ids.
    async fn search(
        &self,
        collection: &str,
        domain: Value,
        options: SearchOptions,
    ) -> Result<Vec<i64>, CrmError>;

    /// Create a record, returning its CRM-assigned id.
    async fn create(&self, collection: &str, values: Value) -> Result<i64, CrmError>;

    /// Overwrite fields on existing records.
    async fn write(&self, collection: &str, ids: &[i64], values: Value) -> Result<(), CrmError>;
}
