//! In-memory `ObjectClient` used by engine tests.
//!
//! Understands just enough of the domain syntax the engines emit: a
//! conjunction of `[field, op, value]` clauses with `=` and `<` operators.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::crm::{ObjectClient, SearchOptions};
use crate::error::CrmError;

#[derive(Debug, Clone)]
struct Record {
    collection: String,
    id: i64,
    values: Value,
}

#[derive(Default)]
struct FakeState {
    next_id: i64,
    records: Vec<Record>,
}

/// In-memory CRM backend.
#[derive(Default)]
pub struct FakeCrm {
    state: Mutex<FakeState>,
}

impl FakeCrm {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState {
                next_id: 1,
                records: Vec::new(),
            }),
        }
    }

    /// Insert a record with known values, returning its id.
    pub fn seed(&self, collection: &str, values: Value) -> i64 {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id;
        state.next_id += 1;
        state.records.push(Record {
            collection: collection.to_string(),
            id,
            values,
        });
        id
    }

    /// All record values in a collection, in insertion order.
    pub fn records_in(&self, collection: &str) -> Vec<Value> {
        let state = self.state.lock().unwrap();
        state
            .records
            .iter()
            .filter(|r| r.collection == collection)
            .map(|r| r.values.clone())
            .collect()
    }

    /// Values of one record, if it exists.
    pub fn record(&self, collection: &str, id: i64) -> Option<Value> {
        let state = self.state.lock().unwrap();
        state
            .records
            .iter()
            .find(|r| r.collection == collection && r.id == id)
            .map(|r| r.values.clone())
    }
}

/// Unset fields fall back to the CRM's defaults for the fields the engines
/// filter on.
fn field_default(field: &str) -> Value {
    match field {
        "active" => json!(true),
        "probability" => json!(0),
        _ => Value::Null,
    }
}

fn matches(values: &Value, domain: &Value) -> bool {
    let Some(clauses) = domain.as_array() else {
        return false;
    };
    clauses.iter().all(|clause| {
        let Some(parts) = clause.as_array() else {
            return false;
        };
        let (Some(field), Some(op)) = (parts[0].as_str(), parts[1].as_str()) else {
            return false;
        };
        let expected = &parts[2];
        let actual = values.get(field).cloned().unwrap_or_else(|| field_default(field));
        match op {
            "=" => &actual == expected,
            "<" => match (actual.as_f64(), expected.as_f64()) {
                (Some(a), Some(b)) => a < b,
                _ => false,
            },
            _ => false,
        }
    })
}

#[async_trait]
impl ObjectClient for FakeCrm {
    async fn search(
        &self,
        collection: &str,
        domain: Value,
        options: SearchOptions,
    ) -> Result<Vec<i64>, CrmError> {
        let state = self.state.lock().unwrap();
        let mut ids: Vec<i64> = state
            .records
            .iter()
            .filter(|r| r.collection == collection && matches(&r.values, &domain))
            .map(|r| r.id)
            .collect();
        if options.order.as_deref() == Some("id desc") {
            ids.reverse();
        }
        if let Some(limit) = options.limit {
            ids.truncate(limit as usize);
        }
        Ok(ids)
    }

    async fn create(&self, collection: &str, values: Value) -> Result<i64, CrmError> {
        Ok(self.seed(collection, values))
    }

    async fn write(&self, collection: &str, ids: &[i64], values: Value) -> Result<(), CrmError> {
        let mut state = self.state.lock().unwrap();
        for record in state
            .records
            .iter_mut()
            .filter(|r| r.collection == collection && ids.contains(&r.id))
        {
            if let (Some(target), Some(updates)) = (record.values.as_object_mut(), values.as_object())
            {
                for (key, value) in updates {
                    target.insert(key.clone(), value.clone());
                }
            }
        }
        Ok(())
    }
}
