//! In-memory storage used for the default models and the default token storage

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use tracing::debug;

use super::Storage;
use crate::model::{ID_FIELD, Identity, ModelId, Record};
use crate::{Error, Result};

/// Thread-safe in-memory storage keyed by a configurable id field.
///
/// Records without an id get a random UUID on their first `update`.
pub struct MemoryStorage {
    model: ModelId,
    id_field: String,
    records: DashMap<String, Record>,
}

impl MemoryStorage {
    /// Storage for `model`, records identified by their `id` field
    pub fn new(model: ModelId) -> Self {
        Self::with_id_field(model, ID_FIELD)
    }

    /// Storage for `model`, records identified by `id_field`
    pub fn with_id_field(model: ModelId, id_field: impl Into<String>) -> Self {
        Self {
            model,
            id_field: id_field.into(),
            records: DashMap::new(),
        }
    }

    /// Number of stored records
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if nothing is stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn record_id(&self, record: &Record) -> Option<String> {
        match record.get(&self.id_field)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    fn model(&self) -> &ModelId {
        &self.model
    }

    async fn update(&self, record: &mut Record) -> Result<Identity> {
        let id = if let Some(id) = self.record_id(record) {
            id
        } else {
            let id = uuid::Uuid::new_v4().simple().to_string();
            record.insert(self.id_field.clone(), Value::String(id.clone()));
            id
        };
        self.records.insert(id.clone(), record.clone());
        debug!(model = %self.model, id = %id, "Record stored");
        Ok(Identity::new(self.model.clone(), id))
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.records.remove(id).is_some())
    }

    async fn find(&self, id: &str) -> Result<Option<Record>> {
        Ok(self.records.get(id).map(|r| r.value().clone()))
    }

    async fn find_by(&self, criteria: &Record) -> Result<Vec<Record>> {
        Ok(self
            .records
            .iter()
            .filter(|entry| {
                criteria
                    .iter()
                    .all(|(k, v)| entry.value().get(k) == Some(v))
            })
            .map(|entry| entry.value().clone())
            .collect())
    }

    fn identify(&self, record: &Record) -> Result<Identity> {
        self.record_id(record)
            .map(|id| Identity::new(self.model.clone(), id))
            .ok_or_else(|| {
                Error::Storage(format!(
                    "{} record has no `{}` yet, save it before identifying",
                    self.model, self.id_field
                ))
            })
    }
}
