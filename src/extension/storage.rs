//! Storage extension: loads and persists the request model around execution

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::Extension;
use crate::Result;
use crate::request::{Request, RequestModel};
use crate::storage::Storage;

/// Binds one storage into gateway execution.
///
/// * pre-execute: an [`RequestModel::Identity`] of this storage's model is
///   replaced by the loaded record.
/// * post-execute: a [`RequestModel::Record`] of this storage's model is
///   saved back, and the assigned id is kept in the record.
pub struct StorageExtension {
    storage: Arc<dyn Storage>,
}

impl StorageExtension {
    /// Wrap a storage
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// The wrapped storage
    #[must_use]
    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }
}

#[async_trait]
impl Extension for StorageExtension {
    async fn on_pre_execute(&self, request: &mut Request) -> Result<()> {
        let RequestModel::Identity(identity) = &request.model else {
            return Ok(());
        };
        if &identity.model != self.storage.model() {
            return Ok(());
        }
        if let Some(record) = self.storage.find(&identity.id).await? {
            debug!(model = %identity.model, id = %identity.id, "Loaded request model");
            request.model = RequestModel::Record {
                model: identity.model.clone(),
                record,
            };
        }
        Ok(())
    }

    async fn on_post_execute(&self, request: &mut Request) -> Result<()> {
        let RequestModel::Record { model, record } = &mut request.model else {
            return Ok(());
        };
        if *model != *self.storage.model() {
            return Ok(());
        }
        let identity = self.storage.update(record).await?;
        debug!(model = %identity.model, id = %identity.id, "Persisted request model");
        Ok(())
    }
}
