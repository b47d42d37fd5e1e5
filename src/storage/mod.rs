//! Persistence services, one per domain model
//!
//! A [`Storage`] owns the records of exactly one [`ModelId`]. The builder
//! wraps every configured storage into a
//! [`StorageExtension`](crate::extension::StorageExtension) so gateways load
//! and save records around request execution.

mod memory;

pub use memory::MemoryStorage;

use async_trait::async_trait;

use crate::Result;
use crate::model::{Identity, ModelId, Record};

/// Persistence for the records of one domain model.
///
/// Implementations must be `Send + Sync + 'static` so they can be shared
/// as `Arc<dyn Storage>` between the registry, extensions and tokens.
#[async_trait]
pub trait Storage: Send + Sync + 'static {
    /// Model persisted by this storage.
    fn model(&self) -> &ModelId;

    /// Fresh, unsaved record.
    fn create(&self) -> Record {
        Record::new()
    }

    /// Insert or replace a record, assigning an id when it has none.
    ///
    /// The assigned id is written back into `record`.
    async fn update(&self, record: &mut Record) -> Result<Identity>;

    /// Delete by id. Returns `true` if the record existed.
    async fn delete(&self, id: &str) -> Result<bool>;

    /// Find by id.
    async fn find(&self, id: &str) -> Result<Option<Record>>;

    /// All records whose fields equal every field of `criteria`.
    async fn find_by(&self, criteria: &Record) -> Result<Vec<Record>>;

    /// Identity of an already saved record.
    ///
    /// # Errors
    ///
    /// Returns `Error::Storage` if the record carries no id yet.
    fn identify(&self, record: &Record) -> Result<Identity>;
}
