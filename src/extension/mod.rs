//! Gateway lifecycle hooks

mod storage;

pub use storage::StorageExtension;

use async_trait::async_trait;

use crate::Result;
use crate::request::Request;

/// Hook around request execution.
///
/// Hooks run in registration order: `on_pre_execute` before an action is
/// chosen, `on_execute` once it is, `on_post_execute` after it finished.
#[async_trait]
pub trait Extension: Send + Sync + 'static {
    /// Before the gateway picks an action.
    async fn on_pre_execute(&self, _request: &mut Request) -> Result<()> {
        Ok(())
    }

    /// After an action was chosen, before it runs.
    async fn on_execute(&self, _request: &mut Request) -> Result<()> {
        Ok(())
    }

    /// After the action ran successfully.
    async fn on_post_execute(&self, _request: &mut Request) -> Result<()> {
        Ok(())
    }
}
