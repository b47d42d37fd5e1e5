//! Actions: the units of work a gateway dispatches requests to

use async_trait::async_trait;

use crate::Result;
use crate::request::Request;

/// Handles the requests it supports.
///
/// A gateway asks its actions in registration order; the first one whose
/// [`supports`](Action::supports) returns `true` executes the request.
#[async_trait]
pub trait Action: Send + Sync + 'static {
    /// Whether this action can handle `request`.
    fn supports(&self, request: &Request) -> bool;

    /// Handle the request, mutating its model or status.
    async fn execute(&self, request: &mut Request) -> Result<()>;
}
