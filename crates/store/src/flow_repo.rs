//! Persistence port for flow definitions.

use async_trait::async_trait;
use nebula_core::FlowId;
use nebula_error::NebulaError;
use nebula_workflow::FlowDefinition;

/// Persistence interface for published flow definitions.
///
/// Implementations must be `Send + Sync` so a trait object can be shared
/// across Tokio tasks as `Arc<dyn FlowRepo>`.
#[async_trait]
pub trait FlowRepo: Send + Sync {
    /// Fetch a specific published version of a flow.
    async fn get(&self, id: FlowId, version: u32) -> Result<Option<FlowDefinition>, NebulaError>;

    /// Fetch the most recently published version of a flow.
    async fn get_latest(&self, id: FlowId) -> Result<Option<FlowDefinition>, NebulaError>;

    /// Publish a new flow version. The caller is responsible for having
    /// already run [`nebula_workflow::validate_flow`].
    async fn publish(&self, definition: FlowDefinition) -> Result<(), NebulaError>;

    /// Delete every published version of a flow. Returns `true` if any existed.
    async fn delete(&self, id: FlowId) -> Result<bool, NebulaError>;
}
