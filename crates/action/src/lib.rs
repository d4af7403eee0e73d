//! The node-handler contract: context, result, registry, and the
//! multi-operation handler base.
//!
//! This crate defines the seam integrations plug into. It has no knowledge
//! of the DAG, the coordinator's scheduling algorithm, or durable storage —
//! those live in `nebula-workflow`, `nebula-engine`, and `nebula-store`.

mod context;
mod handler;
mod multi_op;
mod registry;
mod result;

pub use context::{NodeContext, SecureString};
pub use handler::{InterfaceDefinition, NodeDescriptor, NodeHandler, PortSpec, ValidationResult};
pub use multi_op::{MultiOperationHandler, OperationFn, OperationKey};
pub use registry::HandlerRegistry;
pub use result::{NodeResult, ResumeCondition};

/// Common prelude for crates that implement or invoke node handlers.
pub mod prelude {
    pub use crate::{
        HandlerRegistry, InterfaceDefinition, NodeContext, NodeDescriptor, NodeHandler,
        NodeResult, PortSpec, ResumeCondition, SecureString, ValidationResult,
    };
}
