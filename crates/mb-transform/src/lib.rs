//! mb-transform: versioned operation transformation
//!
//! When a management client negotiates an older model version, every
//! operation it sends (and every canonical result sent back) is rewritten
//! by the transformers the subsystem registered for that version. This
//! crate holds the two halves of that mechanism:
//!
//! - the transformer registry: populated once at plugin load on a builder,
//!   then published as an immutable, lock-free structure (`registry`)
//! - the dispatcher: resolves each operation against the registry and
//!   applies the matching transformer chain, or rejects the request as
//!   version-incompatible (`dispatch`)

pub mod context;
pub mod dispatch;
pub mod registry;

// Re-exports
pub use context::{Direction, TransformContext};
pub use dispatch::{DispatchState, TransformDispatcher, MAX_REDISPATCH_DEPTH};
pub use registry::{
    identity, OperationTransformer, PublishedTransformers, TransformOutput, TransformerPair,
    TransformerRegistryBuilder,
};
