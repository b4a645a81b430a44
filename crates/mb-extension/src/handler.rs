//! Kernel-facing operation handler interfaces.
//!
//! The management kernel owns operation dispatch; its staged
//! apply/verify/commit/rollback engine is not reproduced here. A subsystem
//! only supplies handlers; the traits below are the narrow surface the
//! kernel exposes for installing them.

use std::sync::Arc;

use serde_json::Value;

use mb_codec::ConfigurationCodec;
use mb_model::{Operation, ResourceSnapshot, Result};

/// Computes the effect of one operation on one resource.
pub trait OperationHandler: Send + Sync {
    fn execute(&self, resource: &mut ResourceSnapshot, operation: &Operation) -> Result<Value>;
}

/// The kernel's operation handler table for one subsystem.
pub trait HandlerTable {
    /// Install a handler under an operation name. An already-registered
    /// name is a conflict and aborts plugin load.
    fn register_handler(
        &mut self,
        operation: &str,
        handler: Arc<dyn OperationHandler>,
    ) -> Result<()>;
}

/// The kernel's codec registry, keyed by configuration namespace.
pub trait CodecRegistry {
    /// Install a codec under its namespace. An already-registered
    /// namespace is a conflict and aborts plugin load.
    fn register_codec(&mut self, codec: Arc<dyn ConfigurationCodec>) -> Result<()>;
}
