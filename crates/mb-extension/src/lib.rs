//! mb-extension: the subsystem registration facade
//!
//! The entry point a plugin author calls once at startup to install
//! operation handlers, the configuration codec, attribute access, and the
//! per-legacy-version transformer pairs into the management kernel's
//! registries. Installation fails fast on any conflict; `finish` publishes
//! the transformer registry and closes registration for good.

pub mod extension;
pub mod handler;
pub mod registration;
pub mod tables;

// Re-exports
pub use extension::{install_extension, Extension};
pub use handler::{CodecRegistry, HandlerTable, OperationHandler};
pub use registration::{
    AttributeAccess, AttributeStorage, InstalledSubsystem, SubsystemRegistration,
};
pub use tables::{MemoryCodecRegistry, MemoryHandlerTable};
