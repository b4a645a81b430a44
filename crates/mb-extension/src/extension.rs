//! Subsystem extension entry point.

use tracing::error;

use mb_model::{ModelVersion, Result};

use crate::handler::{CodecRegistry, HandlerTable};
use crate::registration::{InstalledSubsystem, SubsystemRegistration};

/// A subsystem plugin. Implementations are stateless entry points the
/// kernel discovers and initializes exactly once at load time.
pub trait Extension: Send + Sync {
    /// Name the subsystem mounts under.
    fn subsystem_name(&self) -> &str;

    /// Model version the subsystem currently exposes.
    fn model_version(&self) -> ModelVersion;

    /// One-shot registration of handlers, codec, attributes, and
    /// transformers. Runs single-threaded, before publication.
    fn initialize(&self, registration: &mut SubsystemRegistration<'_>) -> Result<()>;
}

/// Install an extension into the kernel registries.
///
/// Any conflict reported by an installation step aborts the load: the
/// error propagates and nothing further is registered.
pub fn install_extension(
    extension: &dyn Extension,
    handlers: &mut dyn HandlerTable,
    codecs: &mut dyn CodecRegistry,
) -> Result<InstalledSubsystem> {
    let mut registration = SubsystemRegistration::new(
        extension.subsystem_name(),
        extension.model_version(),
        handlers,
        codecs,
    );
    if let Err(err) = extension.initialize(&mut registration) {
        error!(
            subsystem = extension.subsystem_name(),
            %err,
            "subsystem registration failed, aborting load"
        );
        return Err(err);
    }
    registration.finish()
}
