//! The subsystem registration facade.
//!
//! One `SubsystemRegistration` exists per extension, for the duration of
//! `Extension::initialize`. Everything a subsystem installs flows through
//! it: operation handlers, the configuration codec, attribute access, and
//! the per-legacy-version transformer pairs. `finish` publishes the
//! transformer registry; after that boundary registration is closed and
//! reads are lock-free.

use std::sync::Arc;

use tracing::{debug, info};

use mb_codec::ConfigurationCodec;
use mb_model::{AddressPattern, Error, ModelVersion, Result};
use mb_transform::{
    PublishedTransformers, TransformDispatcher, TransformerPair, TransformerRegistryBuilder,
};

use crate::handler::{CodecRegistry, HandlerTable, OperationHandler};

/// Where a registered attribute is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeStorage {
    /// Persisted configuration; survives restart and is written by the
    /// codec's save path.
    Configuration,
    /// Runtime-only; never persisted.
    Runtime,
}

/// A read-write attribute registration.
pub struct AttributeAccess {
    pub name: String,
    pub storage: AttributeStorage,
    pub write_handler: Arc<dyn OperationHandler>,
}

/// Registration facade handed to `Extension::initialize`.
pub struct SubsystemRegistration<'k> {
    name: String,
    model_version: ModelVersion,
    handlers: &'k mut dyn HandlerTable,
    codecs: &'k mut dyn CodecRegistry,
    transformers: Option<TransformerRegistryBuilder>,
    attributes: Vec<AttributeAccess>,
}

impl<'k> SubsystemRegistration<'k> {
    pub fn new(
        name: impl Into<String>,
        model_version: ModelVersion,
        handlers: &'k mut dyn HandlerTable,
        codecs: &'k mut dyn CodecRegistry,
    ) -> Self {
        Self {
            name: name.into(),
            model_version,
            handlers,
            codecs,
            transformers: Some(TransformerRegistryBuilder::new()),
            attributes: Vec::new(),
        }
    }

    pub fn subsystem_name(&self) -> &str {
        &self.name
    }

    pub fn model_version(&self) -> ModelVersion {
        self.model_version
    }

    /// Install an operation handler into the kernel's handler table.
    pub fn register_operation_handler(
        &mut self,
        operation: &str,
        handler: Arc<dyn OperationHandler>,
    ) -> Result<()> {
        debug!(subsystem = %self.name, operation, "registering operation handler");
        self.handlers.register_handler(operation, handler)
    }

    /// Install the configuration codec under the subsystem's namespace.
    pub fn register_codec(&mut self, codec: Arc<dyn ConfigurationCodec>) -> Result<()> {
        debug!(subsystem = %self.name, namespace = codec.namespace(), "registering codec");
        self.codecs.register_codec(codec)
    }

    /// Register a read-write attribute with its write handler.
    pub fn register_read_write_attribute(
        &mut self,
        name: impl Into<String>,
        storage: AttributeStorage,
        write_handler: Arc<dyn OperationHandler>,
    ) -> Result<()> {
        let name = name.into();
        if self.attributes.iter().any(|a| a.name == name) {
            return Err(Error::DuplicateAttribute(name));
        }
        debug!(subsystem = %self.name, attribute = %name, "registering read-write attribute");
        self.attributes.push(AttributeAccess {
            name,
            storage,
            write_handler,
        });
        Ok(())
    }

    /// Register a forward/reverse transformer pair for one legacy model
    /// version. Fails with [`Error::RegistryClosed`] once `finish` has
    /// published the registry.
    pub fn register_transformer(
        &mut self,
        legacy_version: ModelVersion,
        pattern: AddressPattern,
        operation: impl Into<String>,
        pair: TransformerPair,
    ) -> Result<()> {
        match self.transformers.as_mut() {
            Some(builder) => builder.register(legacy_version, pattern, operation, pair),
            None => Err(Error::RegistryClosed),
        }
    }

    /// Publish the transformer registry and close registration.
    pub fn finish(&mut self) -> Result<InstalledSubsystem> {
        let builder = self.transformers.take().ok_or(Error::RegistryClosed)?;
        let transformers = Arc::new(builder.publish());
        info!(
            subsystem = %self.name,
            version = %self.model_version,
            legacy_versions = transformers.supported_versions().len(),
            "subsystem registration complete"
        );
        Ok(InstalledSubsystem {
            name: self.name.clone(),
            model_version: self.model_version,
            attributes: std::mem::take(&mut self.attributes),
            transformers,
        })
    }
}

/// Everything the facade produced for one subsystem.
pub struct InstalledSubsystem {
    pub name: String,
    pub model_version: ModelVersion,
    pub attributes: Vec<AttributeAccess>,
    pub transformers: Arc<PublishedTransformers>,
}

impl std::fmt::Debug for InstalledSubsystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstalledSubsystem")
            .field("name", &self.name)
            .field("model_version", &self.model_version)
            .field("attributes", &self.attributes.len())
            .finish()
    }
}

impl InstalledSubsystem {
    /// The dispatcher every request from a version-negotiated client of
    /// this subsystem goes through.
    pub fn dispatcher(&self) -> TransformDispatcher {
        TransformDispatcher::new(self.model_version, Arc::clone(&self.transformers))
    }
}
