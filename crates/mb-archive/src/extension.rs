//! Extension entry point for the archive subsystem.

use std::sync::Arc;

use mb_codec::SchemaCodec;
use mb_extension::{AttributeStorage, Extension, SubsystemRegistration};
use mb_model::{ops, AddressPattern, ModelVersion, Result};

use crate::handlers::{
    AddHandler, DescribeHandler, ReadResourceHandler, RemoveHandler, WriteAttributeHandler,
};
use crate::transformers;
use crate::{attributes, schema, CURRENT_VERSION, LEGACY_VERSION, SUBSYSTEM_NAME};

/// Extension enabling archive deployments.
pub struct ArchiveExtension;

impl Extension for ArchiveExtension {
    fn subsystem_name(&self) -> &str {
        SUBSYSTEM_NAME
    }

    fn model_version(&self) -> ModelVersion {
        CURRENT_VERSION
    }

    fn initialize(&self, registration: &mut SubsystemRegistration<'_>) -> Result<()> {
        registration.register_operation_handler(ops::ADD, Arc::new(AddHandler))?;
        registration.register_operation_handler(ops::REMOVE, Arc::new(RemoveHandler))?;
        registration.register_operation_handler(ops::DESCRIBE, Arc::new(DescribeHandler))?;
        registration.register_operation_handler(ops::READ_RESOURCE, Arc::new(ReadResourceHandler))?;
        registration
            .register_operation_handler(ops::WRITE_ATTRIBUTE, Arc::new(WriteAttributeHandler))?;

        registration.register_codec(Arc::new(SchemaCodec::new(schema())))?;

        for attribute in [
            attributes::SCAN_INTERVAL,
            attributes::POOL_MIN,
            attributes::POOL_MAX,
        ] {
            registration.register_read_write_attribute(
                attribute,
                AttributeStorage::Configuration,
                Arc::new(WriteAttributeHandler),
            )?;
        }

        registration.register_transformer(
            LEGACY_VERSION,
            AddressPattern::root(),
            ops::READ_RESOURCE,
            transformers::read_resource_pair(),
        )?;
        registration.register_transformer(
            LEGACY_VERSION,
            AddressPattern::root(),
            ops::WRITE_ATTRIBUTE,
            transformers::write_attribute_pair(),
        )?;

        Ok(())
    }
}
