//! Integration tests for the complete archive subsystem: registration,
//! configuration round trips, and cross-version dispatch.

#[cfg(test)]
mod tests {
    use mb_archive::{
        attributes, ArchiveExtension, CURRENT_VERSION, DEFAULT_DEPLOYMENT_TIMEOUT, LEGACY_VERSION,
        NAMESPACE,
    };
    use mb_extension::{install_extension, MemoryCodecRegistry, MemoryHandlerTable};
    use mb_model::{ops, params, Address, Error, Operation, ResourceSnapshot};
    use mb_transform::Direction;
    use serde_json::json;

    struct Host {
        handlers: MemoryHandlerTable,
        codecs: MemoryCodecRegistry,
        subsystem: mb_extension::InstalledSubsystem,
    }

    fn install() -> Host {
        let mut handlers = MemoryHandlerTable::new();
        let mut codecs = MemoryCodecRegistry::new();
        let subsystem = install_extension(&ArchiveExtension, &mut handlers, &mut codecs).unwrap();
        Host {
            handlers,
            codecs,
            subsystem,
        }
    }

    impl Host {
        /// Replay a configuration document the way the kernel seeds the
        /// tree at boot: each operation through its registered handler.
        fn boot(&self, document: &str) -> ResourceSnapshot {
            let codec = self.codecs.get(NAMESPACE).unwrap();
            let operations = codec.decode(document).unwrap();
            let mut resource = ResourceSnapshot::new();
            for operation in &operations {
                let handler = self.handlers.get(&operation.name).unwrap();
                handler.execute(&mut resource, operation).unwrap();
            }
            resource
        }
    }

    #[test]
    fn test_install_registers_everything() {
        let host = install();
        let mut operations = host.handlers.operations();
        operations.sort();
        assert_eq!(
            operations,
            vec!["add", "describe", "read-resource", "remove", "write-attribute"]
        );
        assert!(host.codecs.get(NAMESPACE).is_some());
        assert_eq!(host.subsystem.model_version, CURRENT_VERSION);
        assert!(host.subsystem.transformers.supports(LEGACY_VERSION));
        assert_eq!(host.subsystem.attributes.len(), 3);
    }

    #[test]
    fn test_installing_twice_conflicts() {
        let mut handlers = MemoryHandlerTable::new();
        let mut codecs = MemoryCodecRegistry::new();
        install_extension(&ArchiveExtension, &mut handlers, &mut codecs).unwrap();
        let err =
            install_extension(&ArchiveExtension, &mut handlers, &mut codecs).unwrap_err();
        assert!(matches!(err, Error::HandlerConflict(_)));
    }

    #[test]
    fn test_empty_document_decodes_to_single_bare_add() {
        let host = install();
        let codec = host.codecs.get(NAMESPACE).unwrap();
        let operations = codec
            .decode(r#"<archive xmlns="urn:modelbus:archive:1.0"/>"#)
            .unwrap();
        assert_eq!(operations.len(), 1);
        assert_eq!(operations[0].name, ops::ADD);
        assert!(operations[0].address.is_root());
        assert!(operations[0].parameters.is_empty());
    }

    #[test]
    fn test_empty_configuration_round_trip() {
        let host = install();
        let codec = host.codecs.get(NAMESPACE).unwrap();

        let resource = host.boot(r#"<archive xmlns="urn:modelbus:archive:1.0"/>"#);
        assert!(resource.is_empty());

        // Saving an empty resource writes an empty element again.
        let document = codec.encode(&resource).unwrap();
        assert_eq!(document, r#"<archive xmlns="urn:modelbus:archive:1.0"/>"#);
    }

    #[test]
    fn test_configured_round_trip_through_describe() {
        let host = install();
        let codec = host.codecs.get(NAMESPACE).unwrap();

        let resource = host.boot(
            r#"<archive xmlns="urn:modelbus:archive:1.0" scan-interval="30" pool-min="2"/>"#,
        );
        assert_eq!(resource.attribute(attributes::SCAN_INTERVAL), Some(&json!(30)));

        // describe returns the document that rebuilds this state.
        let describe = host.handlers.get(ops::DESCRIBE).unwrap();
        let mut scratch = resource.clone();
        let result = describe
            .execute(
                &mut scratch,
                &Operation::new(ops::DESCRIBE, Address::root()).unwrap(),
            )
            .unwrap();
        let document: Vec<Operation> = serde_json::from_value(result).unwrap();
        assert_eq!(ResourceSnapshot::from_operations(&document).unwrap(), resource);

        // And the save path reproduces a decodable document.
        let saved = codec.encode(&resource).unwrap();
        let rebooted = host.boot(&saved);
        assert_eq!(rebooted, resource);
    }

    #[test]
    fn test_v1_client_read_resource_loses_new_field() {
        let host = install();
        let dispatcher = host.subsystem.dispatcher();

        // The canonical 2.0 result for a configured resource.
        let mut resource = host.boot(
            r#"<archive xmlns="urn:modelbus:archive:1.0" scan-interval="30"/>"#,
        );
        let read = host.handlers.get(ops::READ_RESOURCE).unwrap();
        let result = read
            .execute(
                &mut resource,
                &Operation::new(ops::READ_RESOURCE, Address::root()).unwrap(),
            )
            .unwrap();
        assert_eq!(
            result[attributes::DEPLOYMENT_TIMEOUT],
            json!(DEFAULT_DEPLOYMENT_TIMEOUT)
        );

        // Shape the result as the outbound operation envelope.
        let mut envelope = Operation::new(ops::READ_RESOURCE, Address::root()).unwrap();
        for (field, value) in result.as_object().unwrap() {
            envelope = envelope.with_param(field.clone(), value.clone()).unwrap();
        }

        let for_v1 = dispatcher
            .dispatch(Direction::Outbound, LEGACY_VERSION, envelope.clone())
            .unwrap();
        assert_eq!(for_v1.len(), 1);
        assert!(for_v1[0].param(attributes::DEPLOYMENT_TIMEOUT).is_none());
        assert_eq!(for_v1[0].param(attributes::SCAN_INTERVAL), Some(&json!(30)));

        let for_v2 = dispatcher
            .dispatch(Direction::Outbound, CURRENT_VERSION, envelope)
            .unwrap();
        assert_eq!(
            for_v2[0].param(attributes::DEPLOYMENT_TIMEOUT),
            Some(&json!(DEFAULT_DEPLOYMENT_TIMEOUT))
        );
    }

    #[test]
    fn test_v1_pool_config_write_reaches_modern_attributes() {
        let host = install();
        let dispatcher = host.subsystem.dispatcher();

        let legacy_write = Operation::new(ops::WRITE_ATTRIBUTE, Address::root())
            .unwrap()
            .with_param(params::NAME, attributes::POOL_CONFIG)
            .unwrap()
            .with_param(params::VALUE, json!({"min": 2, "max": 8}))
            .unwrap();

        let writes = dispatcher
            .dispatch(Direction::Inbound, LEGACY_VERSION, legacy_write)
            .unwrap();
        assert_eq!(writes.len(), 2);

        let mut resource = ResourceSnapshot::new();
        let handler = host.handlers.get(ops::WRITE_ATTRIBUTE).unwrap();
        for write in &writes {
            handler.execute(&mut resource, write).unwrap();
        }
        assert_eq!(resource.attribute(attributes::POOL_MIN), Some(&json!(2)));
        assert_eq!(resource.attribute(attributes::POOL_MAX), Some(&json!(8)));
    }

    #[test]
    fn test_v1_operation_without_transformer_is_rejected() {
        let host = install();
        let dispatcher = host.subsystem.dispatcher();

        let describe = Operation::new(ops::DESCRIBE, Address::root()).unwrap();
        let err = dispatcher
            .dispatch(Direction::Inbound, LEGACY_VERSION, describe)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::VersionIncompatible { client, .. } if client == LEGACY_VERSION
        ));

        // An entirely unsupported version is rejected the same way.
        let read = Operation::new(ops::READ_RESOURCE, Address::root()).unwrap();
        let err = dispatcher
            .dispatch(
                Direction::Inbound,
                mb_model::ModelVersion::new(0, 9, 0),
                read,
            )
            .unwrap_err();
        assert!(matches!(err, Error::VersionIncompatible { .. }));
    }
}
