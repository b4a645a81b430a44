//! In-memory kernel registries.
//!
//! A full management kernel supplies its own handler table and codec
//! registry; these map-backed ones serve standalone hosts and the tests in
//! this workspace.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use mb_codec::ConfigurationCodec;
use mb_model::{Error, Result};

use crate::handler::{CodecRegistry, HandlerTable, OperationHandler};

/// Map-backed operation handler table.
#[derive(Default)]
pub struct MemoryHandlerTable {
    handlers: HashMap<String, Arc<dyn OperationHandler>>,
}

impl MemoryHandlerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, operation: &str) -> Option<Arc<dyn OperationHandler>> {
        self.handlers.get(operation).map(Arc::clone)
    }

    pub fn operations(&self) -> Vec<String> {
        self.handlers.keys().cloned().collect()
    }
}

impl HandlerTable for MemoryHandlerTable {
    fn register_handler(
        &mut self,
        operation: &str,
        handler: Arc<dyn OperationHandler>,
    ) -> Result<()> {
        if self.handlers.contains_key(operation) {
            return Err(Error::HandlerConflict(operation.to_string()));
        }
        self.handlers.insert(operation.to_string(), handler);
        Ok(())
    }
}

/// Map-backed codec registry keyed by namespace.
#[derive(Default)]
pub struct MemoryCodecRegistry {
    codecs: HashMap<String, Arc<dyn ConfigurationCodec>>,
}

impl MemoryCodecRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, namespace: &str) -> Option<Arc<dyn ConfigurationCodec>> {
        self.codecs.get(namespace).map(Arc::clone)
    }
}

impl CodecRegistry for MemoryCodecRegistry {
    fn register_codec(&mut self, codec: Arc<dyn ConfigurationCodec>) -> Result<()> {
        let namespace = codec.namespace().to_string();
        if self.codecs.contains_key(&namespace) {
            return Err(Error::NamespaceConflict(namespace));
        }
        info!(namespace = %namespace, "registered configuration codec");
        self.codecs.insert(namespace, codec);
        Ok(())
    }
}
