//! Read-model of a resource subtree.
//!
//! A snapshot is what the configuration codec encodes and what the describe
//! operation walks: persisted attributes plus named children. Storage and
//! locking of the live tree belong to the kernel; this type only captures
//! one consistent view of it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::address::{Address, PathElement};
use crate::error::{Error, Result};
use crate::operation::{ops, Operation};

/// Attributes plus named children of one resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSnapshot {
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
    #[serde(default)]
    pub children: Vec<(PathElement, ResourceSnapshot)>,
}

impl ResourceSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the resource carries no persisted attributes and no
    /// children.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty() && self.children.is_empty()
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(name.into(), value.into());
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<Value> {
        self.attributes.remove(name)
    }

    pub fn child(&self, element: &PathElement) -> Option<&ResourceSnapshot> {
        self.children
            .iter()
            .find(|(e, _)| e == element)
            .map(|(_, child)| child)
    }

    fn child_mut(&mut self, element: &PathElement) -> Option<&mut ResourceSnapshot> {
        self.children
            .iter_mut()
            .find(|(e, _)| e == element)
            .map(|(_, child)| child)
    }

    /// Flatten this subtree into the ordered operation list that rebuilds
    /// it from nothing: parent adds before child adds, depth-first.
    pub fn to_operations(&self) -> Vec<Operation> {
        let mut operations = Vec::new();
        self.collect_operations(Address::root(), &mut operations);
        operations
    }

    fn collect_operations(&self, address: Address, out: &mut Vec<Operation>) {
        out.push(Operation {
            address: address.clone(),
            name: ops::ADD.to_string(),
            parameters: self.attributes.clone(),
        });
        for (element, child) in &self.children {
            child.collect_operations(address.child(&*element.key, &*element.value), out);
        }
    }

    /// Replay a configuration document against an empty snapshot.
    ///
    /// Only "add" operations appear in a well-formed document; a parent
    /// must be added before its children.
    pub fn from_operations(document: &[Operation]) -> Result<Self> {
        let mut root = ResourceSnapshot::new();
        for operation in document {
            if operation.name != ops::ADD {
                return Err(Error::malformed(format!(
                    "configuration documents contain only '{}' operations, found {}",
                    ops::ADD,
                    operation
                )));
            }
            let resource = root.materialize(&operation.address)?;
            if !resource.attributes.is_empty() {
                return Err(Error::malformed(format!(
                    "resource at {} added twice",
                    operation.address
                )));
            }
            resource.attributes = operation.parameters.clone();
        }
        debug!(operations = document.len(), "replayed configuration document");
        Ok(root)
    }

    fn materialize(&mut self, address: &Address) -> Result<&mut ResourceSnapshot> {
        let mut current = self;
        for element in address.elements() {
            if current.child(element).is_none() {
                current
                    .children
                    .push((element.clone(), ResourceSnapshot::new()));
            }
            // Just inserted above when missing.
            current = current
                .child_mut(element)
                .ok_or_else(|| Error::malformed(format!("no resource at {}", address)))?;
        }
        Ok(current)
    }
}
