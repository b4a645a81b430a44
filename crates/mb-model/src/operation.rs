//! The canonical operation envelope and operation names.
//!
//! An operation is the literal shape exchanged with management clients:
//! field names `address`, `op`, and the named parameters are stable across
//! model versions. Only their interpretation changes, which transformers
//! correct for.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::address::Address;
use crate::error::{Error, Result};

/// Address key under which subsystems are mounted.
pub const SUBSYSTEM: &str = "subsystem";

/// Canonical operation names.
pub mod ops {
    pub const ADD: &str = "add";
    pub const REMOVE: &str = "remove";
    pub const DESCRIBE: &str = "describe";
    pub const READ_RESOURCE: &str = "read-resource";
    pub const READ_ATTRIBUTE: &str = "read-attribute";
    pub const WRITE_ATTRIBUTE: &str = "write-attribute";
}

/// Well-known parameter names.
pub mod params {
    /// Attribute name targeted by read-attribute / write-attribute.
    pub const NAME: &str = "name";
    /// Attribute value carried by write-attribute.
    pub const VALUE: &str = "value";
}

/// A named, parameterized request against one resource.
///
/// Immutable once constructed; the `with_*`/`without_*` methods produce a
/// new operation. Parameter values are the usual JSON union
/// (string/number/boolean/list/map/null).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    #[serde(default)]
    pub address: Address,
    #[serde(rename = "op")]
    pub name: String,
    #[serde(flatten)]
    pub parameters: BTreeMap<String, Value>,
}

impl Operation {
    /// Create a parameterless operation. The name must not be empty; an
    /// empty address is only valid for subsystem-root operations.
    pub fn new(name: impl Into<String>, address: Address) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::EmptyOperationName);
        }
        Ok(Self {
            address,
            name,
            parameters: BTreeMap::new(),
        })
    }

    /// Add a parameter. Duplicate keys are a construction error;
    /// last-write-wins would hide configuration mistakes.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Result<Self> {
        let key = key.into();
        if self.parameters.contains_key(&key) {
            return Err(Error::DuplicateParameter(key));
        }
        self.parameters.insert(key, value.into());
        Ok(self)
    }

    pub fn param(&self, key: &str) -> Option<&Value> {
        self.parameters.get(key)
    }

    /// The attribute name parameter as a string, if present.
    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).and_then(Value::as_str)
    }

    /// A copy with one parameter removed; absent keys are a no-op.
    pub fn without_param(&self, key: &str) -> Self {
        let mut next = self.clone();
        next.parameters.remove(key);
        next
    }

    /// Re-check the construction invariants on an operation that arrived
    /// over the wire and bypassed [`Operation::new`].
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::EmptyOperationName);
        }
        Ok(())
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' at {}", self.name, self.address)
    }
}
