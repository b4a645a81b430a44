//! mb-codec: the subsystem configuration codec
//!
//! Converts a persisted textual configuration document into the ordered
//! operation list that rebuilds the resource subtree (load), and the
//! current resource state back into a document (save). The codec is a pure
//! function pair parameterized by the subsystem's declared schema: it owns
//! no state, performs no I/O, and is safe for unlimited concurrent use.
//!
//! Round-trip law: decoding an encoded snapshot and replaying the result
//! against an empty tree reconstructs a state equal to the snapshot, for
//! every representable snapshot.

pub mod decode;
pub mod encode;
pub mod schema;

// Re-exports
pub use decode::decode;
pub use encode::encode;
pub use schema::{
    namespace_for, AttributeKind, AttributeSpec, ChildSpec, SubsystemSchema, NAMESPACE_PREFIX,
};

use mb_model::{Operation, ResourceSnapshot, Result};

/// Load/save conversion for one subsystem's persisted configuration.
pub trait ConfigurationCodec: Send + Sync {
    /// The namespace this codec is installed under.
    fn namespace(&self) -> &str;

    /// Persisted document → ordered operation list (load path).
    fn decode(&self, document: &str) -> Result<Vec<Operation>>;

    /// Live resource state → persisted document (save path).
    fn encode(&self, snapshot: &ResourceSnapshot) -> Result<String>;
}

/// The schema-driven codec ordinary subsystems use.
pub struct SchemaCodec {
    schema: SubsystemSchema,
}

impl SchemaCodec {
    pub fn new(schema: SubsystemSchema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &SubsystemSchema {
        &self.schema
    }
}

impl ConfigurationCodec for SchemaCodec {
    fn namespace(&self) -> &str {
        self.schema.namespace()
    }

    fn decode(&self, document: &str) -> Result<Vec<Operation>> {
        decode::decode(document, &self.schema)
    }

    fn encode(&self, snapshot: &ResourceSnapshot) -> Result<String> {
        encode::encode(snapshot, &self.schema)
    }
}
