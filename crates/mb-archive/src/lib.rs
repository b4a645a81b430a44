//! mb-archive: the archive deployment subsystem
//!
//! Watches deployment locations for service archives and mounts them into
//! the model tree. The subsystem itself is small; it earns its place in
//! this workspace as the complete, end-to-end consumer of the extension
//! machinery: a strict configuration codec, the full handler set, and
//! transformer pairs that keep 1.0.0 clients working against the 2.0.0
//! model.
//!
//! Model history: 2.0.0 replaced the composite `pool-config` attribute
//! with `pool-min`/`pool-max` and added the `deployment-timeout` field to
//! read-resource results.

pub mod extension;
pub mod handlers;
pub mod transformers;

use mb_codec::{AttributeSpec, SubsystemSchema};
use mb_model::ModelVersion;

pub use extension::ArchiveExtension;

pub const SUBSYSTEM_NAME: &str = "archive";
pub const NAMESPACE: &str = "urn:modelbus:archive:1.0";

/// Model version the subsystem currently exposes.
pub const CURRENT_VERSION: ModelVersion = ModelVersion::new(2, 0, 0);
/// Oldest client model version still supported through transformers.
pub const LEGACY_VERSION: ModelVersion = ModelVersion::new(1, 0, 0);

/// Attribute and result-field names.
pub mod attributes {
    pub const SCAN_INTERVAL: &str = "scan-interval";
    pub const POOL_MIN: &str = "pool-min";
    pub const POOL_MAX: &str = "pool-max";
    /// Retired 1.0 composite, split into pool-min/pool-max in 2.0.
    pub const POOL_CONFIG: &str = "pool-config";
    /// Read-resource result field introduced in 2.0.
    pub const DEPLOYMENT_TIMEOUT: &str = "deployment-timeout";
}

/// Seconds a deployment may take before the 2.0 model reports it hung.
pub const DEFAULT_DEPLOYMENT_TIMEOUT: i64 = 300;

/// The persisted shape of the subsystem: an empty element by default,
/// with three optional numeric attributes.
pub fn schema() -> SubsystemSchema {
    SubsystemSchema::new(SUBSYSTEM_NAME, 1, 0)
        .with_attribute(AttributeSpec::int(attributes::SCAN_INTERVAL))
        .with_attribute(AttributeSpec::int(attributes::POOL_MIN))
        .with_attribute(AttributeSpec::int(attributes::POOL_MAX))
}
