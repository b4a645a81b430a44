//! Core model types for modelbus
//!
//! # Modules
//!
//! - `address`: resource addresses and transformer address patterns
//! - `error`: error types and Result alias
//! - `operation`: the canonical operation envelope and operation names
//! - `snapshot`: read-model of a resource subtree
//! - `version`: model version triples

pub mod address;
pub mod error;
pub mod operation;
pub mod snapshot;
pub mod version;

// Re-exports
pub use address::{Address, AddressPattern, PathElement, PatternSegment, SegmentMatch};
pub use error::{Error, Result};
pub use operation::{ops, params, Operation, SUBSYSTEM};
pub use snapshot::ResourceSnapshot;
pub use version::ModelVersion;
