//! Error types for modelbus

use thiserror::Error;

use crate::version::ModelVersion;

/// Main error type for modelbus operations
#[derive(Error, Debug)]
pub enum Error {
    /// A persisted configuration document could not be decoded. Fatal to
    /// loading that one resource; the process survives.
    #[error("malformed configuration: {0}")]
    MalformedConfiguration(String),

    /// A transformer was registered twice for the same
    /// (version, pattern, operation) triple.
    #[error("duplicate transformer for version {version} at {pattern} '{operation}'")]
    DuplicateTransformer {
        version: ModelVersion,
        pattern: String,
        operation: String,
    },

    /// Transformer registration attempted after the registry was published.
    #[error("transformer registry is closed for registration")]
    RegistryClosed,

    /// A client at an older negotiated version sent an operation with no
    /// registered transformer. Rejected per-request, never passed through.
    #[error("client version {client} cannot use '{operation}' at {address}: no transformer registered")]
    VersionIncompatible {
        client: ModelVersion,
        address: String,
        operation: String,
    },

    /// A transformer kept redispatching past the depth bound.
    #[error("transform redispatch exceeded {0} levels")]
    TransformDepthExceeded(usize),

    #[error("operation name must not be empty")]
    EmptyOperationName,

    #[error("duplicate operation parameter '{0}'")]
    DuplicateParameter(String),

    #[error("invalid model version '{0}'")]
    InvalidVersion(String),

    #[error("operation handler '{0}' is already registered")]
    HandlerConflict(String),

    #[error("configuration namespace '{0}' is already registered")]
    NamespaceConflict(String),

    #[error("attribute '{0}' is already registered")]
    DuplicateAttribute(String),

    /// A handler rejected an operation. Reported to the requesting client
    /// only.
    #[error("operation failed: {0}")]
    OperationFailed(String),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a malformed-configuration error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Error::MalformedConfiguration(msg.into())
    }

    /// True for the error kinds that abort plugin load.
    pub fn is_fatal_to_load(&self) -> bool {
        matches!(
            self,
            Error::DuplicateTransformer { .. }
                | Error::RegistryClosed
                | Error::HandlerConflict(_)
                | Error::NamespaceConflict(_)
                | Error::DuplicateAttribute(_)
        )
    }
}
