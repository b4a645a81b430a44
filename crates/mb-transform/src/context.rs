//! Read-only context handed to operation transformers.

use mb_model::ModelVersion;

/// Direction an operation is crossing the version boundary in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Client request toward the current model.
    Inbound,
    /// Canonical model result back toward the client's expected shape.
    Outbound,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Inbound => "inbound",
            Direction::Outbound => "outbound",
        }
    }
}

/// Per-dispatch context a transformer may consult. The dispatcher builds
/// it and never lets a transformer mutate it.
#[derive(Debug, Clone, Copy)]
pub struct TransformContext {
    /// Version of the model the subsystem currently exposes.
    pub current_version: ModelVersion,
    /// Version the requesting client negotiated.
    pub client_version: ModelVersion,
    pub direction: Direction,
}

impl TransformContext {
    pub fn new(
        current_version: ModelVersion,
        client_version: ModelVersion,
        direction: Direction,
    ) -> Self {
        Self {
            current_version,
            client_version,
            direction,
        }
    }
}
