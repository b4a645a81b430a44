//! Transform dispatch across a model-version boundary.
//!
//! Every operation entering or leaving the subsystem on behalf of a client
//! at an older negotiated version passes through here. An operation starts
//! `Pending`, and either a matching transformer runs (`Transformed`) or no
//! pattern matches (`Unsupported`). Unsupported is a hard per-request
//! failure: passing an operation the newer model cannot interpret would
//! corrupt the resource tree, so there is no best-effort pass-through.

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::{debug, warn};

use mb_model::{Error, ModelVersion, Operation, Result};

use crate::context::{Direction, TransformContext};
use crate::registry::{PublishedTransformers, TransformOutput};

/// Redispatch levels tolerated before the dispatcher declares a
/// transformer loop. Legitimate expansions are one or two levels deep.
pub const MAX_REDISPATCH_DEPTH: usize = 16;

/// Where one operation stands in a dispatch.
#[derive(Debug, Clone)]
pub enum DispatchState {
    /// Received, not yet matched against the registry.
    Pending(Operation),
    /// A transformer ran and produced this replacement.
    Transformed(Operation),
    /// No pattern matches: version-specific metadata the model no longer
    /// understands.
    Unsupported(Operation),
}

/// Applies the transformer chain for one subsystem.
pub struct TransformDispatcher {
    current_version: ModelVersion,
    transformers: Arc<PublishedTransformers>,
}

impl TransformDispatcher {
    pub fn new(current_version: ModelVersion, transformers: Arc<PublishedTransformers>) -> Self {
        Self {
            current_version,
            transformers,
        }
    }

    pub fn current_version(&self) -> ModelVersion {
        self.current_version
    }

    /// Take one `Pending` operation through a single transition.
    ///
    /// Returns the follow-up states in processing order: a terminal
    /// [`DispatchState::Transformed`], a list of replacements each
    /// re-entering [`DispatchState::Pending`], or a terminal
    /// [`DispatchState::Unsupported`].
    pub fn step(
        &self,
        direction: Direction,
        client_version: ModelVersion,
        operation: Operation,
    ) -> Result<Vec<DispatchState>> {
        let transformer = match self.transformers.lookup(
            client_version,
            direction,
            &operation.address,
            &operation.name,
        ) {
            Some(transformer) => transformer,
            None => return Ok(vec![DispatchState::Unsupported(operation)]),
        };

        let context = TransformContext::new(self.current_version, client_version, direction);
        match transformer.transform(&context, &operation)? {
            TransformOutput::Operation(next) => {
                debug!(operation = %operation, replacement = %next, "transformed operation");
                Ok(vec![DispatchState::Transformed(next)])
            }
            TransformOutput::Redispatch(replacements) => {
                debug!(
                    operation = %operation,
                    replacements = replacements.len(),
                    "operation expanded for redispatch"
                );
                Ok(replacements
                    .into_iter()
                    .map(DispatchState::Pending)
                    .collect())
            }
        }
    }

    /// Run `operation` through the transformer chain for a client at
    /// `client_version`.
    ///
    /// A client at the subsystem's current version passes through
    /// unchanged. Anything else either transforms fully or fails with
    /// [`Error::VersionIncompatible`]. Never a silent drop, never a
    /// silent pass-through.
    pub fn dispatch(
        &self,
        direction: Direction,
        client_version: ModelVersion,
        operation: Operation,
    ) -> Result<Vec<Operation>> {
        operation.validate()?;

        if client_version == self.current_version {
            return Ok(vec![operation]);
        }
        if !self.transformers.supports(client_version) {
            warn!(
                client = %client_version,
                current = %self.current_version,
                operation = %operation,
                "client model version is not supported"
            );
            return Err(Error::VersionIncompatible {
                client: client_version,
                address: operation.address.to_string(),
                operation: operation.name,
            });
        }

        let mut queue: VecDeque<(Operation, usize)> = VecDeque::new();
        queue.push_back((operation, 0));
        let mut transformed = Vec::new();

        while let Some((pending, depth)) = queue.pop_front() {
            if depth > MAX_REDISPATCH_DEPTH {
                return Err(Error::TransformDepthExceeded(MAX_REDISPATCH_DEPTH));
            }
            // Replacements go to the front, in the order the transformer
            // returned them, so nested expansions keep document order.
            let mut insert_at = 0;
            for state in self.step(direction, client_version, pending)? {
                match state {
                    DispatchState::Transformed(op) => transformed.push(op),
                    DispatchState::Pending(op) => {
                        queue.insert(insert_at, (op, depth + 1));
                        insert_at += 1;
                    }
                    DispatchState::Unsupported(op) => {
                        warn!(
                            client = %client_version,
                            operation = %op,
                            "no transformer registered, rejecting operation"
                        );
                        return Err(Error::VersionIncompatible {
                            client: client_version,
                            address: op.address.to_string(),
                            operation: op.name,
                        });
                    }
                }
            }
        }
        Ok(transformed)
    }
}
