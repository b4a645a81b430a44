//! Transformer pairs keeping 1.0.0 clients working against the 2.0.0
//! model.

use std::sync::Arc;

use serde_json::Value;

use mb_model::{ops, params, Error, Operation, Result};
use mb_transform::{
    identity, OperationTransformer, TransformContext, TransformOutput, TransformerPair,
};

use crate::attributes;

/// Strips a result field from an operation crossing to an older client.
struct StripField {
    field: &'static str,
}

impl OperationTransformer for StripField {
    fn transform(
        &self,
        _context: &TransformContext,
        operation: &Operation,
    ) -> Result<TransformOutput> {
        Ok(TransformOutput::Operation(
            operation.without_param(self.field),
        ))
    }
}

/// read-resource for 1.0 clients: results lose the `deployment-timeout`
/// field the 1.0 model never had. Requests pass through unchanged.
pub fn read_resource_pair() -> TransformerPair {
    TransformerPair::outbound_only(Arc::new(StripField {
        field: attributes::DEPLOYMENT_TIMEOUT,
    }))
}

/// Expands the retired `pool-config` composite write into the 2.0
/// `pool-min`/`pool-max` writes.
struct ExpandPoolConfig;

impl OperationTransformer for ExpandPoolConfig {
    fn transform(
        &self,
        _context: &TransformContext,
        operation: &Operation,
    ) -> Result<TransformOutput> {
        if operation.param_str(params::NAME) != Some(attributes::POOL_CONFIG) {
            return Ok(TransformOutput::Operation(operation.clone()));
        }

        let config = operation
            .param(params::VALUE)
            .and_then(Value::as_object)
            .ok_or_else(|| {
                Error::OperationFailed(format!(
                    "'{}' must be written as an object with 'min' and 'max'",
                    attributes::POOL_CONFIG
                ))
            })?;
        let bound = |key: &str| {
            config.get(key).cloned().ok_or_else(|| {
                Error::OperationFailed(format!(
                    "'{}' is missing its '{}' bound",
                    attributes::POOL_CONFIG,
                    key
                ))
            })
        };

        // Each replacement independently re-enters dispatch and resolves
        // against this same pattern, where it passes through untouched.
        Ok(TransformOutput::Redispatch(vec![
            Operation::new(ops::WRITE_ATTRIBUTE, operation.address.clone())?
                .with_param(params::NAME, attributes::POOL_MIN)?
                .with_param(params::VALUE, bound("min")?)?,
            Operation::new(ops::WRITE_ATTRIBUTE, operation.address.clone())?
                .with_param(params::NAME, attributes::POOL_MAX)?
                .with_param(params::VALUE, bound("max")?)?,
        ]))
    }
}

/// write-attribute for 1.0 clients: the composite `pool-config` expands
/// into the two modern writes; results pass through unchanged.
pub fn write_attribute_pair() -> TransformerPair {
    TransformerPair::new(Arc::new(ExpandPoolConfig), identity())
}
