//! Operation handlers for the archive subsystem.

use serde_json::{json, Value};
use tracing::debug;

use mb_extension::OperationHandler;
use mb_model::{params, Error, Operation, ResourceSnapshot, Result};

use crate::{attributes, DEFAULT_DEPLOYMENT_TIMEOUT};

const WRITABLE: &[&str] = &[
    attributes::SCAN_INTERVAL,
    attributes::POOL_MIN,
    attributes::POOL_MAX,
];

/// Creates the subsystem resource, seeding any attributes the add
/// operation carries.
pub struct AddHandler;

impl OperationHandler for AddHandler {
    fn execute(&self, resource: &mut ResourceSnapshot, operation: &Operation) -> Result<Value> {
        for (name, value) in &operation.parameters {
            if !WRITABLE.contains(&name.as_str()) {
                return Err(Error::OperationFailed(format!(
                    "unknown attribute '{}'",
                    name
                )));
            }
            resource.set_attribute(name.clone(), value.clone());
        }
        debug!(attributes = operation.parameters.len(), "archive subsystem added");
        Ok(Value::Null)
    }
}

/// Removes the subsystem resource.
pub struct RemoveHandler;

impl OperationHandler for RemoveHandler {
    fn execute(&self, resource: &mut ResourceSnapshot, _operation: &Operation) -> Result<Value> {
        *resource = ResourceSnapshot::new();
        Ok(Value::Null)
    }
}

/// Returns the configuration document that rebuilds the current resource
/// state: the describe contract.
pub struct DescribeHandler;

impl OperationHandler for DescribeHandler {
    fn execute(&self, resource: &mut ResourceSnapshot, _operation: &Operation) -> Result<Value> {
        Ok(serde_json::to_value(resource.to_operations())?)
    }
}

/// Reads the resource, including the `deployment-timeout` field the 2.0
/// model added to results.
pub struct ReadResourceHandler;

impl OperationHandler for ReadResourceHandler {
    fn execute(&self, resource: &mut ResourceSnapshot, _operation: &Operation) -> Result<Value> {
        let mut result = resource.attributes.clone();
        result
            .entry(attributes::DEPLOYMENT_TIMEOUT.to_string())
            .or_insert_with(|| json!(DEFAULT_DEPLOYMENT_TIMEOUT));
        Ok(Value::Object(result.into_iter().collect()))
    }
}

/// Writes one of the subsystem's read-write attributes.
pub struct WriteAttributeHandler;

impl OperationHandler for WriteAttributeHandler {
    fn execute(&self, resource: &mut ResourceSnapshot, operation: &Operation) -> Result<Value> {
        let name = operation
            .param_str(params::NAME)
            .ok_or_else(|| Error::OperationFailed("write-attribute needs a 'name'".to_string()))?;
        if !WRITABLE.contains(&name) {
            return Err(Error::OperationFailed(format!(
                "attribute '{}' is not writable",
                name
            )));
        }
        let value = operation
            .param(params::VALUE)
            .ok_or_else(|| Error::OperationFailed("write-attribute needs a 'value'".to_string()))?;
        resource.set_attribute(name, value.clone());
        debug!(attribute = name, "attribute written");
        Ok(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mb_model::{ops, Address};

    #[test]
    fn test_add_seeds_attributes() {
        let op = Operation::new(ops::ADD, Address::root())
            .unwrap()
            .with_param(attributes::SCAN_INTERVAL, 5)
            .unwrap();
        let mut resource = ResourceSnapshot::new();
        AddHandler.execute(&mut resource, &op).unwrap();
        assert_eq!(resource.attribute(attributes::SCAN_INTERVAL), Some(&json!(5)));
    }

    #[test]
    fn test_add_rejects_unknown_attribute() {
        let op = Operation::new(ops::ADD, Address::root())
            .unwrap()
            .with_param("color", "red")
            .unwrap();
        let mut resource = ResourceSnapshot::new();
        assert!(matches!(
            AddHandler.execute(&mut resource, &op),
            Err(Error::OperationFailed(_))
        ));
    }

    #[test]
    fn test_describe_returns_rebuild_document() {
        let mut resource = ResourceSnapshot::new();
        resource.set_attribute(attributes::SCAN_INTERVAL, 5);
        let op = Operation::new(ops::DESCRIBE, Address::root()).unwrap();
        let result = DescribeHandler.execute(&mut resource, &op).unwrap();

        let document: Vec<Operation> = serde_json::from_value(result).unwrap();
        assert_eq!(document.len(), 1);
        assert_eq!(document[0].name, ops::ADD);
        assert_eq!(document[0].param(attributes::SCAN_INTERVAL), Some(&json!(5)));
    }

    #[test]
    fn test_read_resource_includes_deployment_timeout() {
        let mut resource = ResourceSnapshot::new();
        resource.set_attribute(attributes::SCAN_INTERVAL, 5);
        let op = Operation::new(ops::READ_RESOURCE, Address::root()).unwrap();
        let result = ReadResourceHandler.execute(&mut resource, &op).unwrap();
        assert_eq!(
            result[attributes::DEPLOYMENT_TIMEOUT],
            json!(DEFAULT_DEPLOYMENT_TIMEOUT)
        );
        assert_eq!(result[attributes::SCAN_INTERVAL], json!(5));
    }

    #[test]
    fn test_write_attribute_validates_name() {
        let mut resource = ResourceSnapshot::new();
        let op = Operation::new(ops::WRITE_ATTRIBUTE, Address::root())
            .unwrap()
            .with_param(params::NAME, attributes::POOL_MIN)
            .unwrap()
            .with_param(params::VALUE, 2)
            .unwrap();
        WriteAttributeHandler.execute(&mut resource, &op).unwrap();
        assert_eq!(resource.attribute(attributes::POOL_MIN), Some(&json!(2)));

        let bad = Operation::new(ops::WRITE_ATTRIBUTE, Address::root())
            .unwrap()
            .with_param(params::NAME, "color")
            .unwrap()
            .with_param(params::VALUE, "red")
            .unwrap();
        assert!(WriteAttributeHandler.execute(&mut resource, &bad).is_err());
    }
}
