//! Declarative description of a subsystem's persisted XML shape.
//!
//! A subsystem hands the codec a schema instead of hand-writing a parser:
//! the expected namespace, the persisted root attributes, and one level of
//! named child elements. The decode side is strict: anything the schema
//! does not declare is a malformed document, never silently skipped.

use serde_json::Value;

use mb_model::{Error, Result};

/// Product prefix of every modelbus configuration namespace.
pub const NAMESPACE_PREFIX: &str = "urn:modelbus";

/// The conventional namespace string for a subsystem schema revision.
pub fn namespace_for(subsystem: &str, major: u16, minor: u16) -> String {
    format!("{}:{}:{}.{}", NAMESPACE_PREFIX, subsystem, major, minor)
}

/// Value type an attribute is parsed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    String,
    Int,
    Bool,
}

/// One persisted attribute of a resource element.
#[derive(Debug, Clone)]
pub struct AttributeSpec {
    name: String,
    kind: AttributeKind,
    required: bool,
}

impl AttributeSpec {
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, AttributeKind::String)
    }

    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, AttributeKind::Int)
    }

    pub fn bool(name: impl Into<String>) -> Self {
        Self::new(name, AttributeKind::Bool)
    }

    fn new(name: impl Into<String>, kind: AttributeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Parse the raw attribute text into the declared value type.
    pub fn parse(&self, raw: &str) -> Result<Value> {
        match self.kind {
            AttributeKind::String => Ok(Value::String(raw.to_string())),
            AttributeKind::Int => raw
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| Error::malformed(format!("attribute '{}' is not an integer: '{}'", self.name, raw))),
            AttributeKind::Bool => match raw {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                other => Err(Error::malformed(format!(
                    "attribute '{}' is not a boolean: '{}'",
                    self.name, other
                ))),
            },
        }
    }

    /// Render a model value back to attribute text.
    pub fn render(&self, value: &Value) -> Result<String> {
        match value {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            other => Err(Error::malformed(format!(
                "attribute '{}' cannot be written as markup text: {}",
                self.name, other
            ))),
        }
    }
}

/// One level of child elements under the subsystem root. Each instance of
/// the element becomes a child resource addressed `element=name`.
#[derive(Debug, Clone)]
pub struct ChildSpec {
    element: String,
    name_attribute: String,
    attributes: Vec<AttributeSpec>,
}

impl ChildSpec {
    pub fn new(element: impl Into<String>) -> Self {
        Self {
            element: element.into(),
            name_attribute: "name".to_string(),
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, attribute: AttributeSpec) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn element(&self) -> &str {
        &self.element
    }

    pub fn name_attribute(&self) -> &str {
        &self.name_attribute
    }

    pub fn attributes(&self) -> &[AttributeSpec] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeSpec> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

/// The persisted shape of one subsystem.
#[derive(Debug, Clone)]
pub struct SubsystemSchema {
    subsystem: String,
    namespace: String,
    attributes: Vec<AttributeSpec>,
    children: Vec<ChildSpec>,
}

impl SubsystemSchema {
    /// A schema for `subsystem` at document revision `major.minor`. The
    /// root element is named after the subsystem; the namespace follows
    /// the `urn:modelbus:<subsystem>:<major>.<minor>` convention.
    pub fn new(subsystem: impl Into<String>, major: u16, minor: u16) -> Self {
        let subsystem = subsystem.into();
        let namespace = namespace_for(&subsystem, major, minor);
        Self {
            subsystem,
            namespace,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, attribute: AttributeSpec) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn with_child(mut self, child: ChildSpec) -> Self {
        self.children.push(child);
        self
    }

    pub fn subsystem(&self) -> &str {
        &self.subsystem
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The root element name; by convention the subsystem name.
    pub fn root_element(&self) -> &str {
        &self.subsystem
    }

    pub fn attributes(&self) -> &[AttributeSpec] {
        &self.attributes
    }

    pub fn children(&self) -> &[ChildSpec] {
        &self.children
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeSpec> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn child(&self, element: &str) -> Option<&ChildSpec> {
        self.children.iter().find(|c| c.element == element)
    }

    /// A content-free resource must fail decode on any child content.
    pub fn is_content_free(&self) -> bool {
        self.children.is_empty()
    }
}
