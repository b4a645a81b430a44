//! Strict decode of a persisted subsystem document into operations.
//!
//! The load path: one XML document describing a subsystem's persisted
//! configuration becomes the ordered operation list that rebuilds the
//! subtree from nothing. Decoded addresses are subsystem-root-relative;
//! the kernel rebases them under the subsystem's mount address.

use std::collections::BTreeMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::Value;
use tracing::debug;

use mb_model::{ops, Address, Error, Operation, Result};

use crate::schema::{AttributeSpec, SubsystemSchema};

#[derive(Clone, Copy)]
enum State {
    Prolog,
    InRoot,
    InChild,
    Done,
}

/// Decode `document` against `schema`, producing the configuration
/// operation list.
///
/// Strict: a namespace mismatch, a missing required attribute, or any
/// content the schema does not declare fails with
/// [`Error::MalformedConfiguration`]. A content-free resource decodes to
/// exactly one parameterless "add" at the root address.
pub fn decode(document: &str, schema: &SubsystemSchema) -> Result<Vec<Operation>> {
    let mut reader = Reader::from_str(document);
    let mut buf = Vec::new();

    let mut operations: Vec<Operation> = Vec::new();
    let mut seen_children: Vec<(String, String)> = Vec::new();
    let mut state = State::Prolog;

    loop {
        let event = reader.read_event_into(&mut buf)?;
        let is_empty_element = matches!(&event, Event::Empty(_));
        match &event {
            Event::Eof => {
                if !matches!(state, State::Done) {
                    return Err(Error::malformed("unexpected end of document"));
                }
                break;
            }

            Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {}

            Event::Text(t) => {
                let text = String::from_utf8_lossy(t);
                if !text.trim().is_empty() {
                    return Err(Error::malformed(format!(
                        "unexpected text content '{}'",
                        text.trim()
                    )));
                }
            }
            Event::CData(_) => {
                return Err(Error::malformed("unexpected CDATA content"));
            }

            Event::Start(e) | Event::Empty(e) => match state {
                State::Prolog => {
                    operations.push(decode_root(e, schema)?);
                    state = if is_empty_element {
                        State::Done
                    } else {
                        State::InRoot
                    };
                }
                State::InRoot => {
                    if schema.is_content_free() {
                        return Err(Error::malformed(format!(
                            "'{}' declares no child content",
                            schema.root_element()
                        )));
                    }
                    operations.push(decode_child(e, schema, &mut seen_children)?);
                    if !is_empty_element {
                        state = State::InChild;
                    }
                }
                State::InChild => {
                    return Err(Error::malformed(format!(
                        "element '{}' must not carry nested content",
                        element_name(e)
                    )));
                }
                State::Done => {
                    return Err(Error::malformed("content after the root element"));
                }
            },

            Event::End(_) => match state {
                State::InChild => state = State::InRoot,
                State::InRoot => state = State::Done,
                _ => return Err(Error::malformed("unbalanced closing tag")),
            },

            _ => return Err(Error::malformed("unexpected document content")),
        }
        buf.clear();
    }

    debug!(
        subsystem = schema.subsystem(),
        operations = operations.len(),
        "decoded configuration document"
    );
    Ok(operations)
}

fn decode_root(e: &BytesStart, schema: &SubsystemSchema) -> Result<Operation> {
    let name = element_name(e);
    if name != schema.root_element() {
        return Err(Error::malformed(format!(
            "unexpected root element '{}', expected '{}'",
            name,
            schema.root_element()
        )));
    }

    let mut namespace = None;
    let mut parameters = BTreeMap::new();
    for (key, value) in collect_attributes(e)? {
        if key == "xmlns" {
            namespace = Some(value);
            continue;
        }
        if key.starts_with("xmlns:") {
            return Err(Error::malformed(format!(
                "namespace prefixes are not supported: '{}'",
                key
            )));
        }
        let spec = schema.attribute(&key).ok_or_else(|| {
            Error::malformed(format!("unexpected attribute '{}' on '{}'", key, name))
        })?;
        if parameters.contains_key(spec.name()) {
            return Err(Error::malformed(format!("duplicate attribute '{}'", key)));
        }
        parameters.insert(spec.name().to_string(), spec.parse(&value)?);
    }

    match namespace {
        None => {
            return Err(Error::malformed(format!(
                "missing namespace declaration on '{}'",
                name
            )))
        }
        Some(ns) if ns != schema.namespace() => {
            return Err(Error::malformed(format!(
                "unexpected namespace '{}', expected '{}'",
                ns,
                schema.namespace()
            )));
        }
        Some(_) => {}
    }

    require_attributes(schema.attributes(), &parameters, &name)?;

    Ok(Operation {
        address: Address::root(),
        name: ops::ADD.to_string(),
        parameters,
    })
}

fn decode_child(
    e: &BytesStart,
    schema: &SubsystemSchema,
    seen: &mut Vec<(String, String)>,
) -> Result<Operation> {
    let element = element_name(e);
    let spec = schema.child(&element).ok_or_else(|| {
        Error::malformed(format!(
            "unexpected element '{}' under '{}'",
            element,
            schema.root_element()
        ))
    })?;

    let mut resource_name = None;
    let mut parameters = BTreeMap::new();
    for (key, value) in collect_attributes(e)? {
        if key == spec.name_attribute() {
            resource_name = Some(value);
            continue;
        }
        let aspec = spec.attribute(&key).ok_or_else(|| {
            Error::malformed(format!("unexpected attribute '{}' on '{}'", key, element))
        })?;
        if parameters.contains_key(aspec.name()) {
            return Err(Error::malformed(format!("duplicate attribute '{}'", key)));
        }
        parameters.insert(aspec.name().to_string(), aspec.parse(&value)?);
    }

    let resource_name = resource_name.ok_or_else(|| {
        Error::malformed(format!(
            "element '{}' is missing its '{}' attribute",
            element,
            spec.name_attribute()
        ))
    })?;

    let id = (element.clone(), resource_name.clone());
    if seen.contains(&id) {
        return Err(Error::malformed(format!(
            "duplicate resource '{}={}'",
            element, resource_name
        )));
    }
    seen.push(id);

    require_attributes(spec.attributes(), &parameters, &element)?;

    Ok(Operation {
        address: Address::root().child(element, resource_name),
        name: ops::ADD.to_string(),
        parameters,
    })
}

fn require_attributes(
    specs: &[AttributeSpec],
    parameters: &BTreeMap<String, Value>,
    element: &str,
) -> Result<()> {
    for spec in specs {
        if spec.is_required() && !parameters.contains_key(spec.name()) {
            return Err(Error::malformed(format!(
                "required attribute '{}' missing on '{}'",
                spec.name(),
                element
            )));
        }
    }
    Ok(())
}

fn element_name(e: &BytesStart) -> String {
    let name = e.name();
    String::from_utf8_lossy(name.as_ref()).to_string()
}

fn collect_attributes(e: &BytesStart) -> Result<Vec<(String, String)>> {
    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| Error::malformed(format!("bad attribute: {}", err)))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = attr
            .unescape_value()
            .map_err(|err| Error::malformed(format!("bad attribute value: {}", err)))?
            .to_string();
        attributes.push((key, value));
    }
    Ok(attributes)
}
