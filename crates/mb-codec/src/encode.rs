//! Encode a resource snapshot back into its persisted document.
//!
//! The save path mirrors decode: the namespace declaration plus the minimal
//! markup for the snapshot. A resource carrying nothing is written as a
//! single empty element. Writing a start/end pair for it has historically
//! produced duplicate or missing closing markers in streaming writers, so
//! the empty-element form is a correctness requirement here, not a style
//! choice.

use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::Writer;
use tracing::debug;

use mb_model::{Error, ResourceSnapshot, Result};

use crate::schema::{AttributeSpec, SubsystemSchema};

/// Encode `snapshot` against `schema` into document text.
pub fn encode(snapshot: &ResourceSnapshot, schema: &SubsystemSchema) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 4);

    let mut root = BytesStart::new(schema.root_element());
    root.push_attribute(("xmlns", schema.namespace()));
    push_attributes(
        &mut root,
        schema.attributes(),
        snapshot,
        schema.root_element(),
    )?;
    check_undeclared(schema, snapshot)?;

    if snapshot.children.is_empty() {
        writer.write_event(Event::Empty(root))?;
    } else {
        writer.write_event(Event::Start(root))?;
        for (element, child) in &snapshot.children {
            let spec = schema.child(&element.key).ok_or_else(|| {
                Error::malformed(format!(
                    "child '{}' is not declared in the '{}' schema",
                    element.key,
                    schema.subsystem()
                ))
            })?;
            if !child.children.is_empty() {
                return Err(Error::malformed(format!(
                    "'{}' resources carry no nested children",
                    element.key
                )));
            }
            let mut tag = BytesStart::new(spec.element());
            tag.push_attribute((spec.name_attribute(), element.value.as_str()));
            push_attributes(&mut tag, spec.attributes(), child, spec.element())?;
            for name in child.attributes.keys() {
                if spec.attribute(name).is_none() {
                    return Err(Error::malformed(format!(
                        "attribute '{}' is not declared for '{}'",
                        name,
                        spec.element()
                    )));
                }
            }
            writer.write_event(Event::Empty(tag))?;
        }
        writer.write_event(Event::End(BytesEnd::new(schema.root_element())))?;
    }

    let document = String::from_utf8_lossy(&writer.into_inner()).into_owned();
    debug!(
        subsystem = schema.subsystem(),
        bytes = document.len(),
        "encoded configuration document"
    );
    Ok(document)
}

fn push_attributes(
    tag: &mut BytesStart<'_>,
    specs: &[AttributeSpec],
    resource: &ResourceSnapshot,
    element: &str,
) -> Result<()> {
    for spec in specs {
        match resource.attribute(spec.name()) {
            Some(value) => {
                let text = spec.render(value)?;
                tag.push_attribute((spec.name(), text.as_str()));
            }
            None if spec.is_required() => {
                return Err(Error::malformed(format!(
                    "required attribute '{}' missing on '{}'",
                    spec.name(),
                    element
                )));
            }
            None => {}
        }
    }
    Ok(())
}

fn check_undeclared(schema: &SubsystemSchema, snapshot: &ResourceSnapshot) -> Result<()> {
    for name in snapshot.attributes.keys() {
        if schema.attribute(name).is_none() {
            return Err(Error::malformed(format!(
                "attribute '{}' is not declared in the '{}' schema",
                name,
                schema.subsystem()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ChildSpec;
    use mb_model::PathElement;
    use serde_json::json;

    fn schema() -> SubsystemSchema {
        SubsystemSchema::new("archive", 1, 0)
            .with_attribute(AttributeSpec::int("scan-interval"))
            .with_child(ChildSpec::new("location").with_attribute(AttributeSpec::string("path")))
    }

    #[test]
    fn test_empty_snapshot_writes_empty_element() {
        let document = encode(&ResourceSnapshot::new(), &schema()).unwrap();
        assert_eq!(document, r#"<archive xmlns="urn:modelbus:archive:1.0"/>"#);
    }

    #[test]
    fn test_attributes_only_still_writes_empty_element() {
        let mut snapshot = ResourceSnapshot::new();
        snapshot.set_attribute("scan-interval", 5);
        let document = encode(&snapshot, &schema()).unwrap();
        assert_eq!(
            document,
            r#"<archive xmlns="urn:modelbus:archive:1.0" scan-interval="5"/>"#
        );
    }

    #[test]
    fn test_children_write_start_end_pair() {
        let mut snapshot = ResourceSnapshot::new();
        let mut location = ResourceSnapshot::new();
        location.set_attribute("path", "/srv/a");
        snapshot
            .children
            .push((PathElement::new("location", "a"), location));

        let document = encode(&snapshot, &schema()).unwrap();
        assert!(document.starts_with(r#"<archive xmlns="urn:modelbus:archive:1.0">"#));
        assert!(document.contains(r#"<location name="a" path="/srv/a"/>"#));
        assert!(document.trim_end().ends_with("</archive>"));
    }

    #[test]
    fn test_undeclared_attribute_rejected() {
        let mut snapshot = ResourceSnapshot::new();
        snapshot.set_attribute("color", "red");
        assert!(encode(&snapshot, &schema()).is_err());
    }

    #[test]
    fn test_unwritable_value_rejected() {
        let mut snapshot = ResourceSnapshot::new();
        snapshot.set_attribute("scan-interval", json!([1, 2]));
        assert!(encode(&snapshot, &schema()).is_err());
    }
}
