//! Resource addresses and transformer address patterns.
//!
//! An address is an ordered sequence of `key=value` segments locating a
//! resource in the model tree; the empty sequence is the root. Patterns are
//! the lookup-side counterpart: each segment carries a literal key and
//! either a literal or wildcard value, and a pattern matches every address
//! it is a prefix of.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One `key=value` segment of a resource address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathElement {
    pub key: String,
    pub value: String,
}

impl PathElement {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for PathElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// Ordered sequence of path elements identifying a resource in the tree.
///
/// Immutable in use: extension produces a new address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(Vec<PathElement>);

impl Address {
    /// The distinguished empty (root) address.
    pub const fn root() -> Self {
        Self(Vec::new())
    }

    pub fn new(elements: Vec<PathElement>) -> Self {
        Self(elements)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn elements(&self) -> &[PathElement] {
        &self.0
    }

    /// A new address with one more segment appended.
    pub fn child(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut elements = self.0.clone();
        elements.push(PathElement::new(key, value));
        Self(elements)
    }

    pub fn last(&self) -> Option<&PathElement> {
        self.0.last()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "/");
        }
        for element in &self.0 {
            write!(f, "/{}", element)?;
        }
        Ok(())
    }
}

impl From<Vec<PathElement>> for Address {
    fn from(elements: Vec<PathElement>) -> Self {
        Self(elements)
    }
}

/// Value side of one pattern segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentMatch {
    /// Matches one literal value.
    Exact(String),
    /// Matches any value under the segment's key.
    Any,
}

/// One segment of an address pattern. Keys are always literal; only the
/// value side may be a wildcard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternSegment {
    pub key: String,
    pub matcher: SegmentMatch,
}

impl PatternSegment {
    pub fn exact(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            matcher: SegmentMatch::Exact(value.into()),
        }
    }

    pub fn any(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            matcher: SegmentMatch::Any,
        }
    }

    pub fn is_exact(&self) -> bool {
        matches!(self.matcher, SegmentMatch::Exact(_))
    }

    pub fn matches(&self, element: &PathElement) -> bool {
        if self.key != element.key {
            return false;
        }
        match &self.matcher {
            SegmentMatch::Exact(value) => *value == element.value,
            SegmentMatch::Any => true,
        }
    }
}

impl fmt::Display for PatternSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.matcher {
            SegmentMatch::Exact(value) => write!(f, "{}={}", self.key, value),
            SegmentMatch::Any => write!(f, "{}=*", self.key),
        }
    }
}

/// An address pattern used for transformer lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressPattern(Vec<PatternSegment>);

impl AddressPattern {
    /// Matches the subsystem root itself.
    pub const fn root() -> Self {
        Self(Vec::new())
    }

    pub fn new(segments: Vec<PatternSegment>) -> Self {
        Self(segments)
    }

    pub fn segments(&self) -> &[PatternSegment] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when this pattern matches a prefix of `address` (the whole
    /// address included).
    pub fn matches_prefix_of(&self, address: &Address) -> bool {
        if self.0.len() > address.len() {
            return false;
        }
        self.0
            .iter()
            .zip(address.elements())
            .all(|(segment, element)| segment.matches(element))
    }
}

impl From<&Address> for AddressPattern {
    /// The all-literal pattern matching exactly one address prefix.
    fn from(address: &Address) -> Self {
        Self(
            address
                .elements()
                .iter()
                .map(|e| PatternSegment::exact(&*e.key, &*e.value))
                .collect(),
        )
    }
}

impl fmt::Display for AddressPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "/");
        }
        for segment in &self.0 {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}
