//! Two-phase transformer registry with trie-backed pattern lookup.
//!
//! Registration happens once, single-threaded, during plugin load on a
//! [`TransformerRegistryBuilder`]. Publishing the builder yields an
//! immutable [`PublishedTransformers`] that any number of request handlers
//! may consult concurrently without locking. The read-only contract after
//! publication is enforced by the type system, not by convention.
//!
//! Lookup walks a trie keyed by address segment, with separate exact and
//! wildcard edges: longest matched prefix wins, an exact segment outranks a
//! wildcard at the same position, and remaining ties fall to the highest
//! registration sequence number, so the result is never arbitrary.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tracing::{debug, info};

use mb_model::{
    Address, AddressPattern, Error, ModelVersion, Operation, PathElement, PatternSegment, Result,
    SegmentMatch,
};

use crate::context::{Direction, TransformContext};

/// Result of one transformer application.
#[derive(Debug, Clone)]
pub enum TransformOutput {
    /// The rewritten operation; terminal for this dispatch item.
    Operation(Operation),
    /// Replacement operations, each independently re-entering dispatch.
    /// Used when one legacy operation expands into several newer ones.
    Redispatch(Vec<Operation>),
}

/// Rewrites one operation across a model-version boundary.
pub trait OperationTransformer: Send + Sync {
    fn transform(&self, context: &TransformContext, operation: &Operation)
        -> Result<TransformOutput>;
}

impl<F> OperationTransformer for F
where
    F: Fn(&TransformContext, &Operation) -> Result<TransformOutput> + Send + Sync,
{
    fn transform(
        &self,
        context: &TransformContext,
        operation: &Operation,
    ) -> Result<TransformOutput> {
        self(context, operation)
    }
}

/// The transformer that changes nothing.
pub fn identity() -> Arc<dyn OperationTransformer> {
    Arc::new(
        |_: &TransformContext, operation: &Operation| -> Result<TransformOutput> {
            Ok(TransformOutput::Operation(operation.clone()))
        },
    )
}

/// Forward and reverse transformers for one (version, pattern, operation)
/// triple. Registered together as a unit so the two directions cannot
/// drift out of sync.
#[derive(Clone)]
pub struct TransformerPair {
    inbound: Arc<dyn OperationTransformer>,
    outbound: Arc<dyn OperationTransformer>,
}

impl TransformerPair {
    pub fn new(
        inbound: Arc<dyn OperationTransformer>,
        outbound: Arc<dyn OperationTransformer>,
    ) -> Self {
        Self { inbound, outbound }
    }

    /// Inbound rewrite only; outbound passes through unchanged.
    pub fn inbound_only(inbound: Arc<dyn OperationTransformer>) -> Self {
        Self::new(inbound, identity())
    }

    /// Outbound rewrite only; inbound passes through unchanged.
    pub fn outbound_only(outbound: Arc<dyn OperationTransformer>) -> Self {
        Self::new(identity(), outbound)
    }

    pub fn half(&self, direction: Direction) -> &Arc<dyn OperationTransformer> {
        match direction {
            Direction::Inbound => &self.inbound,
            Direction::Outbound => &self.outbound,
        }
    }
}

struct TransformerEntry {
    pattern: AddressPattern,
    pair: TransformerPair,
    seq: u64,
}

#[derive(Default)]
struct TrieNode {
    /// Operation name → the entry anchored at this node.
    entries: HashMap<String, TransformerEntry>,
    /// key → value → child, for literal segments.
    exact: HashMap<String, HashMap<String, TrieNode>>,
    /// key → child, for `key=*` segments.
    wildcard: HashMap<String, TrieNode>,
}

impl TrieNode {
    fn descend(&mut self, segment: &PatternSegment) -> &mut TrieNode {
        match &segment.matcher {
            SegmentMatch::Exact(value) => self
                .exact
                .entry(segment.key.clone())
                .or_default()
                .entry(value.clone())
                .or_default(),
            SegmentMatch::Any => self.wildcard.entry(segment.key.clone()).or_default(),
        }
    }
}

struct Candidate<'a> {
    depth: usize,
    /// One flag per matched segment: true where the edge was exact.
    specificity: Vec<bool>,
    entry: &'a TransformerEntry,
}

impl<'a> Candidate<'a> {
    /// Longest prefix first, then exact-over-wildcard position by
    /// position, then latest registration.
    fn beats(&self, other: &Candidate<'a>) -> bool {
        (self.depth, &self.specificity, self.entry.seq)
            > (other.depth, &other.specificity, other.entry.seq)
    }
}

fn search<'a>(
    node: &'a TrieNode,
    elements: &[PathElement],
    index: usize,
    specificity: &mut Vec<bool>,
    operation: &str,
    best: &mut Option<Candidate<'a>>,
) {
    if let Some(entry) = node.entries.get(operation) {
        let candidate = Candidate {
            depth: index,
            specificity: specificity.clone(),
            entry,
        };
        if best.as_ref().map_or(true, |current| candidate.beats(current)) {
            *best = Some(candidate);
        }
    }
    if index == elements.len() {
        return;
    }
    let element = &elements[index];
    if let Some(child) = node
        .exact
        .get(&element.key)
        .and_then(|values| values.get(&element.value))
    {
        specificity.push(true);
        search(child, elements, index + 1, specificity, operation, best);
        specificity.pop();
    }
    if let Some(child) = node.wildcard.get(&element.key) {
        specificity.push(false);
        search(child, elements, index + 1, specificity, operation, best);
        specificity.pop();
    }
}

/// Mutable registration side, alive only between plugin load and
/// publication.
#[derive(Default)]
pub struct TransformerRegistryBuilder {
    versions: BTreeMap<ModelVersion, TrieNode>,
    next_seq: u64,
}

impl TransformerRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a forward/reverse pair for one legacy model version.
    /// Registering the exact same (version, pattern, operation) triple
    /// twice is an error, since silent overwrite would hide configuration
    /// mistakes.
    pub fn register(
        &mut self,
        version: ModelVersion,
        pattern: AddressPattern,
        operation: impl Into<String>,
        pair: TransformerPair,
    ) -> Result<()> {
        let operation = operation.into();
        if operation.is_empty() {
            return Err(Error::EmptyOperationName);
        }

        let mut node = self.versions.entry(version).or_default();
        for segment in pattern.segments() {
            node = node.descend(segment);
        }
        if node.entries.contains_key(&operation) {
            return Err(Error::DuplicateTransformer {
                version,
                pattern: pattern.to_string(),
                operation,
            });
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        debug!(%version, pattern = %pattern, operation = %operation, "registered operation transformer");
        node.entries.insert(
            operation,
            TransformerEntry {
                pattern,
                pair,
                seq,
            },
        );
        Ok(())
    }

    /// Legacy versions with at least one registration so far.
    pub fn supported_versions(&self) -> Vec<ModelVersion> {
        self.versions.keys().copied().collect()
    }

    /// Freeze the registry. This is the publication boundary: the result
    /// is read-only and safe to share across threads without locking.
    pub fn publish(self) -> PublishedTransformers {
        info!(
            versions = self.versions.len(),
            "published transformer registry"
        );
        PublishedTransformers {
            versions: self.versions,
        }
    }
}

/// Immutable, published side of the registry. Entries are never mutated or
/// deleted at runtime; a subsystem being removed invalidates them
/// logically, with physical removal deferred to process teardown.
pub struct PublishedTransformers {
    versions: BTreeMap<ModelVersion, TrieNode>,
}

impl PublishedTransformers {
    /// An empty registry: no legacy version is supported.
    pub fn empty() -> Self {
        TransformerRegistryBuilder::new().publish()
    }

    /// Whether any transformer was registered for `version`.
    pub fn supports(&self, version: ModelVersion) -> bool {
        self.versions.contains_key(&version)
    }

    pub fn supported_versions(&self) -> Vec<ModelVersion> {
        self.versions.keys().copied().collect()
    }

    /// Find the transformer for `operation` at `address` as seen by a
    /// client at `version`, in the given direction. Deterministic:
    /// identical arguments always resolve to the identical entry.
    pub fn lookup(
        &self,
        version: ModelVersion,
        direction: Direction,
        address: &Address,
        operation: &str,
    ) -> Option<Arc<dyn OperationTransformer>> {
        let root = self.versions.get(&version)?;
        let mut best = None;
        let mut specificity = Vec::new();
        search(
            root,
            address.elements(),
            0,
            &mut specificity,
            operation,
            &mut best,
        );
        best.map(|candidate| {
            debug!(
                %version,
                direction = direction.as_str(),
                pattern = %candidate.entry.pattern,
                operation,
                "matched operation transformer"
            );
            Arc::clone(candidate.entry.pair.half(direction))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mb_model::ops;

    fn tagging(tag: &'static str) -> TransformerPair {
        let transformer = Arc::new(
            move |_: &TransformContext, op: &Operation| -> Result<TransformOutput> {
                Ok(TransformOutput::Operation(
                    op.clone().with_param("matched", tag)?,
                ))
            },
        );
        TransformerPair::new(transformer.clone(), transformer)
    }

    fn matched_tag(
        registry: &PublishedTransformers,
        version: ModelVersion,
        address: &Address,
        operation: &str,
    ) -> Option<String> {
        let transformer = registry.lookup(version, Direction::Inbound, address, operation)?;
        let context = TransformContext::new(
            ModelVersion::new(2, 0, 0),
            version,
            Direction::Inbound,
        );
        let op = Operation::new(operation, address.clone()).unwrap();
        match transformer.transform(&context, &op).unwrap() {
            TransformOutput::Operation(out) => {
                Some(out.param_str("matched").unwrap().to_string())
            }
            TransformOutput::Redispatch(_) => None,
        }
    }

    const V1: ModelVersion = ModelVersion::new(1, 0, 0);

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut builder = TransformerRegistryBuilder::new();
        builder
            .register(V1, AddressPattern::root(), ops::ADD, tagging("first"))
            .unwrap();
        let err = builder
            .register(V1, AddressPattern::root(), ops::ADD, tagging("second"))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateTransformer { .. }));

        // Same pattern and operation under another version is fine.
        builder
            .register(
                ModelVersion::new(1, 1, 0),
                AddressPattern::root(),
                ops::ADD,
                tagging("other-version"),
            )
            .unwrap();
    }

    #[test]
    fn test_exact_segment_outranks_wildcard() {
        let mut builder = TransformerRegistryBuilder::new();
        builder
            .register(
                V1,
                AddressPattern::new(vec![
                    PatternSegment::exact("subsystem", "archive"),
                    PatternSegment::any("location"),
                ]),
                ops::READ_RESOURCE,
                tagging("wildcard"),
            )
            .unwrap();
        builder
            .register(
                V1,
                AddressPattern::new(vec![
                    PatternSegment::exact("subsystem", "archive"),
                    PatternSegment::exact("location", "a"),
                ]),
                ops::READ_RESOURCE,
                tagging("exact"),
            )
            .unwrap();
        let registry = builder.publish();

        let a = Address::root().child("subsystem", "archive").child("location", "a");
        let b = Address::root().child("subsystem", "archive").child("location", "b");
        assert_eq!(
            matched_tag(&registry, V1, &a, ops::READ_RESOURCE).unwrap(),
            "exact"
        );
        assert_eq!(
            matched_tag(&registry, V1, &b, ops::READ_RESOURCE).unwrap(),
            "wildcard"
        );
    }

    #[test]
    fn test_longest_prefix_wins_over_specificity() {
        let mut builder = TransformerRegistryBuilder::new();
        builder
            .register(
                V1,
                AddressPattern::new(vec![PatternSegment::exact("subsystem", "archive")]),
                ops::READ_RESOURCE,
                tagging("short-exact"),
            )
            .unwrap();
        builder
            .register(
                V1,
                AddressPattern::new(vec![
                    PatternSegment::any("subsystem"),
                    PatternSegment::any("location"),
                ]),
                ops::READ_RESOURCE,
                tagging("long-wildcard"),
            )
            .unwrap();
        let registry = builder.publish();

        let deep = Address::root().child("subsystem", "archive").child("location", "a");
        assert_eq!(
            matched_tag(&registry, V1, &deep, ops::READ_RESOURCE).unwrap(),
            "long-wildcard"
        );
    }

    #[test]
    fn test_pattern_prefix_matches_longer_address() {
        let mut builder = TransformerRegistryBuilder::new();
        builder
            .register(V1, AddressPattern::root(), ops::READ_RESOURCE, tagging("root"))
            .unwrap();
        let registry = builder.publish();

        let deep = Address::root().child("subsystem", "archive").child("location", "a");
        assert_eq!(
            matched_tag(&registry, V1, &deep, ops::READ_RESOURCE).unwrap(),
            "root"
        );
    }

    #[test]
    fn test_lookup_is_deterministic() {
        let mut builder = TransformerRegistryBuilder::new();
        builder
            .register(
                V1,
                AddressPattern::new(vec![PatternSegment::any("subsystem")]),
                ops::READ_RESOURCE,
                tagging("only"),
            )
            .unwrap();
        let registry = builder.publish();

        let address = Address::root().child("subsystem", "archive");
        let first = registry
            .lookup(V1, Direction::Outbound, &address, ops::READ_RESOURCE)
            .unwrap();
        let second = registry
            .lookup(V1, Direction::Outbound, &address, ops::READ_RESOURCE)
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_lookup_respects_operation_name_and_version() {
        let mut builder = TransformerRegistryBuilder::new();
        builder
            .register(V1, AddressPattern::root(), ops::READ_RESOURCE, tagging("read"))
            .unwrap();
        let registry = builder.publish();

        let root = Address::root();
        assert!(registry
            .lookup(V1, Direction::Inbound, &root, ops::WRITE_ATTRIBUTE)
            .is_none());
        assert!(registry
            .lookup(ModelVersion::new(1, 1, 0), Direction::Inbound, &root, ops::READ_RESOURCE)
            .is_none());
        assert!(!registry.supports(ModelVersion::new(1, 1, 0)));
        assert!(registry.supports(V1));
    }
}
