//! Capability discovery model.
//!
//! A remote transform service describes what it can do through a JSON
//! configuration document. This module models that document and resolves it
//! into a [`CapabilityMap`]: normalized source media type to the set of
//! normalized target media types reachable from it.

mod config;
mod resolver;

pub use config::{
    OptionDescriptor, OptionGroup, SupportedSourceAndTarget, TransformCoreConfig, TransformOptionEntry,
    Transformer,
};
pub use resolver::resolve;

use std::collections::btree_map;
use std::collections::{BTreeMap, BTreeSet};

use crate::media_type::MediaType;

/// Normalized source media type -> normalized target media types.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilityMap {
    entries: BTreeMap<MediaType, BTreeSet<MediaType>>,
}

impl CapabilityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `target` is reachable from `source`. Both are normalized.
    pub fn insert(&mut self, source: &MediaType, target: &MediaType) {
        self.entries
            .entry(source.normalized())
            .or_default()
            .insert(target.normalized());
    }

    pub fn targets(&self, source: &MediaType) -> Option<&BTreeSet<MediaType>> {
        self.entries.get(source)
    }

    pub fn contains_source(&self, source: &MediaType) -> bool {
        self.entries.contains_key(source)
    }

    pub fn sources(&self) -> impl Iterator<Item = &MediaType> {
        self.entries.keys()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, MediaType, BTreeSet<MediaType>> {
        self.entries.iter()
    }

    /// Number of distinct source types.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of (source, target) pairs.
    pub fn capability_count(&self) -> usize {
        self.entries.values().map(BTreeSet::len).sum()
    }
}

impl<'a> IntoIterator for &'a CapabilityMap {
    type Item = (&'a MediaType, &'a BTreeSet<MediaType>);
    type IntoIter = btree_map::Iter<'a, MediaType, BTreeSet<MediaType>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
