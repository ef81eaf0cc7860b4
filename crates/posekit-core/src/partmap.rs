//! Own-entries name mapping with prototype fallback
//!
//! A [`PartMap`] holds the children a part defines itself, plus a non-owning
//! reference to a template part whose map provides fallback entries. The
//! fallback is an arena id, never a pointer; chain-walking lookups live on
//! [`Assembly`](crate::assembly::Assembly) because they must dereference the
//! template id. Mutation only ever touches the own entries.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::part::PartId;

/// Child-name mapping with copy-on-write semantics against a template
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartMap {
    own: BTreeMap<String, PartId>,
    proxy: Option<PartId>,
}

impl PartMap {
    /// Empty map with no fallback
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty map falling back to `proxy`'s entries
    pub fn with_proxy(proxy: PartId) -> Self {
        Self {
            own: BTreeMap::new(),
            proxy: Some(proxy),
        }
    }

    /// Insert an own entry, returning the replaced id if the name existed
    pub fn insert(&mut self, name: impl Into<String>, id: PartId) -> Option<PartId> {
        self.own.insert(name.into(), id)
    }

    /// Remove an own entry; fallback entries cannot be removed
    pub fn remove(&mut self, name: &str) -> Option<PartId> {
        self.own.remove(name)
    }

    /// Look up an own entry, ignoring the fallback
    pub fn get_own(&self, name: &str) -> Option<PartId> {
        self.own.get(name).copied()
    }

    /// True if the name is defined in the own entries
    pub fn contains_own(&self, name: &str) -> bool {
        self.own.contains_key(name)
    }

    /// Own entry names, in sorted order
    pub fn own_names(&self) -> impl Iterator<Item = &str> {
        self.own.keys().map(String::as_str)
    }

    /// Own entries, in sorted name order
    pub fn own_entries(&self) -> impl Iterator<Item = (&str, PartId)> {
        self.own.iter().map(|(name, id)| (name.as_str(), *id))
    }

    /// Attach (not copy) the fallback map's owner
    pub fn set_proxy(&mut self, proxy: Option<PartId>) {
        self.proxy = proxy;
    }

    /// Id of the part providing fallback entries, if any
    pub fn proxy(&self) -> Option<PartId> {
        self.proxy
    }

    /// Number of own entries
    pub fn len(&self) -> usize {
        self.own.len()
    }

    pub fn is_empty(&self) -> bool {
        self.own.is_empty()
    }
}
