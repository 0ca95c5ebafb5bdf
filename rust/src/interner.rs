//! String interning for snapshot identifiers.
//!
//! Task and resource ids arrive as strings; the graph and the optimizers work
//! on dense integer indices so per-task data can live in plain vectors.

use rustc_hash::FxHashMap;

/// Dense index of an interned id (u32 for compact storage and fast hashing).
pub type IdIndex = u32;

/// Maps id strings to dense indices in insertion order.
#[derive(Debug, Clone)]
pub struct IdInterner {
    to_index: FxHashMap<String, IdIndex>,
    from_index: Vec<String>,
}

impl IdInterner {
    /// Create a new interner with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            to_index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            from_index: Vec::with_capacity(capacity),
        }
    }

    /// Intern a string that must not have been seen before.
    ///
    /// Returns `None` when the id is already present, leaving the interner unchanged.
    pub fn insert_new(&mut self, s: &str) -> Option<IdIndex> {
        if self.to_index.contains_key(s) {
            return None;
        }
        let index = self.from_index.len() as IdIndex;
        self.from_index.push(s.to_string());
        self.to_index.insert(s.to_string(), index);
        Some(index)
    }

    #[inline]
    pub fn get(&self, s: &str) -> Option<IdIndex> {
        self.to_index.get(s).copied()
    }

    #[inline]
    pub fn resolve(&self, index: IdIndex) -> Option<&str> {
        self.from_index.get(index as usize).map(|s| s.as_str())
    }
}

impl Default for IdInterner {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}
