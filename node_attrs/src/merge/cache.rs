//! Path-keyed memo of merged values.
//!
//! The cache is a tree that mirrors the shape of the reads made so far. Each
//! node may hold the merged value for its path; a read is served from the
//! nearest memoized ancestor when there is one. Writes invalidate eagerly:
//! a write at `P` clears the memos on every ancestor of `P` and drops the
//! whole subtree rooted at `P`. Memos elsewhere stay valid because the merged
//! value at a path depends only on layer data at that path's prefixes and
//! descendants.

use std::collections::HashMap;

use tracing::trace;

use crate::key::KeyPath;
use crate::value::Value;

/// Counters describing cache behaviour.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct MergeCacheStats {
    /// Reads answered from a memo.
    pub hits: u64,
    /// Reads that had to merge the layers.
    pub misses: u64,
    /// Paths currently memoized.
    pub entries: usize,
}

#[derive(Debug, Default)]
struct CacheNode {
    memo: Option<Value>,
    children: HashMap<String, CacheNode>,
}

impl CacheNode {
    fn count(&self) -> usize {
        usize::from(self.memo.is_some())
            + self.children.values().map(Self::count).sum::<usize>()
    }
}

/// Memo of merged values keyed by canonical path.
#[derive(Debug, Default)]
pub struct MergeCache {
    root: CacheNode,
    hits: u64,
    misses: u64,
}

impl MergeCache {
    /// An empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The memoized value at `path`, if it or an ancestor is cached.
    ///
    /// The outer `Option` reports whether the cache could answer; the inner
    /// one is the merged value itself.
    pub fn lookup(&mut self, path: &KeyPath) -> Option<Option<Value>> {
        let mut node = &self.root;
        let mut depth = 0;
        loop {
            if let Some(value) = &node.memo {
                let rest = KeyPath::new(path.segments().iter().skip(depth));
                let answer = value.pointer(&rest).cloned();
                self.hits += 1;
                trace!(%path, "merge cache hit");
                return Some(answer);
            }
            let segment = path.segments().get(depth)?;
            node = node.children.get(segment.canonical_key().as_ref())?;
            depth += 1;
        }
    }

    /// Serve `path` from the cache or merge it with `compute` and remember
    /// the result.
    ///
    /// Absent results are not remembered, so reads of missing paths never
    /// grow the tree.
    pub fn get_or_compute<F>(&mut self, path: &KeyPath, compute: F) -> Option<Value>
    where
        F: FnOnce() -> Option<Value>,
    {
        if let Some(answer) = self.lookup(path) {
            return answer;
        }
        self.misses += 1;
        trace!(%path, "merge cache miss");
        let merged = compute()?;
        let mut node = &mut self.root;
        for segment in path {
            node = node
                .children
                .entry(segment.canonical_key().into_owned())
                .or_default();
        }
        node.memo = Some(merged.clone());
        Some(merged)
    }

    /// Forget everything that a write at `path` could have changed.
    pub fn invalidate(&mut self, path: &KeyPath) {
        trace!(%path, "merge cache invalidated");
        let Some((parent, last)) = path.split_last() else {
            self.root = CacheNode::default();
            return;
        };
        let mut node = &mut self.root;
        node.memo = None;
        for segment in &parent {
            let Some(child) = node.children.get_mut(segment.canonical_key().as_ref()) else {
                return;
            };
            child.memo = None;
            node = child;
        }
        node.children.remove(last.canonical_key().as_ref());
    }

    /// Drop every memo.
    pub fn clear(&mut self) {
        trace!("merge cache cleared");
        self.root = CacheNode::default();
    }

    /// Current counters.
    #[must_use]
    pub fn stats(&self) -> MergeCacheStats {
        MergeCacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.root.count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::MergeCache;
    use crate::key::KeyPath;
    use crate::value::Value;

    fn path(raw: &str) -> KeyPath {
        KeyPath::dotted(raw).expect("valid dotted path")
    }

    #[test]
    fn second_read_is_a_hit() {
        let mut cache = MergeCache::new();
        let first = cache.get_or_compute(&path("a"), || Some(Value::from(1)));
        let second = cache.get_or_compute(&path("a"), || panic!("should be cached"));
        assert_eq!(first, second);
        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses, stats.entries), (1, 1, 1));
    }

    #[test]
    fn descendants_are_served_from_a_memoized_ancestor() {
        let mut cache = MergeCache::new();
        cache.get_or_compute(&path("net"), || Some(Value::from(json!({"ip": "10.0.0.1"}))));
        let ip = cache.get_or_compute(&path("net.ip"), || panic!("ancestor covers this"));
        assert_eq!(ip, Some(Value::from("10.0.0.1")));
        let missing = cache.get_or_compute(&path("net.port"), || panic!("ancestor covers this"));
        assert_eq!(missing, None);
    }

    #[test]
    fn missing_paths_leave_no_entries() {
        let mut cache = MergeCache::new();
        for key in ["gone", "lost.deeper", "never.was.here"] {
            assert_eq!(cache.get_or_compute(&path(key), || None), None);
        }
        let stats = cache.stats();
        assert_eq!((stats.misses, stats.entries), (3, 0));
        assert_eq!(cache.get_or_compute(&path("gone"), || Some(Value::from(1))), Some(Value::from(1)));
    }

    #[rstest]
    #[case::same_path("a.b", "a.b", true)]
    #[case::ancestor_write("a", "a.b", true)]
    #[case::descendant_write("a.b.c", "a.b", true)]
    #[case::sibling_write("a.x", "a.b", false)]
    #[case::root_write("", "a.b", true)]
    fn invalidation_is_path_scoped(
        #[case] written: &str,
        #[case] cached: &str,
        #[case] recomputed: bool,
    ) {
        let mut cache = MergeCache::new();
        cache.get_or_compute(&path(cached), || Some(Value::from("old")));
        cache.invalidate(&path(written));
        let value = cache.get_or_compute(&path(cached), || Some(Value::from("new")));
        let expected = if recomputed { "new" } else { "old" };
        assert_eq!(value, Some(Value::from(expected)));
    }

    #[test]
    fn invalidating_a_descendant_clears_every_ancestor_memo() {
        let mut cache = MergeCache::new();
        cache.get_or_compute(&KeyPath::root(), || Some(Value::from(json!({"a": {"b": 1}}))));
        cache.get_or_compute(&path("a"), || Some(Value::from(json!({"b": 1}))));
        cache.invalidate(&path("a.b"));
        assert_eq!(cache.stats().entries, 0);
    }
}
