//! Provided-tag reverse index.
//!
//! Tracks which cache keys provided which tags, enabling invalidation walks
//! without scanning every entry. A per-type index backs the LIST sentinel,
//! which addresses every provider of a tag type.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use crate::key::CacheKey;
use crate::lock::{read_guard, write_guard};
use crate::tag::{Tag, TagId, TagType};

const WHAT: &str = "tag_index";

/// Maps provided tags to the cache keys that provided them.
///
/// Entries own their provided set; the index only mirrors it. `register` and
/// `unregister` must always be called with an entry's full provided set so the
/// per-type index stays consistent.
pub(crate) struct TagIndex {
    tag_to_keys: RwLock<HashMap<Tag, HashSet<CacheKey>>>,
    type_to_keys: RwLock<HashMap<TagType, HashSet<CacheKey>>>,
}

impl TagIndex {
    pub fn new() -> Self {
        Self {
            tag_to_keys: RwLock::new(HashMap::new()),
            type_to_keys: RwLock::new(HashMap::new()),
        }
    }

    /// Record that `key` provides `tags`.
    pub fn register(&self, key: &CacheKey, tags: &HashSet<Tag>) {
        if tags.is_empty() {
            return;
        }
        let mut by_tag = write_guard(&self.tag_to_keys, WHAT);
        let mut by_type = write_guard(&self.type_to_keys, WHAT);
        for tag in tags {
            by_tag.entry(tag.clone()).or_default().insert(key.clone());
            by_type.entry(tag.ty).or_default().insert(key.clone());
        }
    }

    /// Detach `key` from its full provided set.
    pub fn unregister(&self, key: &CacheKey, tags: &HashSet<Tag>) {
        if tags.is_empty() {
            return;
        }
        let mut by_tag = write_guard(&self.tag_to_keys, WHAT);
        let mut by_type = write_guard(&self.type_to_keys, WHAT);
        for tag in tags {
            if let Some(keys) = by_tag.get_mut(tag) {
                keys.remove(key);
                if keys.is_empty() {
                    by_tag.remove(tag);
                }
            }
            if let Some(keys) = by_type.get_mut(&tag.ty) {
                keys.remove(key);
                if keys.is_empty() {
                    by_type.remove(&tag.ty);
                }
            }
        }
    }

    /// Cache keys reached by one invalidating tag.
    ///
    /// `(T, id)` reaches providers of that id and of `(T, LIST)`; `(T, LIST)`
    /// reaches every provider of the type.
    pub fn keys_matching(&self, invalidating: &Tag) -> HashSet<CacheKey> {
        match &invalidating.id {
            TagId::List => read_guard(&self.type_to_keys, WHAT)
                .get(&invalidating.ty)
                .cloned()
                .unwrap_or_default(),
            TagId::Id(_) => {
                let by_tag = read_guard(&self.tag_to_keys, WHAT);
                let mut keys = by_tag.get(invalidating).cloned().unwrap_or_default();
                if let Some(list_keys) = by_tag.get(&Tag::list(invalidating.ty)) {
                    keys.extend(list_keys.iter().cloned());
                }
                keys
            }
        }
    }

    /// Union of `keys_matching` over an invalidation set.
    pub fn affected_by<'a>(&self, tags: impl IntoIterator<Item = &'a Tag>) -> HashSet<CacheKey> {
        let mut affected = HashSet::new();
        for tag in tags {
            affected.extend(self.keys_matching(tag));
        }
        affected
    }

    pub fn tag_count(&self) -> usize {
        read_guard(&self.tag_to_keys, WHAT).len()
    }
}
