// Copyright 2018 Kodebox, Inc.
// This file is part of CodeChain.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hash, Hasher};
use std::rc::Rc;

use backtrack_engine::{versioned, Anchor, CheckpointGroup, Rollbackable, Versioned, VersionedVec};

use super::base::CollectionBase;

const DEFAULT_BUCKETS: usize = 16;

#[derive(Rollbackable)]
struct Entry<K: Clone + 'static, V: Clone + 'static> {
    #[rollback(anchor)]
    anchor: Anchor,
    #[rollback(skip)]
    hash: u64,
    #[rollback(skip)]
    key: K,
    value: Versioned<V>,
    next: Versioned<Option<Rc<Entry<K, V>>>>,
}

type Bucket<K, V> = Option<Rc<Entry<K, V>>>;

/// A hash map with separate chaining.
///
/// Entries are versioned objects in the map's checkpoint group. The bucket
/// array grows by doubling once the map is three quarters full; growing
/// assigns a new bucket array and relinks the chains.
#[derive(Rollbackable)]
pub struct HashMap<K: Clone + Eq + Hash + 'static, V: Clone + 'static> {
    #[rollback(base)]
    base: CollectionBase,
    #[rollback(anchor)]
    anchor: Anchor,
    #[rollback(skip)]
    hasher: RandomState,
    table: VersionedVec<Bucket<K, V>>,
    size: Versioned<usize>,
}

impl<K: Clone + Eq + Hash + 'static, V: Clone + 'static> HashMap<K, V> {
    pub fn new() -> Rc<Self> {
        Self::with_buckets(DEFAULT_BUCKETS)
    }

    /// `buckets` is rounded up to a power of two.
    pub fn with_buckets(buckets: usize) -> Rc<Self> {
        let buckets = buckets.max(1).next_power_of_two();
        versioned(|anchor| HashMap {
            base: Default::default(),
            anchor,
            hasher: RandomState::new(),
            table: VersionedVec::from_elem(None, buckets),
            size: Versioned::new(0),
        })
    }

    pub fn len(&self) -> usize {
        self.size.get()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn buckets(&self) -> usize {
        self.table.len()
    }

    pub fn mod_count(&self) -> u64 {
        self.base.mod_count()
    }

    fn hash(&self, key: &K) -> u64 {
        let mut hasher = self.hasher.build_hasher();
        key.hash(&mut hasher);
        hasher.finish()
    }

    fn bucket_index(hash: u64, buckets: usize) -> usize {
        (hash as usize) & (buckets - 1)
    }

    fn find(&self, key: &K) -> Option<Rc<Entry<K, V>>> {
        let hash = self.hash(key);
        let index = Self::bucket_index(hash, self.buckets());
        let mut entry = self.table.get(index).and_then(|bucket| bucket);
        while let Some(current) = entry {
            if current.hash == hash && current.key == *key {
                return Some(current)
            }
            entry = current.next.get();
        }
        None
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.find(key).map(|entry| entry.value.get())
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.find(key).is_some()
    }

    /// Insert or overwrite. Returns the previous value of `key`.
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        if let Some(entry) = self.find(&key) {
            return Some(entry.value.replace(&entry.anchor, value))
        }

        let hash = self.hash(&key);
        let index = Self::bucket_index(hash, self.buckets());
        let chain = self.table.get(index).and_then(|bucket| bucket);
        let entry = new_entry(&self.checkpoint_group(), hash, key, value, chain);
        self.table.set(&self.anchor, index, Some(entry));

        let size = self.len() + 1;
        self.size.set(&self.anchor, size);
        self.base.touch(&self.anchor);
        if size * 4 > self.buckets() * 3 {
            self.grow();
        }
        None
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        let hash = self.hash(key);
        let index = Self::bucket_index(hash, self.buckets());
        let mut previous: Option<Rc<Entry<K, V>>> = None;
        let mut entry = self.table.get(index).and_then(|bucket| bucket);
        while let Some(current) = entry {
            if current.hash == hash && current.key == *key {
                let next = current.next.get();
                match &previous {
                    Some(previous) => previous.next.link(&previous.anchor, next),
                    None => {
                        self.table.set(&self.anchor, index, next);
                    }
                }
                self.size.set(&self.anchor, self.len() - 1);
                self.base.touch(&self.anchor);
                return Some(current.value.get())
            }
            entry = current.next.get();
            previous = Some(current);
        }
        None
    }

    pub fn clear(&self) {
        if self.is_empty() {
            return
        }
        self.table.assign(&self.anchor, vec![None; self.buckets()]);
        self.size.set(&self.anchor, 0);
        self.base.touch(&self.anchor);
    }

    fn entries_raw(&self) -> Vec<Rc<Entry<K, V>>> {
        let mut entries = Vec::with_capacity(self.len());
        for bucket in self.table.borrow().iter() {
            let mut entry = bucket.clone();
            while let Some(current) = entry {
                entry = current.next.get();
                entries.push(current);
            }
        }
        entries
    }

    fn grow(&self) {
        let buckets = self.buckets() * 2;
        let mut table: Vec<Bucket<K, V>> = vec![None; buckets];
        for entry in self.entries_raw() {
            let index = Self::bucket_index(entry.hash, buckets);
            entry.next.set(&entry.anchor, table[index].take());
            table[index] = Some(entry);
        }
        self.table.assign(&self.anchor, table);
    }

    pub fn keys(&self) -> Vec<K> {
        self.entries_raw().iter().map(|entry| entry.key.clone()).collect()
    }

    pub fn values(&self) -> Vec<V> {
        self.entries_raw().iter().map(|entry| entry.value.get()).collect()
    }

    pub fn entries(&self) -> Vec<(K, V)> {
        self.entries_raw().iter().map(|entry| (entry.key.clone(), entry.value.get())).collect()
    }
}

fn new_entry<K, V>(group: &CheckpointGroup, hash: u64, key: K, value: V, next: Bucket<K, V>) -> Rc<Entry<K, V>>
where
    K: Clone + 'static,
    V: Clone + 'static, {
    let entry = versioned(|anchor| Entry {
        anchor,
        hash,
        key,
        value: Versioned::new(value),
        next: Versioned::new(next),
    });
    entry.set_checkpoint_group(group);
    entry
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap as StdHashMap;

    use super::*;

    fn sorted<T: Ord>(mut items: Vec<T>) -> Vec<T> {
        items.sort();
        items
    }

    #[test]
    fn behaves_like_a_map_without_checkpoints() {
        let map = HashMap::with_buckets(2);
        let mut expected = StdHashMap::new();
        for i in 0..50u32 {
            assert_eq!(map.insert(i % 17, i), expected.insert(i % 17, i));
        }
        for i in (0..17).step_by(3) {
            assert_eq!(map.remove(&i), expected.remove(&i));
        }
        assert_eq!(map.remove(&100), None);

        assert_eq!(map.len(), expected.len());
        assert_eq!(sorted(map.entries()), sorted(expected.into_iter().collect::<Vec<_>>()));
        assert!(map.buckets() * 3 >= map.len() * 4);
    }

    #[test]
    fn restore_undoes_inserts_removes_and_growth() {
        let map = HashMap::with_buckets(4);
        map.insert("a", 1);
        map.insert("b", 2);
        let group = map.checkpoint_group();
        let t1 = group.open();
        map.insert("a", 10);
        for key in &["c", "d", "e", "f"] {
            map.insert(*key, 0);
        }
        assert!(map.buckets() > 4);
        let t2 = group.open();
        map.remove(&"b");
        map.clear();
        map.insert("z", 26);

        group.restore(t2 - 1, false);
        assert_eq!(sorted(map.keys()), vec!["a", "b", "c", "d", "e", "f"]);
        assert_eq!(map.get(&"a"), Some(10));

        group.restore(t1 - 1, true);
        assert_eq!(sorted(map.entries()), vec![("a", 1), ("b", 2)]);
        assert_eq!(map.buckets(), 4);
        assert_eq!(map.get(&"c"), None);
        assert_eq!(group.len(), 3);
    }

    #[test]
    fn removed_entries_leave_the_group() {
        let map = HashMap::new();
        for i in 0..1_000u32 {
            map.insert(i, i);
            map.remove(&i);
        }
        assert!(map.is_empty());
        assert_eq!(map.checkpoint_group().registered(), 1);
    }

    #[test]
    fn clear_keeps_bucket_count() {
        let map = HashMap::new();
        map.insert(1, 'x');
        map.clear();
        assert!(map.is_empty());
        assert_eq!(map.buckets(), DEFAULT_BUCKETS);
        assert!(!map.contains_key(&1));
        assert_eq!(map.values(), Vec::<char>::new());
    }
}
