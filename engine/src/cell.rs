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

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::mem;

use super::anchor::Anchor;
use super::history::{ArrayHistory, FieldHistory};
use super::traits::{Joinable, Tracked};
use super::Timestamp;

/// A field whose overwritten values are kept while checkpointing is active.
///
/// Writes take the anchor of the owning object, which decides whether and
/// at which timestamp the old value is recorded.
pub struct Versioned<T> {
    value: RefCell<T>,
    history: RefCell<FieldHistory<T>>,
}

impl<T> Versioned<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: RefCell::new(value),
            history: Default::default(),
        }
    }

    pub fn borrow(&self) -> Ref<T> {
        self.value.borrow()
    }

    pub fn into_inner(self) -> T {
        self.value.into_inner()
    }

    /// Unrecorded access. Only for teardown and construction.
    pub fn get_mut(&mut self) -> &mut T {
        self.value.get_mut()
    }

    pub fn history_len(&self) -> usize {
        self.history.borrow().len()
    }

    pub fn history_depth(&self) -> usize {
        self.history.borrow().depth()
    }

    /// Overwrite the value.
    pub fn set(&self, anchor: &Anchor, value: T) {
        let timestamp = anchor.timestamp();
        let old = mem::replace(&mut *self.value.borrow_mut(), value);
        if timestamp > 0 {
            self.history.borrow_mut().record(old, timestamp);
        }
    }
}

impl<T: Clone> Versioned<T> {
    pub fn get(&self) -> T {
        self.value.borrow().clone()
    }

    /// Overwrite the value and return the previous one.
    pub fn replace(&self, anchor: &Anchor, value: T) -> T {
        let timestamp = anchor.timestamp();
        let old = mem::replace(&mut *self.value.borrow_mut(), value);
        if timestamp > 0 {
            self.history.borrow_mut().record(old.clone(), timestamp);
        }
        old
    }

    /// Modify the value in place.
    ///
    /// `f` must not access this cell.
    pub fn update<R, F>(&self, anchor: &Anchor, f: F) -> R
    where
        F: FnOnce(&mut T) -> R, {
        let timestamp = anchor.timestamp();
        let mut value = self.value.borrow_mut();
        if timestamp > 0 {
            let mut history = self.history.borrow_mut();
            if !history.is_recorded_at(timestamp) {
                history.record(value.clone(), timestamp);
            }
        }
        f(&mut value)
    }
}

impl<T: Joinable> Versioned<T> {
    /// Overwrite the value with one that becomes reachable through the owner,
    /// pulling it into the owner's checkpoint group first.
    pub fn link(&self, anchor: &Anchor, value: T) {
        anchor.adopt(&value);
        self.set(anchor, value);
    }
}

impl<T: Clone> Tracked for Versioned<T> {
    fn restore(&self, timestamp: Timestamp, trim: bool) {
        if let Some(old) = self.history.borrow_mut().rewind(timestamp, trim) {
            *self.value.borrow_mut() = old;
        }
    }

    fn commit(&self, horizon: Timestamp) {
        self.history.borrow_mut().commit(horizon);
    }

    fn push_epoch(&self, since: Timestamp) {
        self.history.borrow_mut().push_epoch(since);
    }

    fn pop_epoch(&self) {
        self.history.borrow_mut().pop_epoch();
    }
}

impl<T: Default> Default for Versioned<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Versioned<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.value.borrow().fmt(f)
    }
}

/// An array field, recorded slot by slot or as a whole.
pub struct VersionedVec<T> {
    items: RefCell<Vec<T>>,
    history: RefCell<ArrayHistory<T>>,
}

impl<T> VersionedVec<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items: RefCell::new(items),
            history: Default::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    pub fn borrow(&self) -> Ref<Vec<T>> {
        self.items.borrow()
    }

    pub fn into_inner(self) -> Vec<T> {
        self.items.into_inner()
    }

    pub fn history_len(&self) -> usize {
        self.history.borrow().len()
    }

    /// Replace the whole array. The old one moves into the history as is.
    pub fn assign(&self, anchor: &Anchor, items: Vec<T>) {
        let timestamp = anchor.timestamp();
        let old = mem::replace(&mut *self.items.borrow_mut(), items);
        if timestamp > 0 {
            self.history.borrow_mut().snapshot_backup(old, timestamp);
        }
    }
}

impl<T: Clone> VersionedVec<T> {
    pub fn from_elem(elem: T, len: usize) -> Self {
        Self::new(vec![elem; len])
    }

    pub fn get(&self, index: usize) -> Option<T> {
        self.items.borrow().get(index).cloned()
    }

    /// Overwrite one slot and return its previous value.
    ///
    /// Panics if `index` is out of bounds.
    pub fn set(&self, anchor: &Anchor, index: usize, value: T) -> T {
        let timestamp = anchor.timestamp();
        let mut items = self.items.borrow_mut();
        let len = items.len();
        let slot = items.get_mut(index).unwrap_or_else(|| panic!("index {} out of bounds for length {}", index, len));
        let old = mem::replace(slot, value);
        if timestamp > 0 {
            self.history.borrow_mut().record(index, old.clone(), timestamp);
        }
        old
    }

    /// Save the whole array, then hand out mutable access for a change that
    /// touches many slots at once.
    ///
    /// The snapshot is only taken once per timestamp.
    pub fn backup(&self, anchor: &Anchor) -> RefMut<Vec<T>> {
        let timestamp = anchor.timestamp();
        let items = self.items.borrow_mut();
        if timestamp > 0 {
            let mut history = self.history.borrow_mut();
            if !history.is_backed_up(timestamp) {
                history.snapshot_backup(items.clone(), timestamp);
            }
        }
        items
    }
}

impl<T: Clone> Tracked for VersionedVec<T> {
    fn restore(&self, timestamp: Timestamp, trim: bool) {
        self.history.borrow_mut().rewind(&mut self.items.borrow_mut(), timestamp, trim);
    }

    fn commit(&self, horizon: Timestamp) {
        self.history.borrow_mut().commit(horizon);
    }

    fn push_epoch(&self, since: Timestamp) {
        self.history.borrow_mut().push_epoch(since);
    }

    fn pop_epoch(&self) {
        self.history.borrow_mut().pop_epoch();
    }
}

impl<T> Default for VersionedVec<T> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<T: fmt::Debug> fmt::Debug for VersionedVec<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.items.borrow().fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::super::anchor::versioned;
    use super::super::group::CheckpointGroup;
    use super::super::traits::Rollbackable;
    use super::*;

    struct Grid {
        anchor: Anchor,
        cells: VersionedVec<u8>,
        generation: Versioned<u64>,
    }

    impl Rollbackable for Grid {
        fn checkpoint_group(&self) -> CheckpointGroup {
            self.anchor.group()
        }

        fn set_checkpoint_group(&self, group: &CheckpointGroup) {
            self.anchor.join(group, &[&self.cells, &self.generation]);
        }

        fn restore(&self, timestamp: Timestamp, trim: bool) {
            self.anchor.restore(timestamp, trim, &[&self.cells, &self.generation]);
        }

        fn commit(&self, timestamp: Timestamp) {
            self.anchor.commit(timestamp, &[&self.cells, &self.generation]);
        }
    }

    fn grid(len: usize) -> Rc<Grid> {
        versioned(|anchor| Grid {
            anchor,
            cells: VersionedVec::from_elem(0, len),
            generation: Versioned::new(0),
        })
    }

    #[test]
    fn update_records_once_per_timestamp() {
        let g = grid(0);
        let group = g.checkpoint_group();
        let t1 = group.open();
        for _ in 0..10 {
            g.generation.update(&g.anchor, |n| *n += 1);
        }
        assert_eq!(g.generation.get(), 10);
        assert_eq!(g.generation.history_len(), 1);

        g.restore(t1 - 1, true);
        assert_eq!(g.generation.get(), 0);
    }

    #[test]
    fn replace_returns_previous_value() {
        let g = grid(0);
        g.checkpoint_group().open();
        assert_eq!(g.generation.replace(&g.anchor, 3), 0);
        assert_eq!(g.generation.replace(&g.anchor, 4), 3);
    }

    #[test]
    fn slot_and_bulk_changes_restore_together() {
        let g = grid(4);
        let group = g.checkpoint_group();
        let t1 = group.open();
        g.cells.set(&g.anchor, 1, 5);
        let t2 = group.open();
        {
            let mut cells = g.cells.backup(&g.anchor);
            cells.rotate_left(1);
            cells.push(9);
        }
        g.cells.set(&g.anchor, 0, 7);
        assert_eq!(*g.cells.borrow(), vec![7, 0, 0, 0, 9]);

        g.restore(t2 - 1, false);
        assert_eq!(*g.cells.borrow(), vec![0, 5, 0, 0]);
        g.restore(t1 - 1, false);
        assert_eq!(*g.cells.borrow(), vec![0, 0, 0, 0]);
    }

    #[test]
    fn assign_moves_the_old_array_into_history() {
        let g = grid(2);
        let group = g.checkpoint_group();
        let t1 = group.open();
        g.cells.assign(&g.anchor, vec![1, 2, 3, 4]);
        assert_eq!(g.cells.len(), 4);
        assert_eq!(g.cells.history_len(), 1);

        g.restore(t1 - 1, true);
        assert_eq!(*g.cells.borrow(), vec![0, 0]);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn set_out_of_bounds_panics() {
        let g = grid(1);
        g.cells.set(&g.anchor, 3, 1);
    }

    #[test]
    fn inactive_array_writes_leave_no_history() {
        let g = grid(8);
        for i in 0..8 {
            g.cells.set(&g.anchor, i, i as u8);
        }
        g.cells.backup(&g.anchor).reverse();
        g.cells.assign(&g.anchor, vec![]);
        assert_eq!(g.cells.history_len(), 0);
    }
}
