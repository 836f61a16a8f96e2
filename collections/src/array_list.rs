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

use std::cmp;
use std::rc::Rc;

use backtrack_engine::{versioned, Anchor, Rollbackable, Versioned, VersionedVec};

use super::base::CollectionBase;
use super::error::{check_index, Error, Result};

const DEFAULT_CAPACITY: usize = 10;

/// A growable array list.
///
/// The backing array is always at least `len()` long; slots past the end are
/// `None`. Growing assigns a fresh backing array, which moves the old one
/// into the history without copying it.
#[derive(Rollbackable)]
pub struct ArrayList<T: Clone + 'static> {
    #[rollback(base)]
    base: CollectionBase,
    #[rollback(anchor)]
    anchor: Anchor,
    data: VersionedVec<Option<T>>,
    size: Versioned<usize>,
}

impl<T: Clone + 'static> ArrayList<T> {
    pub fn new() -> Rc<Self> {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Rc<Self> {
        versioned(|anchor| ArrayList {
            base: Default::default(),
            anchor,
            data: VersionedVec::from_elem(None, capacity),
            size: Versioned::new(0),
        })
    }

    pub fn len(&self) -> usize {
        self.size.get()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn mod_count(&self) -> u64 {
        self.base.mod_count()
    }

    fn ensure_capacity(&self, needed: usize) {
        let capacity = self.data.len();
        if needed <= capacity {
            return
        }
        let capacity = cmp::max(needed, capacity + capacity / 2 + 1);
        let mut grown = Vec::with_capacity(capacity);
        grown.extend(self.data.borrow().iter().cloned());
        grown.resize(capacity, None);
        self.data.assign(&self.anchor, grown);
    }

    pub fn get(&self, index: usize) -> Result<T> {
        check_index(index, self.len())?;
        Ok(self.element(index))
    }

    fn element(&self, index: usize) -> T {
        self.data.borrow()[index].clone().expect("Slots below the size are occupied; qed")
    }

    /// Replace the element at `index` and return the old one.
    pub fn set(&self, index: usize, value: T) -> Result<T> {
        check_index(index, self.len())?;
        let old = self.data.set(&self.anchor, index, Some(value));
        Ok(old.expect("Slots below the size are occupied; qed"))
    }

    pub fn push(&self, value: T) {
        let size = self.len();
        self.ensure_capacity(size + 1);
        self.data.set(&self.anchor, size, Some(value));
        self.size.set(&self.anchor, size + 1);
        self.base.touch(&self.anchor);
    }

    pub fn pop(&self) -> Option<T> {
        let size = self.len();
        if size == 0 {
            return None
        }
        let last = self.data.set(&self.anchor, size - 1, None);
        self.size.set(&self.anchor, size - 1);
        self.base.touch(&self.anchor);
        last
    }

    /// Insert `value` at `index`, shifting the elements after it.
    pub fn insert(&self, index: usize, value: T) -> Result<()> {
        let size = self.len();
        if index > size {
            return Err(Error::IndexOutOfBounds {
                index,
                len: size,
            })
        }
        if index == size {
            self.push(value);
            return Ok(())
        }
        self.ensure_capacity(size + 1);
        {
            let mut data = self.data.backup(&self.anchor);
            data[index..=size].rotate_right(1);
            data[index] = Some(value);
        }
        self.size.set(&self.anchor, size + 1);
        self.base.touch(&self.anchor);
        Ok(())
    }

    /// Remove the element at `index`, shifting the elements after it.
    pub fn remove(&self, index: usize) -> Result<T> {
        let size = self.len();
        check_index(index, size)?;
        if index + 1 == size {
            return Ok(self.pop().expect("The list is not empty; qed"))
        }
        let removed = {
            let mut data = self.data.backup(&self.anchor);
            let removed = data[index].take();
            data[index..size].rotate_left(1);
            removed
        };
        self.size.set(&self.anchor, size - 1);
        self.base.touch(&self.anchor);
        Ok(removed.expect("Slots below the size are occupied; qed"))
    }

    pub fn clear(&self) {
        let size = self.len();
        if size == 0 {
            return
        }
        {
            let mut data = self.data.backup(&self.anchor);
            for slot in &mut data[..size] {
                *slot = None;
            }
        }
        self.size.set(&self.anchor, 0);
        self.base.touch(&self.anchor);
    }

    pub fn to_vec(&self) -> Vec<T> {
        let size = self.len();
        self.data.borrow()[..size].iter().cloned().map(|slot| slot.expect("Slots below the size are occupied; qed")).collect()
    }

    /// A cursor over the list, in the list's checkpoint group.
    pub fn cursor(self: &Rc<Self>) -> Rc<ListCursor<T>> {
        let cursor = versioned(|anchor| ListCursor {
            anchor,
            list: Rc::clone(self),
            next: Versioned::new(0),
            last_returned: Versioned::new(None),
            expected_mod_count: Versioned::new(self.mod_count()),
        });
        cursor.set_checkpoint_group(&self.checkpoint_group());
        cursor
    }
}

impl<T: Clone + PartialEq + 'static> ArrayList<T> {
    pub fn index_of(&self, value: &T) -> Option<usize> {
        let size = self.len();
        self.data.borrow()[..size].iter().position(|slot| slot.as_ref() == Some(value))
    }

    pub fn contains(&self, value: &T) -> bool {
        self.index_of(value).is_some()
    }
}

/// Forward cursor over an `ArrayList`.
///
/// The cursor is versioned itself, so restoring the list's group also moves
/// the cursor back. Structural changes made to the list other than through
/// the cursor make it fail with `Error::ConcurrentModification`.
#[derive(Rollbackable)]
pub struct ListCursor<T: Clone + 'static> {
    #[rollback(anchor)]
    anchor: Anchor,
    #[rollback(skip)]
    list: Rc<ArrayList<T>>,
    next: Versioned<usize>,
    last_returned: Versioned<Option<usize>>,
    expected_mod_count: Versioned<u64>,
}

impl<T: Clone + 'static> ListCursor<T> {
    fn check_for_comodification(&self) -> Result<()> {
        if self.list.mod_count() != self.expected_mod_count.get() {
            return Err(Error::ConcurrentModification)
        }
        Ok(())
    }

    pub fn has_next(&self) -> bool {
        self.next.get() < self.list.len()
    }

    /// Position of the element `next` would return.
    pub fn position(&self) -> usize {
        self.next.get()
    }

    pub fn next(&self) -> Result<T> {
        self.check_for_comodification()?;
        let index = self.next.get();
        if index >= self.list.len() {
            return Err(Error::NoCurrentElement)
        }
        let value = self.list.get(index)?;
        self.next.set(&self.anchor, index + 1);
        self.last_returned.set(&self.anchor, Some(index));
        Ok(value)
    }

    /// Remove the element last returned by `next`.
    pub fn remove(&self) -> Result<T> {
        let index = self.last_returned.get().ok_or(Error::NoCurrentElement)?;
        self.check_for_comodification()?;
        let removed = self.list.remove(index)?;
        self.next.set(&self.anchor, index);
        self.last_returned.set(&self.anchor, None);
        self.expected_mod_count.set(&self.anchor, self.list.mod_count());
        Ok(removed)
    }

    /// Replace the element last returned by `next`.
    pub fn set(&self, value: T) -> Result<T> {
        let index = self.last_returned.get().ok_or(Error::NoCurrentElement)?;
        self.check_for_comodification()?;
        self.list.set(index, value)
    }
}
