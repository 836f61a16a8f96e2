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

use std::rc::{Rc, Weak};

use backtrack_engine::{versioned, Anchor, CheckpointGroup, Rollbackable, Versioned};

use super::base::CollectionBase;
use super::error::{check_index, Error, Result};

#[derive(Rollbackable)]
struct Node<T: Clone + 'static> {
    #[rollback(anchor)]
    anchor: Anchor,
    data: Versioned<T>,
    next: Versioned<Option<Rc<Node<T>>>>,
    previous: Versioned<Option<Weak<Node<T>>>>,
}

impl<T: Clone + 'static> Node<T> {
    /// A node that already belongs to `group`.
    fn new_in(
        group: &CheckpointGroup,
        data: T,
        previous: Option<&Rc<Node<T>>>,
        next: Option<&Rc<Node<T>>>,
    ) -> Rc<Self> {
        let node = versioned(|anchor| Node {
            anchor,
            data: Versioned::new(data),
            next: Versioned::new(next.cloned()),
            previous: Versioned::new(previous.map(Rc::downgrade)),
        });
        node.set_checkpoint_group(group);
        node
    }

    fn next(&self) -> Option<Rc<Node<T>>> {
        self.next.get()
    }

    fn previous(&self) -> Option<Rc<Node<T>>> {
        self.previous.borrow().as_ref().and_then(Weak::upgrade)
    }

    fn set_next(&self, next: Option<Rc<Node<T>>>) {
        self.next.link(&self.anchor, next);
    }

    fn set_previous(&self, previous: Option<&Rc<Node<T>>>) {
        self.previous.link(&self.anchor, previous.map(Rc::downgrade));
    }
}

/// A doubly linked list.
///
/// Every node is a versioned object of its own that joins the list's
/// checkpoint group when it is created. Nodes are owned through `next`
/// links and through `head`/`tail`; back links are weak.
#[derive(Rollbackable)]
pub struct LinkedList<T: Clone + 'static> {
    #[rollback(base)]
    base: CollectionBase,
    #[rollback(anchor)]
    anchor: Anchor,
    head: Versioned<Option<Rc<Node<T>>>>,
    tail: Versioned<Option<Rc<Node<T>>>>,
    size: Versioned<usize>,
}

impl<T: Clone + 'static> LinkedList<T> {
    pub fn new() -> Rc<Self> {
        versioned(|anchor| LinkedList {
            base: Default::default(),
            anchor,
            head: Versioned::new(None),
            tail: Versioned::new(None),
            size: Versioned::new(0),
        })
    }

    pub fn len(&self) -> usize {
        self.size.get()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn mod_count(&self) -> u64 {
        self.base.mod_count()
    }

    fn resize(&self, size: usize) {
        self.size.set(&self.anchor, size);
        self.base.touch(&self.anchor);
    }

    pub fn front(&self) -> Option<T> {
        self.head.borrow().as_ref().map(|node| node.data.get())
    }

    pub fn back(&self) -> Option<T> {
        self.tail.borrow().as_ref().map(|node| node.data.get())
    }

    pub fn push_front(&self, value: T) {
        let head = self.head.get();
        let node = Node::new_in(&self.checkpoint_group(), value, None, head.as_ref());
        match &head {
            Some(head) => head.set_previous(Some(&node)),
            None => self.tail.link(&self.anchor, Some(Rc::clone(&node))),
        }
        self.head.link(&self.anchor, Some(node));
        self.resize(self.len() + 1);
    }

    pub fn push_back(&self, value: T) {
        let tail = self.tail.get();
        let node = Node::new_in(&self.checkpoint_group(), value, tail.as_ref(), None);
        match &tail {
            Some(tail) => tail.set_next(Some(Rc::clone(&node))),
            None => self.head.link(&self.anchor, Some(Rc::clone(&node))),
        }
        self.tail.link(&self.anchor, Some(node));
        self.resize(self.len() + 1);
    }

    pub fn pop_front(&self) -> Option<T> {
        let head = self.head.get()?;
        self.unlink(&head);
        Some(head.data.get())
    }

    pub fn pop_back(&self) -> Option<T> {
        let tail = self.tail.get()?;
        self.unlink(&tail);
        Some(tail.data.get())
    }

    /// Detach `node` from its neighbours. The node keeps its own links so
    /// that a cursor standing on it can still move on.
    fn unlink(&self, node: &Rc<Node<T>>) {
        let previous = node.previous();
        let next = node.next();
        match &previous {
            Some(previous) => previous.set_next(next.clone()),
            None => self.head.link(&self.anchor, next.clone()),
        }
        match &next {
            Some(next) => next.set_previous(previous.as_ref()),
            None => self.tail.link(&self.anchor, previous),
        }
        self.resize(self.len() - 1);
    }

    fn node(&self, index: usize) -> Result<Rc<Node<T>>> {
        let size = self.len();
        check_index(index, size)?;
        let missing = "Nodes below the size are linked; qed";
        if index < size / 2 {
            let mut node = self.head.get().expect(missing);
            for _ in 0..index {
                node = node.next().expect(missing);
            }
            Ok(node)
        } else {
            let mut node = self.tail.get().expect(missing);
            for _ in index + 1..size {
                node = node.previous().expect(missing);
            }
            Ok(node)
        }
    }

    pub fn get(&self, index: usize) -> Result<T> {
        Ok(self.node(index)?.data.get())
    }

    /// Replace the element at `index` and return the old one.
    pub fn set(&self, index: usize, value: T) -> Result<T> {
        let node = self.node(index)?;
        Ok(node.data.replace(&node.anchor, value))
    }

    pub fn insert(&self, index: usize, value: T) -> Result<()> {
        let size = self.len();
        if index == size {
            self.push_back(value);
            return Ok(())
        }
        if index > size {
            return Err(Error::IndexOutOfBounds {
                index,
                len: size,
            })
        }
        let successor = self.node(index)?;
        self.link_before(&successor, value);
        Ok(())
    }

    fn link_before(&self, successor: &Rc<Node<T>>, value: T) {
        let predecessor = successor.previous();
        let node = Node::new_in(&self.checkpoint_group(), value, predecessor.as_ref(), Some(successor));
        successor.set_previous(Some(&node));
        match predecessor {
            Some(predecessor) => predecessor.set_next(Some(node)),
            None => self.head.link(&self.anchor, Some(node)),
        }
        self.resize(self.len() + 1);
    }

    pub fn remove(&self, index: usize) -> Result<T> {
        let node = self.node(index)?;
        self.unlink(&node);
        Ok(node.data.get())
    }

    pub fn clear(&self) {
        if self.is_empty() {
            return
        }
        self.head.set(&self.anchor, None);
        self.tail.set(&self.anchor, None);
        self.resize(0);
    }

    pub fn to_vec(&self) -> Vec<T> {
        let mut values = Vec::with_capacity(self.len());
        let mut node = self.head.get();
        while let Some(current) = node {
            values.push(current.data.get());
            node = current.next();
        }
        values
    }

    /// A cursor positioned before the first element, in the list's
    /// checkpoint group.
    pub fn cursor(self: &Rc<Self>) -> Rc<LinkedCursor<T>> {
        let cursor = versioned(|anchor| LinkedCursor {
            anchor,
            list: Rc::clone(self),
            next: Versioned::new(self.head.get()),
            last_returned: Versioned::new(None),
            position: Versioned::new(0),
            expected_mod_count: Versioned::new(self.mod_count()),
        });
        cursor.set_checkpoint_group(&self.checkpoint_group());
        cursor
    }
}

impl<T: Clone + PartialEq + 'static> LinkedList<T> {
    pub fn contains(&self, value: &T) -> bool {
        let mut node = self.head.get();
        while let Some(current) = node {
            if *current.data.borrow() == *value {
                return true
            }
            node = current.next();
        }
        false
    }
}

impl<T: Clone + 'static> Drop for LinkedList<T> {
    fn drop(&mut self) {
        // Unchain uniquely owned nodes one by one instead of recursively.
        self.tail.get_mut().take();
        let mut next = self.head.get_mut().take();
        while let Some(node) = next {
            next = match Rc::try_unwrap(node) {
                Ok(node) => node.next.into_inner(),
                Err(_) => None,
            };
        }
    }
}

/// Forward cursor over a `LinkedList`.
#[derive(Rollbackable)]
pub struct LinkedCursor<T: Clone + 'static> {
    #[rollback(anchor)]
    anchor: Anchor,
    #[rollback(skip)]
    list: Rc<LinkedList<T>>,
    next: Versioned<Option<Rc<Node<T>>>>,
    last_returned: Versioned<Option<Rc<Node<T>>>>,
    position: Versioned<usize>,
    expected_mod_count: Versioned<u64>,
}

impl<T: Clone + 'static> LinkedCursor<T> {
    fn check_for_comodification(&self) -> Result<()> {
        if self.list.mod_count() != self.expected_mod_count.get() {
            return Err(Error::ConcurrentModification)
        }
        Ok(())
    }

    pub fn has_next(&self) -> bool {
        self.position.get() < self.list.len()
    }

    pub fn position(&self) -> usize {
        self.position.get()
    }

    pub fn next(&self) -> Result<T> {
        self.check_for_comodification()?;
        let node = self.next.get().ok_or(Error::NoCurrentElement)?;
        self.next.link(&self.anchor, node.next());
        self.position.update(&self.anchor, |position| *position += 1);
        let value = node.data.get();
        self.last_returned.link(&self.anchor, Some(node));
        Ok(value)
    }

    /// Remove the element last returned by `next`.
    pub fn remove(&self) -> Result<T> {
        let node = self.last_returned.get().ok_or(Error::NoCurrentElement)?;
        self.check_for_comodification()?;
        self.list.unlink(&node);
        self.position.update(&self.anchor, |position| *position -= 1);
        self.last_returned.set(&self.anchor, None);
        self.expected_mod_count.set(&self.anchor, self.list.mod_count());
        Ok(node.data.get())
    }

    /// Replace the element last returned by `next`.
    pub fn set(&self, value: T) -> Result<T> {
        let node = self.last_returned.get().ok_or(Error::NoCurrentElement)?;
        self.check_for_comodification()?;
        Ok(node.data.replace(&node.anchor, value))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;

    #[test]
    fn behaves_like_a_deque_without_checkpoints() {
        let list = LinkedList::new();
        let mut expected = VecDeque::new();
        for i in 0..6 {
            list.push_back(i);
            expected.push_back(i);
            list.push_front(-i);
            expected.push_front(-i);
        }
        assert_eq!(list.pop_front(), expected.pop_front());
        assert_eq!(list.pop_back(), expected.pop_back());
        list.insert(3, 50).unwrap();
        expected.insert(3, 50);
        assert_eq!(list.remove(7), Ok(expected.remove(7).unwrap()));
        assert_eq!(list.set(8, 80), Ok(expected[8]));
        expected[8] = 80;

        assert_eq!(list.to_vec(), expected.iter().cloned().collect::<Vec<_>>());
        assert_eq!(list.len(), expected.len());
        assert_eq!(list.front(), expected.front().cloned());
        assert_eq!(list.back(), expected.back().cloned());
        for (i, value) in expected.iter().enumerate() {
            assert_eq!(list.get(i), Ok(*value));
        }
        assert!(list.contains(&50));
    }

    #[test]
    fn empty_list_edges() {
        let list = LinkedList::<u8>::new();
        assert_eq!(list.pop_front(), None);
        assert_eq!(list.pop_back(), None);
        assert_eq!(list.front(), None);
        assert!(list.get(0).is_err());
        assert_eq!(
            list.insert(1, 0),
            Err(Error::IndexOutOfBounds {
                index: 1,
                len: 0
            })
        );
        list.insert(0, 7).unwrap();
        assert_eq!(list.to_vec(), vec![7]);
    }

    #[test]
    fn restore_relinks_removed_nodes() {
        let list = LinkedList::new();
        for c in "abc".chars() {
            list.push_back(c);
        }
        let group = list.checkpoint_group();
        let t1 = group.open();
        list.remove(1).unwrap();
        list.push_front('z');
        let t2 = group.open();
        list.clear();
        list.push_back('q');

        group.restore(t2 - 1, false);
        assert_eq!(list.to_vec(), vec!['z', 'a', 'c']);
        group.restore(t1 - 1, true);
        assert_eq!(list.to_vec(), vec!['a', 'b', 'c']);
        assert_eq!(list.back(), Some('c'));
        assert_eq!(list.get(2), Ok('c'));
    }

    #[test]
    fn nodes_created_while_active_leave_the_group_on_restore() {
        let list = LinkedList::new();
        list.push_back(1);
        let group = list.checkpoint_group();
        assert_eq!(group.len(), 2);

        let t1 = group.open();
        list.push_back(2);
        list.push_back(3);
        assert_eq!(group.len(), 4);

        group.restore(t1 - 1, true);
        assert_eq!(list.to_vec(), vec![1]);
        assert_eq!(group.len(), 2);
    }

    #[test]
    fn cursor_removes_and_rolls_back() {
        let list = LinkedList::new();
        for i in 1..=5 {
            list.push_back(i);
        }
        let group = list.checkpoint_group();
        let cursor = list.cursor();
        let t1 = group.open();
        while cursor.has_next() {
            if cursor.next().unwrap() % 2 == 0 {
                cursor.remove().unwrap();
            }
        }
        assert_eq!(list.to_vec(), vec![1, 3, 5]);
        assert_eq!(cursor.position(), 3);
        assert_eq!(cursor.next(), Err(Error::NoCurrentElement));

        group.restore(t1 - 1, true);
        assert_eq!(list.to_vec(), vec![1, 2, 3, 4, 5]);
        assert_eq!(cursor.position(), 0);
        assert_eq!(cursor.next(), Ok(1));
        assert_eq!(cursor.set(10), Ok(1));
        assert_eq!(list.front(), Some(10));
    }

    #[test]
    fn cursor_detects_outside_changes() {
        let list = LinkedList::new();
        list.push_back(1);
        let cursor = list.cursor();
        list.push_back(2);
        assert_eq!(cursor.next(), Err(Error::ConcurrentModification));
        assert_eq!(cursor.remove(), Err(Error::NoCurrentElement));
    }

    #[test]
    fn churn_without_checkpoints_keeps_the_group_small() {
        let list = LinkedList::new();
        for i in 0..10_000 {
            list.push_back(i);
            list.pop_front();
        }
        assert!(list.is_empty());
        assert_eq!(list.checkpoint_group().registered(), 1);
    }

    #[test]
    fn long_lists_drop_without_recursion() {
        let list = LinkedList::new();
        for i in 0..100_000u32 {
            list.push_back(i);
        }
        drop(list);
    }
}
