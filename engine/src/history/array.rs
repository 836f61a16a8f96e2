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

use std::collections::HashSet;

use super::super::Timestamp;
use super::Journal;

#[derive(Clone, Debug)]
enum ArrayRecord<T> {
    /// One element before it was overwritten.
    Slot {
        index: usize,
        old: T,
    },
    /// The whole array before an opaque bulk change.
    Bulk(Vec<T>),
}

impl<T: Clone> ArrayRecord<T> {
    fn undo(&self, items: &mut Vec<T>) {
        match self {
            ArrayRecord::Slot {
                index,
                old,
            } => {
                // A replayed slot can be out of range when an older snapshot
                // is about to restore the length.
                if let Some(slot) = items.get_mut(*index) {
                    *slot = old.clone();
                }
            }
            ArrayRecord::Bulk(old) => {
                items.clone_from(old);
            }
        }
    }

    fn undo_into(self, items: &mut Vec<T>) {
        match self {
            ArrayRecord::Slot {
                index,
                old,
            } => {
                if let Some(slot) = items.get_mut(index) {
                    *slot = old;
                }
            }
            ArrayRecord::Bulk(old) => {
                *items = old;
            }
        }
    }
}

/// What has already been saved at one timestamp.
#[derive(Clone, Debug, Default)]
struct Coverage {
    timestamp: Timestamp,
    slots: HashSet<usize>,
    bulk: bool,
}

/// Undo log of an array field.
///
/// Single-slot writes are logged with their index. Operations that move many
/// elements at once log a snapshot of the whole array instead. Within one
/// timestamp a slot is saved at most once, and nothing more is saved after a
/// snapshot.
#[derive(Clone, Debug)]
pub struct ArrayHistory<T> {
    journal: Journal<ArrayRecord<T>>,
    // Rebuilt from the journal whenever it does not describe the timestamp
    // being recorded; zero marks it stale.
    coverage: Coverage,
}

impl<T> ArrayHistory<T> {
    pub fn new() -> Self {
        Self {
            journal: Journal::new(),
            coverage: Coverage::default(),
        }
    }

    fn sync_coverage(&mut self, timestamp: Timestamp) {
        if self.coverage.timestamp == timestamp {
            return
        }
        let mut coverage = Coverage {
            timestamp,
            ..Default::default()
        };
        for record in self.journal.recorded_at(timestamp) {
            match record {
                ArrayRecord::Slot {
                    index,
                    ..
                } => {
                    coverage.slots.insert(*index);
                }
                ArrayRecord::Bulk(_) => coverage.bulk = true,
            }
        }
        self.coverage = coverage;
    }

    fn invalidate_coverage(&mut self) {
        self.coverage = Coverage::default();
    }

    /// Whether the whole array is already saved at `timestamp`.
    pub fn is_backed_up(&mut self, timestamp: Timestamp) -> bool {
        self.sync_coverage(timestamp);
        self.coverage.bulk
    }

    /// Remember `old` as the element at `index` before a write at `timestamp`.
    pub fn record(&mut self, index: usize, old: T, timestamp: Timestamp) {
        self.sync_coverage(timestamp);
        if self.coverage.bulk || !self.coverage.slots.insert(index) {
            return
        }
        self.journal.push(
            ArrayRecord::Slot {
                index,
                old,
            },
            timestamp,
        );
    }

    /// Remember the whole array before a bulk change at `timestamp`.
    pub fn snapshot_backup(&mut self, full: Vec<T>, timestamp: Timestamp) {
        if self.is_backed_up(timestamp) {
            return
        }
        self.coverage.bulk = true;
        self.journal.push(ArrayRecord::Bulk(full), timestamp);
    }

    pub fn commit(&mut self, horizon: Timestamp) {
        self.journal.commit(horizon);
        self.invalidate_coverage();
    }

    pub fn push_epoch(&mut self, since: Timestamp) {
        self.journal.push_epoch(since);
        self.invalidate_coverage();
    }

    pub fn pop_epoch(&mut self) {
        self.journal.pop_epoch();
        self.invalidate_coverage();
    }

    pub fn len(&self) -> usize {
        self.journal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn depth(&self) -> usize {
        self.journal.depth()
    }
}

impl<T: Clone> ArrayHistory<T> {
    /// Undo, newest first, every entry newer than `target` on `items`.
    pub fn rewind(&mut self, items: &mut Vec<T>, target: Timestamp, trim: bool) {
        if trim {
            for record in self.journal.drain_newer_than(target).rev() {
                record.undo_into(items);
            }
            self.invalidate_coverage();
        } else {
            for record in self.journal.newer_than(target).rev() {
                record.undo(items);
            }
        }
    }

    /// Reconstruct the array as of `target` from `current`.
    pub fn restore(&mut self, mut current: Vec<T>, target: Timestamp, trim: bool) -> Vec<T> {
        self.rewind(&mut current, target, trim);
        current
    }
}

impl<T> Default for ArrayHistory<T> {
    fn default() -> Self {
        Self::new()
    }
}
