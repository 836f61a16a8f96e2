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

use super::super::Timestamp;
use super::Journal;

/// Undo log of a single scalar field.
///
/// Each entry holds the value the field had before the first write at a
/// timestamp. Later writes at the same timestamp are not recorded: restoring
/// only ever needs the value as of the restore point.
#[derive(Clone, Debug)]
pub struct FieldHistory<T> {
    journal: Journal<T>,
}

impl<T> FieldHistory<T> {
    pub fn new() -> Self {
        Self {
            journal: Journal::new(),
        }
    }

    /// Whether a write at `timestamp` would be dropped as redundant.
    pub fn is_recorded_at(&self, timestamp: Timestamp) -> bool {
        self.journal.last_timestamp() == Some(timestamp)
    }

    /// Remember `old` as the value before a write at `timestamp`.
    ///
    /// The caller checks that checkpointing is active.
    pub fn record(&mut self, old: T, timestamp: Timestamp) {
        if self.is_recorded_at(timestamp) {
            return
        }
        self.journal.push(old, timestamp);
    }

    pub fn commit(&mut self, horizon: Timestamp) {
        self.journal.commit(horizon);
    }

    pub fn push_epoch(&mut self, since: Timestamp) {
        self.journal.push_epoch(since);
    }

    pub fn pop_epoch(&mut self) {
        self.journal.pop_epoch();
    }

    /// Number of entries in the current epoch.
    pub fn len(&self) -> usize {
        self.journal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of stacked epochs, the active one included.
    pub fn depth(&self) -> usize {
        self.journal.depth()
    }
}

impl<T: Clone> FieldHistory<T> {
    /// The value the field had at `target`, if anything changed since.
    ///
    /// Undoing the entries newest first ends with the oldest one newer than
    /// `target`, so that entry alone decides the result.
    pub fn rewind(&mut self, target: Timestamp, trim: bool) -> Option<T> {
        if trim {
            self.journal.drain_newer_than(target).next()
        } else {
            self.journal.newer_than(target).next().cloned()
        }
    }

    /// Reconstruct the value as of `target` from `current`.
    pub fn restore(&mut self, current: T, target: Timestamp, trim: bool) -> T {
        self.rewind(target, trim).unwrap_or(current)
    }
}

impl<T> Default for FieldHistory<T> {
    fn default() -> Self {
        Self::new()
    }
}
