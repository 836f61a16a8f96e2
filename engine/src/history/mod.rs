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

mod array;
mod field;
mod membership;

pub use self::array::ArrayHistory;
pub use self::field::FieldHistory;
pub use self::membership::MembershipHistory;

use std::vec::Drain;

use super::Timestamp;

#[derive(Clone, Debug)]
struct Stamped<R> {
    record: R,
    timestamp: Timestamp,
}

#[derive(Clone, Debug)]
struct Epoch<R> {
    // Timestamp at which the epoch was pushed.
    since: Timestamp,
    records: Vec<Stamped<R>>,
}

impl<R> Epoch<R> {
    fn new(since: Timestamp) -> Self {
        Self {
            since,
            records: Vec::new(),
        }
    }

    /// Index of the first record newer than `timestamp`.
    fn split_point(&self, timestamp: Timestamp) -> usize {
        self.records.partition_point(|stamped| stamped.timestamp <= timestamp)
    }
}

/// A stack of epochs, each an undo log ordered by timestamp.
///
/// Only the top epoch is visible. A new epoch is pushed when the owning
/// object joins another checkpoint group and popped when that join is undone.
#[derive(Clone, Debug)]
pub(crate) struct Journal<R> {
    epochs: Vec<Epoch<R>>,
}

impl<R> Journal<R> {
    pub fn new() -> Self {
        Self {
            epochs: vec![Epoch::new(0)],
        }
    }

    fn top(&self) -> &Epoch<R> {
        self.epochs.last().expect("The base epoch is never popped; qed")
    }

    fn top_mut(&mut self) -> &mut Epoch<R> {
        self.epochs.last_mut().expect("The base epoch is never popped; qed")
    }

    pub fn push(&mut self, record: R, timestamp: Timestamp) {
        debug_assert!(
            self.last_timestamp().map_or(true, |last| last <= timestamp),
            "Records must be appended in timestamp order: {:?} > {}",
            self.last_timestamp(),
            timestamp
        );
        self.top_mut().records.push(Stamped {
            record,
            timestamp,
        });
    }

    pub fn last_timestamp(&self) -> Option<Timestamp> {
        self.top().records.last().map(|stamped| stamped.timestamp)
    }

    /// Records of the top epoch stamped with `timestamp`, newest first.
    pub fn recorded_at(&self, timestamp: Timestamp) -> impl Iterator<Item = &R> {
        self.top().records.iter().rev().take_while(move |stamped| stamped.timestamp == timestamp).map(|s| &s.record)
    }

    /// Records of the top epoch newer than `timestamp`, oldest first.
    pub fn newer_than(&self, timestamp: Timestamp) -> impl DoubleEndedIterator<Item = &R> {
        let top = self.top();
        top.records[top.split_point(timestamp)..].iter().map(|stamped| &stamped.record)
    }

    /// Remove and return the records of the top epoch newer than `timestamp`.
    pub fn drain_newer_than(&mut self, timestamp: Timestamp) -> impl DoubleEndedIterator<Item = R> + '_ {
        let top = self.top_mut();
        let at = top.split_point(timestamp);
        let drained: Drain<Stamped<R>> = top.records.drain(at..);
        drained.map(|stamped| stamped.record)
    }

    /// Forget everything a restore to `horizon` or later cannot reach.
    pub fn commit(&mut self, horizon: Timestamp) {
        // An epoch pushed at or before the horizon is never popped again, so
        // everything beneath it is unreachable.
        let keep_from = self.epochs.iter().rposition(|epoch| epoch.since <= horizon).unwrap_or(0);
        self.epochs.drain(..keep_from);
        for epoch in &mut self.epochs {
            let at = epoch.split_point(horizon);
            epoch.records.drain(..at);
        }
    }

    pub fn push_epoch(&mut self, since: Timestamp) {
        self.epochs.push(Epoch::new(since));
    }

    pub fn pop_epoch(&mut self) {
        assert!(
            self.epochs.len() > 1,
            "Field history has no epoch to pop: the checkpoint group and membership history are out of sync"
        );
        self.epochs.pop();
    }

    /// Number of records in the top epoch.
    pub fn len(&self) -> usize {
        self.top().records.len()
    }

    pub fn depth(&self) -> usize {
        self.epochs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn journal(timestamps: &[Timestamp]) -> Journal<Timestamp> {
        let mut journal = Journal::new();
        for ts in timestamps {
            journal.push(*ts * 10, *ts);
        }
        journal
    }

    #[test]
    fn newer_than_is_exclusive() {
        let journal = journal(&[1, 2, 3]);
        let newer: Vec<_> = journal.newer_than(1).cloned().collect();
        assert_eq!(newer, vec![20, 30]);
        assert_eq!(journal.newer_than(3).count(), 0);
    }

    #[test]
    fn drain_removes_newer_records() {
        let mut journal = journal(&[1, 2, 3]);
        let drained: Vec<_> = journal.drain_newer_than(1).rev().collect();
        assert_eq!(drained, vec![30, 20]);
        assert_eq!(journal.len(), 1);
    }

    #[test]
    fn commit_drops_records_at_or_below_horizon() {
        let mut journal = journal(&[1, 2, 3]);
        journal.commit(2);
        assert_eq!(journal.len(), 1);
        assert_eq!(journal.last_timestamp(), Some(3));
    }

    #[test]
    fn commit_drops_epochs_under_a_committed_epoch() {
        let mut journal = journal(&[1]);
        journal.push_epoch(2);
        journal.push(20, 2);
        journal.push_epoch(4);
        journal.push(40, 4);
        assert_eq!(journal.depth(), 3);

        journal.commit(3);
        // The epoch pushed at 2 can no longer be popped, so the base goes.
        assert_eq!(journal.depth(), 2);
        assert_eq!(journal.len(), 1);

        journal.pop_epoch();
        assert_eq!(journal.len(), 0);
    }

    #[test]
    #[should_panic(expected = "out of sync")]
    fn popping_the_base_epoch_panics() {
        let mut journal: Journal<u8> = Journal::new();
        journal.pop_epoch();
    }

    #[test]
    fn recorded_at_only_sees_the_top_timestamp() {
        let journal = journal(&[1, 2, 2]);
        assert_eq!(journal.recorded_at(2).count(), 2);
        assert_eq!(journal.recorded_at(1).count(), 0);
    }
}
