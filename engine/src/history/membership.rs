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

use super::super::group::CheckpointGroup;
use super::super::Timestamp;

#[derive(Clone, Debug)]
struct Transition {
    previous: CheckpointGroup,
    joined: CheckpointGroup,
    timestamp: Timestamp,
}

/// The checkpoint groups an object belonged to before its current one.
#[derive(Clone, Debug, Default)]
pub struct MembershipHistory {
    transitions: Vec<Transition>,
}

impl MembershipHistory {
    pub fn new() -> Self {
        Default::default()
    }

    /// Remember that the object left `previous` for `joined` at `timestamp`.
    pub fn record_transition(&mut self, previous: CheckpointGroup, joined: CheckpointGroup, timestamp: Timestamp) {
        debug_assert!(self.top_timestamp() <= timestamp);
        self.transitions.push(Transition {
            previous,
            joined,
            timestamp,
        });
    }

    /// Timestamp of the latest transition, or zero.
    pub fn top_timestamp(&self) -> Timestamp {
        self.transitions.last().map_or(0, |transition| transition.timestamp)
    }

    /// The group the object belongs to after undoing the latest transition
    /// newer than `target`, or `current` if there is none.
    ///
    /// A popped transition is always discarded: the field epoch that goes
    /// with it is dropped by the caller in both modes, so `_trim` has nothing
    /// to keep.
    ///
    /// Panics if the transition being undone did not lead to `current`,
    /// directly or through groups that were redirected into it.
    pub fn restore(&mut self, current: &CheckpointGroup, target: Timestamp, _trim: bool) -> CheckpointGroup {
        if target >= self.top_timestamp() {
            return current.clone()
        }
        let transition = self.transitions.pop().expect("top_timestamp is non-zero only with a transition; qed");
        assert!(
            transition.joined.resolve().ptr_eq(&current.resolve()),
            "Checkpoint group and membership history are out of sync: the latest transition at {} did not join the current group",
            transition.timestamp
        );
        transition.previous
    }

    /// Forget transitions that no restore to `horizon` or later can undo.
    pub fn commit(&mut self, horizon: Timestamp) {
        let keep_from = self.transitions.partition_point(|transition| transition.timestamp <= horizon);
        self.transitions.drain(..keep_from);
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_history_has_zero_top() {
        let history = MembershipHistory::new();
        assert_eq!(history.top_timestamp(), 0);
        assert!(history.is_empty());
    }

    #[test]
    fn restore_pops_one_transition_at_a_time() {
        let private = CheckpointGroup::new();
        let first = CheckpointGroup::new();
        let second = CheckpointGroup::new();

        let mut history = MembershipHistory::new();
        history.record_transition(private.clone(), first.clone(), 2);
        history.record_transition(first.clone(), second.clone(), 5);

        assert_eq!(history.restore(&second, 5, true), second);
        assert_eq!(history.len(), 2);

        assert_eq!(history.restore(&second, 1, true), first);
        assert_eq!(history.top_timestamp(), 2);
        assert_eq!(history.restore(&first, 1, true), private);
        assert!(history.is_empty());
    }

    #[test]
    fn restore_follows_a_redirected_joined_group() {
        let private = CheckpointGroup::new();
        let joined = CheckpointGroup::new();
        let merged = CheckpointGroup::new();

        let mut history = MembershipHistory::new();
        history.record_transition(private.clone(), joined.clone(), 1);
        joined.redirect_to(&merged);

        assert_eq!(history.restore(&merged, 0, true), private);
        assert!(history.is_empty());
    }

    #[test]
    #[should_panic(expected = "out of sync")]
    fn restore_from_an_unrelated_group_panics() {
        let mut history = MembershipHistory::new();
        history.record_transition(CheckpointGroup::new(), CheckpointGroup::new(), 3);
        history.restore(&CheckpointGroup::new(), 1, false);
    }

    #[test]
    fn commit_drops_transitions_at_or_below_horizon() {
        let a = CheckpointGroup::new();
        let b = CheckpointGroup::new();
        let c = CheckpointGroup::new();
        let mut history = MembershipHistory::new();
        history.record_transition(a, b.clone(), 2);
        history.record_transition(b, c, 4);

        history.commit(3);
        assert_eq!(history.len(), 1);
        assert_eq!(history.top_timestamp(), 4);
        history.commit(4);
        assert!(history.is_empty());
    }
}
