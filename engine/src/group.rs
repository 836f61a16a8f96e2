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

use std::cell::{Cell, RefCell};
use std::cmp;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use super::traits::Rollbackable;
use super::Timestamp;

type MemberKey = usize;

fn member_key(object: &Weak<dyn Rollbackable>) -> MemberKey {
    object.as_ptr() as *const () as MemberKey
}

struct GroupState {
    timestamp: Cell<Timestamp>,
    members: RefCell<HashMap<MemberKey, Weak<dyn Rollbackable>>>,
    // Set once every member moved to another group.
    successor: RefCell<Option<CheckpointGroup>>,
}

/// Shared restore timeline.
///
/// Cloning the handle shares the timeline. Members are held weakly; members
/// hold their group strongly.
#[derive(Clone)]
pub struct CheckpointGroup(Rc<GroupState>);

impl CheckpointGroup {
    /// Create an inactive group without members.
    pub fn new() -> Self {
        CheckpointGroup(Rc::new(GroupState {
            timestamp: Cell::new(0),
            members: Default::default(),
            successor: Default::default(),
        }))
    }

    /// Open a new restore point and return its timestamp.
    ///
    /// Changes made by members from now on are recorded against the returned
    /// timestamp.
    pub fn open(&self) -> Timestamp {
        let group = self.resolve();
        let timestamp = group.0.timestamp.get() + 1;
        group.0.timestamp.set(timestamp);
        ctrace!(GROUP, "Restore point {} opened", timestamp);
        timestamp
    }

    pub fn timestamp(&self) -> Timestamp {
        match *self.0.successor.borrow() {
            None => self.0.timestamp.get(),
            Some(ref successor) => successor.timestamp(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.timestamp() > 0
    }

    /// The group this handle currently stands for, following redirections.
    pub fn resolve(&self) -> CheckpointGroup {
        let mut group = self.clone();
        loop {
            let next = match *group.0.successor.borrow() {
                None => return group.clone(),
                Some(ref successor) => successor.clone(),
            };
            group = next;
        }
    }

    pub fn is_redirected(&self) -> bool {
        self.0.successor.borrow().is_some()
    }

    pub fn ptr_eq(&self, other: &CheckpointGroup) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn add_member(&self, object: Weak<dyn Rollbackable>) {
        let mut members = self.0.members.borrow_mut();
        let key = member_key(&object);
        let is_live = members.get(&key).map_or(false, |member| member.strong_count() > 0);
        if !is_live {
            members.insert(key, object);
        }
    }

    pub fn remove_member(&self, object: &Weak<dyn Rollbackable>) {
        self.0.members.borrow_mut().remove(&member_key(object));
    }

    pub fn contains(&self, object: &Weak<dyn Rollbackable>) -> bool {
        self.0.members.borrow().contains_key(&member_key(object))
    }

    /// Live members. Members that were dropped are forgotten on the way.
    pub fn members(&self) -> Vec<Rc<dyn Rollbackable>> {
        let mut members = self.0.members.borrow_mut();
        members.retain(|_, member| member.strong_count() > 0);
        members.values().filter_map(Weak::upgrade).collect()
    }

    pub fn len(&self) -> usize {
        self.members().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of registered members, counting dropped ones that were not
    /// forgotten yet.
    pub fn registered(&self) -> usize {
        self.0.members.borrow().len()
    }

    /// Hand this group over to `other`.
    ///
    /// Every remaining member joins `other`, and holders of this handle
    /// resolve to `other` from now on.
    pub fn redirect_to(&self, other: &CheckpointGroup) {
        let other = other.resolve();
        if self.ptr_eq(&other) {
            return
        }
        *self.0.successor.borrow_mut() = Some(other.clone());

        let members: Vec<_> = self.0.members.borrow_mut().drain().map(|(_, member)| member).collect();
        let moving: Vec<_> = members.iter().filter_map(Weak::upgrade).collect();
        if !moving.is_empty() {
            cdebug!(GROUP, "Redirecting {} members to group at {}", moving.len(), other.timestamp());
        }
        for member in moving {
            member.set_checkpoint_group(&other);
        }
    }

    /// Take this group back into use after a member returned to it.
    pub(crate) fn reclaim(&self) {
        self.0.successor.borrow_mut().take();
    }

    /// Restore every member to `timestamp`.
    pub fn restore(&self, timestamp: Timestamp, trim: bool) {
        let group = self.resolve();
        let members = group.members();
        cdebug!(RESTORE, "Restoring {} members to {} (trim: {})", members.len(), timestamp, trim);
        for member in members {
            member.restore(timestamp, trim);
        }
    }

    /// Commit every member up to `horizon`.
    ///
    /// A horizon newer than the current timestamp is clamped to it. Returns
    /// the horizon that was applied.
    pub fn commit(&self, horizon: Timestamp) -> Timestamp {
        let group = self.resolve();
        let current = group.timestamp();
        if horizon > current {
            cwarn!(COMMIT, "Commit horizon {} is newer than the current timestamp {}", horizon, current);
        }
        let horizon = cmp::min(horizon, current);
        let members = group.members();
        cdebug!(COMMIT, "Committing {} members up to {}", members.len(), horizon);
        for member in members {
            member.commit(horizon);
        }
        horizon
    }
}

impl Default for CheckpointGroup {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for CheckpointGroup {
    fn eq(&self, other: &CheckpointGroup) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for CheckpointGroup {}

impl fmt::Debug for CheckpointGroup {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("CheckpointGroup")
            .field("timestamp", &self.timestamp())
            .field("members", &self.registered())
            .field("redirected", &self.is_redirected())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_group_is_inactive() {
        let group = CheckpointGroup::new();
        assert_eq!(group.timestamp(), 0);
        assert!(!group.is_active());
        assert!(group.is_empty());
    }

    #[test]
    fn open_is_monotonic() {
        let group = CheckpointGroup::new();
        let t1 = group.open();
        let t2 = group.open();
        assert!(t1 > 0);
        assert!(t2 > t1);
        assert_eq!(group.timestamp(), t2);
    }

    #[test]
    fn clones_share_the_timeline() {
        let group = CheckpointGroup::new();
        let other = group.clone();
        other.open();
        assert_eq!(group.timestamp(), 1);
        assert_eq!(group, other);
        assert_ne!(group, CheckpointGroup::new());
    }

    #[test]
    fn redirected_handle_resolves_to_successor() {
        let vacated = CheckpointGroup::new();
        let target = CheckpointGroup::new();
        target.open();
        target.open();

        vacated.redirect_to(&target);
        assert!(vacated.is_redirected());
        assert_eq!(vacated.resolve(), target);
        assert_eq!(vacated.timestamp(), 2);

        // Opening through the stale handle opens the successor.
        assert_eq!(vacated.open(), 3);
        assert_eq!(target.timestamp(), 3);
    }

    #[test]
    fn redirect_to_self_is_ignored() {
        let group = CheckpointGroup::new();
        let alias = group.clone();
        group.redirect_to(&alias);
        assert!(!group.is_redirected());
    }

    #[test]
    fn commit_within_timeline_is_not_clamped() {
        let group = CheckpointGroup::new();
        group.open();
        group.open();
        assert_eq!(group.commit(1), 1);
        assert_eq!(group.commit(0), 0);
    }
}
