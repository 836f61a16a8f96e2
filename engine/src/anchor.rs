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

use std::cell::RefCell;
use std::cmp;
use std::fmt;
use std::rc::{Rc, Weak};

use super::group::CheckpointGroup;
use super::history::MembershipHistory;
use super::traits::{Joinable, Rollbackable, Tracked};
use super::Timestamp;

/// Allocate a versioned object.
///
/// `build` receives the anchor of the new object, already registered in a
/// fresh private group.
pub fn versioned<T, F>(build: F) -> Rc<T>
where
    T: Rollbackable + 'static,
    F: FnOnce(Anchor) -> T, {
    Rc::new_cyclic(|this: &Weak<T>| {
        let this: Weak<dyn Rollbackable> = this.clone();
        build(Anchor::new(this))
    })
}

/// The checkpointing state every versioned object carries: its current
/// group, the groups it left, and a weak reference to itself so that it can
/// register as a group member.
///
/// The field-walking operations take the object's fields as `&dyn Tracked`
/// in a fixed order; `#[derive(Rollbackable)]` generates those calls.
pub struct Anchor {
    this: Weak<dyn Rollbackable>,
    group: RefCell<CheckpointGroup>,
    membership: RefCell<MembershipHistory>,
}

impl Anchor {
    pub fn new(this: Weak<dyn Rollbackable>) -> Self {
        let group = CheckpointGroup::new();
        group.add_member(this.clone());
        Self {
            this,
            group: RefCell::new(group),
            membership: Default::default(),
        }
    }

    /// The timestamp writes are recorded against; zero while inactive.
    pub fn timestamp(&self) -> Timestamp {
        self.group.borrow().timestamp()
    }

    pub fn group(&self) -> CheckpointGroup {
        self.group.borrow().clone()
    }

    /// The object this anchor belongs to, while it is alive.
    pub fn object(&self) -> Option<Rc<dyn Rollbackable>> {
        self.this.upgrade()
    }

    /// Number of group transitions that can still be undone.
    pub fn transitions(&self) -> usize {
        self.membership.borrow().len()
    }

    /// Pull a value that became reachable through this object into its group.
    pub fn adopt<J>(&self, value: &J)
    where
        J: Joinable + ?Sized, {
        value.join_group(&self.group());
    }

    /// Move the object into `group`.
    pub fn join(&self, group: &CheckpointGroup, fields: &[&dyn Tracked]) {
        let group = group.resolve();
        let old = self.group();
        if old.ptr_eq(&group) {
            return
        }

        let timestamp = group.timestamp();
        if timestamp > 0 {
            self.membership.borrow_mut().record_transition(old.clone(), group.clone(), timestamp);
            for field in fields {
                field.push_epoch(timestamp);
            }
        }
        *self.group.borrow_mut() = group.clone();
        old.remove_member(&self.this);
        old.redirect_to(&group);
        group.add_member(self.this.clone());
    }

    /// Undo everything recorded after `timestamp`, including group moves.
    pub fn restore(&self, timestamp: Timestamp, trim: bool, fields: &[&dyn Tracked]) {
        loop {
            for field in fields {
                field.restore(timestamp, trim);
            }
            if timestamp >= self.membership.borrow().top_timestamp() {
                return
            }

            let current = self.group();
            let previous = self.membership.borrow_mut().restore(&current, timestamp, trim);
            ctrace!(RESTORE, "Leaving group at {} while restoring to {}", current.timestamp(), timestamp);
            *self.group.borrow_mut() = previous.clone();
            current.remove_member(&self.this);
            previous.reclaim();
            previous.add_member(self.this.clone());
            for field in fields {
                field.pop_epoch();
            }
        }
    }

    /// Forget history that no restore to `horizon` or later can need.
    pub fn commit(&self, horizon: Timestamp, fields: &[&dyn Tracked]) {
        let horizon = cmp::min(horizon, self.timestamp());
        for field in fields {
            field.commit(horizon);
        }
        self.membership.borrow_mut().commit(horizon);
    }
}

impl Drop for Anchor {
    fn drop(&mut self) {
        self.group.get_mut().remove_member(&self.this);
    }
}

impl fmt::Debug for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Anchor")
            .field("group", &*self.group.borrow())
            .field("transitions", &self.membership.borrow().len())
            .finish()
    }
}
