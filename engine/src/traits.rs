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

use super::group::CheckpointGroup;
use super::Timestamp;

/// An object whose state can be restored to any recorded timestamp of the
/// checkpoint group it belongs to.
///
/// Implementations are normally derived: see `#[derive(Rollbackable)]`.
pub trait Rollbackable {
    /// The group whose timeline this object currently records against.
    fn checkpoint_group(&self) -> CheckpointGroup;

    /// Move this object into `group`.
    ///
    /// A no-op if the object already belongs to `group`. When `group` is
    /// active the move is recorded, so restoring to a timestamp before it
    /// moves the object back.
    fn set_checkpoint_group(&self, group: &CheckpointGroup);

    /// Undo every change recorded after `timestamp`.
    ///
    /// With `trim` the undone history is discarded; otherwise it is kept and
    /// replayed again by a later restore to an older timestamp.
    ///
    /// Only this object is restored. Objects that moved into its group along
    /// with it keep their own membership history and stay in the newer group
    /// until they are restored themselves; restoring the group reaches all of
    /// them.
    ///
    /// `timestamp` must not predate the creation of the object.
    fn restore(&self, timestamp: Timestamp, trim: bool);

    /// Forget history that no restore to `timestamp` or later can need.
    fn commit(&self, timestamp: Timestamp);
}

/// A set of versioned fields.
///
/// Implemented by the `Versioned` cells and by structs that group such cells
/// (`#[derive(Tracked)]`), so that a type can embed a base part whose fields
/// are restored together with its own.
pub trait Tracked {
    fn restore(&self, timestamp: Timestamp, trim: bool);

    fn commit(&self, horizon: Timestamp);

    /// Start a new epoch. Older entries stay hidden until `pop_epoch`.
    fn push_epoch(&self, since: Timestamp);

    /// Drop the current epoch and reactivate the one beneath it.
    fn pop_epoch(&self);
}

/// Values that become reachable through a versioned object and therefore
/// have to share its checkpoint group.
pub trait Joinable {
    fn join_group(&self, group: &CheckpointGroup);
}

impl<R> Joinable for Rc<R>
where
    R: Rollbackable + ?Sized,
{
    fn join_group(&self, group: &CheckpointGroup) {
        self.set_checkpoint_group(group);
    }
}

impl<R> Joinable for Weak<R>
where
    R: Rollbackable + ?Sized,
{
    fn join_group(&self, group: &CheckpointGroup) {
        if let Some(object) = self.upgrade() {
            object.set_checkpoint_group(group);
        }
    }
}

impl<J> Joinable for Option<J>
where
    J: Joinable,
{
    fn join_group(&self, group: &CheckpointGroup) {
        if let Some(value) = self {
            value.join_group(group);
        }
    }
}
