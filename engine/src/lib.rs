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

//! Checkpoint and rollback of mutable object graphs.
//!
//! Every versioned object owns an [`Anchor`] that ties it to a shared
//! [`CheckpointGroup`]. Writes go through [`Versioned`] and [`VersionedVec`]
//! cells; while the group is active (its timestamp is non-zero) each write
//! appends the overwritten value to the cell's history. Restoring a group to a
//! timestamp undoes every newer write of every member, and moves members that
//! joined the group later back to the group they came from.
//!
//! ```
//! use backtrack_engine::{versioned, Anchor, Rollbackable, Versioned};
//!
//! #[derive(Rollbackable)]
//! struct Counter {
//!     #[rollback(anchor)]
//!     anchor: Anchor,
//!     n: Versioned<i32>,
//! }
//!
//! let counter = versioned(|anchor| Counter {
//!     anchor,
//!     n: Versioned::new(0),
//! });
//! let group = counter.checkpoint_group();
//! let t1 = group.open();
//! counter.n.set(&counter.anchor, 5);
//! group.open();
//! counter.n.set(&counter.anchor, 9);
//!
//! group.restore(t1, false);
//! assert_eq!(counter.n.get(), 5);
//! group.restore(t1 - 1, true);
//! assert_eq!(counter.n.get(), 0);
//! ```

#[macro_use]
extern crate backtrack_logger as blogger;
#[cfg(feature = "derive")]
extern crate backtrack_derive;
#[macro_use]
extern crate log;

// The derive macros expand to `::backtrack_engine::..` paths.
extern crate self as backtrack_engine;

mod anchor;
mod cell;
mod group;
mod history;
mod traits;

pub use anchor::{versioned, Anchor};
pub use cell::{Versioned, VersionedVec};
pub use group::CheckpointGroup;
pub use history::{ArrayHistory, FieldHistory, MembershipHistory};
pub use traits::{Joinable, Rollbackable, Tracked};

#[cfg(feature = "derive")]
pub use backtrack_derive::{Rollbackable, Tracked};

/// Logical time of a restore point. `0` means checkpointing is inactive.
pub type Timestamp = u64;
