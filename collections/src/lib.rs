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

//! Versioned containers built on `backtrack-engine`.
//!
//! Every container is a versioned object: restoring its checkpoint group
//! restores its contents, and elements it links to join the same group.
//! Elements themselves are stored as plain values.

extern crate backtrack_engine;

mod array_list;
mod base;
mod error;
mod hash_map;
mod linked_list;

pub use array_list::{ArrayList, ListCursor};
pub use error::{Error, Result};
pub use hash_map::HashMap;
pub use linked_list::{LinkedCursor, LinkedList};
