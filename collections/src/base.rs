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

use backtrack_engine::{Anchor, Tracked, Versioned};

/// State shared by every container: a counter of structural modifications
/// that cursors compare against.
#[derive(Default, Tracked)]
pub struct CollectionBase {
    mod_count: Versioned<u64>,
}

impl CollectionBase {
    pub fn mod_count(&self) -> u64 {
        self.mod_count.get()
    }

    pub fn touch(&self, anchor: &Anchor) {
        self.mod_count.update(anchor, |count| *count += 1);
    }
}
