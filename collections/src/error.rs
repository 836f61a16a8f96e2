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

use std::error;
use std::fmt;
use std::result;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Error {
    IndexOutOfBounds {
        index: usize,
        len: usize,
    },
    /// The container changed behind a cursor's back.
    ConcurrentModification,
    NoCurrentElement,
}

pub type Result<T> = result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::IndexOutOfBounds {
                index,
                len,
            } => write!(f, "Index {} is out of bounds for length {}", index, len),
            Error::ConcurrentModification => write!(f, "The container was modified outside of the cursor"),
            Error::NoCurrentElement => write!(f, "The cursor has no current element"),
        }
    }
}

impl error::Error for Error {}

pub(crate) fn check_index(index: usize, len: usize) -> Result<()> {
    if index < len {
        Ok(())
    } else {
        Err(Error::IndexOutOfBounds {
            index,
            len,
        })
    }
}
