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

//! Derive macros for `backtrack-engine`.

extern crate proc_macro;
extern crate proc_macro2;
extern crate quote;
extern crate syn;

mod rollback;

use proc_macro::TokenStream;

/// Derive `Rollbackable` for a struct whose state lives in versioned cells.
///
/// Exactly one field must be marked `#[rollback(anchor)]`. Every other field
/// must implement `Tracked` unless it is marked `#[rollback(skip)]`. Fields
/// marked `#[rollback(base)]` are embedded field sets; they are visited after
/// the struct's own fields.
///
/// ```ignore
/// #[derive(Rollbackable)]
/// struct Account {
///     #[rollback(anchor)]
///     anchor: Anchor,
///     #[rollback(skip)]
///     id: u64,
///     balance: Versioned<u64>,
/// }
/// ```
#[proc_macro_derive(Rollbackable, attributes(rollback))]
pub fn derive_rollbackable(input: TokenStream) -> TokenStream {
    rollback::derive_rollbackable(input)
}

/// Derive `Tracked` for a struct that groups versioned cells, so that it can
/// be embedded in other versioned types.
#[proc_macro_derive(Tracked, attributes(rollback))]
pub fn derive_tracked(input: TokenStream) -> TokenStream {
    rollback::derive_tracked(input)
}
