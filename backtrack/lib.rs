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

//! Checkpoint and rollback for graphs of versioned objects.
//!
//! The engine lives in `backtrack-engine` and the versioned containers in
//! `backtrack-collections`; this crate adds a [`Timeline`] that manages
//! restore points on top of a checkpoint group, and its configuration.
//! Types deriving `Rollbackable` also need `backtrack-engine` as a direct
//! dependency.

pub extern crate backtrack_collections as collections;
extern crate backtrack_engine;
#[macro_use]
extern crate backtrack_logger as blogger;
#[macro_use]
extern crate log;
extern crate serde;
#[macro_use]
extern crate serde_derive;
extern crate toml;

pub mod config;
mod error;
mod timeline;

pub use backtrack_engine::{
    versioned, Anchor, CheckpointGroup, Joinable, Rollbackable, Timestamp, Tracked, Versioned, VersionedVec,
};

pub use crate::error::Error;
pub use crate::timeline::Timeline;

/// Install the logger described by `config`.
pub fn init_logging(config: &config::Logging) -> Result<(), log::SetLoggerError> {
    blogger::init(&config.into())
}
