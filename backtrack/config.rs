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

use std::fs;
use std::path::Path;
use std::str::FromStr;

use blogger::LoggerConfig;
use toml;

use crate::error::Error;

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub retention: Retention,
    #[serde(default)]
    pub logging: Logging,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Retention {
    /// Older restore points are committed once a timeline holds more.
    pub max_restore_points: Option<usize>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Logging {
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_filter() -> String {
    "info".to_string()
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

impl<'a> Into<LoggerConfig> for &'a Logging {
    fn into(self) -> LoggerConfig {
        LoggerConfig::new(self.filter.clone())
    }
}

impl FromStr for Config {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(s)?)
    }
}

pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Config, Error> {
    let toml_string = fs::read_to_string(config_path)?;
    toml_string.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config: Config = "".parse().unwrap();
        assert_eq!(config.retention.max_restore_points, None);
        assert_eq!(config.logging.filter, "info");
    }

    #[test]
    fn sections_are_read() {
        let config: Config = r#"
            [retention]
            max_restore_points = 8

            [logging]
            filter = "warn,timeline=debug"
        "#
        .parse()
        .unwrap();
        assert_eq!(config.retention.max_restore_points, Some(8));
        assert_eq!(config.logging.filter, "warn,timeline=debug");
        let logger: LoggerConfig = (&config.logging).into();
        assert_eq!(logger.filter, "warn,timeline=debug");
    }

    #[test]
    fn unknown_fields_are_rejected() {
        match "[retention]\nmax_points = 3\n".parse::<Config>() {
            Err(Error::Toml(_)) => {}
            other => panic!("Unexpected result: {:?}", other),
        }
    }

    #[test]
    fn missing_file_is_an_io_error() {
        match load("/nonexistent/backtrack.toml") {
            Err(Error::Io(_)) => {}
            other => panic!("Unexpected result: {:?}", other),
        }
    }
}
