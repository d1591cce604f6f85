// -------------------------------------------------------------------------------------------------
//  Copyright (C) 2015-2026 Nautech Systems Pty Ltd. All rights reserved.
//  https://nautechsystems.io
//
//  Licensed under the GNU Lesser General Public License Version 3.0 (the "License");
//  You may not use this file except in compliance with the License.
//  You may obtain a copy of the License at https://www.gnu.org/licenses/lgpl-3.0.en.html
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.
// -------------------------------------------------------------------------------------------------

//! Logging configuration types and parsing.
//!
//! # Spec String Format
//!
//! The `LADDERFEED_LOG` environment variable uses a semicolon-separated format:
//!
//! ```text
//! stdout=Info;fileout=Debug;Dispatcher=Error;is_colored
//! ```
//!
//! ## Supported Keys
//!
//! | Key            | Type      | Description                                |
//! |----------------|-----------|--------------------------------------------|
//! | `stdout`       | Log level | Maximum level for stdout output.           |
//! | `fileout`      | Log level | Maximum level for file output.             |
//! | `is_colored`   | Boolean   | Enable ANSI colors (default: true).        |
//! | `print_config` | Boolean   | Print config to stdout at startup.         |
//! | `<component>`  | Log level | Component-specific log level (exact match).|
//!
//! Log levels are case-insensitive. Boolean values accept a bare flag
//! (`is_colored` → true) or an explicit value (`is_colored=false`,
//! `is_colored=0`, `is_colored=no`).

use std::{env, str::FromStr};

use ahash::AHashMap;
use log::LevelFilter;
use ustr::Ustr;

/// Environment variable holding the logging spec string.
pub const LOG_SPEC_ENV_VAR: &str = "LADDERFEED_LOG";

/// Configuration for the feed handler logger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerConfig {
    /// Maximum log level for stdout output.
    pub stdout_level: LevelFilter,
    /// Maximum log level for file output (`Off` disables file logging).
    pub fileout_level: LevelFilter,
    /// Per-component log level overrides (exact match).
    pub component_level: AHashMap<Ustr, LevelFilter>,
    /// Use ANSI color codes in output.
    pub is_colored: bool,
    /// Print configuration to stdout at startup.
    pub print_config: bool,
}

impl Default for LoggerConfig {
    /// Creates a new default [`LoggerConfig`] instance.
    fn default() -> Self {
        Self {
            stdout_level: LevelFilter::Info,
            fileout_level: LevelFilter::Off,
            component_level: AHashMap::new(),
            is_colored: true,
            print_config: false,
        }
    }
}

impl LoggerConfig {
    /// Parses a configuration from a spec string.
    ///
    /// # Errors
    ///
    /// Returns an error if the spec string contains invalid syntax or log levels.
    pub fn from_spec(spec: &str) -> anyhow::Result<Self> {
        let mut config = Self::default();

        for kv in spec.split(';') {
            let kv = kv.trim();
            if kv.is_empty() {
                continue;
            }

            // Handle bare flags (without =)
            if !kv.contains('=') {
                match kv.to_lowercase().as_str() {
                    "is_colored" => config.is_colored = true,
                    "print_config" => config.print_config = true,
                    _ => anyhow::bail!("Invalid spec pair: {kv}"),
                }
                continue;
            }

            let parts: Vec<&str> = kv.splitn(2, '=').collect();
            if parts.len() != 2 {
                anyhow::bail!("Invalid spec pair: {kv}");
            }

            let k = parts[0].trim();
            let v = parts[1].trim();

            match k.to_lowercase().as_str() {
                "is_colored" => {
                    config.is_colored = parse_bool_value(v);
                }
                "print_config" => {
                    config.print_config = parse_bool_value(v);
                }
                "stdout" => {
                    config.stdout_level = parse_level(v)?;
                }
                "fileout" => {
                    config.fileout_level = parse_level(v)?;
                }
                _ => {
                    config.component_level.insert(Ustr::from(k), parse_level(v)?);
                }
            }
        }

        Ok(config)
    }

    /// Parses configuration from the `LADDERFEED_LOG` environment variable.
    ///
    /// # Errors
    ///
    /// Returns an error if the variable is unset or contains invalid syntax.
    pub fn from_env() -> anyhow::Result<Self> {
        let spec = env::var(LOG_SPEC_ENV_VAR)?;
        Self::from_spec(&spec)
    }
}

/// Parses a boolean value from a string.
///
/// Returns `true` unless the value is explicitly "false", "0", or "no" (case-insensitive).
fn parse_bool_value(v: &str) -> bool {
    !matches!(v.to_lowercase().as_str(), "false" | "0" | "no")
}

fn parse_level(v: &str) -> anyhow::Result<LevelFilter> {
    LevelFilter::from_str(v).map_err(|_| anyhow::anyhow!("Invalid log level: {v}"))
}
