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

//! Enumerations for common components.

use std::fmt::Debug;

use strum::{EnumString, FromRepr};

/// The log level for log messages.
#[repr(C)]
#[derive(Copy, Clone, Debug, Hash, PartialOrd, PartialEq, Eq, FromRepr, EnumString)]
#[strum(ascii_case_insensitive)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    /// The "OFF" log level. A level lower than all other log levels (off).
    #[strum(serialize = "OFF")]
    Off = 0,
    /// The "TRACE" log level. Only available in Rust for debug/development builds.
    #[strum(serialize = "TRACE")]
    Trace = 5,
    /// The "DEBUG" log level.
    #[strum(serialize = "DBG", serialize = "DEBUG")]
    Debug = 10,
    /// The "INFO" log level.
    #[strum(serialize = "INF", serialize = "INFO")]
    Info = 20,
    /// The "WARNING" log level.
    #[strum(serialize = "WRN", serialize = "WARNING")]
    Warning = 30,
    /// The "ERROR" log level.
    #[strum(serialize = "ERR", serialize = "ERROR")]
    Error = 40,
}

// Override `strum` implementation
impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let display = match self {
            Self::Off => "OFF",
            Self::Trace => "TRACE",
            Self::Debug => "DBG",
            Self::Info => "INF",
            Self::Warning => "WRN",
            Self::Error => "ERR",
        };
        write!(f, "{display}")
    }
}

/// The color for log message content.
#[repr(C)]
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, FromRepr, EnumString, strum::Display)]
#[strum(ascii_case_insensitive)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum LogColor {
    /// The default/normal log color.
    Normal = 0,
    /// The green log color, typically used with [`LogLevel::Info`] log levels and associated
    /// with success events.
    Green = 1,
    /// The blue log color, typically used with [`LogLevel::Info`] log levels and associated
    /// with user actions.
    Blue = 2,
    /// The magenta log color, typically used with [`LogLevel::Info`] log levels.
    Magenta = 3,
    /// The cyan log color, typically used with [`LogLevel::Info`] log levels.
    Cyan = 4,
    /// The yellow log color, typically used with [`LogLevel::Warning`] log levels.
    Yellow = 5,
    /// The red log color, typically used with [`LogLevel::Error`] level.
    Red = 6,
}

impl LogColor {
    /// Returns the ANSI escape code corresponding to the log color.
    #[must_use]
    pub const fn as_ansi(&self) -> &str {
        match self {
            Self::Normal => "",
            Self::Green => "\x1b[92m",
            Self::Blue => "\x1b[94m",
            Self::Magenta => "\x1b[35m",
            Self::Cyan => "\x1b[36m",
            Self::Yellow => "\x1b[1;33m",
            Self::Red => "\x1b[1;31m",
        }
    }
}

impl From<u8> for LogColor {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::Green,
            2 => Self::Blue,
            3 => Self::Magenta,
            4 => Self::Cyan,
            5 => Self::Yellow,
            6 => Self::Red,
            _ => Self::Normal,
        }
    }
}

impl From<log::Level> for LogColor {
    fn from(value: log::Level) -> Self {
        match value {
            log::Level::Error => Self::Red,
            log::Level::Warn => Self::Yellow,
            _ => Self::Normal,
        }
    }
}
