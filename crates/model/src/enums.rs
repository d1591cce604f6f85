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

//! Enumerations for the feed domain model.
//!
//! Wire tags are single ASCII bytes; each enum pins its discriminants to the
//! wire encoding so conversion is a straight cast, with `from_wire` giving
//! the checked direction. Unregistered bytes are rejected there rather than
//! mapped through letter arithmetic.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, FromRepr};

/// The side of an order in the book.
#[repr(u8)]
#[derive(
    Copy,
    Clone,
    Debug,
    Hash,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    AsRefStr,
    Display,
    EnumIter,
    EnumString,
    FromRepr,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderSide {
    /// A resting buy order (bid side).
    Buy = b'B',
    /// A resting sell order (ask side).
    Sell = b'S',
}

impl OrderSide {
    /// Converts a wire-encoded side byte, `None` for unregistered bytes.
    #[must_use]
    pub const fn from_wire(value: u8) -> Option<Self> {
        match value {
            b'B' => Some(Self::Buy),
            b'S' => Some(Self::Sell),
            _ => None,
        }
    }

    /// Returns the wire encoding of this side.
    #[must_use]
    pub const fn to_wire(&self) -> u8 {
        *self as u8
    }
}

/// The kind of a feed message, carried in the stream header type field.
#[repr(u8)]
#[derive(
    Copy,
    Clone,
    Debug,
    Hash,
    PartialEq,
    Eq,
    AsRefStr,
    Display,
    EnumIter,
    EnumString,
    FromRepr,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    /// A new resting order enters the book.
    New = b'N',
    /// An existing order is modified/replaced.
    Replace = b'M',
    /// An existing order is cancelled.
    Cancel = b'X',
    /// A trade executes against one or two resting orders.
    Trade = b'T',
    /// A recovery protocol message.
    Recovery = b'R',
}

impl MessageType {
    /// Converts a wire-encoded type byte, `None` for unregistered bytes.
    #[must_use]
    pub const fn from_wire(value: u8) -> Option<Self> {
        match value {
            b'N' => Some(Self::New),
            b'M' => Some(Self::Replace),
            b'X' => Some(Self::Cancel),
            b'T' => Some(Self::Trade),
            b'R' => Some(Self::Recovery),
            _ => None,
        }
    }

    /// Returns the wire encoding of this message type.
    #[must_use]
    pub const fn to_wire(&self) -> u8 {
        *self as u8
    }
}

/// The status carried in a recovery response header.
#[repr(u8)]
#[derive(
    Copy,
    Clone,
    Debug,
    Hash,
    PartialEq,
    Eq,
    AsRefStr,
    Display,
    EnumIter,
    EnumString,
    FromRepr,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    /// The requested range is being replayed.
    Accepted = b'A',
    /// The server cannot serve the requested range.
    Rejected = b'J',
}

impl RequestStatus {
    /// Converts a wire-encoded status byte, `None` for unregistered bytes.
    #[must_use]
    pub const fn from_wire(value: u8) -> Option<Self> {
        match value {
            b'A' => Some(Self::Accepted),
            b'J' => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Returns the wire encoding of this status.
    #[must_use]
    pub const fn to_wire(&self) -> u8 {
        *self as u8
    }
}
