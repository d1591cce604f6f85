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

//! Identifier newtypes for feed streams, instruments and orders.

use std::fmt::{Debug, Display};

use serde::{Deserialize, Serialize};

/// Opaque integer identifying a tradable instrument.
///
/// Stable for the session; the routing key from wire events to ladder
/// engine instances.
#[repr(C)]
#[derive(
    Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct InstrumentToken(i32);

impl InstrumentToken {
    /// Creates a new [`InstrumentToken`] instance.
    #[must_use]
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    /// Returns the underlying value as `i32`.
    #[must_use]
    pub const fn as_i32(&self) -> i32 {
        self.0
    }
}

impl Debug for InstrumentToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", stringify!(InstrumentToken), self.0)
    }
}

impl Display for InstrumentToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for InstrumentToken {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

/// Identifies one sequenced logical channel of market-data messages.
#[repr(C)]
#[derive(
    Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct StreamId(i16);

impl StreamId {
    /// Creates a new [`StreamId`] instance.
    #[must_use]
    pub const fn new(value: i16) -> Self {
        Self(value)
    }

    /// Returns the underlying value as `i16`.
    #[must_use]
    pub const fn as_i16(&self) -> i16 {
        self.0
    }
}

impl Debug for StreamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", stringify!(StreamId), self.0)
    }
}

impl Display for StreamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i16> for StreamId {
    fn from(value: i16) -> Self {
        Self(value)
    }
}

/// Uniquely identifies a resting order within an instrument's lifetime.
///
/// The wire format encodes order identifiers as `f64`; that is treated as a
/// serialization detail translated at the boundary. In memory the key is a
/// 64-bit integer, avoiding precision loss once identifiers exceed the
/// float's 53-bit integer range.
#[repr(C)]
#[derive(
    Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct OrderId(u64);

impl OrderId {
    /// Creates a new [`OrderId`] instance.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Converts a wire-encoded floating-point identifier.
    ///
    /// Negative or non-finite values map to zero; such identifiers never
    /// match a resting order, so the event degrades to a logged no-op
    /// downstream instead of corrupting the index.
    #[must_use]
    pub fn from_wire(value: f64) -> Self {
        if !value.is_finite() || value < 0.0 {
            return Self(0);
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Self(value as u64)
    }

    /// Returns the wire encoding of this identifier.
    #[must_use]
    pub const fn to_wire(&self) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        {
            self.0 as f64
        }
    }

    /// Returns the underlying value as `u64`.
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Debug for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", stringify!(OrderId), self.0)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for OrderId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn test_instrument_token_display() {
        let token = InstrumentToken::new(12345);
        assert_eq!(token.to_string(), "12345");
        assert_eq!(format!("{token:?}"), "InstrumentToken(12345)");
    }

    #[rstest]
    #[case(1.0, 1)]
    #[case(9_007_199_254_740_992.0, 9_007_199_254_740_992)] // 2^53
    #[case(-1.0, 0)]
    #[case(f64::NAN, 0)]
    #[case(f64::INFINITY, 0)]
    fn test_order_id_from_wire(#[case] wire: f64, #[case] expected: u64) {
        assert_eq!(OrderId::from_wire(wire).as_u64(), expected);
    }

    #[rstest]
    fn test_order_id_wire_round_trip() {
        let id = OrderId::new(123_456_789);
        assert_eq!(OrderId::from_wire(id.to_wire()), id);
    }

    #[rstest]
    fn test_stream_id_conversions() {
        let id = StreamId::from(3);
        assert_eq!(id.as_i16(), 3);
        assert_eq!(id.to_string(), "3");
    }
}
