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

//! Value types for prices and quantities.
//!
//! Prices arrive on the wire already scaled to integers; scaling and display
//! precision are the concern of an external collaborator, so no divisor is
//! applied at this layer. Quantities are signed internally so that level
//! aggregates can be decremented below zero before lazy deletion, but a
//! level with non-positive aggregate never survives a mutation.

use std::{
    fmt::Display,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};

/// Represents a price, pre-scaled to an integer.
#[repr(C)]
#[derive(
    Clone, Copy, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Price(i32);

impl Price {
    /// A price of zero, used to pad depth snapshots.
    pub const ZERO: Self = Self(0);

    /// Creates a new [`Price`] instance.
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

impl Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for Price {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

/// Represents an order or level quantity.
#[repr(C)]
#[derive(
    Clone, Copy, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Quantity(i32);

impl Quantity {
    /// A quantity of zero, used to pad depth snapshots.
    pub const ZERO: Self = Self(0);

    /// Creates a new [`Quantity`] instance.
    #[must_use]
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    /// Returns the underlying value as `i32`.
    #[must_use]
    pub const fn as_i32(&self) -> i32 {
        self.0
    }

    /// Returns `true` if the quantity is strictly positive.
    #[must_use]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }
}

impl Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for Quantity {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

impl Add for Quantity {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Quantity {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl AddAssign for Quantity {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Quantity {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Neg for Quantity {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
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
    fn test_price_ordering() {
        assert!(Price::new(101) > Price::new(100));
        assert_eq!(Price::ZERO.as_i32(), 0);
    }

    #[rstest]
    #[case(50, 25, 75, 25)]
    #[case(10, -10, 0, 20)]
    fn test_quantity_arithmetic(
        #[case] a: i32,
        #[case] b: i32,
        #[case] sum: i32,
        #[case] diff: i32,
    ) {
        let (a, b) = (Quantity::new(a), Quantity::new(b));
        assert_eq!(a + b, Quantity::new(sum));
        assert_eq!(a - b, Quantity::new(diff));
    }

    #[rstest]
    fn test_quantity_is_positive() {
        assert!(Quantity::new(1).is_positive());
        assert!(!Quantity::ZERO.is_positive());
        assert!(!Quantity::new(-5).is_positive());
    }
}
