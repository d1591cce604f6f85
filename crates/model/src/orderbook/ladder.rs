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

//! Represents a ladder of aggregate price levels for one side of an order book.

use std::{
    cmp::Ordering,
    collections::BTreeMap,
    fmt::{Debug, Display},
};

use crate::{
    enums::OrderSide,
    types::{Price, Quantity},
};

/// Represents a price level key with a specified side in an order book ladder.
///
/// # Comparison Semantics
///
/// `BookPrice` instances are only meaningfully compared within the same side
/// (i.e., within a single [`SideLadder`]). Cross-side comparisons are not
/// expected in normal use, as bid and ask ladders maintain separate maps.
///
/// - Equality requires both `value` and `side` to match.
/// - Ordering is side-dependent: Buy side sorts descending, Sell side ascending,
///   so iteration always yields best-price-first.
#[derive(Clone, Copy, Debug, Eq)]
pub struct BookPrice {
    /// The price value.
    pub value: Price,
    /// The side of the ladder this key belongs to.
    pub side: OrderSide,
}

impl BookPrice {
    /// Creates a new [`BookPrice`] instance.
    #[must_use]
    pub const fn new(value: Price, side: OrderSide) -> Self {
        Self { value, side }
    }
}

impl PartialEq for BookPrice {
    fn eq(&self, other: &Self) -> bool {
        self.side == other.side && self.value == other.value
    }
}

impl PartialOrd for BookPrice {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BookPrice {
    fn cmp(&self, other: &Self) -> Ordering {
        debug_assert_eq!(
            self.side, other.side,
            "BookPrice compared across sides: {:?} vs {:?}",
            self.side, other.side
        );

        match self.side {
            OrderSide::Buy => other.value.cmp(&self.value),
            OrderSide::Sell => self.value.cmp(&other.value),
        }
    }
}

impl Display for BookPrice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// A ladder of aggregate price levels for one side of an order book.
///
/// Levels hold the aggregate resting quantity across all orders at that price
/// for the side; no order-level time priority is tracked. A level whose
/// aggregate reaches zero or below is deleted immediately, so a present level
/// always has strictly positive quantity.
#[derive(Clone, Debug)]
pub struct SideLadder {
    /// The side of the book this ladder aggregates.
    pub side: OrderSide,
    /// The price levels, keyed best-price-first.
    pub levels: BTreeMap<BookPrice, Quantity>,
}

impl SideLadder {
    /// Creates a new [`SideLadder`] instance.
    #[must_use]
    pub fn new(side: OrderSide) -> Self {
        Self {
            side,
            levels: BTreeMap::new(),
        }
    }

    /// Returns the number of price levels in the ladder.
    #[must_use]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Returns true if the ladder has no price levels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Removes all price levels from the ladder.
    pub fn clear(&mut self) {
        self.levels.clear();
    }

    /// Adds `quantity` to the aggregate at `price`, creating the level as needed.
    ///
    /// A non-positive resulting aggregate deletes the level (lazy deletion on
    /// the first non-positive outcome).
    pub fn add(&mut self, price: Price, quantity: Quantity) {
        let key = BookPrice::new(price, self.side);
        let level = self.levels.entry(key).or_insert(Quantity::ZERO);
        *level += quantity;

        if !level.is_positive() {
            self.levels.remove(&key);
        }
    }

    /// Removes `quantity` from the aggregate at `price`.
    ///
    /// Deletes the level if the result is non-positive. A missing level is
    /// ignored; callers track order state and only remove what they added.
    pub fn remove(&mut self, price: Price, quantity: Quantity) {
        let key = BookPrice::new(price, self.side);
        if let Some(level) = self.levels.get_mut(&key) {
            *level -= quantity;

            if !level.is_positive() {
                self.levels.remove(&key);
            }
        }
    }

    /// Returns the aggregate quantity at `price`, zero if the level is absent.
    #[must_use]
    pub fn quantity_at(&self, price: Price) -> Quantity {
        self.levels
            .get(&BookPrice::new(price, self.side))
            .copied()
            .unwrap_or(Quantity::ZERO)
    }

    /// Returns the best price level if one exists.
    #[must_use]
    pub fn best(&self) -> Option<(Price, Quantity)> {
        self.levels
            .first_key_value()
            .map(|(key, quantity)| (key.value, *quantity))
    }

    /// Returns an iterator over levels in book order (best price first).
    pub fn iter(&self) -> impl Iterator<Item = (Price, Quantity)> + '_ {
        self.levels.iter().map(|(key, quantity)| (key.value, *quantity))
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
    fn test_book_price_bid_ordering_descending() {
        let mut ladder = SideLadder::new(OrderSide::Buy);
        ladder.add(Price::new(100), Quantity::new(10));
        ladder.add(Price::new(102), Quantity::new(20));
        ladder.add(Price::new(101), Quantity::new(30));

        let prices: Vec<i32> = ladder.iter().map(|(p, _)| p.as_i32()).collect();
        assert_eq!(prices, vec![102, 101, 100]);
        assert_eq!(ladder.best(), Some((Price::new(102), Quantity::new(20))));
    }

    #[rstest]
    fn test_book_price_ask_ordering_ascending() {
        let mut ladder = SideLadder::new(OrderSide::Sell);
        ladder.add(Price::new(100), Quantity::new(10));
        ladder.add(Price::new(102), Quantity::new(20));
        ladder.add(Price::new(101), Quantity::new(30));

        let prices: Vec<i32> = ladder.iter().map(|(p, _)| p.as_i32()).collect();
        assert_eq!(prices, vec![100, 101, 102]);
        assert_eq!(ladder.best(), Some((Price::new(100), Quantity::new(10))));
    }

    #[rstest]
    fn test_add_aggregates_same_price() {
        let mut ladder = SideLadder::new(OrderSide::Buy);
        ladder.add(Price::new(100), Quantity::new(10));
        ladder.add(Price::new(100), Quantity::new(15));

        assert_eq!(ladder.len(), 1);
        assert_eq!(ladder.quantity_at(Price::new(100)), Quantity::new(25));
    }

    #[rstest]
    fn test_remove_deletes_level_at_zero() {
        let mut ladder = SideLadder::new(OrderSide::Sell);
        ladder.add(Price::new(100), Quantity::new(10));
        ladder.remove(Price::new(100), Quantity::new(10));

        assert!(ladder.is_empty());
        assert_eq!(ladder.quantity_at(Price::new(100)), Quantity::ZERO);
    }

    #[rstest]
    fn test_remove_past_zero_deletes_level() {
        let mut ladder = SideLadder::new(OrderSide::Buy);
        ladder.add(Price::new(100), Quantity::new(10));
        ladder.remove(Price::new(100), Quantity::new(25));

        assert!(ladder.is_empty());
    }

    #[rstest]
    fn test_remove_missing_level_is_noop() {
        let mut ladder = SideLadder::new(OrderSide::Buy);
        ladder.add(Price::new(100), Quantity::new(10));
        ladder.remove(Price::new(999), Quantity::new(5));

        assert_eq!(ladder.quantity_at(Price::new(100)), Quantity::new(10));
        assert_eq!(ladder.len(), 1);
    }

    #[rstest]
    fn test_add_non_positive_never_creates_level() {
        let mut ladder = SideLadder::new(OrderSide::Sell);
        ladder.add(Price::new(100), Quantity::ZERO);
        ladder.add(Price::new(101), Quantity::new(-5));

        assert!(ladder.is_empty());
    }
}
