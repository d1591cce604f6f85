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

//! The per-instrument ladder engine.

use std::fmt::Display;

use ahash::AHashMap;
use ladderfeed_core::UnixNanos;

use crate::{
    enums::OrderSide,
    identifiers::{InstrumentToken, OrderId},
    orderbook::{
        BookIntegrityError,
        depth::{LADDER_DEPTH, LadderDepth, LadderLevel},
        ladder::SideLadder,
    },
    types::{Price, Quantity},
};

/// An order believed still active and thus contributing to a price level.
///
/// The side is stored so that later modify/cancel/trade events remove the
/// order's contribution from the side it actually rests on, regardless of
/// what side the triggering message declares.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RestingOrder {
    /// The side the order rests on.
    pub side: OrderSide,
    /// The order's current price.
    pub price: Price,
    /// The order's remaining quantity.
    pub quantity: Quantity,
}

/// Reconstructs one instrument's order book from feed events.
///
/// Maintains bid and ask ladders of aggregate price levels plus an index of
/// resting orders by identifier. All operations are token-filtered: an event
/// whose token does not match the bound instrument is a no-op. Protocol
/// anomalies (duplicate new-order ids, references to unknown orders) are
/// logged no-ops, never errors — the book must stay consistent under a lossy
/// feed, and recovery replays must converge to the same state as in-order
/// application.
#[derive(Clone, Debug)]
pub struct LadderBook {
    /// The instrument this book is bound to.
    pub token: InstrumentToken,
    /// The timestamp of the last event applied to the book.
    pub ts_last: UnixNanos,
    /// The current count of updates applied to the book.
    pub update_count: u64,
    pub(crate) bids: SideLadder,
    pub(crate) asks: SideLadder,
    pub(crate) orders: AHashMap<OrderId, RestingOrder>,
}

impl PartialEq for LadderBook {
    fn eq(&self, other: &Self) -> bool {
        self.token == other.token
    }
}

impl Eq for LadderBook {}

impl Display for LadderBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}(token={}, orders={}, update_count={})",
            stringify!(LadderBook),
            self.token,
            self.orders.len(),
            self.update_count,
        )
    }
}

impl LadderBook {
    /// Creates a new [`LadderBook`] instance bound to `token`.
    #[must_use]
    pub fn new(token: InstrumentToken) -> Self {
        Self {
            token,
            ts_last: UnixNanos::default(),
            update_count: 0,
            bids: SideLadder::new(OrderSide::Buy),
            asks: SideLadder::new(OrderSide::Sell),
            orders: AHashMap::new(),
        }
    }

    /// Returns the number of resting orders tracked by the book.
    #[must_use]
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    /// Resets the book to its initial empty state.
    pub fn reset(&mut self) {
        self.bids.clear();
        self.asks.clear();
        self.orders.clear();
        self.ts_last = UnixNanos::default();
        self.update_count = 0;
    }

    /// Applies a new resting order.
    ///
    /// A duplicate order id is a protocol violation, not fatal: the event is
    /// logged and ignored. Non-positive quantities are likewise ignored.
    pub fn apply_new(
        &mut self,
        token: InstrumentToken,
        order_id: OrderId,
        side: OrderSide,
        price: Price,
        quantity: Quantity,
        ts_event: UnixNanos,
    ) {
        if token != self.token {
            return;
        }

        if self.orders.contains_key(&order_id) {
            log::warn!(
                "Duplicate new order ignored: token={token}, order_id={order_id}, price={price}, quantity={quantity}"
            );
            return;
        }

        if !quantity.is_positive() {
            log::warn!(
                "New order with non-positive quantity ignored: token={token}, order_id={order_id}, quantity={quantity}"
            );
            return;
        }

        self.orders.insert(
            order_id,
            RestingOrder {
                side,
                price,
                quantity,
            },
        );
        self.ladder_mut(side).add(price, quantity);

        self.increment(ts_event);
        debug_assert!(self.check_integrity().is_ok());
    }

    /// Applies a modify/replace of an existing order.
    ///
    /// The old contribution is removed from the *stored* side's level; the new
    /// values are inserted at the side the message declares (the side can
    /// change between modifies). An unknown order id is a logged no-op. A
    /// non-positive new quantity removes the order outright.
    pub fn apply_modify(
        &mut self,
        token: InstrumentToken,
        order_id: OrderId,
        side: OrderSide,
        new_price: Price,
        new_quantity: Quantity,
        ts_event: UnixNanos,
    ) {
        if token != self.token {
            return;
        }

        let Some(existing) = self.orders.get(&order_id).copied() else {
            log::warn!("Modify for unknown order ignored: token={token}, order_id={order_id}");
            return;
        };

        self.ladder_mut(existing.side)
            .remove(existing.price, existing.quantity);

        if new_quantity.is_positive() {
            self.ladder_mut(side).add(new_price, new_quantity);
            self.orders.insert(
                order_id,
                RestingOrder {
                    side,
                    price: new_price,
                    quantity: new_quantity,
                },
            );
        } else {
            log::debug!(
                "Modify to non-positive quantity removes order: token={token}, order_id={order_id}"
            );
            self.orders.remove(&order_id);
        }

        self.increment(ts_event);
        debug_assert!(self.check_integrity().is_ok());
    }

    /// Applies a cancel of an existing order.
    ///
    /// An unknown order id is a logged no-op.
    pub fn apply_cancel(&mut self, token: InstrumentToken, order_id: OrderId, ts_event: UnixNanos) {
        if token != self.token {
            return;
        }

        let Some(existing) = self.orders.remove(&order_id) else {
            log::warn!("Cancel for unknown order ignored: token={token}, order_id={order_id}");
            return;
        };

        self.ladder_mut(existing.side)
            .remove(existing.price, existing.quantity);

        self.increment(ts_event);
        debug_assert!(self.check_integrity().is_ok());
    }

    /// Applies a trade, symmetrically reducing whichever of the two order ids
    /// rest locally.
    ///
    /// A trade may reference an order resting on a different engine; only the
    /// matching side(s) present in this book's index are touched. For each
    /// matching order the level aggregate nets down by exactly the traded
    /// quantity: the order's full contribution is removed, the resting
    /// quantity reduced, and any positive remainder re-added.
    pub fn apply_trade(
        &mut self,
        token: InstrumentToken,
        buy_order_id: OrderId,
        sell_order_id: OrderId,
        price: Price,
        quantity: Quantity,
        ts_event: UnixNanos,
    ) {
        if token != self.token {
            return;
        }

        log::trace!(
            "Trade: token={token}, buy={buy_order_id}, sell={sell_order_id}, price={price}, quantity={quantity}"
        );

        self.reduce_order(buy_order_id, quantity);
        if sell_order_id != buy_order_id {
            self.reduce_order(sell_order_id, quantity);
        }

        self.increment(ts_event);
        debug_assert!(self.check_integrity().is_ok());
    }

    /// Returns the top-N depth snapshot of the book.
    ///
    /// Read-only and idempotent: two calls with no intervening mutation yield
    /// identical snapshots.
    #[must_use]
    pub fn depth(&self) -> LadderDepth {
        let mut snapshot = LadderDepth::empty(self.token);

        for (slot, (price, quantity)) in snapshot
            .bid
            .iter_mut()
            .zip(self.bids.iter().take(LADDER_DEPTH))
        {
            *slot = LadderLevel::new(price, quantity);
        }

        for (slot, (price, quantity)) in snapshot
            .ask
            .iter_mut()
            .zip(self.asks.iter().take(LADDER_DEPTH))
        {
            *slot = LadderLevel::new(price, quantity);
        }

        snapshot
    }

    /// Verifies the ladder invariants.
    ///
    /// For every price level present in a side's map, its aggregate must equal
    /// the sum of resting order quantities at that price and side, and must be
    /// strictly positive.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first violated invariant.
    pub fn check_integrity(&self) -> Result<(), BookIntegrityError> {
        for ladder in [&self.bids, &self.asks] {
            for (price, level_quantity) in ladder.iter() {
                if !level_quantity.is_positive() {
                    return Err(BookIntegrityError::NonPositiveLevel {
                        token: self.token,
                        price,
                        quantity: level_quantity.as_i32(),
                    });
                }

                let order_quantity: i32 = self
                    .orders
                    .values()
                    .filter(|order| order.side == ladder.side && order.price == price)
                    .map(|order| order.quantity.as_i32())
                    .sum();

                if order_quantity != level_quantity.as_i32() {
                    return Err(BookIntegrityError::LevelAggregateMismatch {
                        token: self.token,
                        price,
                        level_quantity: level_quantity.as_i32(),
                        order_quantity,
                    });
                }
            }
        }

        Ok(())
    }

    fn reduce_order(&mut self, order_id: OrderId, quantity: Quantity) {
        let Some(existing) = self.orders.get(&order_id).copied() else {
            // Counterparty order rests on another engine
            log::debug!(
                "Trade references order not resting locally: token={}, order_id={order_id}",
                self.token
            );
            return;
        };

        self.ladder_mut(existing.side)
            .remove(existing.price, existing.quantity);

        let remaining = existing.quantity - quantity;
        if remaining.is_positive() {
            self.ladder_mut(existing.side).add(existing.price, remaining);
            self.orders.insert(
                order_id,
                RestingOrder {
                    quantity: remaining,
                    ..existing
                },
            );
        } else {
            self.orders.remove(&order_id);
        }
    }

    fn ladder_mut(&mut self, side: OrderSide) -> &mut SideLadder {
        match side {
            OrderSide::Buy => &mut self.bids,
            OrderSide::Sell => &mut self.asks,
        }
    }

    fn increment(&mut self, ts_event: UnixNanos) {
        if ts_event < self.ts_last {
            log::warn!(
                "Timestamp went backwards for token {}: old={}, new={ts_event}",
                self.token,
                self.ts_last
            );
        }

        self.ts_last = ts_event;
        self.update_count = self.update_count.saturating_add(1);
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::*;

    const TOKEN: i32 = 12345;

    #[fixture]
    fn book() -> LadderBook {
        LadderBook::new(InstrumentToken::new(TOKEN))
    }

    fn new_order(book: &mut LadderBook, id: u64, side: OrderSide, price: i32, quantity: i32) {
        book.apply_new(
            InstrumentToken::new(TOKEN),
            OrderId::new(id),
            side,
            Price::new(price),
            Quantity::new(quantity),
            UnixNanos::default(),
        );
    }

    #[rstest]
    fn test_new_buy_order_appears_in_depth(mut book: LadderBook) {
        // Scenario A
        new_order(&mut book, 1, OrderSide::Buy, 100, 50);

        let depth = book.depth();
        assert_eq!(depth.token, InstrumentToken::new(TOKEN));
        assert_eq!(depth.bid[0], LadderLevel::new(Price::new(100), Quantity::new(50)));
        assert_eq!(depth.ask[0], LadderLevel::default());
        book.check_integrity().unwrap();
    }

    #[rstest]
    fn test_modify_moves_level(mut book: LadderBook) {
        // Scenario B: modify to a new price removes the old level entirely
        new_order(&mut book, 1, OrderSide::Buy, 100, 50);
        book.apply_modify(
            InstrumentToken::new(TOKEN),
            OrderId::new(1),
            OrderSide::Buy,
            Price::new(101),
            Quantity::new(75),
            UnixNanos::default(),
        );

        let depth = book.depth();
        assert_eq!(depth.bid[0], LadderLevel::new(Price::new(101), Quantity::new(75)));
        assert_eq!(depth.bid[1], LadderLevel::default());
        assert_eq!(book.bids.quantity_at(Price::new(100)), Quantity::ZERO);
        book.check_integrity().unwrap();
    }

    #[rstest]
    fn test_modify_changes_side_using_stored_side_for_removal(mut book: LadderBook) {
        new_order(&mut book, 1, OrderSide::Buy, 100, 50);
        book.apply_modify(
            InstrumentToken::new(TOKEN),
            OrderId::new(1),
            OrderSide::Sell,
            Price::new(102),
            Quantity::new(40),
            UnixNanos::default(),
        );

        let depth = book.depth();
        assert_eq!(depth.bid[0], LadderLevel::default());
        assert_eq!(depth.ask[0], LadderLevel::new(Price::new(102), Quantity::new(40)));
        book.check_integrity().unwrap();
    }

    #[rstest]
    fn test_trade_reduces_both_resting_orders(mut book: LadderBook) {
        // Scenario C
        new_order(&mut book, 1, OrderSide::Buy, 100, 50);
        new_order(&mut book, 2, OrderSide::Sell, 100, 30);

        book.apply_trade(
            InstrumentToken::new(TOKEN),
            OrderId::new(1),
            OrderId::new(2),
            Price::new(100),
            Quantity::new(25),
            UnixNanos::default(),
        );

        assert_eq!(book.bids.quantity_at(Price::new(100)), Quantity::new(25));
        assert_eq!(book.asks.quantity_at(Price::new(100)), Quantity::new(5));
        assert_eq!(book.order_count(), 2);
        book.check_integrity().unwrap();
    }

    #[rstest]
    fn test_trade_full_fill_erases_order(mut book: LadderBook) {
        new_order(&mut book, 1, OrderSide::Buy, 100, 25);
        new_order(&mut book, 2, OrderSide::Sell, 100, 30);

        book.apply_trade(
            InstrumentToken::new(TOKEN),
            OrderId::new(1),
            OrderId::new(2),
            Price::new(100),
            Quantity::new(25),
            UnixNanos::default(),
        );

        assert_eq!(book.bids.quantity_at(Price::new(100)), Quantity::ZERO);
        assert_eq!(book.asks.quantity_at(Price::new(100)), Quantity::new(5));
        assert_eq!(book.order_count(), 1);
        book.check_integrity().unwrap();
    }

    #[rstest]
    fn test_trade_touches_only_locally_resting_side(mut book: LadderBook) {
        new_order(&mut book, 1, OrderSide::Buy, 100, 50);

        // Sell order id 99 rests on another engine
        book.apply_trade(
            InstrumentToken::new(TOKEN),
            OrderId::new(1),
            OrderId::new(99),
            Price::new(100),
            Quantity::new(10),
            UnixNanos::default(),
        );

        assert_eq!(book.bids.quantity_at(Price::new(100)), Quantity::new(40));
        assert!(book.asks.is_empty());
        book.check_integrity().unwrap();
    }

    #[rstest]
    fn test_cancel_sole_contributor_removes_level(mut book: LadderBook) {
        // Scenario D
        new_order(&mut book, 1, OrderSide::Buy, 100, 50);
        book.apply_cancel(InstrumentToken::new(TOKEN), OrderId::new(1), UnixNanos::default());

        assert!(book.depth().is_empty());
        assert_eq!(book.order_count(), 0);
        book.check_integrity().unwrap();
    }

    #[rstest]
    fn test_cancel_leaves_other_contributors(mut book: LadderBook) {
        new_order(&mut book, 1, OrderSide::Buy, 100, 50);
        new_order(&mut book, 2, OrderSide::Buy, 100, 20);
        book.apply_cancel(InstrumentToken::new(TOKEN), OrderId::new(1), UnixNanos::default());

        assert_eq!(book.bids.quantity_at(Price::new(100)), Quantity::new(20));
        book.check_integrity().unwrap();
    }

    #[rstest]
    fn test_duplicate_new_order_is_noop(mut book: LadderBook) {
        new_order(&mut book, 1, OrderSide::Buy, 100, 50);
        new_order(&mut book, 1, OrderSide::Buy, 101, 75);

        let depth = book.depth();
        assert_eq!(depth.bid[0], LadderLevel::new(Price::new(100), Quantity::new(50)));
        assert_eq!(depth.bid[1], LadderLevel::default());
        book.check_integrity().unwrap();
    }

    #[rstest]
    fn test_unknown_id_operations_leave_book_unchanged(mut book: LadderBook) {
        new_order(&mut book, 1, OrderSide::Buy, 100, 50);
        let before = book.depth();

        book.apply_modify(
            InstrumentToken::new(TOKEN),
            OrderId::new(42),
            OrderSide::Buy,
            Price::new(99),
            Quantity::new(10),
            UnixNanos::default(),
        );
        book.apply_cancel(InstrumentToken::new(TOKEN), OrderId::new(43), UnixNanos::default());
        book.apply_trade(
            InstrumentToken::new(TOKEN),
            OrderId::new(44),
            OrderId::new(45),
            Price::new(99),
            Quantity::new(10),
            UnixNanos::default(),
        );

        assert_eq!(book.depth(), before);
        book.check_integrity().unwrap();
    }

    #[rstest]
    fn test_mismatched_token_is_noop(mut book: LadderBook) {
        book.apply_new(
            InstrumentToken::new(999),
            OrderId::new(1),
            OrderSide::Buy,
            Price::new(100),
            Quantity::new(50),
            UnixNanos::default(),
        );

        assert!(book.depth().is_empty());
        assert_eq!(book.update_count, 0);
    }

    #[rstest]
    fn test_depth_query_is_idempotent(mut book: LadderBook) {
        new_order(&mut book, 1, OrderSide::Buy, 100, 50);
        new_order(&mut book, 2, OrderSide::Sell, 103, 20);

        assert_eq!(book.depth(), book.depth());
    }

    #[rstest]
    fn test_depth_truncates_to_top_five(mut book: LadderBook) {
        for i in 0..7 {
            new_order(&mut book, i + 1, OrderSide::Buy, 100 + i as i32, 10);
        }

        let depth = book.depth();
        assert_eq!(depth.bid[0].price, Price::new(106));
        assert_eq!(depth.bid[4].price, Price::new(102));
        book.check_integrity().unwrap();
    }

    #[rstest]
    fn test_empty_book_returns_all_zero_snapshot(book: LadderBook) {
        let depth = book.depth();
        assert!(depth.is_empty());
        assert_eq!(depth.bid, [LadderLevel::default(); LADDER_DEPTH]);
        assert_eq!(depth.ask, [LadderLevel::default(); LADDER_DEPTH]);
    }

    #[rstest]
    fn test_invariant_holds_across_mixed_sequence(mut book: LadderBook) {
        for i in 0..20u64 {
            let side = if i % 2 == 0 { OrderSide::Buy } else { OrderSide::Sell };
            new_order(&mut book, i, side, 100 + (i % 4) as i32, 10 + i as i32);
        }
        for i in (0..20u64).step_by(3) {
            book.apply_cancel(InstrumentToken::new(TOKEN), OrderId::new(i), UnixNanos::default());
        }
        book.apply_trade(
            InstrumentToken::new(TOKEN),
            OrderId::new(2),
            OrderId::new(1),
            Price::new(101),
            Quantity::new(5),
            UnixNanos::default(),
        );

        book.check_integrity().unwrap();
    }
}
