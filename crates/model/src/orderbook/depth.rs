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

//! Fixed-depth order book snapshots.

use serde::{Deserialize, Serialize};

use crate::{
    identifiers::InstrumentToken,
    types::{Price, Quantity},
};

/// The number of price levels per side in a depth snapshot.
pub const LADDER_DEPTH: usize = 5;

/// One price level entry in a depth snapshot.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LadderLevel {
    /// The level price, zero when padding.
    pub price: Price,
    /// The aggregate quantity at the level, zero when padding.
    pub quantity: Quantity,
}

impl LadderLevel {
    /// Creates a new [`LadderLevel`] instance.
    #[must_use]
    pub const fn new(price: Price, quantity: Quantity) -> Self {
        Self { price, quantity }
    }
}

/// An immutable top-N view of one instrument's ladder.
///
/// Derived from the price-level maps at query time, zero-filled beyond
/// available depth; never incrementally maintained.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LadderDepth {
    /// The instrument this snapshot belongs to.
    pub token: InstrumentToken,
    /// Top bid levels, best (highest) price first.
    pub bid: [LadderLevel; LADDER_DEPTH],
    /// Top ask levels, best (lowest) price first.
    pub ask: [LadderLevel; LADDER_DEPTH],
}

impl LadderDepth {
    /// Creates a new all-zero [`LadderDepth`] for `token`.
    #[must_use]
    pub fn empty(token: InstrumentToken) -> Self {
        Self {
            token,
            ..Default::default()
        }
    }

    /// Returns the best bid level if one is present.
    #[must_use]
    pub fn best_bid(&self) -> Option<LadderLevel> {
        self.bid
            .first()
            .filter(|level| level.quantity.is_positive())
            .copied()
    }

    /// Returns the best ask level if one is present.
    #[must_use]
    pub fn best_ask(&self) -> Option<LadderLevel> {
        self.ask
            .first()
            .filter(|level| level.quantity.is_positive())
            .copied()
    }

    /// Returns true if neither side has any levels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.best_bid().is_none() && self.best_ask().is_none()
    }
}
