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
//!
//! A [`LadderBook`] reconstructs one instrument's order book from the feed's
//! New/Modify/Cancel/Trade events, maintaining two side-ordered price-level
//! aggregate maps plus a per-order index, and producing fixed-depth
//! [`LadderDepth`] snapshots on demand.

pub mod book;
pub mod depth;
pub mod ladder;

use crate::{identifiers::InstrumentToken, types::Price};

// Re-exports
pub use book::{LadderBook, RestingOrder};
pub use depth::{LADDER_DEPTH, LadderDepth, LadderLevel};
pub use ladder::{BookPrice, SideLadder};

/// Represents a corruption of the ladder invariants.
///
/// These are never produced by normal feed handling (protocol anomalies are
/// logged no-ops); they exist for integrity checks in tests and debug
/// assertions.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BookIntegrityError {
    /// A price level's aggregate disagrees with the resting orders at that price.
    #[error(
        "Level aggregate mismatch for token {token} at {price}: level has {level_quantity}, orders sum to {order_quantity}"
    )]
    LevelAggregateMismatch {
        /// The instrument whose book is inconsistent.
        token: InstrumentToken,
        /// The inconsistent price level.
        price: Price,
        /// The aggregate recorded at the level.
        level_quantity: i32,
        /// The sum over resting orders at that price and side.
        order_quantity: i32,
    },
    /// A price level exists with non-positive aggregate quantity.
    #[error("Non-positive level for token {token} at {price}: {quantity}")]
    NonPositiveLevel {
        /// The instrument whose book is inconsistent.
        token: InstrumentToken,
        /// The offending price level.
        price: Price,
        /// The non-positive aggregate.
        quantity: i32,
    },
}
