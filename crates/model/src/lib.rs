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

//! Domain model for the ladderfeed market-data handler.
//!
//! Defines the identifier and value types shared across the workspace and
//! the per-instrument ladder engine which reconstructs order-book depth
//! from New/Modify/Cancel/Trade events.

pub mod enums;
pub mod identifiers;
pub mod orderbook;
pub mod types;

// Re-exports
pub use crate::{
    enums::{MessageType, OrderSide, RequestStatus},
    identifiers::{InstrumentToken, OrderId, StreamId},
    orderbook::{LADDER_DEPTH, LadderBook, LadderDepth, LadderLevel},
    types::{Price, Quantity},
};
