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

//! Feed ingestion for the ladderfeed market-data handler.
//!
//! Covers the binary wire format, per-stream sequencing and dispatch into
//! ladder books, gap recovery over a request/replay side channel, and the
//! per-stream worker task tying them together behind a cloneable depth
//! query handle.

pub mod dispatcher;
pub mod handle;
pub mod recovery;
pub mod stubs;
pub mod wire;
pub mod worker;

// Re-exports
pub use crate::{
    dispatcher::{DispatchOutcome, SequenceGap, StreamDispatcher},
    handle::DepthHandle,
    recovery::{
        RecoveryChannel, RecoveryConfig, RecoveryCoordinator, RecoveryOutcome, RecoveryState,
        TcpRecoveryChannel,
    },
    wire::{
        OrderMessage, RecoveryRequest, RecoveryResponse, StreamHeader, TradeMessage, WireError,
    },
    worker::StreamWorker,
};
