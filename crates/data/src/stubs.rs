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

//! Test support: builders producing valid wire buffers and a scripted
//! recovery channel.

use std::sync::Mutex;

use anyhow::bail;
use async_trait::async_trait;
use bytes::Bytes;
use ladderfeed_model::{MessageType, OrderSide};

use crate::{
    recovery::RecoveryChannel,
    wire::{OrderMessage, PAYLOAD_OFFSET, RecoveryRequest, StreamHeader, TradeMessage},
};

/// Frames `payload` into a complete feed buffer for the given stream.
#[must_use]
pub fn feed_buffer(
    stream_id: i16,
    sequence: i32,
    msg_type: MessageType,
    payload: &[u8],
) -> Vec<u8> {
    let len = PAYLOAD_OFFSET + payload.len();
    let header = StreamHeader {
        len: len as i16,
        stream_id,
        sequence,
        msg_type: msg_type.to_wire(),
    };

    let mut buf = Vec::with_capacity(len);
    buf.extend_from_slice(&header.to_bytes());
    buf.push(msg_type.to_wire());
    buf.extend_from_slice(payload);
    buf
}

/// Builds a framed New/Replace/Cancel order buffer.
#[must_use]
#[allow(clippy::too_many_arguments)]
pub fn order_buffer(
    stream_id: i16,
    sequence: i32,
    msg_type: MessageType,
    token: i32,
    order_id: u64,
    side: OrderSide,
    price: i32,
    quantity: i32,
) -> Vec<u8> {
    let msg = OrderMessage {
        timestamp: f64::from(sequence),
        order_id: order_id as f64,
        token,
        side: side.to_wire(),
        price,
        quantity,
    };
    feed_buffer(stream_id, sequence, msg_type, &msg.to_bytes())
}

/// Builds a framed trade buffer.
#[must_use]
#[allow(clippy::too_many_arguments)]
pub fn trade_buffer(
    stream_id: i16,
    sequence: i32,
    token: i32,
    buy_order_id: u64,
    sell_order_id: u64,
    price: i32,
    quantity: i32,
) -> Vec<u8> {
    let msg = TradeMessage {
        timestamp: f64::from(sequence),
        buy_order_id: buy_order_id as f64,
        sell_order_id: sell_order_id as f64,
        token,
        price,
        quantity,
    };
    feed_buffer(stream_id, sequence, MessageType::Trade, &msg.to_bytes())
}

/// Scripted [`RecoveryChannel`] recording the requests it receives.
#[derive(Debug, Default)]
pub struct MockRecoveryChannel {
    buffers: Vec<Bytes>,
    fail: bool,
    requests: Mutex<Vec<RecoveryRequest>>,
}

impl MockRecoveryChannel {
    /// Creates a channel answering every request with `buffers`.
    #[must_use]
    pub fn with_buffers(buffers: Vec<Bytes>) -> Self {
        Self {
            buffers,
            ..Default::default()
        }
    }

    /// Creates a channel failing every request.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    /// Returns the requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<RecoveryRequest> {
        self.requests.lock().expect("poisoned requests lock").clone()
    }
}

#[async_trait]
impl RecoveryChannel for MockRecoveryChannel {
    async fn request(&self, request: RecoveryRequest) -> anyhow::Result<Vec<Bytes>> {
        self.requests
            .lock()
            .expect("poisoned requests lock")
            .push(request);

        if self.fail {
            bail!("scripted recovery failure");
        }
        Ok(self.buffers.clone())
    }
}
