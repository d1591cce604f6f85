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

//! Per-stream sequencing and event dispatch.
//!
//! A [`StreamDispatcher`] demultiplexes one logical stream's feed buffers into
//! typed order and trade events, routes them to the owning ladder book by
//! instrument token, and detects sequence gaps. Gap detection never blocks
//! live processing: the dispatcher reports the missed range and keeps applying
//! whatever arrives, leaving retransmission to the recovery coordinator.

use std::sync::{Arc, RwLock};

use ahash::AHashMap;
use ladderfeed_core::UnixNanos;
use ladderfeed_model::{
    InstrumentToken, LadderBook, MessageType, OrderId, Price, Quantity, StreamId,
};

use crate::wire::{
    MESSAGE_TYPE_OFFSET, OrderMessage, PAYLOAD_OFFSET, StreamHeader, TradeMessage, WireError,
};

/// A missed sequence range on a stream, inclusive on both ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SequenceGap {
    /// The stream the range was missed on.
    pub stream_id: StreamId,
    /// First missed sequence number.
    pub start: u32,
    /// Last missed sequence number.
    pub end: u32,
}

impl SequenceGap {
    /// Creates a new [`SequenceGap`] instance.
    #[must_use]
    pub const fn new(stream_id: StreamId, start: u32, end: u32) -> Self {
        Self {
            stream_id,
            start,
            end,
        }
    }
}

/// The result of dispatching one feed buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The buffer was applied in order.
    Applied,
    /// The buffer was applied, but a sequence range before it was missed.
    Gapped(SequenceGap),
    /// The buffer was malformed and dropped.
    Dropped(WireError),
}

/// Demultiplexes and sequences feed buffers for one logical stream.
///
/// The token → book map is built once at construction; events for tokens
/// outside it are dropped. Books sit behind `RwLock` because depth queries
/// read them from other threads, but by construction each book has a single
/// writer (this dispatcher).
#[derive(Debug)]
pub struct StreamDispatcher {
    stream_id: StreamId,
    last_sequence: u32,
    books: Arc<AHashMap<InstrumentToken, Arc<RwLock<LadderBook>>>>,
}

impl StreamDispatcher {
    /// Creates a new [`StreamDispatcher`] serving the given instrument tokens.
    #[must_use]
    pub fn new(stream_id: StreamId, tokens: impl IntoIterator<Item = InstrumentToken>) -> Self {
        let books = tokens
            .into_iter()
            .map(|token| (token, Arc::new(RwLock::new(LadderBook::new(token)))))
            .collect();

        Self {
            stream_id,
            last_sequence: 0,
            books: Arc::new(books),
        }
    }

    /// Returns the stream this dispatcher serves.
    #[must_use]
    pub const fn stream_id(&self) -> StreamId {
        self.stream_id
    }

    /// Returns the last sequence number observed on the stream.
    #[must_use]
    pub const fn last_sequence(&self) -> u32 {
        self.last_sequence
    }

    /// Returns the shared token → book map, for depth query handles.
    #[must_use]
    pub fn books(&self) -> Arc<AHashMap<InstrumentToken, Arc<RwLock<LadderBook>>>> {
        Arc::clone(&self.books)
    }

    /// Processes one live feed buffer, advancing the stream sequence.
    ///
    /// Sequencing contract:
    /// - `sequence == expected`: applied in order.
    /// - `sequence > expected`: the hole `[expected, sequence - 1]` is
    ///   reported once via [`DispatchOutcome::Gapped`]; the buffer itself is
    ///   still applied and the sequence state jumps forward, so the same hole
    ///   is never reported twice.
    /// - `sequence < expected`: duplicate or reordered delivery; the sequence
    ///   state adopts the received value and the payload is applied.
    ///
    /// A malformed payload is dropped, but the sequence still advances when
    /// the header parsed — the bytes were consumed from the stream.
    pub fn process(&mut self, buffer: &[u8]) -> DispatchOutcome {
        let header = match StreamHeader::from_bytes(buffer) {
            Ok(header) => header,
            Err(e) => return DispatchOutcome::Dropped(e),
        };

        let sequence = header.sequence.max(0) as u32;
        let expected = self.last_sequence + 1;

        let gap = if sequence > expected {
            Some(SequenceGap::new(self.stream_id, expected, sequence - 1))
        } else {
            if sequence < expected {
                log::debug!(
                    "Out-of-order delivery on stream {}: sequence={sequence}, expected={expected}",
                    self.stream_id,
                );
            }
            None
        };

        self.last_sequence = sequence;

        match self.apply_payload(&header, buffer) {
            Ok(()) => gap.map_or(DispatchOutcome::Applied, DispatchOutcome::Gapped),
            Err(e) => {
                log::warn!(
                    "Dropped malformed buffer on stream {}: sequence={sequence}, error={e}",
                    self.stream_id,
                );
                gap.map_or(DispatchOutcome::Dropped(e), DispatchOutcome::Gapped)
            }
        }
    }

    /// Applies a recovered feed buffer with the sequence check suppressed.
    ///
    /// Shares the payload application path with [`Self::process`]; recovery
    /// replays must behave identically to in-order live delivery.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer is malformed.
    pub fn replay(&mut self, buffer: &[u8]) -> Result<(), WireError> {
        let header = StreamHeader::from_bytes(buffer)?;
        self.apply_payload(&header, buffer)
    }

    fn apply_payload(&self, header: &StreamHeader, buffer: &[u8]) -> Result<(), WireError> {
        if buffer.len() <= MESSAGE_TYPE_OFFSET {
            return Err(WireError::BufferTooShort {
                expected: PAYLOAD_OFFSET,
                actual: buffer.len(),
            });
        }

        // Header type is authoritative; a disagreeing duplicate is malformed
        let dup = buffer[MESSAGE_TYPE_OFFSET];
        if dup != header.msg_type {
            return Err(WireError::TypeMismatch {
                header: header.msg_type,
                dup,
            });
        }

        let msg_type = header.message_type()?;
        let payload = &buffer[PAYLOAD_OFFSET..];

        match msg_type {
            MessageType::New | MessageType::Replace | MessageType::Cancel => {
                let msg = OrderMessage::from_bytes(payload)?;
                let side = msg.order_side()?;
                let token = InstrumentToken::new(msg.token);
                let Some(book) = self.books.get(&token) else {
                    log::warn!("Dropped event for unknown token {token} on stream {}", self.stream_id);
                    return Ok(());
                };

                let order_id = OrderId::from_wire(msg.order_id);
                let price = Price::new(msg.price);
                let quantity = Quantity::new(msg.quantity);
                let ts_event = UnixNanos::from_secs_f64(msg.timestamp);

                let mut book = book.write().expect("poisoned book lock");
                match msg_type {
                    MessageType::New => {
                        book.apply_new(token, order_id, side, price, quantity, ts_event);
                    }
                    MessageType::Replace => {
                        book.apply_modify(token, order_id, side, price, quantity, ts_event);
                    }
                    MessageType::Cancel => book.apply_cancel(token, order_id, ts_event),
                    _ => unreachable!(),
                }
            }
            MessageType::Trade => {
                let msg = TradeMessage::from_bytes(payload)?;
                let token = InstrumentToken::new(msg.token);
                let Some(book) = self.books.get(&token) else {
                    log::warn!("Dropped trade for unknown token {token} on stream {}", self.stream_id);
                    return Ok(());
                };

                let mut book = book.write().expect("poisoned book lock");
                book.apply_trade(
                    token,
                    OrderId::from_wire(msg.buy_order_id),
                    OrderId::from_wire(msg.sell_order_id),
                    Price::new(msg.price),
                    Quantity::new(msg.quantity),
                    UnixNanos::from_secs_f64(msg.timestamp),
                );
            }
            MessageType::Recovery => {
                // Recovery acks belong to the recovery channel, not the live feed
                log::warn!("Dropped recovery-tagged buffer on live stream {}", self.stream_id);
            }
        }

        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use ladderfeed_model::{LadderDepth, MessageType, OrderSide};
    use rstest::{fixture, rstest};

    use super::*;
    use crate::stubs::{order_buffer, trade_buffer};

    const STREAM: i16 = 1;
    const TOKEN_A: i32 = 2885;
    const TOKEN_B: i32 = 3456;

    #[fixture]
    fn dispatcher() -> StreamDispatcher {
        StreamDispatcher::new(
            StreamId::new(STREAM),
            [InstrumentToken::new(TOKEN_A), InstrumentToken::new(TOKEN_B)],
        )
    }

    fn depth(dispatcher: &StreamDispatcher, token: i32) -> LadderDepth {
        dispatcher
            .books()
            .get(&InstrumentToken::new(token))
            .expect("token not served")
            .read()
            .expect("poisoned book lock")
            .depth()
    }

    #[rstest]
    fn test_in_order_buffers_apply(mut dispatcher: StreamDispatcher) {
        let buf1 = order_buffer(STREAM, 1, MessageType::New, TOKEN_A, 1, OrderSide::Buy, 100, 50);
        let buf2 = order_buffer(STREAM, 2, MessageType::New, TOKEN_A, 2, OrderSide::Sell, 101, 30);

        assert_eq!(dispatcher.process(&buf1), DispatchOutcome::Applied);
        assert_eq!(dispatcher.process(&buf2), DispatchOutcome::Applied);
        assert_eq!(dispatcher.last_sequence(), 2);

        let snapshot = depth(&dispatcher, TOKEN_A);
        assert_eq!(snapshot.bid[0].quantity, Quantity::new(50));
        assert_eq!(snapshot.ask[0].quantity, Quantity::new(30));
    }

    #[rstest]
    fn test_routing_by_token(mut dispatcher: StreamDispatcher) {
        let buf = order_buffer(STREAM, 1, MessageType::New, TOKEN_A, 1, OrderSide::Buy, 100, 50);
        dispatcher.process(&buf);

        assert!(depth(&dispatcher, TOKEN_B).is_empty());
        assert!(!depth(&dispatcher, TOKEN_A).is_empty());
    }

    #[rstest]
    fn test_gap_reported_once_and_sequence_jumps(mut dispatcher: StreamDispatcher) {
        let buf1 = order_buffer(STREAM, 1, MessageType::New, TOKEN_A, 1, OrderSide::Buy, 100, 50);
        let buf5 = order_buffer(STREAM, 5, MessageType::New, TOKEN_A, 2, OrderSide::Buy, 99, 20);
        let buf6 = order_buffer(STREAM, 6, MessageType::New, TOKEN_A, 3, OrderSide::Buy, 98, 10);

        assert_eq!(dispatcher.process(&buf1), DispatchOutcome::Applied);
        assert_eq!(
            dispatcher.process(&buf5),
            DispatchOutcome::Gapped(SequenceGap::new(StreamId::new(STREAM), 2, 4))
        );
        // The gapped buffer itself was applied and the hole is not re-reported
        assert_eq!(dispatcher.process(&buf6), DispatchOutcome::Applied);
        assert_eq!(dispatcher.last_sequence(), 6);

        let snapshot = depth(&dispatcher, TOKEN_A);
        assert_eq!(snapshot.bid[0].quantity, Quantity::new(50));
        assert_eq!(snapshot.bid[1].quantity, Quantity::new(20));
        assert_eq!(snapshot.bid[2].quantity, Quantity::new(10));
    }

    #[rstest]
    fn test_gap_from_initial_sequence(mut dispatcher: StreamDispatcher) {
        let buf = order_buffer(STREAM, 3, MessageType::New, TOKEN_A, 1, OrderSide::Buy, 100, 50);

        assert_eq!(
            dispatcher.process(&buf),
            DispatchOutcome::Gapped(SequenceGap::new(StreamId::new(STREAM), 1, 2))
        );
    }

    #[rstest]
    fn test_duplicate_sequence_applied_without_gap(mut dispatcher: StreamDispatcher) {
        let buf1 = order_buffer(STREAM, 1, MessageType::New, TOKEN_A, 1, OrderSide::Buy, 100, 50);
        let buf1_dup =
            order_buffer(STREAM, 1, MessageType::New, TOKEN_A, 2, OrderSide::Buy, 99, 25);

        assert_eq!(dispatcher.process(&buf1), DispatchOutcome::Applied);
        assert_eq!(dispatcher.process(&buf1_dup), DispatchOutcome::Applied);
        assert_eq!(dispatcher.last_sequence(), 1);

        // The reordered payload was still applied
        let snapshot = depth(&dispatcher, TOKEN_A);
        assert_eq!(snapshot.bid[1].quantity, Quantity::new(25));
    }

    #[rstest]
    fn test_unknown_token_dropped_sequence_advances(mut dispatcher: StreamDispatcher) {
        let buf = order_buffer(STREAM, 1, MessageType::New, 9999, 1, OrderSide::Buy, 100, 50);

        assert_eq!(dispatcher.process(&buf), DispatchOutcome::Applied);
        assert_eq!(dispatcher.last_sequence(), 1);
        assert!(depth(&dispatcher, TOKEN_A).is_empty());
    }

    #[rstest]
    fn test_unknown_message_type_dropped_sequence_advances(mut dispatcher: StreamDispatcher) {
        let mut buf = order_buffer(STREAM, 1, MessageType::New, TOKEN_A, 1, OrderSide::Buy, 100, 50);
        buf[8] = b'Q';
        buf[MESSAGE_TYPE_OFFSET] = b'Q';

        assert_eq!(
            dispatcher.process(&buf),
            DispatchOutcome::Dropped(WireError::UnknownMessageType(b'Q'))
        );
        assert_eq!(dispatcher.last_sequence(), 1);
    }

    #[rstest]
    fn test_type_byte_mismatch_dropped(mut dispatcher: StreamDispatcher) {
        let mut buf = order_buffer(STREAM, 1, MessageType::New, TOKEN_A, 1, OrderSide::Buy, 100, 50);
        buf[MESSAGE_TYPE_OFFSET] = MessageType::Cancel.to_wire();

        assert_eq!(
            dispatcher.process(&buf),
            DispatchOutcome::Dropped(WireError::TypeMismatch {
                header: MessageType::New.to_wire(),
                dup: MessageType::Cancel.to_wire(),
            })
        );
        assert!(depth(&dispatcher, TOKEN_A).is_empty());
    }

    #[rstest]
    fn test_short_buffer_no_state_change(mut dispatcher: StreamDispatcher) {
        assert!(matches!(
            dispatcher.process(&[0u8; 4]),
            DispatchOutcome::Dropped(WireError::BufferTooShort { .. })
        ));
        assert_eq!(dispatcher.last_sequence(), 0);
    }

    #[rstest]
    fn test_trade_routed_to_book(mut dispatcher: StreamDispatcher) {
        let new_buy = order_buffer(STREAM, 1, MessageType::New, TOKEN_A, 1, OrderSide::Buy, 100, 50);
        let new_sell =
            order_buffer(STREAM, 2, MessageType::New, TOKEN_A, 2, OrderSide::Sell, 100, 30);
        let trade = trade_buffer(STREAM, 3, TOKEN_A, 1, 2, 100, 25);

        dispatcher.process(&new_buy);
        dispatcher.process(&new_sell);
        assert_eq!(dispatcher.process(&trade), DispatchOutcome::Applied);

        let snapshot = depth(&dispatcher, TOKEN_A);
        assert_eq!(snapshot.bid[0].quantity, Quantity::new(25));
        assert_eq!(snapshot.ask[0].quantity, Quantity::new(5));
    }

    #[rstest]
    fn test_replay_ignores_sequence(mut dispatcher: StreamDispatcher) {
        let buf = order_buffer(STREAM, 42, MessageType::New, TOKEN_A, 1, OrderSide::Buy, 100, 50);

        dispatcher.replay(&buf).unwrap();

        assert_eq!(dispatcher.last_sequence(), 0);
        assert_eq!(depth(&dispatcher, TOKEN_A).bid[0].quantity, Quantity::new(50));
    }
}
