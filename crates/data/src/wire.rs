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

//! Wire records for the binary feed protocol.
//!
//! All records are little-endian and packed with no padding; sizes are fixed
//! constants. Decoding is hand-rolled over `from_le_bytes` so the byte order
//! is pinned regardless of host architecture.
//!
//! A feed buffer is laid out as the 9-byte [`StreamHeader`], one duplicated
//! message-type byte at offset 9, then the payload record at offset 10. The
//! header's `msg_type` is authoritative; encoders always write the duplicate
//! consistently, and a disagreeing duplicate marks the buffer malformed.

use ladderfeed_model::{MessageType, OrderSide, RequestStatus};
use thiserror::Error;

/// Size in bytes of an encoded [`StreamHeader`].
pub const STREAM_HEADER_LEN: usize = 9;
/// Offset of the duplicated message-type byte in a feed buffer.
pub const MESSAGE_TYPE_OFFSET: usize = 9;
/// Offset of the payload record in a feed buffer.
pub const PAYLOAD_OFFSET: usize = 10;
/// Size in bytes of an encoded [`OrderMessage`].
pub const ORDER_MESSAGE_LEN: usize = 29;
/// Size in bytes of an encoded [`TradeMessage`].
pub const TRADE_MESSAGE_LEN: usize = 36;
/// Size in bytes of an encoded [`RecoveryRequest`].
pub const RECOVERY_REQUEST_LEN: usize = 11;
/// Size in bytes of an encoded [`RecoveryResponse`].
pub const RECOVERY_RESPONSE_LEN: usize = 10;

/// Represents a failure decoding a wire record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum WireError {
    #[error("buffer too short: expected at least {expected} bytes, was {actual}")]
    BufferTooShort { expected: usize, actual: usize },
    #[error("unknown message type tag {0:#04x}")]
    UnknownMessageType(u8),
    #[error("unknown side tag {0:#04x}")]
    UnknownSide(u8),
    #[error("message type byte {dup:#04x} disagrees with header type {header:#04x}")]
    TypeMismatch { header: u8, dup: u8 },
}

fn ensure_len(buf: &[u8], expected: usize) -> Result<(), WireError> {
    if buf.len() < expected {
        return Err(WireError::BufferTooShort {
            expected,
            actual: buf.len(),
        });
    }
    Ok(())
}

fn read_i16(buf: &[u8], offset: usize) -> i16 {
    i16::from_le_bytes([buf[offset], buf[offset + 1]])
}

fn read_i32(buf: &[u8], offset: usize) -> i32 {
    i32::from_le_bytes([
        buf[offset],
        buf[offset + 1],
        buf[offset + 2],
        buf[offset + 3],
    ])
}

fn read_f64(buf: &[u8], offset: usize) -> f64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&buf[offset..offset + 8]);
    f64::from_le_bytes(bytes)
}

/// The per-message header framing every feed buffer.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StreamHeader {
    /// Total length of the feed buffer in bytes.
    pub len: i16,
    /// The logical stream the message belongs to.
    pub stream_id: i16,
    /// The per-stream sequence number.
    pub sequence: i32,
    /// The message type tag (authoritative over the duplicated payload byte).
    pub msg_type: u8,
}

impl StreamHeader {
    /// Decodes a header from the front of `buf`.
    ///
    /// # Errors
    ///
    /// Returns an error if `buf` holds fewer than [`STREAM_HEADER_LEN`] bytes.
    pub fn from_bytes(buf: &[u8]) -> Result<Self, WireError> {
        ensure_len(buf, STREAM_HEADER_LEN)?;
        Ok(Self {
            len: read_i16(buf, 0),
            stream_id: read_i16(buf, 2),
            sequence: read_i32(buf, 4),
            msg_type: buf[8],
        })
    }

    /// Encodes the header into its 9-byte wire form.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; STREAM_HEADER_LEN] {
        let mut buf = [0u8; STREAM_HEADER_LEN];
        buf[0..2].copy_from_slice(&self.len.to_le_bytes());
        buf[2..4].copy_from_slice(&self.stream_id.to_le_bytes());
        buf[4..8].copy_from_slice(&self.sequence.to_le_bytes());
        buf[8] = self.msg_type;
        buf
    }

    /// Returns the decoded message type tag.
    ///
    /// # Errors
    ///
    /// Returns an error if the tag byte is not a known [`MessageType`].
    pub fn message_type(&self) -> Result<MessageType, WireError> {
        MessageType::from_wire(self.msg_type).ok_or(WireError::UnknownMessageType(self.msg_type))
    }
}

/// Payload record for New/Replace/Cancel order events.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrderMessage {
    /// Event timestamp as epoch seconds.
    pub timestamp: f64,
    /// The exchange order id (integral value carried as `f64` on the wire).
    pub order_id: f64,
    /// The instrument token the order belongs to.
    pub token: i32,
    /// The side tag (`'B'` or `'S'`).
    pub side: u8,
    /// The limit price, pre-scaled to an integer.
    pub price: i32,
    /// The order quantity.
    pub quantity: i32,
}

impl OrderMessage {
    /// Decodes an order record from the front of `buf`.
    ///
    /// # Errors
    ///
    /// Returns an error if `buf` holds fewer than [`ORDER_MESSAGE_LEN`] bytes.
    pub fn from_bytes(buf: &[u8]) -> Result<Self, WireError> {
        ensure_len(buf, ORDER_MESSAGE_LEN)?;
        Ok(Self {
            timestamp: read_f64(buf, 0),
            order_id: read_f64(buf, 8),
            token: read_i32(buf, 16),
            side: buf[20],
            price: read_i32(buf, 21),
            quantity: read_i32(buf, 25),
        })
    }

    /// Encodes the record into its 29-byte wire form.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; ORDER_MESSAGE_LEN] {
        let mut buf = [0u8; ORDER_MESSAGE_LEN];
        buf[0..8].copy_from_slice(&self.timestamp.to_le_bytes());
        buf[8..16].copy_from_slice(&self.order_id.to_le_bytes());
        buf[16..20].copy_from_slice(&self.token.to_le_bytes());
        buf[20] = self.side;
        buf[21..25].copy_from_slice(&self.price.to_le_bytes());
        buf[25..29].copy_from_slice(&self.quantity.to_le_bytes());
        buf
    }

    /// Returns the decoded order side.
    ///
    /// # Errors
    ///
    /// Returns an error if the side byte is not a known [`OrderSide`].
    pub fn order_side(&self) -> Result<OrderSide, WireError> {
        OrderSide::from_wire(self.side).ok_or(WireError::UnknownSide(self.side))
    }
}

/// Payload record for trade events.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TradeMessage {
    /// Event timestamp as epoch seconds.
    pub timestamp: f64,
    /// The resting buy order id.
    pub buy_order_id: f64,
    /// The resting sell order id.
    pub sell_order_id: f64,
    /// The instrument token the trade belongs to.
    pub token: i32,
    /// The trade price, pre-scaled to an integer.
    pub price: i32,
    /// The traded quantity.
    pub quantity: i32,
}

impl TradeMessage {
    /// Decodes a trade record from the front of `buf`.
    ///
    /// # Errors
    ///
    /// Returns an error if `buf` holds fewer than [`TRADE_MESSAGE_LEN`] bytes.
    pub fn from_bytes(buf: &[u8]) -> Result<Self, WireError> {
        ensure_len(buf, TRADE_MESSAGE_LEN)?;
        Ok(Self {
            timestamp: read_f64(buf, 0),
            buy_order_id: read_f64(buf, 8),
            sell_order_id: read_f64(buf, 16),
            token: read_i32(buf, 24),
            price: read_i32(buf, 28),
            quantity: read_i32(buf, 32),
        })
    }

    /// Encodes the record into its 36-byte wire form.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; TRADE_MESSAGE_LEN] {
        let mut buf = [0u8; TRADE_MESSAGE_LEN];
        buf[0..8].copy_from_slice(&self.timestamp.to_le_bytes());
        buf[8..16].copy_from_slice(&self.buy_order_id.to_le_bytes());
        buf[16..24].copy_from_slice(&self.sell_order_id.to_le_bytes());
        buf[24..28].copy_from_slice(&self.token.to_le_bytes());
        buf[28..32].copy_from_slice(&self.price.to_le_bytes());
        buf[32..36].copy_from_slice(&self.quantity.to_le_bytes());
        buf
    }
}

/// Request for retransmission of a missed sequence range.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecoveryRequest {
    /// The message type tag (always `'R'`).
    pub msg_type: u8,
    /// The stream the range was missed on.
    pub stream_id: i16,
    /// First missed sequence number (inclusive).
    pub start_seq: i32,
    /// Last missed sequence number (inclusive).
    pub end_seq: i32,
}

impl RecoveryRequest {
    /// Creates a new [`RecoveryRequest`] for the given range.
    #[must_use]
    pub const fn new(stream_id: i16, start_seq: i32, end_seq: i32) -> Self {
        Self {
            msg_type: MessageType::Recovery.to_wire(),
            stream_id,
            start_seq,
            end_seq,
        }
    }

    /// Decodes a request from the front of `buf`.
    ///
    /// # Errors
    ///
    /// Returns an error if `buf` holds fewer than [`RECOVERY_REQUEST_LEN`] bytes.
    pub fn from_bytes(buf: &[u8]) -> Result<Self, WireError> {
        ensure_len(buf, RECOVERY_REQUEST_LEN)?;
        Ok(Self {
            msg_type: buf[0],
            stream_id: read_i16(buf, 1),
            start_seq: read_i32(buf, 3),
            end_seq: read_i32(buf, 7),
        })
    }

    /// Encodes the request into its 11-byte wire form.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; RECOVERY_REQUEST_LEN] {
        let mut buf = [0u8; RECOVERY_REQUEST_LEN];
        buf[0] = self.msg_type;
        buf[1..3].copy_from_slice(&self.stream_id.to_le_bytes());
        buf[3..7].copy_from_slice(&self.start_seq.to_le_bytes());
        buf[7..11].copy_from_slice(&self.end_seq.to_le_bytes());
        buf
    }
}

/// Acknowledgement returned by the recovery endpoint before replayed buffers.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecoveryResponse {
    /// Total length of the response record.
    pub msg_len: i16,
    /// The stream the request was made for.
    pub stream_id: i16,
    /// The first sequence number of the acknowledged range.
    pub seq_no: i32,
    /// The message type tag (always `'R'`).
    pub msg_type: u8,
    /// Whether the request was accepted (`'A'`) or rejected (`'J'`).
    pub request_status: u8,
}

impl RecoveryResponse {
    /// Decodes a response from the front of `buf`.
    ///
    /// # Errors
    ///
    /// Returns an error if `buf` holds fewer than [`RECOVERY_RESPONSE_LEN`] bytes.
    pub fn from_bytes(buf: &[u8]) -> Result<Self, WireError> {
        ensure_len(buf, RECOVERY_RESPONSE_LEN)?;
        Ok(Self {
            msg_len: read_i16(buf, 0),
            stream_id: read_i16(buf, 2),
            seq_no: read_i32(buf, 4),
            msg_type: buf[8],
            request_status: buf[9],
        })
    }

    /// Encodes the response into its 10-byte wire form.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; RECOVERY_RESPONSE_LEN] {
        let mut buf = [0u8; RECOVERY_RESPONSE_LEN];
        buf[0..2].copy_from_slice(&self.msg_len.to_le_bytes());
        buf[2..4].copy_from_slice(&self.stream_id.to_le_bytes());
        buf[4..8].copy_from_slice(&self.seq_no.to_le_bytes());
        buf[8] = self.msg_type;
        buf[9] = self.request_status;
        buf
    }

    /// Returns the decoded request status, or `None` for an unknown tag.
    #[must_use]
    pub const fn status(&self) -> Option<RequestStatus> {
        RequestStatus::from_wire(self.request_status)
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use ladderfeed_model::MessageType;
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn test_stream_header_round_trip() {
        let header = StreamHeader {
            len: 39,
            stream_id: 3,
            sequence: 1_000_001,
            msg_type: MessageType::New.to_wire(),
        };

        let decoded = StreamHeader::from_bytes(&header.to_bytes()).unwrap();
        assert_eq!(decoded, header);
        assert_eq!(decoded.message_type().unwrap(), MessageType::New);
    }

    #[rstest]
    fn test_stream_header_too_short() {
        let result = StreamHeader::from_bytes(&[0u8; 5]);
        assert_eq!(
            result,
            Err(WireError::BufferTooShort {
                expected: STREAM_HEADER_LEN,
                actual: 5
            })
        );
    }

    #[rstest]
    fn test_stream_header_unknown_type() {
        let header = StreamHeader {
            len: 39,
            stream_id: 1,
            sequence: 7,
            msg_type: b'Q',
        };

        assert_eq!(
            header.message_type(),
            Err(WireError::UnknownMessageType(b'Q'))
        );
    }

    #[rstest]
    fn test_order_message_round_trip() {
        let msg = OrderMessage {
            timestamp: 1_650_000_000.5,
            order_id: 42.0,
            token: 2885,
            side: b'B',
            price: 10_050,
            quantity: 75,
        };

        let decoded = OrderMessage::from_bytes(&msg.to_bytes()).unwrap();
        assert_eq!(decoded, msg);
        assert_eq!(decoded.order_side().unwrap(), OrderSide::Buy);
    }

    #[rstest]
    fn test_order_message_layout_is_packed_little_endian() {
        let msg = OrderMessage {
            timestamp: 0.0,
            order_id: 0.0,
            token: 0x0102_0304,
            side: b'S',
            price: 0x0A0B_0C0D,
            quantity: 1,
        };

        let bytes = msg.to_bytes();
        // Token at offset 16, LSB first
        assert_eq!(&bytes[16..20], &[0x04, 0x03, 0x02, 0x01]);
        assert_eq!(bytes[20], b'S');
        // Price at offset 21, unaligned
        assert_eq!(&bytes[21..25], &[0x0D, 0x0C, 0x0B, 0x0A]);
    }

    #[rstest]
    fn test_order_message_unknown_side() {
        let msg = OrderMessage {
            timestamp: 0.0,
            order_id: 1.0,
            token: 1,
            side: b'Z',
            price: 100,
            quantity: 10,
        };

        let decoded = OrderMessage::from_bytes(&msg.to_bytes()).unwrap();
        assert_eq!(decoded.order_side(), Err(WireError::UnknownSide(b'Z')));
    }

    #[rstest]
    fn test_trade_message_round_trip() {
        let msg = TradeMessage {
            timestamp: 1_650_000_000.25,
            buy_order_id: 11.0,
            sell_order_id: 22.0,
            token: 2885,
            price: 10_000,
            quantity: 25,
        };

        let decoded = TradeMessage::from_bytes(&msg.to_bytes()).unwrap();
        assert_eq!(decoded, msg);
    }

    #[rstest]
    #[case(ORDER_MESSAGE_LEN - 1)]
    #[case(0)]
    fn test_order_message_too_short(#[case] len: usize) {
        let result = OrderMessage::from_bytes(&vec![0u8; len]);
        assert!(matches!(result, Err(WireError::BufferTooShort { .. })));
    }

    #[rstest]
    fn test_recovery_request_round_trip() {
        let request = RecoveryRequest::new(2, 100, 110);

        assert_eq!(request.msg_type, b'R');
        let decoded = RecoveryRequest::from_bytes(&request.to_bytes()).unwrap();
        assert_eq!(decoded, request);
    }

    #[rstest]
    fn test_recovery_response_round_trip() {
        let response = RecoveryResponse {
            msg_len: RECOVERY_RESPONSE_LEN as i16,
            stream_id: 2,
            seq_no: 100,
            msg_type: b'R',
            request_status: b'A',
        };

        let decoded = RecoveryResponse::from_bytes(&response.to_bytes()).unwrap();
        assert_eq!(decoded, response);
    }
}
