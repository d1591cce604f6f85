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

//! Gap recovery over a request/replay side channel.
//!
//! A [`RecoveryCoordinator`] owns the retransmission lifecycle for one
//! stream. It holds at most one outstanding range request; gaps detected
//! while busy are merged into a pending queue and issued afterwards, so the
//! recovery endpoint never sees two concurrent overlapping requests.
//! Requests run on spawned tasks with a timeout, keeping live dispatch
//! unblocked while a range is in flight.

use std::{
    collections::{HashMap, VecDeque},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use anyhow::bail;
use async_trait::async_trait;
use bytes::Bytes;
use ladderfeed_core::FiniteStateMachine;
use ladderfeed_model::{RequestStatus, StreamId};
use serde::{Deserialize, Serialize};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel},
};

use crate::{
    dispatcher::SequenceGap,
    wire::{RECOVERY_RESPONSE_LEN, RecoveryRequest, RecoveryResponse},
};

/// The lifecycle state of a stream's recovery coordinator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecoveryState {
    /// No range outstanding.
    Idle,
    /// A range request is in flight.
    Requested,
    /// Recovered buffers are being replayed.
    Applying,
}

/// Triggers driving the recovery state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecoveryTrigger {
    Request,
    Apply,
    Complete,
    Abandon,
}

fn recovery_transition_table()
-> HashMap<(RecoveryState, RecoveryTrigger), RecoveryState> {
    let mut table = HashMap::new();
    table.insert(
        (RecoveryState::Idle, RecoveryTrigger::Request),
        RecoveryState::Requested,
    );
    table.insert(
        (RecoveryState::Requested, RecoveryTrigger::Apply),
        RecoveryState::Applying,
    );
    table.insert(
        (RecoveryState::Requested, RecoveryTrigger::Abandon),
        RecoveryState::Idle,
    );
    table.insert(
        (RecoveryState::Applying, RecoveryTrigger::Complete),
        RecoveryState::Idle,
    );
    table
}

/// Configuration for the recovery side channel.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct RecoveryConfig {
    /// The recovery endpoint host.
    pub host: String,
    /// The recovery endpoint port.
    pub port: u16,
    /// Timeout for one range request in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Attempts per range before the gap is abandoned.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

const fn default_timeout_secs() -> u64 {
    5
}

const fn default_max_retries() -> u32 {
    3
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9011,
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

impl RecoveryConfig {
    /// Returns the request timeout as a [`Duration`].
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Returns the endpoint address in `host:port` form.
    #[must_use]
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// A transport able to fetch retransmissions of a missed sequence range.
#[async_trait]
pub trait RecoveryChannel: Send + Sync {
    /// Requests retransmission, returning the replayed feed buffers in
    /// sequence order.
    async fn request(&self, request: RecoveryRequest) -> anyhow::Result<Vec<Bytes>>;
}

/// TCP implementation of [`RecoveryChannel`].
///
/// One connection per request: writes the 11-byte request, reads the
/// acknowledgement, then reads the replayed buffers, each self-framed by the
/// length field at the front of its stream header.
#[derive(Clone, Debug)]
pub struct TcpRecoveryChannel {
    addr: String,
}

impl TcpRecoveryChannel {
    /// Creates a new [`TcpRecoveryChannel`] for the configured endpoint.
    #[must_use]
    pub fn new(config: &RecoveryConfig) -> Self {
        Self {
            addr: config.addr(),
        }
    }
}

#[async_trait]
impl RecoveryChannel for TcpRecoveryChannel {
    async fn request(&self, request: RecoveryRequest) -> anyhow::Result<Vec<Bytes>> {
        let mut stream = TcpStream::connect(&self.addr).await?;
        stream.write_all(&request.to_bytes()).await?;

        let mut ack = [0u8; RECOVERY_RESPONSE_LEN];
        stream.read_exact(&mut ack).await?;
        let response = RecoveryResponse::from_bytes(&ack)?;

        match response.status() {
            Some(RequestStatus::Accepted) => {}
            Some(RequestStatus::Rejected) => {
                bail!(
                    "recovery request rejected for stream {} range [{}, {}]",
                    request.stream_id,
                    request.start_seq,
                    request.end_seq,
                );
            }
            None => bail!("unknown recovery status tag {:#04x}", response.request_status),
        }

        let count = (request.end_seq - request.start_seq + 1).max(0) as usize;
        let mut buffers = Vec::with_capacity(count);
        for _ in 0..count {
            let mut len_bytes = [0u8; 2];
            stream.read_exact(&mut len_bytes).await?;
            let len = i16::from_le_bytes(len_bytes);
            if len < 2 {
                bail!("invalid replay frame length {len}");
            }

            let mut buffer = vec![0u8; len as usize];
            buffer[0..2].copy_from_slice(&len_bytes);
            stream.read_exact(&mut buffer[2..]).await?;
            buffers.push(Bytes::from(buffer));
        }

        Ok(buffers)
    }
}

/// The result of one range request, delivered back to the owning worker.
#[derive(Clone, Debug)]
pub enum RecoveryOutcome {
    /// The range was retransmitted; buffers are ready to replay.
    Recovered {
        gap: SequenceGap,
        buffers: Vec<Bytes>,
    },
    /// All attempts failed or timed out; the range stays unfilled.
    Abandoned { gap: SequenceGap },
}

/// Owns the gap recovery lifecycle for one stream.
pub struct RecoveryCoordinator {
    stream_id: StreamId,
    fsm: FiniteStateMachine<RecoveryState, RecoveryTrigger>,
    channel: Arc<dyn RecoveryChannel>,
    timeout: Duration,
    max_retries: u32,
    pending: VecDeque<SequenceGap>,
    unrecovered: Vec<SequenceGap>,
    degraded: Arc<AtomicBool>,
    outcome_tx: UnboundedSender<RecoveryOutcome>,
    outcome_rx: UnboundedReceiver<RecoveryOutcome>,
}

impl RecoveryCoordinator {
    /// Creates a new [`RecoveryCoordinator`] instance.
    #[must_use]
    pub fn new(
        stream_id: StreamId,
        channel: Arc<dyn RecoveryChannel>,
        config: &RecoveryConfig,
    ) -> Self {
        let (outcome_tx, outcome_rx) = unbounded_channel();
        Self {
            stream_id,
            fsm: FiniteStateMachine::new(RecoveryState::Idle, recovery_transition_table()),
            channel,
            timeout: config.timeout(),
            max_retries: config.max_retries.max(1),
            pending: VecDeque::new(),
            unrecovered: Vec::new(),
            degraded: Arc::new(AtomicBool::new(false)),
            outcome_tx,
            outcome_rx,
        }
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> RecoveryState {
        self.fsm.state()
    }

    /// Returns the shared degraded flag for this stream.
    #[must_use]
    pub fn degraded_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.degraded)
    }

    /// Returns the queued ranges not yet requested.
    #[must_use]
    pub fn pending(&self) -> &VecDeque<SequenceGap> {
        &self.pending
    }

    /// Returns the ranges abandoned as unrecoverable.
    #[must_use]
    pub fn unrecovered(&self) -> &[SequenceGap] {
        &self.unrecovered
    }

    /// Queues a missed range for recovery, coalescing with queued ranges.
    ///
    /// Issues the request immediately when the coordinator is idle.
    pub fn schedule(&mut self, gap: SequenceGap) {
        debug_assert_eq!(gap.stream_id, self.stream_id);
        log::info!(
            "Gap on stream {}: missed sequences [{}, {}]",
            self.stream_id,
            gap.start,
            gap.end,
        );
        merge_gap(&mut self.pending, gap);
        self.maybe_launch();
    }

    /// Receives the next completed request, pending until one resolves.
    pub async fn next_outcome(&mut self) -> Option<RecoveryOutcome> {
        self.outcome_rx.recv().await
    }

    /// Marks the in-flight range as being replayed.
    pub fn begin_apply(&mut self) {
        self.transition(RecoveryTrigger::Apply);
    }

    /// Completes the replay of the in-flight range.
    ///
    /// Clears the degraded flag once nothing is outstanding and no range was
    /// abandoned, then issues the next queued range if any.
    pub fn complete(&mut self) {
        self.transition(RecoveryTrigger::Complete);
        if self.pending.is_empty() && self.unrecovered.is_empty() {
            self.degraded.store(false, Ordering::Relaxed);
        }
        self.maybe_launch();
    }

    /// Abandons the in-flight range and flags the stream degraded.
    pub fn abandon(&mut self, gap: SequenceGap) {
        self.transition(RecoveryTrigger::Abandon);
        log::error!(
            "Recovery abandoned on stream {}: sequences [{}, {}] unfilled",
            self.stream_id,
            gap.start,
            gap.end,
        );
        self.unrecovered.push(gap);
        self.degraded.store(true, Ordering::Relaxed);
        self.maybe_launch();
    }

    fn transition(&mut self, trigger: RecoveryTrigger) {
        self.fsm
            .trigger(trigger)
            .expect("invalid recovery state transition");
    }

    fn maybe_launch(&mut self) {
        if self.fsm.state() != RecoveryState::Idle {
            return;
        }
        let Some(gap) = self.pending.pop_front() else {
            return;
        };

        self.transition(RecoveryTrigger::Request);

        let request = RecoveryRequest::new(
            gap.stream_id.as_i16(),
            gap.start as i32,
            gap.end as i32,
        );
        let channel = Arc::clone(&self.channel);
        let timeout = self.timeout;
        let max_retries = self.max_retries;
        let tx = self.outcome_tx.clone();
        let stream_id = self.stream_id;

        tokio::spawn(async move {
            let mut outcome = RecoveryOutcome::Abandoned { gap };
            for attempt in 1..=max_retries {
                match tokio::time::timeout(timeout, channel.request(request)).await {
                    Ok(Ok(buffers)) => {
                        outcome = RecoveryOutcome::Recovered { gap, buffers };
                        break;
                    }
                    Ok(Err(e)) => {
                        log::warn!(
                            "Recovery attempt {attempt}/{max_retries} failed on stream {stream_id}: {e}",
                        );
                    }
                    Err(_) => {
                        log::warn!(
                            "Recovery attempt {attempt}/{max_retries} timed out on stream {stream_id}",
                        );
                    }
                }
            }
            // Receiver dropped means the worker shut down; nothing to do
            let _ = tx.send(outcome);
        });
    }
}

impl std::fmt::Debug for RecoveryCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(stringify!(RecoveryCoordinator))
            .field("stream_id", &self.stream_id)
            .field("state", &self.fsm.state())
            .field("pending", &self.pending)
            .field("unrecovered", &self.unrecovered)
            .finish()
    }
}

/// Inserts `gap` into `pending`, coalescing overlapping or adjacent ranges.
fn merge_gap(pending: &mut VecDeque<SequenceGap>, gap: SequenceGap) {
    let mut merged = gap;
    let mut rest = VecDeque::with_capacity(pending.len() + 1);

    while let Some(queued) = pending.pop_front() {
        let adjacent_or_overlapping =
            merged.start <= queued.end.saturating_add(1) && queued.start <= merged.end.saturating_add(1);
        if adjacent_or_overlapping {
            merged.start = merged.start.min(queued.start);
            merged.end = merged.end.max(queued.end);
        } else {
            rest.push_back(queued);
        }
    }

    rest.push_back(merged);
    rest.make_contiguous()
        .sort_by_key(|g| g.start);
    *pending = rest;
}
