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

//! Per-stream feed worker task.

use std::sync::Arc;

use bytes::Bytes;
use ladderfeed_common::runtime::get_runtime;
use ladderfeed_model::{InstrumentToken, StreamId};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use crate::{
    dispatcher::{DispatchOutcome, StreamDispatcher},
    handle::DepthHandle,
    recovery::{RecoveryChannel, RecoveryConfig, RecoveryCoordinator, RecoveryOutcome},
};

/// Owns one stream's dispatcher and recovery coordinator on a single task.
///
/// The worker multiplexes two inputs: live feed buffers arriving on an
/// unbounded channel, and completed recovery requests. Live processing never
/// waits on recovery, while within the worker dispatch and replay are
/// strictly sequential, so the books only ever have one writer.
#[derive(Debug)]
pub struct StreamWorker {
    dispatcher: StreamDispatcher,
    coordinator: RecoveryCoordinator,
    feed_rx: UnboundedReceiver<Bytes>,
}

impl StreamWorker {
    /// Creates a new [`StreamWorker`] with its feed sender and query handle.
    #[must_use]
    pub fn new(
        stream_id: StreamId,
        tokens: impl IntoIterator<Item = InstrumentToken>,
        channel: Arc<dyn RecoveryChannel>,
        config: &RecoveryConfig,
    ) -> (Self, UnboundedSender<Bytes>, DepthHandle) {
        let dispatcher = StreamDispatcher::new(stream_id, tokens);
        let coordinator = RecoveryCoordinator::new(stream_id, channel, config);
        let handle = DepthHandle::new(dispatcher.books(), coordinator.degraded_flag());
        let (feed_tx, feed_rx) = unbounded_channel();

        let worker = Self {
            dispatcher,
            coordinator,
            feed_rx,
        };
        (worker, feed_tx, handle)
    }

    /// Spawns the worker onto the shared runtime.
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        get_runtime().spawn(self.run())
    }

    /// Runs the worker until the feed sender is dropped.
    pub async fn run(mut self) {
        let stream_id = self.dispatcher.stream_id();
        log::info!("Stream {stream_id} worker started");

        loop {
            tokio::select! {
                maybe_buffer = self.feed_rx.recv() => {
                    let Some(buffer) = maybe_buffer else {
                        break;
                    };
                    self.on_buffer(&buffer);
                }
                Some(outcome) = self.coordinator.next_outcome() => {
                    self.on_recovery(outcome);
                }
            }
        }

        log::info!("Stream {stream_id} worker stopped");
    }

    fn on_buffer(&mut self, buffer: &[u8]) {
        if let DispatchOutcome::Gapped(gap) = self.dispatcher.process(buffer) {
            self.coordinator.schedule(gap);
        }
    }

    fn on_recovery(&mut self, outcome: RecoveryOutcome) {
        match outcome {
            RecoveryOutcome::Recovered { gap, buffers } => {
                self.coordinator.begin_apply();
                let mut replayed = 0usize;
                for buffer in &buffers {
                    match self.dispatcher.replay(buffer) {
                        Ok(()) => replayed += 1,
                        Err(e) => log::warn!(
                            "Dropped malformed recovered buffer on stream {}: {e}",
                            gap.stream_id,
                        ),
                    }
                }
                log::info!(
                    "Recovered stream {}: replayed {replayed} buffers for [{}, {}]",
                    gap.stream_id,
                    gap.start,
                    gap.end,
                );
                self.coordinator.complete();
            }
            RecoveryOutcome::Abandoned { gap } => self.coordinator.abandon(gap),
        }
    }
}
