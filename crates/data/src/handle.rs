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

//! Cross-thread depth query surface.

use std::sync::{
    Arc, RwLock,
    atomic::{AtomicBool, Ordering},
};

use ahash::AHashMap;
use ladderfeed_model::{InstrumentToken, LadderBook, LadderDepth};

/// Cloneable read-only view over one stream's ladder books.
///
/// Queries are pull-based: each call takes a read lock on the queried book
/// and copies out a fixed-size snapshot. `is_degraded` reports whether the
/// stream has unrecovered sequence gaps, in which case snapshots may be
/// missing events.
#[derive(Clone, Debug)]
pub struct DepthHandle {
    books: Arc<AHashMap<InstrumentToken, Arc<RwLock<LadderBook>>>>,
    degraded: Arc<AtomicBool>,
}

impl DepthHandle {
    /// Creates a new [`DepthHandle`] instance.
    #[must_use]
    pub(crate) fn new(
        books: Arc<AHashMap<InstrumentToken, Arc<RwLock<LadderBook>>>>,
        degraded: Arc<AtomicBool>,
    ) -> Self {
        Self { books, degraded }
    }

    /// Returns the current top-of-book snapshot for `token`, or `None` if
    /// the token is not served by this stream.
    #[must_use]
    pub fn depth(&self, token: InstrumentToken) -> Option<LadderDepth> {
        let book = self.books.get(&token)?;
        let book = book.read().expect("poisoned book lock");
        Some(book.depth())
    }

    /// Returns whether the stream carries unrecovered sequence gaps.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Relaxed)
    }

    /// Returns the instrument tokens served by this stream.
    #[must_use]
    pub fn tokens(&self) -> Vec<InstrumentToken> {
        self.books.keys().copied().collect()
    }
}
