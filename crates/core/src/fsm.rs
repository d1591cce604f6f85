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

//! Defines a generic finite-state machine (FSM).
//!
//! The FSM operates with a state-transition table of tuples and enums,
//! ensuring components only move through transitions declared valid while
//! holding a deterministic state value.

use std::{collections::HashMap, fmt::Debug, hash::Hash};

/// Error representing an invalid trigger for the current state.
#[derive(Debug, thiserror::Error)]
#[error("Invalid state transition: {state} on {trigger}")]
pub struct InvalidStateTrigger {
    /// The current state at the time of the trigger.
    pub state: String,
    /// The rejected trigger.
    pub trigger: String,
}

/// Provides a generic finite state machine.
///
/// States and triggers are caller-defined `Copy` enums; the transition table
/// maps `(state, trigger)` pairs to resulting states. Undeclared transitions
/// are rejected with [`InvalidStateTrigger`] rather than silently ignored.
#[derive(Debug, Clone)]
pub struct FiniteStateMachine<S, T>
where
    S: Copy + Eq + Hash + Debug,
    T: Copy + Eq + Hash + Debug,
{
    state: S,
    transition_table: HashMap<(S, T), S>,
}

impl<S, T> FiniteStateMachine<S, T>
where
    S: Copy + Eq + Hash + Debug,
    T: Copy + Eq + Hash + Debug,
{
    /// Creates a new [`FiniteStateMachine`] instance.
    ///
    /// # Panics
    ///
    /// Panics if `transition_table` is empty.
    #[must_use]
    pub fn new(initial_state: S, transition_table: HashMap<(S, T), S>) -> Self {
        assert!(
            !transition_table.is_empty(),
            "transition_table cannot be empty"
        );

        Self {
            state: initial_state,
            transition_table,
        }
    }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> S {
        self.state
    }

    /// Fires `trigger`, transitioning to the declared resulting state.
    ///
    /// # Errors
    ///
    /// Returns an error if no transition is declared for the current state
    /// and `trigger`; the state is left unchanged.
    pub fn trigger(&mut self, trigger: T) -> Result<S, InvalidStateTrigger> {
        match self.transition_table.get(&(self.state, trigger)) {
            Some(next) => {
                self.state = *next;
                Ok(self.state)
            }
            None => Err(InvalidStateTrigger {
                state: format!("{:?}", self.state),
                trigger: format!("{trigger:?}"),
            }),
        }
    }
}
