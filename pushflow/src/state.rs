// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! Execution and media states.
//!
//! ```text
//!  -->WaitingForExecute
//!  |        |
//!  |        V
//!  |   Initializing
//!  |        |
//!  |        |<------------------------------------------
//!  |        V                                          |
//!  |      Idle  --> [Play] -->  Executing --> [Pause] ---
//!  |        |                       |
//!  |        V                       |
//!  ---  Terminating <----------------
//! ```
//!
//! The return edge from `Terminating` (and from a failed `Initializing`) to
//! `WaitingForExecute` is the worker's own teardown and is not a requestable
//! transition.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Internal lifecycle phase of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExecutionState {
    /// Constructed (or torn down) and waiting for `execute`.
    WaitingForExecute,
    /// The worker is running the `initialize` hook.
    Initializing,
    /// The worker is calling `do_work`.
    Executing,
    /// The worker is parked until the state changes.
    Idle,
    /// The worker has been asked to exit.
    Terminating,
}

impl ExecutionState {
    /// Returns `true` if `next` may be requested while in `self`.
    pub fn can_transition_to(self, next: ExecutionState) -> bool {
        use ExecutionState::*;
        matches!(
            (self, next),
            (WaitingForExecute, Initializing)
                | (Initializing, Idle)
                | (Executing, Idle)
                | (Executing, Terminating)
                | (Idle, Executing)
                | (Idle, Terminating)
        )
    }

    /// `Executing` or `Idle`: the states in which play/pause and terminate apply.
    pub fn is_running(self) -> bool {
        matches!(self, ExecutionState::Executing | ExecutionState::Idle)
    }
}

impl fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExecutionState::WaitingForExecute => "WaitingForExecute",
            ExecutionState::Initializing => "Initializing",
            ExecutionState::Executing => "Executing",
            ExecutionState::Idle => "Idle",
            ExecutionState::Terminating => "Terminating",
        };
        f.write_str(name)
    }
}

/// Caller intent, distinct from [`ExecutionState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MediaState {
    /// Run the work loop.
    Play,
    /// Park the work loop in `Idle`.
    #[default]
    Pause,
}

impl MediaState {
    /// Execution state requested when this media state is applied.
    pub fn execution_target(self) -> ExecutionState {
        match self {
            MediaState::Play => ExecutionState::Executing,
            MediaState::Pause => ExecutionState::Idle,
        }
    }
}
