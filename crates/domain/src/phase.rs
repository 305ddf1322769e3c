//! Causality phases for the event bus.
//!
//! A phase is an ordered stage of a sweep: commands applied in phase N
//! produce events that become visible in phase N+1, never earlier. The set
//! is closed and consecutively ranked, so "next phase" is total except at
//! the terminal phase.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One stage of a sweep, in causal order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Initiating events mapped from inbound requests land here.
    Input,
    /// First wave of consequences (movement, settlements).
    Resolution,
    /// Follow-on facts (balance changes, announcements).
    Effects,
    /// Terminal phase: commands still apply, derived events are discarded.
    Cleanup,
}

impl Phase {
    /// All phases in ascending rank order. A sweep visits each exactly once.
    pub const ALL: [Phase; 4] = [
        Phase::Input,
        Phase::Resolution,
        Phase::Effects,
        Phase::Cleanup,
    ];

    /// Position of this phase in the sweep.
    pub fn rank(self) -> usize {
        match self {
            Phase::Input => 0,
            Phase::Resolution => 1,
            Phase::Effects => 2,
            Phase::Cleanup => 3,
        }
    }

    /// The phase events derived from this phase's commands land in, or
    /// `None` when this phase is terminal.
    pub fn next(self) -> Option<Phase> {
        match self {
            Phase::Input => Some(Phase::Resolution),
            Phase::Resolution => Some(Phase::Effects),
            Phase::Effects => Some(Phase::Cleanup),
            Phase::Cleanup => None,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Input => "input",
            Phase::Resolution => "resolution",
            Phase::Effects => "effects",
            Phase::Cleanup => "cleanup",
        };
        write!(f, "{}", name)
    }
}
