//! Scan phase state machine
//!
//! A scan moves through fixed phases per library folder. The tracker
//! validates transitions so a bug in the orchestrator cannot silently skip
//! a phase or complete a failed scan.

use crate::error::{Result, SyncError};
use std::fmt;
use std::str::FromStr;

/// Phase of a running scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    /// Created but not picked up by the worker yet
    Pending,
    Genres,
    Artists,
    Albums,
    Songs,
    Sweeping,
    Completed,
    Failed,
}

impl ScanPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanPhase::Pending => "pending",
            ScanPhase::Genres => "genres",
            ScanPhase::Artists => "artists",
            ScanPhase::Albums => "albums",
            ScanPhase::Songs => "songs",
            ScanPhase::Sweeping => "sweeping",
            ScanPhase::Completed => "completed",
            ScanPhase::Failed => "failed",
        }
    }

    /// Human-readable progress message persisted on the task row
    pub fn message(&self) -> &'static str {
        match self {
            ScanPhase::Pending => "Waiting to start",
            ScanPhase::Genres => "Scanning genres",
            ScanPhase::Artists => "Scanning album artists",
            ScanPhase::Albums => "Scanning albums",
            ScanPhase::Songs => "Scanning songs",
            ScanPhase::Sweeping => "Removing deleted media",
            ScanPhase::Completed => "Completed",
            ScanPhase::Failed => "Failed",
        }
    }

    /// Whether the scan can move from `self` to `next`.
    ///
    /// `Sweeping -> Genres` starts the next library folder. `Failed` is
    /// reachable from every unfinished phase.
    pub fn can_transition_to(&self, next: ScanPhase) -> bool {
        matches!(
            (self, next),
            (ScanPhase::Pending, ScanPhase::Genres)
                | (ScanPhase::Pending, ScanPhase::Completed)
                | (ScanPhase::Genres, ScanPhase::Artists)
                | (ScanPhase::Artists, ScanPhase::Albums)
                | (ScanPhase::Albums, ScanPhase::Songs)
                | (ScanPhase::Songs, ScanPhase::Sweeping)
                | (ScanPhase::Sweeping, ScanPhase::Genres)
                | (ScanPhase::Sweeping, ScanPhase::Completed)
        ) || (next == ScanPhase::Failed
            && !matches!(self, ScanPhase::Completed | ScanPhase::Failed))
    }

    /// Whether this phase ends the scan
    pub fn is_terminal(&self) -> bool {
        matches!(self, ScanPhase::Completed | ScanPhase::Failed)
    }
}

impl fmt::Display for ScanPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ScanPhase {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(ScanPhase::Pending),
            "genres" => Ok(ScanPhase::Genres),
            "artists" => Ok(ScanPhase::Artists),
            "albums" => Ok(ScanPhase::Albums),
            "songs" => Ok(ScanPhase::Songs),
            "sweeping" => Ok(ScanPhase::Sweeping),
            "completed" => Ok(ScanPhase::Completed),
            "failed" => Ok(ScanPhase::Failed),
            other => Err(SyncError::InvalidPhaseTransition {
                from: "unknown".to_string(),
                to: other.to_string(),
            }),
        }
    }
}

/// Tracks the current phase and enforces valid transitions
#[derive(Debug)]
pub struct PhaseTracker {
    phase: ScanPhase,
}

impl PhaseTracker {
    pub fn new() -> Self {
        Self {
            phase: ScanPhase::Pending,
        }
    }

    pub fn phase(&self) -> ScanPhase {
        self.phase
    }

    /// Move to the next phase
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidPhaseTransition`] when the transition is
    /// not allowed by the machine.
    pub fn advance(&mut self, next: ScanPhase) -> Result<ScanPhase> {
        if !self.phase.can_transition_to(next) {
            return Err(SyncError::InvalidPhaseTransition {
                from: self.phase.to_string(),
                to: next.to_string(),
            });
        }
        self.phase = next;
        Ok(next)
    }
}

impl Default for PhaseTracker {
    fn default() -> Self {
        Self::new()
    }
}
