/// Crawl status definitions for tracking target progress
use std::fmt;

/// Represents the current status of a target record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlStatus {
    /// Target has been submitted but never analyzed
    Queued,

    /// An analysis task has been dispatched for the target
    Running,

    /// Analysis completed and the result fields are populated
    Done,

    /// Analysis failed during fetch or parse
    Error,
}

impl CrawlStatus {
    /// Returns true if this is a terminal status (no task in flight)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }

    /// Returns true if a task is currently working on the target
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Checks whether a status change is allowed
    ///
    /// Terminal targets may be dispatched again, which moves them back
    /// to `running`. Only a running target can reach a terminal status.
    pub fn can_transition_to(&self, next: CrawlStatus) -> bool {
        match (self, next) {
            (Self::Queued, Self::Running) => true,
            (Self::Running, Self::Done | Self::Error) => true,
            (Self::Done | Self::Error, Self::Running) => true,
            _ => false,
        }
    }

    /// Converts the status to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Done => "done",
            Self::Error => "error",
        }
    }

    /// Parses a status from its database string representation
    ///
    /// Returns None if the string doesn't match any known status.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "queued" => Some(Self::Queued),
            "running" => Some(Self::Running),
            "done" => Some(Self::Done),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// Returns all possible statuses
    pub fn all_statuses() -> Vec<Self> {
        vec![Self::Queued, Self::Running, Self::Done, Self::Error]
    }
}

impl fmt::Display for CrawlStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}
