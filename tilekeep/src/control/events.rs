//! Session status, events and phases.

use std::fmt;

/// Counters of a save session at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveStatus {
    /// Stored tile count when the session started
    pub storage_size: u64,
    /// Tiles enumerated for the session
    pub length_to_be_saved: u64,
    /// Tiles downloaded so far
    pub length_loaded: u64,
    /// Tiles persisted so far
    pub length_saved: u64,
    /// Tiles that failed to download or persist
    pub length_failed: u64,
}

impl SaveStatus {
    /// Tiles that are either saved or failed.
    pub fn settled(&self) -> u64 {
        self.length_saved + self.length_failed
    }

    /// Whether every enumerated tile is settled.
    pub fn is_complete(&self) -> bool {
        self.settled() >= self.length_to_be_saved
    }
}

impl fmt::Display for SaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} saved, {} downloaded, {} failed",
            self.length_saved, self.length_to_be_saved, self.length_loaded, self.length_failed
        )
    }
}

/// Progress of one save session, delivered in order on the session channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveEvent {
    /// Workers are about to start
    Started(SaveStatus),
    /// One tile was downloaded
    TileDownloaded { key: String, status: SaveStatus },
    /// One tile failed to download or persist
    TileFailed {
        key: String,
        error: String,
        status: SaveStatus,
    },
    /// Every tile has been downloaded or has failed to download
    AllDownloaded(SaveStatus),
    /// One tile was persisted
    TileSaved { key: String, status: SaveStatus },
    /// Every tile is settled
    AllSaved(SaveStatus),
    /// Stored tile count after the session
    StorageSize(u64),
    /// The session was cancelled before every tile settled
    Cancelled(SaveStatus),
}

impl SaveEvent {
    /// Status snapshot carried by the event, if any.
    pub fn status(&self) -> Option<&SaveStatus> {
        match self {
            SaveEvent::Started(status)
            | SaveEvent::AllDownloaded(status)
            | SaveEvent::AllSaved(status)
            | SaveEvent::Cancelled(status) => Some(status),
            SaveEvent::TileDownloaded { status, .. }
            | SaveEvent::TileFailed { status, .. }
            | SaveEvent::TileSaved { status, .. } => Some(status),
            SaveEvent::StorageSize(_) => None,
        }
    }
}

/// Control-wide notifications, broadcast to every subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    /// Current stored tile count
    StorageSize(u64),
    /// The store was cleared
    TilesRemoved,
}

/// Lifecycle phase of the control.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionPhase {
    #[default]
    Idle,
    Enumerating,
    AwaitingConfirmation,
    Downloading,
    Saving,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionPhase::Idle => "idle",
            SessionPhase::Enumerating => "enumerating",
            SessionPhase::AwaitingConfirmation => "awaiting confirmation",
            SessionPhase::Downloading => "downloading",
            SessionPhase::Saving => "saving",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_completion() {
        let mut status = SaveStatus {
            length_to_be_saved: 3,
            ..Default::default()
        };
        assert!(!status.is_complete());

        status.length_saved = 2;
        status.length_failed = 1;
        assert_eq!(status.settled(), 3);
        assert!(status.is_complete());
        assert_eq!(status.to_string(), "2/3 saved, 0 downloaded, 1 failed");
    }

    #[test]
    fn test_event_status_accessor() {
        let status = SaveStatus::default();
        assert_eq!(SaveEvent::AllSaved(status).status(), Some(&status));
        assert_eq!(SaveEvent::StorageSize(4).status(), None);
    }
}
