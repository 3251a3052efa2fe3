use thiserror::Error;

/// A raw catalog record that cannot be turned into a saved track.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed saved-track record: {reason}")]
pub struct MalformedRecord {
    pub reason: String,
}

/// Everything that can go wrong during one reconciliation pass.
///
/// Each variant maps to one abort (or log-and-continue) site in
/// `MonthlySyncService::synchronize`.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    MalformedRecord(#[from] MalformedRecord),

    /// A remote listing call failed or returned an unexpected shape.
    #[error("failed to fetch {stage}: {reason}")]
    Fetch { stage: &'static str, reason: String },

    /// Loading a playlist's member tracks failed.
    #[error("failed to load tracks of playlist '{playlist}': {reason}")]
    Load { playlist: String, reason: String },

    /// Creating the month playlist failed.
    #[error("failed to create playlist '{name}': {reason}")]
    Creation { name: String, reason: String },

    /// A single add-track call failed.
    #[error("failed to add '{track}' to playlist '{playlist}': {reason}")]
    Insertion {
        playlist: String,
        track: String,
        reason: String,
    },
}
