use chrono::{DateTime, Utc};

use crate::config::SyncOptions;
use crate::error::SyncError;
use crate::ports::spotify::SpotifyClient;
use crate::services::bucket::{EnsureOutcome, PlaylistBucket};
use crate::services::track::SavedTrack;

/// Page size for saved-track fetches, the service maximum.
const SAVED_TRACKS_PAGE_SIZE: u32 = 50;

/// What one reconciliation pass did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// No tracks saved since the watermark.
    NothingToDo,
    /// New tracks were routed to a month playlist.
    Routed {
        playlist: String,
        added: usize,
        already_present: usize,
        failed: usize,
    },
}

/// Reconciles recently-saved tracks against month-named playlists.
///
/// Holds the watermark for the process lifetime; each `synchronize` call is a
/// full pass and only tracks saved after the watermark are routed.
pub struct MonthlySyncService<C: SpotifyClient> {
    client: C,
    user_id: String,
    watermark: DateTime<Utc>,
    name_format: String,
    buckets: Vec<PlaylistBucket>,
}

impl<C: SpotifyClient> MonthlySyncService<C> {
    /// Resolve the account that owns the playlists and set the initial
    /// watermark.
    pub async fn connect(client: C, options: SyncOptions) -> Result<Self, SyncError> {
        let user_id = client
            .current_user_id()
            .await
            .map_err(|err| SyncError::Fetch {
                stage: "current user profile",
                reason: format!("{err:#}"),
            })?;

        Ok(Self {
            client,
            user_id,
            watermark: options.watermark,
            name_format: options.name_format,
            buckets: Vec::new(),
        })
    }

    pub fn watermark(&self) -> DateTime<Utc> {
        self.watermark
    }

    /// One full reconciliation pass.
    ///
    /// Any fetch or creation failure aborts the pass with the watermark
    /// untouched. Once new tracks are routed to a bucket the pass is
    /// best-effort: individual insert failures are logged and the watermark
    /// still advances to the newest track's save instant.
    pub async fn synchronize(&mut self) -> Result<SyncOutcome, SyncError> {
        let saved = self.fetch_saved_tracks().await?;

        let new_tracks: Vec<SavedTrack> = saved
            .into_iter()
            .filter(|track| track.added_at > self.watermark)
            .collect();
        let Some(newest) = new_tracks.first().cloned() else {
            tracing::info!("no new saved tracks since {}", self.watermark);
            return Ok(SyncOutcome::NothingToDo);
        };

        self.load_buckets().await?;

        let name = newest.added_at.format(&self.name_format).to_string();
        let bucket_index = self.find_or_create_bucket(&name).await?;

        let mut added = 0;
        let mut already_present = 0;
        let mut failed = 0;
        for track in &new_tracks {
            let bucket = &mut self.buckets[bucket_index];
            match bucket.ensure_track_present(&self.client, track).await {
                Ok(EnsureOutcome::Added) => added += 1,
                Ok(EnsureOutcome::AlreadyPresent) => already_present += 1,
                Err(err @ SyncError::Load { .. }) => {
                    tracing::error!("{err}; skipping the remaining inserts this pass");
                    failed = new_tracks.len() - added - already_present;
                    break;
                }
                Err(err) => {
                    tracing::warn!("{err}");
                    failed += 1;
                }
            }
        }

        // Best-effort from here: the batch was routed, so the watermark
        // advances even when individual inserts failed above.
        self.watermark = newest.added_at;

        tracing::info!(
            "routed {} new track(s) to '{}' ({} added, {} already present, {} failed)",
            new_tracks.len(),
            name,
            added,
            already_present,
            failed
        );

        Ok(SyncOutcome::Routed {
            playlist: name,
            added,
            already_present,
            failed,
        })
    }

    /// Accumulate saved-track pages, newest first, until the listing is
    /// exhausted or a page ends at or before the watermark.
    async fn fetch_saved_tracks(&self) -> Result<Vec<SavedTrack>, SyncError> {
        let mut tracks: Vec<SavedTrack> = Vec::new();
        let mut offset = 0;

        loop {
            let page = self
                .client
                .saved_tracks_page(SAVED_TRACKS_PAGE_SIZE, offset)
                .await
                .map_err(|err| SyncError::Fetch {
                    stage: "saved tracks",
                    reason: format!("{err:#}"),
                })?;
            let exhausted = (page.len() as u32) < SAVED_TRACKS_PAGE_SIZE;

            for record in &page {
                tracks.push(SavedTrack::parse(record)?);
            }

            if exhausted {
                break;
            }
            match tracks.last() {
                Some(oldest) if oldest.added_at > self.watermark => {
                    offset += SAVED_TRACKS_PAGE_SIZE;
                }
                _ => break,
            }
        }

        Ok(tracks)
    }

    /// Reload the playlist listing. An empty listing is treated as a broken
    /// response, not as "zero playlists exist".
    async fn load_buckets(&mut self) -> Result<(), SyncError> {
        let records = self
            .client
            .current_user_playlists()
            .await
            .map_err(|err| SyncError::Fetch {
                stage: "playlists",
                reason: format!("{err:#}"),
            })?;

        if records.is_empty() {
            return Err(SyncError::Fetch {
                stage: "playlists",
                reason: "listing came back empty".to_string(),
            });
        }

        self.buckets = records.into_iter().map(PlaylistBucket::new).collect();
        Ok(())
    }

    /// Linear search by exact name; on miss, create the playlist remotely and
    /// mirror it locally.
    async fn find_or_create_bucket(&mut self, name: &str) -> Result<usize, SyncError> {
        if let Some(index) = self.buckets.iter().position(|b| b.name() == name) {
            return Ok(index);
        }

        tracing::info!("creating playlist '{name}'");
        let record = self
            .client
            .create_playlist(&self.user_id, name)
            .await
            .map_err(|err| SyncError::Creation {
                name: name.to_string(),
                reason: format!("{err:#}"),
            })?;

        self.buckets.push(PlaylistBucket::new(record));
        Ok(self.buckets.len() - 1)
    }
}
