use color_eyre::eyre::Result;

/// Decoupled representation of a saved-track entry from the Spotify API.
///
/// Track id and name stay optional here: the API returns null track data for
/// local files and tracks that became unavailable. `SavedTrack::parse` decides
/// what is usable.
#[derive(Debug, Clone)]
pub struct SavedTrackRecord {
    /// When the user saved the track, in `YYYY-MM-DDTHH:MM:SSZ` wire format.
    pub added_at: String,
    pub track_id: Option<String>,
    pub track_name: Option<String>,
}

/// Decoupled representation of a playlist from the Spotify API.
#[derive(Debug, Clone)]
pub struct PlaylistRecord {
    pub id: String,
    pub name: String,
}

/// Port trait wrapping the Spotify API capabilities used by business logic.
///
/// Implementations live in `spotify_api::client` (production) or test mocks.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SpotifyClient: Send + Sync {
    async fn current_user_id(&self) -> Result<String>;

    /// One page of the user's saved tracks.
    ///
    /// Precondition: the service returns saved tracks newest-first. The sync
    /// loop's early stop relies on this ordering; an out-of-order page makes
    /// the loop under-fetch.
    async fn saved_tracks_page(&self, limit: u32, offset: u32) -> Result<Vec<SavedTrackRecord>>;

    /// The user's playlists. Single page request.
    async fn current_user_playlists(&self) -> Result<Vec<PlaylistRecord>>;

    /// The tracks of one playlist. Single page request.
    async fn playlist_tracks(&self, playlist_id: &str) -> Result<Vec<SavedTrackRecord>>;

    async fn create_playlist(&self, user_id: &str, name: &str) -> Result<PlaylistRecord>;

    async fn add_tracks_to_playlist(&self, playlist_id: &str, track_ids: &[String]) -> Result<()>;
}
