use serde::{Deserialize, Serialize};

use crate::ports::spotify::{PlaylistRecord, SavedTrackRecord};

/// Spotify OAuth token response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyTokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub refresh_token: Option<String>,
    pub scope: String,
}

/// Spotify user profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyUser {
    pub id: String,
    pub display_name: Option<String>,
}

/// Spotify playlist from API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyPlaylist {
    pub id: String,
    pub name: String,
}

/// One entry from `/me/tracks` or from a playlist's items.
///
/// `track` is null for entries Spotify can no longer resolve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifySavedTrack {
    pub added_at: String,
    pub track: Option<SpotifyTrack>,
}

/// Spotify track from API. `id` is null for local files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyTrack {
    pub id: Option<String>,
    pub name: Option<String>,
}

impl From<SpotifySavedTrack> for SavedTrackRecord {
    fn from(item: SpotifySavedTrack) -> Self {
        let (track_id, track_name) = match item.track {
            Some(track) => (track.id, track.name),
            None => (None, None),
        };
        Self {
            added_at: item.added_at,
            track_id,
            track_name,
        }
    }
}

impl From<SpotifyPlaylist> for PlaylistRecord {
    fn from(playlist: SpotifyPlaylist) -> Self {
        Self {
            id: playlist.id,
            name: playlist.name,
        }
    }
}
