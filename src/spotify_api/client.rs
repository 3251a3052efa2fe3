use std::time::Duration;

use chrono::{DateTime, Utc};
use color_eyre::eyre::{OptionExt, Result, WrapErr};
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::ports::spotify::{PlaylistRecord, SavedTrackRecord, SpotifyClient};
use crate::spotify_api::auth::refresh_access_token;
use crate::spotify_api::types::{
    SpotifyPlaylist, SpotifySavedTrack, SpotifyTokenResponse, SpotifyUser,
};

const API_BASE: &str = "https://api.spotify.com/v1";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Refresh this long before the advertised expiry, so a token never lapses
/// mid-request.
const EXPIRY_MARGIN_SECS: i64 = 60;

struct TokenState {
    access_token: String,
    refresh_token: Option<String>,
    expires_at: DateTime<Utc>,
}

impl TokenState {
    fn from_response(response: SpotifyTokenResponse) -> Self {
        let lifetime = chrono::Duration::seconds(response.expires_in as i64 - EXPIRY_MARGIN_SECS);
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            expires_at: Utc::now() + lifetime,
        }
    }
}

/// Spotify Web API adapter backed by reqwest.
///
/// Holds the OAuth tokens and refreshes the access token through the
/// refresh-token grant when it is about to expire.
pub struct SpotifyHttpAdapter {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    tokens: Mutex<TokenState>,
}

impl SpotifyHttpAdapter {
    pub fn new(client_id: String, client_secret: String, tokens: SpotifyTokenResponse) -> Self {
        Self {
            client: reqwest::Client::new(),
            client_id,
            client_secret,
            tokens: Mutex::new(TokenState::from_response(tokens)),
        }
    }

    /// Current access token, refreshed first when expired.
    async fn bearer(&self) -> Result<String> {
        let mut tokens = self.tokens.lock().await;
        if Utc::now() < tokens.expires_at {
            return Ok(tokens.access_token.clone());
        }

        let refresh_token = tokens
            .refresh_token
            .clone()
            .ok_or_eyre("Access token expired and no refresh token was granted")?;
        let response = refresh_access_token(&self.client_id, &self.client_secret, &refresh_token)
            .await
            .wrap_err("Failed to refresh access token")?;

        // Spotify may rotate the refresh token; keep the old one when it doesn't.
        let next_refresh_token = response.refresh_token.clone().or(Some(refresh_token));
        *tokens = TokenState::from_response(response);
        tokens.refresh_token = next_refresh_token;

        Ok(tokens.access_token.clone())
    }
}

#[async_trait::async_trait]
impl SpotifyClient for SpotifyHttpAdapter {
    async fn current_user_id(&self) -> Result<String> {
        let token = self.bearer().await?;

        let user = self
            .client
            .get(format!("{API_BASE}/me"))
            .bearer_auth(&token)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?
            .error_for_status()?
            .json::<SpotifyUser>()
            .await
            .wrap_err("Failed to deserialize user profile")?;

        Ok(user.id)
    }

    async fn saved_tracks_page(&self, limit: u32, offset: u32) -> Result<Vec<SavedTrackRecord>> {
        #[derive(Deserialize)]
        struct SavedTracksResponse {
            items: Vec<SpotifySavedTrack>,
        }

        let token = self.bearer().await?;

        let page = self
            .client
            .get(format!(
                "{API_BASE}/me/tracks?limit={limit}&offset={offset}"
            ))
            .bearer_auth(&token)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?
            .error_for_status()?
            .json::<SavedTracksResponse>()
            .await
            .wrap_err("Failed to deserialize saved tracks page")?;

        Ok(page.items.into_iter().map(Into::into).collect())
    }

    async fn current_user_playlists(&self) -> Result<Vec<PlaylistRecord>> {
        #[derive(Deserialize)]
        struct PlaylistsResponse {
            items: Vec<SpotifyPlaylist>,
        }

        let token = self.bearer().await?;

        let page = self
            .client
            .get(format!("{API_BASE}/me/playlists?limit=50"))
            .bearer_auth(&token)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?
            .error_for_status()?
            .json::<PlaylistsResponse>()
            .await
            .wrap_err("Failed to deserialize playlists listing")?;

        Ok(page.items.into_iter().map(Into::into).collect())
    }

    async fn playlist_tracks(&self, playlist_id: &str) -> Result<Vec<SavedTrackRecord>> {
        #[derive(Deserialize)]
        struct PlaylistTracksResponse {
            items: Vec<SpotifySavedTrack>,
        }

        let token = self.bearer().await?;

        let page = self
            .client
            .get(format!("{API_BASE}/playlists/{playlist_id}/tracks"))
            .bearer_auth(&token)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?
            .error_for_status()?
            .json::<PlaylistTracksResponse>()
            .await
            .wrap_err("Failed to deserialize playlist tracks")?;

        Ok(page.items.into_iter().map(Into::into).collect())
    }

    async fn create_playlist(&self, user_id: &str, name: &str) -> Result<PlaylistRecord> {
        let token = self.bearer().await?;

        let playlist = self
            .client
            .post(format!("{API_BASE}/users/{user_id}/playlists"))
            .bearer_auth(&token)
            .timeout(REQUEST_TIMEOUT)
            .json(&serde_json::json!({ "name": name }))
            .send()
            .await?
            .error_for_status()?
            .json::<SpotifyPlaylist>()
            .await
            .wrap_err("Failed to deserialize created playlist")?;

        Ok(playlist.into())
    }

    async fn add_tracks_to_playlist(&self, playlist_id: &str, track_ids: &[String]) -> Result<()> {
        let token = self.bearer().await?;

        let uris: Vec<String> = track_ids
            .iter()
            .map(|id| format!("spotify:track:{id}"))
            .collect();

        self.client
            .post(format!("{API_BASE}/playlists/{playlist_id}/tracks"))
            .bearer_auth(&token)
            .timeout(REQUEST_TIMEOUT)
            .json(&serde_json::json!({ "uris": uris }))
            .send()
            .await?
            .error_for_status()
            .wrap_err("Failed to add tracks to playlist")?;

        Ok(())
    }
}
