use std::collections::HashMap;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose;
use rand::Rng;

use crate::spotify_api::types::SpotifyTokenResponse;

const SPOTIFY_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
const SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// Scopes the monthly sync needs: read the library, list and modify playlists.
pub const SPOTIFY_SCOPES: &str =
    "user-library-read playlist-modify-private playlist-modify-public playlist-read-private";

/// Generate a random state parameter for CSRF protection
pub fn generate_state() -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::rng();
    (0..16)
        .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
        .collect()
}

/// Authorization URL the user opens in a browser to grant access.
pub fn build_authorize_url(client_id: &str, redirect_uri: &str, state: &str) -> String {
    format!(
        "{}?client_id={}&response_type=code&redirect_uri={}&state={}&scope={}",
        SPOTIFY_AUTH_URL,
        urlencoding::encode(client_id),
        urlencoding::encode(redirect_uri),
        urlencoding::encode(state),
        urlencoding::encode(SPOTIFY_SCOPES)
    )
}

fn basic_auth(client_id: &str, client_secret: &str) -> String {
    format!(
        "Basic {}",
        general_purpose::STANDARD.encode(format!("{client_id}:{client_secret}"))
    )
}

#[derive(Debug, thiserror::Error)]
pub enum TokenRequestError {
    #[error("Token request rejected: {reason}")]
    Rejected { reason: String },
    #[error("Failed to send http request: {0}")]
    FailedToSendRequest(reqwest::Error),
    #[error("Failed to parse response: {0}")]
    FailedToParseResponse(reqwest::Error),
}

/// Exchange an authorization code for access and refresh tokens.
/// https://developer.spotify.com/documentation/web-api/tutorials/code-flow
pub async fn exchange_code_for_token(
    client_id: &str,
    client_secret: &str,
    code: &str,
    redirect_uri: &str,
) -> Result<SpotifyTokenResponse, TokenRequestError> {
    let mut params = HashMap::new();
    params.insert("grant_type", "authorization_code");
    params.insert("code", code);
    params.insert("redirect_uri", redirect_uri);

    request_token(client_id, client_secret, &params).await
}

/// Trade a refresh token for a fresh access token.
pub async fn refresh_access_token(
    client_id: &str,
    client_secret: &str,
    refresh_token: &str,
) -> Result<SpotifyTokenResponse, TokenRequestError> {
    let mut params = HashMap::new();
    params.insert("grant_type", "refresh_token");
    params.insert("refresh_token", refresh_token);

    request_token(client_id, client_secret, &params).await
}

async fn request_token(
    client_id: &str,
    client_secret: &str,
    params: &HashMap<&str, &str>,
) -> Result<SpotifyTokenResponse, TokenRequestError> {
    let client = reqwest::Client::new();

    let response = client
        .post(SPOTIFY_TOKEN_URL)
        // Serializes to x-www-form-urlencoded and sets the header, as the
        // token endpoint requires.
        .form(params)
        .header("Authorization", basic_auth(client_id, client_secret))
        .timeout(Duration::from_secs(10))
        .send()
        .await
        .map_err(TokenRequestError::FailedToSendRequest)?;

    if !response.status().is_success() {
        return Err(TokenRequestError::Rejected {
            reason: response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error text".to_string()),
        });
    }

    response
        .json()
        .await
        .map_err(TokenRequestError::FailedToParseResponse)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_state() {
        let state = generate_state();
        assert_eq!(state.len(), 16);
        assert!(state.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_build_authorize_url() {
        let url = build_authorize_url("client123", "http://localhost:8888/callback", "st4te");
        assert!(url.starts_with(SPOTIFY_AUTH_URL));
        assert!(url.contains("client123"));
        assert!(url.contains("state=st4te"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("user-library-read"));
    }

    #[test]
    fn test_basic_auth_header() {
        assert_eq!(basic_auth("id", "secret"), "Basic aWQ6c2VjcmV0");
    }
}
