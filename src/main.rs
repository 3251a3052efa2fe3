mod config;
mod error;
mod logging;
mod ports;
mod services;
mod spotify_api;

use std::io::Write;
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use clap::Parser;
use color_eyre::eyre::{OptionExt, Result, WrapErr, bail};
use url::Url;

use crate::config::{SyncOptions, start_of_current_month};
use crate::logging::init_tracing;
use crate::services::sync::MonthlySyncService;
use crate::services::track::ADDED_AT_FORMAT;
use crate::spotify_api::auth::{build_authorize_url, exchange_code_for_token, generate_state};
use crate::spotify_api::client::SpotifyHttpAdapter;
use crate::spotify_api::types::SpotifyTokenResponse;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Spotify application client id
    #[arg(long, env = "CLIENT_ID")]
    client_id: String,

    /// Spotify application client secret
    #[arg(long, env = "CLIENT_SECRET")]
    client_secret: String,

    /// Redirect URI registered with the Spotify application
    #[arg(long, env = "REDIRECT_URI")]
    redirect_uri: String,

    /// Only route tracks saved after this instant, e.g. 2024-01-01T00:00:00Z
    /// (default: start of the current month)
    #[arg(long, value_parser = parse_watermark)]
    since: Option<DateTime<Utc>>,

    /// strftime pattern used to name month playlists
    #[arg(long, default_value = "%b '%y")]
    name_format: String,

    /// Keep running, synchronizing once per interval (e.g. 30m, 2h)
    #[arg(long, value_parser = humantime::parse_duration)]
    interval: Option<Duration>,

    /// Console log level
    #[arg(long, default_value = "info", env = "LOG_LEVEL")]
    log_level: String,
}

fn parse_watermark(s: &str) -> Result<DateTime<Utc>, String> {
    NaiveDateTime::parse_from_str(s, ADDED_AT_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|err| format!("expected YYYY-MM-DDTHH:MM:SSZ: {err}"))
}

/// Run the authorization-code flow on a terminal: print the consent URL, let
/// the user paste the URL they were redirected to, exchange the code.
async fn authorize(args: &Args) -> Result<SpotifyTokenResponse> {
    let state = generate_state();
    let authorize_url = build_authorize_url(&args.client_id, &args.redirect_uri, &state);

    println!("Open this URL in a browser and authorize the application:\n\n{authorize_url}\n");
    print!("Paste the URL you were redirected to: ");
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .wrap_err("Failed to read redirect URL")?;
    let redirect = Url::parse(line.trim()).wrap_err("Pasted text is not a valid URL")?;

    let mut code = None;
    let mut returned_state = None;
    for (key, value) in redirect.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => returned_state = Some(value.into_owned()),
            _ => {}
        }
    }
    let code = code.ok_or_eyre("Redirect URL carries no authorization code")?;
    if returned_state.as_deref() != Some(state.as_str()) {
        bail!("State mismatch in redirect URL; aborting authorization");
    }

    exchange_code_for_token(&args.client_id, &args.client_secret, &code, &args.redirect_uri)
        .await
        .wrap_err("Failed to exchange authorization code for tokens")
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    init_tracing(&args.log_level)?;

    let tokens = authorize(&args).await?;
    let adapter = SpotifyHttpAdapter::new(
        args.client_id.clone(),
        args.client_secret.clone(),
        tokens,
    );

    let options = SyncOptions {
        watermark: args.since.unwrap_or_else(start_of_current_month),
        name_format: args.name_format.clone(),
    };
    let mut service = MonthlySyncService::connect(adapter, options).await?;
    tracing::debug!("starting with watermark {}", service.watermark());

    match args.interval {
        Some(every) => {
            tracing::info!("synchronizing every {}", humantime::format_duration(every));
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                if let Err(err) = service.synchronize().await {
                    tracing::error!("synchronization pass failed: {err}");
                }
            }
        }
        None => {
            service.synchronize().await?;
        }
    }

    Ok(())
}
