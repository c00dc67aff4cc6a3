//! Terminal viewer for the observation playback.
//!
//! Wires the input surface to the playback controller, the info panel, the
//! geocoder and the observation API, and reads commands from stdin:
//!
//! ```text
//! date 1978-10-01 10      start hourly playback at that hour
//! address Reno, NV        geocode, re-center, look up observations
//! stop                    halt playback
//! toggle                  switch between the map and info panels
//! status                  show the current date, coordinate and panel
//! quit
//! ```

mod fetch;
mod geocode;
mod input;
mod surface;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use playback::{InfoPanel, PlaybackController};

use fetch::{HttpInfoFetcher, HttpOverlayFetcher};
use geocode::HttpGeocoder;
use input::InputSurface;
use surface::TerminalSurface;

#[derive(Parser, Debug)]
#[command(name = "viewer")]
#[command(about = "Terminal playback viewer for the observation archive")]
struct Args {
    /// Observation API base URL
    #[arg(long, default_value = "http://localhost:8080", env = "CENTURY_API_URL")]
    api_url: String,

    /// Geocoder base URL (Nominatim-style search endpoint)
    #[arg(
        long,
        default_value = "https://nominatim.openstreetmap.org",
        env = "GEOCODER_URL"
    )]
    geocoder_url: String,

    /// Milliseconds between playback steps
    #[arg(long, default_value_t = 1000)]
    step_delay_ms: u64,

    /// Log level
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    // Logs share the terminal with the surface output, so keep them terse.
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .user_agent("century-viewer/0.1")
        .build()?;

    let surface = Arc::new(TerminalSurface::default());
    let controller = Arc::new(PlaybackController::with_step_delay(
        Arc::new(HttpOverlayFetcher::new(client.clone(), args.api_url.clone())),
        Arc::clone(&surface),
        Duration::from_millis(args.step_delay_ms),
    ));
    let panel = Arc::new(InfoPanel::new(
        Arc::new(HttpInfoFetcher::new(client.clone(), args.api_url.clone())),
        Arc::clone(&surface),
    ));
    let geocoder = Arc::new(HttpGeocoder::new(client, args.geocoder_url.clone()));

    let mut input = InputSurface::new(controller, panel, geocoder, surface);

    println!(
        "century viewer - commands: date <YYYY-MM-DD HH> | address <text> | stop | toggle | status | quit"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();

        if let Some(raw) = line.strip_prefix("date ") {
            input.submit_date(raw);
        } else if let Some(address) = line.strip_prefix("address ") {
            input.submit_address(address).await;
        } else {
            match line {
                "stop" => input.stop_playback(),
                "toggle" => {
                    let mode = input.toggle_mode();
                    println!(
                        "[panel] showing {} (button: {})",
                        mode.visible_panel(),
                        mode.toggle_label()
                    );
                }
                "status" => {
                    let date = input
                        .current_date()
                        .map(|d| d.to_string())
                        .unwrap_or_else(|| "unset".to_string());
                    let coord = input
                        .coordinate()
                        .map(|c| format!("({:.4}, {:.4})", c.lat, c.lng))
                        .unwrap_or_else(|| "unset".to_string());
                    println!(
                        "[status] panel: {}, date: {}, coordinate: {}, generation: {}",
                        input.mode().visible_panel(),
                        date,
                        coord,
                        input.generation()
                    );
                }
                "quit" | "exit" => break,
                "" => {}
                other => println!("unknown command: {}", other),
            }
        }
    }

    input.stop_playback();
    Ok(())
}
