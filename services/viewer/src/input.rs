//! The input surface: date validation, address geocoding, panel toggling.

use std::sync::Arc;

use tracing::info;

use century_common::{Coordinate, HourStamp};
use playback::{InfoFetcher, InfoPanel, OverlayFetcher, PlaybackController, RenderSurface};

use crate::geocode::Geocode;

/// Message shown when the entered date does not match the hour pattern.
pub const DATE_FORMAT_HINT: &str = "Try a date formatted like '1978-10-01 10'";

/// Which of the two panels is visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    Map,
    Info,
}

impl DisplayMode {
    pub fn toggled(self) -> Self {
        match self {
            DisplayMode::Map => DisplayMode::Info,
            DisplayMode::Info => DisplayMode::Map,
        }
    }

    /// Name of the visible panel.
    pub fn visible_panel(self) -> &'static str {
        match self {
            DisplayMode::Map => "map",
            DisplayMode::Info => "info",
        }
    }

    /// Toggle-button label: names the panel a press would reveal.
    pub fn toggle_label(self) -> &'static str {
        match self {
            DisplayMode::Map => "Show info",
            DisplayMode::Info => "Show map",
        }
    }
}

/// Collects user input and drives the playback controller, the geocoder and
/// the info panel.
pub struct InputSurface<F, I, G, S> {
    controller: Arc<PlaybackController<F, S>>,
    info_panel: Arc<InfoPanel<I, S>>,
    geocoder: Arc<G>,
    surface: Arc<S>,
    coordinate: Option<Coordinate>,
    current_date: Option<HourStamp>,
    mode: DisplayMode,
}

impl<F, I, G, S> InputSurface<F, I, G, S>
where
    F: OverlayFetcher,
    I: InfoFetcher,
    G: Geocode,
    S: RenderSurface,
{
    pub fn new(
        controller: Arc<PlaybackController<F, S>>,
        info_panel: Arc<InfoPanel<I, S>>,
        geocoder: Arc<G>,
        surface: Arc<S>,
    ) -> Self {
        Self {
            controller,
            info_panel,
            geocoder,
            surface,
            coordinate: None,
            current_date: None,
            mode: DisplayMode::Map,
        }
    }

    /// Validate an entered date and start playback from it.
    ///
    /// A malformed date is rejected with the documented hint and starts no
    /// chain.
    pub fn submit_date(&mut self, raw: &str) -> bool {
        match raw.trim().parse::<HourStamp>() {
            Ok(stamp) => {
                self.current_date = Some(stamp);
                self.controller.start(stamp);
                true
            }
            Err(_) => {
                self.surface.alert(DATE_FORMAT_HINT);
                false
            }
        }
    }

    /// Invalidate the running playback chain.
    pub fn stop_playback(&self) {
        self.controller.stop();
    }

    /// Geocode a free-text address; on success record the coordinate,
    /// re-center the view, render a placemark and fire an info lookup for
    /// the current date.
    pub async fn submit_address(&mut self, address: &str) {
        match self.geocoder.geocode(address).await {
            Ok(coord) => {
                info!(lat = coord.lat, lng = coord.lng, "address resolved");
                self.coordinate = Some(coord);
                self.surface.look_at(coord);
                self.surface.place_marker(coord);

                if let Some(date) = self.current_date {
                    let panel = Arc::clone(&self.info_panel);
                    tokio::spawn(async move { panel.lookup(coord, date).await });
                }
            }
            Err(err) => self.surface.alert(&format!("Geocode failed: {}", err)),
        }
    }

    /// Flip the visible panel; returns the new mode.
    pub fn toggle_mode(&mut self) -> DisplayMode {
        self.mode = self.mode.toggled();
        self.mode
    }

    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    pub fn coordinate(&self) -> Option<Coordinate> {
        self.coordinate
    }

    pub fn current_date(&self) -> Option<HourStamp> {
        self.current_date
    }

    pub fn generation(&self) -> u64 {
        self.controller.generation()
    }
}
