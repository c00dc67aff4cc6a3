//! The point info panel.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::warn;

use century_common::{Coordinate, HourStamp};

use crate::fetch::InfoFetcher;
use crate::overlay::OverlayId;
use crate::surface::RenderSurface;

/// Looks up a textual observation summary and a region outline for a
/// coordinate, independently of any running playback chain.
pub struct InfoPanel<I, S> {
    fetcher: Arc<I>,
    surface: Arc<S>,
    /// Handle of the region overlay currently attached, if any.
    region: Mutex<Option<OverlayId>>,
}

impl<I: InfoFetcher, S: RenderSurface> InfoPanel<I, S> {
    pub fn new(fetcher: Arc<I>, surface: Arc<S>) -> Self {
        Self {
            fetcher,
            surface,
            region: Mutex::new(None),
        }
    }

    /// Fire both lookups together.
    ///
    /// The two requests are independent: each response is applied the
    /// moment it arrives, in whichever order that happens. The text panel
    /// is replaced wholesale; the region overlay replaces any previously
    /// attached one. A failure on either side leaves that side's prior
    /// state untouched.
    pub async fn lookup(&self, coord: Coordinate, stamp: HourStamp) {
        let summary = async {
            match self.fetcher.observation_summary(coord, &stamp).await {
                Ok(text) => self.surface.set_info_text(&text),
                Err(err) => {
                    warn!(lat = coord.lat, lng = coord.lng, error = %err, "summary lookup failed");
                    self.surface.alert(&format!("Observation lookup failed: {}", err));
                }
            }
        };

        let region = async {
            match self.fetcher.region_outline(coord).await {
                Ok(overlay) => {
                    let mut slot = self.region.lock().await;
                    if let Some(prev) = slot.take() {
                        self.surface.detach(prev);
                    }
                    *slot = Some(self.surface.attach(overlay));
                }
                Err(err) => {
                    warn!(lat = coord.lat, lng = coord.lng, error = %err, "region lookup failed");
                    self.surface.alert(&format!("Region lookup failed: {}", err));
                }
            }
        };

        tokio::join!(summary, region);
    }

    /// Handle of the currently attached region overlay, if any.
    pub async fn region_overlay(&self) -> Option<OverlayId> {
        *self.region.lock().await
    }
}
