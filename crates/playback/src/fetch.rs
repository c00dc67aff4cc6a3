//! Fetcher seams between the playback logic and the data service.

use async_trait::async_trait;
use thiserror::Error;

use century_common::{Coordinate, HourStamp};

use crate::overlay::Overlay;

/// Failure of an overlay or info request.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("empty payload for {0}")]
    Empty(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("unexpected status {0}")]
    Status(u16),
}

/// Fetches the weather-marker overlay for one hour.
///
/// Implementations perform the network call and nothing else; attaching the
/// result to the surface is the controller's job.
#[async_trait]
pub trait OverlayFetcher: Send + Sync + 'static {
    async fn fetch(&self, stamp: &HourStamp) -> Result<Overlay, FetchError>;
}

/// Fetches point-lookup data for the info panel.
#[async_trait]
pub trait InfoFetcher: Send + Sync + 'static {
    /// Textual observation summary for the station nearest a coordinate.
    async fn observation_summary(
        &self,
        coord: Coordinate,
        stamp: &HourStamp,
    ) -> Result<String, FetchError>;

    /// Outline overlay for the region containing a coordinate.
    async fn region_outline(&self, coord: Coordinate) -> Result<Overlay, FetchError>;
}
