//! HTTP implementations of the overlay and info fetchers.

use async_trait::async_trait;

use century_common::{Coordinate, HourStamp};
use playback::{FetchError, InfoFetcher, Overlay, OverlayFetcher};

fn request_err(e: reqwest::Error) -> FetchError {
    FetchError::Request(e.to_string())
}

/// Fetches one hour of station markers from the observation API.
pub struct HttpOverlayFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl HttpOverlayFetcher {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl OverlayFetcher for HttpOverlayFetcher {
    async fn fetch(&self, stamp: &HourStamp) -> Result<Overlay, FetchError> {
        let response = self
            .client
            .get(format!("{}/samples.kml", self.base_url))
            .query(&[("date", stamp.to_string())])
            .send()
            .await
            .map_err(request_err)?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        let body = response.bytes().await.map_err(request_err)?;
        if body.is_empty() {
            return Err(FetchError::Empty(stamp.to_string()));
        }

        Ok(Overlay::markers(stamp.to_string(), body))
    }
}

/// Fetches point-lookup data from the observation API.
pub struct HttpInfoFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl HttpInfoFetcher {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl InfoFetcher for HttpInfoFetcher {
    async fn observation_summary(
        &self,
        coord: Coordinate,
        stamp: &HourStamp,
    ) -> Result<String, FetchError> {
        let response = self
            .client
            .get(format!("{}/info", self.base_url))
            .query(&[
                ("date", stamp.to_string()),
                ("lat", coord.lat.to_string()),
                ("lng", coord.lng.to_string()),
            ])
            .send()
            .await
            .map_err(request_err)?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        response.text().await.map_err(request_err)
    }

    async fn region_outline(&self, coord: Coordinate) -> Result<Overlay, FetchError> {
        // Resolve the region name for the coordinate, then fetch its
        // outline document.
        let response = self
            .client
            .get(format!("{}/us-state", self.base_url))
            .query(&[
                ("lat", coord.lat.to_string()),
                ("lng", coord.lng.to_string()),
            ])
            .send()
            .await
            .map_err(request_err)?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        let name = response.text().await.map_err(request_err)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(FetchError::Empty(format!("({}, {})", coord.lat, coord.lng)));
        }

        let outline = self
            .client
            .get(format!("{}/static/states-kml/{}.kml", self.base_url, name))
            .send()
            .await
            .map_err(request_err)?;

        if !outline.status().is_success() {
            return Err(FetchError::Status(outline.status().as_u16()));
        }

        let body = outline.bytes().await.map_err(request_err)?;
        if body.is_empty() {
            return Err(FetchError::Empty(name.to_string()));
        }

        Ok(Overlay::region(name, body))
    }
}
