//! External geocoding client.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use century_common::Coordinate;

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("status {0}")]
    Status(u16),

    #[error("no results")]
    NoResults,

    #[error("request failed: {0}")]
    Request(String),

    #[error("bad coordinate in response: {0}")]
    BadCoordinate(String),
}

/// Address to coordinate resolution.
#[async_trait]
pub trait Geocode: Send + Sync + 'static {
    async fn geocode(&self, address: &str) -> Result<Coordinate, GeocodeError>;
}

/// One hit in a Nominatim-style search response.
#[derive(Debug, Deserialize)]
struct GeocodeHit {
    lat: String,
    lon: String,
}

/// Geocoder against a Nominatim-style search endpoint.
pub struct HttpGeocoder {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGeocoder {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl Geocode for HttpGeocoder {
    async fn geocode(&self, address: &str) -> Result<Coordinate, GeocodeError> {
        let response = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[("q", address), ("format", "json"), ("limit", "1")])
            .send()
            .await
            .map_err(|e| GeocodeError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GeocodeError::Status(response.status().as_u16()));
        }

        let hits: Vec<GeocodeHit> = response
            .json()
            .await
            .map_err(|e| GeocodeError::Request(e.to_string()))?;
        let hit = hits.into_iter().next().ok_or(GeocodeError::NoResults)?;

        // The provider's loosely-typed payload becomes a validated
        // Coordinate right here at the boundary.
        let lat: f64 = hit
            .lat
            .parse()
            .map_err(|_| GeocodeError::BadCoordinate(hit.lat.clone()))?;
        let lng: f64 = hit
            .lon
            .parse()
            .map_err(|_| GeocodeError::BadCoordinate(hit.lon.clone()))?;
        Coordinate::new(lat, lng).map_err(|e| GeocodeError::BadCoordinate(e.to_string()))
    }
}
