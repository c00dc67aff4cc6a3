//! Geographic coordinates and point-in-region tests.

use serde::{Deserialize, Serialize};

use crate::error::{CenturyError, CenturyResult};

/// A validated (latitude, longitude) pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    /// Validated constructor.
    ///
    /// Rejects out-of-range values and the exact (0, 0) pair, which the
    /// archive uses as a sentinel for an unknown station position.
    pub fn new(lat: f64, lng: f64) -> CenturyResult<Self> {
        if !lat.is_finite() || !lng.is_finite() {
            return Err(CenturyError::InvalidCoordinate(format!(
                "non-finite ({}, {})",
                lat, lng
            )));
        }
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return Err(CenturyError::InvalidCoordinate(format!(
                "out of range ({}, {})",
                lat, lng
            )));
        }
        if lat == 0.0 && lng == 0.0 {
            return Err(CenturyError::InvalidCoordinate("(0, 0) sentinel".to_string()));
        }
        Ok(Self { lat, lng })
    }

    /// Great-circle distance to another coordinate, in kilometers.
    pub fn distance_km(&self, other: &Coordinate) -> f64 {
        const EARTH_RADIUS_KM: f64 = 6371.0;
        let (lat1, lat2) = (self.lat.to_radians(), other.lat.to_radians());
        let dlat = (other.lat - self.lat).to_radians();
        let dlng = (other.lng - self.lng).to_radians();
        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
    }
}

/// Even-odd ray cast over a set of polygon rings.
///
/// Rings hold [longitude, latitude] positions (GeoJSON and KML agree on
/// that order). Interior rings flip the parity, so holes fall out of the
/// even-odd rule without special casing.
pub fn point_in_rings(coord: Coordinate, rings: &[Vec<[f64; 2]>]) -> bool {
    let (x, y) = (coord.lng, coord.lat);
    let mut inside = false;

    for ring in rings {
        if ring.len() < 3 {
            continue;
        }
        let mut j = ring.len() - 1;
        for i in 0..ring.len() {
            let (xi, yi) = (ring[i][0], ring[i][1]);
            let (xj, yj) = (ring[j][0], ring[j][1]);
            if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
                inside = !inside;
            }
            j = i;
        }
    }

    inside
}
