//! US-state region outlines: load, point lookup, outline retrieval.

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use tracing::debug;

use century_common::error::{CenturyError, CenturyResult};
use century_common::geo::{point_in_rings, Coordinate};

use crate::store::ObservationStore;

/// A named region as a set of rings of [longitude, latitude] positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionFeature {
    pub name: String,
    pub rings: Vec<Vec<[f64; 2]>>,
}

impl RegionFeature {
    /// Bounding box as (min_lat, max_lat, min_lng, max_lng).
    pub fn bbox(&self) -> (f64, f64, f64, f64) {
        let mut min_lat = f64::INFINITY;
        let mut max_lat = f64::NEG_INFINITY;
        let mut min_lng = f64::INFINITY;
        let mut max_lng = f64::NEG_INFINITY;

        for ring in &self.rings {
            for pos in ring {
                min_lng = min_lng.min(pos[0]);
                max_lng = max_lng.max(pos[0]);
                min_lat = min_lat.min(pos[1]);
                max_lat = max_lat.max(pos[1]);
            }
        }

        (min_lat, max_lat, min_lng, max_lng)
    }
}

#[derive(FromRow)]
struct RegionRow {
    name: String,
    rings: Json<Vec<Vec<[f64; 2]>>>,
}

impl ObservationStore {
    /// Upsert region features with their bounding boxes.
    pub async fn insert_regions(&self, features: &[RegionFeature]) -> CenturyResult<u64> {
        let mut stored = 0u64;
        for feature in features {
            let (min_lat, max_lat, min_lng, max_lng) = feature.bbox();
            sqlx::query(
                "INSERT INTO regions (name, min_lat, max_lat, min_lng, max_lng, rings) \
                 VALUES ($1, $2, $3, $4, $5, $6) \
                 ON CONFLICT (name) DO UPDATE SET \
                     min_lat = EXCLUDED.min_lat, \
                     max_lat = EXCLUDED.max_lat, \
                     min_lng = EXCLUDED.min_lng, \
                     max_lng = EXCLUDED.max_lng, \
                     rings = EXCLUDED.rings",
            )
            .bind(&feature.name)
            .bind(min_lat)
            .bind(max_lat)
            .bind(min_lng)
            .bind(max_lng)
            .bind(Json(&feature.rings))
            .execute(self.pool())
            .await
            .map_err(|e| CenturyError::DatabaseError(format!("Insert failed: {}", e)))?;

            stored += 1;
        }

        Ok(stored)
    }

    /// Name of the region containing a coordinate.
    ///
    /// Candidates come from the indexed bounding-box prefilter; the exact
    /// test is an even-odd ray cast over the stored rings.
    pub async fn region_for_point(&self, coord: Coordinate) -> CenturyResult<Option<String>> {
        let candidates = sqlx::query_as::<_, RegionRow>(
            "SELECT name, rings FROM regions \
             WHERE min_lat <= $1 AND max_lat >= $1 AND min_lng <= $2 AND max_lng >= $2",
        )
        .bind(coord.lat)
        .bind(coord.lng)
        .fetch_all(self.pool())
        .await
        .map_err(|e| CenturyError::DatabaseError(format!("Query failed: {}", e)))?;

        debug!(
            lat = coord.lat,
            lng = coord.lng,
            candidates = candidates.len(),
            "region bbox prefilter"
        );

        Ok(candidates
            .into_iter()
            .find(|row| point_in_rings(coord, &row.rings.0))
            .map(|row| row.name))
    }

    /// The stored outline of a named region.
    pub async fn region_outline(&self, name: &str) -> CenturyResult<Option<RegionFeature>> {
        let row = sqlx::query_as::<_, RegionRow>("SELECT name, rings FROM regions WHERE name = $1")
            .bind(name)
            .fetch_optional(self.pool())
            .await
            .map_err(|e| CenturyError::DatabaseError(format!("Query failed: {}", e)))?;

        Ok(row.map(|r| RegionFeature {
            name: r.name,
            rings: r.rings.0,
        }))
    }
}
