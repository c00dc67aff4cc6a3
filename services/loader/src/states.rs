//! US-states GeoJSON conversion.
//!
//! The census outline file carries Polygon and MultiPolygon features with
//! 3-D positions; positions are truncated to 2-D on the way in, the same
//! shape the region table stores.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::warn;

use storage::RegionFeature;

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    properties: serde_json::Value,
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    #[serde(rename = "type")]
    kind: String,
    coordinates: serde_json::Value,
}

/// Parse a FeatureCollection into named region features.
///
/// Features without a usable name are dropped with a warning; an unknown
/// geometry type fails the whole load.
pub fn parse_feature_collection(text: &str) -> Result<Vec<RegionFeature>> {
    let collection: FeatureCollection =
        serde_json::from_str(text).context("parsing FeatureCollection")?;

    let mut features = Vec::with_capacity(collection.features.len());
    for feature in collection.features {
        let Some(name) = feature_name(&feature.properties) else {
            warn!("feature without NAME property dropped");
            continue;
        };

        let rings = match feature.geometry.kind.as_str() {
            "Polygon" => polygon_rings(&feature.geometry.coordinates)?,
            "MultiPolygon" => {
                let polygons: Vec<serde_json::Value> =
                    serde_json::from_value(feature.geometry.coordinates.clone())
                        .context("MultiPolygon coordinates")?;
                let mut rings = Vec::new();
                for polygon in &polygons {
                    rings.extend(polygon_rings(polygon)?);
                }
                rings
            }
            other => bail!("unknown geometry type '{}'", other),
        };

        features.push(RegionFeature { name, rings });
    }

    Ok(features)
}

fn feature_name(properties: &serde_json::Value) -> Option<String> {
    properties
        .get("NAME")
        .or_else(|| properties.get("name"))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

/// Convert one polygon's rings, truncating 3-D positions to 2-D.
fn polygon_rings(coordinates: &serde_json::Value) -> Result<Vec<Vec<[f64; 2]>>> {
    let rings: Vec<Vec<Vec<f64>>> =
        serde_json::from_value(coordinates.clone()).context("Polygon coordinates")?;

    rings
        .into_iter()
        .map(|ring| {
            ring.into_iter()
                .map(|pos| {
                    if pos.len() < 2 {
                        bail!("position with fewer than 2 values");
                    }
                    Ok([pos[0], pos[1]])
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polygon_feature_with_3d_positions() {
        let text = r#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {"NAME": "Nevada"},
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[-120.0, 42.0, 0.0], [-114.0, 42.0, 0.0], [-114.0, 35.0, 0.0], [-120.0, 42.0, 0.0]]]
                }
            }]
        }"#;

        let features = parse_feature_collection(text).unwrap();
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].name, "Nevada");
        assert_eq!(features[0].rings.len(), 1);
        // Third dimension dropped.
        assert_eq!(features[0].rings[0][0], [-120.0, 42.0]);
    }

    #[test]
    fn test_multipolygon_flattens_parts() {
        let text = r#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {"NAME": "Michigan"},
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [
                        [[[-90.0, 47.0], [-88.0, 47.0], [-88.0, 48.0], [-90.0, 47.0]]],
                        [[[-87.0, 42.0], [-83.0, 42.0], [-83.0, 45.0], [-87.0, 42.0]]]
                    ]
                }
            }]
        }"#;

        let features = parse_feature_collection(text).unwrap();
        assert_eq!(features[0].rings.len(), 2);
    }

    #[test]
    fn test_feature_without_name_is_dropped() {
        let text = r#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {},
                "geometry": {"type": "Polygon", "coordinates": [[[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 1.0]]]}
            }]
        }"#;

        let features = parse_feature_collection(text).unwrap();
        assert!(features.is_empty());
    }

    #[test]
    fn test_unknown_geometry_fails() {
        let text = r#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {"NAME": "Elsewhere"},
                "geometry": {"type": "GeometryCollection", "coordinates": []}
            }]
        }"#;

        assert!(parse_feature_collection(text).is_err());
    }
}
