//! HTTP handlers for the overlay and point-lookup endpoints.

use axum::{
    extract::{Extension, Path, Query},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};

use century_common::error::{CenturyError, CenturyResult};
use century_common::kml::{KmlDocument, KML_CONTENT_TYPE};
use century_common::{Coordinate, HourStamp};
use storage::{ObservationSummary, StationPosition};

use crate::state::AppState;

// ============================================================================
// Query Parameters
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SamplesQuery {
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InfoQuery {
    pub date: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct PointQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

// ============================================================================
// Response Helpers
// ============================================================================

fn error_response(err: &CenturyError) -> Response {
    let status = StatusCode::from_u16(err.http_status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, err.to_string()).into_response()
}

fn kml_response(doc: KmlDocument) -> Response {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, KML_CONTENT_TYPE)
        .body(doc.into_string().into())
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

fn parse_date_param(date: Option<&str>) -> CenturyResult<HourStamp> {
    let raw = date.ok_or_else(|| CenturyError::MissingParameter("date".to_string()))?;
    raw.parse()
}

fn parse_point_params(lat: Option<f64>, lng: Option<f64>) -> CenturyResult<Coordinate> {
    let lat = lat.ok_or_else(|| CenturyError::MissingParameter("lat".to_string()))?;
    let lng = lng.ok_or_else(|| CenturyError::MissingParameter("lng".to_string()))?;
    Coordinate::new(lat, lng)
}

// ============================================================================
// Document Builders
// ============================================================================

/// KML document of the stations active in one hour.
fn stations_document(stations: &[StationPosition]) -> KmlDocument {
    let mut doc = KmlDocument::new("stations");
    for s in stations {
        doc.point(&s.station, &s.station, s.lng, s.lat);
    }
    doc
}

/// Plain-text summary of the nearest station's readings.
fn summary_text(coord: Coordinate, stamp: HourStamp, obs: &ObservationSummary) -> String {
    let station_pos = Coordinate::new(obs.lat, obs.lng);
    let distance = station_pos
        .map(|p| format!(" ({:.1} km away)", coord.distance_km(&p)))
        .unwrap_or_default();

    let mut readings = Vec::new();
    if let Some(t) = obs.air_temp {
        readings.push(format!("air temperature {:.1} C", t));
    }
    if let Some(d) = obs.dew_point {
        readings.push(format!("dew point {:.1} C", d));
    }
    if let Some(p) = obs.pressure {
        readings.push(format!("pressure {:.1} hPa", p));
    }
    if let Some(w) = obs.wind_speed {
        readings.push(format!("wind {:.1} m/s", w));
    }
    if let Some(pw) = &obs.present_weather {
        readings.push(format!("present weather {}", pw));
    }
    if readings.is_empty() {
        readings.push("no readings".to_string());
    }

    format!("{}{} at {}: {}", obs.station, distance, stamp, readings.join(", "))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /samples.kml?date=YYYY-MM-DD HH - one hour of station placemarks
#[instrument(skip(state))]
pub async fn samples_kml_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<SamplesQuery>,
) -> Response {
    let stamp = match parse_date_param(query.date.as_deref()) {
        Ok(stamp) => stamp,
        Err(e) => return error_response(&e),
    };

    match state.store.stations_at_hour(stamp).await {
        Ok(stations) if stations.is_empty() => {
            info!(hour = %stamp, "no stations for hour");
            // Empty body: the playback fetcher treats this as Failure.
            StatusCode::NOT_FOUND.into_response()
        }
        Ok(stations) => {
            info!(hour = %stamp, count = stations.len(), "serving station overlay");
            kml_response(stations_document(&stations))
        }
        Err(e) => error_response(&e),
    }
}

/// GET /info?date=..&lat=..&lng=.. - nearest-station observation summary
#[instrument(skip(state))]
pub async fn info_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<InfoQuery>,
) -> Response {
    let parsed = parse_date_param(query.date.as_deref())
        .and_then(|stamp| parse_point_params(query.lat, query.lng).map(|coord| (stamp, coord)));
    let (stamp, coord) = match parsed {
        Ok(pair) => pair,
        Err(e) => return error_response(&e),
    };

    match state.store.nearest_observation(coord, stamp).await {
        Ok(Some(obs)) => summary_text(coord, stamp, &obs).into_response(),
        Ok(None) => error_response(&CenturyError::DataNotAvailable(stamp.to_string())),
        Err(e) => error_response(&e),
    }
}

/// GET /us-state?lat=..&lng=.. - name of the region containing the point
#[instrument(skip(state))]
pub async fn us_state_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<PointQuery>,
) -> Response {
    let coord = match parse_point_params(query.lat, query.lng) {
        Ok(coord) => coord,
        Err(e) => return error_response(&e),
    };

    match state.store.region_for_point(coord).await {
        Ok(Some(name)) => name.into_response(),
        Ok(None) => error_response(&CenturyError::RegionNotFound(format!(
            "({}, {})",
            coord.lat, coord.lng
        ))),
        Err(e) => error_response(&e),
    }
}

/// GET /static/states-kml/:file - region outline overlay
#[instrument(skip(state))]
pub async fn state_outline_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(file): Path<String>,
) -> Response {
    let name = file.strip_suffix(".kml").unwrap_or(&file);

    match state.store.region_outline(name).await {
        Ok(Some(feature)) => {
            let mut doc = KmlDocument::new(&feature.name);
            doc.polygon(&feature.name, &feature.rings);
            kml_response(doc)
        }
        Ok(None) => error_response(&CenturyError::RegionNotFound(name.to_string())),
        Err(e) => error_response(&e),
    }
}

/// GET /health - liveness probe
pub async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "century-api",
    }))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_parse_date_param() {
        assert!(parse_date_param(Some("1978-10-01 10")).is_ok());
        assert!(parse_date_param(Some("1978/10/01 10")).is_err());
        assert!(parse_date_param(None).is_err());
    }

    #[test]
    fn test_parse_point_params() {
        assert!(parse_point_params(Some(42.3), Some(-71.1)).is_ok());
        assert!(parse_point_params(None, Some(-71.1)).is_err());
        assert!(parse_point_params(Some(0.0), Some(0.0)).is_err());
    }

    #[test]
    fn test_error_response_status_codes() {
        let bad = error_response(&CenturyError::InvalidHourToken("x".to_string()));
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);

        let missing = error_response(&CenturyError::RegionNotFound("Atlantis".to_string()));
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let db = error_response(&CenturyError::DatabaseError("down".to_string()));
        assert_eq!(db.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_stations_document_contains_all_placemarks() {
        let stations = vec![
            StationPosition {
                station: "u722860".to_string(),
                lat: 33.3,
                lng: -117.633,
            },
            StationPosition {
                station: "w23119".to_string(),
                lat: 32.7,
                lng: -117.2,
            },
        ];
        let doc = stations_document(&stations);
        assert_eq!(doc.len(), 2);
        let xml = doc.into_string();
        assert!(xml.contains("u722860"));
        assert!(xml.contains("w23119"));
    }

    #[test]
    fn test_kml_response_content_type() {
        let resp = kml_response(KmlDocument::new("stations"));
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            KML_CONTENT_TYPE
        );
    }

    fn sample_summary() -> ObservationSummary {
        ObservationSummary {
            station: "u722860".to_string(),
            ts: Utc.with_ymd_and_hms(1978, 10, 1, 10, 0, 0).unwrap(),
            lat: 33.3,
            lng: -117.633,
            air_temp: Some(25.0),
            air_temp_quality: "1".to_string(),
            dew_point: Some(11.1),
            pressure: Some(1015.3),
            wind_speed: None,
            present_weather: Some("02".to_string()),
        }
    }

    #[test]
    fn test_summary_text_includes_readings() {
        let coord = Coordinate::new(33.0, -117.0).unwrap();
        let stamp: HourStamp = "1978-10-01 10".parse().unwrap();
        let text = summary_text(coord, stamp, &sample_summary());

        assert!(text.starts_with("u722860 ("));
        assert!(text.contains("at 1978-10-01 10:"));
        assert!(text.contains("air temperature 25.0 C"));
        assert!(text.contains("dew point 11.1 C"));
        assert!(text.contains("pressure 1015.3 hPa"));
        assert!(text.contains("present weather 02"));
        assert!(!text.contains("wind"));
    }

    #[test]
    fn test_summary_text_without_readings() {
        let mut obs = sample_summary();
        obs.air_temp = None;
        obs.dew_point = None;
        obs.pressure = None;
        obs.present_weather = None;

        let coord = Coordinate::new(33.0, -117.0).unwrap();
        let stamp: HourStamp = "1978-10-01 10".parse().unwrap();
        let text = summary_text(coord, stamp, &obs);
        assert!(text.ends_with("no readings"));
    }
}
