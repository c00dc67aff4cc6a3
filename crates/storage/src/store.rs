//! Observation storage and the aggregation queries over it.

use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use tracing::{debug, info};

use century_common::error::{CenturyError, CenturyResult};
use century_common::{Coordinate, HourStamp};
use isd_parser::ObservationRecord;

/// One row per logical record keyed by (station, ts); the core readings as
/// value/quality column pairs, the present-weather condition extracted for
/// the category index, remaining additional blocks as JSONB.
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS observations (
    station TEXT NOT NULL,
    ts TIMESTAMPTZ NOT NULL,
    usaf TEXT,
    wban TEXT,
    data_source TEXT NOT NULL,
    lat DOUBLE PRECISION,
    lng DOUBLE PRECISION,
    report_type TEXT NOT NULL,
    elevation INTEGER,
    call_letters TEXT NOT NULL,
    quality_control TEXT NOT NULL,
    wind_direction INTEGER,
    wind_direction_quality TEXT NOT NULL,
    wind_type TEXT NOT NULL,
    wind_speed DOUBLE PRECISION,
    wind_speed_quality TEXT NOT NULL,
    sky_ceiling INTEGER,
    sky_ceiling_quality TEXT NOT NULL,
    visibility INTEGER,
    visibility_quality TEXT NOT NULL,
    air_temp DOUBLE PRECISION,
    air_temp_quality TEXT NOT NULL,
    dew_point DOUBLE PRECISION,
    dew_point_quality TEXT NOT NULL,
    pressure DOUBLE PRECISION,
    pressure_quality TEXT NOT NULL,
    present_weather TEXT,
    additional JSONB,
    PRIMARY KEY (station, ts)
);

CREATE INDEX IF NOT EXISTS idx_observations_ts ON observations (ts);

CREATE TABLE IF NOT EXISTS flattened (
    station TEXT NOT NULL,
    ts TIMESTAMPTZ NOT NULL,
    lat DOUBLE PRECISION NOT NULL,
    lng DOUBLE PRECISION NOT NULL,
    air_temp DOUBLE PRECISION NOT NULL,
    condition TEXT,
    PRIMARY KEY (station, ts)
);

CREATE INDEX IF NOT EXISTS idx_flattened_ts ON flattened (ts);

CREATE INDEX IF NOT EXISTS idx_flattened_geo_condition ON flattened (lat, lng, condition);

CREATE TABLE IF NOT EXISTS regions (
    name TEXT PRIMARY KEY,
    min_lat DOUBLE PRECISION NOT NULL,
    max_lat DOUBLE PRECISION NOT NULL,
    min_lng DOUBLE PRECISION NOT NULL,
    max_lng DOUBLE PRECISION NOT NULL,
    rings JSONB NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_regions_bbox ON regions (min_lat, max_lat, min_lng, max_lng)
"#;

/// A station's representative position within one hour.
#[derive(Debug, Clone, FromRow)]
pub struct StationPosition {
    pub station: String,
    pub lat: f64,
    pub lng: f64,
}

/// Readings of the station nearest a point, for the info panel.
#[derive(Debug, Clone, FromRow)]
pub struct ObservationSummary {
    pub station: String,
    pub ts: DateTime<Utc>,
    pub lat: f64,
    pub lng: f64,
    pub air_temp: Option<f64>,
    pub air_temp_quality: String,
    pub dew_point: Option<f64>,
    pub pressure: Option<f64>,
    pub wind_speed: Option<f64>,
    pub present_weather: Option<String>,
}

/// First and last reporting time of a station.
#[derive(Debug, Clone, FromRow)]
pub struct StationSpan {
    pub station: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Database connection pool and the operations on the archive.
pub struct ObservationStore {
    pool: PgPool,
}

impl ObservationStore {
    /// Create a new store from a database URL.
    pub async fn connect(database_url: &str) -> CenturyResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| CenturyError::DatabaseError(format!("Connection failed: {}", e)))?;

        Ok(Self { pool })
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> CenturyResult<()> {
        // Split SQL statements and execute them individually
        for statement in SCHEMA_SQL.split(';') {
            let trimmed = statement.trim();
            if !trimmed.is_empty() {
                sqlx::query(trimmed)
                    .execute(&self.pool)
                    .await
                    .map_err(|e| CenturyError::DatabaseError(format!("Migration failed: {}", e)))?;
            }
        }

        Ok(())
    }

    /// Upsert a batch of parsed records in one transaction.
    pub async fn insert_observations(&self, records: &[ObservationRecord]) -> CenturyResult<u64> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| CenturyError::DatabaseError(format!("Begin failed: {}", e)))?;

        let mut inserted = 0u64;
        for rec in records {
            let result = sqlx::query(
                r#"
                INSERT INTO observations (
                    station, ts, usaf, wban, data_source,
                    lat, lng, report_type, elevation, call_letters, quality_control,
                    wind_direction, wind_direction_quality, wind_type, wind_speed, wind_speed_quality,
                    sky_ceiling, sky_ceiling_quality, visibility, visibility_quality,
                    air_temp, air_temp_quality, dew_point, dew_point_quality,
                    pressure, pressure_quality, present_weather, additional
                ) VALUES (
                    $1, $2, $3, $4, $5,
                    $6, $7, $8, $9, $10, $11,
                    $12, $13, $14, $15, $16,
                    $17, $18, $19, $20,
                    $21, $22, $23, $24,
                    $25, $26, $27, $28
                )
                ON CONFLICT (station, ts) DO UPDATE SET
                    air_temp = EXCLUDED.air_temp,
                    air_temp_quality = EXCLUDED.air_temp_quality,
                    dew_point = EXCLUDED.dew_point,
                    dew_point_quality = EXCLUDED.dew_point_quality,
                    pressure = EXCLUDED.pressure,
                    pressure_quality = EXCLUDED.pressure_quality,
                    present_weather = EXCLUDED.present_weather,
                    additional = EXCLUDED.additional
                "#,
            )
            .bind(&rec.station)
            .bind(rec.ts)
            .bind(&rec.usaf)
            .bind(&rec.wban)
            .bind(&rec.data_source)
            .bind(rec.position.map(|p| p.lat))
            .bind(rec.position.map(|p| p.lng))
            .bind(&rec.report_type)
            .bind(rec.elevation)
            .bind(&rec.call_letters)
            .bind(&rec.quality_control)
            .bind(rec.wind.direction)
            .bind(&rec.wind.direction_quality)
            .bind(&rec.wind.type_code)
            .bind(rec.wind.speed)
            .bind(&rec.wind.speed_quality)
            .bind(rec.sky_ceiling.height)
            .bind(&rec.sky_ceiling.quality)
            .bind(rec.visibility.distance)
            .bind(&rec.visibility.distance_quality)
            .bind(rec.air_temperature.value)
            .bind(&rec.air_temperature.quality)
            .bind(rec.dew_point.value)
            .bind(&rec.dew_point.quality)
            .bind(rec.sea_level_pressure.value)
            .bind(&rec.sea_level_pressure.quality)
            .bind(present_weather_of(rec))
            .bind(rec.additional.as_ref().map(Json))
            .execute(&mut *tx)
            .await
            .map_err(|e| CenturyError::DatabaseError(format!("Insert failed: {}", e)))?;

            inserted += result.rows_affected();
        }

        tx.commit()
            .await
            .map_err(|e| CenturyError::DatabaseError(format!("Commit failed: {}", e)))?;

        debug!(count = inserted, "observation batch stored");
        Ok(inserted)
    }

    /// Stations active in `[stamp, stamp + 1h)` with one representative
    /// position each. Needs the index on `ts`.
    pub async fn stations_at_hour(&self, stamp: HourStamp) -> CenturyResult<Vec<StationPosition>> {
        let rows = sqlx::query_as::<_, StationPosition>(
            "SELECT DISTINCT ON (station) station, lat, lng FROM observations \
             WHERE ts >= $1 AND ts < $2 AND lat IS NOT NULL AND lng IS NOT NULL \
             ORDER BY station, ts",
        )
        .bind(stamp.start())
        .bind(stamp.end())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CenturyError::DatabaseError(format!("Query failed: {}", e)))?;

        Ok(rows)
    }

    /// The station nearest a coordinate that reported in the given hour.
    ///
    /// Ordering is by squared degree distance, which is adequate at the
    /// point-lookup scale; the (0, 0) sentinel is excluded.
    pub async fn nearest_observation(
        &self,
        coord: Coordinate,
        stamp: HourStamp,
    ) -> CenturyResult<Option<ObservationSummary>> {
        let row = sqlx::query_as::<_, ObservationSummary>(
            "SELECT station, ts, lat, lng, air_temp, air_temp_quality, dew_point, \
             pressure, wind_speed, present_weather FROM observations \
             WHERE ts >= $1 AND ts < $2 \
               AND lat IS NOT NULL AND lng IS NOT NULL \
               AND NOT (lat = 0 AND lng = 0) \
             ORDER BY (lat - $3) * (lat - $3) + (lng - $4) * (lng - $4) \
             LIMIT 1",
        )
        .bind(stamp.start())
        .bind(stamp.end())
        .bind(coord.lat)
        .bind(coord.lng)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| CenturyError::DatabaseError(format!("Query failed: {}", e)))?;

        Ok(row)
    }

    /// Rebuild the flattened materialization from records after `since`.
    ///
    /// Keeps rows with a quality-1 air temperature and a real position; the
    /// (0, 0) sentinel counts as no position. Returns the number of
    /// materialized rows.
    pub async fn flatten(&self, since: DateTime<Utc>) -> CenturyResult<u64> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| CenturyError::DatabaseError(format!("Begin failed: {}", e)))?;

        sqlx::query("TRUNCATE flattened")
            .execute(&mut *tx)
            .await
            .map_err(|e| CenturyError::DatabaseError(format!("Truncate failed: {}", e)))?;

        let result = sqlx::query(
            "INSERT INTO flattened (station, ts, lat, lng, air_temp, condition) \
             SELECT station, ts, lat, lng, air_temp, present_weather FROM observations \
             WHERE ts > $1 \
               AND air_temp_quality = '1' \
               AND air_temp IS NOT NULL \
               AND lat IS NOT NULL AND lng IS NOT NULL \
               AND NOT (lat = 0 AND lng = 0)",
        )
        .bind(since)
        .execute(&mut *tx)
        .await
        .map_err(|e| CenturyError::DatabaseError(format!("Materialization failed: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| CenturyError::DatabaseError(format!("Commit failed: {}", e)))?;

        info!(rows = result.rows_affected(), "flattened collection rebuilt");
        Ok(result.rows_affected())
    }

    /// First and last reporting time per station, longest span first.
    pub async fn station_spans(&self) -> CenturyResult<Vec<StationSpan>> {
        let rows = sqlx::query_as::<_, StationSpan>(
            "SELECT station, MIN(ts) AS \"start\", MAX(ts) AS \"end\" FROM observations \
             GROUP BY station \
             ORDER BY MAX(ts) - MIN(ts) DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CenturyError::DatabaseError(format!("Query failed: {}", e)))?;

        Ok(rows)
    }

    pub(crate) fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// First present-weather condition of a record, for the category column.
fn present_weather_of(rec: &ObservationRecord) -> Option<String> {
    rec.additional
        .as_ref()
        .and_then(|add| add.present_weather.first())
        .map(|pw| pw.condition.clone())
}
