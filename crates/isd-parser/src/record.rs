//! Mandatory-section parsing for ISD records.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use century_common::error::{CenturyError, CenturyResult};

use crate::additional::{self, AdditionalData};

/// End of the mandatory section.
const MANDATORY_LEN: usize = 105;

/// A reading paired with its quality code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub value: Option<f64>,
    pub quality: String,
}

/// Station position in degrees, range-checked but otherwise as reported.
///
/// The archive reports unknown positions as (0, 0); that sentinel is kept
/// here and excluded later by the flatten materialization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawPosition {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    pub direction: Option<i32>,
    pub direction_quality: String,
    pub type_code: String,
    pub speed: Option<f64>,
    pub speed_quality: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkyCeiling {
    pub height: Option<i32>,
    pub quality: String,
    pub determination: String,
    pub cavok: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visibility {
    pub distance: Option<i32>,
    pub distance_quality: String,
    pub variability: String,
    pub variability_quality: String,
}

/// One parsed hourly observation record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationRecord {
    /// Derived station identity (see [`generate_station_id`]).
    pub station: String,
    pub usaf: Option<String>,
    pub wban: Option<String>,
    pub ts: DateTime<Utc>,
    pub data_source: String,
    pub position: Option<RawPosition>,
    pub report_type: String,
    pub elevation: Option<i32>,
    pub call_letters: String,
    pub quality_control: String,
    pub wind: Wind,
    pub sky_ceiling: SkyCeiling,
    pub visibility: Visibility,
    pub air_temperature: Measurement,
    pub dew_point: Measurement,
    pub sea_level_pressure: Measurement,
    pub additional: Option<AdditionalData>,
}

/// Parse a signed integer field; `None` for non-numeric content.
pub(crate) fn parse_int(s: &str) -> Option<i32> {
    let body = s.strip_prefix('+').unwrap_or(s);
    if body.is_empty() || !body.chars().skip_while(|c| *c == '-').all(|c| c.is_ascii_digit()) {
        return None;
    }
    body.parse().ok()
}

fn scaled(s: &str, factor: f64) -> Option<f64> {
    parse_int(s).map(|v| v as f64 / factor)
}

/// Station identity rule: USAF number when present, then WBAN, then the raw
/// position digits, then `unknown`.
pub fn generate_station_id(usaf: &str, wban: &str, lat: &str, lon: &str) -> String {
    if usaf != "999999" {
        format!("u{}", usaf)
    } else if wban != "99999" {
        format!("w{}", wban)
    } else if parse_int(lat).is_some() && parse_int(lon).is_some() {
        format!("x{}{}", lat, lon)
    } else {
        "unknown".to_string()
    }
}

/// `yyyyMMddHHmm`, UTC, calendar-validated.
fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if s.len() != 12 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year: i32 = s[0..4].parse().ok()?;
    let month: u32 = s[4..6].parse().ok()?;
    let day: u32 = s[6..8].parse().ok()?;
    let hour: u32 = s[8..10].parse().ok()?;
    let minute: u32 = s[10..12].parse().ok()?;

    let naive = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, 0)?;
    Some(Utc.from_utc_datetime(&naive))
}

/// Position in millidegrees, validated against the coordinate ranges.
fn parse_position(lat_str: &str, lon_str: &str) -> Option<RawPosition> {
    let lat = parse_int(lat_str)?;
    let lon = parse_int(lon_str)?;
    if !(-90_000..=90_000).contains(&lat) || !(-180_000..=180_000).contains(&lon) {
        return None;
    }
    Some(RawPosition {
        lat: lat as f64 / 1000.0,
        lng: lon as f64 / 1000.0,
    })
}

/// Parse one ISD record line.
///
/// The mandatory section must be complete; additional-data blocks are parsed
/// when an `ADD` marker follows it, and scanning stops at the first
/// unrecognized block tag (remarks and element-quality sections end a line
/// that way).
pub fn parse_record(line: &str) -> CenturyResult<ObservationRecord> {
    if !line.is_ascii() {
        return Err(CenturyError::MalformedRecord("non-ASCII record".to_string()));
    }
    if line.len() < MANDATORY_LEN {
        return Err(CenturyError::MalformedRecord(format!(
            "short record: {} chars",
            line.len()
        )));
    }

    let usaf = &line[4..10];
    let wban = &line[10..15];

    let ts = parse_timestamp(&line[15..27]).ok_or_else(|| {
        CenturyError::MalformedRecord(format!("bad timestamp '{}'", &line[15..27]))
    })?;

    let lat_str = &line[28..34];
    let lon_str = &line[34..41];

    let additional = if line.len() > MANDATORY_LEN + 3 && &line[105..108] == "ADD" {
        Some(additional::parse_additional(&line[108..]))
    } else {
        None
    };

    Ok(ObservationRecord {
        station: generate_station_id(usaf, wban, lat_str, lon_str),
        usaf: (usaf != "999999").then(|| usaf.to_string()),
        wban: (wban != "99999").then(|| wban.to_string()),
        ts,
        data_source: line[27..28].to_string(),
        position: parse_position(lat_str, lon_str),
        report_type: line[41..46].trim().to_string(),
        elevation: parse_int(&line[46..51]),
        call_letters: line[51..56].trim().to_string(),
        quality_control: line[56..60].to_string(),
        wind: Wind {
            direction: parse_int(&line[60..63]),
            direction_quality: line[63..64].to_string(),
            type_code: line[64..65].to_string(),
            speed: scaled(&line[65..69], 10.0),
            speed_quality: line[69..70].to_string(),
        },
        sky_ceiling: SkyCeiling {
            height: parse_int(&line[70..75]),
            quality: line[75..76].to_string(),
            determination: line[76..77].to_string(),
            cavok: line[77..78].to_string(),
        },
        visibility: Visibility {
            distance: parse_int(&line[78..84]),
            distance_quality: line[84..85].to_string(),
            variability: line[85..86].to_string(),
            variability_quality: line[86..87].to_string(),
        },
        air_temperature: Measurement {
            value: scaled(&line[87..92], 10.0),
            quality: line[92..93].to_string(),
        },
        dew_point: Measurement {
            value: scaled(&line[93..98], 10.0),
            quality: line[98..99].to_string(),
        },
        sea_level_pressure: Measurement {
            value: scaled(&line[99..104], 10.0),
            quality: line[104..105].to_string(),
        },
        additional,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_int() {
        assert_eq!(parse_int("+0155"), Some(155));
        assert_eq!(parse_int("-0021"), Some(-21));
        assert_eq!(parse_int("0270"), Some(270));
        assert_eq!(parse_int("999N9"), None);
        assert_eq!(parse_int(""), None);
    }

    #[test]
    fn test_station_id_precedence() {
        assert_eq!(generate_station_id("722860", "23119", "+33300", "-117633"), "u722860");
        assert_eq!(generate_station_id("999999", "23119", "+33300", "-117633"), "w23119");
        assert_eq!(
            generate_station_id("999999", "99999", "+33300", "-117633"),
            "x+33300-117633"
        );
        assert_eq!(generate_station_id("999999", "99999", "NNNNNN", "-117633"), "unknown");
    }

    #[test]
    fn test_position_range_check() {
        assert_eq!(
            parse_position("+33300", "-117633"),
            Some(RawPosition { lat: 33.3, lng: -117.633 })
        );
        assert_eq!(parse_position("+99999", "-117633"), None);
        assert_eq!(parse_position("+33300", "+199999"), None);
        // The (0, 0) sentinel survives parsing.
        assert_eq!(
            parse_position("+00000", "+000000"),
            Some(RawPosition { lat: 0.0, lng: 0.0 })
        );
    }
}
