//! Additional-data block parsing.
//!
//! Blocks follow the `ADD` marker as `<tag><fixed-width fields>` with no
//! separators. Three block families are parsed into typed fields; the other
//! known tags are skipped over by length so parsing can continue past them.
//! Scanning stops at the first unrecognized tag, which is also how the
//! remarks (`REM`) and element-quality (`EQD`) sections terminate a record.

use serde::{Deserialize, Serialize};

use crate::record::parse_int;

/// Known skippable block families: tag prefix, highest occurrence digit,
/// total block length including the tag.
const SKIP_BLOCKS: &[(&str, u8, usize)] = &[
    ("AB", b'1', 10),
    ("AC", b'1', 6),
    ("AD", b'1', 22),
    ("AE", b'1', 15),
    ("AG", b'1', 7),
    ("AH", b'6', 18),
    ("AI", b'6', 18),
    ("AK", b'1', 15),
    ("AL", b'4', 10),
    ("AM", b'1', 21),
    ("AN", b'1', 12),
    ("AO", b'4', 11),
    ("AP", b'4', 9),
    ("AU", b'9', 11),
    ("AW", b'4', 6),
    ("AX", b'6', 9),
    ("AY", b'2', 8),
    ("AZ", b'2', 8),
    ("CB", b'2', 13),
    ("CF", b'3', 9),
    ("CG", b'3', 11),
    ("CH", b'2', 18),
    ("CI", b'1', 31),
    ("CN", b'4', 21),
    ("CO", b'9', 11),
    ("CR", b'1', 10),
    ("CT", b'3', 10),
    ("CU", b'3', 16),
    ("CW", b'1', 17),
    ("CX", b'3', 29),
    ("ED", b'1', 11),
    ("GA", b'6', 16),
    ("GD", b'6', 14),
    ("GE", b'1', 22),
    ("GF", b'1', 26),
    ("GG", b'6', 18),
    ("GH", b'1', 32),
    ("GJ", b'1', 8),
    ("GK", b'1', 7),
    ("GL", b'1', 9),
    ("GM", b'1', 33),
    ("GN", b'1', 31),
    ("GO", b'1', 22),
    ("GP", b'1', 34),
    ("GQ", b'1', 17),
    ("GR", b'1', 17),
    ("HL", b'1', 7),
    ("IA", b'2', 12),
    ("IB", b'2', 30),
    ("IC", b'1', 28),
    ("KA", b'4', 13),
    ("KB", b'3', 13),
    ("KC", b'2', 17),
    ("KD", b'2', 12),
    ("KE", b'1', 15),
    ("KF", b'1', 9),
    ("KG", b'2', 14),
    ("MA", b'1', 15),
    ("MD", b'1', 14),
    ("ME", b'1', 9),
    ("MF", b'1', 15),
    ("MG", b'1', 15),
    ("MH", b'1', 15),
    ("MK", b'1', 27),
    ("MV", b'7', 6),
    ("OA", b'3', 11),
    ("OB", b'2', 39),
    ("OD", b'3', 14),
    ("OE", b'3', 19),
    ("RH", b'3', 12),
    ("SA", b'1', 8),
    ("ST", b'1', 20),
    ("UA", b'1', 13),
    ("UG", b'2', 12),
    ("WA", b'1', 9),
    ("WD", b'1', 23),
    ("WG", b'1', 14),
    ("WJ", b'1', 22),
];

/// Liquid precipitation occurrence (AA1-AA4).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidPrecipitation {
    pub period_hours: Option<i32>,
    pub depth: Option<i32>,
    pub condition: String,
    pub quality: String,
}

/// Snow depth (AJ1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnowDepth {
    pub depth_cm: Option<i32>,
    pub condition: String,
    pub quality: String,
    pub equivalent_water_depth: Option<f64>,
    pub equivalent_water_condition: String,
    pub equivalent_water_quality: String,
}

/// Present weather observation (MW1-MW7).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresentWeather {
    pub condition: String,
    pub quality: String,
}

/// Typed additional-data blocks plus the tags that were skipped over.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdditionalData {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub liquid_precipitation: Vec<LiquidPrecipitation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snow_depth: Option<SnowDepth>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub present_weather: Vec<PresentWeather>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<String>,
}

impl AdditionalData {
    pub fn is_empty(&self) -> bool {
        self.liquid_precipitation.is_empty()
            && self.snow_depth.is_none()
            && self.present_weather.is_empty()
            && self.sections.is_empty()
    }
}

fn occurrence_in_range(tag: &str, prefix: &str, max: u8) -> bool {
    tag.starts_with(prefix) && {
        let digit = tag.as_bytes()[2];
        (b'1'..=max).contains(&digit)
    }
}

fn skip_len(tag: &str) -> Option<usize> {
    SKIP_BLOCKS
        .iter()
        .find(|(prefix, max, _)| occurrence_in_range(tag, prefix, *max))
        .map(|(_, _, len)| *len)
}

/// Parse additional-data blocks from the text after the `ADD` marker.
///
/// Truncated trailing blocks and unknown tags end the scan; everything
/// parsed up to that point is kept.
pub fn parse_additional(data: &str) -> AdditionalData {
    let mut out = AdditionalData::default();
    if !data.is_ascii() {
        return out;
    }
    let mut index = 0;

    while index + 3 <= data.len() {
        let tag = &data[index..index + 3];

        let consumed = if occurrence_in_range(tag, "AA", b'4') {
            parse_liquid_precipitation(&data[index..], &mut out)
        } else if tag == "AJ1" {
            parse_snow_depth(&data[index..], &mut out)
        } else if occurrence_in_range(tag, "MW", b'7') {
            parse_present_weather(&data[index..], &mut out)
        } else if let Some(len) = skip_len(tag) {
            if index + len > data.len() {
                break;
            }
            out.sections.push(tag.to_string());
            Some(len)
        } else {
            // Unknown tag: remarks or a block this parser does not know.
            tracing::trace!(tag = %tag, offset = index, "stopping additional-data scan");
            break;
        };

        match consumed {
            Some(len) => index += len,
            None => break,
        }
    }

    out
}

fn parse_liquid_precipitation(block: &str, out: &mut AdditionalData) -> Option<usize> {
    const LEN: usize = 11;
    if block.len() < LEN {
        return None;
    }
    out.sections.push(block[0..3].to_string());
    out.liquid_precipitation.push(LiquidPrecipitation {
        period_hours: parse_int(&block[3..5]),
        depth: parse_int(&block[5..9]),
        condition: block[9..10].to_string(),
        quality: block[10..11].to_string(),
    });
    Some(LEN)
}

fn parse_snow_depth(block: &str, out: &mut AdditionalData) -> Option<usize> {
    const LEN: usize = 17;
    if block.len() < LEN {
        return None;
    }
    out.sections.push(block[0..3].to_string());
    out.snow_depth = Some(SnowDepth {
        depth_cm: parse_int(&block[3..7]),
        condition: block[7..8].to_string(),
        quality: block[8..9].to_string(),
        equivalent_water_depth: parse_int(&block[9..15]).map(|v| v as f64 / 10.0),
        equivalent_water_condition: block[15..16].to_string(),
        equivalent_water_quality: block[16..17].to_string(),
    });
    Some(LEN)
}

fn parse_present_weather(block: &str, out: &mut AdditionalData) -> Option<usize> {
    const LEN: usize = 6;
    if block.len() < LEN {
        return None;
    }
    out.sections.push(block[0..3].to_string());
    out.present_weather.push(PresentWeather {
        condition: block[3..5].to_string(),
        quality: block[5..6].to_string(),
    });
    Some(LEN)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Additional-data section of a real SYNOP-derived record.
    const SAMPLE: &str = "AA112000091AA224000091AY101061AY201061GF102991001001999999001081KA1999N-00211MA1999999099241MD1710231+9999MW1021REMSYN100AAXX  01061 01010";

    #[test]
    fn test_parses_liquid_precipitation_occurrences() {
        let add = parse_additional(SAMPLE);
        assert_eq!(add.liquid_precipitation.len(), 2);
        assert_eq!(add.liquid_precipitation[0].period_hours, Some(12));
        assert_eq!(add.liquid_precipitation[0].depth, Some(0));
        assert_eq!(add.liquid_precipitation[0].condition, "9");
        assert_eq!(add.liquid_precipitation[0].quality, "1");
        assert_eq!(add.liquid_precipitation[1].period_hours, Some(24));
    }

    #[test]
    fn test_parses_present_weather() {
        let add = parse_additional(SAMPLE);
        assert_eq!(add.present_weather.len(), 1);
        assert_eq!(add.present_weather[0].condition, "02");
        assert_eq!(add.present_weather[0].quality, "1");
    }

    #[test]
    fn test_skips_known_blocks_and_stops_at_remarks() {
        let add = parse_additional(SAMPLE);
        // Every visited tag is recorded, in order, and scanning never
        // reaches into the REM section.
        assert_eq!(
            add.sections,
            vec!["AA1", "AA2", "AY1", "AY2", "GF1", "KA1", "MA1", "MD1", "MW1"]
        );
    }

    #[test]
    fn test_snow_depth_block() {
        let add = parse_additional("AJ100251100010211");
        let snow = add.snow_depth.expect("snow depth parsed");
        assert_eq!(snow.depth_cm, Some(25));
        assert_eq!(snow.condition, "1");
        assert_eq!(snow.quality, "1");
        assert_eq!(snow.equivalent_water_depth, Some(10.2));
    }

    #[test]
    fn test_truncated_block_is_dropped() {
        let add = parse_additional("AA11200");
        assert!(add.liquid_precipitation.is_empty());
    }

    #[test]
    fn test_unknown_tag_stops_scan() {
        let add = parse_additional("ZZ9whateverAA112000091");
        assert!(add.is_empty());
    }
}
