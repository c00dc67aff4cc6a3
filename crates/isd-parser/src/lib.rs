//! Parser for NOAA ISD (Integrated Surface Data) hourly observation records.
//!
//! Each record is one line of fixed-width text: a mandatory section with the
//! station identity, timestamp, position and the core readings, optionally
//! followed by tagged additional-data blocks and free-form remarks.

pub mod additional;
pub mod record;

pub use additional::AdditionalData;
pub use record::{parse_record, Measurement, ObservationRecord, RawPosition};
