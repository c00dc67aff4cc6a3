//! Common types and utilities shared across all century-weather services.

pub mod error;
pub mod geo;
pub mod kml;
pub mod time;

pub use error::{CenturyError, CenturyResult};
pub use geo::Coordinate;
pub use kml::KmlDocument;
pub use time::HourStamp;
