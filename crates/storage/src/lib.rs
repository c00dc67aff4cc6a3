//! PostgreSQL-backed observation and region store.

pub mod regions;
pub mod store;

pub use regions::RegionFeature;
pub use store::{ObservationStore, ObservationSummary, StationPosition, StationSpan};
