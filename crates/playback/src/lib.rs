//! Temporal playback over hourly weather snapshots.
//!
//! The controller walks forward through hourly overlays, swapping each onto
//! a rendering surface, and supports cancellation and restart through a
//! generation token: every chain captures the generation current when it
//! started, and any step or response whose captured token no longer matches
//! the live value is discarded without side effects. That check-on-resume is
//! the sole cancellation mechanism; in-flight requests are never aborted,
//! their results are simply ignored on arrival.

pub mod controller;
pub mod fetch;
pub mod info;
pub mod overlay;
pub mod surface;

pub use controller::{PlaybackController, DEFAULT_STEP_DELAY};
pub use fetch::{FetchError, InfoFetcher, OverlayFetcher};
pub use info::InfoPanel;
pub use overlay::{Overlay, OverlayId, OverlayKind};
pub use surface::RenderSurface;
