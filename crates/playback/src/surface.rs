//! The rendering surface seam.

use century_common::{Coordinate, HourStamp};

use crate::overlay::{Overlay, OverlayId};

/// The rendering widget, consumed as an opaque surface.
///
/// Implementations own all presentation; callers only add and remove
/// overlays, replace the text panels, and steer the view. Operations are
/// fire-and-forget and must not block.
pub trait RenderSurface: Send + Sync + 'static {
    /// Attach an overlay and return its handle.
    fn attach(&self, overlay: Overlay) -> OverlayId;

    /// Detach a previously attached overlay.
    fn detach(&self, id: OverlayId);

    /// Replace the displayed date label.
    fn set_date_label(&self, stamp: &HourStamp);

    /// Replace the observation text panel wholesale.
    fn set_info_text(&self, text: &str);

    /// Raise a user-visible alert.
    fn alert(&self, message: &str);

    /// Re-center the view on a coordinate.
    fn look_at(&self, coord: Coordinate);

    /// Drop a placemark at a coordinate.
    fn place_marker(&self, coord: Coordinate);
}
