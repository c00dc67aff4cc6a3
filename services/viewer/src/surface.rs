//! Terminal rendition of the rendering surface.

use std::sync::atomic::{AtomicU64, Ordering};

use century_common::{Coordinate, HourStamp};
use playback::{Overlay, OverlayId, OverlayKind, RenderSurface};

/// Prints every surface operation as one line; the overlay ids it issues
/// behave like the opaque feature handles of a real map widget.
#[derive(Default)]
pub struct TerminalSurface {
    next_id: AtomicU64,
}

impl RenderSurface for TerminalSurface {
    fn attach(&self, overlay: Overlay) -> OverlayId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let kind = match overlay.kind {
            OverlayKind::Markers => "markers",
            OverlayKind::Region => "region",
        };
        println!(
            "[overlay +{}] {} '{}' ({} bytes)",
            id,
            kind,
            overlay.name,
            overlay.kml.len()
        );
        OverlayId(id)
    }

    fn detach(&self, id: OverlayId) {
        println!("[overlay -{}]", id.0);
    }

    fn set_date_label(&self, stamp: &HourStamp) {
        println!("[date] {}", stamp);
    }

    fn set_info_text(&self, text: &str) {
        println!("[info] {}", text);
    }

    fn alert(&self, message: &str) {
        eprintln!("[alert] {}", message);
    }

    fn look_at(&self, coord: Coordinate) {
        println!("[view] centered on ({:.4}, {:.4})", coord.lat, coord.lng);
    }

    fn place_marker(&self, coord: Coordinate) {
        println!("[marker] ({:.4}, {:.4})", coord.lat, coord.lng);
    }
}
