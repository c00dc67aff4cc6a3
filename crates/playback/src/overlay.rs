//! Overlay payloads and handles.

use bytes::Bytes;

/// The kinds of overlay a surface holds, at most one of each at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverlayKind {
    /// Weather station markers for one hour.
    Markers,
    /// A region outline.
    Region,
}

/// Handle for an attached overlay, issued by the render surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OverlayId(pub u64);

/// A renderable geospatial payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub kind: OverlayKind,
    pub name: String,
    pub kml: Bytes,
}

impl Overlay {
    pub fn markers(name: impl Into<String>, kml: impl Into<Bytes>) -> Self {
        Self {
            kind: OverlayKind::Markers,
            name: name.into(),
            kml: kml.into(),
        }
    }

    pub fn region(name: impl Into<String>, kml: impl Into<Bytes>) -> Self {
        Self {
            kind: OverlayKind::Region,
            name: name.into(),
            kml: kml.into(),
        }
    }
}
