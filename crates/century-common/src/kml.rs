//! Minimal KML generation for station markers and region outlines.
//!
//! Documents are assembled as strings, the same way the service's other XML
//! responses are. Only the elements the overlay endpoints need exist here:
//! point placemarks for one hour of stations, and polygon placemarks for a
//! region outline.

use std::fmt::Write as _;

/// Content type for KML payloads.
pub const KML_CONTENT_TYPE: &str = "application/vnd.google-earth.kml+xml";

/// Escape text for use in XML character data and attribute values.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// An in-progress KML document.
pub struct KmlDocument {
    name: String,
    body: String,
    placemarks: usize,
}

impl KmlDocument {
    pub fn new(name: &str) -> Self {
        Self {
            name: escape(name),
            body: String::new(),
            placemarks: 0,
        }
    }

    /// Number of placemarks appended so far.
    pub fn len(&self) -> usize {
        self.placemarks
    }

    pub fn is_empty(&self) -> bool {
        self.placemarks == 0
    }

    /// Append a point placemark.
    ///
    /// GeoJSON and KML agree on the order: (longitude, latitude).
    pub fn point(&mut self, id: &str, name: &str, lng: f64, lat: f64) {
        let _ = write!(
            self.body,
            "<Placemark id=\"{id}\"><name>{name}</name>\
             <Point><coordinates>{lng},{lat}</coordinates></Point></Placemark>",
            id = escape(id),
            name = escape(name),
        );
        self.placemarks += 1;
    }

    /// Append a polygon placemark from outer rings.
    ///
    /// Each ring is a closed sequence of [longitude, latitude] positions. A
    /// feature with several rings (a MultiPolygon's parts) becomes one
    /// placemark with a MultiGeometry.
    pub fn polygon(&mut self, name: &str, rings: &[Vec<[f64; 2]>]) {
        self.body.push_str("<Placemark><name>");
        self.body.push_str(&escape(name));
        self.body.push_str("</name><MultiGeometry>");
        for ring in rings {
            self.body
                .push_str("<Polygon><outerBoundaryIs><LinearRing><coordinates>");
            for (i, pos) in ring.iter().enumerate() {
                if i > 0 {
                    self.body.push(' ');
                }
                let _ = write!(self.body, "{},{}", pos[0], pos[1]);
            }
            self.body
                .push_str("</coordinates></LinearRing></outerBoundaryIs></Polygon>");
        }
        self.body.push_str("</MultiGeometry></Placemark>");
        self.placemarks += 1;
    }

    /// Finish the document.
    pub fn into_string(self) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <kml xmlns=\"http://www.opengis.net/kml/2.2\">\
             <Document><name>{}</name>{}</Document></kml>",
            self.name, self.body
        )
    }
}
