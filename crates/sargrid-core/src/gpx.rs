//! GPX 1.1 serialization of a computed grid layout.
//!
//! Emits one document with a metadata block (generation time plus a bounds
//! box over every point), one named waypoint per cell center, and a single
//! track whose segments each hold exactly one two-point grid line. Output is
//! deterministic for identical inputs: element order follows the layout's
//! own ordering and coordinates are fixed to six decimal places.

use chrono::{DateTime, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use thiserror::Error;

use crate::grid::GridLayout;

/// Media type for generated grid files.
pub const GPX_MEDIA_TYPE: &str = "application/gpx+xml";

const GPX_NAMESPACE: &str = "http://www.topografix.com/GPX/1/1";
const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";
const SCHEMA_LOCATION: &str =
    "http://www.topografix.com/GPX/1/1 http://www.topografix.com/GPX/1/1/gpx.xsd";

const TRACK_NAME: &str = "Grid Lines";
const TRACK_DESC: &str = "Search area grid lines";

#[derive(Debug, Error)]
pub enum GpxError {
    #[error("i/o failure while writing the GPX document: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML writer error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("GPX document was not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Serialize a grid layout as a GPX 1.1 document.
///
/// The same `generated_at` instant is stamped on the metadata block and on
/// every point, so two calls with equal arguments produce byte-identical
/// output.
///
/// # Errors
///
/// Returns [`GpxError`] if the underlying XML writer fails; with the
/// in-memory sink used here that only happens on allocation failure.
pub fn encode(
    layout: &GridLayout,
    generated_at: DateTime<Utc>,
    creator: &str,
) -> Result<String, GpxError> {
    let stamp = generated_at.format("%Y-%m-%dT%H:%M:%SZ").to_string();
    let bounds = Bounds::of(layout);

    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut gpx = BytesStart::new("gpx");
    gpx.push_attribute(("xmlns", GPX_NAMESPACE));
    gpx.push_attribute(("creator", creator));
    gpx.push_attribute(("version", "1.1"));
    gpx.push_attribute(("xmlns:xsi", XSI_NAMESPACE));
    gpx.push_attribute(("xsi:schemaLocation", SCHEMA_LOCATION));
    writer.write_event(Event::Start(gpx))?;

    writer.write_event(Event::Start(BytesStart::new("metadata")))?;
    write_text_element(&mut writer, "time", &stamp)?;
    let mut bounds_elem = BytesStart::new("bounds");
    bounds_elem.push_attribute(("minlat", format_coord(bounds.min_lat).as_str()));
    bounds_elem.push_attribute(("minlon", format_coord(bounds.min_lon).as_str()));
    bounds_elem.push_attribute(("maxlat", format_coord(bounds.max_lat).as_str()));
    bounds_elem.push_attribute(("maxlon", format_coord(bounds.max_lon).as_str()));
    writer.write_event(Event::Empty(bounds_elem))?;
    writer.write_event(Event::End(BytesEnd::new("metadata")))?;

    for waypoint in &layout.waypoints {
        let mut wpt = BytesStart::new("wpt");
        wpt.push_attribute(("lat", format_coord(waypoint.lat).as_str()));
        wpt.push_attribute(("lon", format_coord(waypoint.lon).as_str()));
        writer.write_event(Event::Start(wpt))?;
        write_text_element(&mut writer, "time", &stamp)?;
        write_text_element(&mut writer, "name", &waypoint.label)?;
        writer.write_event(Event::End(BytesEnd::new("wpt")))?;
    }

    writer.write_event(Event::Start(BytesStart::new("trk")))?;
    write_text_element(&mut writer, "name", TRACK_NAME)?;
    write_text_element(&mut writer, "desc", TRACK_DESC)?;
    // One trkseg per grid line. Folding every line into a single segment
    // makes GPS software connect consecutive lines with diagonal strokes.
    for segment in &layout.segments {
        writer.write_event(Event::Start(BytesStart::new("trkseg")))?;
        for point in [segment.start, segment.end] {
            let mut trkpt = BytesStart::new("trkpt");
            trkpt.push_attribute(("lat", format_coord(point.lat).as_str()));
            trkpt.push_attribute(("lon", format_coord(point.lon).as_str()));
            writer.write_event(Event::Start(trkpt))?;
            write_text_element(&mut writer, "time", &stamp)?;
            writer.write_event(Event::End(BytesEnd::new("trkpt")))?;
        }
        writer.write_event(Event::End(BytesEnd::new("trkseg")))?;
    }
    writer.write_event(Event::End(BytesEnd::new("trk")))?;

    writer.write_event(Event::End(BytesEnd::new("gpx")))?;

    Ok(String::from_utf8(writer.into_inner())?)
}

fn format_coord(value: f64) -> String {
    format!("{value:.6}")
}

fn write_text_element<W: std::io::Write>(
    writer: &mut Writer<W>,
    name: &str,
    text: &str,
) -> Result<(), GpxError> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// Bounding box over every waypoint and segment endpoint.
struct Bounds {
    min_lat: f64,
    min_lon: f64,
    max_lat: f64,
    max_lon: f64,
}

impl Bounds {
    fn of(layout: &GridLayout) -> Self {
        let mut bounds = Bounds {
            min_lat: f64::INFINITY,
            min_lon: f64::INFINITY,
            max_lat: f64::NEG_INFINITY,
            max_lon: f64::NEG_INFINITY,
        };
        for waypoint in &layout.waypoints {
            bounds.include(waypoint.lat, waypoint.lon);
        }
        for segment in &layout.segments {
            bounds.include(segment.start.lat, segment.start.lon);
            bounds.include(segment.end.lat, segment.end.lon);
        }
        bounds
    }

    fn include(&mut self, lat: f64, lon: f64) {
        self.min_lat = self.min_lat.min(lat);
        self.min_lon = self.min_lon.min(lon);
        self.max_lat = self.max_lat.max(lat);
        self.max_lon = self.max_lon.max(lon);
    }
}
