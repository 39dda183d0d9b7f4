//! Search grid layout.
//!
//! Partitions the area around a center point into a labeled grid of square
//! cells and derives the geometry GPS software needs: one named waypoint per
//! cell center and one two-point segment per grid line. Cell-center and
//! horizontal-line longitudes re-derive the degree span at their own row
//! latitude so cells keep the same physical width as the grid walks north or
//! south; vertical lines keep fixed longitudes spaced at the center latitude
//! so they render straight.

use thiserror::Error;

use crate::geo::{meters_to_degrees_lat, meters_to_degrees_lon};
use crate::labels::cell_code;

/// A bare latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// A labeled cell-center point.
#[derive(Debug, Clone, PartialEq)]
pub struct Waypoint {
    pub lat: f64,
    pub lon: f64,
    /// Cell code, e.g. "A1".
    pub label: String,
}

/// One straight grid line. Both endpoints share a latitude (horizontal line)
/// or a longitude (vertical line); keeping every line as its own two-point
/// segment stops GPS software from drawing diagonal strokes between lines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: GeoPoint,
    pub end: GeoPoint,
}

/// Validation failures for grid parameters. Messages are written for the
/// operator filling in the form, not for logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GridParamsError {
    #[error("grid must have at least 1 row and 1 column")]
    EmptyGrid,

    #[error("cell size must be greater than 0 meters")]
    InvalidCellSize,

    #[error("latitude must be between -90 and 90 degrees")]
    LatitudeOutOfRange,

    #[error("longitude must be between -180 and 180 degrees")]
    LongitudeOutOfRange,
}

/// A validated set of grid parameters. Construction is the only way to get
/// one, so downstream layout code never re-checks ranges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridRequest {
    center_lat: f64,
    center_lon: f64,
    cols: u32,
    rows: u32,
    cell_size_m: f64,
}

impl GridRequest {
    /// Validate raw grid parameters.
    ///
    /// # Errors
    ///
    /// Returns the first failing check: dimensions, then cell size, then
    /// center latitude, then center longitude. NaN values fail the range
    /// checks like any other out-of-range number.
    pub fn new(
        center_lat: f64,
        center_lon: f64,
        cols: u32,
        rows: u32,
        cell_size_m: f64,
    ) -> Result<Self, GridParamsError> {
        if cols == 0 || rows == 0 {
            return Err(GridParamsError::EmptyGrid);
        }
        if !cell_size_m.is_finite() || cell_size_m <= 0.0 {
            return Err(GridParamsError::InvalidCellSize);
        }
        if !(-90.0..=90.0).contains(&center_lat) {
            return Err(GridParamsError::LatitudeOutOfRange);
        }
        if !(-180.0..=180.0).contains(&center_lon) {
            return Err(GridParamsError::LongitudeOutOfRange);
        }
        Ok(Self {
            center_lat,
            center_lon,
            cols,
            rows,
            cell_size_m,
        })
    }

    #[must_use]
    pub fn center_lat(&self) -> f64 {
        self.center_lat
    }

    #[must_use]
    pub fn center_lon(&self) -> f64 {
        self.center_lon
    }

    #[must_use]
    pub fn cols(&self) -> u32 {
        self.cols
    }

    #[must_use]
    pub fn rows(&self) -> u32 {
        self.rows
    }

    #[must_use]
    pub fn cell_size_m(&self) -> f64 {
        self.cell_size_m
    }

    /// Number of cell-center waypoints a layout of this request holds.
    /// Widened before multiplying so oversized grids cannot wrap `u32`.
    #[must_use]
    pub fn waypoint_count(&self) -> usize {
        self.cols as usize * self.rows as usize
    }

    /// Number of grid-line segments: `(rows + 1) + (cols + 1)`.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.rows as usize + self.cols as usize + 2
    }
}

/// Computed grid geometry: `cols * rows` waypoints in row-major order and
/// `(rows + 1) + (cols + 1)` grid-line segments.
#[derive(Debug, Clone, PartialEq)]
pub struct GridLayout {
    pub waypoints: Vec<Waypoint>,
    pub segments: Vec<Segment>,
}

/// Compute the full grid geometry for a validated request.
#[must_use]
pub fn layout(request: &GridRequest) -> GridLayout {
    let cell = request.cell_size_m();
    let width_m = f64::from(request.cols()) * cell;
    let height_m = f64::from(request.rows()) * cell;

    let cell_height_deg = meters_to_degrees_lat(cell);
    let top_lat = request.center_lat() + meters_to_degrees_lat(height_m / 2.0);
    let bottom_lat = request.center_lat() - meters_to_degrees_lat(height_m / 2.0);
    let left_lon =
        request.center_lon() - meters_to_degrees_lon(width_m / 2.0, request.center_lat());

    let mut waypoints = Vec::with_capacity(request.waypoint_count());
    for row in 0..request.rows() {
        let lat = top_lat - (f64::from(row) + 0.5) * cell_height_deg;
        let cell_width_deg = meters_to_degrees_lon(cell, lat);
        for col in 0..request.cols() {
            let lon = left_lon + (f64::from(col) + 0.5) * cell_width_deg;
            waypoints.push(Waypoint {
                lat,
                lon,
                label: cell_code(col, row),
            });
        }
    }

    let mut segments = Vec::with_capacity(request.segment_count());
    // Horizontal lines span the grid width measured at their own latitude.
    for line in 0..=request.rows() {
        let lat = top_lat - f64::from(line) * cell_height_deg;
        let right_lon = left_lon + meters_to_degrees_lon(width_m, lat);
        segments.push(Segment {
            start: GeoPoint { lat, lon: left_lon },
            end: GeoPoint {
                lat,
                lon: right_lon,
            },
        });
    }
    // Vertical lines run top to bottom at fixed longitudes.
    let cell_width_deg = meters_to_degrees_lon(cell, request.center_lat());
    for line in 0..=request.cols() {
        let lon = left_lon + f64::from(line) * cell_width_deg;
        segments.push(Segment {
            start: GeoPoint { lat: top_lat, lon },
            end: GeoPoint {
                lat: bottom_lat,
                lon,
            },
        });
    }

    GridLayout {
        waypoints,
        segments,
    }
}
