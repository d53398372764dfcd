//! WKT/EWKT codec.
//!
//! The parser accepts all seven geometry classes with optional `Z`/`M`/`ZM`
//! modifiers and an optional `SRID=n;` prefix; keywords are
//! case-insensitive. The emitter renders PostGIS-style text with a
//! process-wide fractional-digit budget.

mod wkt_reader;
mod wkt_writer;

pub(crate) use wkt_reader::parse;
pub(crate) use wkt_writer::write_geometry;

use std::sync::atomic::{AtomicUsize, Ordering};

static PRECISION: AtomicUsize = AtomicUsize::new(6);

/// Maximum number of fractional digits emitted for WKT coordinates.
pub fn wkt_precision() -> usize {
    PRECISION.load(Ordering::Relaxed)
}

/// Set the process-wide WKT precision.
///
/// Consulted at emission time only and only for WKT/EWKT; WKB and GeoJSON
/// output is unaffected. Concurrent writers merely interleave precisions.
pub fn set_wkt_precision(digits: usize) {
    PRECISION.store(digits, Ordering::Relaxed);
}
