//! GeoJSON codec over a generic `serde_json` tree.
//!
//! Geometries are exchanged as RFC 7946 objects: `type` plus `coordinates`
//! (`geometries` for collections). The M dimension is not representable and
//! is dropped in both directions; Z travels as 3-element positions. A
//! document without a `crs` member implies WGS 84, but no SRID is assumed
//! on read unless the caller supplies one.

mod geojson_reader;
mod geojson_writer;

pub(crate) use geojson_reader::read_geometry;
pub(crate) use geojson_writer::write_geometry;
