//! PostGIS geometry codec: one in-memory model with EWKB/WKB, WKT/EWKT and
//! GeoJSON conversions.
//!
//! The model is a closed sum over the seven OGC Simple Features classes
//! (point, line string, polygon, their multi variants and the geometry
//! collection), each carrying an optional SRID and Z/M dimensionality
//! flags. Curved primitives and surfaces are out of scope.
//!
//! Construction from WKB or hex-encoded EWKB decodes only the record
//! header: type, SRID and dimensionality are available without touching a
//! coordinate, and the source bytes are served back verbatim until a
//! structural read or a mutation invalidates them.
//!
//! ```
//! use pggeom::{Geometry, GeometryType};
//!
//! # fn main() -> pggeom::Result<()> {
//! // SELECT 'POINT(-52 0)'::geometry
//! let geom = Geometry::new("01010000000000000000004AC00000000000000000", None)?;
//! assert_eq!(geom.geometry_type(), GeometryType::Point);
//! assert_eq!(geom.srid(), None);
//! assert_eq!(geom.to_wkt()?, "POINT (-52 0)");
//! # Ok(())
//! # }
//! ```
//!
//! Geometries can also be built from coordinates and combined:
//!
//! ```
//! use pggeom::{Geometry, MultiPoint, Point};
//!
//! # fn main() -> pggeom::Result<()> {
//! let mut mp = MultiPoint::new(
//!     vec![Point::new(&[0.0, 0.0], None)?, Point::new(&[1.0, 1.0], None)?],
//!     Some(4326),
//! )?;
//! mp.set_dimz(true)?;
//! assert_eq!(
//!     Geometry::from(mp).to_ewkt()?,
//!     "SRID=4326;MULTIPOINT Z (0 0 0, 1 1 0)"
//! );
//! # Ok(())
//! # }
//! ```

pub mod error;
#[cfg(feature = "with-geo")]
mod geo;
mod geojson;
mod geometry;
mod model;
mod shape;
mod wkb;
mod wkt;

pub use error::{PggeomError, Result};
pub use geometry::{Bounds, GeomInput, Geometry};
pub use model::{
    GeometryCollection, GeometryType, GeometryValue, LineString, MultiLineString, MultiPoint,
    MultiPolygon, Point, Polygon,
};
pub use shape::GeoShape;
pub use wkt::{set_wkt_precision, wkt_precision};
