//! The public [`Geometry`] facade: construction from any supported
//! representation, the lazy WKB header fast path, cache coherence and
//! emission.
//!
//! A geometry built from WKB/EWKB bytes decodes only the record header
//! (endian byte, type word, optional SRID: at most 9 bytes) and retains
//! the source buffer. Header reads are served without touching the buffer
//! again; the first structural read parses the whole record and drops the
//! buffer; any mutation drops it as well, so the next binary emission
//! re-encodes from the model.

use crate::error::{PggeomError, Result};
use crate::model::{
    GeometryCollection, GeometryType, GeometryValue, Head, LineString, MultiLineString,
    MultiPoint, MultiPolygon, Point, Polygon,
};
use crate::shape::GeoShape;
use crate::wkb::{self, WkbDialect};
use crate::{geojson, wkt};
use serde_json::Value;
use std::borrow::Cow;

/// A geometry of any class, possibly still backed by undecoded WKB.
#[derive(Debug, Clone)]
pub struct Geometry {
    repr: Repr,
}

#[derive(Debug, Clone)]
enum Repr {
    /// Built from WKB: header decoded, children pending in `wkb`.
    Lazy(LazyWkb),
    Full(GeometryValue),
}

#[derive(Debug, Clone)]
struct LazyWkb {
    tag: GeometryType,
    head: Head,
    wkb: Vec<u8>,
    /// The buffer still matches the logical value and may be served
    /// verbatim.
    cache_ok: bool,
    /// The buffer's own header carries an SRID.
    has_srid: bool,
}

/// Input accepted by [`Geometry::new`].
pub enum GeomInput<'a> {
    /// Hex-encoded EWKB/WKB or WKT/EWKT, told apart by content.
    Text(&'a str),
    /// Raw WKB/EWKB bytes.
    Bytes(&'a [u8]),
    /// A GeoJSON object tree.
    Json(&'a Value),
}

impl<'a> From<&'a str> for GeomInput<'a> {
    fn from(s: &'a str) -> Self {
        GeomInput::Text(s)
    }
}

impl<'a> From<&'a [u8]> for GeomInput<'a> {
    fn from(b: &'a [u8]) -> Self {
        GeomInput::Bytes(b)
    }
}

impl<'a> From<&'a Value> for GeomInput<'a> {
    fn from(v: &'a Value) -> Self {
        GeomInput::Json(v)
    }
}

impl Geometry {
    /// Single construction entry point, dispatching on the input form.
    ///
    /// A string of hex digits is decoded as hex-encoded WKB, any other
    /// string as WKT/EWKT; bytes are WKB; a JSON object with a `type`
    /// member is GeoJSON. The explicit `srid` overrides an SRID implied by
    /// the representation, without error.
    pub fn new<'a>(input: impl Into<GeomInput<'a>>, srid: Option<i32>) -> Result<Geometry> {
        match input.into() {
            GeomInput::Text(s) => {
                if !s.is_empty() && s.bytes().all(|b| b.is_ascii_hexdigit()) {
                    Self::from_hex(s, srid)
                } else {
                    Self::from_wkt(s, srid)
                }
            }
            GeomInput::Bytes(b) => Self::from_wkb(b, srid),
            GeomInput::Json(v) => {
                if v.get("type").is_some() {
                    Self::from_geojson(v, srid)
                } else {
                    Err(PggeomError::Wkb("unsupported input value".to_string()))
                }
            }
        }
    }

    /// Decode hex-encoded WKB/EWKB, reading only the record header.
    pub fn from_hex(s: &str, srid: Option<i32>) -> Result<Geometry> {
        Self::from_wkb_buf(wkb::decode_hex(s)?, srid)
    }

    /// Decode WKB/EWKB bytes, reading only the record header.
    pub fn from_wkb(bytes: &[u8], srid: Option<i32>) -> Result<Geometry> {
        Self::from_wkb_buf(bytes.to_vec(), srid)
    }

    fn from_wkb_buf(buf: Vec<u8>, srid: Option<i32>) -> Result<Geometry> {
        let header = wkb::read_header(&buf)?;
        log::debug!(
            "lazy {} from {} WKB bytes (srid {:?})",
            header.tag.as_str(),
            buf.len(),
            header.head.srid
        );
        let mut head = header.head;
        let mut cache_ok = true;
        if let Some(over) = srid {
            if head.srid.is_some_and(|derived| derived != over) {
                log::warn!(
                    "explicit SRID {over} overrides SRID {} from the WKB header",
                    head.srid.unwrap_or_default()
                );
            }
            if head.srid != Some(over) {
                head.srid = Some(over);
                cache_ok = false;
            }
        }
        Ok(Geometry {
            repr: Repr::Lazy(LazyWkb {
                tag: header.tag,
                head,
                wkb: buf,
                cache_ok,
                has_srid: header.has_srid,
            }),
        })
    }

    /// Parse WKT or EWKT.
    pub fn from_wkt(s: &str, srid: Option<i32>) -> Result<Geometry> {
        let mut value = wkt::parse(s)?;
        apply_srid_override(value.head_mut(), srid);
        Ok(Geometry {
            repr: Repr::Full(value),
        })
    }

    /// Decode a GeoJSON object tree. The document implies WGS 84, but no
    /// SRID is recorded unless `srid` is given.
    pub fn from_geojson(value: &Value, srid: Option<i32>) -> Result<Geometry> {
        let mut v = geojson::read_geometry(value)?;
        if srid.is_some() {
            v.head_mut().srid = srid;
        }
        Ok(Geometry { repr: Repr::Full(v) })
    }

    /// Convert a foreign shape through its geometry-interface mapping.
    pub fn from_shape<S: GeoShape + ?Sized>(shape: &S, srid: Option<i32>) -> Result<Geometry> {
        let map = shape.geo_interface().ok_or_else(|| {
            PggeomError::Dependency(
                "shape does not expose a geometry interface mapping".to_string(),
            )
        })?;
        Self::from_geojson(&map, srid)
    }

    // --- header reads; these never touch the retained buffer

    /// Geometry class tag.
    pub fn geometry_type(&self) -> GeometryType {
        match &self.repr {
            Repr::Lazy(l) => l.tag,
            Repr::Full(v) => v.geometry_type(),
        }
    }

    /// Spatial reference identifier, if any.
    pub fn srid(&self) -> Option<i32> {
        self.head().srid
    }

    /// Whether a Z dimension is declared.
    pub fn dimz(&self) -> bool {
        self.head().dimz
    }

    /// Whether an M dimension is declared.
    pub fn dimm(&self) -> bool {
        self.head().dimm
    }

    pub(crate) fn head(&self) -> Head {
        match &self.repr {
            Repr::Lazy(l) => l.head,
            Repr::Full(v) => *v.head(),
        }
    }

    /// The retained source bytes, present until a structural read or a
    /// mutation invalidates them.
    pub fn cached_wkb(&self) -> Option<&[u8]> {
        match &self.repr {
            Repr::Lazy(l) if l.cache_ok => Some(&l.wkb),
            _ => None,
        }
    }

    // --- mutation; every setter invalidates the retained buffer

    /// Set or clear the SRID. Does not descend into members.
    pub fn set_srid(&mut self, srid: Option<i32>) {
        match &mut self.repr {
            Repr::Lazy(l) => {
                l.head.srid = srid;
                l.cache_ok = false;
            }
            Repr::Full(v) => v.head_mut().srid = srid,
        }
    }

    /// Declare the Z dimension, zero-filling it on every reachable point.
    /// A declared dimension cannot be removed.
    pub fn set_dimz(&mut self, dimz: bool) -> Result<()> {
        if dimz == self.dimz() {
            return Ok(());
        }
        if !dimz {
            return Err(PggeomError::Dimensionality(
                "the Z dimension cannot be removed once declared".to_string(),
            ));
        }
        self.value_mut()?.lift_z()
    }

    /// Declare the M dimension, zero-filling it on every reachable point.
    /// A declared dimension cannot be removed.
    pub fn set_dimm(&mut self, dimm: bool) -> Result<()> {
        if dimm == self.dimm() {
            return Ok(());
        }
        if !dimm {
            return Err(PggeomError::Dimensionality(
                "the M dimension cannot be removed once declared".to_string(),
            ));
        }
        self.value_mut()?.lift_m()
    }

    pub(crate) fn lift_z(&mut self) -> Result<()> {
        self.value_mut()?.lift_z()
    }

    pub(crate) fn lift_m(&mut self) -> Result<()> {
        self.value_mut()?.lift_m()
    }

    // --- structural access; materializes and drops the retained buffer

    fn materialize(&mut self) -> Result<()> {
        if let Repr::Lazy(l) = &self.repr {
            log::debug!(
                "materializing a lazy {} from {} WKB bytes",
                l.tag.as_str(),
                l.wkb.len()
            );
            let mut value = wkb::read_geometry(&l.wkb)?;
            *value.head_mut() = l.head;
            self.repr = Repr::Full(value);
        }
        Ok(())
    }

    /// The materialized value. Parses the retained WKB on first use and
    /// drops it.
    pub fn value(&mut self) -> Result<&GeometryValue> {
        self.materialize()?;
        let Repr::Full(v) = &self.repr else {
            unreachable!()
        };
        Ok(v)
    }

    /// Mutable access to the materialized value.
    pub fn value_mut(&mut self) -> Result<&mut GeometryValue> {
        self.materialize()?;
        let Repr::Full(v) = &mut self.repr else {
            unreachable!()
        };
        Ok(v)
    }

    /// Consume the geometry, yielding the materialized value.
    pub fn into_value(mut self) -> Result<GeometryValue> {
        self.materialize()?;
        let Repr::Full(v) = self.repr else {
            unreachable!()
        };
        Ok(v)
    }

    /// A decoded view that leaves the retained buffer untouched: lazy
    /// geometries decode into a temporary.
    pub(crate) fn snapshot(&self) -> Result<Cow<'_, GeometryValue>> {
        match &self.repr {
            Repr::Full(v) => Ok(Cow::Borrowed(v)),
            Repr::Lazy(l) => {
                let mut value = wkb::read_geometry(&l.wkb)?;
                *value.head_mut() = l.head;
                Ok(Cow::Owned(value))
            }
        }
    }

    // --- emission

    /// Little-endian OGC WKB; the SRID is never written.
    pub fn to_wkb(&self) -> Result<Vec<u8>> {
        if let Repr::Lazy(l) = &self.repr {
            if l.cache_ok && !l.has_srid {
                return Ok(l.wkb.clone());
            }
        }
        wkb::write_geometry(self.snapshot()?.as_ref(), WkbDialect::Wkb)
    }

    /// Little-endian EWKB; the outermost header carries the SRID when one
    /// is set. Served from the retained buffer while it is valid.
    pub fn to_ewkb(&self) -> Result<Vec<u8>> {
        if let Repr::Lazy(l) = &self.repr {
            if l.cache_ok {
                return Ok(l.wkb.clone());
            }
        }
        wkb::write_geometry(self.snapshot()?.as_ref(), WkbDialect::Ewkb)
    }

    /// Lowercase hex-encoded EWKB, the form PostGIS exchanges with SQL.
    pub fn to_hex(&self) -> Result<String> {
        Ok(hex::encode(self.to_ewkb()?))
    }

    /// WKT without an SRID prefix.
    pub fn to_wkt(&self) -> Result<String> {
        wkt::write_geometry(self.snapshot()?.as_ref(), false)
    }

    /// EWKT: WKT with an `SRID=n;` prefix when an SRID is set.
    pub fn to_ewkt(&self) -> Result<String> {
        wkt::write_geometry(self.snapshot()?.as_ref(), true)
    }

    /// RFC 7946 GeoJSON object tree. Materializes the geometry; the M
    /// dimension is dropped.
    pub fn to_geojson(&mut self) -> Result<Value> {
        geojson::write_geometry(self.value()?)
    }

    /// `__geo_interface__`-style mapping of the geometry.
    pub fn to_shape(&mut self) -> Result<Value> {
        self.to_geojson()
    }

    /// Axis-aligned XY extent over all coordinates. Materializes the
    /// geometry.
    pub fn bounds(&mut self) -> Result<Bounds> {
        let mut bounds = None;
        collect_bounds(self.value_mut()?, &mut bounds)?;
        bounds.ok_or_else(|| {
            PggeomError::Coordinate("geometry has no coordinates".to_string())
        })
    }
}

fn apply_srid_override(head: &mut Head, srid: Option<i32>) {
    if let Some(over) = srid {
        if head.srid.is_some_and(|derived| derived != over) {
            log::warn!(
                "explicit SRID {over} overrides SRID {} from the input",
                head.srid.unwrap_or_default()
            );
        }
        head.srid = Some(over);
    }
}

/// Structural equality over class, header and coordinates. Lazy geometries
/// compare through an ephemeral decode; undecodable buffers compare
/// unequal.
impl PartialEq for Geometry {
    fn eq(&self, other: &Geometry) -> bool {
        match (self.snapshot(), other.snapshot()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}

impl From<GeometryValue> for Geometry {
    fn from(value: GeometryValue) -> Geometry {
        Geometry {
            repr: Repr::Full(value),
        }
    }
}

macro_rules! impl_from_struct {
    ($t:ident) => {
        impl From<$t> for Geometry {
            fn from(g: $t) -> Geometry {
                Geometry::from(GeometryValue::from(g))
            }
        }
    };
}

impl_from_struct!(Point);
impl_from_struct!(LineString);
impl_from_struct!(Polygon);
impl_from_struct!(MultiPoint);
impl_from_struct!(MultiLineString);
impl_from_struct!(MultiPolygon);
impl_from_struct!(GeometryCollection);

/// Axis-aligned XY extent of a geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

impl Bounds {
    fn from_xy(x: f64, y: f64) -> Self {
        Bounds {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
        }
    }

    fn extend(&mut self, x: f64, y: f64) {
        if x < self.min_x {
            self.min_x = x;
        }
        if x > self.max_x {
            self.max_x = x;
        }
        if y < self.min_y {
            self.min_y = y;
        }
        if y > self.max_y {
            self.max_y = y;
        }
    }

    pub fn min_x(&self) -> f64 {
        self.min_x
    }

    pub fn min_y(&self) -> f64 {
        self.min_y
    }

    pub fn max_x(&self) -> f64 {
        self.max_x
    }

    pub fn max_y(&self) -> f64 {
        self.max_y
    }
}

fn extend_xy(bounds: &mut Option<Bounds>, x: f64, y: f64) {
    match bounds {
        Some(b) => b.extend(x, y),
        None => *bounds = Some(Bounds::from_xy(x, y)),
    }
}

fn collect_bounds(value: &mut GeometryValue, bounds: &mut Option<Bounds>) -> Result<()> {
    match value {
        GeometryValue::Point(p) => extend_xy(bounds, p.x(), p.y()),
        GeometryValue::LineString(ls) => {
            for p in ls.points() {
                extend_xy(bounds, p.x(), p.y());
            }
        }
        GeometryValue::Polygon(pg) => {
            for ring in pg.rings() {
                for p in ring.points() {
                    extend_xy(bounds, p.x(), p.y());
                }
            }
        }
        GeometryValue::MultiPoint(mp) => {
            for p in mp.points() {
                extend_xy(bounds, p.x(), p.y());
            }
        }
        GeometryValue::MultiLineString(mls) => {
            for ls in mls.lines() {
                for p in ls.points() {
                    extend_xy(bounds, p.x(), p.y());
                }
            }
        }
        GeometryValue::MultiPolygon(mp) => {
            for pg in mp.polygons() {
                for ring in pg.rings() {
                    for p in ring.points() {
                        extend_xy(bounds, p.x(), p.y());
                    }
                }
            }
        }
        GeometryValue::GeometryCollection(gc) => {
            for g in gc.geometries_mut() {
                collect_bounds(g.value_mut()?, bounds)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    const POINT_2D: &str = "01010000000000000000004AC00000000000000000";

    #[test]
    fn header_reads_keep_the_cache() {
        let geom = Geometry::from_hex(POINT_2D, None).unwrap();
        assert_eq!(geom.geometry_type(), GeometryType::Point);
        assert_eq!(geom.srid(), None);
        assert!(!geom.dimz());
        assert!(!geom.dimm());
        assert!(geom.cached_wkb().is_some());
    }

    #[test]
    fn structural_reads_drop_the_cache() {
        let mut geom = Geometry::from_hex(POINT_2D, None).unwrap();
        let GeometryValue::Point(p) = geom.value().unwrap() else {
            panic!("expected a Point");
        };
        assert_eq!(p.x(), -52.0);
        assert!(geom.cached_wkb().is_none());
        // re-encoding still works from the model
        assert_eq!(geom.to_hex().unwrap(), POINT_2D.to_lowercase());
    }

    #[test]
    fn text_emission_keeps_the_cache() {
        let geom = Geometry::from_hex(POINT_2D, None).unwrap();
        assert_eq!(geom.to_wkt().unwrap(), "POINT (-52 0)");
        assert!(geom.cached_wkb().is_some());
    }

    #[test]
    fn mutation_drops_the_cache() {
        let mut geom = Geometry::from_hex(POINT_2D, None).unwrap();
        geom.set_srid(Some(4326));
        assert!(geom.cached_wkb().is_none());
        assert_eq!(geom.srid(), Some(4326));
        assert_eq!(
            geom.to_hex().unwrap(),
            "0101000020e61000000000000000004ac00000000000000000"
        );
    }

    #[test]
    fn hex_round_trips_verbatim() {
        // upper-case and big-endian input round-trip byte for byte
        let geom = Geometry::from_hex("00000000014024000000000000C034000000000000", None).unwrap();
        assert_eq!(
            geom.to_hex().unwrap(),
            "00000000014024000000000000c034000000000000"
        );
    }

    #[test]
    fn srid_override_wins_without_error() {
        // SELECT 'SRID=4326;POINT(10 -20)'::geometry
        let hex = "0101000020E6100000000000000000244000000000000034C0";
        let geom = Geometry::from_hex(hex, Some(3857)).unwrap();
        assert_eq!(geom.srid(), Some(3857));
        // the stale buffer is not served
        assert!(geom.cached_wkb().is_none());
        assert_eq!(
            geom.to_hex().unwrap(),
            "0101000020110f0000000000000000244000000000000034c0"
        );
        // a matching override keeps the cache
        let geom = Geometry::from_hex(hex, Some(4326)).unwrap();
        assert!(geom.cached_wkb().is_some());
    }

    #[test]
    fn plain_wkb_from_an_srid_cache_reencodes() {
        // SELECT 'SRID=4326;POINT(10 -20)'::geometry
        let geom =
            Geometry::from_hex("0101000020E6100000000000000000244000000000000034C0", None)
                .unwrap();
        assert_eq!(
            hex::encode(geom.to_wkb().unwrap()),
            "0101000000000000000000244000000000000034c0"
        );
        // the EWKB request is still served from the cache
        assert!(geom.cached_wkb().is_some());
    }

    #[test]
    fn facade_dispatch() {
        assert_eq!(
            Geometry::new(POINT_2D, None).unwrap().geometry_type(),
            GeometryType::Point
        );
        assert_eq!(
            Geometry::new("POINT (-52 0)", None).unwrap().geometry_type(),
            GeometryType::Point
        );
        let bytes = hex::decode(POINT_2D).unwrap();
        assert_eq!(
            Geometry::new(bytes.as_slice(), None)
                .unwrap()
                .geometry_type(),
            GeometryType::Point
        );
        let doc = json!({"type": "Point", "coordinates": [1.0, 2.0]});
        assert_eq!(
            Geometry::new(&doc, Some(4326)).unwrap().srid(),
            Some(4326)
        );
        let not_geojson = json!({"kind": "nothing"});
        assert!(matches!(
            Geometry::new(&not_geojson, None),
            Err(PggeomError::Wkb(_))
        ));
        // odd-length hex-looking strings go to the hex decoder and fail there
        assert!(matches!(
            Geometry::new("abc", None),
            Err(PggeomError::Wkb(_))
        ));
    }

    #[test]
    fn equality_across_laziness() {
        let lazy = Geometry::from_hex(POINT_2D, None).unwrap();
        let parsed = Geometry::from_wkt("POINT (-52 0)", None).unwrap();
        assert_eq!(lazy, parsed);
        assert!(lazy.cached_wkb().is_some());

        let other = Geometry::from_wkt("POINT (-52 1)", None).unwrap();
        assert_ne!(lazy, other);
    }

    #[test]
    fn shape_bridge() {
        let doc = json!({"type": "Point", "coordinates": [1.0, 2.0]});
        let mut geom = Geometry::from_shape(&doc, None).unwrap();
        assert_eq!(geom.to_shape().unwrap(), doc);

        struct Opaque;
        impl crate::GeoShape for Opaque {
            fn geo_interface(&self) -> Option<Value> {
                None
            }
        }
        assert!(matches!(
            Geometry::from_shape(&Opaque, None),
            Err(PggeomError::Dependency(_))
        ));
    }

    #[test]
    fn bounds() {
        let mut geom = Geometry::from_wkt(
            "GEOMETRYCOLLECTION (POINT (1 2), LINESTRING (0 -3, 4 1))",
            None,
        )
        .unwrap();
        let bounds = geom.bounds().unwrap();
        assert_eq!(
            (bounds.min_x(), bounds.min_y(), bounds.max_x(), bounds.max_y()),
            (0.0, -3.0, 4.0, 2.0)
        );
    }

    #[test]
    fn set_dim_on_lazy_materializes() {
        // SELECT 'MULTIPOINT(0 0, 1 1)'::geometry
        let hex = "010400000002000000010100000000000000000000000000000000000000010100000000000000\
                   0000f03f000000000000f03f";
        let mut geom = Geometry::from_hex(hex, None).unwrap();
        geom.set_dimz(true).unwrap();
        assert!(geom.cached_wkb().is_none());
        assert_eq!(geom.to_wkt().unwrap(), "MULTIPOINT Z (0 0 0, 1 1 0)");
        assert!(matches!(
            geom.set_dimz(false),
            Err(PggeomError::Dimensionality(_))
        ));
    }
}
