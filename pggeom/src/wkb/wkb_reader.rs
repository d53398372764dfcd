use crate::error::{PggeomError, Result};
use crate::geometry::Geometry;
use crate::model::{
    GeometryCollection, GeometryType, GeometryValue, Head, LineString, MultiLineString,
    MultiPoint, MultiPolygon, Point, Polygon,
};
use crate::wkb::{FLAG_M, FLAG_SRID, FLAG_Z};
use scroll::{Endian, Pread};

/// Bounds-checked reader over a WKB buffer, tracking its offset for error
/// reports.
pub(crate) struct ByteCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        ByteCursor { buf, pos: 0 }
    }

    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    fn u8(&mut self) -> Result<u8> {
        let pos = self.pos;
        self.buf
            .gread_with::<u8>(&mut self.pos, scroll::LE)
            .map_err(|_| short_read(pos))
    }

    fn u32(&mut self, endian: Endian) -> Result<u32> {
        let pos = self.pos;
        self.buf
            .gread_with::<u32>(&mut self.pos, endian)
            .map_err(|_| short_read(pos))
    }

    fn i32(&mut self, endian: Endian) -> Result<i32> {
        let pos = self.pos;
        self.buf
            .gread_with::<i32>(&mut self.pos, endian)
            .map_err(|_| short_read(pos))
    }

    fn f64(&mut self, endian: Endian) -> Result<f64> {
        let pos = self.pos;
        self.buf
            .gread_with::<f64>(&mut self.pos, endian)
            .map_err(|_| short_read(pos))
    }
}

fn short_read(pos: usize) -> PggeomError {
    PggeomError::Wkb(format!("unexpected end of WKB at byte {pos}"))
}

fn read_endian(cur: &mut ByteCursor) -> Result<Endian> {
    let at = cur.pos();
    match cur.u8()? {
        0 => Ok(scroll::BE),
        1 => Ok(scroll::LE),
        b => Err(PggeomError::Wkb(format!(
            "invalid endian byte {b:#04x} at byte {at}"
        ))),
    }
}

struct TypeWord {
    tag: GeometryType,
    dimz: bool,
    dimm: bool,
    has_srid: bool,
}

fn decode_type_word(word: u32, at: usize) -> Result<TypeWord> {
    let tag = GeometryType::from_u32(word & 0xFF).ok_or_else(|| {
        PggeomError::Wkb(format!(
            "unsupported geometry type {} at byte {at}",
            word & 0xFF
        ))
    })?;
    if word & !(0xFF | FLAG_Z | FLAG_M | FLAG_SRID) != 0 {
        return Err(PggeomError::Wkb(format!(
            "stray flag bits in type word {word:#010x} at byte {at}"
        )));
    }
    Ok(TypeWord {
        tag,
        dimz: word & FLAG_Z != 0,
        dimm: word & FLAG_M != 0,
        has_srid: word & FLAG_SRID != 0,
    })
}

/// The outer record header: endian byte, type word and optional SRID.
#[derive(Debug)]
pub(crate) struct WkbHeader {
    pub tag: GeometryType,
    pub head: Head,
    pub has_srid: bool,
}

/// Decode only the leading header of a record (at most 9 bytes). This is
/// the lazy fast path: type, SRID and dimensionality without touching any
/// coordinate.
pub(crate) fn read_header(buf: &[u8]) -> Result<WkbHeader> {
    let mut cur = ByteCursor::new(buf);
    let endian = read_endian(&mut cur)?;
    let word = cur.u32(endian)?;
    let tw = decode_type_word(word, 1)?;
    let srid = if tw.has_srid {
        Some(cur.i32(endian)?)
    } else {
        None
    };
    Ok(WkbHeader {
        tag: tw.tag,
        head: Head {
            srid,
            dimz: tw.dimz,
            dimm: tw.dimm,
        },
        has_srid: tw.has_srid,
    })
}

/// Decode a whole record recursively.
pub(crate) fn read_geometry(buf: &[u8]) -> Result<GeometryValue> {
    let mut cur = ByteCursor::new(buf);
    read_geom(&mut cur, None)
}

/// `parent` carries the container's dimensionality for nested records, which
/// must agree and must not declare their own SRID.
fn read_geom(cur: &mut ByteCursor, parent: Option<(bool, bool)>) -> Result<GeometryValue> {
    let start = cur.pos();
    let endian = read_endian(cur)?;
    let word = cur.u32(endian)?;
    let tw = decode_type_word(word, start)?;
    if parent.is_some() && tw.has_srid {
        return Err(PggeomError::Wkb(format!(
            "nested geometry at byte {start} carries an SRID"
        )));
    }
    if let Some(dims) = parent {
        if dims != (tw.dimz, tw.dimm) {
            return Err(PggeomError::Wkb(format!(
                "dimensionality of nested geometry at byte {start} does not match its container"
            )));
        }
    }
    let srid = if tw.has_srid {
        Some(cur.i32(endian)?)
    } else {
        None
    };
    let head = Head {
        srid,
        dimz: tw.dimz,
        dimm: tw.dimm,
    };
    let dims = (tw.dimz, tw.dimm);

    match tw.tag {
        GeometryType::Point => {
            let (x, y, z, m) = read_coord(cur, endian, dims)?;
            Ok(GeometryValue::Point(Point::from_raw(head, x, y, z, m)))
        }
        GeometryType::LineString => {
            let points = read_vertices(cur, endian, dims)?;
            Ok(GeometryValue::LineString(LineString::from_raw(
                head, points,
            )))
        }
        GeometryType::Polygon => {
            let nrings = cur.u32(endian)? as usize;
            let mut rings = Vec::new();
            for _ in 0..nrings {
                let ring_head = Head {
                    srid: None,
                    dimz: dims.0,
                    dimm: dims.1,
                };
                rings.push(LineString::from_raw(
                    ring_head,
                    read_vertices(cur, endian, dims)?,
                ));
            }
            Ok(GeometryValue::Polygon(Polygon::from_raw(head, rings)))
        }
        GeometryType::MultiPoint => {
            let n = cur.u32(endian)? as usize;
            let mut points = Vec::new();
            for _ in 0..n {
                match read_geom(cur, Some(dims))? {
                    GeometryValue::Point(p) => points.push(p),
                    other => return Err(unexpected_member(start, "MultiPoint", &other)),
                }
            }
            Ok(GeometryValue::MultiPoint(MultiPoint::from_raw(
                head, points,
            )))
        }
        GeometryType::MultiLineString => {
            let n = cur.u32(endian)? as usize;
            let mut lines = Vec::new();
            for _ in 0..n {
                match read_geom(cur, Some(dims))? {
                    GeometryValue::LineString(ls) => lines.push(ls),
                    other => return Err(unexpected_member(start, "MultiLineString", &other)),
                }
            }
            Ok(GeometryValue::MultiLineString(MultiLineString::from_raw(
                head, lines,
            )))
        }
        GeometryType::MultiPolygon => {
            let n = cur.u32(endian)? as usize;
            let mut polygons = Vec::new();
            for _ in 0..n {
                match read_geom(cur, Some(dims))? {
                    GeometryValue::Polygon(p) => polygons.push(p),
                    other => return Err(unexpected_member(start, "MultiPolygon", &other)),
                }
            }
            Ok(GeometryValue::MultiPolygon(MultiPolygon::from_raw(
                head, polygons,
            )))
        }
        GeometryType::GeometryCollection => {
            let n = cur.u32(endian)? as usize;
            let mut geometries = Vec::new();
            for _ in 0..n {
                geometries.push(Geometry::from(read_geom(cur, Some(dims))?));
            }
            Ok(GeometryValue::GeometryCollection(
                GeometryCollection::from_raw(head, geometries),
            ))
        }
    }
}

fn unexpected_member(at: usize, container: &str, found: &GeometryValue) -> PggeomError {
    PggeomError::Wkb(format!(
        "record at byte {at}: a {container} may not contain a {}",
        found.geometry_type().as_str()
    ))
}

fn read_coord(
    cur: &mut ByteCursor,
    endian: Endian,
    (dimz, dimm): (bool, bool),
) -> Result<(f64, f64, f64, f64)> {
    let x = cur.f64(endian)?;
    let y = cur.f64(endian)?;
    let z = if dimz { cur.f64(endian)? } else { 0.0 };
    let m = if dimm { cur.f64(endian)? } else { 0.0 };
    Ok((x, y, z, m))
}

fn read_vertices(
    cur: &mut ByteCursor,
    endian: Endian,
    dims: (bool, bool),
) -> Result<Vec<Point>> {
    let n = cur.u32(endian)? as usize;
    let mut points = Vec::new();
    for _ in 0..n {
        let (x, y, z, m) = read_coord(cur, endian, dims)?;
        points.push(Point::from_raw(
            Head {
                srid: None,
                dimz: dims.0,
                dimm: dims.1,
            },
            x,
            y,
            z,
            m,
        ));
    }
    Ok(points)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ewkb_header() {
        // SELECT 'POINT(10 -20 100 1)'::geometry
        let ewkb = hex::decode(
            "01010000C0000000000000244000000000000034C00000000000005940000000000000F03F",
        )
        .unwrap();
        let info = read_header(&ewkb).unwrap();
        assert_eq!(info.tag, GeometryType::Point);
        assert_eq!(info.head.srid, None);
        assert!(info.head.dimz);
        assert!(info.head.dimm);

        // SELECT 'SRID=4326;MULTIPOINT ((10 -20 100), (0 -0.5 101))'::geometry
        let ewkb = hex::decode("01040000A0E6100000020000000101000080000000000000244000000000000034C0000000000000594001010000800000000000000000000000000000E0BF0000000000405940").unwrap();
        let info = read_header(&ewkb).unwrap();
        assert_eq!(info.tag, GeometryType::MultiPoint);
        assert_eq!(info.head.srid, Some(4326));
        assert!(info.head.dimz);
        assert!(!info.head.dimm);
    }

    #[test]
    fn point_2d() {
        let wkb = hex::decode("01010000000000000000004AC00000000000000000").unwrap();
        let GeometryValue::Point(p) = read_geometry(&wkb).unwrap() else {
            panic!("expected a Point");
        };
        assert_eq!(p.srid(), None);
        assert_eq!((p.x(), p.y()), (-52.0, 0.0));
        assert_eq!(p.z(), None);
    }

    #[test]
    fn big_endian_point() {
        // POINT (10 -20), XDR byte order
        let wkb = hex::decode("00000000014024000000000000C034000000000000").unwrap();
        let GeometryValue::Point(p) = read_geometry(&wkb).unwrap() else {
            panic!("expected a Point");
        };
        assert_eq!((p.x(), p.y()), (10.0, -20.0));
    }

    #[test]
    fn multipoint_z_with_srid() {
        // SELECT 'SRID=4326;MULTIPOINT (10 -20 100, 0 -0.5 101)'::geometry
        let ewkb = hex::decode("01040000A0E6100000020000000101000080000000000000244000000000000034C0000000000000594001010000800000000000000000000000000000E0BF0000000000405940").unwrap();
        let GeometryValue::MultiPoint(mp) = read_geometry(&ewkb).unwrap() else {
            panic!("expected a MultiPoint");
        };
        assert_eq!(mp.srid(), Some(4326));
        assert!(mp.dimz());
        assert_eq!(mp.len(), 2);
        assert_eq!(mp[0].z(), Some(100.0));
        assert_eq!((mp[1].x(), mp[1].y(), mp[1].z()), (0.0, -0.5, Some(101.0)));
        // nested records carry no SRID of their own
        assert_eq!(mp[0].srid(), None);
    }

    #[test]
    fn geometrycollection() {
        // SELECT 'GeometryCollection(POINT (10 10),POINT (30 30),LINESTRING (15 15, 20 20))'::geometry
        let ewkb = hex::decode("01070000000300000001010000000000000000002440000000000000244001010000000000000000003E400000000000003E400102000000020000000000000000002E400000000000002E4000000000000034400000000000003440").unwrap();
        let GeometryValue::GeometryCollection(gc) = read_geometry(&ewkb).unwrap() else {
            panic!("expected a GeometryCollection");
        };
        assert_eq!(gc.len(), 3);
        assert_eq!(gc[2].geometry_type(), GeometryType::LineString);
    }

    #[test]
    fn invalid_endian_byte() {
        let err = read_geometry(&hex::decode("02010000000000000000004AC00000000000000000").unwrap())
            .unwrap_err();
        assert!(err.to_string().contains("endian byte"));
    }

    #[test]
    fn unsupported_base_type() {
        // SELECT 'CIRCULARSTRING(0 0,1 1,2 0)'::geometry (curves are not modeled)
        let err = read_geometry(&hex::decode("01080000000300000000000000000000000000000000000000000000000000F03F000000000000F03F00000000000000400000000000000000").unwrap()).unwrap_err();
        assert!(err.to_string().contains("unsupported geometry type 8"));

        // ISO 1000-offset codes are rejected too (1001 & 0xFF == 233)
        let err = read_geometry(&hex::decode("01E9030000").unwrap()).unwrap_err();
        assert!(matches!(err, PggeomError::Wkb(_)));
    }

    #[test]
    fn stray_flag_bits() {
        let err = read_geometry(&hex::decode("0101000010").unwrap()).unwrap_err();
        assert!(err.to_string().contains("stray flag bits"));
    }

    #[test]
    fn truncated_payload() {
        let err =
            read_geometry(&hex::decode("01010000000000000000004AC0").unwrap()).unwrap_err();
        assert!(err.to_string().contains("unexpected end of WKB at byte 13"));
    }

    #[test]
    fn nested_srid_flag_rejected() {
        // MULTIPOINT whose member record wrongly carries the SRID flag
        let err = read_geometry(&hex::decode("0104000020E6100000010000000101000020E610000000000000000000000000000000000000").unwrap()).unwrap_err();
        assert!(err.to_string().contains("carries an SRID"));
    }

    #[test]
    fn nested_dimensionality_mismatch() {
        // MULTIPOINT Z holding a 2D point record
        let err = read_geometry(
            &hex::decode("010400008001000000010100000000000000000000000000000000000000").unwrap(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("dimensionality"));
    }
}
