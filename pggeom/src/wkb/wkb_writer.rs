use crate::error::{PggeomError, Result};
use crate::model::{GeometryType, GeometryValue, Head, LineString, Point};
use crate::wkb::{FLAG_M, FLAG_SRID, FLAG_Z, WkbDialect};
use scroll::IOwrite;

/// Encode a geometry as little-endian WKB or EWKB.
///
/// Only the outermost record may carry an SRID, and only in the EWKB
/// dialect; every member of a multigeometry gets its own endian byte and
/// type word.
pub(crate) fn write_geometry(value: &GeometryValue, dialect: WkbDialect) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    write_geom(&mut out, value, dialect, true)?;
    Ok(out)
}

fn io_err(_: std::io::Error) -> PggeomError {
    PggeomError::Wkb("failed to encode WKB".to_string())
}

fn write_header(
    out: &mut Vec<u8>,
    tag: GeometryType,
    head: &Head,
    dialect: WkbDialect,
    outermost: bool,
) -> Result<()> {
    out.iowrite(1u8).map_err(io_err)?;
    let mut word = tag as u32;
    if head.dimz {
        word |= FLAG_Z;
    }
    if head.dimm {
        word |= FLAG_M;
    }
    let srid = if dialect == WkbDialect::Ewkb && outermost {
        head.srid
    } else {
        None
    };
    if srid.is_some() {
        word |= FLAG_SRID;
    }
    out.iowrite_with(word, scroll::LE).map_err(io_err)?;
    if let Some(srid) = srid {
        out.iowrite_with(srid, scroll::LE).map_err(io_err)?;
    }
    Ok(())
}

fn write_count(out: &mut Vec<u8>, n: usize) -> Result<()> {
    out.iowrite_with(n as u32, scroll::LE).map_err(io_err)
}

fn write_coord(out: &mut Vec<u8>, p: &Point) -> Result<()> {
    out.iowrite_with(p.x, scroll::LE).map_err(io_err)?;
    out.iowrite_with(p.y, scroll::LE).map_err(io_err)?;
    if p.head.dimz {
        out.iowrite_with(p.z, scroll::LE).map_err(io_err)?;
    }
    if p.head.dimm {
        out.iowrite_with(p.m, scroll::LE).map_err(io_err)?;
    }
    Ok(())
}

fn write_vertices(out: &mut Vec<u8>, ring: &LineString) -> Result<()> {
    write_count(out, ring.points.len())?;
    for p in &ring.points {
        write_coord(out, p)?;
    }
    Ok(())
}

fn write_geom(
    out: &mut Vec<u8>,
    value: &GeometryValue,
    dialect: WkbDialect,
    outermost: bool,
) -> Result<()> {
    match value {
        GeometryValue::Point(p) => {
            write_header(out, GeometryType::Point, &p.head, dialect, outermost)?;
            write_coord(out, p)
        }
        GeometryValue::LineString(ls) => {
            write_header(out, GeometryType::LineString, &ls.head, dialect, outermost)?;
            write_vertices(out, ls)
        }
        GeometryValue::Polygon(pg) => {
            write_header(out, GeometryType::Polygon, &pg.head, dialect, outermost)?;
            write_count(out, pg.rings.len())?;
            for ring in &pg.rings {
                write_vertices(out, ring)?;
            }
            Ok(())
        }
        GeometryValue::MultiPoint(mp) => {
            write_header(out, GeometryType::MultiPoint, &mp.head, dialect, outermost)?;
            write_count(out, mp.points.len())?;
            for p in &mp.points {
                write_header(out, GeometryType::Point, &p.head, dialect, false)?;
                write_coord(out, p)?;
            }
            Ok(())
        }
        GeometryValue::MultiLineString(mls) => {
            write_header(
                out,
                GeometryType::MultiLineString,
                &mls.head,
                dialect,
                outermost,
            )?;
            write_count(out, mls.lines.len())?;
            for ls in &mls.lines {
                write_header(out, GeometryType::LineString, &ls.head, dialect, false)?;
                write_vertices(out, ls)?;
            }
            Ok(())
        }
        GeometryValue::MultiPolygon(mp) => {
            write_header(out, GeometryType::MultiPolygon, &mp.head, dialect, outermost)?;
            write_count(out, mp.polygons.len())?;
            for pg in &mp.polygons {
                write_header(out, GeometryType::Polygon, &pg.head, dialect, false)?;
                write_count(out, pg.rings.len())?;
                for ring in &pg.rings {
                    write_vertices(out, ring)?;
                }
            }
            Ok(())
        }
        GeometryValue::GeometryCollection(gc) => {
            write_header(
                out,
                GeometryType::GeometryCollection,
                &gc.head,
                dialect,
                outermost,
            )?;
            write_count(out, gc.geometries.len())?;
            for g in &gc.geometries {
                let member = g.snapshot()?;
                write_geom(out, &member, dialect, false)?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::wkb::read_geometry;

    fn ewkb_roundtrip(ewkbstr: &str) -> bool {
        let wkb_in = hex::decode(ewkbstr).unwrap();
        let value = read_geometry(&wkb_in).unwrap();
        let wkb_out = write_geometry(&value, WkbDialect::Ewkb).unwrap();
        let ok = wkb_out == wkb_in;
        if !ok {
            eprintln!("got {}", hex::encode(&wkb_out));
        }
        ok
    }

    #[test]
    fn ewkb_geometries() {
        // SELECT 'POINT(10 -20)'::geometry
        assert!(ewkb_roundtrip("0101000000000000000000244000000000000034c0"));

        // SELECT 'SRID=4326;MULTIPOINT (10 -20 100, 0 -0.5 101)'::geometry
        assert!(ewkb_roundtrip("01040000a0e6100000020000000101000080000000000000244000000000000034c0000000000000594001010000800000000000000000000000000000e0bf0000000000405940"));

        // SELECT 'SRID=4326;LINESTRING (10 -20 100, 0 -0.5 101)'::geometry
        assert!(ewkb_roundtrip("01020000a0e610000002000000000000000000244000000000000034c000000000000059400000000000000000000000000000e0bf0000000000405940"));

        // SELECT 'SRID=4326;MULTILINESTRING ((10 -20, 0 -0.5), (0 0, 2 0))'::geometry
        assert!(ewkb_roundtrip("0105000020e610000002000000010200000002000000000000000000244000000000000034c00000000000000000000000000000e0bf0102000000020000000000000000000000000000000000000000000000000000400000000000000000"));

        // SELECT 'SRID=4326;POLYGON ((0 0, 2 0, 2 2, 0 2, 0 0))'::geometry
        assert!(ewkb_roundtrip("0103000020e610000001000000050000000000000000000000000000000000000000000000000000400000000000000000000000000000004000000000000000400000000000000000000000000000004000000000000000000000000000000000"));

        // SELECT 'SRID=4326;MULTIPOLYGON (((0 0, 2 0, 2 2, 0 2, 0 0)), ((10 10, -2 10, -2 -2, 10 -2, 10 10)))'::geometry
        assert!(ewkb_roundtrip("0106000020e610000002000000010300000001000000050000000000000000000000000000000000000000000000000000400000000000000000000000000000004000000000000000400000000000000000000000000000004000000000000000000000000000000000010300000001000000050000000000000000002440000000000000244000000000000000c0000000000000244000000000000000c000000000000000c0000000000000244000000000000000c000000000000024400000000000002440"));

        // SELECT 'GeometryCollection(POINT (10 10),POINT (30 30),LINESTRING (15 15, 20 20))'::geometry
        assert!(ewkb_roundtrip("01070000000300000001010000000000000000002440000000000000244001010000000000000000003e400000000000003e400102000000020000000000000000002e400000000000002e4000000000000034400000000000003440"));
    }

    #[test]
    fn big_endian_input_reencodes_little_endian() {
        // POINT (10 -20) in XDR byte order
        let wkb_in = hex::decode("00000000014024000000000000c034000000000000").unwrap();
        let value = read_geometry(&wkb_in).unwrap();
        let wkb_out = write_geometry(&value, WkbDialect::Ewkb).unwrap();
        assert_eq!(
            hex::encode(wkb_out),
            "0101000000000000000000244000000000000034c0"
        );
    }

    #[test]
    fn plain_wkb_omits_srid() {
        // SELECT 'SRID=4326;POLYGON ((0 0, 2 0, 2 2, 0 2, 0 0))'::geometry
        let ewkb = hex::decode("0103000020e610000001000000050000000000000000000000000000000000000000000000000000400000000000000000000000000000004000000000000000400000000000000000000000000000004000000000000000000000000000000000").unwrap();
        let value = read_geometry(&ewkb).unwrap();
        let wkb = write_geometry(&value, WkbDialect::Wkb).unwrap();
        // identical to the EWKB form minus the flag and the 4 SRID bytes
        assert_eq!(hex::encode(&wkb[..5]), "0103000000");
        assert_eq!(wkb[5..], ewkb[9..]);
    }

    #[test]
    fn point_z_ewkb() {
        let p = Point::new(&[-124.005, 49.005, 1.0], Some(4326)).unwrap();
        let wkb = write_geometry(&GeometryValue::Point(p), WkbDialect::Ewkb).unwrap();
        assert_eq!(
            hex::encode(wkb),
            "01010000a0e6100000b81e85eb51005fc0713d0ad7a3804840000000000000f03f"
        );
    }

    #[test]
    fn ewkb_without_srid_equals_wkb() {
        let p = Point::new(&[10.0, -20.0], None).unwrap();
        let value = GeometryValue::Point(p);
        assert_eq!(
            write_geometry(&value, WkbDialect::Ewkb).unwrap(),
            write_geometry(&value, WkbDialect::Wkb).unwrap()
        );
    }
}
