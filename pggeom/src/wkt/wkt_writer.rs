use crate::error::{PggeomError, Result};
use crate::model::{GeometryValue, Head, LineString, Point};
use crate::wkt::wkt_precision;

/// Render a geometry as WKT, or EWKT when `with_srid` is set and an SRID is
/// present. Nested geometries never carry the SRID prefix.
pub(crate) fn write_geometry(value: &GeometryValue, with_srid: bool) -> Result<String> {
    let precision = wkt_precision();
    let mut out = String::new();
    if with_srid {
        if let Some(srid) = value.srid() {
            out.push_str(&format!("SRID={srid};"));
        }
    }
    write_value(&mut out, value, precision)?;
    Ok(out)
}

fn push_tag(out: &mut String, tag: &str, head: &Head) {
    out.push_str(tag);
    match (head.dimz, head.dimm) {
        (true, true) => out.push_str(" ZM"),
        (true, false) => out.push_str(" Z"),
        (false, true) => out.push_str(" M"),
        (false, false) => {}
    }
    out.push(' ');
}

fn write_value(out: &mut String, value: &GeometryValue, precision: usize) -> Result<()> {
    match value {
        GeometryValue::Point(p) => {
            push_tag(out, p.geometry_type().wkt_tag(), &p.head);
            out.push('(');
            write_coord(out, p, precision)?;
            out.push(')');
        }
        GeometryValue::LineString(ls) => {
            push_tag(out, ls.geometry_type().wkt_tag(), &ls.head);
            write_coord_list(out, ls, precision)?;
        }
        GeometryValue::Polygon(pg) => {
            push_tag(out, pg.geometry_type().wkt_tag(), &pg.head);
            write_ring_list(out, &pg.rings, precision)?;
        }
        GeometryValue::MultiPoint(mp) => {
            push_tag(out, mp.geometry_type().wkt_tag(), &mp.head);
            out.push('(');
            for (i, p) in mp.points.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_coord(out, p, precision)?;
            }
            out.push(')');
        }
        GeometryValue::MultiLineString(mls) => {
            push_tag(out, mls.geometry_type().wkt_tag(), &mls.head);
            out.push('(');
            for (i, ls) in mls.lines.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_coord_list(out, ls, precision)?;
            }
            out.push(')');
        }
        GeometryValue::MultiPolygon(mp) => {
            push_tag(out, mp.geometry_type().wkt_tag(), &mp.head);
            out.push('(');
            for (i, pg) in mp.polygons.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_ring_list(out, &pg.rings, precision)?;
            }
            out.push(')');
        }
        GeometryValue::GeometryCollection(gc) => {
            push_tag(out, gc.geometry_type().wkt_tag(), &gc.head);
            out.push('(');
            for (i, g) in gc.geometries.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_value(out, g.snapshot()?.as_ref(), precision)?;
            }
            out.push(')');
        }
    }
    Ok(())
}

fn write_coord_list(out: &mut String, ls: &LineString, precision: usize) -> Result<()> {
    out.push('(');
    for (i, p) in ls.points.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_coord(out, p, precision)?;
    }
    out.push(')');
    Ok(())
}

fn write_ring_list(out: &mut String, rings: &[LineString], precision: usize) -> Result<()> {
    out.push('(');
    for (i, ring) in rings.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_coord_list(out, ring, precision)?;
    }
    out.push(')');
    Ok(())
}

fn write_coord(out: &mut String, p: &Point, precision: usize) -> Result<()> {
    out.push_str(&format_number(p.x, precision)?);
    out.push(' ');
    out.push_str(&format_number(p.y, precision)?);
    if p.head.dimz {
        out.push(' ');
        out.push_str(&format_number(p.z, precision)?);
    }
    if p.head.dimm {
        out.push(' ');
        out.push_str(&format_number(p.m, precision)?);
    }
    Ok(())
}

/// Shortest decimal representation that parses back to `x`, capped at
/// `precision` fractional digits. Integer-valued doubles print without a
/// decimal point, negative zero prints as `0`, and trailing-zero trimming
/// never crosses the decimal point. Exponent notation is never emitted.
pub(crate) fn format_number(x: f64, precision: usize) -> Result<String> {
    if !x.is_finite() {
        return Err(PggeomError::Wkt(format!(
            "cannot serialize non-finite coordinate value {x}"
        )));
    }
    if x == 0.0 {
        return Ok("0".to_string());
    }
    if x.fract() == 0.0 {
        return Ok(format!("{x:.0}"));
    }
    for digits in 1..=precision {
        let s = format!("{x:.digits$}");
        if s.parse::<f64>().is_ok_and(|v| v == x) {
            return Ok(s);
        }
    }
    let s = format!("{x:.precision$}");
    if s.contains('.') {
        Ok(s.trim_end_matches('0').trim_end_matches('.').to_string())
    } else {
        Ok(s)
    }
}
