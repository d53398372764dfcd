use crate::error::{PggeomError, Result};
use crate::geometry::Geometry;
use crate::model::{
    GeometryCollection, GeometryValue, Head, LineString, MultiLineString, MultiPoint,
    MultiPolygon, Point, Polygon,
};
use serde_json::Value;

/// Decode an RFC 7946 geometry object. The result carries no SRID.
pub(crate) fn read_geometry(value: &Value) -> Result<GeometryValue> {
    let obj = value
        .as_object()
        .ok_or_else(|| PggeomError::Geojson("expected a JSON object".to_string()))?;
    let kind = obj
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| PggeomError::Geojson("missing `type` member".to_string()))?;

    if kind == "GeometryCollection" {
        let members = obj
            .get("geometries")
            .and_then(Value::as_array)
            .ok_or_else(|| PggeomError::Geojson("missing `geometries` member".to_string()))?;
        let mut geometries = Vec::with_capacity(members.len());
        for member in members {
            geometries.push(Geometry::from(read_geometry(member)?));
        }
        return Ok(GeometryValue::GeometryCollection(GeometryCollection::new(
            geometries, None,
        )?));
    }

    let coordinates = obj
        .get("coordinates")
        .ok_or_else(|| PggeomError::Geojson("missing `coordinates` member".to_string()))?;
    // positions within one geometry must share an arity of 2 or 3
    let mut arity = None;
    Ok(match kind {
        "Point" => GeometryValue::Point(position(coordinates, &mut arity)?),
        "LineString" => {
            let points = positions(coordinates, &mut arity)?;
            GeometryValue::LineString(LineString::from_raw(head_of(arity), points))
        }
        "Polygon" => {
            let rings = rings(coordinates, &mut arity)?;
            GeometryValue::Polygon(Polygon::from_raw(head_of(arity), rings))
        }
        "MultiPoint" => {
            let points = positions(coordinates, &mut arity)?;
            GeometryValue::MultiPoint(MultiPoint::from_raw(head_of(arity), points))
        }
        "MultiLineString" => {
            let arr = member_array(coordinates)?;
            let mut lines = Vec::with_capacity(arr.len());
            for member in arr {
                let points = positions(member, &mut arity)?;
                lines.push(LineString::from_raw(head_of(arity), points));
            }
            GeometryValue::MultiLineString(MultiLineString::from_raw(head_of(arity), lines))
        }
        "MultiPolygon" => {
            let arr = member_array(coordinates)?;
            let mut polygons = Vec::with_capacity(arr.len());
            for member in arr {
                let member_rings = rings(member, &mut arity)?;
                polygons.push(Polygon::from_raw(head_of(arity), member_rings));
            }
            GeometryValue::MultiPolygon(MultiPolygon::from_raw(head_of(arity), polygons))
        }
        other => {
            return Err(PggeomError::Geojson(format!(
                "unsupported geometry type `{other}`"
            )));
        }
    })
}

fn head_of(arity: Option<usize>) -> Head {
    Head {
        srid: None,
        dimz: arity == Some(3),
        dimm: false,
    }
}

fn member_array(value: &Value) -> Result<&Vec<Value>> {
    value
        .as_array()
        .ok_or_else(|| PggeomError::Geojson("`coordinates` must be an array".to_string()))
}

fn position(value: &Value, arity: &mut Option<usize>) -> Result<Point> {
    let arr = member_array(value)?;
    if !(2..=3).contains(&arr.len()) {
        return Err(PggeomError::Geojson(format!(
            "position has {} values, expected 2 or 3",
            arr.len()
        )));
    }
    match arity {
        Some(a) if *a != arr.len() => {
            return Err(PggeomError::Geojson(
                "mixed position dimensions within one geometry".to_string(),
            ));
        }
        None => *arity = Some(arr.len()),
        _ => {}
    }
    let mut nums = [0.0; 3];
    for (i, v) in arr.iter().enumerate() {
        nums[i] = v.as_f64().ok_or_else(|| {
            PggeomError::Geojson("position values must be numbers".to_string())
        })?;
    }
    Ok(Point::from_raw(
        head_of(*arity),
        nums[0],
        nums[1],
        nums[2],
        0.0,
    ))
}

fn positions(value: &Value, arity: &mut Option<usize>) -> Result<Vec<Point>> {
    let arr = member_array(value)?;
    let mut points = Vec::with_capacity(arr.len());
    for member in arr {
        points.push(position(member, arity)?);
    }
    Ok(points)
}

fn rings(value: &Value, arity: &mut Option<usize>) -> Result<Vec<LineString>> {
    let arr = member_array(value)?;
    let mut rings = Vec::with_capacity(arr.len());
    for member in arr {
        let points = positions(member, arity)?;
        rings.push(LineString::from_raw(head_of(*arity), points));
    }
    Ok(rings)
}
