use crate::error::Result;
use crate::model::{GeometryValue, LineString, Point, Polygon};
use serde_json::{Value, json};

pub(crate) fn write_geometry(value: &GeometryValue) -> Result<Value> {
    Ok(match value {
        GeometryValue::Point(p) => json!({"type": "Point", "coordinates": position(p)}),
        GeometryValue::LineString(ls) => {
            json!({"type": "LineString", "coordinates": positions(ls)})
        }
        GeometryValue::Polygon(pg) => json!({"type": "Polygon", "coordinates": rings(pg)}),
        GeometryValue::MultiPoint(mp) => {
            let coords: Vec<Value> = mp.points().iter().map(position).collect();
            json!({"type": "MultiPoint", "coordinates": coords})
        }
        GeometryValue::MultiLineString(mls) => {
            let coords: Vec<Value> = mls.lines().iter().map(positions).collect();
            json!({"type": "MultiLineString", "coordinates": coords})
        }
        GeometryValue::MultiPolygon(mp) => {
            let coords: Vec<Value> = mp.polygons().iter().map(rings).collect();
            json!({"type": "MultiPolygon", "coordinates": coords})
        }
        GeometryValue::GeometryCollection(gc) => {
            let mut members = Vec::with_capacity(gc.len());
            for g in gc.geometries() {
                members.push(write_geometry(g.snapshot()?.as_ref())?);
            }
            json!({"type": "GeometryCollection", "geometries": members})
        }
    })
}

// M has no GeoJSON representation and is dropped
fn position(p: &Point) -> Value {
    if p.dimz() {
        json!([p.x(), p.y(), p.z().unwrap_or(0.0)])
    } else {
        json!([p.x(), p.y()])
    }
}

fn positions(ls: &LineString) -> Value {
    Value::Array(ls.points().iter().map(position).collect())
}

fn rings(pg: &Polygon) -> Value {
    Value::Array(pg.rings().iter().map(positions).collect())
}
