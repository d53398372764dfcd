//! Optional conversions to and from `geo-types` primitives.
//!
//! `geo-types` is two-dimensional: Z and M are dropped on the way out, and
//! a shape coming in never declares them.

use crate::error::Result;
use crate::geometry::Geometry;
use crate::model::GeometryValue;
use crate::shape::GeoShape;
use serde_json::{Value, json};

impl Geometry {
    /// Convert into a 2D `geo-types` geometry. Materializes the geometry;
    /// Z and M are dropped.
    pub fn to_geo(&mut self) -> Result<geo_types::Geometry<f64>> {
        to_geo_value(self.value()?)
    }
}

fn to_geo_value(value: &GeometryValue) -> Result<geo_types::Geometry<f64>> {
    Ok(match value {
        GeometryValue::Point(p) => geo_types::Point::new(p.x(), p.y()).into(),
        GeometryValue::LineString(ls) => line_string(ls).into(),
        GeometryValue::Polygon(pg) => polygon(pg).into(),
        GeometryValue::MultiPoint(mp) => geo_types::MultiPoint(
            mp.points()
                .iter()
                .map(|p| geo_types::Point::new(p.x(), p.y()))
                .collect(),
        )
        .into(),
        GeometryValue::MultiLineString(mls) => {
            geo_types::MultiLineString(mls.lines().iter().map(line_string).collect()).into()
        }
        GeometryValue::MultiPolygon(mp) => {
            geo_types::MultiPolygon(mp.polygons().iter().map(polygon).collect()).into()
        }
        GeometryValue::GeometryCollection(gc) => {
            let mut members = Vec::with_capacity(gc.len());
            for g in gc.geometries() {
                members.push(to_geo_value(g.snapshot()?.as_ref())?);
            }
            geo_types::Geometry::GeometryCollection(geo_types::GeometryCollection(members))
        }
    })
}

fn coord(p: &crate::Point) -> geo_types::Coord<f64> {
    geo_types::Coord { x: p.x(), y: p.y() }
}

fn line_string(ls: &crate::LineString) -> geo_types::LineString<f64> {
    geo_types::LineString::new(ls.points().iter().map(coord).collect())
}

fn polygon(pg: &crate::Polygon) -> geo_types::Polygon<f64> {
    let exterior = pg
        .exterior()
        .map(line_string)
        .unwrap_or_else(|| geo_types::LineString::new(Vec::new()));
    let interiors = pg.interiors().iter().map(line_string).collect();
    geo_types::Polygon::new(exterior, interiors)
}

impl GeoShape for geo_types::Geometry<f64> {
    fn geo_interface(&self) -> Option<Value> {
        Some(match self {
            geo_types::Geometry::Point(p) => {
                json!({"type": "Point", "coordinates": [p.x(), p.y()]})
            }
            geo_types::Geometry::Line(l) => json!({
                "type": "LineString",
                "coordinates": [[l.start.x, l.start.y], [l.end.x, l.end.y]]
            }),
            geo_types::Geometry::LineString(ls) => {
                json!({"type": "LineString", "coordinates": positions(ls)})
            }
            geo_types::Geometry::Polygon(p) => {
                json!({"type": "Polygon", "coordinates": ring_positions(p)})
            }
            geo_types::Geometry::Rect(r) => {
                json!({"type": "Polygon", "coordinates": ring_positions(&r.to_polygon())})
            }
            geo_types::Geometry::Triangle(t) => {
                json!({"type": "Polygon", "coordinates": ring_positions(&t.to_polygon())})
            }
            geo_types::Geometry::MultiPoint(mp) => {
                let coords: Vec<Value> =
                    mp.0.iter().map(|p| json!([p.x(), p.y()])).collect();
                json!({"type": "MultiPoint", "coordinates": coords})
            }
            geo_types::Geometry::MultiLineString(mls) => {
                let coords: Vec<Value> = mls.0.iter().map(positions).collect();
                json!({"type": "MultiLineString", "coordinates": coords})
            }
            geo_types::Geometry::MultiPolygon(mp) => {
                let coords: Vec<Value> = mp.0.iter().map(ring_positions).collect();
                json!({"type": "MultiPolygon", "coordinates": coords})
            }
            geo_types::Geometry::GeometryCollection(gc) => {
                let members = gc
                    .0
                    .iter()
                    .map(GeoShape::geo_interface)
                    .collect::<Option<Vec<Value>>>()?;
                json!({"type": "GeometryCollection", "geometries": members})
            }
        })
    }
}

fn positions(ls: &geo_types::LineString<f64>) -> Value {
    Value::Array(ls.0.iter().map(|c| json!([c.x, c.y])).collect())
}

fn ring_positions(p: &geo_types::Polygon<f64>) -> Value {
    let mut rings = vec![positions(p.exterior())];
    rings.extend(p.interiors().iter().map(positions));
    Value::Array(rings)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn to_geo_drops_extra_dimensions() {
        let mut geom = Geometry::from_wkt("POINT Z (1 2 3)", Some(4326)).unwrap();
        let geo = geom.to_geo().unwrap();
        assert_eq!(geo, geo_types::Point::new(1.0, 2.0).into());
    }

    #[test]
    fn polygon_roundtrip_through_shape() {
        let mut geom = Geometry::from_wkt(
            "POLYGON ((0 0, 10 0, 10 10, 0 10, 0 0), (4 4, 6 4, 6 6, 4 6, 4 4))",
            None,
        )
        .unwrap();
        let geo = geom.to_geo().unwrap();
        let back = Geometry::from_shape(&geo, None).unwrap();
        assert_eq!(back, geom);
    }

    #[test]
    fn collection_from_shape() {
        let geo: geo_types::Geometry<f64> =
            geo_types::Geometry::GeometryCollection(geo_types::GeometryCollection(vec![
                geo_types::Point::new(1.0, 2.0).into(),
                geo_types::LineString::new(vec![
                    geo_types::Coord { x: 0.0, y: 0.0 },
                    geo_types::Coord { x: 1.0, y: 1.0 },
                ])
                .into(),
            ]));
        let geom = Geometry::from_shape(&geo, Some(4326)).unwrap();
        assert_eq!(geom.srid(), Some(4326));
        assert_eq!(
            geom.to_ewkt().unwrap(),
            "SRID=4326;GEOMETRYCOLLECTION (POINT (1 2), LINESTRING (0 0, 1 1))"
        );
    }
}
