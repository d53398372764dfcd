//! Combination operators over geometries.
//!
//! Concatenation follows the PostGIS collection rules: members of the same
//! base class merge into the matching multigeometry, a single geometry and
//! its multi class merge likewise, and any other pairing produces a
//! geometry collection. An operand that already is a collection contributes
//! its members.

use crate::error::{PggeomError, Result};
use crate::geometry::Geometry;
use crate::model::{
    GeometryCollection, GeometryValue, MultiLineString, MultiPoint, MultiPolygon,
};

fn merge_srid(a: Option<i32>, b: Option<i32>) -> Result<Option<i32>> {
    match (a, b) {
        (Some(a), Some(b)) if a != b => Err(PggeomError::Srid(format!(
            "cannot combine geometries with SRIDs {a} and {b}"
        ))),
        (Some(a), _) => Ok(Some(a)),
        (_, b) => Ok(b),
    }
}

pub(crate) fn concat(a: Geometry, b: Geometry) -> Result<Geometry> {
    use GeometryValue as V;
    let a = a.into_value()?;
    let b = b.into_value()?;
    let out = match (a, b) {
        (V::Point(a), V::Point(b)) => V::MultiPoint(MultiPoint::new(vec![a, b], None)?),
        (V::Point(a), V::MultiPoint(b)) => {
            let srid = merge_srid(a.head.srid, b.head.srid)?;
            let mut points = vec![a];
            points.extend(b.points);
            V::MultiPoint(MultiPoint::new(points, srid)?)
        }
        (V::MultiPoint(a), V::Point(b)) => {
            let srid = merge_srid(a.head.srid, b.head.srid)?;
            let mut points = a.points;
            points.push(b);
            V::MultiPoint(MultiPoint::new(points, srid)?)
        }
        (V::MultiPoint(a), V::MultiPoint(b)) => {
            let srid = merge_srid(a.head.srid, b.head.srid)?;
            let mut points = a.points;
            points.extend(b.points);
            V::MultiPoint(MultiPoint::new(points, srid)?)
        }
        (V::LineString(a), V::LineString(b)) => {
            V::MultiLineString(MultiLineString::new(vec![a, b], None)?)
        }
        (V::LineString(a), V::MultiLineString(b)) => {
            let srid = merge_srid(a.head.srid, b.head.srid)?;
            let mut lines = vec![a];
            lines.extend(b.lines);
            V::MultiLineString(MultiLineString::new(lines, srid)?)
        }
        (V::MultiLineString(a), V::LineString(b)) => {
            let srid = merge_srid(a.head.srid, b.head.srid)?;
            let mut lines = a.lines;
            lines.push(b);
            V::MultiLineString(MultiLineString::new(lines, srid)?)
        }
        (V::MultiLineString(a), V::MultiLineString(b)) => {
            let srid = merge_srid(a.head.srid, b.head.srid)?;
            let mut lines = a.lines;
            lines.extend(b.lines);
            V::MultiLineString(MultiLineString::new(lines, srid)?)
        }
        (V::Polygon(a), V::Polygon(b)) => V::MultiPolygon(MultiPolygon::new(vec![a, b], None)?),
        (V::Polygon(a), V::MultiPolygon(b)) => {
            let srid = merge_srid(a.head.srid, b.head.srid)?;
            let mut polygons = vec![a];
            polygons.extend(b.polygons);
            V::MultiPolygon(MultiPolygon::new(polygons, srid)?)
        }
        (V::MultiPolygon(a), V::Polygon(b)) => {
            let srid = merge_srid(a.head.srid, b.head.srid)?;
            let mut polygons = a.polygons;
            polygons.push(b);
            V::MultiPolygon(MultiPolygon::new(polygons, srid)?)
        }
        (V::MultiPolygon(a), V::MultiPolygon(b)) => {
            let srid = merge_srid(a.head.srid, b.head.srid)?;
            let mut polygons = a.polygons;
            polygons.extend(b.polygons);
            V::MultiPolygon(MultiPolygon::new(polygons, srid)?)
        }
        (V::GeometryCollection(a), V::GeometryCollection(b)) => {
            let srid = merge_srid(a.head.srid, b.head.srid)?;
            let mut geometries = a.geometries;
            geometries.extend(b.geometries);
            V::GeometryCollection(GeometryCollection::new(geometries, srid)?)
        }
        (V::GeometryCollection(a), other) => {
            let srid = a.head.srid;
            let mut geometries = a.geometries;
            geometries.push(Geometry::from(other));
            V::GeometryCollection(GeometryCollection::new(geometries, srid)?)
        }
        (other, V::GeometryCollection(b)) => {
            let srid = b.head.srid;
            let mut geometries = vec![Geometry::from(other)];
            geometries.extend(b.geometries);
            V::GeometryCollection(GeometryCollection::new(geometries, srid)?)
        }
        (a, b) => V::GeometryCollection(GeometryCollection::new(
            vec![Geometry::from(a), Geometry::from(b)],
            None,
        )?),
    };
    Ok(Geometry::from(out))
}

impl std::ops::Add for Geometry {
    type Output = Result<Geometry>;

    fn add(self, rhs: Geometry) -> Result<Geometry> {
        concat(self, rhs)
    }
}

impl Geometry {
    /// Append `child` to a multigeometry, dispatching on the runtime class.
    ///
    /// Typed multigeometries only admit their member class; collections
    /// admit anything. SRID and dimensionality are validated as in the
    /// typed `append` methods.
    pub fn append(&mut self, child: impl Into<Geometry>) -> Result<()> {
        let child = child.into();
        match self.value_mut()? {
            GeometryValue::MultiPoint(mp) => match child.into_value()? {
                GeometryValue::Point(p) => mp.append(p),
                other => Err(PggeomError::Collection(format!(
                    "cannot append a {} to a MultiPoint",
                    other.geometry_type().as_str()
                ))),
            },
            GeometryValue::MultiLineString(mls) => match child.into_value()? {
                GeometryValue::LineString(ls) => mls.append(ls),
                other => Err(PggeomError::Collection(format!(
                    "cannot append a {} to a MultiLineString",
                    other.geometry_type().as_str()
                ))),
            },
            GeometryValue::MultiPolygon(mp) => match child.into_value()? {
                GeometryValue::Polygon(p) => mp.append(p),
                other => Err(PggeomError::Collection(format!(
                    "cannot append a {} to a MultiPolygon",
                    other.geometry_type().as_str()
                ))),
            },
            GeometryValue::GeometryCollection(gc) => gc.append(child),
            other => Err(PggeomError::Collection(format!(
                "cannot append to a {}",
                other.geometry_type().as_str()
            ))),
        }
    }
}

#[cfg(test)]
mod test {
    use crate::error::PggeomError;
    use crate::model::{
        GeometryCollection, GeometryType, GeometryValue, LineString, MultiPoint, Point, Polygon,
    };
    use crate::Geometry;

    fn pt(x: f64, y: f64) -> Point {
        Point::new(&[x, y], None).unwrap()
    }

    #[test]
    fn point_arity() {
        assert_eq!(Point::new(&[1.0, 2.0], None).unwrap().z(), None);
        assert_eq!(Point::new(&[1.0, 2.0, 3.0], None).unwrap().z(), Some(3.0));
        // three values are never interpreted as X, Y, M
        assert_eq!(Point::new(&[1.0, 2.0, 3.0], None).unwrap().m(), None);
        let zm = Point::new(&[1.0, 2.0, 3.0, 4.0], None).unwrap();
        assert_eq!((zm.z(), zm.m()), (Some(3.0), Some(4.0)));
        assert!(matches!(
            Point::new(&[1.0], None),
            Err(PggeomError::Coordinate(_))
        ));
        assert!(matches!(
            Point::with_dims(&[1.0, 2.0, 3.0], false, false, None),
            Err(PggeomError::Coordinate(_))
        ));
        let m_only = Point::with_dims(&[1.0, 2.0, 3.0], false, true, None).unwrap();
        assert_eq!((m_only.z(), m_only.m()), (None, Some(3.0)));
    }

    #[test]
    fn member_srid_resolution() {
        // all members bare: container keeps its own
        let mp = MultiPoint::new(vec![pt(0.0, 0.0), pt(1.0, 1.0)], Some(4326)).unwrap();
        assert_eq!(mp.srid(), Some(4326));

        // container adopts the members' common SRID
        let mp = MultiPoint::new(
            vec![
                Point::new(&[0.0, 0.0], Some(4326)).unwrap(),
                Point::new(&[1.0, 1.0], None).unwrap(),
            ],
            None,
        )
        .unwrap();
        assert_eq!(mp.srid(), Some(4326));

        // mismatched member SRIDs fail
        assert!(matches!(
            MultiPoint::new(
                vec![
                    Point::new(&[0.0, 0.0], Some(4326)).unwrap(),
                    Point::new(&[1.0, 1.0], Some(3857)).unwrap(),
                ],
                None,
            ),
            Err(PggeomError::Srid(_))
        ));
    }

    #[test]
    fn mixed_member_dimensionality() {
        assert!(matches!(
            MultiPoint::new(
                vec![pt(0.0, 0.0), Point::new(&[1.0, 1.0, 1.0], None).unwrap()],
                None
            ),
            Err(PggeomError::Dimensionality(_))
        ));
        assert!(matches!(
            LineString::new(
                vec![pt(0.0, 0.0), Point::new(&[1.0, 1.0, 1.0], None).unwrap()],
                None
            ),
            Err(PggeomError::Dimensionality(_))
        ));
    }

    #[test]
    fn vertex_srid_is_not_authoritative() {
        let ls = LineString::new(
            vec![
                Point::new(&[0.0, 0.0], Some(4326)).unwrap(),
                Point::new(&[1.0, 1.0], Some(3857)).unwrap(),
            ],
            None,
        )
        .unwrap();
        assert_eq!(ls.srid(), None);
    }

    #[test]
    fn dimension_lift() {
        let mut mp = MultiPoint::new(vec![pt(0.0, 0.0), pt(1.0, 1.0)], None).unwrap();
        mp.set_dimz(true).unwrap();
        assert!(mp.dimz());
        assert!(mp.points().iter().all(|p| p.z() == Some(0.0)));
        // lowering a declared dimension is rejected
        assert!(matches!(
            mp.set_dimz(false),
            Err(PggeomError::Dimensionality(_))
        ));
        // lowering an undeclared one is a no-op
        mp.set_dimm(false).unwrap();
    }

    #[test]
    fn append_and_pop() {
        let mut mp = MultiPoint::new(vec![pt(0.0, 0.0)], Some(4326)).unwrap();
        mp.append(Point::new(&[1.0, 1.0], Some(4326)).unwrap()).unwrap();
        assert_eq!(mp.len(), 2);
        assert!(matches!(
            mp.append(Point::new(&[2.0, 2.0], Some(3857)).unwrap()),
            Err(PggeomError::Srid(_))
        ));
        assert!(matches!(
            mp.append(Point::new(&[2.0, 2.0, 2.0], None).unwrap()),
            Err(PggeomError::Dimensionality(_))
        ));
        assert_eq!(mp.pop().unwrap().x(), 1.0);
        assert_eq!(mp.remove(0).unwrap().x(), 0.0);
        assert!(mp.remove(0).is_none());
    }

    #[test]
    fn typed_append_dispatch() {
        let mut g = Geometry::from(MultiPoint::new(vec![pt(0.0, 0.0)], None).unwrap());
        g.append(pt(1.0, 1.0)).unwrap();
        assert!(matches!(
            g.append(LineString::new(vec![pt(0.0, 0.0), pt(1.0, 1.0)], None).unwrap()),
            Err(PggeomError::Collection(_))
        ));
        let mut p = Geometry::from(pt(0.0, 0.0));
        assert!(matches!(
            p.append(pt(1.0, 1.0)),
            Err(PggeomError::Collection(_))
        ));
    }

    #[test]
    fn concat_same_class() {
        let g = (Geometry::from(pt(0.0, 0.0)) + Geometry::from(pt(1.0, 1.0))).unwrap();
        assert_eq!(g.geometry_type(), GeometryType::MultiPoint);

        let mp = Geometry::from(MultiPoint::new(vec![pt(0.0, 0.0)], None).unwrap());
        let g = (mp + Geometry::from(pt(1.0, 1.0))).unwrap();
        let GeometryValue::MultiPoint(mp) = g.into_value().unwrap() else {
            panic!("expected a MultiPoint");
        };
        assert_eq!(mp.len(), 2);
    }

    #[test]
    fn concat_single_with_multi_polygon() {
        let ring = LineString::new(
            vec![pt(0.0, 0.0), pt(1.0, 0.0), pt(1.0, 1.0), pt(0.0, 0.0)],
            None,
        )
        .unwrap();
        let poly = Polygon::new(vec![ring], None).unwrap();
        let mp = crate::MultiPolygon::new(vec![poly.clone()], None).unwrap();
        let g = (Geometry::from(poly) + Geometry::from(mp)).unwrap();
        assert_eq!(g.geometry_type(), GeometryType::MultiPolygon);
    }

    #[test]
    fn concat_unrelated_classes() {
        let ls = LineString::new(vec![pt(0.0, 0.0), pt(1.0, 1.0)], None).unwrap();
        let g = (Geometry::from(pt(0.0, 0.0)) + Geometry::from(ls)).unwrap();
        assert_eq!(g.geometry_type(), GeometryType::GeometryCollection);
    }

    #[test]
    fn concat_with_collection_flattens() {
        let gc = GeometryCollection::new(vec![Geometry::from(pt(0.0, 0.0))], None).unwrap();
        let g = (Geometry::from(gc) + Geometry::from(pt(1.0, 1.0))).unwrap();
        let GeometryValue::GeometryCollection(gc) = g.into_value().unwrap() else {
            panic!("expected a GeometryCollection");
        };
        assert_eq!(gc.len(), 2);
    }

    #[test]
    fn concat_srid_conflict() {
        let a = Geometry::from(Point::new(&[0.0, 0.0], Some(4326)).unwrap());
        let b = Geometry::from(Point::new(&[1.0, 1.0], Some(3857)).unwrap());
        assert!(matches!(a + b, Err(PggeomError::Srid(_))));
    }
}
