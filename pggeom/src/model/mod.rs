//! The in-memory geometry model: seven variant types sharing a common header.
//!
//! Every variant carries a [`Head`] with the SRID and the Z/M dimensionality
//! flags. Composite variants own their members; member SRIDs must be absent
//! or equal to the container's, and member dimensionality must agree with
//! the container's. Both rules are checked one level deep only.

mod ops;

use crate::error::{PggeomError, Result};
use crate::geometry::Geometry;

/// Base geometry class of the OGC type word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryType {
    Point = 1,
    LineString = 2,
    Polygon = 3,
    MultiPoint = 4,
    MultiLineString = 5,
    MultiPolygon = 6,
    GeometryCollection = 7,
}

impl GeometryType {
    pub(crate) fn from_u32(value: u32) -> Option<Self> {
        match value {
            1 => Some(GeometryType::Point),
            2 => Some(GeometryType::LineString),
            3 => Some(GeometryType::Polygon),
            4 => Some(GeometryType::MultiPoint),
            5 => Some(GeometryType::MultiLineString),
            6 => Some(GeometryType::MultiPolygon),
            7 => Some(GeometryType::GeometryCollection),
            _ => None,
        }
    }

    /// RFC 7946 name, also used in error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            GeometryType::Point => "Point",
            GeometryType::LineString => "LineString",
            GeometryType::Polygon => "Polygon",
            GeometryType::MultiPoint => "MultiPoint",
            GeometryType::MultiLineString => "MultiLineString",
            GeometryType::MultiPolygon => "MultiPolygon",
            GeometryType::GeometryCollection => "GeometryCollection",
        }
    }

    pub(crate) fn wkt_tag(&self) -> &'static str {
        match self {
            GeometryType::Point => "POINT",
            GeometryType::LineString => "LINESTRING",
            GeometryType::Polygon => "POLYGON",
            GeometryType::MultiPoint => "MULTIPOINT",
            GeometryType::MultiLineString => "MULTILINESTRING",
            GeometryType::MultiPolygon => "MULTIPOLYGON",
            GeometryType::GeometryCollection => "GEOMETRYCOLLECTION",
        }
    }
}

/// Shared geometry header: SRID and dimensionality flags.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub(crate) struct Head {
    pub srid: Option<i32>,
    pub dimz: bool,
    pub dimm: bool,
}

/// Fold a member header into a container header.
///
/// A member SRID must be absent or equal to the container's; a container
/// without an SRID adopts the members' common one. Dimensionality is adopted
/// from the first member and must match afterwards.
pub(crate) fn admit_member(head: &mut Head, member: &Head, first: bool, kind: &str) -> Result<()> {
    match (head.srid, member.srid) {
        (_, None) => {}
        (None, Some(s)) => head.srid = Some(s),
        (Some(a), Some(b)) if a == b => {}
        (Some(a), Some(b)) => {
            return Err(PggeomError::Srid(format!(
                "{kind} member has SRID {b} but the container has SRID {a}"
            )));
        }
    }
    if first {
        head.dimz = member.dimz;
        head.dimm = member.dimm;
    } else if (head.dimz, head.dimm) != (member.dimz, member.dimm) {
        return Err(PggeomError::Dimensionality(format!(
            "{kind} member dimensionality does not match its container"
        )));
    }
    Ok(())
}

/// Like [`admit_member`] but ignores the member SRID (vertex and ring SRIDs
/// are not authoritative).
fn fold_dims(head: &mut Head, member: &Head, first: bool, kind: &str) -> Result<()> {
    if first {
        head.dimz = member.dimz;
        head.dimm = member.dimm;
    } else if (head.dimz, head.dimm) != (member.dimz, member.dimm) {
        return Err(PggeomError::Dimensionality(format!(
            "{kind} have mixed dimensionality"
        )));
    }
    Ok(())
}

macro_rules! impl_common {
    ($t:ident, $tag:ident) => {
        impl $t {
            /// Geometry class tag.
            pub fn geometry_type(&self) -> GeometryType {
                GeometryType::$tag
            }

            /// Spatial reference identifier, if any.
            pub fn srid(&self) -> Option<i32> {
                self.head.srid
            }

            /// Set or clear the SRID. Does not descend into members.
            pub fn set_srid(&mut self, srid: Option<i32>) {
                self.head.srid = srid;
            }

            /// Whether a Z dimension is declared.
            pub fn dimz(&self) -> bool {
                self.head.dimz
            }

            /// Whether an M dimension is declared.
            pub fn dimm(&self) -> bool {
                self.head.dimm
            }

            /// Declare the Z dimension, zero-filling `z` on every reachable
            /// point. A declared dimension cannot be removed.
            pub fn set_dimz(&mut self, dimz: bool) -> Result<()> {
                if dimz == self.head.dimz {
                    return Ok(());
                }
                if !dimz {
                    return Err(PggeomError::Dimensionality(
                        "the Z dimension cannot be removed once declared".into(),
                    ));
                }
                self.lift_z()
            }

            /// Declare the M dimension, zero-filling `m` on every reachable
            /// point. A declared dimension cannot be removed.
            pub fn set_dimm(&mut self, dimm: bool) -> Result<()> {
                if dimm == self.head.dimm {
                    return Ok(());
                }
                if !dimm {
                    return Err(PggeomError::Dimensionality(
                        "the M dimension cannot be removed once declared".into(),
                    ));
                }
                self.lift_m()
            }
        }
    };
}

// --- Point

#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub(crate) head: Head,
    pub(crate) x: f64,
    pub(crate) y: f64,
    pub(crate) z: f64,
    pub(crate) m: f64,
}

impl Point {
    /// Build a point from 2, 3 or 4 coordinate values. Three values are
    /// interpreted as X, Y, Z (never M).
    pub fn new(coords: &[f64], srid: Option<i32>) -> Result<Self> {
        match coords.len() {
            3 => Self::with_dims(coords, true, false, srid),
            4 => Self::with_dims(coords, true, true, srid),
            _ => Self::with_dims(coords, false, false, srid),
        }
    }

    /// Build a point with an explicit dimensionality. The coordinate count
    /// must match the declared dimensions exactly.
    pub fn with_dims(coords: &[f64], dimz: bool, dimm: bool, srid: Option<i32>) -> Result<Self> {
        let want = 2 + usize::from(dimz) + usize::from(dimm);
        if coords.len() != want {
            return Err(PggeomError::Coordinate(format!(
                "got {} coordinate values, expected {want}",
                coords.len()
            )));
        }
        let mut rest = coords[2..].iter().copied();
        let z = if dimz { rest.next().unwrap_or(0.0) } else { 0.0 };
        let m = if dimm { rest.next().unwrap_or(0.0) } else { 0.0 };
        Ok(Point {
            head: Head { srid, dimz, dimm },
            x: coords[0],
            y: coords[1],
            z,
            m,
        })
    }

    pub(crate) fn from_raw(head: Head, x: f64, y: f64, z: f64, m: f64) -> Self {
        Point { head, x, y, z, m }
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    /// Z value, present only when the Z dimension is declared.
    pub fn z(&self) -> Option<f64> {
        self.head.dimz.then_some(self.z)
    }

    /// M value, present only when the M dimension is declared.
    pub fn m(&self) -> Option<f64> {
        self.head.dimm.then_some(self.m)
    }

    pub fn set_x(&mut self, x: f64) {
        self.x = x;
    }

    pub fn set_y(&mut self, y: f64) {
        self.y = y;
    }

    /// Replace the Z value. The Z dimension must already be declared.
    pub fn set_z(&mut self, z: f64) -> Result<()> {
        if !self.head.dimz {
            return Err(PggeomError::Dimensionality(
                "point has no Z dimension".into(),
            ));
        }
        self.z = z;
        Ok(())
    }

    /// Replace the M value. The M dimension must already be declared.
    pub fn set_m(&mut self, m: f64) -> Result<()> {
        if !self.head.dimm {
            return Err(PggeomError::Dimensionality(
                "point has no M dimension".into(),
            ));
        }
        self.m = m;
        Ok(())
    }

    /// Coordinate values in X, Y, Z, M order, restricted to the declared
    /// dimensions.
    pub fn coords(&self) -> Vec<f64> {
        let mut out = vec![self.x, self.y];
        if self.head.dimz {
            out.push(self.z);
        }
        if self.head.dimm {
            out.push(self.m);
        }
        out
    }

    pub(crate) fn lift_z(&mut self) -> Result<()> {
        self.head.dimz = true;
        Ok(())
    }

    pub(crate) fn lift_m(&mut self) -> Result<()> {
        self.head.dimm = true;
        Ok(())
    }
}

impl_common!(Point, Point);

// --- LineString

#[derive(Debug, Clone, PartialEq)]
pub struct LineString {
    pub(crate) head: Head,
    pub(crate) points: Vec<Point>,
}

impl LineString {
    /// Build from vertices. All vertices must share one dimensionality;
    /// vertex SRIDs are not authoritative and are ignored.
    pub fn new(points: Vec<Point>, srid: Option<i32>) -> Result<Self> {
        let mut head = Head {
            srid,
            ..Head::default()
        };
        for (i, p) in points.iter().enumerate() {
            fold_dims(&mut head, &p.head, i == 0, "line string vertices")?;
        }
        Ok(LineString { head, points })
    }

    pub(crate) fn from_raw(head: Head, points: Vec<Point>) -> Self {
        LineString { head, points }
    }

    /// Vertices of the line string.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub(crate) fn lift_z(&mut self) -> Result<()> {
        self.head.dimz = true;
        for p in &mut self.points {
            p.lift_z()?;
        }
        Ok(())
    }

    pub(crate) fn lift_m(&mut self) -> Result<()> {
        self.head.dimm = true;
        for p in &mut self.points {
            p.lift_m()?;
        }
        Ok(())
    }
}

impl_common!(LineString, LineString);

// --- Polygon

#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub(crate) head: Head,
    pub(crate) rings: Vec<LineString>,
}

impl Polygon {
    /// Build from linear rings. The first ring is the exterior by
    /// convention; closure and orientation are not validated. Ring SRIDs
    /// are ignored.
    pub fn new(rings: Vec<LineString>, srid: Option<i32>) -> Result<Self> {
        let mut head = Head {
            srid,
            ..Head::default()
        };
        for (i, r) in rings.iter().enumerate() {
            fold_dims(&mut head, &r.head, i == 0, "polygon rings")?;
        }
        Ok(Polygon { head, rings })
    }

    pub(crate) fn from_raw(head: Head, rings: Vec<LineString>) -> Self {
        Polygon { head, rings }
    }

    pub fn rings(&self) -> &[LineString] {
        &self.rings
    }

    /// The exterior ring, by convention the first one.
    pub fn exterior(&self) -> Option<&LineString> {
        self.rings.first()
    }

    /// Interior rings (holes).
    pub fn interiors(&self) -> &[LineString] {
        self.rings.get(1..).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.rings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rings.is_empty()
    }

    pub(crate) fn lift_z(&mut self) -> Result<()> {
        self.head.dimz = true;
        for r in &mut self.rings {
            r.lift_z()?;
        }
        Ok(())
    }

    pub(crate) fn lift_m(&mut self) -> Result<()> {
        self.head.dimm = true;
        for r in &mut self.rings {
            r.lift_m()?;
        }
        Ok(())
    }
}

impl_common!(Polygon, Polygon);

// --- Typed multigeometries

macro_rules! multi_type {
    ($(#[$doc:meta])* $name:ident, $item:ident, $field:ident, $tag:ident, $kind:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name {
            pub(crate) head: Head,
            pub(crate) $field: Vec<$item>,
        }

        impl $name {
            /// Build from members, resolving the container SRID and
            /// dimensionality against theirs.
            pub fn new($field: Vec<$item>, srid: Option<i32>) -> Result<Self> {
                let mut head = Head { srid, ..Head::default() };
                for (i, g) in $field.iter().enumerate() {
                    admit_member(&mut head, &g.head, i == 0, $kind)?;
                }
                Ok($name { head, $field })
            }

            pub(crate) fn from_raw(head: Head, $field: Vec<$item>) -> Self {
                $name { head, $field }
            }

            pub fn $field(&self) -> &[$item] {
                &self.$field
            }

            pub fn len(&self) -> usize {
                self.$field.len()
            }

            pub fn is_empty(&self) -> bool {
                self.$field.is_empty()
            }

            pub fn iter(&self) -> std::slice::Iter<'_, $item> {
                self.$field.iter()
            }

            /// Append a member after validating its SRID and dimensionality
            /// against the container's.
            pub fn append(&mut self, member: $item) -> Result<()> {
                admit_member(&mut self.head, &member.head, self.$field.is_empty(), $kind)?;
                self.$field.push(member);
                Ok(())
            }

            /// Remove and return the last member.
            pub fn pop(&mut self) -> Option<$item> {
                self.$field.pop()
            }

            /// Remove and return the member at `index`, or `None` when out
            /// of range.
            pub fn remove(&mut self, index: usize) -> Option<$item> {
                (index < self.$field.len()).then(|| self.$field.remove(index))
            }

            pub(crate) fn lift_z(&mut self) -> Result<()> {
                self.head.dimz = true;
                for g in &mut self.$field {
                    g.lift_z()?;
                }
                Ok(())
            }

            pub(crate) fn lift_m(&mut self) -> Result<()> {
                self.head.dimm = true;
                for g in &mut self.$field {
                    g.lift_m()?;
                }
                Ok(())
            }
        }

        impl std::ops::Index<usize> for $name {
            type Output = $item;

            fn index(&self, index: usize) -> &$item {
                &self.$field[index]
            }
        }

        impl<'a> IntoIterator for &'a $name {
            type Item = &'a $item;
            type IntoIter = std::slice::Iter<'a, $item>;

            fn into_iter(self) -> Self::IntoIter {
                self.$field.iter()
            }
        }

        impl_common!($name, $tag);
    };
}

multi_type!(
    /// An ordered set of points.
    MultiPoint, Point, points, MultiPoint, "multi point"
);
multi_type!(
    /// An ordered set of line strings.
    MultiLineString, LineString, lines, MultiLineString, "multi line string"
);
multi_type!(
    /// An ordered set of polygons.
    MultiPolygon, Polygon, polygons, MultiPolygon, "multi polygon"
);

// --- GeometryCollection

/// An ordered set of arbitrary geometries sharing SRID and dimensionality.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryCollection {
    pub(crate) head: Head,
    pub(crate) geometries: Vec<Geometry>,
}

impl GeometryCollection {
    /// Build from members of any class, resolving the container SRID and
    /// dimensionality against theirs.
    pub fn new(geometries: Vec<Geometry>, srid: Option<i32>) -> Result<Self> {
        let mut head = Head {
            srid,
            ..Head::default()
        };
        for (i, g) in geometries.iter().enumerate() {
            admit_member(&mut head, &g.head(), i == 0, "geometry collection")?;
        }
        Ok(GeometryCollection { head, geometries })
    }

    pub(crate) fn from_raw(head: Head, geometries: Vec<Geometry>) -> Self {
        GeometryCollection { head, geometries }
    }

    pub fn geometries(&self) -> &[Geometry] {
        &self.geometries
    }

    pub(crate) fn geometries_mut(&mut self) -> &mut [Geometry] {
        &mut self.geometries
    }

    pub fn len(&self) -> usize {
        self.geometries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.geometries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Geometry> {
        self.geometries.iter()
    }

    /// Append a geometry of any class after validating its SRID and
    /// dimensionality against the container's.
    pub fn append(&mut self, geometry: impl Into<Geometry>) -> Result<()> {
        let geometry = geometry.into();
        admit_member(
            &mut self.head,
            &geometry.head(),
            self.geometries.is_empty(),
            "geometry collection",
        )?;
        self.geometries.push(geometry);
        Ok(())
    }

    /// Remove and return the last member.
    pub fn pop(&mut self) -> Option<Geometry> {
        self.geometries.pop()
    }

    /// Remove and return the member at `index`, or `None` when out of range.
    pub fn remove(&mut self, index: usize) -> Option<Geometry> {
        (index < self.geometries.len()).then(|| self.geometries.remove(index))
    }

    pub(crate) fn lift_z(&mut self) -> Result<()> {
        self.head.dimz = true;
        for g in &mut self.geometries {
            g.lift_z()?;
        }
        Ok(())
    }

    pub(crate) fn lift_m(&mut self) -> Result<()> {
        self.head.dimm = true;
        for g in &mut self.geometries {
            g.lift_m()?;
        }
        Ok(())
    }
}

impl std::ops::Index<usize> for GeometryCollection {
    type Output = Geometry;

    fn index(&self, index: usize) -> &Geometry {
        &self.geometries[index]
    }
}

impl<'a> IntoIterator for &'a GeometryCollection {
    type Item = &'a Geometry;
    type IntoIter = std::slice::Iter<'a, Geometry>;

    fn into_iter(self) -> Self::IntoIter {
        self.geometries.iter()
    }
}

impl_common!(GeometryCollection, GeometryCollection);

// --- Closed sum over the seven variants

/// A fully materialized geometry of any class.
#[derive(Debug, Clone, PartialEq)]
pub enum GeometryValue {
    Point(Point),
    LineString(LineString),
    Polygon(Polygon),
    MultiPoint(MultiPoint),
    MultiLineString(MultiLineString),
    MultiPolygon(MultiPolygon),
    GeometryCollection(GeometryCollection),
}

impl GeometryValue {
    pub fn geometry_type(&self) -> GeometryType {
        match self {
            GeometryValue::Point(_) => GeometryType::Point,
            GeometryValue::LineString(_) => GeometryType::LineString,
            GeometryValue::Polygon(_) => GeometryType::Polygon,
            GeometryValue::MultiPoint(_) => GeometryType::MultiPoint,
            GeometryValue::MultiLineString(_) => GeometryType::MultiLineString,
            GeometryValue::MultiPolygon(_) => GeometryType::MultiPolygon,
            GeometryValue::GeometryCollection(_) => GeometryType::GeometryCollection,
        }
    }

    pub(crate) fn head(&self) -> &Head {
        match self {
            GeometryValue::Point(g) => &g.head,
            GeometryValue::LineString(g) => &g.head,
            GeometryValue::Polygon(g) => &g.head,
            GeometryValue::MultiPoint(g) => &g.head,
            GeometryValue::MultiLineString(g) => &g.head,
            GeometryValue::MultiPolygon(g) => &g.head,
            GeometryValue::GeometryCollection(g) => &g.head,
        }
    }

    pub(crate) fn head_mut(&mut self) -> &mut Head {
        match self {
            GeometryValue::Point(g) => &mut g.head,
            GeometryValue::LineString(g) => &mut g.head,
            GeometryValue::Polygon(g) => &mut g.head,
            GeometryValue::MultiPoint(g) => &mut g.head,
            GeometryValue::MultiLineString(g) => &mut g.head,
            GeometryValue::MultiPolygon(g) => &mut g.head,
            GeometryValue::GeometryCollection(g) => &mut g.head,
        }
    }

    pub fn srid(&self) -> Option<i32> {
        self.head().srid
    }

    pub fn dimz(&self) -> bool {
        self.head().dimz
    }

    pub fn dimm(&self) -> bool {
        self.head().dimm
    }

    pub(crate) fn lift_z(&mut self) -> Result<()> {
        match self {
            GeometryValue::Point(g) => g.lift_z(),
            GeometryValue::LineString(g) => g.lift_z(),
            GeometryValue::Polygon(g) => g.lift_z(),
            GeometryValue::MultiPoint(g) => g.lift_z(),
            GeometryValue::MultiLineString(g) => g.lift_z(),
            GeometryValue::MultiPolygon(g) => g.lift_z(),
            GeometryValue::GeometryCollection(g) => g.lift_z(),
        }
    }

    pub(crate) fn lift_m(&mut self) -> Result<()> {
        match self {
            GeometryValue::Point(g) => g.lift_m(),
            GeometryValue::LineString(g) => g.lift_m(),
            GeometryValue::Polygon(g) => g.lift_m(),
            GeometryValue::MultiPoint(g) => g.lift_m(),
            GeometryValue::MultiLineString(g) => g.lift_m(),
            GeometryValue::MultiPolygon(g) => g.lift_m(),
            GeometryValue::GeometryCollection(g) => g.lift_m(),
        }
    }
}

macro_rules! impl_from_variant {
    ($variant:ident, $t:ident) => {
        impl From<$t> for GeometryValue {
            fn from(g: $t) -> GeometryValue {
                GeometryValue::$variant(g)
            }
        }
    };
}

impl_from_variant!(Point, Point);
impl_from_variant!(LineString, LineString);
impl_from_variant!(Polygon, Polygon);
impl_from_variant!(MultiPoint, MultiPoint);
impl_from_variant!(MultiLineString, MultiLineString);
impl_from_variant!(MultiPolygon, MultiPolygon);
impl_from_variant!(GeometryCollection, GeometryCollection);
