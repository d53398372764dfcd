//! Bridge for foreign objects exposing a `__geo_interface__`-style mapping.

use serde_json::Value;

/// A foreign shape convertible through a GeoJSON-like mapping.
///
/// Any object able to describe itself as a mapping with a `type` key and
/// `coordinates` (or `geometries`) can be consumed by
/// [`Geometry::from_shape`](crate::Geometry::from_shape); the library
/// produces the same mapping shape through
/// [`Geometry::to_shape`](crate::Geometry::to_shape).
pub trait GeoShape {
    /// The mapping describing the shape, or `None` when the object cannot
    /// produce one.
    fn geo_interface(&self) -> Option<Value>;
}

impl GeoShape for Value {
    fn geo_interface(&self) -> Option<Value> {
        self.is_object().then(|| self.clone())
    }
}
