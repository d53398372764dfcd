//! Error and Result types.
use thiserror::Error;

/// All failure modes of the crate.
///
/// Decoders fail fast: the first structural violation aborts the conversion
/// and no partial geometry is returned. Reason strings include a byte or
/// character offset where one is available.
#[derive(Error, Debug)]
pub enum PggeomError {
    /// Malformed hex or WKB/EWKB input, or an unsupported binary record.
    #[error("invalid WKB: {0}")]
    Wkb(String),
    /// Lex or parse failure in WKT/EWKT, or an unrepresentable number on emission.
    #[error("invalid WKT: {0}")]
    Wkt(String),
    /// Malformed or unsupported GeoJSON object.
    #[error("invalid GeoJSON: {0}")]
    Geojson(String),
    /// Conflicting SRIDs across the members of a composite geometry.
    #[error("SRID mismatch: {0}")]
    Srid(String),
    /// Wrong geometry class inserted into a typed multigeometry.
    #[error("invalid collection member: {0}")]
    Collection(String),
    /// Coordinate count inconsistent with the declared dimensionality.
    #[error("invalid coordinate: {0}")]
    Coordinate(String),
    /// Dimensionality removal or a container/member dimensionality conflict.
    #[error("invalid dimensionality: {0}")]
    Dimensionality(String),
    /// A foreign-shape conversion was requested but no geometry interface is available.
    #[error("missing dependency: {0}")]
    Dependency(String),
}

pub type Result<T> = std::result::Result<T, PggeomError>;
