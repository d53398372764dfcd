//! EWKB/WKB binary codec.
//!
//! Input accepts both byte orders, plain OGC type words and PostGIS-flagged
//! ones; output is always little-endian. The PostGIS flag bits live in the
//! top byte of the type word (Z `0x8000_0000`, M `0x4000_0000`, SRID
//! `0x2000_0000`); the base class is the low byte. ISO 1000-offset type
//! codes are not supported.

mod wkb_reader;
mod wkb_writer;

pub(crate) use wkb_reader::{read_geometry, read_header};
pub(crate) use wkb_writer::write_geometry;

use crate::error::{PggeomError, Result};

pub(crate) const FLAG_Z: u32 = 0x8000_0000;
pub(crate) const FLAG_M: u32 = 0x4000_0000;
pub(crate) const FLAG_SRID: u32 = 0x2000_0000;

/// WKB dialect selected on emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WkbDialect {
    /// OGC WKB: the SRID is never written.
    Wkb,
    /// PostGIS EWKB: the outermost header carries the SRID when one is set.
    Ewkb,
}

/// Decode a hex string, either case, into WKB bytes.
pub(crate) fn decode_hex(s: &str) -> Result<Vec<u8>> {
    hex::decode(s).map_err(|e| {
        PggeomError::Wkb(match e {
            hex::FromHexError::OddLength => "odd-length hex string".to_string(),
            hex::FromHexError::InvalidHexCharacter { c, index } => {
                format!("invalid hex character `{c}` at offset {index}")
            }
            e => e.to_string(),
        })
    })
}
