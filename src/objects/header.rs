//! File header object: version, external-reference flag, size hints and the
//! free-form authoring string.

use crate::codec::{M3gReader, M3gWriter};
use crate::util::Result;

/// The single object in a file's header section, always table index 1.
#[derive(Clone, Debug, PartialEq)]
pub struct Header {
    pub version_major: u8,
    pub version_minor: u8,
    pub has_external_references: bool,
    /// Size of this file in bytes, advisory. Recomputed on save.
    pub total_file_size: u32,
    /// Total size including referenced external files, advisory.
    pub approximate_content_size: u32,
    pub authoring_field: String,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            version_major: 1,
            version_minor: 0,
            has_external_references: false,
            total_file_size: 0,
            approximate_content_size: 0,
            authoring_field: String::new(),
        }
    }
}

impl Header {
    pub(crate) fn decode(r: &mut M3gReader<'_>) -> Result<Self> {
        Ok(Self {
            version_major: r.read_u8()?,
            version_minor: r.read_u8()?,
            has_external_references: r.read_bool()?,
            total_file_size: r.read_u32()?,
            approximate_content_size: r.read_u32()?,
            authoring_field: r.read_string()?,
        })
    }

    pub(crate) fn encode(&self, w: &mut M3gWriter) -> Result<()> {
        w.write_u8(self.version_major);
        w.write_u8(self.version_minor);
        w.write_bool(self.has_external_references);
        w.write_u32(self.total_file_size);
        w.write_u32(self.approximate_content_size);
        w.write_string(&self.authoring_field)
    }
}
