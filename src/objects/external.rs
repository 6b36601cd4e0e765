//! External reference: a URI placeholder another file's content stands
//! behind.
//!
//! An external reference is not a scene-graph node. When a reference index
//! lands on a table slot holding one, resolution substitutes its resolved
//! target; an unresolved placeholder makes that resolution fail.

use crate::codec::{M3gReader, M3gWriter};
use crate::objects::SceneObject;
use crate::util::Result;

/// Placeholder for an object loaded from another file.
#[derive(Clone, Debug, PartialEq)]
pub struct ExternalReference {
    pub uri: String,
    /// Substitute object supplied by the caller's resolver, if any.
    pub resolved: Option<Box<SceneObject>>,
}

impl ExternalReference {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            resolved: None,
        }
    }

    pub(crate) fn decode(r: &mut M3gReader<'_>) -> Result<Self> {
        Ok(Self::new(r.read_string()?))
    }

    pub(crate) fn encode(&self, w: &mut M3gWriter) -> Result<()> {
        w.write_string(&self.uri)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_ignores_resolution() {
        let ext = ExternalReference::new("textures/stone.png");
        let mut w = M3gWriter::new();
        ext.encode(&mut w).unwrap();
        let bytes = w.into_inner();
        assert_eq!(bytes, b"textures/stone.png\0");
        let mut r = M3gReader::new(&bytes);
        let back = ExternalReference::decode(&mut r).unwrap();
        assert_eq!(back.uri, ext.uri);
        assert!(back.resolved.is_none());
    }
}
