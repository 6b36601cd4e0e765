//! Camera node: projection definition.

use glam::Mat4;

use crate::codec::{M3gReader, M3gWriter};
use crate::objects::node::{NodeData, Transform};
use crate::objects::ObjectBase;
use crate::table::{EncodeContext, ObjectTable};
use crate::util::{Error, Result};

/// Camera projection.
#[derive(Clone, Debug, PartialEq)]
pub enum Projection {
    /// Arbitrary projection matrix.
    Generic(Mat4),
    /// Orthographic; `fovy` is the view volume height in camera units.
    Parallel {
        fovy: f32,
        aspect_ratio: f32,
        near: f32,
        far: f32,
    },
    /// Perspective; `fovy` is the vertical field of view in degrees.
    Perspective {
        fovy: f32,
        aspect_ratio: f32,
        near: f32,
        far: f32,
    },
}

impl Default for Projection {
    fn default() -> Self {
        Self::Generic(Mat4::IDENTITY)
    }
}

/// Camera scene object.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Camera {
    pub base: ObjectBase,
    pub transform: Transform,
    pub node: NodeData,
    pub projection: Projection,
}

impl Camera {
    pub(crate) fn decode(r: &mut M3gReader<'_>, table: &mut ObjectTable) -> Result<Self> {
        let base = ObjectBase::decode(r, table)?;
        let transform = Transform::decode(r)?;
        let node = NodeData::decode(r, table)?;
        let kind = r.read_u8()?;
        let projection = match kind {
            48 => Projection::Generic(r.read_matrix()?),
            49 | 50 => {
                let fovy = r.read_f32()?;
                let aspect_ratio = r.read_f32()?;
                let near = r.read_f32()?;
                let far = r.read_f32()?;
                if kind == 49 {
                    Projection::Parallel {
                        fovy,
                        aspect_ratio,
                        near,
                        far,
                    }
                } else {
                    Projection::Perspective {
                        fovy,
                        aspect_ratio,
                        near,
                        far,
                    }
                }
            }
            other => return Err(Error::bad_enum("projectionType", other)),
        };
        Ok(Self {
            base,
            transform,
            node,
            projection,
        })
    }

    pub(crate) fn encode(&self, w: &mut M3gWriter, ctx: &EncodeContext<'_>) -> Result<()> {
        self.base.encode(w, ctx)?;
        self.transform.encode(w);
        self.node.encode(w, ctx)?;
        match &self.projection {
            Projection::Generic(m) => {
                w.write_u8(48);
                w.write_matrix(m);
            }
            Projection::Parallel {
                fovy,
                aspect_ratio,
                near,
                far,
            } => {
                w.write_u8(49);
                w.write_f32(*fovy);
                w.write_f32(*aspect_ratio);
                w.write_f32(*near);
                w.write_f32(*far);
            }
            Projection::Perspective {
                fovy,
                aspect_ratio,
                near,
                far,
            } => {
                w.write_u8(50);
                w.write_f32(*fovy);
                w.write_f32(*aspect_ratio);
                w.write_f32(*near);
                w.write_f32(*far);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ObjectIndex;

    fn roundtrip(cam: &Camera) -> Camera {
        let table = ObjectTable::new();
        let ctx = EncodeContext {
            table: &table,
            current: ObjectIndex(1),
        };
        let mut w = M3gWriter::new();
        cam.encode(&mut w, &ctx).unwrap();
        let bytes = w.into_inner();
        let mut table = ObjectTable::new();
        let mut r = M3gReader::new(&bytes);
        let back = Camera::decode(&mut r, &mut table).unwrap();
        assert!(r.at_end());
        back
    }

    #[test]
    fn test_perspective_roundtrip() {
        let cam = Camera {
            projection: Projection::Perspective {
                fovy: 60.0,
                aspect_ratio: 1.5,
                near: 0.1,
                far: 100.0,
            },
            ..Camera::default()
        };
        assert_eq!(roundtrip(&cam), cam);
    }

    #[test]
    fn test_generic_projection_roundtrip() {
        let cam = Camera {
            projection: Projection::Generic(Mat4::from_scale(glam::Vec3::new(1.0, 2.0, 3.0))),
            ..Camera::default()
        };
        assert_eq!(roundtrip(&cam), cam);
    }

    #[test]
    fn test_bad_projection_type() {
        let table = ObjectTable::new();
        let ctx = EncodeContext {
            table: &table,
            current: ObjectIndex(1),
        };
        let mut w = M3gWriter::new();
        let cam = Camera::default();
        cam.base.encode(&mut w, &ctx).unwrap();
        cam.transform.encode(&mut w);
        cam.node.encode(&mut w, &ctx).unwrap();
        w.write_u8(51);
        let bytes = w.into_inner();
        let mut table = ObjectTable::new();
        let mut r = M3gReader::new(&bytes);
        assert!(matches!(
            Camera::decode(&mut r, &mut table),
            Err(Error::InvalidEnumValue { field: "projectionType", value: 51 })
        ));
    }
}
