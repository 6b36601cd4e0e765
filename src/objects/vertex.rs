//! VertexArray and VertexBuffer: per-vertex attribute storage.

use crate::codec::{ColorRgba, M3gReader, M3gWriter, ObjectIndex};
use crate::objects::{ObjectBase, ObjectType};
use crate::table::{EncodeContext, Expect, ObjectTable};
use crate::util::{Error, Result};

/// Component storage of a vertex array. The on-wire width is whatever the
/// encoder picked; in memory the values are kept at the width they were
/// supplied with.
#[derive(Clone, Debug, PartialEq)]
pub enum VertexValues {
    Byte(Vec<i8>),
    Short(Vec<i16>),
}

impl VertexValues {
    pub fn len(&self) -> usize {
        match self {
            Self::Byte(v) => v.len(),
            Self::Short(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for VertexValues {
    fn default() -> Self {
        Self::Short(Vec::new())
    }
}

/// Array of vertexCount × componentCount signed integer components.
#[derive(Clone, Debug, PartialEq)]
pub struct VertexArray {
    pub base: ObjectBase,
    /// Components per vertex, 2 to 4.
    pub component_count: u8,
    pub values: VertexValues,
}

impl Default for VertexArray {
    fn default() -> Self {
        Self {
            base: ObjectBase::default(),
            component_count: 3,
            values: VertexValues::default(),
        }
    }
}

impl VertexArray {
    /// Number of vertices held.
    pub fn vertex_count(&self) -> usize {
        self.values.len() / self.component_count as usize
    }

    fn validate(&self) -> Result<()> {
        if !(2..=4).contains(&self.component_count) {
            return Err(Error::bad_enum("componentCount", self.component_count));
        }
        if self.values.len() % self.component_count as usize != 0 {
            return Err(Error::invalid(
                "vertex array length is not a multiple of its component count",
            ));
        }
        if self.vertex_count() > u16::MAX as usize {
            return Err(Error::invalid("vertex array holds more than 65535 vertices"));
        }
        Ok(())
    }

    pub(crate) fn decode(r: &mut M3gReader<'_>, table: &mut ObjectTable) -> Result<Self> {
        let base = ObjectBase::decode(r, table)?;
        let component_size = r.read_u8()?;
        let component_count = r.read_u8()?;
        if !(2..=4).contains(&component_count) {
            return Err(Error::bad_enum("componentCount", component_count));
        }
        let encoding = r.read_u8()?;
        if encoding > 1 {
            return Err(Error::bad_enum("vertexArray.encoding", encoding));
        }
        let vertex_count = r.read_u16()? as usize;
        let total = vertex_count * component_count as usize;
        let values = match component_size {
            1 => {
                let mut vals = r.read_i8_values(total)?;
                if encoding == 1 {
                    undelta_i8(&mut vals, component_count as usize);
                }
                VertexValues::Byte(vals)
            }
            2 => {
                let mut vals = r.read_i16_values(total)?;
                if encoding == 1 {
                    undelta_i16(&mut vals, component_count as usize);
                }
                VertexValues::Short(vals)
            }
            other => return Err(Error::bad_enum("componentSize", other)),
        };
        Ok(Self {
            base,
            component_count,
            values,
        })
    }

    pub(crate) fn encode(&self, w: &mut M3gWriter, ctx: &EncodeContext<'_>) -> Result<()> {
        self.validate()?;
        self.base.encode(w, ctx)?;
        let plan = crate::encode::vertex::plan(&self.values, self.component_count as usize)?;
        w.write_u8(plan.component_size);
        w.write_u8(self.component_count);
        w.write_u8(plan.encoding);
        w.write_u16(self.vertex_count() as u16);
        w.put(&plan.payload);
        Ok(())
    }
}

/// In-place inverse of the delta encoding: a per-component running sum,
/// wrapping at the storage width.
pub(crate) fn undelta_i8(values: &mut [i8], component_count: usize) {
    for i in component_count..values.len() {
        values[i] = values[i].wrapping_add(values[i - component_count]);
    }
}

pub(crate) fn undelta_i16(values: &mut [i16], component_count: usize) {
    for i in component_count..values.len() {
        values[i] = values[i].wrapping_add(values[i - component_count]);
    }
}

/// One texture coordinate layer of a vertex buffer.
#[derive(Clone, Debug, PartialEq)]
pub struct TexCoordArray {
    pub array: ObjectIndex,
    pub bias: [f32; 3],
    pub scale: f32,
}

/// Binding of vertex arrays to the fixed attribute slots, with the position
/// and texture coordinate dequantization parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct VertexBuffer {
    pub base: ObjectBase,
    pub default_color: ColorRgba,
    pub positions: ObjectIndex,
    pub position_bias: [f32; 3],
    pub position_scale: f32,
    pub normals: ObjectIndex,
    pub colors: ObjectIndex,
    pub tex_coords: Vec<TexCoordArray>,
}

impl Default for VertexBuffer {
    fn default() -> Self {
        Self {
            base: ObjectBase::default(),
            default_color: ColorRgba::new(255, 255, 255, 255),
            positions: ObjectIndex::NULL,
            position_bias: [0.0; 3],
            position_scale: 1.0,
            normals: ObjectIndex::NULL,
            colors: ObjectIndex::NULL,
            tex_coords: Vec::new(),
        }
    }
}

impl VertexBuffer {
    pub(crate) fn decode(r: &mut M3gReader<'_>, table: &mut ObjectTable) -> Result<Self> {
        let base = ObjectBase::decode(r, table)?;
        let default_color = r.read_rgba()?;
        let positions = table.optional_ref(
            r.read_index()?,
            Expect::Kind(ObjectType::VertexArray),
            "positions",
        )?;
        let position_bias = [r.read_f32()?, r.read_f32()?, r.read_f32()?];
        let position_scale = r.read_f32()?;
        let normals = table.optional_ref(
            r.read_index()?,
            Expect::Kind(ObjectType::VertexArray),
            "normals",
        )?;
        let colors = table.optional_ref(
            r.read_index()?,
            Expect::Kind(ObjectType::VertexArray),
            "colors",
        )?;
        let count = r.read_array_count(20)?;
        let mut tex_coords = Vec::with_capacity(count);
        for _ in 0..count {
            let array = table.require_ref(
                r.read_index()?,
                Expect::Kind(ObjectType::VertexArray),
                "texCoords",
            )?;
            tex_coords.push(TexCoordArray {
                array,
                bias: [r.read_f32()?, r.read_f32()?, r.read_f32()?],
                scale: r.read_f32()?,
            });
        }
        Ok(Self {
            base,
            default_color,
            positions,
            position_bias,
            position_scale,
            normals,
            colors,
            tex_coords,
        })
    }

    pub(crate) fn encode(&self, w: &mut M3gWriter, ctx: &EncodeContext<'_>) -> Result<()> {
        self.base.encode(w, ctx)?;
        w.write_rgba(self.default_color);
        ctx.check_optional(
            self.positions,
            Expect::Kind(ObjectType::VertexArray),
            "positions",
        )?;
        w.write_index(self.positions);
        for &v in &self.position_bias {
            w.write_f32(v);
        }
        w.write_f32(self.position_scale);
        ctx.check_optional(
            self.normals,
            Expect::Kind(ObjectType::VertexArray),
            "normals",
        )?;
        w.write_index(self.normals);
        ctx.check_optional(self.colors, Expect::Kind(ObjectType::VertexArray), "colors")?;
        w.write_index(self.colors);
        w.write_u32(self.tex_coords.len() as u32);
        for tc in &self.tex_coords {
            ctx.check_required(tc.array, Expect::Kind(ObjectType::VertexArray), "texCoords")?;
            w.write_index(tc.array);
            for &v in &tc.bias {
                w.write_f32(v);
            }
            w.write_f32(tc.scale);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::SceneObject;

    fn roundtrip_array(arr: &VertexArray) -> VertexArray {
        let table = ObjectTable::new();
        let ctx = EncodeContext {
            table: &table,
            current: ObjectIndex(1),
        };
        let mut w = M3gWriter::new();
        arr.encode(&mut w, &ctx).unwrap();
        let bytes = w.into_inner();
        let mut table = ObjectTable::new();
        let mut r = M3gReader::new(&bytes);
        VertexArray::decode(&mut r, &mut table).unwrap()
    }

    #[test]
    fn test_short_array_roundtrip() {
        let arr = VertexArray {
            component_count: 3,
            values: VertexValues::Short(vec![0, 0, 0, 1, 0, 0, 300, 0, 0]),
            ..VertexArray::default()
        };
        assert_eq!(roundtrip_array(&arr), arr);
    }

    #[test]
    fn test_narrowed_array_reads_back_as_bytes() {
        // Every value fits a signed byte, so the encoder narrows and the
        // decoded array comes back in byte storage with the same values.
        let arr = VertexArray {
            component_count: 2,
            values: VertexValues::Short(vec![0, 1, -2, 3, 100, -100]),
            ..VertexArray::default()
        };
        let back = roundtrip_array(&arr);
        assert_eq!(
            back.values,
            VertexValues::Byte(vec![0, 1, -2, 3, 100, -100])
        );
    }

    #[test]
    fn test_delta_running_sum() {
        let mut vals: Vec<i16> = vec![10, 20, 5, -3, 1, 1];
        undelta_i16(&mut vals, 2);
        assert_eq!(vals, vec![10, 20, 15, 17, 16, 18]);

        let mut bytes: Vec<i8> = vec![120, 20, -50];
        undelta_i8(&mut bytes, 1);
        // 120 + 20 wraps in i8 arithmetic.
        assert_eq!(bytes, vec![120, 120i8.wrapping_add(20), 90]);
    }

    #[test]
    fn test_component_count_range() {
        let arr = VertexArray {
            component_count: 5,
            values: VertexValues::Short(vec![0; 10]),
            ..VertexArray::default()
        };
        let table = ObjectTable::new();
        let ctx = EncodeContext {
            table: &table,
            current: ObjectIndex(1),
        };
        let mut w = M3gWriter::new();
        assert!(matches!(
            arr.encode(&mut w, &ctx),
            Err(Error::InvalidEnumValue { field: "componentCount", .. })
        ));
    }

    #[test]
    fn test_buffer_roundtrip() {
        let mut table = ObjectTable::new();
        let pos = table.append(SceneObject::VertexArray(VertexArray {
            component_count: 3,
            values: VertexValues::Short(vec![0, 0, 0, 1, 1, 1]),
            ..VertexArray::default()
        }));
        let uv = table.append(SceneObject::VertexArray(VertexArray {
            component_count: 2,
            values: VertexValues::Byte(vec![0, 0, 1, 1]),
            ..VertexArray::default()
        }));
        let vb = VertexBuffer {
            positions: pos,
            position_bias: [0.5, 0.0, -0.5],
            position_scale: 2.0,
            tex_coords: vec![TexCoordArray {
                array: uv,
                bias: [0.0; 3],
                scale: 1.0,
            }],
            ..VertexBuffer::default()
        };
        let ctx = EncodeContext {
            table: &table,
            current: ObjectIndex(3),
        };
        let mut w = M3gWriter::new();
        vb.encode(&mut w, &ctx).unwrap();
        let bytes = w.into_inner();

        let mut read_table = ObjectTable::new();
        read_table.append(SceneObject::VertexArray(VertexArray::default()));
        read_table.append(SceneObject::VertexArray(VertexArray::default()));
        let mut r = M3gReader::new(&bytes);
        assert_eq!(VertexBuffer::decode(&mut r, &mut read_table).unwrap(), vb);
    }
}
