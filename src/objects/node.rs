//! Shared serialization blocks: the transformable prefix and the node prefix.
//!
//! Both blocks sit between the common object prefix and the kind-specific
//! fields of every Node-derived object; Texture2D carries only the
//! transformable part.

use glam::{Mat4, Vec3};

use crate::codec::{M3gReader, M3gWriter, ObjectIndex};
use crate::table::{EncodeContext, Expect, ObjectTable};
use crate::util::{Error, Result};

/// Component + general transform of a transformable object.
///
/// On the wire each part is guarded by a presence flag; on encode the flags
/// are derived by comparing against the defaults below, so an untouched
/// transform costs two bytes.
#[derive(Clone, Debug, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub scale: Vec3,
    pub orientation_angle: f32,
    pub orientation_axis: Vec3,
    pub matrix: Mat4,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            scale: Vec3::ONE,
            orientation_angle: 0.0,
            orientation_axis: Vec3::ZERO,
            matrix: Mat4::IDENTITY,
        }
    }
}

impl Transform {
    fn has_component_transform(&self) -> bool {
        self.translation != Vec3::ZERO
            || self.scale != Vec3::ONE
            || self.orientation_angle != 0.0
            || self.orientation_axis != Vec3::ZERO
    }

    pub(crate) fn decode(r: &mut M3gReader<'_>) -> Result<Self> {
        let mut t = Self::default();
        if r.read_bool()? {
            t.translation = read_vec3(r)?;
            t.scale = read_vec3(r)?;
            t.orientation_angle = r.read_f32()?;
            t.orientation_axis = read_vec3(r)?;
        }
        if r.read_bool()? {
            t.matrix = r.read_matrix()?;
        }
        Ok(t)
    }

    pub(crate) fn encode(&self, w: &mut M3gWriter) {
        let component = self.has_component_transform();
        w.write_bool(component);
        if component {
            write_vec3(w, self.translation);
            write_vec3(w, self.scale);
            w.write_f32(self.orientation_angle);
            write_vec3(w, self.orientation_axis);
        }
        let general = self.matrix != Mat4::IDENTITY;
        w.write_bool(general);
        if general {
            w.write_matrix(&self.matrix);
        }
    }
}

pub(crate) fn read_vec3(r: &mut M3gReader<'_>) -> Result<Vec3> {
    Ok(Vec3::new(r.read_f32()?, r.read_f32()?, r.read_f32()?))
}

pub(crate) fn write_vec3(w: &mut M3gWriter, v: Vec3) {
    w.write_f32(v.x);
    w.write_f32(v.y);
    w.write_f32(v.z);
}

/// Axis a node alignment steers towards.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum AlignmentTarget {
    None = 144,
    Origin = 145,
    XAxis = 146,
    YAxis = 147,
    ZAxis = 148,
}

impl AlignmentTarget {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            144 => Some(Self::None),
            145 => Some(Self::Origin),
            146 => Some(Self::XAxis),
            147 => Some(Self::YAxis),
            148 => Some(Self::ZAxis),
            _ => None,
        }
    }
}

/// Optional node auto-alignment settings.
#[derive(Clone, Debug, PartialEq)]
pub struct Alignment {
    pub z_target: AlignmentTarget,
    pub y_target: AlignmentTarget,
    /// Node the Z axis aligns against; null means the active camera.
    pub z_reference: ObjectIndex,
    pub y_reference: ObjectIndex,
}

/// Node prefix fields shared by every renderable/pickable scene-graph node.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeData {
    pub enable_rendering: bool,
    pub enable_picking: bool,
    /// Node alpha factor, 0..=255 maps to 0.0..=1.0.
    pub alpha_factor: u8,
    pub scope: u32,
    pub alignment: Option<Alignment>,
}

impl Default for NodeData {
    fn default() -> Self {
        Self {
            enable_rendering: true,
            enable_picking: true,
            alpha_factor: 255,
            scope: u32::MAX,
            alignment: None,
        }
    }
}

impl NodeData {
    pub(crate) fn decode(r: &mut M3gReader<'_>, table: &mut ObjectTable) -> Result<Self> {
        let enable_rendering = r.read_bool()?;
        let enable_picking = r.read_bool()?;
        let alpha_factor = r.read_u8()?;
        let scope = r.read_u32()?;
        let alignment = if r.read_bool()? {
            let z = r.read_u8()?;
            let z_target =
                AlignmentTarget::from_u8(z).ok_or_else(|| Error::bad_enum("zTarget", z))?;
            let y = r.read_u8()?;
            let y_target =
                AlignmentTarget::from_u8(y).ok_or_else(|| Error::bad_enum("yTarget", y))?;
            let z_reference =
                table.optional_ref(r.read_index()?, Expect::AnyNode, "zReference")?;
            let y_reference =
                table.optional_ref(r.read_index()?, Expect::AnyNode, "yReference")?;
            Some(Alignment {
                z_target,
                y_target,
                z_reference,
                y_reference,
            })
        } else {
            None
        };
        Ok(Self {
            enable_rendering,
            enable_picking,
            alpha_factor,
            scope,
            alignment,
        })
    }

    pub(crate) fn encode(&self, w: &mut M3gWriter, ctx: &EncodeContext<'_>) -> Result<()> {
        w.write_bool(self.enable_rendering);
        w.write_bool(self.enable_picking);
        w.write_u8(self.alpha_factor);
        w.write_u32(self.scope);
        match &self.alignment {
            None => w.write_bool(false),
            Some(a) => {
                w.write_bool(true);
                w.write_u8(a.z_target as u8);
                w.write_u8(a.y_target as u8);
                ctx.check_optional(a.z_reference, Expect::AnyNode, "zReference")?;
                w.write_index(a.z_reference);
                ctx.check_optional(a.y_reference, Expect::AnyNode, "yReference")?;
                w.write_index(a.y_reference);
            }
        }
        Ok(())
    }

    pub(crate) fn collect_references(&self, out: &mut Vec<ObjectIndex>) {
        if let Some(a) = &self.alignment {
            out.push(a.z_reference);
            out.push(a.y_reference);
        }
    }
}
