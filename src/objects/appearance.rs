//! Shading state objects: Appearance and the component objects it bundles
//! (CompositingMode, Fog, PolygonMode, Material).

use crate::codec::{ColorRgb, ColorRgba, M3gReader, M3gWriter, ObjectIndex};
use crate::objects::{ObjectBase, ObjectType};
use crate::table::{EncodeContext, Expect, ObjectTable};
use crate::util::{Error, Result};

/// Framebuffer blend mode of a CompositingMode.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[repr(u8)]
pub enum Blending {
    Alpha = 64,
    AlphaAdd = 65,
    Modulate = 66,
    ModulateX2 = 67,
    #[default]
    Replace = 68,
}

impl Blending {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            64 => Some(Self::Alpha),
            65 => Some(Self::AlphaAdd),
            66 => Some(Self::Modulate),
            67 => Some(Self::ModulateX2),
            68 => Some(Self::Replace),
            _ => None,
        }
    }
}

/// Per-fragment compositing state.
#[derive(Clone, Debug, PartialEq)]
pub struct CompositingMode {
    pub base: ObjectBase,
    pub depth_test_enabled: bool,
    pub depth_write_enabled: bool,
    pub color_write_enabled: bool,
    pub alpha_write_enabled: bool,
    pub blending: Blending,
    /// Alpha test threshold, 0..=255 maps to 0.0..=1.0.
    pub alpha_threshold: u8,
    pub depth_offset_factor: f32,
    pub depth_offset_units: f32,
}

impl Default for CompositingMode {
    fn default() -> Self {
        Self {
            base: ObjectBase::default(),
            depth_test_enabled: true,
            depth_write_enabled: true,
            color_write_enabled: true,
            alpha_write_enabled: true,
            blending: Blending::Replace,
            alpha_threshold: 0,
            depth_offset_factor: 0.0,
            depth_offset_units: 0.0,
        }
    }
}

impl CompositingMode {
    pub(crate) fn decode(r: &mut M3gReader<'_>, table: &mut ObjectTable) -> Result<Self> {
        let base = ObjectBase::decode(r, table)?;
        let depth_test_enabled = r.read_bool()?;
        let depth_write_enabled = r.read_bool()?;
        let color_write_enabled = r.read_bool()?;
        let alpha_write_enabled = r.read_bool()?;
        let b = r.read_u8()?;
        let blending = Blending::from_u8(b).ok_or_else(|| Error::bad_enum("blending", b))?;
        Ok(Self {
            base,
            depth_test_enabled,
            depth_write_enabled,
            color_write_enabled,
            alpha_write_enabled,
            blending,
            alpha_threshold: r.read_u8()?,
            depth_offset_factor: r.read_f32()?,
            depth_offset_units: r.read_f32()?,
        })
    }

    pub(crate) fn encode(&self, w: &mut M3gWriter, ctx: &EncodeContext<'_>) -> Result<()> {
        self.base.encode(w, ctx)?;
        w.write_bool(self.depth_test_enabled);
        w.write_bool(self.depth_write_enabled);
        w.write_bool(self.color_write_enabled);
        w.write_bool(self.alpha_write_enabled);
        w.write_u8(self.blending as u8);
        w.write_u8(self.alpha_threshold);
        w.write_f32(self.depth_offset_factor);
        w.write_f32(self.depth_offset_units);
        Ok(())
    }
}

/// Fog falloff curve plus its parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FogMode {
    Exponential { density: f32 },
    Linear { near: f32, far: f32 },
}

/// Distance fog state.
#[derive(Clone, Debug, PartialEq)]
pub struct Fog {
    pub base: ObjectBase,
    pub color: ColorRgb,
    pub mode: FogMode,
}

impl Default for Fog {
    fn default() -> Self {
        Self {
            base: ObjectBase::default(),
            color: ColorRgb::default(),
            mode: FogMode::Linear {
                near: 0.0,
                far: 1.0,
            },
        }
    }
}

impl Fog {
    pub(crate) fn decode(r: &mut M3gReader<'_>, table: &mut ObjectTable) -> Result<Self> {
        let base = ObjectBase::decode(r, table)?;
        let color = r.read_rgb()?;
        let mode_byte = r.read_u8()?;
        let mode = match mode_byte {
            80 => FogMode::Exponential {
                density: r.read_f32()?,
            },
            81 => FogMode::Linear {
                near: r.read_f32()?,
                far: r.read_f32()?,
            },
            other => return Err(Error::bad_enum("fog.mode", other)),
        };
        Ok(Self { base, color, mode })
    }

    pub(crate) fn encode(&self, w: &mut M3gWriter, ctx: &EncodeContext<'_>) -> Result<()> {
        self.base.encode(w, ctx)?;
        w.write_rgb(self.color);
        match self.mode {
            FogMode::Exponential { density } => {
                w.write_u8(80);
                w.write_f32(density);
            }
            FogMode::Linear { near, far } => {
                w.write_u8(81);
                w.write_f32(near);
                w.write_f32(far);
            }
        }
        Ok(())
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[repr(u8)]
pub enum Culling {
    #[default]
    Back = 160,
    Front = 161,
    None = 162,
}

impl Culling {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            160 => Some(Self::Back),
            161 => Some(Self::Front),
            162 => Some(Self::None),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[repr(u8)]
pub enum Shading {
    Flat = 164,
    #[default]
    Smooth = 165,
}

impl Shading {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            164 => Some(Self::Flat),
            165 => Some(Self::Smooth),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[repr(u8)]
pub enum Winding {
    #[default]
    Ccw = 168,
    Cw = 169,
}

impl Winding {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            168 => Some(Self::Ccw),
            169 => Some(Self::Cw),
            _ => None,
        }
    }
}

/// Polygon-level rasterization state.
#[derive(Clone, Debug, PartialEq)]
pub struct PolygonMode {
    pub base: ObjectBase,
    pub culling: Culling,
    pub shading: Shading,
    pub winding: Winding,
    pub two_sided_lighting_enabled: bool,
    pub local_camera_lighting_enabled: bool,
    pub perspective_correction_enabled: bool,
}

impl Default for PolygonMode {
    fn default() -> Self {
        Self {
            base: ObjectBase::default(),
            culling: Culling::Back,
            shading: Shading::Smooth,
            winding: Winding::Ccw,
            two_sided_lighting_enabled: false,
            local_camera_lighting_enabled: false,
            perspective_correction_enabled: false,
        }
    }
}

impl PolygonMode {
    pub(crate) fn decode(r: &mut M3gReader<'_>, table: &mut ObjectTable) -> Result<Self> {
        let base = ObjectBase::decode(r, table)?;
        let c = r.read_u8()?;
        let culling = Culling::from_u8(c).ok_or_else(|| Error::bad_enum("culling", c))?;
        let s = r.read_u8()?;
        let shading = Shading::from_u8(s).ok_or_else(|| Error::bad_enum("shading", s))?;
        let v = r.read_u8()?;
        let winding = Winding::from_u8(v).ok_or_else(|| Error::bad_enum("winding", v))?;
        Ok(Self {
            base,
            culling,
            shading,
            winding,
            two_sided_lighting_enabled: r.read_bool()?,
            local_camera_lighting_enabled: r.read_bool()?,
            perspective_correction_enabled: r.read_bool()?,
        })
    }

    pub(crate) fn encode(&self, w: &mut M3gWriter, ctx: &EncodeContext<'_>) -> Result<()> {
        self.base.encode(w, ctx)?;
        w.write_u8(self.culling as u8);
        w.write_u8(self.shading as u8);
        w.write_u8(self.winding as u8);
        w.write_bool(self.two_sided_lighting_enabled);
        w.write_bool(self.local_camera_lighting_enabled);
        w.write_bool(self.perspective_correction_enabled);
        Ok(())
    }
}

/// Lighting material colors.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub base: ObjectBase,
    pub ambient_color: ColorRgb,
    pub diffuse_color: ColorRgba,
    pub emissive_color: ColorRgb,
    pub specular_color: ColorRgb,
    pub shininess: f32,
    pub vertex_color_tracking_enabled: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            base: ObjectBase::default(),
            ambient_color: ColorRgb::from_argb(0x0033_3333),
            diffuse_color: ColorRgba::from_argb(0xFFCC_CCCC),
            emissive_color: ColorRgb::default(),
            specular_color: ColorRgb::default(),
            shininess: 0.0,
            vertex_color_tracking_enabled: false,
        }
    }
}

impl Material {
    pub(crate) fn decode(r: &mut M3gReader<'_>, table: &mut ObjectTable) -> Result<Self> {
        Ok(Self {
            base: ObjectBase::decode(r, table)?,
            ambient_color: r.read_rgb()?,
            diffuse_color: r.read_rgba()?,
            emissive_color: r.read_rgb()?,
            specular_color: r.read_rgb()?,
            shininess: r.read_f32()?,
            vertex_color_tracking_enabled: r.read_bool()?,
        })
    }

    pub(crate) fn encode(&self, w: &mut M3gWriter, ctx: &EncodeContext<'_>) -> Result<()> {
        self.base.encode(w, ctx)?;
        w.write_rgb(self.ambient_color);
        w.write_rgba(self.diffuse_color);
        w.write_rgb(self.emissive_color);
        w.write_rgb(self.specular_color);
        w.write_f32(self.shininess);
        w.write_bool(self.vertex_color_tracking_enabled);
        Ok(())
    }
}

/// Bundle of rendering state for one submesh.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Appearance {
    pub base: ObjectBase,
    /// Rendering layer, back-to-front within a world. Signed byte on the
    /// wire.
    pub layer: i8,
    pub compositing_mode: ObjectIndex,
    pub fog: ObjectIndex,
    pub polygon_mode: ObjectIndex,
    pub material: ObjectIndex,
    /// Texture units in order; entries must not be null.
    pub textures: Vec<ObjectIndex>,
}

impl Appearance {
    pub(crate) fn decode(r: &mut M3gReader<'_>, table: &mut ObjectTable) -> Result<Self> {
        let base = ObjectBase::decode(r, table)?;
        let layer = r.read_i8()?;
        let compositing_mode = table.optional_ref(
            r.read_index()?,
            Expect::Kind(ObjectType::CompositingMode),
            "compositingMode",
        )?;
        let fog = table.optional_ref(r.read_index()?, Expect::Kind(ObjectType::Fog), "fog")?;
        let polygon_mode = table.optional_ref(
            r.read_index()?,
            Expect::Kind(ObjectType::PolygonMode),
            "polygonMode",
        )?;
        let material =
            table.optional_ref(r.read_index()?, Expect::Kind(ObjectType::Material), "material")?;
        let count = r.read_array_count(4)?;
        let mut textures = Vec::with_capacity(count);
        for _ in 0..count {
            textures.push(table.require_ref(
                r.read_index()?,
                Expect::Kind(ObjectType::Texture2D),
                "textures",
            )?);
        }
        Ok(Self {
            base,
            layer,
            compositing_mode,
            fog,
            polygon_mode,
            material,
            textures,
        })
    }

    pub(crate) fn encode(&self, w: &mut M3gWriter, ctx: &EncodeContext<'_>) -> Result<()> {
        self.base.encode(w, ctx)?;
        w.write_i8(self.layer);
        ctx.check_optional(
            self.compositing_mode,
            Expect::Kind(ObjectType::CompositingMode),
            "compositingMode",
        )?;
        w.write_index(self.compositing_mode);
        ctx.check_optional(self.fog, Expect::Kind(ObjectType::Fog), "fog")?;
        w.write_index(self.fog);
        ctx.check_optional(
            self.polygon_mode,
            Expect::Kind(ObjectType::PolygonMode),
            "polygonMode",
        )?;
        w.write_index(self.polygon_mode);
        ctx.check_optional(self.material, Expect::Kind(ObjectType::Material), "material")?;
        w.write_index(self.material);
        w.write_u32(self.textures.len() as u32);
        for &tex in &self.textures {
            ctx.check_required(tex, Expect::Kind(ObjectType::Texture2D), "textures")?;
            w.write_index(tex);
        }
        Ok(())
    }
}
