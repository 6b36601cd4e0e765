//! Light node.

use crate::codec::{ColorRgb, M3gReader, M3gWriter};
use crate::objects::node::{NodeData, Transform};
use crate::objects::ObjectBase;
use crate::table::{EncodeContext, ObjectTable};
use crate::util::{Error, Result};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[repr(u8)]
pub enum LightMode {
    Ambient = 128,
    #[default]
    Directional = 129,
    Omni = 130,
    Spot = 131,
}

impl LightMode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            128 => Some(Self::Ambient),
            129 => Some(Self::Directional),
            130 => Some(Self::Omni),
            131 => Some(Self::Spot),
            _ => None,
        }
    }
}

/// Light source scene object.
#[derive(Clone, Debug, PartialEq)]
pub struct Light {
    pub base: ObjectBase,
    pub transform: Transform,
    pub node: NodeData,
    pub attenuation_constant: f32,
    pub attenuation_linear: f32,
    pub attenuation_quadratic: f32,
    pub color: ColorRgb,
    pub mode: LightMode,
    pub intensity: f32,
    pub spot_angle: f32,
    pub spot_exponent: f32,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            base: ObjectBase::default(),
            transform: Transform::default(),
            node: NodeData::default(),
            attenuation_constant: 1.0,
            attenuation_linear: 0.0,
            attenuation_quadratic: 0.0,
            color: ColorRgb::new(255, 255, 255),
            mode: LightMode::Directional,
            intensity: 1.0,
            spot_angle: 45.0,
            spot_exponent: 0.0,
        }
    }
}

impl Light {
    pub(crate) fn decode(r: &mut M3gReader<'_>, table: &mut ObjectTable) -> Result<Self> {
        let base = ObjectBase::decode(r, table)?;
        let transform = Transform::decode(r)?;
        let node = NodeData::decode(r, table)?;
        let attenuation_constant = r.read_f32()?;
        let attenuation_linear = r.read_f32()?;
        let attenuation_quadratic = r.read_f32()?;
        let color = r.read_rgb()?;
        let m = r.read_u8()?;
        let mode = LightMode::from_u8(m).ok_or_else(|| Error::bad_enum("light.mode", m))?;
        Ok(Self {
            base,
            transform,
            node,
            attenuation_constant,
            attenuation_linear,
            attenuation_quadratic,
            color,
            mode,
            intensity: r.read_f32()?,
            spot_angle: r.read_f32()?,
            spot_exponent: r.read_f32()?,
        })
    }

    pub(crate) fn encode(&self, w: &mut M3gWriter, ctx: &EncodeContext<'_>) -> Result<()> {
        self.base.encode(w, ctx)?;
        self.transform.encode(w);
        self.node.encode(w, ctx)?;
        w.write_f32(self.attenuation_constant);
        w.write_f32(self.attenuation_linear);
        w.write_f32(self.attenuation_quadratic);
        w.write_rgb(self.color);
        w.write_u8(self.mode as u8);
        w.write_f32(self.intensity);
        w.write_f32(self.spot_angle);
        w.write_f32(self.spot_exponent);
        Ok(())
    }
}
