//! Background: clear color/image settings for a world.

use crate::codec::{ColorRgba, M3gReader, M3gWriter, ObjectIndex};
use crate::objects::{ObjectBase, ObjectType};
use crate::table::{EncodeContext, Expect, ObjectTable};
use crate::util::{Error, Result};

/// How the background image tiles outside its crop rectangle.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[repr(u8)]
pub enum BackgroundImageMode {
    #[default]
    Border = 32,
    Repeat = 33,
}

impl BackgroundImageMode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            32 => Some(Self::Border),
            33 => Some(Self::Repeat),
            _ => None,
        }
    }
}

/// Clear settings applied before a world renders.
#[derive(Clone, Debug, PartialEq)]
pub struct Background {
    pub base: ObjectBase,
    pub color: ColorRgba,
    pub image: ObjectIndex,
    pub image_mode_x: BackgroundImageMode,
    pub image_mode_y: BackgroundImageMode,
    pub crop_x: i32,
    pub crop_y: i32,
    pub crop_width: i32,
    pub crop_height: i32,
    pub depth_clear_enabled: bool,
    pub color_clear_enabled: bool,
}

impl Default for Background {
    fn default() -> Self {
        Self {
            base: ObjectBase::default(),
            color: ColorRgba::default(),
            image: ObjectIndex::NULL,
            image_mode_x: BackgroundImageMode::Border,
            image_mode_y: BackgroundImageMode::Border,
            crop_x: 0,
            crop_y: 0,
            crop_width: 0,
            crop_height: 0,
            depth_clear_enabled: true,
            color_clear_enabled: true,
        }
    }
}

impl Background {
    pub(crate) fn decode(r: &mut M3gReader<'_>, table: &mut ObjectTable) -> Result<Self> {
        let base = ObjectBase::decode(r, table)?;
        let color = r.read_rgba()?;
        let image =
            table.optional_ref(r.read_index()?, Expect::Kind(ObjectType::Image2D), "image")?;
        let x = r.read_u8()?;
        let image_mode_x =
            BackgroundImageMode::from_u8(x).ok_or_else(|| Error::bad_enum("imageModeX", x))?;
        let y = r.read_u8()?;
        let image_mode_y =
            BackgroundImageMode::from_u8(y).ok_or_else(|| Error::bad_enum("imageModeY", y))?;
        Ok(Self {
            base,
            color,
            image,
            image_mode_x,
            image_mode_y,
            crop_x: r.read_i32()?,
            crop_y: r.read_i32()?,
            crop_width: r.read_i32()?,
            crop_height: r.read_i32()?,
            depth_clear_enabled: r.read_bool()?,
            color_clear_enabled: r.read_bool()?,
        })
    }

    pub(crate) fn encode(&self, w: &mut M3gWriter, ctx: &EncodeContext<'_>) -> Result<()> {
        self.base.encode(w, ctx)?;
        w.write_rgba(self.color);
        ctx.check_optional(self.image, Expect::Kind(ObjectType::Image2D), "image")?;
        w.write_index(self.image);
        w.write_u8(self.image_mode_x as u8);
        w.write_u8(self.image_mode_y as u8);
        w.write_i32(self.crop_x);
        w.write_i32(self.crop_y);
        w.write_i32(self.crop_width);
        w.write_i32(self.crop_height);
        w.write_bool(self.depth_clear_enabled);
        w.write_bool(self.color_clear_enabled);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let bg = Background {
            color: ColorRgba::from_argb(0x8010_2030),
            image_mode_x: BackgroundImageMode::Repeat,
            crop_x: -5,
            crop_width: 320,
            crop_height: 240,
            depth_clear_enabled: false,
            ..Background::default()
        };
        let table = ObjectTable::new();
        let ctx = EncodeContext {
            table: &table,
            current: ObjectIndex(1),
        };
        let mut w = M3gWriter::new();
        bg.encode(&mut w, &ctx).unwrap();
        let bytes = w.into_inner();
        let mut table = ObjectTable::new();
        let mut r = M3gReader::new(&bytes);
        assert_eq!(Background::decode(&mut r, &mut table).unwrap(), bg);
    }
}
