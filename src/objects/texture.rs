//! Texture2D: a texture unit binding an image with its sampler state.
//!
//! A texture is transformable (texture-coordinate transform) but not a
//! scene-graph node, so it carries the transformable block without the node
//! block.

use crate::codec::{ColorRgb, M3gReader, M3gWriter, ObjectIndex};
use crate::objects::node::Transform;
use crate::objects::{ObjectBase, ObjectType};
use crate::table::{EncodeContext, Expect, ObjectTable};
use crate::util::{Error, Result};

/// Texture combine function.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[repr(u8)]
pub enum TextureBlend {
    Add = 224,
    Blend = 225,
    Decal = 226,
    #[default]
    Modulate = 227,
    Replace = 228,
}

impl TextureBlend {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            224 => Some(Self::Add),
            225 => Some(Self::Blend),
            226 => Some(Self::Decal),
            227 => Some(Self::Modulate),
            228 => Some(Self::Replace),
            _ => None,
        }
    }
}

/// Texture coordinate wrap mode.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[repr(u8)]
pub enum TextureWrap {
    Clamp = 240,
    #[default]
    Repeat = 241,
}

impl TextureWrap {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            240 => Some(Self::Clamp),
            241 => Some(Self::Repeat),
            _ => None,
        }
    }
}

/// Mipmap level selection filter.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[repr(u8)]
pub enum LevelFilter {
    #[default]
    BaseLevel = 208,
    Linear = 209,
    Nearest = 210,
}

impl LevelFilter {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            208 => Some(Self::BaseLevel),
            209 => Some(Self::Linear),
            210 => Some(Self::Nearest),
            _ => None,
        }
    }
}

/// Within-level sampling filter.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[repr(u8)]
pub enum ImageFilter {
    Linear = 209,
    #[default]
    Nearest = 210,
}

impl ImageFilter {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            209 => Some(Self::Linear),
            210 => Some(Self::Nearest),
            _ => None,
        }
    }
}

/// Texture unit state.
#[derive(Clone, Debug, PartialEq)]
pub struct Texture2D {
    pub base: ObjectBase,
    pub transform: Transform,
    pub image: ObjectIndex,
    pub blend_color: ColorRgb,
    pub blending: TextureBlend,
    pub wrapping_s: TextureWrap,
    pub wrapping_t: TextureWrap,
    pub level_filter: LevelFilter,
    pub image_filter: ImageFilter,
}

impl Texture2D {
    /// Texture sampling `image`, all other state at defaults.
    pub fn new(image: ObjectIndex) -> Self {
        Self {
            base: ObjectBase::default(),
            transform: Transform::default(),
            image,
            blend_color: ColorRgb::default(),
            blending: TextureBlend::Modulate,
            wrapping_s: TextureWrap::Repeat,
            wrapping_t: TextureWrap::Repeat,
            level_filter: LevelFilter::BaseLevel,
            image_filter: ImageFilter::Nearest,
        }
    }

    pub(crate) fn decode(r: &mut M3gReader<'_>, table: &mut ObjectTable) -> Result<Self> {
        let base = ObjectBase::decode(r, table)?;
        let transform = Transform::decode(r)?;
        let image =
            table.require_ref(r.read_index()?, Expect::Kind(ObjectType::Image2D), "image")?;
        let blend_color = r.read_rgb()?;
        let b = r.read_u8()?;
        let blending =
            TextureBlend::from_u8(b).ok_or_else(|| Error::bad_enum("texture.blending", b))?;
        let s = r.read_u8()?;
        let wrapping_s = TextureWrap::from_u8(s).ok_or_else(|| Error::bad_enum("wrappingS", s))?;
        let t = r.read_u8()?;
        let wrapping_t = TextureWrap::from_u8(t).ok_or_else(|| Error::bad_enum("wrappingT", t))?;
        let lf = r.read_u8()?;
        let level_filter =
            LevelFilter::from_u8(lf).ok_or_else(|| Error::bad_enum("levelFilter", lf))?;
        let imf = r.read_u8()?;
        let image_filter =
            ImageFilter::from_u8(imf).ok_or_else(|| Error::bad_enum("imageFilter", imf))?;
        Ok(Self {
            base,
            transform,
            image,
            blend_color,
            blending,
            wrapping_s,
            wrapping_t,
            level_filter,
            image_filter,
        })
    }

    pub(crate) fn encode(&self, w: &mut M3gWriter, ctx: &EncodeContext<'_>) -> Result<()> {
        self.base.encode(w, ctx)?;
        self.transform.encode(w);
        ctx.check_required(self.image, Expect::Kind(ObjectType::Image2D), "image")?;
        w.write_index(self.image);
        w.write_rgb(self.blend_color);
        w.write_u8(self.blending as u8);
        w.write_u8(self.wrapping_s as u8);
        w.write_u8(self.wrapping_t as u8);
        w.write_u8(self.level_filter as u8);
        w.write_u8(self.image_filter as u8);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::{Image2D, SceneObject};

    #[test]
    fn test_roundtrip_with_image_ref() {
        let mut table = ObjectTable::new();
        let image = table.append(SceneObject::Image2D(Image2D::default()));
        let tex = Texture2D {
            blending: TextureBlend::Decal,
            wrapping_s: TextureWrap::Clamp,
            level_filter: LevelFilter::Linear,
            image_filter: ImageFilter::Linear,
            blend_color: ColorRgb::new(9, 8, 7),
            ..Texture2D::new(image)
        };
        let ctx = EncodeContext {
            table: &table,
            current: ObjectIndex(2),
        };
        let mut w = M3gWriter::new();
        tex.encode(&mut w, &ctx).unwrap();
        let bytes = w.into_inner();

        let mut read_table = ObjectTable::new();
        read_table.append(SceneObject::Image2D(Image2D::default()));
        let mut r = M3gReader::new(&bytes);
        assert_eq!(Texture2D::decode(&mut r, &mut read_table).unwrap(), tex);
        // Decoding resolved the image reference, so it is no longer a root.
        assert!(!read_table.is_root(image));
    }

    #[test]
    fn test_required_image_rejects_null() {
        let table = ObjectTable::new();
        let ctx = EncodeContext {
            table: &table,
            current: ObjectIndex(1),
        };
        let tex = Texture2D::new(ObjectIndex::NULL);
        let mut w = M3gWriter::new();
        assert!(matches!(
            tex.encode(&mut w, &ctx),
            Err(Error::DanglingReference { field: "image", index: 0 })
        ));
    }
}
