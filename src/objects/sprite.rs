//! Sprite3D: a screen-aligned image node.

use crate::codec::{M3gReader, M3gWriter, ObjectIndex};
use crate::objects::node::{NodeData, Transform};
use crate::objects::{ObjectBase, ObjectType};
use crate::table::{EncodeContext, Expect, ObjectTable};
use crate::util::Result;

/// Integer crop rectangle within a source image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Crop {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Screen-aligned sprite node.
#[derive(Clone, Debug, PartialEq)]
pub struct Sprite3D {
    pub base: ObjectBase,
    pub transform: Transform,
    pub node: NodeData,
    pub image: ObjectIndex,
    pub appearance: ObjectIndex,
    pub is_scaled: bool,
    pub crop: Crop,
}

impl Sprite3D {
    pub(crate) fn decode(r: &mut M3gReader<'_>, table: &mut ObjectTable) -> Result<Self> {
        let base = ObjectBase::decode(r, table)?;
        let transform = Transform::decode(r)?;
        let node = NodeData::decode(r, table)?;
        let image =
            table.require_ref(r.read_index()?, Expect::Kind(ObjectType::Image2D), "image")?;
        let appearance = table.optional_ref(
            r.read_index()?,
            Expect::Kind(ObjectType::Appearance),
            "appearance",
        )?;
        Ok(Self {
            base,
            transform,
            node,
            image,
            appearance,
            is_scaled: r.read_bool()?,
            crop: Crop {
                x: r.read_i32()?,
                y: r.read_i32()?,
                width: r.read_i32()?,
                height: r.read_i32()?,
            },
        })
    }

    pub(crate) fn encode(&self, w: &mut M3gWriter, ctx: &EncodeContext<'_>) -> Result<()> {
        self.base.encode(w, ctx)?;
        self.transform.encode(w);
        self.node.encode(w, ctx)?;
        ctx.check_required(self.image, Expect::Kind(ObjectType::Image2D), "image")?;
        w.write_index(self.image);
        ctx.check_optional(
            self.appearance,
            Expect::Kind(ObjectType::Appearance),
            "appearance",
        )?;
        w.write_index(self.appearance);
        w.write_bool(self.is_scaled);
        w.write_i32(self.crop.x);
        w.write_i32(self.crop.y);
        w.write_i32(self.crop.width);
        w.write_i32(self.crop.height);
        Ok(())
    }
}
