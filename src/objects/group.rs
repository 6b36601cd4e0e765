//! Group and World: interior nodes of the scene graph.

use crate::codec::{M3gReader, M3gWriter, ObjectIndex};
use crate::objects::node::{NodeData, Transform};
use crate::objects::{ObjectBase, ObjectType};
use crate::table::{EncodeContext, Expect, ObjectTable};
use crate::util::Result;

/// Node holding an ordered list of child nodes.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Group {
    pub base: ObjectBase,
    pub transform: Transform,
    pub node: NodeData,
    /// Child nodes; entries must not be null and may be any Node kind.
    pub children: Vec<ObjectIndex>,
}

pub(crate) fn decode_group_fields(
    r: &mut M3gReader<'_>,
    table: &mut ObjectTable,
) -> Result<(ObjectBase, Transform, NodeData, Vec<ObjectIndex>)> {
    let base = ObjectBase::decode(r, table)?;
    let transform = Transform::decode(r)?;
    let node = NodeData::decode(r, table)?;
    let count = r.read_array_count(4)?;
    let mut children = Vec::with_capacity(count);
    for _ in 0..count {
        children.push(table.require_ref(r.read_index()?, Expect::AnyNode, "children")?);
    }
    Ok((base, transform, node, children))
}

pub(crate) fn encode_group_fields(
    base: &ObjectBase,
    transform: &Transform,
    node: &NodeData,
    children: &[ObjectIndex],
    w: &mut M3gWriter,
    ctx: &EncodeContext<'_>,
) -> Result<()> {
    base.encode(w, ctx)?;
    transform.encode(w);
    node.encode(w, ctx)?;
    w.write_u32(children.len() as u32);
    for &child in children {
        ctx.check_required(child, Expect::AnyNode, "children")?;
        w.write_index(child);
    }
    Ok(())
}

impl Group {
    pub(crate) fn decode(r: &mut M3gReader<'_>, table: &mut ObjectTable) -> Result<Self> {
        let (base, transform, node, children) = decode_group_fields(r, table)?;
        Ok(Self {
            base,
            transform,
            node,
            children,
        })
    }

    pub(crate) fn encode(&self, w: &mut M3gWriter, ctx: &EncodeContext<'_>) -> Result<()> {
        encode_group_fields(&self.base, &self.transform, &self.node, &self.children, w, ctx)
    }
}

/// Root of a self-contained scene: a group plus the active camera and
/// background.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct World {
    pub base: ObjectBase,
    pub transform: Transform,
    pub node: NodeData,
    pub children: Vec<ObjectIndex>,
    pub active_camera: ObjectIndex,
    pub background: ObjectIndex,
}

impl World {
    pub(crate) fn decode(r: &mut M3gReader<'_>, table: &mut ObjectTable) -> Result<Self> {
        let (base, transform, node, children) = decode_group_fields(r, table)?;
        let active_camera = table.optional_ref(
            r.read_index()?,
            Expect::Kind(ObjectType::Camera),
            "activeCamera",
        )?;
        let background = table.optional_ref(
            r.read_index()?,
            Expect::Kind(ObjectType::Background),
            "background",
        )?;
        Ok(Self {
            base,
            transform,
            node,
            children,
            active_camera,
            background,
        })
    }

    pub(crate) fn encode(&self, w: &mut M3gWriter, ctx: &EncodeContext<'_>) -> Result<()> {
        encode_group_fields(&self.base, &self.transform, &self.node, &self.children, w, ctx)?;
        ctx.check_optional(
            self.active_camera,
            Expect::Kind(ObjectType::Camera),
            "activeCamera",
        )?;
        w.write_index(self.active_camera);
        ctx.check_optional(
            self.background,
            Expect::Kind(ObjectType::Background),
            "background",
        )?;
        w.write_index(self.background);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::{Camera, SceneObject};
    use crate::util::Error;

    #[test]
    fn test_group_roundtrip_and_root_clearing() {
        let mut table = ObjectTable::new();
        let cam = table.append(SceneObject::Camera(Camera::default()));
        let group = Group {
            children: vec![cam],
            ..Group::default()
        };
        let ctx = EncodeContext {
            table: &table,
            current: ObjectIndex(2),
        };
        let mut w = M3gWriter::new();
        group.encode(&mut w, &ctx).unwrap();
        let bytes = w.into_inner();

        let mut read_table = ObjectTable::new();
        let cam = read_table.append(SceneObject::Camera(Camera::default()));
        let mut r = M3gReader::new(&bytes);
        let back = Group::decode(&mut r, &mut read_table).unwrap();
        assert_eq!(back, group);
        assert!(!read_table.is_root(cam));
    }

    #[test]
    fn test_group_child_must_be_node() {
        let mut table = ObjectTable::new();
        table.append(SceneObject::Material(crate::objects::Material::default()));
        let mut w = M3gWriter::new();
        let ctx = EncodeContext {
            table: &table,
            current: ObjectIndex(2),
        };
        let group = Group::default();
        group.base.encode(&mut w, &ctx).unwrap();
        group.transform.encode(&mut w);
        group.node.encode(&mut w, &ctx).unwrap();
        w.write_u32(1);
        w.write_u32(1); // points at the material
        let bytes = w.into_inner();

        let mut read_table = ObjectTable::new();
        read_table.append(SceneObject::Material(crate::objects::Material::default()));
        let mut r = M3gReader::new(&bytes);
        assert!(matches!(
            Group::decode(&mut r, &mut read_table),
            Err(Error::WrongReferentKind { field: "children", .. })
        ));
    }

    #[test]
    fn test_world_roundtrip() {
        let mut table = ObjectTable::new();
        let cam = table.append(SceneObject::Camera(Camera::default()));
        let world = World {
            children: vec![cam],
            active_camera: cam,
            ..World::default()
        };
        let ctx = EncodeContext {
            table: &table,
            current: ObjectIndex(2),
        };
        let mut w = M3gWriter::new();
        world.encode(&mut w, &ctx).unwrap();
        let bytes = w.into_inner();
        let mut read_table = ObjectTable::new();
        read_table.append(SceneObject::Camera(Camera::default()));
        let mut r = M3gReader::new(&bytes);
        assert_eq!(World::decode(&mut r, &mut read_table).unwrap(), world);
    }
}
