//! Mesh nodes: plain, morphing and skinned.

use crate::codec::{M3gReader, M3gWriter, ObjectIndex};
use crate::objects::node::{NodeData, Transform};
use crate::objects::{ObjectBase, ObjectType};
use crate::table::{EncodeContext, Expect, ObjectTable};
use crate::util::{Error, Result};

/// One drawable part of a mesh: an index buffer plus its appearance.
#[derive(Clone, Debug, PartialEq)]
pub struct SubMesh {
    pub index_buffer: ObjectIndex,
    pub appearance: ObjectIndex,
}

/// Rigid mesh node.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Mesh {
    pub base: ObjectBase,
    pub transform: Transform,
    pub node: NodeData,
    pub vertex_buffer: ObjectIndex,
    pub submeshes: Vec<SubMesh>,
}

impl Mesh {
    pub(crate) fn decode(r: &mut M3gReader<'_>, table: &mut ObjectTable) -> Result<Self> {
        let base = ObjectBase::decode(r, table)?;
        let transform = Transform::decode(r)?;
        let node = NodeData::decode(r, table)?;
        let mut mesh = Self {
            base,
            transform,
            node,
            vertex_buffer: ObjectIndex::NULL,
            submeshes: Vec::new(),
        };
        mesh.decode_geometry(r, table)?;
        Ok(mesh)
    }

    /// Vertex buffer + submesh list, shared with the mesh subclasses.
    fn decode_geometry(&mut self, r: &mut M3gReader<'_>, table: &mut ObjectTable) -> Result<()> {
        self.vertex_buffer = table.require_ref(
            r.read_index()?,
            Expect::Kind(ObjectType::VertexBuffer),
            "vertexBuffer",
        )?;
        let count = r.read_array_count(8)?;
        if count == 0 {
            return Err(Error::invalid("mesh with zero submeshes"));
        }
        self.submeshes = Vec::with_capacity(count);
        for _ in 0..count {
            let index_buffer = table.require_ref(
                r.read_index()?,
                Expect::Kind(ObjectType::TriangleStripArray),
                "indexBuffer",
            )?;
            let appearance = table.optional_ref(
                r.read_index()?,
                Expect::Kind(ObjectType::Appearance),
                "appearance",
            )?;
            self.submeshes.push(SubMesh {
                index_buffer,
                appearance,
            });
        }
        Ok(())
    }

    pub(crate) fn encode(&self, w: &mut M3gWriter, ctx: &EncodeContext<'_>) -> Result<()> {
        self.base.encode(w, ctx)?;
        self.transform.encode(w);
        self.node.encode(w, ctx)?;
        self.encode_geometry(w, ctx)
    }

    fn encode_geometry(&self, w: &mut M3gWriter, ctx: &EncodeContext<'_>) -> Result<()> {
        ctx.check_required(
            self.vertex_buffer,
            Expect::Kind(ObjectType::VertexBuffer),
            "vertexBuffer",
        )?;
        w.write_index(self.vertex_buffer);
        if self.submeshes.is_empty() {
            return Err(Error::invalid("mesh with zero submeshes"));
        }
        w.write_u32(self.submeshes.len() as u32);
        for sm in &self.submeshes {
            ctx.check_required(
                sm.index_buffer,
                Expect::Kind(ObjectType::TriangleStripArray),
                "indexBuffer",
            )?;
            w.write_index(sm.index_buffer);
            ctx.check_optional(
                sm.appearance,
                Expect::Kind(ObjectType::Appearance),
                "appearance",
            )?;
            w.write_index(sm.appearance);
        }
        Ok(())
    }

    pub(crate) fn collect_references(&self, out: &mut Vec<ObjectIndex>) {
        self.node.collect_references(out);
        out.push(self.vertex_buffer);
        for sm in &self.submeshes {
            out.push(sm.index_buffer);
            out.push(sm.appearance);
        }
    }
}

/// Additional vertex buffer blended into the base geometry.
#[derive(Clone, Debug, PartialEq)]
pub struct MorphTarget {
    pub target: ObjectIndex,
    pub initial_weight: f32,
}

/// Mesh whose vertices blend between morph targets.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct MorphingMesh {
    pub mesh: Mesh,
    pub targets: Vec<MorphTarget>,
}

impl MorphingMesh {
    pub(crate) fn decode(r: &mut M3gReader<'_>, table: &mut ObjectTable) -> Result<Self> {
        let mesh = Mesh::decode(r, table)?;
        let count = r.read_array_count(8)?;
        let mut targets = Vec::with_capacity(count);
        for _ in 0..count {
            let target = table.require_ref(
                r.read_index()?,
                Expect::Kind(ObjectType::VertexBuffer),
                "morphTarget",
            )?;
            targets.push(MorphTarget {
                target,
                initial_weight: r.read_f32()?,
            });
        }
        Ok(Self { mesh, targets })
    }

    pub(crate) fn encode(&self, w: &mut M3gWriter, ctx: &EncodeContext<'_>) -> Result<()> {
        self.mesh.encode(w, ctx)?;
        w.write_u32(self.targets.len() as u32);
        for t in &self.targets {
            ctx.check_required(
                t.target,
                Expect::Kind(ObjectType::VertexBuffer),
                "morphTarget",
            )?;
            w.write_index(t.target);
            w.write_f32(t.initial_weight);
        }
        Ok(())
    }
}

/// One bone influence: a skeleton node weighted over a vertex range.
#[derive(Clone, Debug, PartialEq)]
pub struct BoneReference {
    pub node: ObjectIndex,
    pub first_vertex: u32,
    pub vertex_count: u32,
    pub weight: i32,
}

/// Mesh deformed by a skeleton of transform nodes.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct SkinnedMesh {
    pub mesh: Mesh,
    pub skeleton: ObjectIndex,
    pub bones: Vec<BoneReference>,
}

impl SkinnedMesh {
    pub(crate) fn decode(r: &mut M3gReader<'_>, table: &mut ObjectTable) -> Result<Self> {
        let mesh = Mesh::decode(r, table)?;
        let skeleton =
            table.require_ref(r.read_index()?, Expect::Kind(ObjectType::Group), "skeleton")?;
        let count = r.read_array_count(16)?;
        let mut bones = Vec::with_capacity(count);
        for _ in 0..count {
            let node = table.require_ref(r.read_index()?, Expect::AnyNode, "transformNode")?;
            bones.push(BoneReference {
                node,
                first_vertex: r.read_u32()?,
                vertex_count: r.read_u32()?,
                weight: r.read_i32()?,
            });
        }
        Ok(Self {
            mesh,
            skeleton,
            bones,
        })
    }

    pub(crate) fn encode(&self, w: &mut M3gWriter, ctx: &EncodeContext<'_>) -> Result<()> {
        self.mesh.encode(w, ctx)?;
        ctx.check_required(self.skeleton, Expect::Kind(ObjectType::Group), "skeleton")?;
        w.write_index(self.skeleton);
        w.write_u32(self.bones.len() as u32);
        for bone in &self.bones {
            ctx.check_required(bone.node, Expect::AnyNode, "transformNode")?;
            w.write_index(bone.node);
            w.write_u32(bone.first_vertex);
            w.write_u32(bone.vertex_count);
            w.write_i32(bone.weight);
        }
        Ok(())
    }
}
