//! The closed set of object kinds an M3G file can hold.
//!
//! Each kind lives in its own schema module with a plain-old-data struct and
//! a decode/encode pair over the primitive codec. Dispatch happens here,
//! through an exhaustive match on [`ObjectType`], so an unknown tag is the
//! only runtime failure mode and a missing kind is a compile error.

mod animation;
mod appearance;
mod background;
mod camera;
mod external;
mod group;
mod header;
mod image;
mod light;
mod mesh;
mod node;
mod sprite;
mod texture;
mod triangles;
pub(crate) mod vertex;

pub use animation::{
    AnimationController, AnimationTrack, Interpolation, Keyframe, KeyframeSequence, RepeatMode,
};
pub use appearance::{
    Appearance, Blending, CompositingMode, Culling, Fog, FogMode, Material, PolygonMode, Shading,
    Winding,
};
pub use background::{Background, BackgroundImageMode};
pub use camera::{Camera, Projection};
pub use external::ExternalReference;
pub use group::{Group, World};
pub use header::Header;
pub use image::{Image2D, ImageData, ImageFormat, PixelImage};
pub use light::{Light, LightMode};
pub use mesh::{BoneReference, Mesh, MorphTarget, MorphingMesh, SkinnedMesh, SubMesh};
pub use node::{Alignment, AlignmentTarget, NodeData, Transform};
pub use sprite::{Crop, Sprite3D};
pub use texture::{ImageFilter, LevelFilter, Texture2D, TextureBlend, TextureWrap};
pub use triangles::{IndexData, TriangleStripArray};
pub use vertex::{TexCoordArray, VertexArray, VertexBuffer, VertexValues};

use crate::codec::{M3gReader, M3gWriter, ObjectIndex};
use crate::table::{EncodeContext, Expect, ObjectTable};
use crate::util::{Error, Result};

/// One-byte type tag of a serialized object.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum ObjectType {
    Header = 0,
    AnimationController = 1,
    AnimationTrack = 2,
    Appearance = 3,
    Background = 4,
    Camera = 5,
    CompositingMode = 6,
    Fog = 7,
    PolygonMode = 8,
    Group = 9,
    Image2D = 10,
    TriangleStripArray = 11,
    Light = 12,
    Material = 13,
    Mesh = 14,
    MorphingMesh = 15,
    SkinnedMesh = 16,
    Texture2D = 17,
    Sprite3D = 18,
    KeyframeSequence = 19,
    VertexArray = 20,
    VertexBuffer = 21,
    World = 22,
    ExternalReference = 255,
}

impl ObjectType {
    /// Convert a wire tag to an object type.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Header),
            1 => Some(Self::AnimationController),
            2 => Some(Self::AnimationTrack),
            3 => Some(Self::Appearance),
            4 => Some(Self::Background),
            5 => Some(Self::Camera),
            6 => Some(Self::CompositingMode),
            7 => Some(Self::Fog),
            8 => Some(Self::PolygonMode),
            9 => Some(Self::Group),
            10 => Some(Self::Image2D),
            11 => Some(Self::TriangleStripArray),
            12 => Some(Self::Light),
            13 => Some(Self::Material),
            14 => Some(Self::Mesh),
            15 => Some(Self::MorphingMesh),
            16 => Some(Self::SkinnedMesh),
            17 => Some(Self::Texture2D),
            18 => Some(Self::Sprite3D),
            19 => Some(Self::KeyframeSequence),
            20 => Some(Self::VertexArray),
            21 => Some(Self::VertexBuffer),
            22 => Some(Self::World),
            255 => Some(Self::ExternalReference),
            _ => None,
        }
    }

    /// The wire tag.
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Human-readable kind name, used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            Self::Header => "Header",
            Self::AnimationController => "AnimationController",
            Self::AnimationTrack => "AnimationTrack",
            Self::Appearance => "Appearance",
            Self::Background => "Background",
            Self::Camera => "Camera",
            Self::CompositingMode => "CompositingMode",
            Self::Fog => "Fog",
            Self::PolygonMode => "PolygonMode",
            Self::Group => "Group",
            Self::Image2D => "Image2D",
            Self::TriangleStripArray => "TriangleStripArray",
            Self::Light => "Light",
            Self::Material => "Material",
            Self::Mesh => "Mesh",
            Self::MorphingMesh => "MorphingMesh",
            Self::SkinnedMesh => "SkinnedMesh",
            Self::Texture2D => "Texture2D",
            Self::Sprite3D => "Sprite3D",
            Self::KeyframeSequence => "KeyframeSequence",
            Self::VertexArray => "VertexArray",
            Self::VertexBuffer => "VertexBuffer",
            Self::World => "World",
            Self::ExternalReference => "ExternalReference",
        }
    }
}

/// A decoded scene object, one variant per kind.
#[derive(Clone, Debug, PartialEq)]
pub enum SceneObject {
    Header(Header),
    AnimationController(AnimationController),
    AnimationTrack(AnimationTrack),
    Appearance(Appearance),
    Background(Background),
    Camera(Camera),
    CompositingMode(CompositingMode),
    Fog(Fog),
    PolygonMode(PolygonMode),
    Group(Group),
    Image2D(Image2D),
    TriangleStripArray(TriangleStripArray),
    Light(Light),
    Material(Material),
    Mesh(Mesh),
    MorphingMesh(MorphingMesh),
    SkinnedMesh(SkinnedMesh),
    Texture2D(Texture2D),
    Sprite3D(Sprite3D),
    KeyframeSequence(KeyframeSequence),
    VertexArray(VertexArray),
    VertexBuffer(VertexBuffer),
    World(World),
    ExternalReference(ExternalReference),
}

impl SceneObject {
    pub fn object_type(&self) -> ObjectType {
        match self {
            Self::Header(_) => ObjectType::Header,
            Self::AnimationController(_) => ObjectType::AnimationController,
            Self::AnimationTrack(_) => ObjectType::AnimationTrack,
            Self::Appearance(_) => ObjectType::Appearance,
            Self::Background(_) => ObjectType::Background,
            Self::Camera(_) => ObjectType::Camera,
            Self::CompositingMode(_) => ObjectType::CompositingMode,
            Self::Fog(_) => ObjectType::Fog,
            Self::PolygonMode(_) => ObjectType::PolygonMode,
            Self::Group(_) => ObjectType::Group,
            Self::Image2D(_) => ObjectType::Image2D,
            Self::TriangleStripArray(_) => ObjectType::TriangleStripArray,
            Self::Light(_) => ObjectType::Light,
            Self::Material(_) => ObjectType::Material,
            Self::Mesh(_) => ObjectType::Mesh,
            Self::MorphingMesh(_) => ObjectType::MorphingMesh,
            Self::SkinnedMesh(_) => ObjectType::SkinnedMesh,
            Self::Texture2D(_) => ObjectType::Texture2D,
            Self::Sprite3D(_) => ObjectType::Sprite3D,
            Self::KeyframeSequence(_) => ObjectType::KeyframeSequence,
            Self::VertexArray(_) => ObjectType::VertexArray,
            Self::VertexBuffer(_) => ObjectType::VertexBuffer,
            Self::World(_) => ObjectType::World,
            Self::ExternalReference(_) => ObjectType::ExternalReference,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.object_type().name()
    }

    /// True for the Node-derived kinds, which may fill polymorphic slots
    /// such as a Group child or an alignment reference.
    pub fn is_node(&self) -> bool {
        matches!(
            self,
            Self::Camera(_)
                | Self::Group(_)
                | Self::Light(_)
                | Self::Mesh(_)
                | Self::MorphingMesh(_)
                | Self::SkinnedMesh(_)
                | Self::Sprite3D(_)
                | Self::World(_)
        )
    }

    /// Every reference index this object holds, in no particular order.
    /// Used by the dependency-order build phase.
    pub fn references(&self) -> Vec<ObjectIndex> {
        let mut out = Vec::new();
        if let Some(base) = self.base() {
            out.extend_from_slice(&base.animation_tracks);
        }
        match self {
            Self::Header(_) | Self::ExternalReference(_) => {}
            Self::AnimationController(_)
            | Self::CompositingMode(_)
            | Self::Fog(_)
            | Self::PolygonMode(_)
            | Self::Material(_)
            | Self::Image2D(_)
            | Self::TriangleStripArray(_)
            | Self::KeyframeSequence(_)
            | Self::VertexArray(_) => {}
            Self::AnimationTrack(t) => {
                out.push(t.keyframe_sequence);
                out.push(t.controller);
            }
            Self::Appearance(a) => {
                out.extend([a.compositing_mode, a.fog, a.polygon_mode, a.material]);
                out.extend_from_slice(&a.textures);
            }
            Self::Background(b) => out.push(b.image),
            Self::Camera(c) => c.node.collect_references(&mut out),
            Self::Group(g) => {
                g.node.collect_references(&mut out);
                out.extend_from_slice(&g.children);
            }
            Self::Light(l) => l.node.collect_references(&mut out),
            Self::Mesh(m) => m.collect_references(&mut out),
            Self::MorphingMesh(m) => {
                m.mesh.collect_references(&mut out);
                out.extend(m.targets.iter().map(|t| t.target));
            }
            Self::SkinnedMesh(m) => {
                m.mesh.collect_references(&mut out);
                out.push(m.skeleton);
                out.extend(m.bones.iter().map(|b| b.node));
            }
            Self::Texture2D(t) => out.push(t.image),
            Self::Sprite3D(s) => {
                s.node.collect_references(&mut out);
                out.extend([s.image, s.appearance]);
            }
            Self::VertexBuffer(vb) => {
                out.extend([vb.positions, vb.normals, vb.colors]);
                out.extend(vb.tex_coords.iter().map(|t| t.array));
            }
            Self::World(w) => {
                w.node.collect_references(&mut out);
                out.extend_from_slice(&w.children);
                out.extend([w.active_camera, w.background]);
            }
        }
        out.retain(|idx| !idx.is_null());
        out
    }

    /// The common prefix carried by every kind except Header and
    /// ExternalReference.
    pub fn base(&self) -> Option<&ObjectBase> {
        match self {
            Self::Header(_) | Self::ExternalReference(_) => None,
            Self::AnimationController(o) => Some(&o.base),
            Self::AnimationTrack(o) => Some(&o.base),
            Self::Appearance(o) => Some(&o.base),
            Self::Background(o) => Some(&o.base),
            Self::Camera(o) => Some(&o.base),
            Self::CompositingMode(o) => Some(&o.base),
            Self::Fog(o) => Some(&o.base),
            Self::PolygonMode(o) => Some(&o.base),
            Self::Group(o) => Some(&o.base),
            Self::Image2D(o) => Some(&o.base),
            Self::TriangleStripArray(o) => Some(&o.base),
            Self::Light(o) => Some(&o.base),
            Self::Material(o) => Some(&o.base),
            Self::Mesh(o) => Some(&o.base),
            Self::MorphingMesh(o) => Some(&o.mesh.base),
            Self::SkinnedMesh(o) => Some(&o.mesh.base),
            Self::Texture2D(o) => Some(&o.base),
            Self::Sprite3D(o) => Some(&o.base),
            Self::KeyframeSequence(o) => Some(&o.base),
            Self::VertexArray(o) => Some(&o.base),
            Self::VertexBuffer(o) => Some(&o.base),
            Self::World(o) => Some(&o.base),
        }
    }
}

/// Fields shared by every non-header, non-external object: user ID, attached
/// animation tracks and the free-form user parameter blobs.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct ObjectBase {
    pub user_id: u32,
    pub animation_tracks: Vec<ObjectIndex>,
    pub user_parameters: Vec<UserParameter>,
}

/// One user parameter: numeric id plus an opaque blob.
#[derive(Clone, Debug, PartialEq)]
pub struct UserParameter {
    pub id: u32,
    pub data: Vec<u8>,
}

impl ObjectBase {
    pub(crate) fn decode(r: &mut M3gReader<'_>, table: &mut ObjectTable) -> Result<Self> {
        let user_id = r.read_u32()?;
        let track_count = r.read_array_count(4)?;
        let mut animation_tracks = Vec::with_capacity(track_count);
        for _ in 0..track_count {
            let idx = r.read_index()?;
            animation_tracks.push(table.require_ref(
                idx,
                Expect::Kind(ObjectType::AnimationTrack),
                "animationTracks",
            )?);
        }
        let param_count = r.read_array_count(8)?;
        let mut user_parameters = Vec::with_capacity(param_count);
        for _ in 0..param_count {
            let id = r.read_u32()?;
            let size = r.read_array_count(1)?;
            user_parameters.push(UserParameter {
                id,
                data: r.bytes(size)?.to_vec(),
            });
        }
        Ok(Self {
            user_id,
            animation_tracks,
            user_parameters,
        })
    }

    pub(crate) fn encode(&self, w: &mut M3gWriter, ctx: &EncodeContext<'_>) -> Result<()> {
        w.write_u32(self.user_id);
        w.write_u32(self.animation_tracks.len() as u32);
        for &track in &self.animation_tracks {
            ctx.check_required(
                track,
                Expect::Kind(ObjectType::AnimationTrack),
                "animationTracks",
            )?;
            w.write_index(track);
        }
        w.write_u32(self.user_parameters.len() as u32);
        for param in &self.user_parameters {
            w.write_u32(param.id);
            w.write_u32(param.data.len() as u32);
            w.put(&param.data);
        }
        Ok(())
    }
}

/// Decode one object body. `tag` selects the kind; `body` must be consumed
/// completely or the object is rejected.
pub(crate) fn decode_object(tag: u8, body: &[u8], table: &mut ObjectTable) -> Result<SceneObject> {
    let kind = ObjectType::from_u8(tag).ok_or(Error::UnknownObjectType(tag))?;
    let mut r = M3gReader::new(body);
    let obj = match kind {
        ObjectType::Header => SceneObject::Header(Header::decode(&mut r)?),
        ObjectType::AnimationController => {
            SceneObject::AnimationController(AnimationController::decode(&mut r, table)?)
        }
        ObjectType::AnimationTrack => {
            SceneObject::AnimationTrack(AnimationTrack::decode(&mut r, table)?)
        }
        ObjectType::Appearance => SceneObject::Appearance(Appearance::decode(&mut r, table)?),
        ObjectType::Background => SceneObject::Background(Background::decode(&mut r, table)?),
        ObjectType::Camera => SceneObject::Camera(Camera::decode(&mut r, table)?),
        ObjectType::CompositingMode => {
            SceneObject::CompositingMode(CompositingMode::decode(&mut r, table)?)
        }
        ObjectType::Fog => SceneObject::Fog(Fog::decode(&mut r, table)?),
        ObjectType::PolygonMode => SceneObject::PolygonMode(PolygonMode::decode(&mut r, table)?),
        ObjectType::Group => SceneObject::Group(Group::decode(&mut r, table)?),
        ObjectType::Image2D => SceneObject::Image2D(Image2D::decode(&mut r, table)?),
        ObjectType::TriangleStripArray => {
            SceneObject::TriangleStripArray(TriangleStripArray::decode(&mut r, table)?)
        }
        ObjectType::Light => SceneObject::Light(Light::decode(&mut r, table)?),
        ObjectType::Material => SceneObject::Material(Material::decode(&mut r, table)?),
        ObjectType::Mesh => SceneObject::Mesh(Mesh::decode(&mut r, table)?),
        ObjectType::MorphingMesh => {
            SceneObject::MorphingMesh(MorphingMesh::decode(&mut r, table)?)
        }
        ObjectType::SkinnedMesh => SceneObject::SkinnedMesh(SkinnedMesh::decode(&mut r, table)?),
        ObjectType::Texture2D => SceneObject::Texture2D(Texture2D::decode(&mut r, table)?),
        ObjectType::Sprite3D => SceneObject::Sprite3D(Sprite3D::decode(&mut r, table)?),
        ObjectType::KeyframeSequence => {
            SceneObject::KeyframeSequence(KeyframeSequence::decode(&mut r, table)?)
        }
        ObjectType::VertexArray => SceneObject::VertexArray(VertexArray::decode(&mut r, table)?),
        ObjectType::VertexBuffer => {
            SceneObject::VertexBuffer(VertexBuffer::decode(&mut r, table)?)
        }
        ObjectType::World => SceneObject::World(World::decode(&mut r, table)?),
        ObjectType::ExternalReference => {
            SceneObject::ExternalReference(ExternalReference::decode(&mut r)?)
        }
    };
    if !r.at_end() {
        return Err(Error::invalid(format!(
            "{} object has {} trailing bytes",
            kind.name(),
            r.remaining()
        )));
    }
    Ok(obj)
}

/// Encode one object body; the caller wraps it in its tag+length envelope.
pub(crate) fn encode_object(obj: &SceneObject, ctx: &EncodeContext<'_>) -> Result<Vec<u8>> {
    let mut w = M3gWriter::new();
    match obj {
        SceneObject::Header(o) => o.encode(&mut w)?,
        SceneObject::AnimationController(o) => o.encode(&mut w, ctx)?,
        SceneObject::AnimationTrack(o) => o.encode(&mut w, ctx)?,
        SceneObject::Appearance(o) => o.encode(&mut w, ctx)?,
        SceneObject::Background(o) => o.encode(&mut w, ctx)?,
        SceneObject::Camera(o) => o.encode(&mut w, ctx)?,
        SceneObject::CompositingMode(o) => o.encode(&mut w, ctx)?,
        SceneObject::Fog(o) => o.encode(&mut w, ctx)?,
        SceneObject::PolygonMode(o) => o.encode(&mut w, ctx)?,
        SceneObject::Group(o) => o.encode(&mut w, ctx)?,
        SceneObject::Image2D(o) => o.encode(&mut w, ctx)?,
        SceneObject::TriangleStripArray(o) => o.encode(&mut w, ctx)?,
        SceneObject::Light(o) => o.encode(&mut w, ctx)?,
        SceneObject::Material(o) => o.encode(&mut w, ctx)?,
        SceneObject::Mesh(o) => o.encode(&mut w, ctx)?,
        SceneObject::MorphingMesh(o) => o.encode(&mut w, ctx)?,
        SceneObject::SkinnedMesh(o) => o.encode(&mut w, ctx)?,
        SceneObject::Texture2D(o) => o.encode(&mut w, ctx)?,
        SceneObject::Sprite3D(o) => o.encode(&mut w, ctx)?,
        SceneObject::KeyframeSequence(o) => o.encode(&mut w, ctx)?,
        SceneObject::VertexArray(o) => o.encode(&mut w, ctx)?,
        SceneObject::VertexBuffer(o) => o.encode(&mut w, ctx)?,
        SceneObject::World(o) => o.encode(&mut w, ctx)?,
        SceneObject::ExternalReference(o) => o.encode(&mut w)?,
    }
    Ok(w.into_inner())
}
