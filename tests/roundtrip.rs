//! Whole-file round trips through disk.

use m3g::prelude::*;
use tempfile::tempdir;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A small but complete world: geometry, appearance chain, camera, light.
fn build_world(file: &mut SceneFile) -> ObjectIndex {
    let positions = file.add(SceneObject::VertexArray(VertexArray {
        component_count: 3,
        // 300 keeps the array at 16 bits, so it reads back bit-identical.
        values: VertexValues::Short(vec![0, 0, 0, 1, 0, 0, 300, 0, 0, 1, 1, 0]),
        ..VertexArray::default()
    }));
    let buffer = file.add(SceneObject::VertexBuffer(VertexBuffer {
        positions,
        position_scale: 0.25,
        position_bias: [0.0, -1.0, 0.0],
        ..VertexBuffer::default()
    }));
    let indices = file.add(SceneObject::TriangleStripArray(
        TriangleStripArray::with_explicit_indices(vec![0, 1, 2, 3], vec![4]).unwrap(),
    ));
    let material = file.add(SceneObject::Material(Material {
        shininess: 24.0,
        ..Material::default()
    }));
    let appearance = file.add(SceneObject::Appearance(Appearance {
        material,
        ..Appearance::default()
    }));
    let mesh = file.add(SceneObject::Mesh(Mesh {
        vertex_buffer: buffer,
        submeshes: vec![SubMesh {
            index_buffer: indices,
            appearance,
        }],
        ..Mesh::default()
    }));
    let camera = file.add(SceneObject::Camera(Camera {
        projection: Projection::Perspective {
            fovy: 60.0,
            aspect_ratio: 4.0 / 3.0,
            near: 0.1,
            far: 100.0,
        },
        ..Camera::default()
    }));
    let light = file.add(SceneObject::Light(Light::default()));
    file.add(SceneObject::World(World {
        children: vec![mesh, camera, light],
        active_camera: camera,
        ..World::default()
    }))
}

#[test]
fn test_world_roundtrip_through_disk() {
    init_tracing();
    let dir = tempdir().unwrap();
    let path = dir.path().join("world.m3g");

    let mut file = SceneFile::new();
    let world = build_world(&mut file);
    file.save(&path).unwrap();

    let back = SceneFile::load(&path).unwrap();
    assert_eq!(back.table.len(), file.table.len());
    // Every object except the header (whose sizes are recomputed) must come
    // back field-for-field identical.
    for index in 2..file.table.len() {
        let index = ObjectIndex(index);
        assert_eq!(back.table.get(index), file.table.get(index), "{index}");
    }
    // The world is the only root; everything else is referenced.
    assert_eq!(back.roots(), vec![world]);
}

#[test]
fn test_header_sizes_match_written_file() {
    init_tracing();
    let mut file = SceneFile::new();
    build_world(&mut file);
    let bytes = file.write(SaveOptions::default()).unwrap();
    let back = SceneFile::read(&bytes).unwrap();
    let header = back.header().unwrap();
    assert_eq!(header.total_file_size, bytes.len() as u32);
    assert_eq!(header.approximate_content_size, bytes.len() as u32);
    assert!(!header.has_external_references);
}

#[test]
fn test_material_scenario() {
    let mut file = SceneFile::new();
    let idx = file.add(SceneObject::Material(Material {
        ambient_color: ColorRgb::from_argb(0x00333333),
        diffuse_color: ColorRgba::from_argb(0xFFCCCCCC),
        shininess: 0.0,
        ..Material::default()
    }));
    let bytes = file.write(SaveOptions::default()).unwrap();
    let back = SceneFile::read(&bytes).unwrap();
    let Some(SceneObject::Material(mat)) = back.table.get(idx) else {
        panic!("material missing");
    };
    assert_eq!(mat.ambient_color.argb(), 0x00333333);
    assert_eq!(mat.diffuse_color.argb(), 0xFFCCCCCC);
    assert_eq!(mat.shininess, 0.0);
}

#[test]
fn test_strip_scenario() {
    let mut file = SceneFile::new();
    let idx = file.add(SceneObject::TriangleStripArray(
        TriangleStripArray::with_explicit_indices(vec![0, 1, 2, 3], vec![4]).unwrap(),
    ));
    let bytes = file.write(SaveOptions::default()).unwrap();
    let back = SceneFile::read(&bytes).unwrap();
    let Some(SceneObject::TriangleStripArray(arr)) = back.table.get(idx) else {
        panic!("strip array missing");
    };
    assert_eq!(arr.index_count(), 4);
    assert_eq!(arr.triangles(), vec![[0, 1, 2], [2, 1, 3]]);
}

#[test]
fn test_forward_reference_rejected_on_write() {
    let mut file = SceneFile::new();
    let group = Group {
        // Points past itself; dependency order is violated.
        children: vec![ObjectIndex(3)],
        ..Group::default()
    };
    file.add(SceneObject::Group(group));
    file.add(SceneObject::Camera(Camera::default()));
    assert!(file.write(SaveOptions::default()).is_err());
}

#[test]
fn test_payload_corruption_detected() {
    init_tracing();
    let mut file = SceneFile::new();
    build_world(&mut file);
    let mut bytes = file.write(SaveOptions::default()).unwrap();
    // Flip a byte inside the last section's payload; the checksum must trip.
    let n = bytes.len();
    bytes[n - 20] ^= 0x40;
    assert!(matches!(
        SceneFile::read(&bytes),
        Err(Error::ChecksumMismatch { .. })
    ));
}

#[test]
fn test_trailing_garbage_rejected() {
    let mut file = SceneFile::new();
    build_world(&mut file);
    let mut bytes = file.write(SaveOptions::default()).unwrap();
    bytes.extend_from_slice(&[0xDE, 0xAD]);
    assert!(SceneFile::read(&bytes).is_err());
}

#[test]
fn test_animation_roundtrip() {
    let mut file = SceneFile::new();
    let seq = file.add(SceneObject::KeyframeSequence(KeyframeSequence {
        interpolation: Interpolation::Linear,
        repeat_mode: RepeatMode::Loop,
        duration: 1000,
        valid_range_first: 0,
        valid_range_last: 1,
        component_count: 3,
        keyframes: vec![
            Keyframe {
                time: 0,
                value: vec![0.0, 0.0, 0.0],
            },
            Keyframe {
                time: 500,
                value: vec![1.0, 2.0, 3.0],
            },
        ],
        ..KeyframeSequence::default()
    }));
    let controller = file.add(SceneObject::AnimationController(
        AnimationController::default(),
    ));
    let track = file.add(SceneObject::AnimationTrack(AnimationTrack {
        base: ObjectBase::default(),
        keyframe_sequence: seq,
        controller,
        property_id: 276,
    }));
    let mut group = Group::default();
    group.base.animation_tracks.push(track);
    let idx = file.add(SceneObject::Group(group));

    let bytes = file.write(SaveOptions::default()).unwrap();
    let back = SceneFile::read(&bytes).unwrap();
    for i in [seq, controller, track, idx] {
        assert_eq!(back.table.get(i), file.table.get(i));
    }
    assert_eq!(back.roots(), vec![idx]);
}
