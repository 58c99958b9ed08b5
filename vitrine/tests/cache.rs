mod common;

use common::{RecordingDevice, SceneExt, UNIT_TRIANGLE, init_logging, primitive};
use nalgebra::Vector3;
use vitrine::assets::{
    Accessor, ComponentType, ElementShape, PrimitiveKey, Scene, Topology,
};
use vitrine::rendering::{
    AttributeSemantic, CacheError, GpuResource, IndexWidth, RenderCache,
};

/// Two meshes: an indexed triangle and a non-indexed one.
fn two_mesh_scene() -> Scene {
    let mut scene = Scene::default();

    let a = scene.add_positions(&UNIT_TRIANGLE);
    let indices = scene.add_u16_indices(&[0, 1, 2]);
    scene.add_mesh(vec![primitive(a, Some(indices), None)]);

    let b = scene.add_positions(&UNIT_TRIANGLE);
    scene.add_mesh(vec![primitive(b, None, None)]);

    let node = scene.add_node(common::mesh_node(0, Vector3::zeros()));
    scene.add_root(vec![node]);
    scene
}

#[test]
fn test_init_free_init_yields_same_keys() {
    init_logging();
    let scene = two_mesh_scene();
    let mut device = RecordingDevice::new();
    let mut cache = RenderCache::new();

    cache.init(&mut device, &scene).unwrap();
    let first: Vec<PrimitiveKey> = cache.keys().collect();
    cache.free(&mut device);

    assert!(!cache.is_initialized());
    assert_eq!(cache.keys().count(), 0);
    assert_eq!(device.live_buffers(), 0);

    cache.init(&mut device, &scene).unwrap();
    let second: Vec<PrimitiveKey> = cache.keys().collect();

    assert_eq!(first, second);
    assert_eq!(first, vec![PrimitiveKey::new(0, 0), PrimitiveKey::new(1, 0)]);
}

#[test]
fn test_free_twice_is_harmless() {
    let scene = two_mesh_scene();
    let mut device = RecordingDevice::new();
    let mut cache = RenderCache::new();

    cache.init(&mut device, &scene).unwrap();
    cache.free(&mut device);
    cache.free(&mut device);
    assert_eq!(device.live_buffers(), 0);
}

#[test]
fn test_init_twice_frees_the_old_resources() {
    let scene = two_mesh_scene();
    let mut device = RecordingDevice::new();
    let mut cache = RenderCache::new();

    cache.init(&mut device, &scene).unwrap();
    let live = device.live_buffers();
    cache.init(&mut device, &scene).unwrap();

    assert_eq!(device.live_buffers(), live);
}

#[test]
fn test_handles_follow_the_primitive() {
    let scene = two_mesh_scene();
    let mut device = RecordingDevice::new();
    let mut cache = RenderCache::new();
    cache.init(&mut device, &scene).unwrap();

    // one vertex buffer per scene buffer, index data included
    assert_eq!(cache.vertex_buffer_count(), scene.buffers.len());

    let indexed = cache.draw_handle(PrimitiveKey::new(0, 0)).unwrap();
    assert!(indexed.indexed);
    assert_eq!(indexed.count, 3);
    assert_eq!(indexed.index_width, Some(IndexWidth::U16));
    assert_eq!(indexed.topology, Topology::Triangles);

    let plain = cache.draw_handle(PrimitiveKey::new(1, 0)).unwrap();
    assert!(!plain.indexed);
    assert_eq!(plain.count, 3);
    assert_eq!(plain.index_buffer, None);

    let position = plain.binding(AttributeSemantic::Position).unwrap();
    assert_eq!(position.cardinality, 3);
    assert_eq!(position.byte_stride, 12);
    assert_eq!(position.byte_offset, 0);
}

#[test]
fn test_shared_index_accessor_is_uploaded_once() {
    let mut scene = Scene::default();
    let position = scene.add_positions(&UNIT_TRIANGLE);
    let indices = scene.add_u16_indices(&[0, 1, 2]);
    scene.add_mesh(vec![
        primitive(position, Some(indices), None),
        primitive(position, Some(indices), None),
    ]);
    scene.add_mesh(vec![primitive(position, Some(indices), None)]);

    let mut device = RecordingDevice::new();
    let mut cache = RenderCache::new();
    cache.init(&mut device, &scene).unwrap();

    assert_eq!(cache.primitive_count(), 3);
    assert_eq!(cache.index_buffer_count(), 1);
    assert_eq!(device.uploaded_indices.len(), 1);
    for key in cache.keys() {
        assert_eq!(cache.draw_handle(key).unwrap().index_buffer, Some(indices));
    }
}

#[test]
fn test_u8_indices_are_promoted() {
    let mut scene = Scene::default();
    let position = scene.add_positions(&UNIT_TRIANGLE);
    let indices = scene.add_u8_indices(&[0, 255, 3]);
    scene.add_mesh(vec![primitive(position, Some(indices), None)]);

    let mut device = RecordingDevice::new();
    let mut cache = RenderCache::new();
    cache.init(&mut device, &scene).unwrap();

    let (_, width, data) = &device.uploaded_indices[0];
    assert_eq!(*width, IndexWidth::U16);
    let read_back: Vec<u16> = data
        .chunks_exact(2)
        .map(|c| u16::from_ne_bytes([c[0], c[1]]))
        .collect();
    assert_eq!(read_back, vec![0, 255, 3]);

    let cached = cache.index_buffer(indices).unwrap();
    assert_eq!(cached.width, IndexWidth::U16);
    assert_eq!(cached.count, 3);
}

#[test]
fn test_float_indices_skip_only_that_primitive() {
    init_logging();
    let mut scene = Scene::default();
    let position = scene.add_positions(&UNIT_TRIANGLE);
    let buffer = scene.push_buffer(vec![0u8; 12]);
    let view = scene.push_view(buffer, 0, 12, 0);
    let bad = scene.push_accessor(Accessor::new(view, ComponentType::F32, ElementShape::Scalar, 3));
    scene.add_mesh(vec![
        primitive(position, Some(bad), None),
        primitive(position, None, None),
    ]);

    let mut device = RecordingDevice::new();
    let mut cache = RenderCache::new();
    cache.init(&mut device, &scene).unwrap();

    assert_eq!(cache.keys().collect::<Vec<_>>(), vec![PrimitiveKey::new(0, 1)]);
    assert_eq!(cache.index_buffer_count(), 0);
}

#[test]
fn test_overflowing_index_count_skips_only_that_primitive() {
    init_logging();
    let mut scene = Scene::default();
    let position = scene.add_positions(&UNIT_TRIANGLE);
    let indices = scene.add_u16_indices(&[0, 1, 2]);

    let buffer = scene.push_buffer(vec![0u8; 16]);
    let view = scene.push_view(buffer, 0, 16, 0);
    let huge = scene.push_accessor(Accessor::new(
        view,
        ComponentType::U32,
        ElementShape::Scalar,
        usize::MAX / 2,
    ));
    scene.add_mesh(vec![
        primitive(position, Some(indices), None),
        primitive(position, Some(huge), None),
    ]);

    let mut device = RecordingDevice::new();
    let mut cache = RenderCache::new();
    cache.init(&mut device, &scene).unwrap();

    assert_eq!(cache.keys().collect::<Vec<_>>(), vec![PrimitiveKey::new(0, 0)]);
    assert!(cache.draw_handle(PrimitiveKey::new(0, 0)).unwrap().indexed);
    assert_eq!(cache.index_buffer_count(), 1);
}

#[test]
fn test_overflowing_attribute_offset_is_skipped() {
    let mut scene = Scene::default();
    let position = scene.add_positions(&UNIT_TRIANGLE);
    scene.accessors[position].byte_offset = usize::MAX;
    scene.add_mesh(vec![primitive(position, None, None)]);

    let mut device = RecordingDevice::new();
    let mut cache = RenderCache::new();
    cache.init(&mut device, &scene).unwrap();

    assert!(cache.is_initialized());
    assert_eq!(cache.primitive_count(), 0);
}

#[test]
fn test_mixed_buffers_are_skipped() {
    init_logging();
    let mut scene = Scene::default();
    let position = scene.add_positions(&UNIT_TRIANGLE);
    let normal = scene.add_positions(&[[0.0, 0.0, 1.0]; 3]);

    let mut mixed = primitive(position, None, None);
    mixed.attributes.insert("NORMAL".to_string(), normal);
    scene.add_mesh(vec![mixed, primitive(position, None, None)]);

    let mut device = RecordingDevice::new();
    let mut cache = RenderCache::new();
    cache.init(&mut device, &scene).unwrap();

    assert!(cache.draw_handle(PrimitiveKey::new(0, 0)).is_none());
    assert!(cache.draw_handle(PrimitiveKey::new(0, 1)).is_some());
}

#[test]
fn test_interleaved_attributes_share_a_buffer() {
    let mut scene = Scene::default();
    let buffer = scene.push_buffer(vec![0u8; 3 * 24]);
    let view = scene.push_view(buffer, 0, 3 * 24, 24);
    let position = scene.push_accessor(Accessor::new(view, ComponentType::F32, ElementShape::Vec3, 3));
    let mut normal = Accessor::new(view, ComponentType::F32, ElementShape::Vec3, 3);
    normal.byte_offset = 12;
    let normal = scene.push_accessor(normal);

    let mut prim = primitive(position, None, None);
    prim.attributes.insert("NORMAL".to_string(), normal);
    scene.add_mesh(vec![prim]);

    let mut device = RecordingDevice::new();
    let mut cache = RenderCache::new();
    cache.init(&mut device, &scene).unwrap();

    let handle = cache.draw_handle(PrimitiveKey::new(0, 0)).unwrap();
    assert_eq!(handle.vertex_buffer, buffer);
    let normal = handle.binding(AttributeSemantic::Normal).unwrap();
    assert_eq!(normal.byte_offset, 12);
    assert_eq!(normal.byte_stride, 24);
}

#[test]
fn test_count_mismatch_is_skipped() {
    let mut scene = Scene::default();
    let buffer = scene.push_buffer(vec![0u8; 96]);
    let view = scene.push_view(buffer, 0, 96, 0);
    let position = scene.push_accessor(Accessor::new(view, ComponentType::F32, ElementShape::Vec3, 3));
    let uv = scene.push_accessor(Accessor::new(view, ComponentType::F32, ElementShape::Vec2, 4));

    let mut prim = primitive(position, None, None);
    prim.attributes.insert("TEXCOORD_0".to_string(), uv);
    scene.add_mesh(vec![prim]);

    let mut device = RecordingDevice::new();
    let mut cache = RenderCache::new();
    cache.init(&mut device, &scene).unwrap();

    assert_eq!(cache.primitive_count(), 0);
    assert!(cache.is_initialized());
}

#[test]
fn test_missing_position_is_skipped() {
    let mut scene = Scene::default();
    let normal = scene.add_positions(&UNIT_TRIANGLE);
    let mut prim = primitive(normal, None, None);
    prim.attributes.clear();
    prim.attributes.insert("NORMAL".to_string(), normal);
    scene.add_mesh(vec![prim]);

    let mut device = RecordingDevice::new();
    let mut cache = RenderCache::new();
    cache.init(&mut device, &scene).unwrap();

    assert_eq!(cache.primitive_count(), 0);
}

#[test]
fn test_unknown_attributes_are_ignored() {
    let mut scene = Scene::default();
    let position = scene.add_positions(&UNIT_TRIANGLE);
    let mut prim = primitive(position, None, None);
    prim.attributes.insert("TANGENT".to_string(), 999);
    prim.attributes.insert("_CUSTOM".to_string(), 998);
    scene.add_mesh(vec![prim]);

    let mut device = RecordingDevice::new();
    let mut cache = RenderCache::new();
    cache.init(&mut device, &scene).unwrap();

    let handle = cache.draw_handle(PrimitiveKey::new(0, 0)).unwrap();
    assert_eq!(handle.bindings.len(), 1);
}

#[test]
fn test_dangling_attribute_is_skipped() {
    let mut scene = Scene::default();
    let position = scene.add_positions(&UNIT_TRIANGLE);
    let mut prim = primitive(position, None, None);
    prim.attributes.insert("NORMAL".to_string(), 42);
    scene.add_mesh(vec![prim]);

    let mut device = RecordingDevice::new();
    let mut cache = RenderCache::new();
    cache.init(&mut device, &scene).unwrap();

    assert_eq!(cache.primitive_count(), 0);
}

#[test]
fn test_unsupported_topologies_are_skipped() {
    init_logging();
    let mut scene = Scene::default();
    let position = scene.add_positions(&UNIT_TRIANGLE);
    let mut line_loop = primitive(position, None, None);
    line_loop.mode = Topology::LineLoop;
    let mut fan = primitive(position, None, None);
    fan.mode = Topology::TriangleFan;
    let mut strip = primitive(position, None, None);
    strip.mode = Topology::TriangleStrip;
    scene.add_mesh(vec![line_loop, fan, strip]);

    let mut device = RecordingDevice::new();
    device.unsupported_topologies.push(Topology::TriangleFan);
    let mut cache = RenderCache::new();
    cache.init(&mut device, &scene).unwrap();

    assert_eq!(cache.keys().collect::<Vec<_>>(), vec![PrimitiveKey::new(0, 2)]);
}

#[test]
fn test_allocation_failure_leaves_cache_empty() {
    init_logging();
    let scene = two_mesh_scene();
    // buffers 0..3 upload first, the index buffer is allocation #3
    let mut device = RecordingDevice::failing_at(3);
    let mut cache = RenderCache::new();

    let err = cache.init(&mut device, &scene).unwrap_err();
    match err {
        CacheError::ResourceAllocation { resource, .. } => {
            assert_eq!(resource, GpuResource::IndexBuffer(1));
        }
    }

    assert!(!cache.is_initialized());
    assert_eq!(cache.keys().count(), 0);
    assert_eq!(cache.vertex_buffer_count(), 0);
    assert_eq!(device.live_buffers(), 0);
}

#[test]
fn test_vertex_allocation_failure_releases_earlier_buffers() {
    let scene = two_mesh_scene();
    let mut device = RecordingDevice::failing_at(1);
    let mut cache = RenderCache::new();

    let err = cache.init(&mut device, &scene).unwrap_err();
    assert!(matches!(
        err,
        CacheError::ResourceAllocation {
            resource: GpuResource::VertexBuffer(1),
            ..
        }
    ));
    assert_eq!(device.live_buffers(), 0);
}
