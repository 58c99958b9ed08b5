mod common;

use common::SceneExt;
use vitrine::assets::{Accessor, ComponentType, ElementShape, ResolveError, Scene, resolve};

fn strided_scene() -> Scene {
    let mut scene = Scene::default();
    let buffer = scene.push_buffer(vec![0u8; 64]);
    let view = scene.push_view(buffer, 8, 48, 0);
    let mut accessor = Accessor::new(view, ComponentType::F32, ElementShape::Vec3, 3);
    accessor.byte_offset = 4;
    scene.push_accessor(accessor);
    scene
}

#[test]
fn test_resolve_valid_chain() {
    let scene = strided_scene();
    let resolved = resolve(&scene, 0).unwrap();

    assert_eq!(resolved.buffer_index(), 0);
    assert_eq!(resolved.element_size(), 12);
    assert_eq!(resolved.stride(), 12);
    assert_eq!(resolved.byte_range(), Ok(12..48));
    assert_eq!(resolved.bytes().unwrap().len(), 36);
}

#[test]
fn test_resolve_keeps_declared_stride() {
    let mut scene = strided_scene();
    scene.buffer_views[0].byte_stride = 16;

    let resolved = resolve(&scene, 0).unwrap();
    assert_eq!(resolved.stride(), 16);
    assert_eq!(resolved.offset(), Ok(12));
}

#[test]
fn test_resolve_accessor_out_of_range() {
    let scene = strided_scene();

    for index in [1, 2, usize::MAX] {
        let err = resolve(&scene, index).unwrap_err();
        assert_eq!(err, ResolveError::AccessorOutOfRange { index, count: 1 });
    }
}

#[test]
fn test_resolve_checks_view_before_buffer() {
    let mut scene = strided_scene();
    scene.buffer_views[0].buffer = 9;
    scene.accessors[0].buffer_view = 3;

    let err = resolve(&scene, 0).unwrap_err();
    assert_eq!(
        err,
        ResolveError::BufferViewOutOfRange {
            accessor: 0,
            index: 3,
            count: 1,
        }
    );

    scene.accessors[0].buffer_view = 0;
    let err = resolve(&scene, 0).unwrap_err();
    assert_eq!(
        err,
        ResolveError::BufferOutOfRange {
            view: 0,
            index: 9,
            count: 1,
        }
    );
}

#[test]
fn test_bytes_past_buffer_end() {
    let mut scene = strided_scene();
    scene.accessors[0].count = 5;

    let resolved = resolve(&scene, 0).unwrap();
    let err = resolved.bytes().unwrap_err();
    assert_eq!(
        err,
        ResolveError::ByteRangeOutOfBounds {
            accessor: 0,
            start: 12,
            end: 72,
            length: 64,
        }
    );
}

#[test]
fn test_huge_count_is_an_error() {
    let mut scene = strided_scene();
    scene.accessors[0].count = usize::MAX / 2;

    let resolved = resolve(&scene, 0).unwrap();
    let expected = ResolveError::ByteRangeOverflow { accessor: 0 };
    assert_eq!(resolved.byte_range(), Err(expected.clone()));
    assert_eq!(resolved.bytes().unwrap_err(), expected);
}

#[test]
fn test_huge_offset_is_an_error() {
    let mut scene = strided_scene();
    scene.accessors[0].byte_offset = usize::MAX;

    let resolved = resolve(&scene, 0).unwrap();
    assert_eq!(
        resolved.offset(),
        Err(ResolveError::ByteRangeOverflow { accessor: 0 })
    );
    assert!(resolved.bytes().is_err());
}
