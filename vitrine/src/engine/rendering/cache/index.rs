use crate::assets::{ComponentType, ElementShape, PrimitiveKey, Scene, resolve};
use crate::rendering::IndexWidth;
use crate::rendering::error::{
    PrimitiveError, StructuralReferenceErr, UnsupportedIndexStrideErr, UnsupportedIndexTypeErr,
};
use snafu::{ResultExt, ensure};
use static_assertions::const_assert_eq;
use std::borrow::Cow;

// borrowed index bytes are uploaded as-is, so the widths must match the Rust types
const_assert_eq!(IndexWidth::U16.byte_size(), size_of::<u16>());
const_assert_eq!(IndexWidth::U32.byte_size(), size_of::<u32>());

/// Index bytes ready for upload, tightly packed at `width`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexData<'a> {
    pub accessor: usize,
    pub bytes: Cow<'a, [u8]>,
    pub width: IndexWidth,
    pub count: usize,
}

/// Widens 8-bit indices to 16 bits. Devices can't take 8-bit index buffers.
pub fn promote_u8_indices(indices: &[u8]) -> Vec<u16> {
    indices.iter().map(|&i| u16::from(i)).collect()
}

/// Reads the index accessor of `key` out of the scene and brings it into an uploadable width.
///
/// 16 and 32 bit indices are borrowed straight out of the buffer. 8 bit indices are
/// promoted to 16 bit.
pub fn prepare_index_data(
    scene: &Scene,
    key: PrimitiveKey,
    accessor_index: usize,
) -> Result<IndexData<'_>, PrimitiveError> {
    let resolved = resolve(scene, accessor_index).context(StructuralReferenceErr { key })?;
    let accessor = resolved.accessor;

    ensure!(
        accessor.shape == ElementShape::Scalar,
        UnsupportedIndexTypeErr {
            key,
            component_type: accessor.component_type,
        }
    );

    let stride = resolved.view.byte_stride;
    ensure!(
        stride == 0 || stride == accessor.component_type.size(),
        UnsupportedIndexStrideErr { key, stride }
    );

    let bytes = resolved.bytes().context(StructuralReferenceErr { key })?;

    let (bytes, width) = match accessor.component_type {
        ComponentType::U8 => {
            let promoted = promote_u8_indices(bytes);
            let promoted: Vec<u8> = bytemuck::cast_slice(&promoted).to_vec();
            (Cow::Owned(promoted), IndexWidth::U16)
        }
        ComponentType::U16 => (Cow::Borrowed(bytes), IndexWidth::U16),
        ComponentType::U32 => (Cow::Borrowed(bytes), IndexWidth::U32),
        component_type => {
            return UnsupportedIndexTypeErr {
                key,
                component_type,
            }
            .fail();
        }
    };

    Ok(IndexData {
        accessor: accessor_index,
        bytes,
        width,
        count: accessor.count,
    })
}
