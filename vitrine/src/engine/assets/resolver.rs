//! Accessor -> BufferView -> Buffer resolution.
//!
//! The scene document stores plain indices; this is the one place that follows them and
//! checks every hop. Callers that only want the typed metadata use [`resolve`], callers that
//! need to read the bytes use [`ResolvedAccessor::bytes`], which also checks the range
//! against the buffer's data.

use crate::assets::{Accessor, Buffer, BufferView, Scene};
use snafu::{OptionExt, Snafu, ensure};
use std::ops::Range;

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(context(suffix(Err)))]
pub enum ResolveError {
    #[snafu(display("Accessor #{index} doesn't exist ({count} accessors)"))]
    AccessorOutOfRange { index: usize, count: usize },

    #[snafu(display("Accessor #{accessor} refers to buffer view #{index} ({count} views)"))]
    BufferViewOutOfRange {
        accessor: usize,
        index: usize,
        count: usize,
    },

    #[snafu(display("Buffer view #{view} refers to buffer #{index} ({count} buffers)"))]
    BufferOutOfRange {
        view: usize,
        index: usize,
        count: usize,
    },

    #[snafu(display(
        "Accessor #{accessor} reads bytes {start}..{end}, but its buffer only holds {length}"
    ))]
    ByteRangeOutOfBounds {
        accessor: usize,
        start: usize,
        end: usize,
        length: usize,
    },

    #[snafu(display("Accessor #{accessor} describes a byte range past the end of the address space"))]
    ByteRangeOverflow { accessor: usize },
}

/// A fully resolved accessor chain, borrowed from the scene.
#[derive(Debug, Copy, Clone)]
pub struct ResolvedAccessor<'a> {
    pub index: usize,
    pub accessor: &'a Accessor,
    pub view: &'a BufferView,
    pub buffer: &'a Buffer,
}

/// Follows `accessor_index` through its buffer view into its buffer.
///
/// The accessor, the view and the buffer are checked in that order and the first
/// out-of-range index is reported.
pub fn resolve(scene: &Scene, accessor_index: usize) -> Result<ResolvedAccessor<'_>, ResolveError> {
    let accessor = scene
        .accessors
        .get(accessor_index)
        .ok_or(ResolveError::AccessorOutOfRange {
            index: accessor_index,
            count: scene.accessors.len(),
        })?;

    let view = scene.buffer_views.get(accessor.buffer_view).ok_or(
        ResolveError::BufferViewOutOfRange {
            accessor: accessor_index,
            index: accessor.buffer_view,
            count: scene.buffer_views.len(),
        },
    )?;

    let buffer = scene
        .buffers
        .get(view.buffer)
        .ok_or(ResolveError::BufferOutOfRange {
            view: accessor.buffer_view,
            index: view.buffer,
            count: scene.buffers.len(),
        })?;

    Ok(ResolvedAccessor {
        index: accessor_index,
        accessor,
        view,
        buffer,
    })
}

impl<'a> ResolvedAccessor<'a> {
    #[inline]
    pub fn buffer_index(&self) -> usize {
        self.view.buffer
    }

    #[inline]
    pub fn element_size(&self) -> usize {
        self.accessor.element_size()
    }

    /// Byte distance between consecutive elements.
    #[inline]
    pub fn stride(&self) -> usize {
        match self.view.byte_stride {
            0 => self.element_size(),
            stride => stride,
        }
    }

    /// Offset of the first element from the start of the buffer.
    #[inline]
    pub fn offset(&self) -> Result<usize, ResolveError> {
        self.view
            .byte_offset
            .checked_add(self.accessor.byte_offset)
            .context(ByteRangeOverflowErr {
                accessor: self.index,
            })
    }

    /// `[offset, offset + count * element_size)`.
    pub fn byte_range(&self) -> Result<Range<usize>, ResolveError> {
        let start = self.offset()?;
        let end = self
            .accessor
            .count
            .checked_mul(self.element_size())
            .and_then(|len| start.checked_add(len))
            .context(ByteRangeOverflowErr {
                accessor: self.index,
            })?;
        Ok(start..end)
    }

    /// The tightly packed bytes of this accessor.
    ///
    /// Only meaningful for packed views, which is all index data is allowed to be.
    pub fn bytes(&self) -> Result<&'a [u8], ResolveError> {
        let range = self.byte_range()?;
        ensure!(
            range.end <= self.buffer.data.len(),
            ByteRangeOutOfBoundsErr {
                accessor: self.index,
                start: range.start,
                end: range.end,
                length: self.buffer.data.len(),
            }
        );

        Ok(&self.buffer.data[range])
    }
}
