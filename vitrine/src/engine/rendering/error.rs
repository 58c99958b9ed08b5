use crate::assets::{ComponentType, PrimitiveKey, ResolveError, Topology};
use crate::rendering::{DeviceError, GpuResource};
use snafu::Snafu;

/// Fatal for a whole cache build. Nothing of the scene is drawable until `init` succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(context(suffix(Err)), visibility(pub(crate)))]
pub enum CacheError {
    #[snafu(display("Failed to allocate the {resource}: {source}"))]
    ResourceAllocation {
        resource: GpuResource,
        source: DeviceError,
    },
}

/// Why a single primitive got no draw resources. Always contained to that primitive.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(context(suffix(Err)), visibility(pub(crate)))]
pub enum PrimitiveError {
    #[snafu(display("{key}: {source}"))]
    StructuralReference {
        key: PrimitiveKey,
        source: ResolveError,
    },

    #[snafu(display("{key}: no POSITION attribute"))]
    MissingPosition { key: PrimitiveKey },

    #[snafu(display("{key}: attributes are spread over buffers #{first} and #{other}"))]
    MixedBuffers {
        key: PrimitiveKey,
        first: usize,
        other: usize,
    },

    #[snafu(display("{key}: attribute {attribute} has {found} elements, expected {expected}"))]
    CountMismatch {
        key: PrimitiveKey,
        attribute: String,
        expected: usize,
        found: usize,
    },

    #[snafu(display("{key}: topology {topology:?} is not supported"))]
    UnsupportedTopology { key: PrimitiveKey, topology: Topology },

    #[snafu(display("{key}: index component type {component_type:?} is not supported"))]
    UnsupportedIndexType {
        key: PrimitiveKey,
        component_type: ComponentType,
    },

    #[snafu(display("{key}: index data with a stride of {stride} bytes is not supported"))]
    UnsupportedIndexStride { key: PrimitiveKey, stride: usize },

    #[snafu(display(
        "{key}: attribute {attribute} ({cardinality}x {component_type:?}) can't be bound by the device"
    ))]
    UnsupportedAttribute {
        key: PrimitiveKey,
        attribute: String,
        component_type: ComponentType,
        cardinality: usize,
    },
}

impl PrimitiveError {
    /// `true` for dangling references, `false` for valid data the renderer can't handle.
    pub fn is_structural(&self) -> bool {
        matches!(self, PrimitiveError::StructuralReference { .. })
    }
}
