use crate::assets::{MeshPrimitive, PrimitiveKey, Scene, Topology, resolve};
use crate::rendering::error::{
    CountMismatchErr, MissingPositionErr, MixedBuffersErr, PrimitiveError,
    StructuralReferenceErr, UnsupportedAttributeErr, UnsupportedTopologyErr,
};
use crate::rendering::{AttributeBinding, AttributeSemantic, GraphicsDevice, IndexWidth};
use log::{trace, warn};
use smallvec::SmallVec;
use snafu::{OptionExt, ResultExt, ensure};

pub type AttributeBindings = SmallVec<[AttributeBinding; 7]>;

/// Everything needed to issue one primitive's draw call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawHandle {
    /// Scene buffer whose vertex buffer feeds every attribute.
    pub vertex_buffer: usize,
    pub bindings: AttributeBindings,
    /// Index accessor, shared with every other primitive using the same accessor.
    pub index_buffer: Option<usize>,
    pub index_width: Option<IndexWidth>,
    pub topology: Topology,
    /// Index count when indexed, vertex count otherwise.
    pub count: usize,
    pub indexed: bool,
}

impl DrawHandle {
    pub fn binding(&self, semantic: AttributeSemantic) -> Option<&AttributeBinding> {
        self.bindings.iter().find(|b| b.semantic == semantic)
    }
}

/// The vertex side of a draw handle. Indices get attached once their buffer exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct VertexLayout {
    pub vertex_buffer: usize,
    pub bindings: AttributeBindings,
    pub vertex_count: usize,
}

/// Works out the attribute bindings of a primitive.
///
/// All known attributes have to live in one buffer and agree on their element count.
/// Attribute names outside [`AttributeSemantic`] are ignored.
pub(crate) fn build_vertex_layout<D: GraphicsDevice>(
    device: &D,
    scene: &Scene,
    key: PrimitiveKey,
    prim: &MeshPrimitive,
) -> Result<VertexLayout, PrimitiveError> {
    ensure!(
        device.supports_topology(prim.mode),
        UnsupportedTopologyErr {
            key,
            topology: prim.mode,
        }
    );

    prim.position().context(MissingPositionErr { key })?;

    let mut source: Option<(usize, usize)> = None;
    let mut bindings = AttributeBindings::new();

    for (name, &accessor_index) in &prim.attributes {
        let Some(semantic) = AttributeSemantic::from_name(name) else {
            trace!("{key}: ignoring attribute {name}");
            continue;
        };

        let resolved = resolve(scene, accessor_index).context(StructuralReferenceErr { key })?;
        let accessor = resolved.accessor;

        match source {
            None => source = Some((resolved.buffer_index(), accessor.count)),
            Some((buffer, count)) => {
                ensure!(
                    buffer == resolved.buffer_index(),
                    MixedBuffersErr {
                        key,
                        first: buffer,
                        other: resolved.buffer_index(),
                    }
                );
                ensure!(
                    count == accessor.count,
                    CountMismatchErr {
                        key,
                        attribute: name.clone(),
                        expected: count,
                        found: accessor.count,
                    }
                );
            }
        }

        let binding = AttributeBinding {
            semantic,
            component_type: accessor.component_type,
            cardinality: accessor.shape.cardinality(),
            normalize: accessor.normalized,
            byte_offset: resolved.offset().context(StructuralReferenceErr { key })?,
            byte_stride: resolved.stride(),
        };

        if !device.supports_attribute(&binding) {
            ensure!(
                semantic != AttributeSemantic::Position,
                UnsupportedAttributeErr {
                    key,
                    attribute: name.clone(),
                    component_type: binding.component_type,
                    cardinality: binding.cardinality,
                }
            );
            warn!(
                "{key}: attribute {name} ({}x {:?}) can't be bound by the device; leaving it out",
                binding.cardinality, binding.component_type
            );
            continue;
        }

        bindings.push(binding);
    }

    // POSITION is known and present, so at least one attribute has set the source
    let (vertex_buffer, vertex_count) = source.context(MissingPositionErr { key })?;
    bindings.sort_by_key(|b| b.semantic);

    Ok(VertexLayout {
        vertex_buffer,
        bindings,
        vertex_count,
    })
}
