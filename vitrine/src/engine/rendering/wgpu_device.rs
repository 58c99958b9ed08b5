//! [`GraphicsDevice`] on top of wgpu.
//!
//! wgpu has no immediate mode, so draws are recorded as [`DrawPacket`]s carrying every piece
//! of state they were issued with. [`WgpuDevice::encode`] replays them into a render pass,
//! handing each packet to the host first so it can set the pipeline and bind groups that
//! match its shader, topology and vertex layout.

use crate::assets::{ComponentType, Topology};
use crate::rendering::{
    AttributeBinding, AttributeSemantic, BufferTooLargeErr, CullMode, DeviceError, FrontFace,
    GraphicsDevice, IndexWidth, ShaderHandle, UniformValue,
};
use log::{trace, warn};
use nalgebra::Matrix4;
use snafu::ensure;
use std::collections::BTreeMap;
use wgpu::util::{BufferInitDescriptor, DeviceExt};
use wgpu::{
    Buffer, BufferAddress, BufferUsages, Device, IndexFormat, PrimitiveTopology, RenderPass,
    VertexFormat,
};

/// wgpu requires vertex buffer offsets and strides to be 4 byte aligned.
const VERTEX_ALIGNMENT: usize = 4;

pub fn primitive_topology(topology: Topology) -> Option<PrimitiveTopology> {
    match topology {
        Topology::Points => Some(PrimitiveTopology::PointList),
        Topology::Lines => Some(PrimitiveTopology::LineList),
        Topology::LineStrip => Some(PrimitiveTopology::LineStrip),
        Topology::Triangles => Some(PrimitiveTopology::TriangleList),
        Topology::TriangleStrip => Some(PrimitiveTopology::TriangleStrip),
        Topology::LineLoop | Topology::TriangleFan => None,
    }
}

pub fn vertex_format(
    component_type: ComponentType,
    cardinality: usize,
    normalize: bool,
) -> Option<VertexFormat> {
    use ComponentType as C;
    use VertexFormat as F;

    let format = match (component_type, cardinality, normalize) {
        (C::F32, 1, _) => F::Float32,
        (C::F32, 2, _) => F::Float32x2,
        (C::F32, 3, _) => F::Float32x3,
        (C::F32, 4, _) => F::Float32x4,

        (C::U32, 1, false) => F::Uint32,
        (C::U32, 2, false) => F::Uint32x2,
        (C::U32, 3, false) => F::Uint32x3,
        (C::U32, 4, false) => F::Uint32x4,

        (C::U16, 2, false) => F::Uint16x2,
        (C::U16, 4, false) => F::Uint16x4,
        (C::U16, 2, true) => F::Unorm16x2,
        (C::U16, 4, true) => F::Unorm16x4,
        (C::I16, 2, false) => F::Sint16x2,
        (C::I16, 4, false) => F::Sint16x4,
        (C::I16, 2, true) => F::Snorm16x2,
        (C::I16, 4, true) => F::Snorm16x4,

        (C::U8, 2, false) => F::Uint8x2,
        (C::U8, 4, false) => F::Uint8x4,
        (C::U8, 2, true) => F::Unorm8x2,
        (C::U8, 4, true) => F::Unorm8x4,
        (C::I8, 2, false) => F::Sint8x2,
        (C::I8, 4, false) => F::Sint8x4,
        (C::I8, 2, true) => F::Snorm8x2,
        (C::I8, 4, true) => F::Snorm8x4,

        _ => return None,
    };

    Some(format)
}

pub fn index_format(width: IndexWidth) -> IndexFormat {
    match width {
        IndexWidth::U16 => IndexFormat::Uint16,
        IndexWidth::U32 => IndexFormat::Uint32,
    }
}

/// One attribute, fed from its own vertex buffer slot.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct VertexSlot {
    pub semantic: AttributeSemantic,
    pub format: VertexFormat,
    pub offset: BufferAddress,
    pub array_stride: BufferAddress,
}

impl VertexSlot {
    pub fn attribute(&self) -> wgpu::VertexAttribute {
        wgpu::VertexAttribute {
            format: self.format,
            offset: 0,
            shader_location: self.semantic.location(),
        }
    }
}

/// A recorded draw call and the state it was issued with.
#[derive(Debug, Clone)]
pub struct DrawPacket {
    pub shader: Option<ShaderHandle>,
    pub uniforms: BTreeMap<String, UniformValue>,
    pub model_view: Matrix4<f32>,
    pub cull_mode: Option<wgpu::Face>,
    pub front_face: wgpu::FrontFace,
    pub alpha_to_coverage: bool,
    pub topology: PrimitiveTopology,
    pub vertex_buffer: Buffer,
    pub vertex_slots: Vec<VertexSlot>,
    pub index_buffer: Option<(Buffer, IndexFormat)>,
    pub count: u32,
}

impl DrawPacket {
    pub fn uniform(&self, name: &str) -> Option<&UniformValue> {
        self.uniforms.get(name)
    }
}

/// Primitive state and vertex layout for the currently bound draw.
#[derive(Debug, Default)]
struct PendingState {
    shader: Option<ShaderHandle>,
    uniforms: BTreeMap<String, UniformValue>,
    model_view: Matrix4<f32>,
    cull_mode: Option<wgpu::Face>,
    front_face: wgpu::FrontFace,
    alpha_to_coverage: bool,
    vertex: Option<(Buffer, Vec<VertexSlot>)>,
    index: Option<(Buffer, IndexFormat)>,
}

pub struct WgpuDevice {
    device: Device,
    state: PendingState,
    packets: Vec<DrawPacket>,
}

impl WgpuDevice {
    pub fn new(device: Device) -> Self {
        Self {
            device,
            state: PendingState::default(),
            packets: Vec::new(),
        }
    }

    #[inline]
    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn packets(&self) -> &[DrawPacket] {
        &self.packets
    }

    pub fn take_packets(&mut self) -> Vec<DrawPacket> {
        std::mem::take(&mut self.packets)
    }

    /// Replays and drains every recorded packet into `pass`.
    ///
    /// `bind` runs before each draw and has to set a pipeline and bind groups compatible
    /// with the packet.
    pub fn encode<F>(&mut self, pass: &mut RenderPass<'_>, mut bind: F)
    where
        F: FnMut(&mut RenderPass<'_>, &DrawPacket),
    {
        for packet in self.packets.drain(..) {
            bind(pass, &packet);

            for (slot, vertex) in packet.vertex_slots.iter().enumerate() {
                pass.set_vertex_buffer(slot as u32, packet.vertex_buffer.slice(vertex.offset..));
            }

            match &packet.index_buffer {
                Some((buffer, format)) => {
                    pass.set_index_buffer(buffer.slice(..), *format);
                    pass.draw_indexed(0..packet.count, 0, 0..1);
                }
                None => pass.draw(0..packet.count, 0..1),
            }
        }
    }

    fn create_buffer(
        &self,
        label: &str,
        contents: &[u8],
        usage: BufferUsages,
    ) -> Result<Buffer, DeviceError> {
        let limit = self.device.limits().max_buffer_size;
        let size = contents.len() as u64;
        ensure!(size <= limit, BufferTooLargeErr { size, limit });

        Ok(self.device.create_buffer_init(&BufferInitDescriptor {
            label: Some(label),
            contents,
            usage,
        }))
    }
}

impl GraphicsDevice for WgpuDevice {
    type VertexBuffer = Buffer;
    type IndexBuffer = Buffer;

    fn allocate_vertex_buffer(&mut self, bytes: &[u8]) -> Result<Buffer, DeviceError> {
        self.create_buffer("Scene Vertex Buffer", bytes, BufferUsages::VERTEX)
    }

    fn allocate_index_buffer(&mut self, data: &[u8], _width: IndexWidth) -> Result<Buffer, DeviceError> {
        self.create_buffer("Scene Index Buffer", data, BufferUsages::INDEX)
    }

    fn release_vertex_buffer(&mut self, buffer: Buffer) {
        buffer.destroy();
    }

    fn release_index_buffer(&mut self, buffer: Buffer) {
        buffer.destroy();
    }

    fn supports_topology(&self, topology: Topology) -> bool {
        primitive_topology(topology).is_some()
    }

    fn supports_attribute(&self, binding: &AttributeBinding) -> bool {
        vertex_format(binding.component_type, binding.cardinality, binding.normalize).is_some()
            && binding.byte_offset % VERTEX_ALIGNMENT == 0
            && binding.byte_stride % VERTEX_ALIGNMENT == 0
    }

    fn bind_shader(&mut self, shader: ShaderHandle) {
        self.state.shader = Some(shader);
        self.state.uniforms.clear();
    }

    fn set_uniform(&mut self, name: &str, value: UniformValue) {
        self.state.uniforms.insert(name.to_string(), value);
    }

    fn clear_shader(&mut self) {
        self.state.shader = None;
        self.state.uniforms.clear();
        self.state.vertex = None;
        self.state.index = None;
    }

    fn set_model_view(&mut self, transform: &Matrix4<f32>) {
        self.state.model_view = *transform;
    }

    fn set_culling(&mut self, mode: CullMode, front_face: FrontFace) {
        self.state.cull_mode = match mode {
            CullMode::None => None,
            CullMode::Back => Some(wgpu::Face::Back),
        };
        self.state.front_face = match front_face {
            FrontFace::Ccw => wgpu::FrontFace::Ccw,
            FrontFace::Cw => wgpu::FrontFace::Cw,
        };
    }

    fn set_alpha_to_coverage(&mut self, enabled: bool) {
        self.state.alpha_to_coverage = enabled;
    }

    fn alpha_to_coverage(&self) -> bool {
        self.state.alpha_to_coverage
    }

    fn bind_vertex_buffer(&mut self, buffer: &Buffer, bindings: &[AttributeBinding]) {
        let slots = bindings
            .iter()
            .filter_map(|binding| {
                let format =
                    vertex_format(binding.component_type, binding.cardinality, binding.normalize)?;
                Some(VertexSlot {
                    semantic: binding.semantic,
                    format,
                    offset: binding.byte_offset as BufferAddress,
                    array_stride: binding.byte_stride as BufferAddress,
                })
            })
            .collect();

        self.state.vertex = Some((buffer.clone(), slots));
        self.state.index = None;
    }

    fn bind_index_buffer(&mut self, buffer: &Buffer, width: IndexWidth) {
        self.state.index = Some((buffer.clone(), index_format(width)));
    }

    fn draw(&mut self, topology: Topology, indexed: bool, count: usize) {
        let Some(topology) = primitive_topology(topology) else {
            warn!("Dropping a {topology:?} draw; wgpu can't rasterize it");
            return;
        };
        let Some((vertex_buffer, vertex_slots)) = self.state.vertex.clone() else {
            warn!("Dropping a draw without a vertex buffer");
            return;
        };
        let index_buffer = if indexed {
            let Some(index) = self.state.index.clone() else {
                warn!("Dropping an indexed draw without an index buffer");
                return;
            };
            Some(index)
        } else {
            None
        };

        let Ok(count) = u32::try_from(count) else {
            warn!("Dropping a draw of {count} elements; too many for one call");
            return;
        };
        if count == 0 {
            trace!("Skipping an empty draw");
            return;
        }

        self.packets.push(DrawPacket {
            shader: self.state.shader,
            uniforms: self.state.uniforms.clone(),
            model_view: self.state.model_view,
            cull_mode: self.state.cull_mode,
            front_face: self.state.front_face,
            alpha_to_coverage: self.state.alpha_to_coverage,
            topology,
            vertex_buffer,
            vertex_slots,
            index_buffer,
            count,
        });
    }
}
