//! The graphics device seam.
//!
//! The cache and the renderer only ever talk to a [`GraphicsDevice`]. The crate ships a
//! [`WgpuDevice`](crate::rendering::WgpuDevice); hosts with their own backend implement the
//! trait themselves.

use crate::assets::{
    ATTRIBUTE_COLOR_0, ATTRIBUTE_JOINTS_0, ATTRIBUTE_NORMAL, ATTRIBUTE_POSITION,
    ATTRIBUTE_TEXCOORD_0, ATTRIBUTE_TEXCOORD_1, ATTRIBUTE_WEIGHTS_0, ComponentType, Topology,
};
use nalgebra::{Matrix4, Vector3, Vector4};
use snafu::Snafu;
use std::fmt::{Display, Formatter};

/// Front faces wind counter-clockwise. Every culled draw uses this.
pub const FRONT_FACE: FrontFace = FrontFace::Ccw;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ShaderHandle(pub u32);

/// A host texture, as handed out by a [`TextureResolver`](crate::rendering::TextureResolver).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TextureId(pub u64);

/// Vertex inputs the shaders understand. Anything else in a primitive is ignored.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttributeSemantic {
    Position = 0,
    Normal = 1,
    Color = 2,
    TexCoord0 = 3,
    TexCoord1 = 4,
    Joints = 5,
    Weights = 6,
}

impl AttributeSemantic {
    pub const ALL: [AttributeSemantic; 7] = [
        AttributeSemantic::Position,
        AttributeSemantic::Normal,
        AttributeSemantic::Color,
        AttributeSemantic::TexCoord0,
        AttributeSemantic::TexCoord1,
        AttributeSemantic::Joints,
        AttributeSemantic::Weights,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }

    pub const fn name(self) -> &'static str {
        match self {
            AttributeSemantic::Position => ATTRIBUTE_POSITION,
            AttributeSemantic::Normal => ATTRIBUTE_NORMAL,
            AttributeSemantic::Color => ATTRIBUTE_COLOR_0,
            AttributeSemantic::TexCoord0 => ATTRIBUTE_TEXCOORD_0,
            AttributeSemantic::TexCoord1 => ATTRIBUTE_TEXCOORD_1,
            AttributeSemantic::Joints => ATTRIBUTE_JOINTS_0,
            AttributeSemantic::Weights => ATTRIBUTE_WEIGHTS_0,
        }
    }

    /// Shader input location.
    #[inline]
    pub const fn location(self) -> u32 {
        self as u32
    }
}

/// How one vertex input is read out of the primitive's vertex buffer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct AttributeBinding {
    pub semantic: AttributeSemantic,
    pub component_type: ComponentType,
    pub cardinality: usize,
    pub normalize: bool,
    /// From the start of the vertex buffer to the first element.
    pub byte_offset: usize,
    pub byte_stride: usize,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum IndexWidth {
    U16,
    U32,
}

impl IndexWidth {
    pub const fn byte_size(self) -> usize {
        match self {
            IndexWidth::U16 => 2,
            IndexWidth::U32 => 4,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum CullMode {
    None,
    Back,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FrontFace {
    Ccw,
    Cw,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec3(Vector3<f32>),
    Vec4(Vector4<f32>),
    Mat4(Matrix4<f32>),
    /// A texture slot. `None` binds the shader's empty texture.
    Texture {
        unit: u32,
        texture: Option<TextureId>,
    },
}

impl From<f32> for UniformValue {
    fn from(value: f32) -> Self {
        UniformValue::Float(value)
    }
}

impl From<bool> for UniformValue {
    fn from(value: bool) -> Self {
        UniformValue::Float(if value { 1.0 } else { 0.0 })
    }
}

impl From<Vector3<f32>> for UniformValue {
    fn from(value: Vector3<f32>) -> Self {
        UniformValue::Vec3(value)
    }
}

impl From<Vector4<f32>> for UniformValue {
    fn from(value: Vector4<f32>) -> Self {
        UniformValue::Vec4(value)
    }
}

impl From<Matrix4<f32>> for UniformValue {
    fn from(value: Matrix4<f32>) -> Self {
        UniformValue::Mat4(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(context(suffix(Err)), visibility(pub))]
pub enum DeviceError {
    #[snafu(display("Buffer of {size} bytes exceeds the device limit of {limit} bytes"))]
    BufferTooLarge { size: u64, limit: u64 },

    #[snafu(display("The device refused the allocation: {reason}"))]
    Refused { reason: String },
}

/// Which GPU resource an allocation was for.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum GpuResource {
    /// Vertex buffer mirroring the scene buffer with this index.
    VertexBuffer(usize),
    /// Index buffer built from the accessor with this index.
    IndexBuffer(usize),
}

impl Display for GpuResource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            GpuResource::VertexBuffer(buffer) => write!(f, "vertex buffer for buffer #{buffer}"),
            GpuResource::IndexBuffer(accessor) => {
                write!(f, "index buffer for accessor #{accessor}")
            }
        }
    }
}

pub trait GraphicsDevice {
    type VertexBuffer;
    type IndexBuffer;

    fn allocate_vertex_buffer(&mut self, bytes: &[u8]) -> Result<Self::VertexBuffer, DeviceError>;

    /// `data` holds tightly packed indices of the given width.
    fn allocate_index_buffer(
        &mut self,
        data: &[u8],
        width: IndexWidth,
    ) -> Result<Self::IndexBuffer, DeviceError>;

    fn release_vertex_buffer(&mut self, buffer: Self::VertexBuffer) {
        drop(buffer);
    }

    fn release_index_buffer(&mut self, buffer: Self::IndexBuffer) {
        drop(buffer);
    }

    fn supports_topology(&self, topology: Topology) -> bool {
        topology != Topology::LineLoop
    }

    fn supports_attribute(&self, _binding: &AttributeBinding) -> bool {
        true
    }

    fn bind_shader(&mut self, shader: ShaderHandle);

    /// Sets a named uniform of the bound shader. Names the shader doesn't declare are ignored.
    fn set_uniform(&mut self, name: &str, value: UniformValue);

    fn clear_shader(&mut self) {}

    fn set_model_view(&mut self, transform: &Matrix4<f32>);

    fn set_culling(&mut self, mode: CullMode, front_face: FrontFace);

    fn set_alpha_to_coverage(&mut self, _enabled: bool) {}

    /// Current alpha-to-coverage state, restored after every scene draw.
    fn alpha_to_coverage(&self) -> bool {
        false
    }

    fn bind_vertex_buffer(&mut self, buffer: &Self::VertexBuffer, bindings: &[AttributeBinding]);

    fn bind_index_buffer(&mut self, buffer: &Self::IndexBuffer, width: IndexWidth);

    /// `count` is the number of indices when `indexed`, of vertices otherwise.
    fn draw(&mut self, topology: Topology, indexed: bool, count: usize);
}
