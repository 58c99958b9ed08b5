#![allow(dead_code)]

use nalgebra::{Matrix4, Vector3};
use std::collections::{BTreeMap, BTreeSet};
use vitrine::assets::{
    Accessor, Buffer, BufferView, ComponentType, ElementShape, Material, Mesh, MeshPrimitive,
    Node, Scene, SceneRoot, Topology,
};
use vitrine::rendering::{
    AttributeBinding, CullMode, DeviceError, FrontFace, GraphicsDevice, IndexWidth,
    ShaderHandle, UniformValue,
};

pub const MR_SHADER: ShaderHandle = ShaderHandle(1);
pub const SG_SHADER: ShaderHandle = ShaderHandle(2);
pub const FALLBACK_SHADER: ShaderHandle = ShaderHandle(3);

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeBuffer {
    pub id: u32,
    pub data: Vec<u8>,
}

/// One draw call and the device state it was issued with.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedDraw {
    pub shader: Option<ShaderHandle>,
    pub uniforms: BTreeMap<String, UniformValue>,
    pub model_view: Matrix4<f32>,
    pub culling: Option<(CullMode, FrontFace)>,
    pub alpha_to_coverage: bool,
    pub vertex_buffer: Option<u32>,
    pub bindings: Vec<AttributeBinding>,
    pub index_buffer: Option<(u32, IndexWidth)>,
    pub topology: Topology,
    pub indexed: bool,
    pub count: usize,
}

impl RecordedDraw {
    pub fn translation(&self) -> Vector3<f32> {
        Vector3::new(
            self.model_view[(0, 3)],
            self.model_view[(1, 3)],
            self.model_view[(2, 3)],
        )
    }

    pub fn uniform(&self, name: &str) -> Option<&UniformValue> {
        self.uniforms.get(name)
    }
}

/// A device that keeps everything in memory and records what it was asked to do.
#[derive(Debug, Default)]
pub struct RecordingDevice {
    next_id: u32,
    allocations: usize,
    /// Allocation number (starting at 0) that fails.
    pub fail_at: Option<usize>,
    pub unsupported_topologies: Vec<Topology>,

    pub live_vertex_buffers: BTreeSet<u32>,
    pub live_index_buffers: BTreeSet<u32>,
    pub uploaded_indices: Vec<(u32, IndexWidth, Vec<u8>)>,

    shader: Option<ShaderHandle>,
    uniforms: BTreeMap<String, UniformValue>,
    model_view: Matrix4<f32>,
    culling: Option<(CullMode, FrontFace)>,
    pub alpha_to_coverage: bool,
    vertex_buffer: Option<(u32, Vec<AttributeBinding>)>,
    index_buffer: Option<(u32, IndexWidth)>,

    pub draws: Vec<RecordedDraw>,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_at(allocation: usize) -> Self {
        Self {
            fail_at: Some(allocation),
            ..Self::default()
        }
    }

    pub fn live_buffers(&self) -> usize {
        self.live_vertex_buffers.len() + self.live_index_buffers.len()
    }

    fn allocate(&mut self, data: &[u8]) -> Result<FakeBuffer, DeviceError> {
        let n = self.allocations;
        self.allocations += 1;
        if self.fail_at == Some(n) {
            return Err(DeviceError::Refused {
                reason: format!("allocation #{n} was set up to fail"),
            });
        }

        self.next_id += 1;
        Ok(FakeBuffer {
            id: self.next_id,
            data: data.to_vec(),
        })
    }
}

impl GraphicsDevice for RecordingDevice {
    type VertexBuffer = FakeBuffer;
    type IndexBuffer = FakeBuffer;

    fn allocate_vertex_buffer(&mut self, bytes: &[u8]) -> Result<FakeBuffer, DeviceError> {
        let buffer = self.allocate(bytes)?;
        self.live_vertex_buffers.insert(buffer.id);
        Ok(buffer)
    }

    fn allocate_index_buffer(
        &mut self,
        data: &[u8],
        width: IndexWidth,
    ) -> Result<FakeBuffer, DeviceError> {
        let buffer = self.allocate(data)?;
        self.live_index_buffers.insert(buffer.id);
        self.uploaded_indices.push((buffer.id, width, data.to_vec()));
        Ok(buffer)
    }

    fn release_vertex_buffer(&mut self, buffer: FakeBuffer) {
        assert!(
            self.live_vertex_buffers.remove(&buffer.id),
            "vertex buffer {} released twice",
            buffer.id
        );
    }

    fn release_index_buffer(&mut self, buffer: FakeBuffer) {
        assert!(
            self.live_index_buffers.remove(&buffer.id),
            "index buffer {} released twice",
            buffer.id
        );
    }

    fn supports_topology(&self, topology: Topology) -> bool {
        topology != Topology::LineLoop && !self.unsupported_topologies.contains(&topology)
    }

    fn bind_shader(&mut self, shader: ShaderHandle) {
        self.shader = Some(shader);
        self.uniforms.clear();
    }

    fn set_uniform(&mut self, name: &str, value: UniformValue) {
        self.uniforms.insert(name.to_string(), value);
    }

    fn clear_shader(&mut self) {
        self.shader = None;
        self.uniforms.clear();
    }

    fn set_model_view(&mut self, transform: &Matrix4<f32>) {
        self.model_view = *transform;
    }

    fn set_culling(&mut self, mode: CullMode, front_face: FrontFace) {
        self.culling = Some((mode, front_face));
    }

    fn set_alpha_to_coverage(&mut self, enabled: bool) {
        self.alpha_to_coverage = enabled;
    }

    fn alpha_to_coverage(&self) -> bool {
        self.alpha_to_coverage
    }

    fn bind_vertex_buffer(&mut self, buffer: &FakeBuffer, bindings: &[AttributeBinding]) {
        self.vertex_buffer = Some((buffer.id, bindings.to_vec()));
        self.index_buffer = None;
    }

    fn bind_index_buffer(&mut self, buffer: &FakeBuffer, width: IndexWidth) {
        self.index_buffer = Some((buffer.id, width));
    }

    fn draw(&mut self, topology: Topology, indexed: bool, count: usize) {
        let (vertex_buffer, bindings) = match &self.vertex_buffer {
            Some((id, bindings)) => (Some(*id), bindings.clone()),
            None => (None, Vec::new()),
        };

        self.draws.push(RecordedDraw {
            shader: self.shader,
            uniforms: self.uniforms.clone(),
            model_view: self.model_view,
            culling: self.culling,
            alpha_to_coverage: self.alpha_to_coverage,
            vertex_buffer,
            bindings,
            index_buffer: self.index_buffer,
            topology,
            indexed,
            count,
        });
    }
}

pub const UNIT_TRIANGLE: [[f32; 3]; 3] = [[-1.0, -1.0, 0.0], [1.0, -1.0, 0.0], [0.0, 1.0, 0.0]];

/// Small helpers for assembling scene documents by hand.
pub trait SceneExt {
    fn push_buffer(&mut self, data: Vec<u8>) -> usize;
    fn push_view(&mut self, buffer: usize, byte_offset: usize, byte_length: usize, byte_stride: usize) -> usize;
    fn push_accessor(&mut self, accessor: Accessor) -> usize;
    /// Fresh buffer holding `points`, with declared min/max.
    fn add_positions(&mut self, points: &[[f32; 3]]) -> usize;
    fn add_u8_indices(&mut self, indices: &[u8]) -> usize;
    fn add_u16_indices(&mut self, indices: &[u16]) -> usize;
    fn add_material(&mut self, material: Material) -> usize;
    fn add_mesh(&mut self, primitives: Vec<MeshPrimitive>) -> usize;
    fn add_node(&mut self, node: Node) -> usize;
    fn add_root(&mut self, nodes: Vec<usize>) -> usize;
}

impl SceneExt for Scene {
    fn push_buffer(&mut self, data: Vec<u8>) -> usize {
        self.buffers.push(Buffer::new(data));
        self.buffers.len() - 1
    }

    fn push_view(&mut self, buffer: usize, byte_offset: usize, byte_length: usize, byte_stride: usize) -> usize {
        self.buffer_views.push(BufferView {
            buffer,
            byte_offset,
            byte_length,
            byte_stride,
        });
        self.buffer_views.len() - 1
    }

    fn push_accessor(&mut self, accessor: Accessor) -> usize {
        self.accessors.push(accessor);
        self.accessors.len() - 1
    }

    fn add_positions(&mut self, points: &[[f32; 3]]) -> usize {
        let bytes: Vec<u8> = bytemuck::cast_slice(points).to_vec();
        let len = bytes.len();
        let buffer = self.push_buffer(bytes);
        let view = self.push_view(buffer, 0, len, 0);

        let mut min = [f32::INFINITY; 3];
        let mut max = [f32::NEG_INFINITY; 3];
        for p in points {
            for i in 0..3 {
                min[i] = min[i].min(p[i]);
                max[i] = max[i].max(p[i]);
            }
        }

        let mut accessor = Accessor::new(view, ComponentType::F32, ElementShape::Vec3, points.len());
        if !points.is_empty() {
            accessor.min = min.to_vec();
            accessor.max = max.to_vec();
        }
        self.push_accessor(accessor)
    }

    fn add_u8_indices(&mut self, indices: &[u8]) -> usize {
        let buffer = self.push_buffer(indices.to_vec());
        let view = self.push_view(buffer, 0, indices.len(), 0);
        self.push_accessor(Accessor::new(view, ComponentType::U8, ElementShape::Scalar, indices.len()))
    }

    fn add_u16_indices(&mut self, indices: &[u16]) -> usize {
        let bytes: Vec<u8> = bytemuck::cast_slice(indices).to_vec();
        let len = bytes.len();
        let buffer = self.push_buffer(bytes);
        let view = self.push_view(buffer, 0, len, 0);
        self.push_accessor(Accessor::new(view, ComponentType::U16, ElementShape::Scalar, indices.len()))
    }

    fn add_material(&mut self, material: Material) -> usize {
        self.materials.push(material);
        self.materials.len() - 1
    }

    fn add_mesh(&mut self, primitives: Vec<MeshPrimitive>) -> usize {
        self.meshes.push(Mesh {
            name: None,
            primitives,
        });
        self.meshes.len() - 1
    }

    fn add_node(&mut self, node: Node) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    fn add_root(&mut self, nodes: Vec<usize>) -> usize {
        self.scene_roots.push(SceneRoot {
            name: format!("Root {}", self.scene_roots.len()),
            nodes,
        });
        self.scene_roots.len() - 1
    }
}

pub fn primitive(position: usize, indices: Option<usize>, material: Option<usize>) -> MeshPrimitive {
    let mut prim = MeshPrimitive {
        indices,
        material,
        ..MeshPrimitive::default()
    };
    prim.attributes.insert("POSITION".to_string(), position);
    prim
}

pub fn mesh_node(mesh: usize, translation: Vector3<f32>) -> Node {
    Node {
        translation,
        mesh: Some(mesh),
        ..Node::default()
    }
}

/// A scene with one node per material, each holding a single triangle, all in one root set.
pub fn scene_with_materials(materials: Vec<Material>) -> Scene {
    let mut scene = Scene::default();
    let mut nodes = Vec::new();

    for material in materials {
        let position = scene.add_positions(&UNIT_TRIANGLE);
        let material = scene.add_material(material);
        let mesh = scene.add_mesh(vec![primitive(position, None, Some(material))]);
        nodes.push(scene.add_node(mesh_node(mesh, Vector3::zeros())));
    }

    scene.add_root(nodes);
    scene
}
