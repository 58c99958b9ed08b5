//! The in-memory scene document.
//!
//! A [`Scene`] is a flat set of arrays. Every relationship between entities is an index
//! into one of these arrays, so the whole document is a single immutable snapshot that
//! can be handed around by reference. Nothing in here interprets bytes; that is the job
//! of the [`resolver`](crate::assets::resolver).

use crate::assets::Material;
use crate::utils::math::compose_trs;
use log::warn;
use nalgebra::{Matrix4, UnitQuaternion, Vector3};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

pub const ATTRIBUTE_POSITION: &str = "POSITION";
pub const ATTRIBUTE_NORMAL: &str = "NORMAL";
pub const ATTRIBUTE_COLOR_0: &str = "COLOR_0";
pub const ATTRIBUTE_TEXCOORD_0: &str = "TEXCOORD_0";
pub const ATTRIBUTE_TEXCOORD_1: &str = "TEXCOORD_1";
pub const ATTRIBUTE_JOINTS_0: &str = "JOINTS_0";
pub const ATTRIBUTE_WEIGHTS_0: &str = "WEIGHTS_0";

#[derive(Debug, Clone, Default)]
pub struct Buffer {
    pub name: Option<String>,
    /// Declared length. `data` may be shorter if the loader couldn't provide everything.
    pub byte_length: usize,
    pub data: Vec<u8>,
}

impl Buffer {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            name: None,
            byte_length: data.len(),
            data,
        }
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct BufferView {
    pub buffer: usize,
    pub byte_offset: usize,
    pub byte_length: usize,
    /// Distance between two elements in bytes. 0 means tightly packed.
    pub byte_stride: usize,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ComponentType {
    I8,
    U8,
    I16,
    U16,
    U32,
    F32,
}

impl ComponentType {
    pub const fn size(self) -> usize {
        match self {
            ComponentType::I8 | ComponentType::U8 => 1,
            ComponentType::I16 | ComponentType::U16 => 2,
            ComponentType::U32 | ComponentType::F32 => 4,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ElementShape {
    Scalar,
    Vec2,
    Vec3,
    Vec4,
}

impl ElementShape {
    pub const fn cardinality(self) -> usize {
        match self {
            ElementShape::Scalar => 1,
            ElementShape::Vec2 => 2,
            ElementShape::Vec3 => 3,
            ElementShape::Vec4 => 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Accessor {
    pub buffer_view: usize,
    pub byte_offset: usize,
    pub component_type: ComponentType,
    pub normalized: bool,
    pub count: usize,
    pub shape: ElementShape,
    /// Declared per-component minimum. May be empty.
    pub min: Vec<f32>,
    /// Declared per-component maximum. May be empty.
    pub max: Vec<f32>,
}

impl Accessor {
    pub fn new(
        buffer_view: usize,
        component_type: ComponentType,
        shape: ElementShape,
        count: usize,
    ) -> Self {
        Self {
            buffer_view,
            byte_offset: 0,
            component_type,
            normalized: false,
            count,
            shape,
            min: Vec::new(),
            max: Vec::new(),
        }
    }

    #[inline]
    pub fn element_size(&self) -> usize {
        self.component_type.size() * self.shape.cardinality()
    }

    /// The declared local bounding box of a three-component accessor.
    ///
    /// These are taken as written by the exporter, not recomputed from the data.
    pub fn declared_bounds(&self) -> Option<(Vector3<f32>, Vector3<f32>)> {
        if self.shape != ElementShape::Vec3 || self.min.len() < 3 || self.max.len() < 3 {
            return None;
        }

        let min = Vector3::new(self.min[0], self.min[1], self.min[2]);
        let max = Vector3::new(self.max[0], self.max[1], self.max[2]);
        Some((min, max))
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum Topology {
    Points,
    Lines,
    LineLoop,
    LineStrip,
    #[default]
    Triangles,
    TriangleStrip,
    TriangleFan,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshPrimitive {
    /// Attribute semantic name to accessor index.
    pub attributes: BTreeMap<String, usize>,
    pub indices: Option<usize>,
    pub material: Option<usize>,
    pub mode: Topology,
}

impl MeshPrimitive {
    #[inline]
    pub fn attribute(&self, name: &str) -> Option<usize> {
        self.attributes.get(name).copied()
    }

    #[inline]
    pub fn position(&self) -> Option<usize> {
        self.attribute(ATTRIBUTE_POSITION)
    }

    #[inline]
    pub fn has_vertex_colors(&self) -> bool {
        self.attributes.contains_key(ATTRIBUTE_COLOR_0)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub name: Option<String>,
    pub primitives: Vec<MeshPrimitive>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub name: Option<String>,
    pub translation: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,
    pub scale: Vector3<f32>,
    /// Raw matrix, post-multiplied onto the decomposed transform.
    pub matrix: Option<Matrix4<f32>>,
    pub children: Vec<usize>,
    pub mesh: Option<usize>,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            name: None,
            translation: Vector3::zeros(),
            rotation: UnitQuaternion::identity(),
            scale: Vector3::new(1.0, 1.0, 1.0),
            matrix: None,
            children: Vec::new(),
            mesh: None,
        }
    }
}

impl Node {
    /// `T * R * S`, then the raw matrix if there is one.
    pub fn local_transform(&self) -> Matrix4<f32> {
        let trs = compose_trs(&self.translation, &self.rotation, &self.scale);
        match &self.matrix {
            Some(matrix) => trs * matrix,
            None => trs,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneRoot {
    pub name: String,
    pub nodes: Vec<usize>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Texture {
    pub name: Option<String>,
    pub source: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Image {
    pub name: Option<String>,
    pub uri: Option<String>,
}

/// Stable identity of a primitive inside one [`Scene`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrimitiveKey {
    pub mesh: usize,
    pub primitive: usize,
}

impl PrimitiveKey {
    pub const fn new(mesh: usize, primitive: usize) -> Self {
        Self { mesh, primitive }
    }
}

impl Display for PrimitiveKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "mesh #{} primitive #{}", self.mesh, self.primitive)
    }
}

/// Which root sets a traversal starts from.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum SceneSelection {
    /// The document's active scene, or every root set if it declares none.
    #[default]
    Active,
    All,
    Index(usize),
}

#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub buffers: Vec<Buffer>,
    pub buffer_views: Vec<BufferView>,
    pub accessors: Vec<Accessor>,
    pub materials: Vec<Material>,
    pub textures: Vec<Texture>,
    pub images: Vec<Image>,
    pub meshes: Vec<Mesh>,
    pub nodes: Vec<Node>,
    pub scene_roots: Vec<SceneRoot>,
    pub active_scene: Option<usize>,
}

impl Scene {
    pub fn primitive(&self, key: PrimitiveKey) -> Option<&MeshPrimitive> {
        self.meshes.get(key.mesh)?.primitives.get(key.primitive)
    }

    /// Every primitive in mesh order, then primitive order.
    pub fn primitives(&self) -> impl Iterator<Item = (PrimitiveKey, &MeshPrimitive)> {
        self.meshes.iter().enumerate().flat_map(|(mesh_idx, mesh)| {
            mesh.primitives
                .iter()
                .enumerate()
                .map(move |(prim_idx, prim)| (PrimitiveKey::new(mesh_idx, prim_idx), prim))
        })
    }

    pub fn material(&self, index: Option<usize>) -> Option<&Material> {
        index.and_then(|i| self.materials.get(i))
    }

    /// All root sets a selection refers to, in document order.
    pub fn selected_roots(&self, selection: SceneSelection) -> &[SceneRoot] {
        match selection {
            SceneSelection::All => &self.scene_roots,
            SceneSelection::Active => match self.active_scene {
                Some(idx) => self.single_root(idx),
                None => &self.scene_roots,
            },
            SceneSelection::Index(idx) => self.single_root(idx),
        }
    }

    fn single_root(&self, idx: usize) -> &[SceneRoot] {
        match self.scene_roots.get(idx) {
            Some(root) => std::slice::from_ref(root),
            None => {
                if !self.scene_roots.is_empty() {
                    warn!(
                        "Scene root #{idx} doesn't exist ({} root sets)",
                        self.scene_roots.len()
                    );
                }
                &[]
            }
        }
    }

    /// Root node indices of the selection, in document order.
    pub fn selected_root_nodes(&self, selection: SceneSelection) -> Vec<usize> {
        self.selected_roots(selection)
            .iter()
            .flat_map(|root| root.nodes.iter().copied())
            .collect()
    }
}
