use crate::assets::{
    Accessor, AlphaMode, Buffer, BufferView, ComponentType, ElementShape, Image, Material, Mesh,
    MeshPrimitive, MetallicRoughness, Node, Pbr, Scene, SceneRoot, SpecularGlossiness, Texture,
    TextureRef, Topology,
};
use gltf::accessor::{DataType, Dimensions};
use gltf::buffer::Data as BufferData;
use gltf::json::Value;
use gltf::mesh::{Mode, Semantic};
use gltf::{Document, Gltf};
use log::{trace, warn};
use nalgebra::{Matrix4, Quaternion, UnitQuaternion, Vector3, Vector4};
use snafu::{ResultExt, Snafu};
use std::path::Path;

#[derive(Debug, Snafu)]
#[snafu(context(suffix(Err)))]
pub enum LoadError {
    #[snafu(display("Failed to parse glTF document {path}: {source}"))]
    Parse { path: String, source: gltf::Error },

    #[snafu(display("Failed to load the buffers of {path}: {source}"))]
    Buffers { path: String, source: gltf::Error },
}

const MEMORY_SOURCE: &str = "<memory>";

/// Turns `gltf` crate documents into a [`Scene`].
///
/// Image pixels are never decoded here; textures only carry their image's name and uri,
/// the host resolves them through a [`TextureResolver`](crate::rendering::TextureResolver).
pub struct SceneLoader;

impl SceneLoader {
    pub fn load(path: impl AsRef<Path>) -> Result<Scene, LoadError> {
        let path = path.as_ref();
        let display = path.display().to_string();

        let gltf = Gltf::open(path).context(ParseErr { path: &display })?;
        let buffers = gltf::import_buffers(&gltf.document, path.parent(), gltf.blob.clone())
            .context(BuffersErr { path: &display })?;

        Ok(Self::from_document(&gltf.document, buffers))
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Scene, LoadError> {
        let gltf = Gltf::from_slice(bytes).context(ParseErr {
            path: MEMORY_SOURCE,
        })?;
        let buffers = gltf::import_buffers(&gltf.document, None, gltf.blob.clone()).context(
            BuffersErr {
                path: MEMORY_SOURCE,
            },
        )?;

        Ok(Self::from_document(&gltf.document, buffers))
    }

    /// Builds the flat document. Indices are copied as they are, validation happens at use.
    pub fn from_document(doc: &Document, buffers: Vec<BufferData>) -> Scene {
        let mut data = buffers.into_iter().map(|b| b.0);
        let buffers = doc
            .buffers()
            .map(|buffer| Buffer {
                name: buffer.name().map(str::to_string),
                byte_length: buffer.length(),
                data: data.next().unwrap_or_default(),
            })
            .collect();

        let buffer_views = doc
            .views()
            .map(|view| BufferView {
                buffer: view.buffer().index(),
                byte_offset: view.offset(),
                byte_length: view.length(),
                byte_stride: view.stride().unwrap_or(0),
            })
            .collect();

        let scene = Scene {
            buffers,
            buffer_views,
            accessors: doc.accessors().map(load_accessor).collect(),
            materials: doc.materials().map(load_material).collect(),
            textures: doc
                .textures()
                .map(|texture| Texture {
                    name: texture.name().map(str::to_string),
                    source: Some(texture.source().index()),
                })
                .collect(),
            images: doc.images().map(load_image).collect(),
            meshes: doc.meshes().map(load_mesh).collect(),
            nodes: doc.nodes().map(load_node).collect(),
            scene_roots: doc
                .scenes()
                .map(|scene| SceneRoot {
                    name: scene.name().unwrap_or("Unnamed").to_string(),
                    nodes: scene.nodes().map(|n| n.index()).collect(),
                })
                .collect(),
            active_scene: doc.default_scene().map(|s| s.index()),
        };

        trace!(
            "Loaded scene document: {} buffers, {} accessors, {} meshes, {} nodes",
            scene.buffers.len(),
            scene.accessors.len(),
            scene.meshes.len(),
            scene.nodes.len()
        );

        scene
    }
}

fn load_accessor(accessor: gltf::Accessor) -> Accessor {
    let component_type = match accessor.data_type() {
        DataType::I8 => ComponentType::I8,
        DataType::U8 => ComponentType::U8,
        DataType::I16 => ComponentType::I16,
        DataType::U16 => ComponentType::U16,
        DataType::U32 => ComponentType::U32,
        DataType::F32 => ComponentType::F32,
    };

    let (shape, count) = match accessor.dimensions() {
        Dimensions::Scalar => (ElementShape::Scalar, accessor.count()),
        Dimensions::Vec2 => (ElementShape::Vec2, accessor.count()),
        Dimensions::Vec3 => (ElementShape::Vec3, accessor.count()),
        Dimensions::Vec4 => (ElementShape::Vec4, accessor.count()),
        Dimensions::Mat2 | Dimensions::Mat3 | Dimensions::Mat4 => {
            trace!(
                "Accessor #{} holds matrices, which nothing in the renderer reads",
                accessor.index()
            );
            (ElementShape::Scalar, 0)
        }
    };

    // Sparse accessors without a backing view can't be resolved. An index past every
    // view makes the resolver report them like any other dangling reference.
    let buffer_view = match accessor.view() {
        Some(view) => view.index(),
        None => {
            warn!(
                "Accessor #{} has no buffer view; sparse accessors are not supported",
                accessor.index()
            );
            usize::MAX
        }
    };

    Accessor {
        buffer_view,
        byte_offset: accessor.offset(),
        component_type,
        normalized: accessor.normalized(),
        count,
        shape,
        min: accessor.min().map(json_floats).unwrap_or_default(),
        max: accessor.max().map(json_floats).unwrap_or_default(),
    }
}

fn json_floats(value: Value) -> Vec<f32> {
    match value {
        Value::Array(values) => values
            .iter()
            .filter_map(Value::as_f64)
            .map(|v| v as f32)
            .collect(),
        Value::Number(n) => n.as_f64().map(|v| vec![v as f32]).unwrap_or_default(),
        _ => Vec::new(),
    }
}

fn texture_ref(info: &gltf::texture::Info) -> TextureRef {
    TextureRef::with_tex_coord(info.texture().index(), info.tex_coord())
}

fn load_material(mat: gltf::Material) -> Material {
    let pbr = mat.pbr_metallic_roughness();

    let metallic_roughness = MetallicRoughness {
        base_color_factor: Vector4::from(pbr.base_color_factor()),
        base_color_texture: pbr.base_color_texture().as_ref().map(texture_ref),
        metallic_factor: pbr.metallic_factor(),
        roughness_factor: pbr.roughness_factor(),
        metallic_roughness_texture: pbr.metallic_roughness_texture().as_ref().map(texture_ref),
    };

    let specular_glossiness = mat.pbr_specular_glossiness().map(|sg| SpecularGlossiness {
        diffuse_factor: Vector4::from(sg.diffuse_factor()),
        diffuse_texture: sg.diffuse_texture().as_ref().map(texture_ref),
        specular_factor: Vector3::from(sg.specular_factor()),
        glossiness_factor: sg.glossiness_factor(),
        specular_glossiness_texture: sg.specular_glossiness_texture().as_ref().map(texture_ref),
    });

    let alpha_mode = match mat.alpha_mode() {
        gltf::material::AlphaMode::Opaque => AlphaMode::Opaque,
        gltf::material::AlphaMode::Mask => AlphaMode::Mask,
        gltf::material::AlphaMode::Blend => AlphaMode::Blend,
    };

    let normal = mat.normal_texture();
    let occlusion = mat.occlusion_texture();

    Material {
        name: mat.name().map(str::to_string),
        alpha_mode,
        alpha_cutoff: mat.alpha_cutoff().unwrap_or(0.5),
        double_sided: mat.double_sided(),
        pbr: Pbr::select(metallic_roughness, specular_glossiness),
        normal_texture: normal
            .as_ref()
            .map(|n| TextureRef::with_tex_coord(n.texture().index(), n.tex_coord())),
        normal_scale: normal.as_ref().map_or(1.0, |n| n.scale()),
        occlusion_texture: occlusion
            .as_ref()
            .map(|o| TextureRef::with_tex_coord(o.texture().index(), o.tex_coord())),
        occlusion_strength: occlusion.as_ref().map_or(1.0, |o| o.strength()),
        emissive_texture: mat.emissive_texture().as_ref().map(texture_ref),
        emissive_factor: Vector3::from(mat.emissive_factor()),
    }
}

fn load_image(image: gltf::Image) -> Image {
    let uri = match image.source() {
        gltf::image::Source::Uri { uri, .. } => Some(uri.to_string()),
        gltf::image::Source::View { .. } => None,
    };

    Image {
        name: image.name().map(str::to_string),
        uri,
    }
}

fn semantic_name(semantic: &Semantic) -> String {
    match semantic {
        Semantic::Positions => "POSITION".to_string(),
        Semantic::Normals => "NORMAL".to_string(),
        Semantic::Tangents => "TANGENT".to_string(),
        Semantic::Colors(set) => format!("COLOR_{set}"),
        Semantic::TexCoords(set) => format!("TEXCOORD_{set}"),
        Semantic::Joints(set) => format!("JOINTS_{set}"),
        Semantic::Weights(set) => format!("WEIGHTS_{set}"),
        #[allow(unreachable_patterns)]
        other => format!("{other:?}"),
    }
}

fn load_mesh(mesh: gltf::Mesh) -> Mesh {
    let primitives = mesh
        .primitives()
        .map(|prim| {
            let mode = match prim.mode() {
                Mode::Points => Topology::Points,
                Mode::Lines => Topology::Lines,
                Mode::LineLoop => Topology::LineLoop,
                Mode::LineStrip => Topology::LineStrip,
                Mode::Triangles => Topology::Triangles,
                Mode::TriangleStrip => Topology::TriangleStrip,
                Mode::TriangleFan => Topology::TriangleFan,
            };

            MeshPrimitive {
                attributes: prim
                    .attributes()
                    .map(|(semantic, accessor)| (semantic_name(&semantic), accessor.index()))
                    .collect(),
                indices: prim.indices().map(|a| a.index()),
                material: prim.material().index(),
                mode,
            }
        })
        .collect();

    Mesh {
        name: mesh.name().map(str::to_string),
        primitives,
    }
}

fn load_node(node: gltf::Node) -> Node {
    let mut out = Node {
        name: node.name().map(str::to_string),
        children: node.children().map(|c| c.index()).collect(),
        mesh: node.mesh().map(|m| m.index()),
        ..Node::default()
    };

    match node.transform() {
        gltf::scene::Transform::Matrix { matrix } => {
            out.matrix = Some(Matrix4::from(matrix));
        }
        gltf::scene::Transform::Decomposed {
            translation,
            rotation,
            scale,
        } => {
            out.translation = Vector3::from(translation);
            out.rotation = UnitQuaternion::from_quaternion(Quaternion::from(rotation));
            out.scale = Vector3::from(scale);
        }
    }

    out
}
