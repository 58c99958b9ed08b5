//! Opaque and translucent scene draws.
//!
//! Both passes walk the selected root sets depth first and draw every primitive whose
//! material belongs to the pass. The translucent pass can instead sort everything
//! back to front by the view space depth of each primitive's declared box center.

use crate::assets::{Material, Scene, SceneSelection, resolve};
use crate::core::{PrimitiveVisit, flatten_primitives};
use crate::rendering::shader_contract as contract;
use crate::rendering::{
    CullMode, FRONT_FACE, GraphicsDevice, MaterialBinder, MaterialShaders, NoTextures,
    RenderCache, TextureResolver, UniformValue,
};
use crate::utils::math::transform_point;
use bon::Builder;
use itertools::Itertools;
use log::{trace, warn};
use nalgebra::{Matrix4, Vector3, Vector4};
use vitrine_utils::debug_panic;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum RenderPass {
    /// `OPAQUE` and `MASK` materials.
    Opaque,
    /// `BLEND` materials.
    Translucent,
}

impl RenderPass {
    #[inline]
    pub fn accepts(self, material: &Material) -> bool {
        match self {
            RenderPass::Opaque => !material.is_translucent(),
            RenderPass::Translucent => material.is_translucent(),
        }
    }
}

/// The view space axis pointing away from the camera.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum ViewForward {
    #[default]
    PositiveZ,
    /// Right handed cameras looking down -Z.
    NegativeZ,
}

impl ViewForward {
    /// Larger is farther away.
    #[inline]
    pub fn depth(self, view_position: &Vector3<f32>) -> f32 {
        match self {
            ViewForward::PositiveZ => view_position.z,
            ViewForward::NegativeZ => -view_position.z,
        }
    }
}

/// One directional light plus ambient light, in world space.
///
/// The default is black directional light and white ambient light, which shades every
/// material at its full base color.
#[derive(Debug, Copy, Clone, PartialEq, Builder)]
pub struct SceneLighting {
    /// Not normalized; shaders get it exactly as transformed into view space.
    #[builder(default = Vector3::zeros())]
    pub direction: Vector3<f32>,
    #[builder(default = Vector3::zeros())]
    pub color: Vector3<f32>,
    #[builder(default = Vector3::new(1.0, 1.0, 1.0))]
    pub ambient: Vector3<f32>,
}

impl Default for SceneLighting {
    fn default() -> Self {
        SceneLighting::builder().build()
    }
}

impl SceneLighting {
    /// The uniform values for a world-to-view matrix.
    pub fn uniforms(&self, view: &Matrix4<f32>) -> [(&'static str, UniformValue); 3] {
        let direction = view.transform_vector(&self.direction);
        [
            (
                contract::LIGHT_PARAMS_1,
                Vector4::new(direction.x, direction.y, direction.z, 0.0).into(),
            ),
            (
                contract::LIGHT_PARAMS_2,
                Vector4::new(self.color.x, self.color.y, self.color.z, 1.0).into(),
            ),
            (contract::AMBIENT_LIGHT_COLOR, self.ambient.into()),
        ]
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Builder)]
pub struct DrawOptions {
    /// Sort translucent primitives back to front. The opaque pass is never sorted.
    #[builder(default)]
    pub sort_by_view_distance: bool,
    #[builder(default)]
    pub alpha_to_coverage: bool,
    #[builder(default)]
    pub view_forward: ViewForward,
    #[builder(default)]
    pub selection: SceneSelection,
    #[builder(default)]
    pub lighting: SceneLighting,
}

impl Default for DrawOptions {
    fn default() -> Self {
        DrawOptions::builder().build()
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct DrawStats {
    pub drawn: usize,
    /// Primitives of this pass that had no draw resources.
    pub skipped: usize,
}

impl std::ops::AddAssign for DrawStats {
    fn add_assign(&mut self, rhs: Self) {
        self.drawn += rhs.drawn;
        self.skipped += rhs.skipped;
    }
}

/// A primitive visit with its sort key.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SortedVisit {
    pub depth: f32,
    pub visit: PrimitiveVisit,
}

/// Orders `visits` farthest first. Visits at equal depth keep their relative order.
///
/// The depth of a visit is the view space depth of the center of its position accessor's
/// declared box. Primitives without one are keyed at their node's origin.
pub fn sort_by_view_distance(
    scene: &Scene,
    visits: Vec<PrimitiveVisit>,
    forward: ViewForward,
) -> Vec<SortedVisit> {
    visits
        .into_iter()
        .map(|visit| {
            let center = primitive_center(scene, &visit);
            let depth = forward.depth(&transform_point(&visit.transform, &center));
            SortedVisit { depth, visit }
        })
        .sorted_by(|a, b| b.depth.total_cmp(&a.depth))
        .collect()
}

fn primitive_center(scene: &Scene, visit: &PrimitiveVisit) -> Vector3<f32> {
    scene
        .primitive(visit.key)
        .and_then(|prim| prim.position())
        .and_then(|position| resolve(scene, position).ok())
        .and_then(|resolved| resolved.accessor.declared_bounds())
        .map(|(min, max)| (min + max) * 0.5)
        .unwrap_or_else(|| {
            trace!("{} has no declared bounds; sorting it by its origin", visit.key);
            Vector3::zeros()
        })
}

/// Draws one scene out of its render cache.
pub struct SceneRenderer<'a, D: GraphicsDevice> {
    scene: &'a Scene,
    cache: &'a RenderCache<D>,
    shaders: MaterialShaders,
    textures: &'a dyn TextureResolver,
    default_material: Material,
}

impl<'a, D: GraphicsDevice> SceneRenderer<'a, D> {
    pub fn new(scene: &'a Scene, cache: &'a RenderCache<D>, shaders: MaterialShaders) -> Self {
        Self {
            scene,
            cache,
            shaders,
            textures: &NoTextures,
            default_material: Material::default(),
        }
    }

    pub fn with_textures(mut self, textures: &'a dyn TextureResolver) -> Self {
        self.textures = textures;
        self
    }

    /// Used for primitives without a material or with one that doesn't exist.
    pub fn with_default_material(mut self, material: Material) -> Self {
        self.default_material = material;
        self
    }

    /// Opaque pass, then translucent pass.
    pub fn draw_frame(&self, device: &mut D, view: &Matrix4<f32>, options: &DrawOptions) -> DrawStats {
        let mut stats = self.draw(device, view, RenderPass::Opaque, options);
        stats += self.draw(device, view, RenderPass::Translucent, options);
        stats
    }

    pub fn draw(
        &self,
        device: &mut D,
        view: &Matrix4<f32>,
        pass: RenderPass,
        options: &DrawOptions,
    ) -> DrawStats {
        let mut stats = DrawStats::default();

        if !self.cache.is_initialized() {
            warn!("Render cache isn't initialized; nothing to draw");
            return stats;
        }

        let roots = self.scene.selected_root_nodes(options.selection);
        let visits = flatten_primitives(self.scene, &roots, view);
        let lighting = options.lighting.uniforms(view);

        let previous_alpha_to_coverage = device.alpha_to_coverage();
        device.set_alpha_to_coverage(options.alpha_to_coverage);

        if pass == RenderPass::Translucent && options.sort_by_view_distance {
            for sorted in sort_by_view_distance(self.scene, visits, options.view_forward) {
                self.draw_primitive(device, &sorted.visit, pass, &lighting, &mut stats);
            }
        } else {
            for visit in &visits {
                self.draw_primitive(device, visit, pass, &lighting, &mut stats);
            }
        }

        device.clear_shader();
        device.set_alpha_to_coverage(previous_alpha_to_coverage);

        stats
    }

    fn draw_primitive(
        &self,
        device: &mut D,
        visit: &PrimitiveVisit,
        pass: RenderPass,
        lighting: &[(&'static str, UniformValue)],
        stats: &mut DrawStats,
    ) {
        let Some(prim) = self.scene.primitive(visit.key) else {
            debug_panic!("Traversal produced {} which doesn't exist", visit.key);
            return;
        };

        let material = self
            .scene
            .material(prim.material)
            .unwrap_or(&self.default_material);
        if !pass.accepts(material) {
            return;
        }

        let Some(handle) = self.cache.draw_handle(visit.key) else {
            trace!("{} has no draw resources", visit.key);
            stats.skipped += 1;
            return;
        };

        let Some(vertex_buffer) = self.cache.vertex_buffer(handle.vertex_buffer) else {
            debug_panic!(
                "{} refers to vertex buffer #{} which isn't cached",
                visit.key,
                handle.vertex_buffer
            );
            stats.skipped += 1;
            return;
        };

        device.bind_shader(self.shaders.select(&material.pbr));
        for (name, value) in lighting {
            device.set_uniform(name, *value);
        }
        MaterialBinder::new(device, self.scene, self.textures)
            .bind(material, prim.has_vertex_colors());

        device.set_model_view(&visit.transform);

        let cull = if material.double_sided {
            CullMode::None
        } else {
            CullMode::Back
        };
        device.set_culling(cull, FRONT_FACE);

        device.bind_vertex_buffer(vertex_buffer, &handle.bindings);

        if let Some(accessor) = handle.index_buffer {
            let Some(index_buffer) = self.cache.index_buffer(accessor) else {
                debug_panic!(
                    "{} refers to index buffer for accessor #{accessor} which isn't cached",
                    visit.key
                );
                stats.skipped += 1;
                return;
            };
            device.bind_index_buffer(&index_buffer.buffer, index_buffer.width);
        }

        device.draw(handle.topology, handle.indexed, handle.count);
        stats.drawn += 1;
    }
}
