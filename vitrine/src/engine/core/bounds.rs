use crate::assets::{Scene, SceneSelection, resolve};
use crate::core::flatten_nodes;
use crate::utils::math::{box_corners, transform_point};
use log::warn;
use nalgebra::{Matrix4, Vector3};

/// Axis aligned bounding box accumulator.
///
/// Starts out empty. The first point is taken as both corners, so boxes that lie entirely in
/// negative space come out right without any sentinel values.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BoundingBox {
    pub min: Vector3<f32>,
    pub max: Vector3<f32>,
    pub has_min_max: bool,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::empty()
    }
}

impl BoundingBox {
    pub fn empty() -> Self {
        Self {
            min: Vector3::zeros(),
            max: Vector3::zeros(),
            has_min_max: false,
        }
    }

    pub fn from_min_max(min: Vector3<f32>, max: Vector3<f32>) -> Self {
        Self {
            min,
            max,
            has_min_max: true,
        }
    }

    pub fn expand(&mut self, point: &Vector3<f32>) {
        if self.has_min_max {
            self.min = self.min.inf(point);
            self.max = self.max.sup(point);
        } else {
            self.min = *point;
            self.max = *point;
            self.has_min_max = true;
        }
    }

    /// Expands by all eight corners of the local box `min..max` under `transform`.
    pub fn expand_transformed(
        &mut self,
        min: &Vector3<f32>,
        max: &Vector3<f32>,
        transform: &Matrix4<f32>,
    ) {
        for corner in box_corners(min, max) {
            self.expand(&transform_point(transform, &corner));
        }
    }

    pub fn center(&self) -> Vector3<f32> {
        (self.min + self.max) * 0.5
    }

    pub fn extents(&self) -> Vector3<f32> {
        self.max - self.min
    }
}

/// One primitive's declared local box, placed by its node.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PrimitiveBounds {
    pub node: usize,
    pub mesh: usize,
    pub primitive: usize,
    pub local_min: Vector3<f32>,
    pub local_max: Vector3<f32>,
    pub node_to_world: Matrix4<f32>,
}

/// Declared local bounds of every reachable primitive's position data.
///
/// Primitives without a usable position accessor are skipped with a warning.
pub fn collect_primitive_bounds(scene: &Scene, selection: SceneSelection) -> Vec<PrimitiveBounds> {
    let roots = scene.selected_root_nodes(selection);
    let mut out = Vec::new();

    for visit in flatten_nodes(scene, &roots, &Matrix4::identity()) {
        let Some(mesh_idx) = scene.nodes[visit.node].mesh else {
            continue;
        };
        let Some(mesh) = scene.meshes.get(mesh_idx) else {
            warn!("Node #{} refers to missing mesh #{mesh_idx}", visit.node);
            continue;
        };

        for (prim_idx, prim) in mesh.primitives.iter().enumerate() {
            let Some(position) = prim.position() else {
                warn!("Mesh #{mesh_idx} primitive #{prim_idx} has no position attribute");
                continue;
            };

            let resolved = match resolve(scene, position) {
                Ok(resolved) => resolved,
                Err(e) => {
                    warn!("Mesh #{mesh_idx} primitive #{prim_idx}: {e}");
                    continue;
                }
            };

            let Some((local_min, local_max)) = resolved.accessor.declared_bounds() else {
                warn!(
                    "Mesh #{mesh_idx} primitive #{prim_idx}: position accessor #{position} \
                     isn't a VEC3 with declared min/max"
                );
                continue;
            };

            out.push(PrimitiveBounds {
                node: visit.node,
                mesh: mesh_idx,
                primitive: prim_idx,
                local_min,
                local_max,
                node_to_world: visit.transform,
            });
        }
    }

    out
}

/// World space bounds of everything reachable from the selected roots.
///
/// Built from the *declared* min/max of each position accessor, not from the vertices
/// themselves. A document with wrong declared bounds produces a wrong box.
pub fn calculate_scene_min_max(scene: &Scene, selection: SceneSelection) -> BoundingBox {
    let mut bounds = BoundingBox::empty();

    for prim in collect_primitive_bounds(scene, selection) {
        bounds.expand_transformed(&prim.local_min, &prim.local_max, &prim.node_to_world);
    }

    bounds
}
