use crate::assets::{PrimitiveKey, Scene};
use log::warn;
use nalgebra::Matrix4;

/// A node reached by a traversal, with everything above it already composed in.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct NodeVisit {
    pub node: usize,
    pub transform: Matrix4<f32>,
}

/// A primitive reached by a traversal, drawn under its node's composed transform.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PrimitiveVisit {
    pub node: usize,
    pub key: PrimitiveKey,
    pub transform: Matrix4<f32>,
}

/// Depth-first pre-order walk over `roots`, visiting children in index order.
///
/// `base` is applied above every root (identity for world space, the view matrix for view
/// space). Dangling root or child indices are skipped with a warning. Paths deeper than the
/// node count can only come from a cycle and are cut off there.
pub fn flatten_nodes(scene: &Scene, roots: &[usize], base: &Matrix4<f32>) -> Vec<NodeVisit> {
    let max_depth = scene.nodes.len();
    let mut visits = Vec::new();
    let mut stack: Vec<(usize, Matrix4<f32>, usize)> = roots
        .iter()
        .rev()
        .map(|&root| (root, *base, 0))
        .collect();

    while let Some((index, parent, depth)) = stack.pop() {
        let Some(node) = scene.nodes.get(index) else {
            warn!(
                "Node #{index} doesn't exist ({} nodes); skipping it",
                scene.nodes.len()
            );
            continue;
        };

        if depth >= max_depth {
            warn!("Node hierarchy loops back through node #{index}; not descending further");
            continue;
        }

        let transform = parent * node.local_transform();
        visits.push(NodeVisit {
            node: index,
            transform,
        });

        stack.extend(
            node.children
                .iter()
                .rev()
                .map(|&child| (child, transform, depth + 1)),
        );
    }

    visits
}

/// Every primitive below `roots`, in traversal encounter order.
pub fn flatten_primitives(
    scene: &Scene,
    roots: &[usize],
    base: &Matrix4<f32>,
) -> Vec<PrimitiveVisit> {
    let mut out = Vec::new();

    for visit in flatten_nodes(scene, roots, base) {
        let Some(mesh_idx) = scene.nodes[visit.node].mesh else {
            continue;
        };

        let Some(mesh) = scene.meshes.get(mesh_idx) else {
            warn!(
                "Node #{} refers to mesh #{mesh_idx} ({} meshes); skipping it",
                visit.node,
                scene.meshes.len()
            );
            continue;
        };

        out.extend((0..mesh.primitives.len()).map(|prim_idx| PrimitiveVisit {
            node: visit.node,
            key: PrimitiveKey::new(mesh_idx, prim_idx),
            transform: visit.transform,
        }));
    }

    out
}
