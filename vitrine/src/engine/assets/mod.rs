//! The scene document and everything that reads it without touching the GPU.
//!
//! A [`Scene`] is produced whole, either by the host's own parser or by the
//! [`SceneLoader`] adapter around the `gltf` crate, and never changes afterwards.

mod material;
pub mod resolver;
mod scene;
mod scene_loader;

pub use self::material::*;
pub use self::resolver::{ResolveError, ResolvedAccessor, resolve};
pub use self::scene::*;
pub use self::scene_loader::*;
