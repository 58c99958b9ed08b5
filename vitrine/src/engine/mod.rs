pub mod assets;
pub mod core;
pub mod rendering;
pub mod scene_asset;
#[cfg(feature = "hot-reload")]
pub mod watcher;

pub use scene_asset::*;
#[cfg(feature = "hot-reload")]
pub use watcher::*;
