pub mod cache;
mod device;
pub mod error;
mod material;
mod renderer;
pub mod shader_contract;
pub mod wgpu_device;

pub use cache::{CachedIndexBuffer, DrawHandle, RenderCache};
pub use device::*;
pub use error::{CacheError, PrimitiveError};
pub use material::*;
pub use renderer::*;
pub use wgpu_device::{DrawPacket, WgpuDevice};
