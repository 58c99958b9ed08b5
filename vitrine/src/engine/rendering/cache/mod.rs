mod index;
mod primitive;
mod render_cache;

pub use index::{IndexData, prepare_index_data, promote_u8_indices};
pub use primitive::{AttributeBindings, DrawHandle};
pub use render_cache::{CachedIndexBuffer, RenderCache};
