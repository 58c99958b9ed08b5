use crate::assets::{PrimitiveKey, Scene};
use crate::rendering::cache::index::prepare_index_data;
use crate::rendering::cache::primitive::{DrawHandle, build_vertex_layout};
use crate::rendering::error::{CacheError, ResourceAllocationErr};
use crate::rendering::{GpuResource, GraphicsDevice, IndexWidth};
use log::{debug, warn};
use snafu::ResultExt;
use std::collections::{BTreeMap, HashMap};
use std::fmt::{Debug, Formatter};

pub struct CachedIndexBuffer<B> {
    pub buffer: B,
    pub width: IndexWidth,
    pub count: usize,
}

/// GPU resources for every drawable primitive of one scene.
///
/// Vertex buffers mirror the scene's buffers one to one. Index buffers are keyed by
/// accessor, so primitives sharing an index accessor share its buffer.
pub struct RenderCache<D: GraphicsDevice> {
    vertex_buffers: Vec<D::VertexBuffer>,
    index_buffers: HashMap<usize, CachedIndexBuffer<D::IndexBuffer>>,
    handles: BTreeMap<PrimitiveKey, DrawHandle>,
    initialized: bool,
}

impl<D: GraphicsDevice> Default for RenderCache<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: GraphicsDevice> Debug for RenderCache<D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderCache")
            .field("vertex_buffers", &self.vertex_buffers.len())
            .field("index_buffers", &self.index_buffers.len())
            .field("primitives", &self.handles.len())
            .field("initialized", &self.initialized)
            .finish()
    }
}

impl<D: GraphicsDevice> RenderCache<D> {
    pub fn new() -> Self {
        Self {
            vertex_buffers: Vec::new(),
            index_buffers: HashMap::new(),
            handles: BTreeMap::new(),
            initialized: false,
        }
    }

    /// Builds draw resources for every primitive in `scene`.
    ///
    /// A cache that is already built is freed first. Primitives that can't be drawn are
    /// skipped with a warning and get no handle. If the device fails an allocation, whatever
    /// was created so far is released and the cache stays empty.
    pub fn init(&mut self, device: &mut D, scene: &Scene) -> Result<(), CacheError> {
        if self.initialized {
            self.free(device);
        }

        if let Err(e) = self.build(device, scene) {
            self.free(device);
            return Err(e);
        }

        self.initialized = true;
        debug!(
            "Render cache built: {} vertex buffers, {} index buffers, {} of {} primitives drawable",
            self.vertex_buffers.len(),
            self.index_buffers.len(),
            self.handles.len(),
            scene.primitives().count(),
        );

        Ok(())
    }

    fn build(&mut self, device: &mut D, scene: &Scene) -> Result<(), CacheError> {
        for (idx, buffer) in scene.buffers.iter().enumerate() {
            let vertex_buffer = device
                .allocate_vertex_buffer(&buffer.data)
                .context(ResourceAllocationErr {
                    resource: GpuResource::VertexBuffer(idx),
                })?;
            self.vertex_buffers.push(vertex_buffer);
        }

        for (key, prim) in scene.primitives() {
            let layout = match build_vertex_layout(device, scene, key, prim) {
                Ok(layout) => layout,
                Err(e) => {
                    warn!("Skipping {e}");
                    continue;
                }
            };

            let handle = match prim.indices {
                None => DrawHandle {
                    vertex_buffer: layout.vertex_buffer,
                    bindings: layout.bindings,
                    index_buffer: None,
                    index_width: None,
                    topology: prim.mode,
                    count: layout.vertex_count,
                    indexed: false,
                },
                Some(accessor) => {
                    let Some(cached) = self.index_buffer_for(device, scene, key, accessor)? else {
                        continue;
                    };
                    DrawHandle {
                        vertex_buffer: layout.vertex_buffer,
                        bindings: layout.bindings,
                        index_buffer: Some(accessor),
                        index_width: Some(cached.width),
                        topology: prim.mode,
                        count: cached.count,
                        indexed: true,
                    }
                }
            };

            self.handles.insert(key, handle);
        }

        Ok(())
    }

    /// The shared index buffer of `accessor`, created on first use.
    ///
    /// `Ok(None)` means the index data is unusable and only this primitive is skipped.
    fn index_buffer_for(
        &mut self,
        device: &mut D,
        scene: &Scene,
        key: PrimitiveKey,
        accessor: usize,
    ) -> Result<Option<&CachedIndexBuffer<D::IndexBuffer>>, CacheError> {
        if !self.index_buffers.contains_key(&accessor) {
            let data = match prepare_index_data(scene, key, accessor) {
                Ok(data) => data,
                Err(e) => {
                    warn!("Skipping {e}");
                    return Ok(None);
                }
            };

            let buffer = device
                .allocate_index_buffer(&data.bytes, data.width)
                .context(ResourceAllocationErr {
                    resource: GpuResource::IndexBuffer(accessor),
                })?;

            self.index_buffers.insert(
                accessor,
                CachedIndexBuffer {
                    buffer,
                    width: data.width,
                    count: data.count,
                },
            );
        }

        Ok(self.index_buffers.get(&accessor))
    }

    /// Releases every device resource and forgets all handles. Freeing twice is harmless.
    pub fn free(&mut self, device: &mut D) {
        for buffer in self.vertex_buffers.drain(..) {
            device.release_vertex_buffer(buffer);
        }
        for (_, cached) in self.index_buffers.drain() {
            device.release_index_buffer(cached.buffer);
        }
        self.handles.clear();
        self.initialized = false;
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn draw_handle(&self, key: PrimitiveKey) -> Option<&DrawHandle> {
        self.handles.get(&key)
    }

    /// Keys of all drawable primitives, ascending.
    pub fn keys(&self) -> impl Iterator<Item = PrimitiveKey> + '_ {
        self.handles.keys().copied()
    }

    pub fn vertex_buffer(&self, buffer: usize) -> Option<&D::VertexBuffer> {
        self.vertex_buffers.get(buffer)
    }

    pub fn index_buffer(&self, accessor: usize) -> Option<&CachedIndexBuffer<D::IndexBuffer>> {
        self.index_buffers.get(&accessor)
    }

    pub fn primitive_count(&self) -> usize {
        self.handles.len()
    }

    pub fn vertex_buffer_count(&self) -> usize {
        self.vertex_buffers.len()
    }

    pub fn index_buffer_count(&self) -> usize {
        self.index_buffers.len()
    }
}
