use crate::assets::{LoadError, Scene, SceneSelection};
use crate::core::{BoundingBox, calculate_scene_min_max};
use crate::rendering::{CacheError, GraphicsDevice, MaterialShaders, RenderCache, SceneRenderer};
use log::{debug, error};
use snafu::{ResultExt, Snafu};

#[derive(Debug, Snafu)]
#[snafu(context(suffix(Err)))]
pub enum ReloadError {
    #[snafu(display("Failed to load the scene: {source}"))]
    Load { source: LoadError },

    #[snafu(display("Failed to build render resources: {source}"))]
    Cache { source: CacheError },
}

/// A scene document together with its render cache and bounds.
///
/// The three are only ever replaced together. A reload that fails at any step leaves the
/// previous set exactly as it was.
#[derive(Debug)]
pub struct SceneAsset<D: GraphicsDevice> {
    scene: Scene,
    cache: RenderCache<D>,
    bounds: BoundingBox,
    selection: SceneSelection,
}

impl<D: GraphicsDevice> SceneAsset<D> {
    /// Builds cache and bounds for an already loaded scene.
    pub fn new(device: &mut D, scene: Scene, selection: SceneSelection) -> Result<Self, CacheError> {
        let mut cache = RenderCache::new();
        cache.init(device, &scene)?;
        let bounds = calculate_scene_min_max(&scene, selection);

        Ok(Self {
            scene,
            cache,
            bounds,
            selection,
        })
    }

    pub fn load<F>(device: &mut D, selection: SceneSelection, loader: F) -> Result<Self, ReloadError>
    where
        F: FnOnce() -> Result<Scene, LoadError>,
    {
        let scene = loader().context(LoadErr)?;
        Self::new(device, scene, selection).context(CacheErr)
    }

    /// Replaces scene, cache and bounds with a freshly loaded set.
    ///
    /// The new set is built completely before the old cache is freed.
    pub fn reload<F>(&mut self, device: &mut D, loader: F) -> Result<(), ReloadError>
    where
        F: FnOnce() -> Result<Scene, LoadError>,
    {
        let fresh = match Self::load(device, self.selection, loader) {
            Ok(fresh) => fresh,
            Err(e) => {
                error!("Scene reload failed, keeping the previous scene: {e}");
                return Err(e);
            }
        };

        let mut old = std::mem::replace(self, fresh);
        old.cache.free(device);

        debug!(
            "Scene reloaded: {} nodes, {} drawable primitives",
            self.scene.nodes.len(),
            self.cache.primitive_count()
        );

        Ok(())
    }

    pub fn free(&mut self, device: &mut D) {
        self.cache.free(device);
    }

    #[inline]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    #[inline]
    pub fn cache(&self) -> &RenderCache<D> {
        &self.cache
    }

    #[inline]
    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    #[inline]
    pub fn selection(&self) -> SceneSelection {
        self.selection
    }

    pub fn renderer(&self, shaders: MaterialShaders) -> SceneRenderer<'_, D> {
        SceneRenderer::new(&self.scene, &self.cache, shaders)
    }
}
