//! Material to shader uniform binding.

use crate::assets::{
    AlphaMode, Image, Material, MetallicRoughness, Pbr, Scene, SpecularGlossiness, TextureRef,
};
use crate::rendering::shader_contract::{self as contract, TextureSlot};
use crate::rendering::{GraphicsDevice, ShaderHandle, TextureId, UniformValue};
use bon::Builder;
use log::{debug, trace};

/// The shader programs a scene draw picks from.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Builder)]
pub struct MaterialShaders {
    pub metallic_roughness: Option<ShaderHandle>,
    pub specular_glossiness: Option<ShaderHandle>,
    /// Used whenever the variant a material needs isn't provided.
    pub fallback: ShaderHandle,
}

impl MaterialShaders {
    pub fn select(&self, pbr: &Pbr) -> ShaderHandle {
        let variant = match pbr {
            Pbr::MetallicRoughness(_) => self.metallic_roughness,
            Pbr::SpecularGlossiness(_) => self.specular_glossiness,
        };
        variant.unwrap_or(self.fallback)
    }
}

/// Maps document textures to textures the host has uploaded.
pub trait TextureResolver {
    /// Only called for textures whose index and image source both exist.
    fn resolve(&self, texture: usize, image: &Image) -> Option<TextureId>;
}

/// Resolves nothing. Every texture slot binds empty.
#[derive(Debug, Copy, Clone, Default)]
pub struct NoTextures;

impl TextureResolver for NoTextures {
    fn resolve(&self, _texture: usize, _image: &Image) -> Option<TextureId> {
        None
    }
}

impl<F> TextureResolver for F
where
    F: Fn(usize, &Image) -> Option<TextureId>,
{
    fn resolve(&self, texture: usize, image: &Image) -> Option<TextureId> {
        self(texture, image)
    }
}

/// Binds one material's parameters onto the currently bound shader.
pub struct MaterialBinder<'a, D: GraphicsDevice> {
    device: &'a mut D,
    scene: &'a Scene,
    textures: &'a dyn TextureResolver,
    next_unit: u32,
}

impl<'a, D: GraphicsDevice> MaterialBinder<'a, D> {
    pub fn new(device: &'a mut D, scene: &'a Scene, textures: &'a dyn TextureResolver) -> Self {
        Self {
            device,
            scene,
            textures,
            next_unit: 0,
        }
    }

    pub fn bind(mut self, material: &Material, has_vertex_colors: bool) {
        self.uniform(contract::HAS_VERTEX_COLORS, has_vertex_colors);
        self.uniform(contract::ALPHA_MASK, material.alpha_mode == AlphaMode::Mask);
        self.uniform(contract::ALPHA_MASK_CUTOFF, material.alpha_cutoff);

        match &material.pbr {
            Pbr::MetallicRoughness(mr) => self.bind_metallic_roughness(mr),
            Pbr::SpecularGlossiness(sg) => self.bind_specular_glossiness(sg),
        }

        self.texture(contract::NORMAL_TEXTURE, material.normal_texture);
        self.uniform(contract::NORMAL_TEXTURE_SCALE, material.normal_scale);

        self.texture(contract::OCCLUSION_TEXTURE, material.occlusion_texture);
        self.uniform(contract::OCCLUSION_STRENGTH, material.occlusion_strength);

        self.texture(contract::EMISSIVE_TEXTURE, material.emissive_texture);
        self.uniform(contract::EMISSIVE_FACTOR, material.emissive_factor);
    }

    fn bind_metallic_roughness(&mut self, mr: &MetallicRoughness) {
        self.texture(contract::BASE_COLOR_TEXTURE, mr.base_color_texture);
        self.uniform(contract::BASE_COLOR_FACTOR, mr.base_color_factor);

        self.texture(
            contract::METALLIC_ROUGHNESS_TEXTURE,
            mr.metallic_roughness_texture,
        );
        self.uniform(contract::METALLIC_FACTOR, mr.metallic_factor);
        self.uniform(contract::ROUGHNESS_FACTOR, mr.roughness_factor);
    }

    fn bind_specular_glossiness(&mut self, sg: &SpecularGlossiness) {
        self.texture(contract::DIFFUSE_TEXTURE, sg.diffuse_texture);
        self.uniform(contract::DIFFUSE_FACTOR, sg.diffuse_factor);

        self.texture(
            contract::SPECULAR_GLOSSINESS_TEXTURE,
            sg.specular_glossiness_texture,
        );
        self.uniform(contract::SPECULAR_FACTOR, sg.specular_factor);
        self.uniform(contract::GLOSSINESS_FACTOR, sg.glossiness_factor);
    }

    #[inline]
    fn uniform(&mut self, name: &str, value: impl Into<UniformValue>) {
        self.device.set_uniform(name, value.into());
    }

    /// Every slot takes the next texture unit, whether it ends up enabled or not.
    fn texture(&mut self, slot: TextureSlot, texture: Option<TextureRef>) {
        let unit = self.next_unit;
        self.next_unit += 1;

        let id = texture.and_then(|texture| self.lookup(slot, texture));

        self.device
            .set_uniform(slot.sampler, UniformValue::Texture { unit, texture: id });
        let coord = if id.is_some() { 0.0 } else { -1.0 };
        self.uniform(slot.coord, coord);
    }

    fn lookup(&self, slot: TextureSlot, texture: TextureRef) -> Option<TextureId> {
        if texture.tex_coord != 0 {
            debug!(
                "{} samples UV channel {}; only channel 0 is streamed, disabling it",
                slot.sampler, texture.tex_coord
            );
            return None;
        }

        let Some(source) = self.scene.textures.get(texture.index) else {
            trace!("{} refers to missing texture #{}", slot.sampler, texture.index);
            return None;
        };
        let image = source.source.and_then(|image| self.scene.images.get(image))?;

        self.textures.resolve(texture.index, image)
    }
}
