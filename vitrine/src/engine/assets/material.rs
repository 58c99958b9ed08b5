use bon::Builder;
use nalgebra::{Vector3, Vector4};

/// How a material's alpha channel is interpreted.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum AlphaMode {
    #[default]
    Opaque,
    /// Alpha tested against [`Material::alpha_cutoff`] in the shader, drawn with opaque geometry.
    Mask,
    /// Alpha blended. Drawn in the translucent pass.
    Blend,
}

impl AlphaMode {
    #[inline]
    pub fn is_translucent(self) -> bool {
        self == AlphaMode::Blend
    }
}

/// Reference to a document texture, sampled through the given UV channel.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TextureRef {
    pub index: usize,
    pub tex_coord: u32,
}

impl TextureRef {
    pub const fn new(index: usize) -> Self {
        Self {
            index,
            tex_coord: 0,
        }
    }

    pub const fn with_tex_coord(index: usize, tex_coord: u32) -> Self {
        Self { index, tex_coord }
    }
}

#[derive(Debug, Clone, PartialEq, Builder)]
pub struct MetallicRoughness {
    #[builder(default = Vector4::new(1.0, 1.0, 1.0, 1.0))]
    pub base_color_factor: Vector4<f32>,
    pub base_color_texture: Option<TextureRef>,
    #[builder(default = 1.0)]
    pub metallic_factor: f32,
    #[builder(default = 1.0)]
    pub roughness_factor: f32,
    pub metallic_roughness_texture: Option<TextureRef>,
}

impl Default for MetallicRoughness {
    fn default() -> Self {
        MetallicRoughness::builder().build()
    }
}

#[derive(Debug, Clone, PartialEq, Builder)]
pub struct SpecularGlossiness {
    #[builder(default = Vector4::new(1.0, 1.0, 1.0, 1.0))]
    pub diffuse_factor: Vector4<f32>,
    pub diffuse_texture: Option<TextureRef>,
    #[builder(default = Vector3::new(1.0, 1.0, 1.0))]
    pub specular_factor: Vector3<f32>,
    #[builder(default = 1.0)]
    pub glossiness_factor: f32,
    pub specular_glossiness_texture: Option<TextureRef>,
}

impl Default for SpecularGlossiness {
    fn default() -> Self {
        SpecularGlossiness::builder().build()
    }
}

/// The PBR parameterization of a material.
///
/// Chosen once by the loader. A document declaring both parameterizations ends up as
/// [`Pbr::SpecularGlossiness`].
#[derive(Debug, Clone, PartialEq)]
pub enum Pbr {
    MetallicRoughness(MetallicRoughness),
    SpecularGlossiness(SpecularGlossiness),
}

impl Pbr {
    /// Picks the parameterization a document declares, specular-glossiness winning when both are present.
    pub fn select(
        metallic_roughness: MetallicRoughness,
        specular_glossiness: Option<SpecularGlossiness>,
    ) -> Self {
        match specular_glossiness {
            Some(sg) => Pbr::SpecularGlossiness(sg),
            None => Pbr::MetallicRoughness(metallic_roughness),
        }
    }
}

impl Default for Pbr {
    fn default() -> Self {
        Pbr::MetallicRoughness(MetallicRoughness::default())
    }
}

#[derive(Debug, Clone, PartialEq, Builder)]
pub struct Material {
    pub name: Option<String>,
    #[builder(default)]
    pub alpha_mode: AlphaMode,
    #[builder(default = 0.5)]
    pub alpha_cutoff: f32,
    #[builder(default)]
    pub double_sided: bool,
    #[builder(default)]
    pub pbr: Pbr,
    pub normal_texture: Option<TextureRef>,
    #[builder(default = 1.0)]
    pub normal_scale: f32,
    pub occlusion_texture: Option<TextureRef>,
    #[builder(default = 1.0)]
    pub occlusion_strength: f32,
    pub emissive_texture: Option<TextureRef>,
    #[builder(default = Vector3::zeros())]
    pub emissive_factor: Vector3<f32>,
}

impl Default for Material {
    fn default() -> Self {
        Material::builder().build()
    }
}

impl Material {
    #[inline]
    pub fn is_translucent(&self) -> bool {
        self.alpha_mode.is_translucent()
    }
}
