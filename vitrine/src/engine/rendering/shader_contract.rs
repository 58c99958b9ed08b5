//! Uniform names the PBR shader programs are expected to declare.

pub const HAS_VERTEX_COLORS: &str = "u_hasVertexColors";
pub const ALPHA_MASK: &str = "u_alphaMask";
pub const ALPHA_MASK_CUTOFF: &str = "u_alphaMaskCutoff";
pub const EMISSIVE_FACTOR: &str = "u_emissiveFactor";
pub const NORMAL_TEXTURE_SCALE: &str = "u_normalTextureScale";
pub const OCCLUSION_STRENGTH: &str = "u_occlusionStrength";

// metallic roughness
pub const BASE_COLOR_FACTOR: &str = "u_baseColorFactor";
pub const METALLIC_FACTOR: &str = "u_metallicFactor";
pub const ROUGHNESS_FACTOR: &str = "u_roughnessFactor";

// specular glossiness
pub const DIFFUSE_FACTOR: &str = "u_diffuseFactor";
pub const SPECULAR_FACTOR: &str = "u_specularFactor";
pub const GLOSSINESS_FACTOR: &str = "u_glossinessFactor";

// scene lighting
/// View space direction of the directional light in `xyz`, `w` is 0.
pub const LIGHT_PARAMS_1: &str = "scene_lightParams1";
/// Directional light color in `xyz`, `w` is 1.
pub const LIGHT_PARAMS_2: &str = "scene_lightParams2";
pub const AMBIENT_LIGHT_COLOR: &str = "scene_ambientLightColor";

/// A sampler uniform and the uniform selecting its UV channel. The channel uniform is -1
/// while the slot is disabled.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TextureSlot {
    pub sampler: &'static str,
    pub coord: &'static str,
}

pub const BASE_COLOR_TEXTURE: TextureSlot = TextureSlot {
    sampler: "baseColorTexture",
    coord: "baseColorTextureCoord",
};

pub const METALLIC_ROUGHNESS_TEXTURE: TextureSlot = TextureSlot {
    sampler: "metallicRoughnessTexture",
    coord: "metallicRoughnessTextureCoord",
};

pub const DIFFUSE_TEXTURE: TextureSlot = TextureSlot {
    sampler: "diffuseTexture",
    coord: "diffuseTextureCoord",
};

pub const SPECULAR_GLOSSINESS_TEXTURE: TextureSlot = TextureSlot {
    sampler: "specularGlossinessTexture",
    coord: "specularGlossinessTextureCoord",
};

pub const NORMAL_TEXTURE: TextureSlot = TextureSlot {
    sampler: "normalTexture",
    coord: "normalTextureCoord",
};

pub const OCCLUSION_TEXTURE: TextureSlot = TextureSlot {
    sampler: "occlusionTexture",
    coord: "occlusionTextureCoord",
};

pub const EMISSIVE_TEXTURE: TextureSlot = TextureSlot {
    sampler: "emissiveTexture",
    coord: "emissiveTextureCoord",
};
