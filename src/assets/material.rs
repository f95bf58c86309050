use bytemuck::{Pod, Zeroable};

bitflags::bitflags! {
    /// Flag word the PBR shader reads to know which samplers carry data.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TextureFlags: u32 {
        const ALBEDO = 0x01;
        const NORMAL = 0x02;
        const METALLIC = 0x04;
        const ROUGHNESS = 0x08;
        const AO = 0x10;
    }
}

/// Optional texture channels of a PBR material, keyed by texture path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PbrTextures {
    pub albedo: Option<String>,
    pub normal: Option<String>,
    pub metallic: Option<String>,
    pub roughness: Option<String>,
    pub ao: Option<String>,
}

impl PbrTextures {
    pub fn flags(&self) -> TextureFlags {
        let mut flags = TextureFlags::empty();
        flags.set(TextureFlags::ALBEDO, self.albedo.is_some());
        flags.set(TextureFlags::NORMAL, self.normal.is_some());
        flags.set(TextureFlags::METALLIC, self.metallic.is_some());
        flags.set(TextureFlags::ROUGHNESS, self.roughness.is_some());
        flags.set(TextureFlags::AO, self.ao.is_some());
        flags
    }

    /// Channels in sampler-binding order.
    pub fn channels(&self) -> [Option<&str>; 5] {
        [
            self.albedo.as_deref(),
            self.normal.as_deref(),
            self.metallic.as_deref(),
            self.roughness.as_deref(),
            self.ao.as_deref(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PbrParams {
    pub color: [f32; 3],
    pub attenuation: f32,
    pub ambient_intensity: f32,
    pub gamma: f32,
    pub roughness: f32,
    pub metallic: f32,
    pub ao: f32,
}

impl Default for PbrParams {
    fn default() -> Self {
        Self {
            color: [0.2, 0.5, 0.8],
            attenuation: 1.0,
            ambient_intensity: 0.4,
            gamma: 2.2,
            roughness: 0.5,
            metallic: 0.5,
            ao: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimpleParams {
    pub base_color: [f32; 4],
    pub ambient: f32,
    pub diffuse: f32,
    pub specular: f32,
    pub spec_strength: f32,
    pub spec_power: f32,
    /// 0 = flat colour, 1 = texture only.
    pub texture_blend: f32,
}

impl Default for SimpleParams {
    fn default() -> Self {
        Self {
            base_color: [0.8, 0.8, 0.8, 1.0],
            ambient: 0.2,
            diffuse: 0.8,
            specular: 0.5,
            spec_strength: 0.5,
            spec_power: 32.0,
            texture_blend: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Material {
    Pbr { params: PbrParams, textures: PbrTextures },
    Simple { params: SimpleParams, albedo: Option<String> },
}

impl Material {
    pub fn kind(&self) -> MaterialKind {
        match self {
            Material::Pbr { .. } => MaterialKind::Pbr,
            Material::Simple { .. } => MaterialKind::Simple,
        }
    }

    pub fn uniform(&self) -> MaterialUniform {
        match self {
            Material::Pbr { params, textures } => MaterialUniform {
                color: [params.color[0], params.color[1], params.color[2], 1.0],
                params_a: [params.attenuation, params.ambient_intensity, params.gamma, params.roughness],
                params_b: [params.metallic, params.ao, 0.0, 0.0],
                flags: textures.flags().bits(),
                kind: MaterialKind::Pbr as u32,
                _padding: [0; 2],
            },
            Material::Simple { params, albedo } => MaterialUniform {
                color: params.base_color,
                params_a: [params.ambient, params.diffuse, params.specular, params.spec_strength],
                params_b: [params.spec_power, params.texture_blend, 0.0, 0.0],
                flags: if albedo.is_some() { TextureFlags::ALBEDO.bits() } else { 0 },
                kind: MaterialKind::Simple as u32,
                _padding: [0; 2],
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaterialKind {
    Pbr = 0,
    Simple = 1,
}

/// Material block as laid out in the object uniform.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct MaterialUniform {
    pub color: [f32; 4],
    pub params_a: [f32; 4],
    pub params_b: [f32; 4],
    pub flags: u32,
    pub kind: u32,
    pub _padding: [u32; 2],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_follow_present_channels() {
        let textures = PbrTextures {
            albedo: Some("albedo.jpg".into()),
            normal: Some("normal.jpg".into()),
            metallic: Some("metal.jpg".into()),
            ..Default::default()
        };
        assert_eq!(
            textures.flags(),
            TextureFlags::ALBEDO | TextureFlags::NORMAL | TextureFlags::METALLIC
        );
        assert_eq!(textures.flags().bits(), 0x07);
        assert_eq!(PbrTextures::default().flags(), TextureFlags::empty());
    }

    #[test]
    fn uniform_is_std140_sized() {
        assert_eq!(std::mem::size_of::<MaterialUniform>() % 16, 0);
        let material = Material::Simple { params: SimpleParams::default(), albedo: None };
        assert_eq!(material.uniform().kind, MaterialKind::Simple as u32);
        assert_eq!(material.uniform().flags, 0);
    }
}
