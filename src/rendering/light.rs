use glam::Vec3;
use bytemuck::{Pod, Zeroable};

pub const MAX_LIGHTS: usize = 4;

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct LightUniform {
    pub position: [f32; 3],
    // Due to uniforms requiring 16 byte alignment, we need to add some padding.
    pub _padding: u32,
    pub color: [f32; 3],
    pub _padding2: u32,
}

/// Every light the shaders see in one frame, plus the camera position for
/// specular terms.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct LightsUniform {
    pub lights: [LightUniform; MAX_LIGHTS],
    pub count: u32,
    pub _padding: [u32; 3],
}

#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    pub position: Vec3,
    pub color: Vec3,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 1.0, 3.0),
            color: Vec3::ONE,
        }
    }
}

impl Light {
    pub fn to_uniform(&self) -> LightUniform {
        LightUniform {
            position: self.position.to_array(),
            _padding: 0,
            color: self.color.to_array(),
            _padding2: 0,
        }
    }
}

/// Packs up to [`MAX_LIGHTS`] lights; extras are ignored.
pub fn pack_lights(lights: &[Light]) -> LightsUniform {
    let mut uniform = LightsUniform::zeroed();
    for (slot, light) in uniform.lights.iter_mut().zip(lights) {
        *slot = light.to_uniform();
    }
    uniform.count = lights.len().min(MAX_LIGHTS) as u32;
    uniform
}
