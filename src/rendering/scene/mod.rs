pub mod graph;

pub use graph::SceneRegistry;

use std::fmt;

use glam::{DVec3, Vec3};

use crate::assets::material::{Material, MaterialKind, PbrParams, PbrTextures, SimpleParams};
use crate::assets::mesh::MeshData;
use crate::rendering::buffer::RenderError;
use crate::rendering::transform::Transform;
use crate::world::physics::{BodyId, PhysicsError};
use crate::world::slots::SlotKey;

/// Handle to a live render resource inside a [`SceneRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceId(pub(crate) SlotKey);

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "resource#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SceneError {
    #[error("no object at index {0}")]
    NotFound(usize),
    #[error("object at index {0} has no physics body")]
    NoBody(usize),
    #[error(transparent)]
    Physics(#[from] PhysicsError),
    #[error("resource creation failed: {0}")]
    Resource(#[from] RenderError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Planet,
    Sphere,
    Cube,
}

impl ObjectKind {
    pub const ALL: [ObjectKind; 3] = [ObjectKind::Planet, ObjectKind::Sphere, ObjectKind::Cube];

    pub fn label(&self) -> &'static str {
        match self {
            ObjectKind::Planet => "Planet",
            ObjectKind::Sphere => "Sphere",
            ObjectKind::Cube => "Cube",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MeshSource {
    Sphere { stacks: u32, slices: u32 },
    Cube,
    Data(MeshData),
}

impl MeshSource {
    pub fn build(&self) -> MeshData {
        match self {
            MeshSource::Sphere { stacks, slices } => MeshData::uv_sphere(*stacks, *slices),
            MeshSource::Cube => MeshData::cube(),
            MeshSource::Data(data) => data.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BodySpec {
    pub velocity: DVec3,
    pub mass: f64,
    pub radius: f64,
}

/// What an add request asks for. The body, if any, starts at the transform
/// position.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSpec {
    pub kind: ObjectKind,
    pub transform: Transform,
    pub mesh: MeshSource,
    pub material: Material,
    pub body: Option<BodySpec>,
}

fn earth_material() -> Material {
    Material::Pbr {
        params: PbrParams::default(),
        textures: PbrTextures {
            albedo: Some("pbr_earth/albedo_map.jpg".to_string()),
            normal: Some("pbr_earth/normal_map.jpg".to_string()),
            metallic: Some("pbr_earth/metal_map.jpg".to_string()),
            ..Default::default()
        },
    }
}

impl ObjectSpec {
    pub fn planet(position: Vec3, velocity: DVec3) -> Self {
        Self {
            kind: ObjectKind::Planet,
            transform: Transform::from_position(position),
            mesh: MeshSource::Sphere { stacks: 32, slices: 64 },
            material: earth_material(),
            body: Some(BodySpec { velocity, mass: 1.0, radius: 1.0 }),
        }
    }

    pub fn sphere(position: Vec3) -> Self {
        Self {
            kind: ObjectKind::Sphere,
            transform: Transform::from_position(position),
            mesh: MeshSource::Sphere { stacks: 32, slices: 64 },
            material: earth_material(),
            body: None,
        }
    }

    pub fn cube(position: Vec3) -> Self {
        Self {
            kind: ObjectKind::Cube,
            transform: Transform::from_position(position),
            mesh: MeshSource::Cube,
            material: Material::Simple { params: SimpleParams::default(), albedo: None },
            body: None,
        }
    }

    pub fn for_kind(kind: ObjectKind, position: Vec3) -> Self {
        match kind {
            ObjectKind::Planet => Self::planet(position, DVec3::splat(0.05)),
            ObjectKind::Sphere => Self::sphere(position),
            ObjectKind::Cube => Self::cube(position),
        }
    }

    pub fn material_kind(&self) -> MaterialKind {
        self.material.kind()
    }
}

/// GPU geometry plus the material and transform it is drawn with.
pub struct RenderResource<M> {
    pub mesh: M,
    pub material: Material,
    pub transform: Transform,
}

/// One logical object. Its logical index is its position in the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectRecord {
    pub kind: ObjectKind,
    pub name: String,
    pub body: Option<BodyId>,
    pub resource: Option<ResourceId>,
}

/// Cube-mapped backdrop; the texture itself lives with the render backend.
pub struct Skybox<M> {
    pub mesh: M,
    pub texture_dir: String,
}
