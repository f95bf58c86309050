use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::assets::material::{Material, MaterialKind};
use crate::assets::mesh::{pbr_config, skybox_config, skybox_positions, with_tangents};
use crate::rendering::buffer::{MeshAllocator, MeshResource, RenderError};
use crate::rendering::light::Light;
use crate::rendering::scene::{
    ObjectKind, ObjectRecord, ObjectSpec, RenderResource, ResourceId, SceneError, Skybox,
};
use crate::rendering::transform::Transform;
use crate::world::physics::Integrator;
use crate::world::slots::DenseSlots;

/// Authoritative mapping from logical objects to their body and render
/// resource.
///
/// Objects are addressed by logical index, which is simply their position
/// in a dense list: deleting one shifts every later object down by one and
/// leaves no gap. Bodies and render resources are referenced through
/// generation-checked handles, so that shift never has to touch them.
pub struct SceneRegistry<A: MeshAllocator> {
    allocator: A,
    objects: Vec<ObjectRecord>,
    resources: DenseSlots<RenderResource<A::Mesh>>,
    counters: HashMap<ObjectKind, u32>,
    lights: Vec<Light>,
    skybox: Option<Skybox<A::Mesh>>,
}

impl<A: MeshAllocator> SceneRegistry<A> {
    pub fn new(allocator: A) -> Self {
        Self {
            allocator,
            objects: Vec::new(),
            resources: DenseSlots::new(),
            counters: HashMap::new(),
            lights: Vec::new(),
            skybox: None,
        }
    }

    pub fn allocator(&self) -> &A {
        &self.allocator
    }

    /// Creates the object's render resource and, when asked for, its body.
    /// Either everything is registered or nothing is.
    pub fn add_object(&mut self, physics: &mut Integrator, spec: ObjectSpec) -> Result<usize, SceneError> {
        let mut mesh = self.allocate_mesh(&spec)?;

        let body = match &spec.body {
            Some(body) => {
                let position = spec.transform.position().as_dvec3();
                match physics.add_body(position, body.velocity, body.mass, body.radius) {
                    Ok(id) => Some(id),
                    Err(e) => {
                        mesh.cleanup();
                        return Err(e.into());
                    }
                }
            }
            None => None,
        };

        let resource = self.resources.insert(RenderResource {
            mesh,
            material: spec.material,
            transform: spec.transform,
        });

        let counter = self.counters.entry(spec.kind).or_insert(0);
        *counter += 1;
        let name = format!("{} {}", spec.kind.label(), counter);

        let index = self.objects.len();
        info!("Added object {} '{}' ({:?}, {:?})", index, name, body, resource);
        self.objects.push(ObjectRecord {
            kind: spec.kind,
            name,
            body,
            resource: Some(ResourceId(resource)),
        });
        Ok(index)
    }

    fn allocate_mesh(&mut self, spec: &ObjectSpec) -> Result<A::Mesh, RenderError> {
        let data = spec.mesh.build();
        match spec.material_kind() {
            MaterialKind::Pbr => {
                let vertices = with_tangents(&data.flattened()?);
                let config = pbr_config(vertices.len() as u32);
                self.allocator.create_mesh_buffer(&config, bytemuck::cast_slice(&vertices), None)
            }
            MaterialKind::Simple => {
                let config = data.simple_config();
                self.allocator.create_mesh_buffer(
                    &config,
                    bytemuck::cast_slice(&data.vertices),
                    data.indices.as_deref(),
                )
            }
        }
    }

    /// Frees the object's buffers, removes its body and collapses its slot.
    /// Objects after `index` move down by one.
    pub fn delete_object(&mut self, physics: &mut Integrator, index: usize) -> Result<ObjectRecord, SceneError> {
        if index >= self.objects.len() {
            return Err(SceneError::NotFound(index));
        }
        let record = self.objects.remove(index);

        if let Some(id) = record.resource {
            match self.resources.remove(id.0) {
                Some(mut resource) => resource.mesh.cleanup(),
                None => warn!("Object '{}' referenced dead {}", record.name, id),
            }
        }
        if let Some(id) = record.body {
            if let Err(e) = physics.remove_body(id) {
                warn!("Object '{}': {}", record.name, e);
            }
        }

        info!("Deleted object {} '{}', {} remain", index, record.name, self.objects.len());
        Ok(record)
    }

    /// Copies body position and orientation into the transform of each
    /// physics-backed object. Returns how many transforms were written.
    pub fn sync_transforms(&mut self, physics: &Integrator) -> usize {
        let mut synced = 0;
        for record in &self.objects {
            let (Some(body_id), Some(resource_id)) = (record.body, record.resource) else {
                continue;
            };
            let Some(body) = physics.body(body_id) else {
                warn!("Object '{}' lost {}, skipping sync", record.name, body_id);
                continue;
            };
            if let Some(resource) = self.resources.get_mut(resource_id.0) {
                resource
                    .transform
                    .set_position_rotation(body.position.as_vec3(), body.orientation.as_vec3());
                synced += 1;
            }
        }
        debug!("Synced {} transforms", synced);
        synced
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn objects(&self) -> &[ObjectRecord] {
        &self.objects
    }

    pub fn object(&self, index: usize) -> Result<&ObjectRecord, SceneError> {
        self.objects.get(index).ok_or(SceneError::NotFound(index))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.objects.iter().map(|o| o.name.as_str())
    }

    pub fn resource(&self, id: ResourceId) -> Option<&RenderResource<A::Mesh>> {
        self.resources.get(id.0)
    }

    fn resource_at(&self, index: usize) -> Result<&RenderResource<A::Mesh>, SceneError> {
        self.object(index)?
            .resource
            .and_then(|id| self.resources.get(id.0))
            .ok_or(SceneError::NotFound(index))
    }

    fn resource_at_mut(&mut self, index: usize) -> Result<&mut RenderResource<A::Mesh>, SceneError> {
        let id = self.object(index)?.resource.ok_or(SceneError::NotFound(index))?;
        self.resources.get_mut(id.0).ok_or(SceneError::NotFound(index))
    }

    pub fn transform(&self, index: usize) -> Result<&Transform, SceneError> {
        self.resource_at(index).map(|r| &r.transform)
    }

    pub fn transform_mut(&mut self, index: usize) -> Result<&mut Transform, SceneError> {
        self.resource_at_mut(index).map(|r| &mut r.transform)
    }

    pub fn material(&self, index: usize) -> Result<&Material, SceneError> {
        self.resource_at(index).map(|r| &r.material)
    }

    pub fn material_mut(&mut self, index: usize) -> Result<&mut Material, SceneError> {
        self.resource_at_mut(index).map(|r| &mut r.material)
    }

    /// Render resources in logical order, for the backend to draw.
    pub fn renderables(&self) -> impl Iterator<Item = (ResourceId, &RenderResource<A::Mesh>)> {
        self.objects.iter().filter_map(move |record| {
            let id = record.resource?;
            self.resources.get(id.0).map(|resource| (id, resource))
        })
    }

    pub fn live_meshes(&self) -> usize {
        self.resources.len() + usize::from(self.skybox.is_some())
    }

    pub fn add_light(&mut self, light: Light) -> usize {
        self.lights.push(light);
        self.lights.len() - 1
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn lights_mut(&mut self) -> &mut [Light] {
        &mut self.lights
    }

    /// Builds the skybox cube. Any previous skybox is released first.
    pub fn set_skybox(&mut self, texture_dir: impl Into<String>) -> Result<(), SceneError> {
        let positions = skybox_positions();
        let config = skybox_config(positions.len() as u32);
        let mesh = self
            .allocator
            .create_mesh_buffer(&config, bytemuck::cast_slice(&positions), None)?;
        if let Some(mut old) = self.skybox.replace(Skybox { mesh, texture_dir: texture_dir.into() }) {
            old.mesh.cleanup();
        }
        Ok(())
    }

    pub fn skybox(&self) -> Option<&Skybox<A::Mesh>> {
        self.skybox.as_ref()
    }

    /// Releases every render resource, then every body the objects owned.
    pub fn cleanup(&mut self, physics: &mut Integrator) {
        self.resources.drain_each(|_, mut resource| resource.mesh.cleanup());
        if let Some(mut skybox) = self.skybox.take() {
            skybox.mesh.cleanup();
        }
        for record in self.objects.drain(..) {
            if let Some(id) = record.body {
                if let Err(e) = physics.remove_body(id) {
                    warn!("Object '{}': {}", record.name, e);
                }
            }
        }
        self.lights.clear();
        info!("Scene cleaned up");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::mesh::{MeshData, Vertex};
    use crate::rendering::buffer::HeadlessAllocator;
    use crate::rendering::scene::MeshSource;
    use crate::world::physics::PhysicsParams;
    use bytemuck::Zeroable;
    use glam::{DVec3, Vec3};

    fn setup() -> (SceneRegistry<HeadlessAllocator>, Integrator) {
        (SceneRegistry::new(HeadlessAllocator::new()), Integrator::new(PhysicsParams::default()))
    }

    #[test]
    fn names_come_from_per_kind_counters() {
        let (mut scene, mut physics) = setup();
        scene.add_object(&mut physics, ObjectSpec::planet(Vec3::ZERO, DVec3::ZERO)).unwrap();
        scene.add_object(&mut physics, ObjectSpec::cube(Vec3::X)).unwrap();
        scene.add_object(&mut physics, ObjectSpec::planet(Vec3::Y * 4.0, DVec3::ZERO)).unwrap();
        scene.delete_object(&mut physics, 2).unwrap();
        scene.add_object(&mut physics, ObjectSpec::planet(Vec3::Z * 4.0, DVec3::ZERO)).unwrap();

        let names: Vec<_> = scene.names().collect();
        assert_eq!(names, vec!["Planet 1", "Cube 1", "Planet 3"]);
    }

    #[test]
    fn pbr_and_simple_objects_get_their_layouts() {
        let (mut scene, mut physics) = setup();
        let planet = scene.add_object(&mut physics, ObjectSpec::planet(Vec3::ZERO, DVec3::ZERO)).unwrap();
        let cube = scene.add_object(&mut physics, ObjectSpec::cube(Vec3::X)).unwrap();

        let planet_mesh = &scene.resource(scene.object(planet).unwrap().resource.unwrap()).unwrap().mesh;
        assert_eq!(planet_mesh.index_count(), None);
        assert_eq!(planet_mesh.vertex_count(), 32 * 64 * 6);

        let cube_mesh = &scene.resource(scene.object(cube).unwrap().resource.unwrap()).unwrap().mesh;
        assert_eq!(cube_mesh.vertex_count(), 36);
        assert!(scene.object(cube).unwrap().body.is_none());
        assert_eq!(physics.len(), 1);
    }

    #[test]
    fn failed_body_registration_leaves_nothing_behind() {
        let (mut scene, mut physics) = setup();
        let mut spec = ObjectSpec::planet(Vec3::ZERO, DVec3::ZERO);
        if let Some(body) = spec.body.as_mut() {
            body.mass = 0.0;
        }
        assert!(matches!(
            scene.add_object(&mut physics, spec),
            Err(SceneError::Physics(_))
        ));
        assert_eq!(scene.object_count(), 0);
        assert_eq!(scene.allocator().live_meshes(), 0);
        assert!(physics.is_empty());
    }

    #[test]
    fn bad_index_in_pbr_mesh_is_a_resource_error() {
        let (mut scene, mut physics) = setup();
        let mut spec = ObjectSpec::planet(Vec3::ZERO, DVec3::ZERO);
        spec.mesh = MeshSource::Data(MeshData {
            vertices: vec![Vertex::zeroed(); 3],
            indices: Some(vec![0, 1, 7]),
        });

        assert_eq!(
            scene.add_object(&mut physics, spec),
            Err(SceneError::Resource(RenderError::IndexOutOfRange { index: 7, vertex_count: 3 }))
        );
        assert_eq!(scene.object_count(), 0);
        assert_eq!(scene.allocator().live_meshes(), 0);
        assert!(physics.is_empty());
    }

    #[test]
    fn cleanup_survives_bodies_removed_behind_its_back() {
        let (mut scene, mut physics) = setup();
        let index = scene.add_object(&mut physics, ObjectSpec::planet(Vec3::ZERO, DVec3::ZERO)).unwrap();
        scene.add_object(&mut physics, ObjectSpec::planet(Vec3::X * 4.0, DVec3::ZERO)).unwrap();
        let body = scene.object(index).unwrap().body.unwrap();
        physics.remove_body(body).unwrap();

        scene.cleanup(&mut physics);
        assert_eq!(scene.object_count(), 0);
        assert_eq!(scene.allocator().live_meshes(), 0);
        assert!(physics.is_empty());
    }

    #[test]
    fn delete_out_of_range_is_not_found() {
        let (mut scene, mut physics) = setup();
        assert_eq!(
            scene.delete_object(&mut physics, 0),
            Err(SceneError::NotFound(0))
        );
    }

    #[test]
    fn sync_writes_body_state_into_transform() {
        let (mut scene, mut physics) = setup();
        let index = scene
            .add_object(&mut physics, ObjectSpec::planet(Vec3::ZERO, DVec3::new(1.0, 0.0, 0.0)))
            .unwrap();
        physics.step(0.5);
        assert_eq!(scene.sync_transforms(&physics), 1);

        let transform = scene.transform(index).unwrap();
        assert!((transform.position().x - 0.5).abs() < 1e-6);
        assert!((transform.rotation().y - 4.5).abs() < 1e-5);
        assert_eq!(transform.matrix().w_axis.x, transform.position().x);
    }

    #[test]
    fn skybox_is_replaced_and_released() {
        let (mut scene, mut physics) = setup();
        scene.set_skybox("space").unwrap();
        scene.set_skybox("space").unwrap();
        assert_eq!(scene.allocator().live_meshes(), 1);

        scene.add_object(&mut physics, ObjectSpec::cube(Vec3::ZERO)).unwrap();
        scene.cleanup(&mut physics);
        assert_eq!(scene.allocator().live_meshes(), 0);
        assert!(scene.skybox().is_none());
    }
}
