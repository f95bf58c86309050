use glam::{DVec3, Vec3};
use photon_sandbox::rendering::buffer::{HeadlessAllocator, MeshResource};
use photon_sandbox::rendering::scene::{MeshSource, ObjectKind, ObjectSpec, SceneError, SceneRegistry};
use photon_sandbox::world::{Integrator, PhysicsParams};

fn setup() -> (SceneRegistry<HeadlessAllocator>, Integrator) {
    (
        SceneRegistry::new(HeadlessAllocator::new()),
        Integrator::new(PhysicsParams::default()),
    )
}

fn planet_at(x: f32) -> ObjectSpec {
    ObjectSpec::planet(Vec3::new(x, 0.0, 0.0), DVec3::ZERO)
}

#[test]
fn test_delete_keeps_indices_dense() {
    let (mut scene, mut physics) = setup();
    for x in [0.0, 5.0, 10.0] {
        scene.add_object(&mut physics, planet_at(x)).unwrap();
    }
    let moved = scene.object(2).unwrap().clone();

    scene.delete_object(&mut physics, 1).unwrap();

    assert_eq!(scene.object_count(), 2);
    assert_eq!(scene.object(1).unwrap(), &moved);
    let body = physics.body(moved.body.unwrap()).unwrap();
    assert_eq!(body.position, DVec3::new(10.0, 0.0, 0.0));
    assert_eq!(scene.transform(1).unwrap().position(), Vec3::new(10.0, 0.0, 0.0));
    assert!(scene.object(2).is_err());
}

#[test]
fn test_every_record_points_at_live_state() {
    let (mut scene, mut physics) = setup();
    let kinds = [ObjectKind::Planet, ObjectKind::Cube, ObjectKind::Planet, ObjectKind::Sphere, ObjectKind::Planet];
    for (i, kind) in kinds.into_iter().enumerate() {
        scene
            .add_object(&mut physics, ObjectSpec::for_kind(kind, Vec3::new(i as f32 * 4.0, 0.0, 0.0)))
            .unwrap();
    }
    scene.delete_object(&mut physics, 0).unwrap();
    scene.delete_object(&mut physics, 2).unwrap();
    scene.delete_object(&mut physics, 2).unwrap();

    assert_eq!(scene.object_count(), 2);
    for record in scene.objects() {
        let resource = scene.resource(record.resource.unwrap()).unwrap();
        if let Some(id) = record.body {
            let body = physics.body(id).unwrap();
            assert_eq!(body.position.as_vec3(), resource.transform.position());
        }
    }
    assert_eq!(physics.len(), 1);
    assert_eq!(scene.renderables().count(), 2);
    assert_eq!(scene.allocator().live_meshes(), 2);
}

#[test]
fn test_delete_frees_render_resources() {
    let (mut scene, mut physics) = setup();
    scene.add_object(&mut physics, planet_at(0.0)).unwrap();
    scene.add_object(&mut physics, planet_at(5.0)).unwrap();
    assert_eq!(scene.allocator().live_meshes(), 2);

    let removed = scene.delete_object(&mut physics, 0).unwrap();
    assert_eq!(scene.allocator().live_meshes(), 1);
    assert!(!physics.contains(removed.body.unwrap()));
    assert!(scene.resource(removed.resource.unwrap()).is_none());
}

#[test]
fn test_delete_twice_is_not_found() {
    let (mut scene, mut physics) = setup();
    scene.add_object(&mut physics, planet_at(0.0)).unwrap();
    scene.delete_object(&mut physics, 0).unwrap();
    assert_eq!(scene.delete_object(&mut physics, 0), Err(SceneError::NotFound(0)));
}

#[test]
fn test_failed_mesh_creation_is_all_or_nothing() {
    let (mut scene, mut physics) = setup();
    let mut spec = planet_at(0.0);
    spec.kind = ObjectKind::Cube;
    spec.mesh = MeshSource::Data(Default::default());

    assert!(matches!(scene.add_object(&mut physics, spec), Err(SceneError::Resource(_))));
    assert_eq!(scene.object_count(), 0);
    assert!(physics.is_empty());
    assert_eq!(scene.allocator().created_meshes(), 0);
}

#[test]
fn test_pbr_sphere_is_drawn_without_indices() {
    let (mut scene, mut physics) = setup();
    let sphere = scene
        .add_object(&mut physics, ObjectSpec::sphere(Vec3::ZERO))
        .unwrap();
    let (_, resource) = scene.renderables().next().unwrap();
    assert_eq!(resource.mesh.index_count(), None);
    assert!(scene.object(sphere).unwrap().body.is_none());
}
