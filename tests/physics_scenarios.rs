use glam::DVec3;
use photon_sandbox::world::{Integrator, PhysicsParams};

const DT: f64 = 0.016;

fn gravity_only(g: f64) -> Integrator {
    Integrator::new(PhysicsParams {
        gravitational_constant: g,
        initial_spin: DVec3::ZERO,
        ..PhysicsParams::default()
    })
}

#[test]
fn test_two_bodies_fall_together() {
    let mut physics = gravity_only(1.0);
    let a = physics.add_body(DVec3::ZERO, DVec3::ZERO, 1.0, 1.0).unwrap();
    let b = physics.add_body(DVec3::new(10.0, 0.0, 0.0), DVec3::ZERO, 1.0, 1.0).unwrap();

    let separation = |p: &Integrator| (p.body(b).unwrap().position - p.body(a).unwrap().position).length();
    let mut previous = separation(&physics);
    for _ in 0..200 {
        physics.step(DT);
        let current = separation(&physics);
        assert!(current.is_finite());
        assert!(current < previous, "separation grew: {} -> {}", previous, current);
        previous = current;

        for body in physics.bodies() {
            assert!(body.position.is_finite() && body.velocity.is_finite());
        }
        assert!(physics.total_momentum().length() < 1e-12);
    }
    assert!(previous > 2.0, "bodies should not have reached each other yet");
}

#[test]
fn test_forces_are_equal_and_opposite_every_step() {
    let mut physics = gravity_only(2.5);
    let a = physics.add_body(DVec3::new(-2.0, 1.0, 0.0), DVec3::new(0.0, 0.1, 0.0), 3.0, 0.5).unwrap();
    let b = physics.add_body(DVec3::new(4.0, -1.0, 2.0), DVec3::new(0.0, -0.1, 0.0), 1.5, 0.5).unwrap();

    for _ in 0..100 {
        physics.step(DT);
        let (a, b) = (physics.body(a).unwrap(), physics.body(b).unwrap());
        let net = a.acceleration * a.mass() + b.acceleration * b.mass();
        assert!(net.length() < 1e-9, "net internal force {:?}", net);
    }
}

#[test]
fn test_collision_reverses_approach() {
    let mut physics = gravity_only(0.0);
    let a = physics.add_body(DVec3::ZERO, DVec3::new(1.0, 0.0, 0.0), 1.0, 1.0).unwrap();
    let b = physics.add_body(DVec3::new(2.5, 0.0, 0.0), DVec3::new(-1.0, 0.0, 0.0), 1.0, 1.0).unwrap();

    for _ in 0..100 {
        physics.step(DT);
    }
    let relative = physics.body(b).unwrap().velocity - physics.body(a).unwrap().velocity;
    assert!(relative.x > 0.0);
    assert!((relative.x - 0.8 * 2.0).abs() < 1e-9);
    assert!(physics.total_momentum().length() < 1e-12);
}
