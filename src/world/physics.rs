use glam::DVec3;
use tracing::{debug, info};

use crate::config::PhysicsSettings;
use crate::world::slots::{DenseSlots, SlotKey};

/// Handle to a live [`Body`] owned by an [`Integrator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyId(SlotKey);

impl std::fmt::Display for BodyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "body#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PhysicsError {
    #[error("{0} is not a live body")]
    NotFound(BodyId),
    #[error("mass must be positive and finite, got {0}")]
    InvalidMass(f64),
    #[error("radius must be non-negative, got {0}")]
    InvalidRadius(f64),
}

/// A point mass with a collision sphere and Euler-angle spin.
///
/// Orientation and angular velocity are in degrees, matching the transform
/// the renderer consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub id: BodyId,
    pub position: DVec3,
    pub velocity: DVec3,
    pub acceleration: DVec3,
    mass: f64,
    pub radius: f64,
    pub angular_velocity: DVec3,
    pub orientation: DVec3,
    pub torque: DVec3,
    inertia: DVec3,
}

impl Body {
    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn inertia(&self) -> DVec3 {
        self.inertia
    }

    pub fn momentum(&self) -> DVec3 {
        self.velocity * self.mass
    }

    fn set_mass(&mut self, mass: f64) {
        self.mass = mass;
        self.inertia = solid_sphere_inertia(mass, self.radius);
    }
}

/// Diagonal inertia of a solid sphere, `2/5 m r²` on every axis.
fn solid_sphere_inertia(mass: f64, radius: f64) -> DVec3 {
    DVec3::splat(0.4 * mass * radius * radius)
}

/// Tunables of the step. None of these are SI values; they are calibrated
/// for the scene scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsParams {
    pub gravitational_constant: f64,
    pub restitution: f64,
    pub correction_percent: f64,
    pub slop: f64,
    pub initial_spin: DVec3,
}

impl Default for PhysicsParams {
    fn default() -> Self {
        PhysicsSettings::default().into()
    }
}

impl From<PhysicsSettings> for PhysicsParams {
    fn from(settings: PhysicsSettings) -> Self {
        Self {
            gravitational_constant: settings.gravitational_constant,
            restitution: settings.restitution,
            correction_percent: settings.correction_percent,
            slop: settings.slop,
            initial_spin: DVec3::from_array(settings.initial_spin_degrees),
        }
    }
}

/// Owns every live body and advances them with pairwise gravity, impulse
/// collisions and semi-implicit Euler.
#[derive(Debug, Default)]
pub struct Integrator {
    bodies: DenseSlots<Body>,
    params: PhysicsParams,
}

impl Integrator {
    pub fn new(params: PhysicsParams) -> Self {
        Self {
            bodies: DenseSlots::new(),
            params,
        }
    }

    pub fn params(&self) -> &PhysicsParams {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut PhysicsParams {
        &mut self.params
    }

    pub fn add_body(
        &mut self,
        position: DVec3,
        velocity: DVec3,
        mass: f64,
        radius: f64,
    ) -> Result<BodyId, PhysicsError> {
        validate_mass(mass)?;
        if radius.is_nan() || radius < 0.0 {
            return Err(PhysicsError::InvalidRadius(radius));
        }
        let spin = self.params.initial_spin;
        let key = self.bodies.insert_with(|key| Body {
            id: BodyId(key),
            position,
            velocity,
            acceleration: DVec3::ZERO,
            mass,
            radius,
            angular_velocity: spin,
            orientation: DVec3::ZERO,
            torque: DVec3::ZERO,
            inertia: solid_sphere_inertia(mass, radius),
        });
        let id = BodyId(key);
        info!("Added {} (mass {}, radius {}) at {:?}", id, mass, radius, position);
        Ok(id)
    }

    pub fn remove_body(&mut self, id: BodyId) -> Result<Body, PhysicsError> {
        let body = self.bodies.remove(id.0).ok_or(PhysicsError::NotFound(id))?;
        info!("Removed {}", id);
        Ok(body)
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(id.0)
    }

    pub fn contains(&self, id: BodyId) -> bool {
        self.bodies.contains(id.0)
    }

    /// Changes the mass and recomputes the inertia that depends on it.
    pub fn set_mass(&mut self, id: BodyId, mass: f64) -> Result<(), PhysicsError> {
        validate_mass(mass)?;
        let body = self.bodies.get_mut(id.0).ok_or(PhysicsError::NotFound(id))?;
        body.set_mass(mass);
        Ok(())
    }

    pub fn set_position(&mut self, id: BodyId, position: DVec3) -> Result<(), PhysicsError> {
        let body = self.bodies.get_mut(id.0).ok_or(PhysicsError::NotFound(id))?;
        body.position = position;
        Ok(())
    }

    pub fn set_velocity(&mut self, id: BodyId, velocity: DVec3) -> Result<(), PhysicsError> {
        let body = self.bodies.get_mut(id.0).ok_or(PhysicsError::NotFound(id))?;
        body.velocity = velocity;
        Ok(())
    }

    pub fn set_angular_velocity(&mut self, id: BodyId, angular_velocity: DVec3) -> Result<(), PhysicsError> {
        let body = self.bodies.get_mut(id.0).ok_or(PhysicsError::NotFound(id))?;
        body.angular_velocity = angular_velocity;
        Ok(())
    }

    pub fn bodies(&self) -> &[Body] {
        self.bodies.as_slice()
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn total_momentum(&self) -> DVec3 {
        self.bodies().iter().map(Body::momentum).sum()
    }

    /// Advances every body by `dt`.
    ///
    /// Accelerations are cleared first, every unordered pair then resolves
    /// its collision before its gravity is accumulated, and only after all
    /// pairs are done does integration run.
    pub fn step(&mut self, dt: f64) {
        let params = self.params;
        let bodies = self.bodies.as_mut_slice();

        for body in bodies.iter_mut() {
            body.acceleration = DVec3::ZERO;
        }

        for i in 0..bodies.len() {
            let (head, tail) = bodies.split_at_mut(i + 1);
            let a = &mut head[i];
            for b in tail.iter_mut() {
                resolve_collision(a, b, &params);
                accumulate_gravity(a, b, params.gravitational_constant);
            }
        }

        for body in bodies.iter_mut() {
            integrate(body, dt);
        }

        debug!("Stepped {} bodies by {}s", bodies.len(), dt);
    }

    /// Removes every body, returning how many were dropped.
    pub fn clear(&mut self) -> usize {
        let mut removed = 0;
        self.bodies.drain_each(|_, _| removed += 1);
        removed
    }
}

fn validate_mass(mass: f64) -> Result<(), PhysicsError> {
    if mass > 0.0 && mass.is_finite() {
        Ok(())
    } else {
        Err(PhysicsError::InvalidMass(mass))
    }
}

fn accumulate_gravity(a: &mut Body, b: &mut Body, g: f64) {
    let offset = b.position - a.position;
    let distance = offset.length();
    // Coincident centres have no direction to pull along.
    if distance == 0.0 {
        return;
    }
    let magnitude = g * a.mass * b.mass / (distance * distance);
    let force = offset / distance * magnitude;
    a.acceleration += force / a.mass;
    b.acceleration -= force / b.mass;
}

fn resolve_collision(a: &mut Body, b: &mut Body, params: &PhysicsParams) {
    let offset = b.position - a.position;
    let distance = offset.length();
    let reach = a.radius + b.radius;
    if distance >= reach {
        return;
    }
    let normal = if distance == 0.0 { DVec3::X } else { offset / distance };

    let closing = (b.velocity - a.velocity).dot(normal);
    if closing > 0.0 {
        return;
    }

    let inv_a = 1.0 / a.mass;
    let inv_b = 1.0 / b.mass;
    let impulse = -(1.0 + params.restitution) * closing / (inv_a + inv_b);
    a.velocity -= normal * (impulse * inv_a);
    b.velocity += normal * (impulse * inv_b);

    let penetration = reach - distance;
    if penetration > 0.0 {
        let depth = (penetration - params.slop).max(0.0) / (inv_a + inv_b);
        let correction = normal * (depth * params.correction_percent);
        a.position -= correction * inv_a;
        b.position += correction * inv_b;
    }
}

fn integrate(body: &mut Body, dt: f64) {
    body.velocity += body.acceleration * dt;
    body.position += body.velocity * dt;

    // A point mass has no rotational inertia to divide by.
    let spin_up = DVec3::select(body.inertia.cmpgt(DVec3::ZERO), body.torque / body.inertia, DVec3::ZERO);
    body.angular_velocity += spin_up * dt;
    body.orientation += body.angular_velocity * dt;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(g: f64) -> PhysicsParams {
        PhysicsParams {
            gravitational_constant: g,
            restitution: 0.8,
            correction_percent: 0.8,
            slop: 0.01,
            initial_spin: DVec3::ZERO,
        }
    }

    #[test]
    fn add_body_rejects_non_positive_mass() {
        let mut physics = Integrator::new(params(1.0));
        assert_eq!(
            physics.add_body(DVec3::ZERO, DVec3::ZERO, 0.0, 1.0),
            Err(PhysicsError::InvalidMass(0.0))
        );
        assert!(physics.add_body(DVec3::ZERO, DVec3::ZERO, -2.0, 1.0).is_err());
        assert!(physics.add_body(DVec3::ZERO, DVec3::ZERO, 1.0, -1.0).is_err());
        assert!(physics.is_empty());
    }

    #[test]
    fn new_body_has_sphere_inertia_and_zero_acceleration() {
        let mut physics = Integrator::new(params(1.0));
        let id = physics.add_body(DVec3::ONE, DVec3::X, 5.0, 2.0).unwrap();
        let body = physics.body(id).unwrap();
        assert_eq!(body.acceleration, DVec3::ZERO);
        assert!((body.inertia().x - 8.0).abs() < 1e-12);
    }

    #[test]
    fn remove_unknown_body_is_not_found_and_leaves_others_alone() {
        let mut physics = Integrator::new(params(1.0));
        let a = physics.add_body(DVec3::ZERO, DVec3::ZERO, 1.0, 1.0).unwrap();
        let b = physics.add_body(DVec3::X * 5.0, DVec3::ZERO, 2.0, 1.0).unwrap();
        physics.remove_body(a).unwrap();

        assert_eq!(physics.remove_body(a), Err(PhysicsError::NotFound(a)));
        assert_eq!(physics.len(), 1);
        assert_eq!(physics.body(b).unwrap().mass(), 2.0);
    }

    #[test]
    fn gravity_obeys_third_law() {
        let mut physics = Integrator::new(params(1.0));
        let a = physics.add_body(DVec3::ZERO, DVec3::ZERO, 3.0, 0.1).unwrap();
        let b = physics.add_body(DVec3::new(4.0, 0.0, 0.0), DVec3::ZERO, 1.0, 0.1).unwrap();
        physics.step(0.016);

        let a = physics.body(a).unwrap();
        let b = physics.body(b).unwrap();
        let net = a.acceleration * a.mass() + b.acceleration * b.mass();
        assert!(net.length() < 1e-12);
        // G * m_b / d² pulls a toward +x.
        assert!((a.acceleration.x - 1.0 / 16.0).abs() < 1e-12);
    }

    #[test]
    fn coincident_bodies_do_not_produce_nan() {
        let mut physics = Integrator::new(params(1.0));
        let a = physics.add_body(DVec3::ONE, DVec3::ZERO, 1.0, 1.0).unwrap();
        let b = physics.add_body(DVec3::ONE, DVec3::ZERO, 1.0, 1.0).unwrap();
        physics.step(0.016);

        for id in [a, b] {
            let body = physics.body(id).unwrap();
            assert!(body.acceleration.is_finite());
            assert!(body.position.is_finite());
        }
    }

    #[test]
    fn separating_bodies_are_not_bounced() {
        let mut physics = Integrator::new(params(0.0));
        let a = physics.add_body(DVec3::new(-0.5, 0.0, 0.0), -DVec3::X, 1.0, 1.0).unwrap();
        let b = physics.add_body(DVec3::new(0.5, 0.0, 0.0), DVec3::X, 1.0, 1.0).unwrap();
        physics.step(0.01);

        assert_eq!(physics.body(a).unwrap().velocity, -DVec3::X);
        assert_eq!(physics.body(b).unwrap().velocity, DVec3::X);
    }

    #[test]
    fn head_on_collision_scales_closing_speed_by_restitution() {
        let mut physics = Integrator::new(params(0.0));
        let a = physics.add_body(DVec3::new(-0.9, 0.0, 0.0), DVec3::X, 1.0, 1.0).unwrap();
        let b = physics.add_body(DVec3::new(0.9, 0.0, 0.0), -DVec3::X, 1.0, 1.0).unwrap();
        let before = (physics.body(b).unwrap().velocity - physics.body(a).unwrap().velocity).x;
        physics.step(0.001);
        let after = (physics.body(b).unwrap().velocity - physics.body(a).unwrap().velocity).x;

        assert!((after - 0.8 * -before).abs() < 1e-9);
        assert!(physics.total_momentum().length() < 1e-12);
    }

    #[test]
    fn overlap_is_corrected_along_the_normal() {
        let mut physics = Integrator::new(params(0.0));
        let a = physics.add_body(DVec3::new(-0.9, 0.0, 0.0), DVec3::X, 1.0, 1.0).unwrap();
        let b = physics.add_body(DVec3::new(0.9, 0.0, 0.0), -DVec3::X, 1.0, 1.0).unwrap();
        physics.step(0.0);

        // (0.2 - 0.01) / 2 * 0.8 per body.
        let pushed = 0.076;
        assert!((physics.body(a).unwrap().position.x - (-0.9 - pushed)).abs() < 1e-9);
        assert!((physics.body(b).unwrap().position.x - (0.9 + pushed)).abs() < 1e-9);
    }

    #[test]
    fn resting_overlap_is_pushed_apart() {
        let mut physics = Integrator::new(params(0.0));
        let a = physics.add_body(DVec3::ZERO, DVec3::ZERO, 1.0, 1.0).unwrap();
        let b = physics.add_body(DVec3::new(0.5, 0.0, 0.0), DVec3::ZERO, 1.0, 1.0).unwrap();
        for _ in 0..10 {
            physics.step(0.016);
        }

        let gap = physics.body(b).unwrap().position.x - physics.body(a).unwrap().position.x;
        assert!(gap > 1.9, "gap {gap}");
        assert_eq!(physics.body(a).unwrap().velocity, DVec3::ZERO);
    }

    #[test]
    fn stacked_bodies_separate_along_x() {
        let mut physics = Integrator::new(params(0.0));
        let a = physics.add_body(DVec3::ONE, DVec3::ZERO, 1.0, 1.0).unwrap();
        let b = physics.add_body(DVec3::ONE, DVec3::ZERO, 1.0, 1.0).unwrap();
        physics.step(0.016);

        let offset = physics.body(b).unwrap().position - physics.body(a).unwrap().position;
        assert!(offset.x > 0.0);
        assert_eq!(offset.y, 0.0);
    }

    #[test]
    fn set_mass_updates_inertia() {
        let mut physics = Integrator::new(params(1.0));
        let id = physics.add_body(DVec3::ZERO, DVec3::ZERO, 1.0, 1.0).unwrap();
        physics.set_mass(id, 10.0).unwrap();
        assert!((physics.body(id).unwrap().inertia().y - 4.0).abs() < 1e-12);
        assert!(physics.set_mass(id, 0.0).is_err());
    }

    #[test]
    fn spin_integrates_orientation() {
        let mut physics = Integrator::new(PhysicsParams {
            initial_spin: DVec3::new(0.0, 9.0, 0.0),
            ..params(0.0)
        });
        let id = physics.add_body(DVec3::ZERO, DVec3::ZERO, 1.0, 1.0).unwrap();
        physics.step(0.5);
        assert!((physics.body(id).unwrap().orientation.y - 4.5).abs() < 1e-12);
    }

    #[test]
    fn step_is_deterministic() {
        let build = || {
            let mut physics = Integrator::new(params(1.0));
            physics.add_body(DVec3::ZERO, DVec3::new(0.1, 0.0, 0.0), 1.0, 0.5).unwrap();
            physics.add_body(DVec3::new(2.0, 0.5, 0.0), DVec3::ZERO, 2.0, 0.5).unwrap();
            physics.add_body(DVec3::new(-1.0, 1.0, 1.0), DVec3::ZERO, 0.5, 0.5).unwrap();
            for _ in 0..200 {
                physics.step(0.016);
            }
            physics.bodies().to_vec()
        };
        assert_eq!(build(), build());
    }
}
