use std::collections::VecDeque;

use glam::{DVec3, Vec3};
use tracing::{debug, info, warn};

use crate::config::SandboxSettings;
use crate::rendering::buffer::MeshAllocator;
use crate::rendering::light::Light;
use crate::rendering::scene::{ObjectKind, ObjectSpec, SceneError, SceneRegistry};
use crate::world::events::{EventOutcome, SceneEvent};
use crate::world::physics::{Integrator, PhysicsParams};

/// Distance from the origin at which new objects are spawned.
const SPAWN_RADIUS: f32 = 4.0;
/// Angle between consecutive spawn points, in radians.
const SPAWN_STEP: f32 = 2.4;

/// Directory, relative to the texture root, holding the six skybox faces.
pub const SKYBOX_DIR: &str = "skybox";

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameStats {
    pub events: usize,
    pub stepped: bool,
    pub synced: usize,
}

/// Everything one simulation owns: physics, scene registry, pause state,
/// selection and the queue of pending events.
///
/// Built at start-up and torn down with [`Sandbox::shutdown`]; nothing in
/// the crate reaches this state except through a `Sandbox`.
pub struct Sandbox<A: MeshAllocator> {
    settings: SandboxSettings,
    physics: Integrator,
    scene: SceneRegistry<A>,
    paused: bool,
    selected: Option<usize>,
    pending: VecDeque<SceneEvent>,
    frames: u64,
    spawned: u32,
}

impl<A: MeshAllocator> Sandbox<A> {
    pub fn new(allocator: A, settings: SandboxSettings) -> Self {
        let params = PhysicsParams::from(settings.physics.clone());
        info!(
            "Creating sandbox: G = {}, restitution = {}, dt = {}",
            params.gravitational_constant, params.restitution, settings.simulation.fixed_dt
        );
        Self {
            paused: settings.simulation.start_paused,
            settings,
            physics: Integrator::new(params),
            scene: SceneRegistry::new(allocator),
            selected: None,
            pending: VecDeque::new(),
            frames: 0,
            spawned: 0,
        }
    }

    /// Skybox, one light and two planets drifting apart.
    pub fn seed_example_scene(&mut self) -> Result<(), SceneError> {
        self.scene.set_skybox(SKYBOX_DIR)?;
        self.scene.add_light(Light::default());
        self.scene
            .add_object(&mut self.physics, ObjectSpec::planet(Vec3::ZERO, DVec3::splat(0.05)))?;
        self.scene.add_object(
            &mut self.physics,
            ObjectSpec::planet(Vec3::new(-3.0, 0.0, 0.0), DVec3::splat(-0.05)),
        )?;
        info!("Seeded example scene with {} objects", self.scene.object_count());
        Ok(())
    }

    pub fn settings(&self) -> &SandboxSettings {
        &self.settings
    }

    pub fn physics(&self) -> &Integrator {
        &self.physics
    }

    pub fn scene(&self) -> &SceneRegistry<A> {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut SceneRegistry<A> {
        &mut self.scene
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn push_event(&mut self, event: SceneEvent) {
        debug!("Queued {:?}", event);
        self.pending.push_back(event);
    }

    pub fn pending_events(&self) -> usize {
        self.pending.len()
    }

    /// Applies queued events in arrival order. Failures are logged and do
    /// not stop later events.
    pub fn apply_pending(&mut self) -> usize {
        let mut applied = 0;
        while let Some(event) = self.pending.pop_front() {
            match self.apply_event(event.clone()) {
                Ok(outcome) => debug!("{:?} -> {:?}", event, outcome),
                Err(e) => warn!("Dropped {:?}: {}", event, e),
            }
            applied += 1;
        }
        applied
    }

    pub fn apply_event(&mut self, event: SceneEvent) -> Result<EventOutcome, SceneError> {
        match event {
            SceneEvent::AddObject(kind) => self.add_object(kind).map(EventOutcome::Added),
            SceneEvent::DeleteObject(index) => self.delete_object(index).map(|_| EventOutcome::Deleted(index)),
            SceneEvent::DeleteSelected => match self.selected {
                Some(index) => self.delete_object(index).map(|_| EventOutcome::Deleted(index)),
                None => Ok(EventOutcome::Ignored),
            },
            SceneEvent::SetMass { index, mass } => {
                self.set_mass(index, mass).map(|_| EventOutcome::Updated(index))
            }
            SceneEvent::ScaleSelectedMass(factor) => match self.selected {
                Some(index) => {
                    let mass = self.mass(index)? * factor;
                    self.set_mass(index, mass).map(|_| EventOutcome::Updated(index))
                }
                None => Ok(EventOutcome::Ignored),
            },
            SceneEvent::SetPosition { index, position } => {
                self.set_position(index, position).map(|_| EventOutcome::Updated(index))
            }
            SceneEvent::Select(selection) => {
                self.select(selection)?;
                Ok(EventOutcome::Selected(self.selected))
            }
            SceneEvent::SelectNext => {
                let count = self.scene.object_count();
                self.selected = match (self.selected, count) {
                    (_, 0) => None,
                    (Some(index), _) => Some((index + 1) % count),
                    (None, _) => Some(0),
                };
                Ok(EventOutcome::Selected(self.selected))
            }
            SceneEvent::TogglePause => {
                self.paused = !self.paused;
                info!("Simulation {}", if self.paused { "paused" } else { "resumed" });
                Ok(EventOutcome::Paused(self.paused))
            }
        }
    }

    /// One frame: apply events, step physics unless paused, then copy body
    /// state into transforms so the renderer sees the post-step scene.
    pub fn frame(&mut self, dt: f64) -> FrameStats {
        let events = self.apply_pending();
        let stepped = !self.paused;
        if stepped {
            self.physics.step(dt);
        }
        let synced = self.scene.sync_transforms(&self.physics);
        self.frames += 1;
        FrameStats { events, stepped, synced }
    }

    /// Runs one frame with the configured fixed tick.
    pub fn tick(&mut self) -> FrameStats {
        self.frame(self.settings.simulation.fixed_dt)
    }

    pub fn add_object(&mut self, kind: ObjectKind) -> Result<usize, SceneError> {
        let position = self.spawn_position();
        let index = self.scene.add_object(&mut self.physics, ObjectSpec::for_kind(kind, position))?;
        self.spawned += 1;
        Ok(index)
    }

    fn spawn_position(&self) -> Vec3 {
        let angle = (self.spawned + 1) as f32 * SPAWN_STEP;
        Vec3::new(angle.cos(), 0.0, angle.sin()) * SPAWN_RADIUS
    }

    /// Deletes the object, keeping the selection on the same object where it
    /// survives.
    pub fn delete_object(&mut self, index: usize) -> Result<(), SceneError> {
        self.scene.delete_object(&mut self.physics, index)?;
        self.selected = match self.selected {
            Some(selected) if selected == index => None,
            Some(selected) if selected > index => Some(selected - 1),
            other => other,
        };
        Ok(())
    }

    pub fn select(&mut self, selection: Option<usize>) -> Result<(), SceneError> {
        if let Some(index) = selection {
            self.scene.object(index)?;
        }
        self.selected = selection;
        Ok(())
    }

    pub fn mass(&self, index: usize) -> Result<f64, SceneError> {
        let id = self.scene.object(index)?.body.ok_or(SceneError::NoBody(index))?;
        self.physics
            .body(id)
            .map(|body| body.mass())
            .ok_or(SceneError::NoBody(index))
    }

    pub fn set_mass(&mut self, index: usize, mass: f64) -> Result<(), SceneError> {
        let id = self.scene.object(index)?.body.ok_or(SceneError::NoBody(index))?;
        self.physics.set_mass(id, mass)?;
        info!("Object {} mass set to {}", index, mass);
        Ok(())
    }

    /// Moves the object. A physics-backed object's body is teleported too,
    /// keeping its velocity.
    pub fn set_position(&mut self, index: usize, position: Vec3) -> Result<(), SceneError> {
        if let Some(id) = self.scene.object(index)?.body {
            self.physics.set_position(id, position.as_dvec3())?;
        }
        self.scene.transform_mut(index)?.set_position(position);
        Ok(())
    }

    /// Releases every render resource, then every body.
    pub fn shutdown(&mut self) {
        self.pending.clear();
        self.scene.cleanup(&mut self.physics);
        let orphans = self.physics.clear();
        if orphans > 0 {
            warn!("{} bodies had no owning object at shutdown", orphans);
        }
        self.selected = None;
        info!("Sandbox shut down after {} frames", self.frames);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::buffer::HeadlessAllocator;

    fn sandbox() -> Sandbox<HeadlessAllocator> {
        Sandbox::new(HeadlessAllocator::new(), SandboxSettings::default())
    }

    #[test]
    fn example_scene_matches_layout() {
        let mut sandbox = sandbox();
        sandbox.seed_example_scene().unwrap();
        assert_eq!(sandbox.scene().object_count(), 2);
        assert_eq!(sandbox.physics().len(), 2);
        assert_eq!(sandbox.scene().lights().len(), 1);
        assert!(sandbox.scene().skybox().is_some());
        assert_eq!(sandbox.scene().transform(1).unwrap().position(), Vec3::new(-3.0, 0.0, 0.0));
    }

    #[test]
    fn paused_frames_do_not_step() {
        let mut sandbox = sandbox();
        sandbox.seed_example_scene().unwrap();
        sandbox.push_event(SceneEvent::TogglePause);
        let stats = sandbox.frame(0.016);
        assert!(!stats.stepped);
        assert_eq!(stats.events, 1);
        assert_eq!(sandbox.scene().transform(0).unwrap().position(), Vec3::ZERO);
    }

    #[test]
    fn events_apply_in_arrival_order() {
        let mut sandbox = sandbox();
        sandbox.push_event(SceneEvent::AddObject(ObjectKind::Planet));
        sandbox.push_event(SceneEvent::AddObject(ObjectKind::Cube));
        sandbox.push_event(SceneEvent::DeleteObject(0));
        sandbox.frame(0.016);
        assert_eq!(sandbox.pending_events(), 0);
        let names: Vec<_> = sandbox.scene().names().collect();
        assert_eq!(names, vec!["Cube 1"]);
        assert!(sandbox.physics().is_empty());
    }

    #[test]
    fn selection_follows_deletions() {
        let mut sandbox = sandbox();
        for _ in 0..3 {
            sandbox.add_object(ObjectKind::Planet).unwrap();
        }
        sandbox.select(Some(2)).unwrap();
        sandbox.delete_object(0).unwrap();
        assert_eq!(sandbox.selected(), Some(1));
        sandbox.apply_event(SceneEvent::DeleteSelected).unwrap();
        assert_eq!(sandbox.selected(), None);
        assert_eq!(sandbox.scene().object_count(), 1);
        assert_eq!(sandbox.select(Some(5)), Err(SceneError::NotFound(5)));
    }

    #[test]
    fn mass_changes_need_a_body() {
        let mut sandbox = sandbox();
        let planet = sandbox.add_object(ObjectKind::Planet).unwrap();
        let cube = sandbox.add_object(ObjectKind::Cube).unwrap();
        sandbox.set_mass(planet, 4.0).unwrap();
        assert_eq!(sandbox.mass(planet), Ok(4.0));
        assert_eq!(sandbox.set_mass(cube, 4.0), Err(SceneError::NoBody(cube)));
        assert!(matches!(sandbox.set_mass(planet, 0.0), Err(SceneError::Physics(_))));

        sandbox.select(Some(planet)).unwrap();
        sandbox.apply_event(SceneEvent::ScaleSelectedMass(0.5)).unwrap();
        assert_eq!(sandbox.mass(planet), Ok(2.0));
    }

    #[test]
    fn set_position_teleports_the_body() {
        let mut sandbox = sandbox();
        let index = sandbox.add_object(ObjectKind::Planet).unwrap();
        let target = Vec3::new(1.0, 2.0, 3.0);
        sandbox.set_position(index, target).unwrap();

        let id = sandbox.scene().object(index).unwrap().body.unwrap();
        assert_eq!(sandbox.physics().body(id).unwrap().position, target.as_dvec3());
        assert_eq!(sandbox.scene().transform(index).unwrap().position(), target);
    }

    #[test]
    fn shutdown_releases_everything() {
        let mut sandbox = sandbox();
        sandbox.seed_example_scene().unwrap();
        sandbox.add_object(ObjectKind::Sphere).unwrap();
        sandbox.shutdown();
        assert_eq!(sandbox.scene().allocator().live_meshes(), 0);
        assert_eq!(sandbox.scene().object_count(), 0);
        assert!(sandbox.physics().is_empty());
    }
}
