pub mod events;
pub mod physics;
pub mod sandbox;
pub mod slots;

pub use events::{EventOutcome, SceneEvent};
pub use physics::{Body, BodyId, Integrator, PhysicsError, PhysicsParams};
pub use sandbox::Sandbox;
pub use slots::{DenseSlots, SlotKey};
