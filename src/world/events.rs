use glam::Vec3;

use crate::rendering::scene::ObjectKind;

/// Discrete requests coming from input handling or the inspector.
///
/// They are queued while a frame is being drawn and applied, in arrival
/// order, before the next physics step. Indices name the logical object as
/// it was when the event was queued; an earlier deletion in the same batch
/// shifts them like any other deletion would.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    /// Add an object of the given kind, placed by the sandbox.
    AddObject(ObjectKind),
    DeleteObject(usize),
    /// Delete whatever is selected when the event is applied.
    DeleteSelected,
    SetMass { index: usize, mass: f64 },
    /// Multiply the selected body's mass.
    ScaleSelectedMass(f64),
    SetPosition { index: usize, position: Vec3 },
    Select(Option<usize>),
    SelectNext,
    TogglePause,
}

/// What happened when an event was applied, for logging and tests.
#[derive(Debug, Clone, PartialEq)]
pub enum EventOutcome {
    Added(usize),
    Deleted(usize),
    Updated(usize),
    Selected(Option<usize>),
    Paused(bool),
    /// Nothing to act on, e.g. a mass change with no selection.
    Ignored,
}
