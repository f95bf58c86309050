use std::sync::Arc;

use tracing::{error, info, warn};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::ActiveEventLoop;
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::config::SandboxSettings;
use crate::rendering::buffer::WgpuAllocator;
use crate::rendering::engine::RenderEngine;
use crate::rendering::scene::ObjectKind;
use crate::world::{Sandbox, SceneEvent};

const MASS_STEP: f64 = 1.25;

/// Keyboard shortcuts of the sandbox. Camera keys are handled by the camera
/// controller before this is consulted.
pub fn key_to_event(key: KeyCode) -> Option<SceneEvent> {
    let event = match key {
        KeyCode::KeyN => SceneEvent::AddObject(ObjectKind::Planet),
        KeyCode::KeyC => SceneEvent::AddObject(ObjectKind::Cube),
        KeyCode::KeyS => SceneEvent::AddObject(ObjectKind::Sphere),
        KeyCode::Delete | KeyCode::Backspace => SceneEvent::DeleteSelected,
        KeyCode::Tab => SceneEvent::SelectNext,
        KeyCode::Escape => SceneEvent::Select(None),
        KeyCode::Space => SceneEvent::TogglePause,
        KeyCode::Equal | KeyCode::NumpadAdd => SceneEvent::ScaleSelectedMass(MASS_STEP),
        KeyCode::Minus | KeyCode::NumpadSubtract => SceneEvent::ScaleSelectedMass(1.0 / MASS_STEP),
        _ => return None,
    };
    Some(event)
}

pub struct App {
    settings: SandboxSettings,
    window: Option<Arc<Window>>,
    renderer: Option<RenderEngine>,
    sandbox: Option<Sandbox<WgpuAllocator>>,
    error: Option<anyhow::Error>,
}

impl App {
    pub fn new(settings: SandboxSettings) -> Self {
        Self {
            settings,
            window: None,
            renderer: None,
            sandbox: None,
            error: None,
        }
    }

    /// The start-up failure that ended the event loop, if any.
    pub fn into_result(self) -> anyhow::Result<()> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let attributes = Window::default_attributes()
            .with_title(self.settings.window.title.clone())
            .with_inner_size(LogicalSize::new(self.settings.window.width, self.settings.window.height));
        let window = Arc::new(event_loop.create_window(attributes)?);
        let renderer = pollster::block_on(RenderEngine::new(Arc::clone(&window), &self.settings))?;

        let mut sandbox = Sandbox::new(renderer.allocator(), self.settings.clone());
        if self.settings.simulation.seed_example_scene {
            if let Err(e) = sandbox.seed_example_scene() {
                warn!("Example scene incomplete: {}", e);
            }
        }

        window.request_redraw();
        self.window = Some(window);
        self.renderer = Some(renderer);
        self.sandbox = Some(sandbox);
        Ok(())
    }

    /// Render-side state goes first, then the scene's resources and bodies.
    fn shutdown(&mut self) {
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.release_scene_state();
        }
        if let Some(mut sandbox) = self.sandbox.take() {
            sandbox.shutdown();
        }
        self.renderer = None;
        self.window = None;
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.renderer.is_some() {
            return;
        }
        if let Err(e) = self.start(event_loop) {
            error!("Failed to start: {:#}", e);
            self.error = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        if self.window.as_ref().map_or(true, |w| w.id() != window_id) {
            return;
        }
        let (Some(renderer), Some(sandbox)) = (self.renderer.as_mut(), self.sandbox.as_mut()) else {
            return;
        };
        if renderer.camera_controller.process_events(&event) {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested");
                self.shutdown();
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                renderer.resize(physical_size);
            }
            WindowEvent::KeyboardInput {
                event: KeyEvent {
                    state: ElementState::Pressed,
                    physical_key: PhysicalKey::Code(key),
                    repeat: false,
                    ..
                },
                ..
            } => {
                if let Some(scene_event) = key_to_event(key) {
                    sandbox.push_event(scene_event);
                }
            }
            WindowEvent::RedrawRequested => {
                sandbox.tick();
                if !renderer.render_frame(sandbox.scene()) {
                    self.shutdown();
                    event_loop.exit();
                    return;
                }
                renderer.window().request_redraw();
            }
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shortcuts_map_to_scene_events() {
        assert_eq!(key_to_event(KeyCode::KeyN), Some(SceneEvent::AddObject(ObjectKind::Planet)));
        assert_eq!(key_to_event(KeyCode::Space), Some(SceneEvent::TogglePause));
        assert_eq!(key_to_event(KeyCode::Delete), Some(SceneEvent::DeleteSelected));
        assert_eq!(key_to_event(KeyCode::ArrowUp), None);
    }

    #[test]
    fn mass_keys_undo_each_other() {
        let (Some(SceneEvent::ScaleSelectedMass(up)), Some(SceneEvent::ScaleSelectedMass(down))) =
            (key_to_event(KeyCode::Equal), key_to_event(KeyCode::Minus))
        else {
            panic!("mass keys not mapped");
        };
        assert!((up * down - 1.0).abs() < 1e-12);
    }
}
