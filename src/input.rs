use glam::Vec2;
use parking_lot::Mutex;
use std::sync::Arc;
use winit::event::{ElementState, TouchPhase, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::camera::{CameraInput, MoveDirection};
use crate::config::RendererConfig;
use crate::controller::{KeyboardCameraController, TouchCameraController};

#[derive(Default)]
struct MailboxState {
    d_azimuth: f32,
    d_elevation: f32,
    /// Outer `None` means no set/clear arrived since the last flush.
    directional: Option<Option<MoveDirection>>,
    freeform: Option<Vec2>,
}

/// Single-slot mailbox marshaling input onto the tick boundary.
///
/// UI-thread event handlers write through the [`CameraInput`] impl; the
/// producer drains everything at the top of its tick with [`flush_into`].
/// Rotation deltas accumulate, the freeform displacement is
/// last-writer-wins, and the directional state is an explicit set/clear.
///
/// [`flush_into`]: InputMailbox::flush_into
#[derive(Clone, Default)]
pub struct InputMailbox {
    state: Arc<Mutex<MailboxState>>,
}

impl InputMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply and clear everything buffered since the previous flush.
    /// Called once per tick, before `Camera::update_state`.
    pub fn flush_into(&self, target: &mut impl CameraInput) {
        let mut state = self.state.lock();

        if state.d_azimuth != 0.0 || state.d_elevation != 0.0 {
            target.apply_rotation_delta(state.d_azimuth, state.d_elevation);
            state.d_azimuth = 0.0;
            state.d_elevation = 0.0;
        }
        if let Some(direction) = state.directional.take() {
            target.set_directional_move(direction);
        }
        if let Some(delta) = state.freeform.take() {
            target.set_freeform_move(delta);
        }
    }
}

impl CameraInput for InputMailbox {
    fn apply_rotation_delta(&mut self, d_azimuth: f32, d_elevation: f32) {
        let mut state = self.state.lock();
        state.d_azimuth += d_azimuth;
        state.d_elevation += d_elevation;
    }

    fn set_directional_move(&mut self, direction: Option<MoveDirection>) {
        self.state.lock().directional = Some(direction);
    }

    fn set_freeform_move(&mut self, delta: Vec2) {
        self.state.lock().freeform = Some(delta);
    }
}

/// Maps winit window events onto the camera controllers.
///
/// This is the only place raw platform key codes and touch phases are
/// interpreted; everything downstream speaks direction tags and deltas.
pub struct WinitInputAdapter {
    keyboard: KeyboardCameraController,
    touch: TouchCameraController,
}

impl WinitInputAdapter {
    pub fn new(config: &RendererConfig, viewport_width: f32) -> Self {
        Self {
            keyboard: KeyboardCameraController::new(config),
            touch: TouchCameraController::new(config, viewport_width),
        }
    }

    pub fn set_viewport_width(&mut self, viewport_width: f32) {
        self.touch.set_viewport_width(viewport_width);
    }

    pub fn handle_window_event(&mut self, camera: &mut impl CameraInput, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    if let Some(direction) = key_direction(code) {
                        match event.state {
                            ElementState::Pressed => self.keyboard.key_down(camera, direction),
                            ElementState::Released => self.keyboard.key_up(camera),
                        }
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.keyboard
                    .pointer_moved(camera, Vec2::new(position.x as f32, position.y as f32));
            }
            WindowEvent::CursorLeft { .. } | WindowEvent::Focused(false) => {
                self.keyboard.reset_pointer();
            }
            WindowEvent::Touch(touch) => {
                let position = Vec2::new(touch.location.x as f32, touch.location.y as f32);
                match touch.phase {
                    TouchPhase::Started => self.touch.touch_began(touch.id, position),
                    TouchPhase::Moved => self.touch.touch_moved(camera, touch.id, position),
                    TouchPhase::Ended | TouchPhase::Cancelled => {
                        self.touch.touch_ended(camera, touch.id)
                    }
                }
            }
            WindowEvent::Resized(size) => {
                self.touch.set_viewport_width(size.width as f32);
            }
            _ => {}
        }
    }
}

fn key_direction(code: KeyCode) -> Option<MoveDirection> {
    match code {
        KeyCode::KeyW | KeyCode::ArrowUp => Some(MoveDirection::Forward),
        KeyCode::KeyS | KeyCode::ArrowDown => Some(MoveDirection::Back),
        KeyCode::KeyA | KeyCode::ArrowLeft => Some(MoveDirection::Left),
        KeyCode::KeyD | KeyCode::ArrowRight => Some(MoveDirection::Right),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::MoveRequest;

    #[derive(Default)]
    struct RecordingInput {
        azimuth: f32,
        elevation: f32,
        request: MoveRequest,
        directional_calls: usize,
    }

    impl CameraInput for RecordingInput {
        fn apply_rotation_delta(&mut self, d_azimuth: f32, d_elevation: f32) {
            self.azimuth += d_azimuth;
            self.elevation += d_elevation;
        }

        fn set_directional_move(&mut self, direction: Option<MoveDirection>) {
            self.directional_calls += 1;
            self.request = match direction {
                Some(direction) => MoveRequest::Directional(direction),
                None => MoveRequest::None,
            };
        }

        fn set_freeform_move(&mut self, delta: Vec2) {
            self.request = MoveRequest::Freeform(delta);
        }
    }

    #[test]
    fn rotation_deltas_accumulate_across_events() {
        let mut mailbox = InputMailbox::new();
        mailbox.apply_rotation_delta(0.1, -0.2);
        mailbox.apply_rotation_delta(0.3, 0.05);

        let mut target = RecordingInput::default();
        mailbox.flush_into(&mut target);

        assert!((target.azimuth - 0.4).abs() < 1e-6);
        assert!((target.elevation - (-0.15)).abs() < 1e-6);
    }

    #[test]
    fn freeform_is_last_writer_wins() {
        let mut mailbox = InputMailbox::new();
        mailbox.set_freeform_move(Vec2::new(1.0, 1.0));
        mailbox.set_freeform_move(Vec2::new(-3.0, 0.5));

        let mut target = RecordingInput::default();
        mailbox.flush_into(&mut target);

        assert_eq!(target.request, MoveRequest::Freeform(Vec2::new(-3.0, 0.5)));
    }

    #[test]
    fn flush_clears_the_mailbox() {
        let mut mailbox = InputMailbox::new();
        mailbox.apply_rotation_delta(1.0, 1.0);
        mailbox.set_directional_move(Some(MoveDirection::Forward));

        let mut target = RecordingInput::default();
        mailbox.flush_into(&mut target);
        assert_eq!(target.directional_calls, 1);

        // Nothing pending: the second flush must not re-deliver anything.
        mailbox.flush_into(&mut target);
        assert_eq!(target.directional_calls, 1);
        assert_eq!(target.azimuth, 1.0);
    }

    #[test]
    fn directional_clear_survives_flush_ordering() {
        let mut mailbox = InputMailbox::new();
        mailbox.set_directional_move(Some(MoveDirection::Left));
        mailbox.set_directional_move(None);

        let mut target = RecordingInput::default();
        mailbox.flush_into(&mut target);

        assert_eq!(target.request, MoveRequest::None);
        assert_eq!(target.directional_calls, 1);
    }

    #[test]
    fn clones_share_one_slot() {
        let mut mailbox = InputMailbox::new();
        let mut handle = mailbox.clone();
        handle.apply_rotation_delta(0.25, 0.0);
        mailbox.apply_rotation_delta(0.25, 0.0);

        let mut target = RecordingInput::default();
        mailbox.flush_into(&mut target);
        assert!((target.azimuth - 0.5).abs() < 1e-6);
    }
}
