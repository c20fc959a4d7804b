use glam::Vec3;
use std::sync::Arc;
use std::time::Duration;

use crate::camera::Camera;
use crate::config::{ConfigError, RendererConfig};
use crate::framesync::{BufferLayout, FrameSlot};
use crate::scene::{view_space_transforms, Scene};
use crate::sync::{Completion, FrameGate};
use crate::types::{MeshHandle, PerFrameConstants, SkyboxTransforms, TextureHandle};

/// Default bound on one gate wait. A GPU that retires nothing for this long
/// is treated as hung, and the hang is surfaced instead of retried.
pub const DEFAULT_GPU_WATCHDOG: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("draw submission rejected: {0}")]
    Rejected(String),
    #[error("device lost")]
    DeviceLost,
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("gpu made no progress within {0:?}; pipeline considered hung")]
    GpuHang(Duration),
}

/// One draw the submission collaborator must encode: what to bind, and where
/// in the constant region this object's transforms live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawCall {
    pub mesh: MeshHandle,
    pub texture: TextureHandle,
    pub constant_offset: usize,
}

/// A fully packed frame, borrowed for the duration of one submit call.
pub struct FrameSubmission<'a> {
    /// Ring index of the constant-buffer slot holding this frame's data.
    pub slot_index: usize,
    /// The packed constant region: per-frame block, then object blocks.
    pub constants: &'a [u8],
    pub draws: &'a [DrawCall],
    pub skybox: &'a SkyboxTransforms,
}

/// The draw-submission collaborator: encodes and submits one frame's draws,
/// returning a completion that fires when the GPU has finished reading the
/// slot.
pub trait DrawSubmitter {
    fn submit(&mut self, frame: &FrameSubmission<'_>) -> Result<Completion, SubmissionError>;
}

/// Owns the camera, the scene list, the slot ring, and the frame gate, and
/// runs the per-frame acquire -> update -> pack -> submit -> advance loop.
pub struct Renderer<S> {
    camera: Camera,
    scene: Scene,
    submitter: S,
    gate: Arc<FrameGate>,
    slots: Vec<FrameSlot>,
    draws: Vec<DrawCall>,
    frames_in_flight: usize,
    frame_index: u64,
    watchdog: Duration,
}

impl<S: DrawSubmitter> Renderer<S> {
    pub fn new(
        config: &RendererConfig,
        scene: Scene,
        submitter: S,
        camera_position: Vec3,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let layout = BufferLayout::new(scene.len());
        let slots = (0..config.frames_in_flight)
            .map(|_| FrameSlot::new(layout))
            .collect();

        Ok(Self {
            camera: Camera::new(config, camera_position),
            scene,
            submitter,
            gate: Arc::new(FrameGate::new(config.frames_in_flight)),
            slots,
            draws: Vec::new(),
            frames_in_flight: config.frames_in_flight,
            frame_index: 0,
            watchdog: DEFAULT_GPU_WATCHDOG,
        })
    }

    /// Override the hang watchdog. Mostly useful to make tests fail fast.
    pub fn with_watchdog(mut self, watchdog: Duration) -> Self {
        self.watchdog = watchdog;
        self
    }

    /// Run one frame.
    ///
    /// Blocks on the gate until a slot's prior GPU use has retired. A
    /// submission failure drops the frame (the permit is returned
    /// synthetically) and is not an error here; only a hung GPU is.
    pub fn render_frame(&mut self) -> Result<(), RenderError> {
        if !self.gate.acquire_timeout(self.watchdog) {
            return Err(RenderError::GpuHang(self.watchdog));
        }

        self.camera.update_state();

        let slot_index = (self.frame_index % self.frames_in_flight as u64) as usize;
        let view_matrix = self.camera.view_matrix();
        let frame_constants = PerFrameConstants::new(self.camera.projection_matrix());
        let skybox = SkyboxTransforms::new(
            self.camera.projection_matrix() * self.camera.rotation_matrix(),
        );

        let slot = &mut self.slots[slot_index];
        slot.begin();
        slot.write_per_frame(&frame_constants);

        self.draws.clear();
        for object in self.scene.objects() {
            let transforms = view_space_transforms(&view_matrix, &object.model_matrix);
            let constant_offset = slot.write_object(&transforms);
            self.draws.push(DrawCall {
                mesh: object.mesh,
                texture: object.texture,
                constant_offset,
            });
        }

        let submission = FrameSubmission {
            slot_index,
            constants: slot.bytes(),
            draws: &self.draws,
            skybox: &skybox,
        };

        match self.submitter.submit(&submission) {
            Ok(completion) => {
                let gate = self.gate.clone();
                completion.on_complete(move || gate.release());
            }
            Err(error) => {
                log::warn!("frame {} dropped: {error}", self.frame_index);
                self.gate.release();
            }
        }

        // Advances even when the frame was dropped; no mid-pipeline retry.
        self.frame_index += 1;
        Ok(())
    }

    /// Frames submitted but not yet retired by the GPU.
    pub fn frames_in_flight_now(&self) -> usize {
        self.frames_in_flight - self.gate.available()
    }

    /// Wait for every in-flight frame to retire. Called at shutdown after
    /// the tick loop stops.
    pub fn drain(&self) -> Result<(), RenderError> {
        for _ in 0..self.frames_in_flight {
            if !self.gate.acquire_timeout(self.watchdog) {
                return Err(RenderError::GpuHang(self.watchdog));
            }
        }
        for _ in 0..self.frames_in_flight {
            self.gate.release();
        }
        Ok(())
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn submitter(&self) -> &S {
        &self.submitter
    }

    pub fn submitter_mut(&mut self) -> &mut S {
        &mut self.submitter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SceneObject;
    use crate::sync::{completion_pair, CompletionSignal};
    use crate::types::{OBJECT_STRIDE, PER_FRAME_STRIDE};
    use glam::Mat4;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn test_scene(objects: usize) -> Scene {
        Scene::new(
            (0..objects)
                .map(|i| SceneObject {
                    model_matrix: Mat4::from_translation(Vec3::new(i as f32, 0.0, 0.0)),
                    mesh: MeshHandle(i as u32),
                    texture: TextureHandle(i as u32),
                })
                .collect(),
        )
    }

    #[derive(Clone, Default)]
    struct SubmissionLog {
        slots: Arc<Mutex<Vec<usize>>>,
        draws: Arc<Mutex<Vec<Vec<DrawCall>>>>,
    }

    /// Completes every frame synchronously.
    struct ImmediateSubmitter {
        log: SubmissionLog,
    }

    impl DrawSubmitter for ImmediateSubmitter {
        fn submit(&mut self, frame: &FrameSubmission<'_>) -> Result<Completion, SubmissionError> {
            self.log.slots.lock().push(frame.slot_index);
            self.log.draws.lock().push(frame.draws.to_vec());
            let (completion, signal) = completion_pair();
            signal.signal();
            Ok(completion)
        }
    }

    /// Holds completions until the test fires them.
    #[derive(Default)]
    struct DeferredSubmitter {
        pending: Vec<CompletionSignal>,
    }

    impl DrawSubmitter for DeferredSubmitter {
        fn submit(&mut self, _frame: &FrameSubmission<'_>) -> Result<Completion, SubmissionError> {
            let (completion, signal) = completion_pair();
            self.pending.push(signal);
            Ok(completion)
        }
    }

    struct FailingSubmitter;

    impl DrawSubmitter for FailingSubmitter {
        fn submit(&mut self, _frame: &FrameSubmission<'_>) -> Result<Completion, SubmissionError> {
            Err(SubmissionError::Rejected("no encoder".into()))
        }
    }

    #[test]
    fn frames_cycle_through_the_slot_ring() {
        let log = SubmissionLog::default();
        let mut renderer = Renderer::new(
            &RendererConfig::default(),
            test_scene(2),
            ImmediateSubmitter { log: log.clone() },
            Vec3::ZERO,
        )
        .unwrap();

        for _ in 0..7 {
            renderer.render_frame().unwrap();
        }

        assert_eq!(renderer.frame_index(), 7);
        assert_eq!(*log.slots.lock(), vec![0, 1, 2, 0, 1, 2, 0]);
        assert_eq!(renderer.frames_in_flight_now(), 0);
    }

    #[test]
    fn draw_calls_carry_stride_correct_offsets() {
        let log = SubmissionLog::default();
        let mut renderer = Renderer::new(
            &RendererConfig::default(),
            test_scene(3),
            ImmediateSubmitter { log: log.clone() },
            Vec3::ZERO,
        )
        .unwrap();

        renderer.render_frame().unwrap();

        let draws = log.draws.lock();
        let offsets: Vec<usize> = draws[0].iter().map(|d| d.constant_offset).collect();
        assert_eq!(
            offsets,
            vec![
                PER_FRAME_STRIDE,
                PER_FRAME_STRIDE + OBJECT_STRIDE,
                PER_FRAME_STRIDE + 2 * OBJECT_STRIDE
            ]
        );
    }

    #[test]
    fn gate_stalls_when_no_frame_retires() {
        let mut renderer = Renderer::new(
            &RendererConfig::default(),
            test_scene(1),
            DeferredSubmitter::default(),
            Vec3::ZERO,
        )
        .unwrap()
        .with_watchdog(Duration::from_millis(100));

        for _ in 0..3 {
            renderer.render_frame().unwrap();
        }
        assert_eq!(renderer.frames_in_flight_now(), 3);

        // All three slots are outstanding; the fourth frame hits the
        // watchdog.
        assert!(matches!(
            renderer.render_frame(),
            Err(RenderError::GpuHang(_))
        ));

        // Retiring one frame makes exactly one more frame possible.
        let signal = renderer.submitter_mut().pending.remove(0);
        signal.signal();
        renderer.render_frame().unwrap();
        assert_eq!(renderer.frame_index(), 4);
    }

    #[test]
    fn submission_failure_drops_the_frame_and_keeps_going() {
        let mut renderer = Renderer::new(
            &RendererConfig::default(),
            test_scene(1),
            FailingSubmitter,
            Vec3::ZERO,
        )
        .unwrap()
        .with_watchdog(Duration::from_millis(100));

        // Every submit fails; without the synthetic release this would hang
        // on the fourth frame.
        for _ in 0..10 {
            renderer.render_frame().unwrap();
        }
        assert_eq!(renderer.frame_index(), 10);
        assert_eq!(renderer.frames_in_flight_now(), 0);
    }

    #[test]
    fn drain_waits_for_outstanding_frames() {
        let mut renderer = Renderer::new(
            &RendererConfig::default(),
            test_scene(1),
            DeferredSubmitter::default(),
            Vec3::ZERO,
        )
        .unwrap()
        .with_watchdog(Duration::from_millis(100));

        renderer.render_frame().unwrap();
        assert!(matches!(renderer.drain(), Err(RenderError::GpuHang(_))));

        for signal in renderer.submitter_mut().pending.drain(..) {
            signal.signal();
        }
        renderer.drain().unwrap();
        assert_eq!(renderer.frames_in_flight_now(), 0);
    }

    #[test]
    fn invalid_config_never_constructs_a_renderer() {
        let config = RendererConfig {
            frames_in_flight: 0,
            ..Default::default()
        };
        let result = Renderer::new(&config, test_scene(1), FailingSubmitter, Vec3::ZERO);
        assert!(result.is_err());
    }

    #[test]
    fn camera_motion_drives_the_frame_loop() {
        use crate::camera::{CameraInput, MoveDirection};

        let log = SubmissionLog::default();
        let mut renderer = Renderer::new(
            &RendererConfig::default(),
            test_scene(1),
            ImmediateSubmitter { log },
            Vec3::new(0.0, 0.0, 5.0),
        )
        .unwrap();

        renderer
            .camera_mut()
            .set_directional_move(Some(MoveDirection::Forward));
        renderer.render_frame().unwrap();

        assert!((renderer.camera().position() - Vec3::new(0.0, 0.0, 4.7)).length() < 1e-5);
    }
}
