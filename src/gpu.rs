use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::framesync::align_up;
use crate::renderer::{DrawSubmitter, FrameSubmission, SubmissionError};
use crate::sync::{completion_pair, Completion};

type Result<T> = std::result::Result<T, GpuInitError>;

#[derive(Debug, thiserror::Error)]
pub enum GpuInitError {
    #[error("no suitable gpu adapter: {0}")]
    AdapterUnavailable(String),
    #[error("failed to open gpu device: {0}")]
    DeviceUnavailable(String),
}

/// Draw submission backed by a headless wgpu device.
///
/// Uploads each packed slot into its own uniform buffer and resolves the
/// frame's completion through `on_submitted_work_done`. Pipeline-state
/// objects and render passes belong to the embedding application; this
/// collaborator only carries the constant data and the retire signal.
pub struct WgpuSubmitter {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    constant_buffers: Vec<wgpu::Buffer>,
    skybox_buffers: Vec<wgpu::Buffer>,
    stop_polling: Arc<AtomicBool>,
    poll_thread: Option<JoinHandle<()>>,
}

impl WgpuSubmitter {
    /// Create a submitter with one constant buffer per in-flight slot of
    /// `slot_len` bytes each.
    pub fn new_headless(frames_in_flight: usize, slot_len: usize) -> Result<Self> {
        let (device, queue) = pollster::block_on(Self::request_device_headless())?;
        let device = Arc::new(device);
        let queue = Arc::new(queue);

        let buffer_size = align_up(slot_len, wgpu::COPY_BUFFER_ALIGNMENT as usize) as u64;
        let constant_buffers = (0..frames_in_flight)
            .map(|i| {
                device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(&format!("Constant Slot {i}")),
                    size: buffer_size,
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                })
            })
            .collect();

        let skybox_size = std::mem::size_of::<crate::types::SkyboxTransforms>() as u64;
        let skybox_buffers = (0..frames_in_flight)
            .map(|i| {
                device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(&format!("Skybox Constants {i}")),
                    size: skybox_size,
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                })
            })
            .collect();

        // Completion callbacks only fire while the device is polled; the
        // producer blocks in the gate, so polling runs on its own thread.
        let stop_polling = Arc::new(AtomicBool::new(false));
        let poll_thread = {
            let device = device.clone();
            let stop = stop_polling.clone();
            std::thread::spawn(move || {
                while !stop.load(Ordering::Relaxed) {
                    let _ = device.poll(wgpu::PollType::Poll);
                    std::thread::sleep(Duration::from_millis(1));
                }
            })
        };

        Ok(Self {
            device,
            queue,
            constant_buffers,
            skybox_buffers,
            stop_polling,
            poll_thread: Some(poll_thread),
        })
    }

    async fn request_device_headless() -> Result<(wgpu::Device, wgpu::Queue)> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| GpuInitError::AdapterUnavailable(format!("{e:?}")))?;

        adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                experimental_features: Default::default(),
                trace: Default::default(),
            })
            .await
            .map_err(|e| GpuInitError::DeviceUnavailable(format!("{e:?}")))
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }
}

impl DrawSubmitter for WgpuSubmitter {
    fn submit(&mut self, frame: &FrameSubmission<'_>) -> std::result::Result<Completion, SubmissionError> {
        let buffer = self
            .constant_buffers
            .get(frame.slot_index)
            .ok_or_else(|| {
                SubmissionError::Rejected(format!("no buffer for slot {}", frame.slot_index))
            })?;
        if frame.constants.len() as u64 > buffer.size() {
            return Err(SubmissionError::Rejected(format!(
                "packed region of {} bytes exceeds slot buffer of {}",
                frame.constants.len(),
                buffer.size()
            )));
        }

        self.queue.write_buffer(buffer, 0, frame.constants);
        self.queue.write_buffer(
            &self.skybox_buffers[frame.slot_index],
            0,
            bytemuck::bytes_of(frame.skybox),
        );

        // Draw encoding against pipeline state lives outside this crate; the
        // command buffer below is what the embedding application extends.
        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });
        self.queue.submit(std::iter::once(encoder.finish()));

        let (completion, signal) = completion_pair();
        self.queue.on_submitted_work_done(move || signal.signal());
        Ok(completion)
    }
}

impl Drop for WgpuSubmitter {
    fn drop(&mut self) {
        self.stop_polling.store(true, Ordering::Relaxed);
        if let Some(handle) = self.poll_thread.take() {
            let _ = handle.join();
        }
    }
}
