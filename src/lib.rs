pub mod camera;
pub mod config;
pub mod controller;
pub mod demo;
pub mod framesync;
pub mod gpu;
pub mod input;
pub mod math;
pub mod renderer;
pub mod scene;
pub mod sync;
pub mod types;

pub use camera::{Camera, CameraInput, MoveDirection, MoveRequest};
pub use config::{ConfigError, RendererConfig};
pub use renderer::{DrawCall, DrawSubmitter, FrameSubmission, RenderError, Renderer};
pub use scene::{Scene, SceneObject};
pub use sync::{completion_pair, Completion, CompletionSignal, FrameGate};
