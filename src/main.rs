use anyhow::Context;
use clap::Parser;
use std::fs::File;
use std::path::PathBuf;
use std::time::Duration;

use scene_walker::config::RendererConfig;
use scene_walker::demo::{flight_scene, run_simulation, SimulatedGpu};
use scene_walker::framesync::BufferLayout;
use scene_walker::gpu::WgpuSubmitter;

#[derive(Parser, Debug)]
#[command(name = "scene-walker")]
#[command(about = "First-person scene renderer core, driven by a scripted walkthrough", long_about = None)]
struct Cli {
    /// Frames to simulate
    #[arg(long, default_value_t = 600)]
    frames: u64,

    /// Load renderer configuration from a JSON file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the number of frames in flight
    #[arg(long)]
    frames_in_flight: Option<usize>,

    /// Override the vertical field of view, in degrees
    #[arg(long)]
    fov_degrees: Option<f32>,

    /// Override the discrete move step, in world units per tick
    #[arg(long)]
    move_sensitivity: Option<f32>,

    /// Submit frames to a headless wgpu device instead of the mock GPU
    #[arg(long, default_value = "false")]
    gpu: bool,

    /// Mock GPU frame latency in milliseconds
    #[arg(long, default_value_t = 4)]
    gpu_latency_ms: u64,
}

fn load_config(cli: &Cli) -> anyhow::Result<RendererConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("opening config file {}", path.display()))?;
            serde_json::from_reader(file)
                .with_context(|| format!("parsing config file {}", path.display()))?
        }
        None => RendererConfig::default(),
    };

    if let Some(frames_in_flight) = cli.frames_in_flight {
        config.frames_in_flight = frames_in_flight;
    }
    if let Some(fov_degrees) = cli.fov_degrees {
        config.fov_y = fov_degrees.to_radians();
    }
    if let Some(move_sensitivity) = cli.move_sensitivity {
        config.move_sensitivity = move_sensitivity;
    }

    config.validate()?;
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let scene = flight_scene();

    let report = if cli.gpu {
        let slot_len = BufferLayout::new(scene.len()).len();
        let submitter = WgpuSubmitter::new_headless(config.frames_in_flight, slot_len)?;
        run_simulation(&config, scene, cli.frames, submitter)?
    } else {
        let latency = Duration::from_millis(cli.gpu_latency_ms);
        run_simulation(&config, scene, cli.frames, SimulatedGpu::new(latency))?
    };

    println!(
        "Walked {} frames to ({:.2}, {:.2}, {:.2}), azimuth {:.2} rad, elevation {:.2} rad",
        report.frames,
        report.final_position.x,
        report.final_position.y,
        report.final_position.z,
        report.final_azimuth,
        report.final_elevation
    );

    Ok(())
}
