//! Shatter: click the boxes drifting down the tube.

mod app;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use shatter_engine::device::GpuInit;
use shatter_engine::logging::{LoggingConfig, init_logging};
use shatter_engine::provider::AudioOutput;
use shatter_engine::scene::{CameraRig, MeshData, SceneConfig};
use shatter_engine::window::{Runtime, RuntimeConfig};
use shatter_sim::{AudioStream, ClipBank, DEFAULT_SAMPLE_RATE, DriftConfig, DriftField, SharedClips};

use app::{SceneMeshes, ShatterApp};

/// Command line options.
#[derive(Debug, Parser)]
#[command(name = "shatter", version, about)]
struct Args {
    /// Viewport width in pixels.
    #[arg(long, default_value_t = 800)]
    width: u32,

    /// Viewport height in pixels.
    #[arg(long, default_value_t = 800)]
    height: u32,

    /// Off-screen border around the viewport sampled by the warp, in pixels.
    #[arg(long, default_value_t = 40)]
    margin: u32,

    /// Tube mesh (raw `3f position + 3f normal` stream). Generated when omitted.
    #[arg(long)]
    tube: Option<PathBuf>,

    /// Box mesh (same format as `--tube`). Generated when omitted.
    #[arg(long)]
    cube: Option<PathBuf>,

    /// Background music, raw mono PCM16 little-endian. Generated when omitted.
    #[arg(long)]
    music: Option<PathBuf>,

    /// Impact sound, raw mono PCM16 little-endian. Generated when omitted.
    #[arg(long)]
    impact: Option<PathBuf>,

    /// Log filter in `env_logger` syntax, e.g. `debug` or `shatter_engine=trace`.
    #[arg(long)]
    log: Option<String>,

    /// Seed for box spawns and debris.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Play silence; the clips still advance.
    #[arg(long)]
    mute: bool,

    /// Present without waiting for vertical sync.
    #[arg(long)]
    no_vsync: bool,

    /// Exit after this many presented frames.
    #[arg(long)]
    max_frames: Option<u64>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(LoggingConfig {
        env_filter: args.log.clone(),
        ..LoggingConfig::default()
    });

    let scene = SceneConfig {
        viewport: (args.width, args.height),
        margin: args.margin,
        camera: CameraRig::default().with_aspect(args.width, args.height),
        ..SceneConfig::default()
    };

    let tube = match &args.tube {
        Some(path) => MeshData::from_file(path)?,
        None => MeshData::tube(100.0, 5.0, 64, 32),
    };
    let cube = match &args.cube {
        Some(path) => MeshData::from_file(path)?,
        None => MeshData::unit_cube(),
    };

    let mut audio = ClipBank::new();
    audio.set_muted(args.mute);
    let music = match &args.music {
        Some(path) => shatter_sim::load_pcm16_file(path)?,
        None => shatter_sim::drone_loop(DEFAULT_SAMPLE_RATE),
    };
    let impact = match &args.impact {
        Some(path) => shatter_sim::load_pcm16_file(path)?,
        None => shatter_sim::impact_burst(DEFAULT_SAMPLE_RATE, args.seed),
    };
    let music = audio.load_audio(music);
    let impact = audio.load_audio(impact);
    audio.play_audio(music, true);

    let audio = SharedClips::new(audio);
    let stream = match AudioStream::start(audio.clone()) {
        Ok(stream) => Some(stream),
        Err(err) => {
            log::warn!("audio output unavailable, running silent: {err:#}");
            None
        }
    };

    let game = DriftField::new(DriftConfig {
        seed: args.seed,
        ..DriftConfig::default()
    });

    let meshes = SceneMeshes { tube, cube };
    let app = ShatterApp::new(scene, meshes, game, audio, impact, stream, args.max_frames);

    let config = RuntimeConfig {
        title: "shatter".to_string(),
        surface_size: (args.width, args.height),
        resizable: false,
    };

    Runtime::run(config, GpuInit::default().with_vsync(!args.no_vsync), app)
}
