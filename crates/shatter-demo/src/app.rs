use shatter_engine::core::{App, AppControl, FrameCtx};
use shatter_engine::device::{FrameAcquireError, Gpu};
use shatter_engine::frame::{FrameInput, FrameOrchestrator, PickOutcome};
use shatter_engine::input::Key;
use shatter_engine::provider::AudioHandle;
use shatter_engine::scene::{GpuScene, MeshData, SceneConfig};
use shatter_sim::{AudioStream, DEFAULT_SAMPLE_RATE, DriftField, SharedClips};

/// Mix at most this much audio per frame, so a stall does not flood the mixer.
const MAX_MIX_SECONDS: f32 = 0.1;

/// While frames keep failing, only every this-many-th failure is logged.
const FAILURE_LOG_EVERY: u64 = 120;

/// Meshes uploaded once the GPU is ready.
pub struct SceneMeshes {
    pub tube: MeshData,
    pub cube: MeshData,
}

/// Counts consecutive failed frames so a persistent failure is not logged
/// on every refresh.
#[derive(Debug, Default)]
struct FailureStreak {
    count: u64,
}

impl FailureStreak {
    /// Records a failed frame; true when this one should be logged.
    fn record(&mut self) -> bool {
        self.count += 1;
        self.count == 1 || self.count % FAILURE_LOG_EVERY == 0
    }

    /// Ends the streak, returning its length if frames had been failing.
    fn recover(&mut self) -> Option<u64> {
        if self.count == 0 {
            return None;
        }
        Some(std::mem::take(&mut self.count))
    }
}

pub struct ShatterApp {
    scene_config: SceneConfig,
    meshes: SceneMeshes,
    scene: Option<GpuScene>,

    orchestrator: FrameOrchestrator<DriftField, SharedClips>,

    /// Output stream; `None` when no audio device could be opened.
    stream: Option<AudioStream>,
    mix_buffer: Vec<i16>,

    failures: FailureStreak,
    presented: u64,
    max_frames: Option<u64>,
}

impl ShatterApp {
    pub fn new(
        scene_config: SceneConfig,
        meshes: SceneMeshes,
        game: DriftField,
        audio: SharedClips,
        impact: AudioHandle,
        stream: Option<AudioStream>,
        max_frames: Option<u64>,
    ) -> Self {
        let orchestrator = FrameOrchestrator::new(game, audio, impact, &scene_config);
        Self {
            scene_config,
            meshes,
            scene: None,
            orchestrator,
            stream,
            mix_buffer: Vec::new(),
            failures: FailureStreak::default(),
            presented: 0,
            max_frames,
        }
    }

    /// Without an output stream, advances voices in step with the frame
    /// clock so one-shots still retire.
    fn pump_audio(&mut self, dt: f32) {
        if self.stream.is_some() {
            return;
        }
        let samples = (dt.clamp(0.0, MAX_MIX_SECONDS) * DEFAULT_SAMPLE_RATE as f32) as usize;
        self.mix_buffer.resize(samples, 0);
        self.orchestrator.audio().mix(&mut self.mix_buffer);
    }

    fn frame_failed(&mut self, err: &anyhow::Error, what: &str) {
        if self.failures.record() {
            log::warn!("{what} ({} in a row): {err:#}", self.failures.count);
        }
    }
}

impl App for ShatterApp {
    fn on_gpu_ready(&mut self, gpu: &Gpu<'_>) -> anyhow::Result<()> {
        let scene = GpuScene::new(
            gpu.device(),
            gpu.surface_format(),
            &self.scene_config,
            &self.meshes.tube,
            &self.meshes.cube,
        )?;
        self.scene = Some(scene);
        Ok(())
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if ctx.input_frame.keys_pressed.contains(&Key::Escape) {
            log::info!("escape pressed, exiting");
            return AppControl::Exit;
        }

        let Some(scene) = self.scene.as_ref() else {
            log::error!("frame requested before the scene was built");
            return AppControl::Exit;
        };

        let input = FrameInput {
            timestamp_ms: ctx.timestamp_ms,
            pointer: ctx.pointer(),
        };

        let result = {
            let mut backend = ctx.scene_backend(scene);
            self.orchestrator.run_frame(&mut backend, input)
        };

        match result {
            Ok(report) => {
                if let Some(streak) = self.failures.recover() {
                    log::info!("frames recovered after {streak} failures");
                }
                if self.presented == 0 {
                    log::info!("loading complete");
                }
                self.presented += 1;

                if let Some(PickOutcome::Hit { id, .. }) = report.pick {
                    log::info!("shattered box {id} at {:.2}s", report.time.now);
                }

                self.pump_audio(report.time.dt);
            }
            Err(err) => match err.downcast_ref::<FrameAcquireError>() {
                Some(acquire) if acquire.is_fatal() => {
                    ctx.runtime.fail(err);
                    return AppControl::Exit;
                }
                Some(_) => self.frame_failed(&err, "frame skipped"),
                None => self.frame_failed(&err, "frame failed"),
            },
        }

        match self.max_frames {
            Some(max) if self.presented >= max => {
                log::info!("presented {max} frames, exiting");
                AppControl::Exit
            }
            _ => AppControl::Continue,
        }
    }
}
