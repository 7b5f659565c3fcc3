use anyhow::Result;

use crate::picking::{ViewportMapping, decode_pick};
use crate::provider::{AudioHandle, AudioOutput, GameState};
use crate::scene::{CameraRig, PostUniform, SceneConfig};

use super::{FrameInput, FrameReport, PickOutcome, SceneBackend, SessionState, common_block};

/// Drives one frame at a time: clock, passes, picking, and the effects a hit
/// triggers.
///
/// The orchestrator makes no scheduling assumptions; the caller invokes
/// [`run_frame`](Self::run_frame) once per display refresh.
pub struct FrameOrchestrator<G, A> {
    game: G,
    audio: A,
    impact: AudioHandle,

    camera: CameraRig,
    mapping: ViewportMapping,

    session: SessionState,
}

impl<G, A> FrameOrchestrator<G, A>
where
    G: GameState,
    A: AudioOutput,
{
    /// Wraps the providers and initializes the game.
    ///
    /// `impact` is played whenever a click hits an instance.
    pub fn new(mut game: G, audio: A, impact: AudioHandle, config: &SceneConfig) -> Self {
        game.init();
        Self {
            game,
            audio,
            impact,
            camera: config.camera,
            mapping: config.mapping(),
            session: SessionState::default(),
        }
    }

    /// Replaces the timing state, e.g. to resume a session.
    pub fn with_session(mut self, session: SessionState) -> Self {
        self.session = session;
        self
    }

    pub fn game(&self) -> &G {
        &self.game
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    pub fn audio_mut(&mut self) -> &mut A {
        &mut self.audio
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Runs one frame against `backend`.
    ///
    /// An error aborts the rest of the frame; state already advanced (clock,
    /// simulation step) stays advanced.
    ///
    /// # Panics
    ///
    /// If the game reports more instances than the backend's instance
    /// buffer holds.
    pub fn run_frame<B>(&mut self, backend: &mut B, input: FrameInput) -> Result<FrameReport>
    where
        B: SceneBackend + ?Sized,
    {
        let time = self.session.clock.tick(input.timestamp_ms);
        let now = time.now;

        let pointer = input.pointer;
        let point = self.mapping.pointer_to_viewport(pointer.x, pointer.y);

        backend.begin_frame()?;

        backend.write_common(&common_block(&self.camera, now));
        backend.draw_primary()?;

        self.game.update();
        let bones = self.game.bones();
        let capacity = backend.instance_capacity();
        assert!(
            bones.len() <= capacity,
            "game reported {} instances, instance buffer holds {}",
            bones.len(),
            capacity
        );
        let instances = bones.len();
        backend.write_instances(bones)?;
        backend.draw_instanced(instances as u32)?;
        log::trace!("frame {}: {instances} instances", time.frame_index);

        if pointer.clicked {
            self.session.warp_origin = point;
        }

        let warp = self.session.effect.warp(now);
        backend.write_post(&PostUniform {
            position: self.session.warp_origin.as_f32(),
            time: warp.elapsed,
            warping: warp.warping as u32,
            viewport: [self.mapping.width as f32, self.mapping.height as f32],
            margin: self.mapping.margin as f32,
            _pad: 0.0,
        });
        backend.draw_post()?;

        let pick = if pointer.clicked {
            let raw = backend.read_pick(self.mapping.readback_texel(point))?;
            Some(self.apply_pick(raw, now))
        } else {
            None
        };

        backend.end_frame()?;

        Ok(FrameReport {
            time,
            instances,
            warping: warp.warping,
            pick,
        })
    }

    fn apply_pick(&mut self, raw: i32, now: f32) -> PickOutcome {
        match decode_pick(raw) {
            Some(id) => {
                log::debug!("pick hit: raw {raw} -> object {id} at {now:.3}s");
                self.audio.play_audio(self.impact, false);
                self.game.explode(id);
                self.session.effect.trigger(now);
                PickOutcome::Hit { id, raw }
            }
            None => {
                log::debug!("pick miss at {now:.3}s");
                PickOutcome::Miss
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::input::PointerState;
    use crate::picking::{TargetTexel, encode_pick};
    use crate::scene::{CommonUniform, InstanceTransform, MAX_INSTANCES};

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Begin,
        Common(CommonUniform),
        Primary,
        Instances(Vec<InstanceTransform>),
        Instanced(u32),
        Post(PostUniform),
        DrawPost,
        ReadPick(TargetTexel),
        End,
    }

    /// Records calls; the pick target is simulated by `pick_image`.
    struct RecordingBackend {
        calls: Vec<Call>,
        pick_image: HashMap<(u32, u32), i32>,
        fail_begin: bool,
        capacity: usize,
    }

    impl Default for RecordingBackend {
        fn default() -> Self {
            Self {
                calls: Vec::new(),
                pick_image: HashMap::new(),
                fail_begin: false,
                capacity: MAX_INSTANCES,
            }
        }
    }

    impl RecordingBackend {
        fn frames(&self) -> Vec<&[Call]> {
            self.calls
                .split_inclusive(|c| *c == Call::End)
                .collect()
        }

        fn last_post(&self) -> PostUniform {
            self.calls
                .iter()
                .rev()
                .find_map(|c| match c {
                    Call::Post(p) => Some(*p),
                    _ => None,
                })
                .unwrap()
        }

        fn reads(&self) -> Vec<TargetTexel> {
            self.calls
                .iter()
                .filter_map(|c| match c {
                    Call::ReadPick(t) => Some(*t),
                    _ => None,
                })
                .collect()
        }
    }

    impl SceneBackend for RecordingBackend {
        fn begin_frame(&mut self) -> Result<()> {
            anyhow::ensure!(!self.fail_begin, "surface lost");
            self.calls.push(Call::Begin);
            Ok(())
        }

        fn write_common(&mut self, block: &CommonUniform) {
            self.calls.push(Call::Common(*block));
        }

        fn draw_primary(&mut self) -> Result<()> {
            self.calls.push(Call::Primary);
            Ok(())
        }

        fn instance_capacity(&self) -> usize {
            self.capacity
        }

        fn write_instances(&mut self, transforms: &[InstanceTransform]) -> Result<()> {
            self.calls.push(Call::Instances(transforms.to_vec()));
            Ok(())
        }

        fn draw_instanced(&mut self, count: u32) -> Result<()> {
            self.calls.push(Call::Instanced(count));
            Ok(())
        }

        fn write_post(&mut self, post: &PostUniform) {
            self.calls.push(Call::Post(*post));
        }

        fn draw_post(&mut self) -> Result<()> {
            self.calls.push(Call::DrawPost);
            Ok(())
        }

        fn read_pick(&mut self, texel: TargetTexel) -> Result<i32> {
            self.calls.push(Call::ReadPick(texel));
            Ok(self.pick_image.get(&(texel.x, texel.y)).copied().unwrap_or(0))
        }

        fn end_frame(&mut self) -> Result<()> {
            self.calls.push(Call::End);
            Ok(())
        }
    }

    #[derive(Default)]
    struct ScriptedGame {
        bones: Vec<InstanceTransform>,
        inits: usize,
        updates: usize,
        exploded: Vec<u8>,
    }

    impl ScriptedGame {
        fn with_instances(n: usize) -> Self {
            let bones = (0..n)
                .map(|i| InstanceTransform {
                    position: [10.0 * i as f32, 0.0, 0.0],
                    ..InstanceTransform::IDENTITY
                })
                .collect();
            Self { bones, ..Self::default() }
        }
    }

    impl GameState for ScriptedGame {
        fn init(&mut self) {
            self.inits += 1;
        }

        fn update(&mut self) {
            self.updates += 1;
        }

        fn bones(&self) -> &[InstanceTransform] {
            &self.bones
        }

        fn explode(&mut self, id: u8) {
            self.exploded.push(id);
        }
    }

    #[derive(Default)]
    struct CountingAudio {
        loaded: usize,
        played: Vec<(AudioHandle, bool)>,
    }

    impl AudioOutput for CountingAudio {
        fn load_audio(&mut self, _samples: Vec<i16>) -> AudioHandle {
            self.loaded += 1;
            AudioHandle(self.loaded as u32)
        }

        fn play_audio(&mut self, handle: AudioHandle, looping: bool) {
            self.played.push((handle, looping));
        }
    }

    const IMPACT: AudioHandle = AudioHandle(7);

    fn orchestrator(instances: usize) -> FrameOrchestrator<ScriptedGame, CountingAudio> {
        FrameOrchestrator::new(
            ScriptedGame::with_instances(instances),
            CountingAudio::default(),
            IMPACT,
            &SceneConfig::default(),
        )
    }

    fn idle(timestamp_ms: f64) -> FrameInput {
        FrameInput {
            timestamp_ms,
            pointer: PointerState { x: 400, y: 400, clicked: false },
        }
    }

    fn click(timestamp_ms: f64, x: i32, y: i32) -> FrameInput {
        FrameInput {
            timestamp_ms,
            pointer: PointerState { x, y, clicked: true },
        }
    }

    #[test]
    fn init_runs_once_at_construction() {
        let orch = orchestrator(0);
        assert_eq!(orch.game().inits, 1);
        assert_eq!(orch.game().updates, 0);
    }

    #[test]
    fn first_frame_sets_epoch() {
        let mut orch = orchestrator(1);
        let mut backend = RecordingBackend::default();

        let a = orch.run_frame(&mut backend, idle(12_000.0)).unwrap();
        let b = orch.run_frame(&mut backend, idle(12_500.0)).unwrap();

        assert_eq!(a.time.now, 0.0);
        assert!((b.time.now - 0.5).abs() < 1e-6);
        assert_eq!(orch.session().clock.epoch_ms(), Some(12_000.0));
    }

    #[test]
    fn passes_run_in_order_without_click() {
        let mut orch = orchestrator(3);
        let mut backend = RecordingBackend::default();

        let report = orch.run_frame(&mut backend, idle(0.0)).unwrap();

        let kinds: Vec<&'static str> = backend
            .calls
            .iter()
            .map(|c| match c {
                Call::Begin => "begin",
                Call::Common(_) => "common",
                Call::Primary => "primary",
                Call::Instances(_) => "instances",
                Call::Instanced(_) => "instanced",
                Call::Post(_) => "post",
                Call::DrawPost => "draw_post",
                Call::ReadPick(_) => "read_pick",
                Call::End => "end",
            })
            .collect();
        assert_eq!(
            kinds,
            ["begin", "common", "primary", "instances", "instanced", "post", "draw_post", "end"]
        );
        assert_eq!(report.pick, None);
        assert_eq!(report.instances, 3);
        assert_eq!(orch.game().updates, 1);
    }

    #[test]
    fn three_instances_upload_game_bones_without_click() {
        let mut orch = orchestrator(3);
        let mut backend = RecordingBackend::default();
        orch.run_frame(&mut backend, idle(0.0)).unwrap();
        backend.calls.clear();

        let report = orch.run_frame(&mut backend, idle(500.0)).unwrap();

        assert!((report.time.now - 0.5).abs() < 1e-6);
        assert_eq!(report.instances, 3);
        assert_eq!(report.pick, None);

        let uploaded = backend
            .calls
            .iter()
            .find_map(|c| match c {
                Call::Instances(v) => Some(v.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(uploaded, orch.game().bones);
        assert!(backend.calls.contains(&Call::Instanced(3)));

        // Instance i is drawn with pick ID i + 256.
        let ids: Vec<i32> = (0..uploaded.len() as u32).map(encode_pick).collect();
        assert_eq!(ids, [256, 257, 258]);

        assert!(backend.reads().is_empty());
        assert!(orch.game().exploded.is_empty());
        assert!(orch.audio().played.is_empty());
    }

    #[test]
    fn click_hit_explodes_plays_and_restarts_warp() {
        let mut orch = orchestrator(3);
        let mut backend = RecordingBackend::default();
        orch.run_frame(&mut backend, idle(1_000.0)).unwrap();

        // Pointer (400, 300) → viewport (400, 499) → target texel (440, 539).
        backend.pick_image.insert((440, 539), 257);
        let report = orch.run_frame(&mut backend, click(3_500.0, 400, 300)).unwrap();

        assert_eq!(backend.reads(), [TargetTexel { x: 440, y: 539 }]);
        assert_eq!(report.pick, Some(PickOutcome::Hit { id: 1, raw: 257 }));
        assert_eq!(orch.game().exploded, [1]);
        assert_eq!(orch.audio().played, [(IMPACT, false)]);
        assert_eq!(orch.session().effect.last_trigger(), 2.5);
    }

    #[test]
    fn miss_has_no_side_effects() {
        let mut orch = orchestrator(3);
        let mut backend = RecordingBackend::default();
        orch.run_frame(&mut backend, idle(0.0)).unwrap();

        let report = orch.run_frame(&mut backend, click(4_000.0, 10, 10)).unwrap();

        assert_eq!(report.pick, Some(PickOutcome::Miss));
        assert!(orch.game().exploded.is_empty());
        assert!(orch.audio().played.is_empty());
        assert_eq!(orch.session().effect.last_trigger(), 0.0);
        assert!(!report.warping);
    }

    #[test]
    fn explode_receives_masked_id() {
        let mut orch = orchestrator(3);
        let mut backend = RecordingBackend::default();
        backend.pick_image.insert((40, 839), encode_pick(300));

        let report = orch.run_frame(&mut backend, click(0.0, 0, 0)).unwrap();

        assert_eq!(report.pick, Some(PickOutcome::Hit { id: 44, raw: 556 }));
        assert_eq!(orch.game().exploded, [44]);
    }

    #[test]
    fn out_of_bounds_pointer_is_clamped_before_readback() {
        let mut orch = orchestrator(0);
        let mut backend = RecordingBackend::default();

        orch.run_frame(&mut backend, click(0.0, -20, 900)).unwrap();
        orch.run_frame(&mut backend, click(16.0, 5000, -7)).unwrap();

        assert_eq!(
            backend.reads(),
            [TargetTexel { x: 40, y: 40 }, TargetTexel { x: 839, y: 839 }]
        );
        assert_eq!(orch.session().warp_origin.as_f32(), [799.0, 799.0]);
    }

    #[test]
    fn warp_origin_follows_clicks_only() {
        let mut orch = orchestrator(1);
        let mut backend = RecordingBackend::default();

        orch.run_frame(&mut backend, click(0.0, 100, 100)).unwrap();
        assert_eq!(backend.last_post().position, [100.0, 699.0]);

        let mut moved = idle(16.0);
        moved.pointer.x = 600;
        moved.pointer.y = 20;
        orch.run_frame(&mut backend, moved).unwrap();
        assert_eq!(backend.last_post().position, [100.0, 699.0]);
    }

    #[test]
    fn warp_lasts_one_second_after_hit() {
        let mut orch = orchestrator(2);
        let mut backend = RecordingBackend::default();
        backend.pick_image.insert((440, 440), 256);

        orch.run_frame(&mut backend, idle(0.0)).unwrap();
        orch.run_frame(&mut backend, idle(1_500.0)).unwrap();
        assert_eq!(backend.last_post().warping, 0);

        // The hit frame still renders with the previous trigger.
        orch.run_frame(&mut backend, click(2_000.0, 400, 399)).unwrap();
        assert_eq!(backend.last_post().warping, 0);

        let during = orch.run_frame(&mut backend, idle(2_999.0)).unwrap();
        assert!(during.warping);
        let post = backend.last_post();
        assert_eq!(post.warping, 1);
        assert!((post.time - 0.999).abs() < 1e-4);

        let after = orch.run_frame(&mut backend, idle(3_000.0)).unwrap();
        assert!(!after.warping);
    }

    #[test]
    fn repeated_hits_restart_decay() {
        let mut orch = orchestrator(2);
        let mut backend = RecordingBackend::default();
        backend.pick_image.insert((440, 440), 257);

        orch.run_frame(&mut backend, click(0.0, 400, 399)).unwrap();
        orch.run_frame(&mut backend, click(800.0, 400, 399)).unwrap();
        orch.run_frame(&mut backend, idle(1_500.0)).unwrap();

        assert_eq!(orch.session().effect.last_trigger(), 0.8);
        assert_eq!(backend.last_post().warping, 1);
        assert_eq!(orch.audio().played.len(), 2);
    }

    #[test]
    fn same_state_uploads_same_contents() {
        let mut orch = orchestrator(3);
        let mut backend = RecordingBackend::default();

        orch.run_frame(&mut backend, idle(0.0)).unwrap();
        orch.run_frame(&mut backend, idle(0.0)).unwrap();

        let frames = backend.frames();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0], frames[1]);
    }

    #[test]
    fn zero_instances_still_runs_instanced_pass() {
        let mut orch = orchestrator(0);
        let mut backend = RecordingBackend::default();

        let report = orch.run_frame(&mut backend, idle(0.0)).unwrap();

        assert_eq!(report.instances, 0);
        assert!(backend.calls.contains(&Call::Instances(Vec::new())));
        assert!(backend.calls.contains(&Call::Instanced(0)));
    }

    #[test]
    #[should_panic(expected = "instance buffer holds 409")]
    fn overfull_instance_list_panics() {
        let mut orch = orchestrator(410);
        let mut backend = RecordingBackend::default();
        let _ = orch.run_frame(&mut backend, idle(0.0));
    }

    #[test]
    #[should_panic(expected = "game reported 200 instances, instance buffer holds 102")]
    fn capacity_comes_from_the_backend() {
        // The config allows 409 slots, the backend's buffer only 102.
        let mut orch = orchestrator(200);
        let mut backend = RecordingBackend {
            capacity: 102,
            ..RecordingBackend::default()
        };
        let _ = orch.run_frame(&mut backend, idle(0.0));
    }

    #[test]
    fn full_backend_accepts_exactly_its_capacity() {
        let mut orch = orchestrator(102);
        let mut backend = RecordingBackend {
            capacity: 102,
            ..RecordingBackend::default()
        };
        let report = orch.run_frame(&mut backend, idle(0.0)).unwrap();
        assert_eq!(report.instances, 102);
        assert!(backend.calls.contains(&Call::Instanced(102)));
    }

    #[test]
    fn failed_begin_aborts_frame() {
        let mut orch = orchestrator(3);
        let mut backend = RecordingBackend {
            fail_begin: true,
            ..RecordingBackend::default()
        };

        assert!(orch.run_frame(&mut backend, click(0.0, 1, 1)).is_err());
        assert!(backend.calls.is_empty());
        assert_eq!(orch.game().updates, 0);
    }

    #[test]
    fn injected_session_keeps_epoch() {
        let mut session = SessionState::default();
        session.clock.tick(10_000.0);
        session.effect.trigger(4.0);

        let mut orch = orchestrator(1).with_session(session);
        let mut backend = RecordingBackend::default();
        let report = orch.run_frame(&mut backend, idle(14_500.0)).unwrap();

        assert!((report.time.now - 4.5).abs() < 1e-6);
        assert!(report.warping);
    }
}
