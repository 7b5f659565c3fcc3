use std::f32::consts::TAU;
use std::path::Path;

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use shatter_engine::provider::{AudioHandle, AudioOutput};

/// Sample rate the procedural clips are generated at.
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

#[derive(Debug, Clone, Copy)]
struct Voice {
    clip: usize,
    cursor: usize,
    looping: bool,
}

/// Mono 16-bit clip store and software mixer.
///
/// `play_audio` starts a voice; [`mix`](Self::mix) renders all voices into a
/// buffer and retires finished one-shots.
#[derive(Debug, Default)]
pub struct ClipBank {
    clips: Vec<Vec<i16>>,
    voices: Vec<Voice>,
    muted: bool,
}

impl ClipBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// A muted bank still advances voices but renders silence.
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn clip_count(&self) -> usize {
        self.clips.len()
    }

    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    /// Overwrites `out` with the sum of all active voices, saturating at the
    /// i16 range.
    pub fn mix(&mut self, out: &mut [i16]) {
        let mut acc = vec![0i32; out.len()];

        for voice in &mut self.voices {
            let clip = &self.clips[voice.clip];
            for slot in acc.iter_mut() {
                if voice.cursor >= clip.len() {
                    if !voice.looping {
                        break;
                    }
                    voice.cursor = 0;
                }
                *slot += i32::from(clip[voice.cursor]);
                voice.cursor += 1;
            }
        }

        self.voices
            .retain(|v| v.looping || v.cursor < self.clips[v.clip].len());

        for (o, a) in out.iter_mut().zip(acc) {
            *o = if self.muted {
                0
            } else {
                a.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16
            };
        }
    }
}

impl AudioOutput for ClipBank {
    fn load_audio(&mut self, samples: Vec<i16>) -> AudioHandle {
        let handle = AudioHandle(self.clips.len() as u32);
        log::debug!("loaded clip {} ({} samples)", handle.0, samples.len());
        self.clips.push(samples);
        handle
    }

    fn play_audio(&mut self, handle: AudioHandle, looping: bool) {
        let index = handle.0 as usize;
        match self.clips.get(index) {
            Some(clip) if !clip.is_empty() => self.voices.push(Voice {
                clip: index,
                cursor: 0,
                looping,
            }),
            Some(_) => log::debug!("clip {index} is empty; not played"),
            None => log::warn!("play_audio: unknown clip {index}"),
        }
    }
}

/// Decodes little-endian signed 16-bit PCM.
pub fn pcm16_from_bytes(bytes: &[u8]) -> Result<Vec<i16>> {
    anyhow::ensure!(
        bytes.len() % 2 == 0,
        "PCM data has odd length {}",
        bytes.len()
    );
    Ok(bytes
        .chunks_exact(2)
        .map(|c| i16::from_le_bytes([c[0], c[1]]))
        .collect())
}

/// Reads a raw little-endian PCM16 file.
pub fn load_pcm16_file(path: impl AsRef<Path>) -> Result<Vec<i16>> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read audio clip {}", path.display()))?;
    pcm16_from_bytes(&bytes).with_context(|| format!("invalid audio clip {}", path.display()))
}

/// Short noise burst with an exponential decay.
pub fn impact_burst(sample_rate: u32, seed: u64) -> Vec<i16> {
    let len = (sample_rate as f32 * 0.35) as usize;
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            let envelope = (-12.0 * t).exp();
            (rng.gen_range(-1.0..1.0f32) * envelope * 12_000.0) as i16
        })
        .collect()
}

/// Two-second pulsing drone that loops without a seam.
///
/// Every partial completes a whole number of cycles per loop.
pub fn drone_loop(sample_rate: u32) -> Vec<i16> {
    const SECONDS: u32 = 2;
    const PARTIALS: [(f32, f32); 3] = [(55.0, 0.5), (110.0, 0.3), (165.0, 0.2)];

    let len = (sample_rate * SECONDS) as usize;
    (0..len)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            let tone: f32 = PARTIALS.iter().map(|(f, a)| a * (TAU * f * t).sin()).sum();
            let pulse = 0.6 + 0.4 * (TAU * 2.0 * t).sin();
            (tone * pulse * 6_000.0) as i16
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_are_sequential() {
        let mut bank = ClipBank::new();
        assert_eq!(bank.load_audio(vec![1, 2]), AudioHandle(0));
        assert_eq!(bank.load_audio(vec![3]), AudioHandle(1));
        assert_eq!(bank.clip_count(), 2);
    }

    #[test]
    fn one_shot_plays_once() {
        let mut bank = ClipBank::new();
        let h = bank.load_audio(vec![100, 200, 300]);
        bank.play_audio(h, false);

        let mut out = [7i16; 5];
        bank.mix(&mut out);
        assert_eq!(out, [100, 200, 300, 0, 0]);
        assert_eq!(bank.active_voices(), 0);
    }

    #[test]
    fn looping_voice_wraps() {
        let mut bank = ClipBank::new();
        let h = bank.load_audio(vec![1, 2, 3]);
        bank.play_audio(h, true);

        let mut out = [0i16; 4];
        bank.mix(&mut out);
        assert_eq!(out, [1, 2, 3, 1]);
        bank.mix(&mut out);
        assert_eq!(out, [2, 3, 1, 2]);
        assert_eq!(bank.active_voices(), 1);
    }

    #[test]
    fn voices_sum_and_saturate() {
        let mut bank = ClipBank::new();
        let loud = bank.load_audio(vec![30_000, -30_000, 10]);
        bank.play_audio(loud, false);
        bank.play_audio(loud, false);

        let mut out = [0i16; 3];
        bank.mix(&mut out);
        assert_eq!(out, [i16::MAX, i16::MIN, 20]);
    }

    #[test]
    fn voice_spanning_buffers_resumes() {
        let mut bank = ClipBank::new();
        let h = bank.load_audio(vec![1, 2, 3, 4, 5]);
        bank.play_audio(h, false);

        let mut out = [0i16; 3];
        bank.mix(&mut out);
        assert_eq!(out, [1, 2, 3]);
        assert_eq!(bank.active_voices(), 1);
        bank.mix(&mut out);
        assert_eq!(out, [4, 5, 0]);
        assert_eq!(bank.active_voices(), 0);
    }

    #[test]
    fn muted_bank_advances_silently() {
        let mut bank = ClipBank::new();
        bank.set_muted(true);
        let h = bank.load_audio(vec![5; 4]);
        bank.play_audio(h, false);

        let mut out = [1i16; 4];
        bank.mix(&mut out);
        assert_eq!(out, [0; 4]);
        assert_eq!(bank.active_voices(), 0);
    }

    #[test]
    fn unknown_and_empty_clips_are_ignored() {
        let mut bank = ClipBank::new();
        let empty = bank.load_audio(Vec::new());
        bank.play_audio(empty, true);
        bank.play_audio(AudioHandle(42), false);
        assert_eq!(bank.active_voices(), 0);
    }

    #[test]
    fn pcm16_is_little_endian() {
        assert_eq!(pcm16_from_bytes(&[0x34, 0x12, 0xff, 0xff]).unwrap(), [0x1234, -1]);
        assert!(pcm16_from_bytes(&[1, 2, 3]).is_err());
    }

    #[test]
    fn drone_loop_is_seamless() {
        let clip = drone_loop(8_000);
        assert_eq!(clip.len(), 16_000);
        let step = |a: i16, b: i16| (a as i32 - b as i32).abs();
        let max_step = clip.windows(2).map(|w| step(w[0], w[1])).max().unwrap();
        let seam = step(*clip.last().unwrap(), clip[0]);
        assert!(seam <= max_step, "seam {seam}, largest step {max_step}");
    }

    #[test]
    fn impact_burst_decays() {
        let clip = impact_burst(8_000, 3);
        let energy = |s: &[i16]| s.iter().map(|&v| (v as i64).pow(2)).sum::<i64>();
        let head = energy(&clip[..400]);
        let tail = energy(&clip[clip.len() - 400..]);
        assert!(head > tail * 10);
        assert_eq!(impact_burst(8_000, 3), clip);
    }
}
