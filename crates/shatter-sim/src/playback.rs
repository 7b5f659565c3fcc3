use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use shatter_engine::provider::{AudioHandle, AudioOutput};

use crate::clips::{ClipBank, DEFAULT_SAMPLE_RATE};

/// A [`ClipBank`] shared between the frame loop and the audio callback.
///
/// The frame loop starts voices through [`AudioOutput`]; the output stream
/// pulls mixed samples through [`mix`](Self::mix).
#[derive(Debug, Clone, Default)]
pub struct SharedClips(Arc<Mutex<ClipBank>>);

impl SharedClips {
    pub fn new(bank: ClipBank) -> Self {
        Self(Arc::new(Mutex::new(bank)))
    }

    // A panic while mixing leaves the bank usable; keep playing.
    fn lock(&self) -> MutexGuard<'_, ClipBank> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn mix(&self, out: &mut [i16]) {
        self.lock().mix(out);
    }
}

impl AudioOutput for SharedClips {
    fn load_audio(&mut self, samples: Vec<i16>) -> AudioHandle {
        self.lock().load_audio(samples)
    }

    fn play_audio(&mut self, handle: AudioHandle, looping: bool) {
        self.lock().play_audio(handle, looping);
    }
}

/// Feeds mono mixer output to a device running at another rate.
///
/// Each device frame holds the nearest earlier mixer sample on every
/// channel. Mixed samples not yet consumed are carried into the next call.
#[derive(Debug)]
struct RateBridge {
    /// Mixer samples advanced per device frame.
    step: f64,
    /// Position of the next device frame, relative to `pending[0]`.
    pos: f64,
    pending: Vec<i16>,
}

impl RateBridge {
    fn new(source_rate: u32, device_rate: u32) -> Self {
        Self {
            step: f64::from(source_rate) / f64::from(device_rate.max(1)),
            pos: 0.0,
            pending: Vec::new(),
        }
    }

    fn fill<T: Copy>(
        &mut self,
        clips: &SharedClips,
        out: &mut [T],
        channels: usize,
        convert: impl Fn(i16) -> T,
    ) {
        let channels = channels.max(1);
        let frames = out.len() / channels;
        if frames == 0 {
            return;
        }

        let last = (self.pos + (frames - 1) as f64 * self.step) as usize;
        if self.pending.len() <= last {
            let start = self.pending.len();
            self.pending.resize(last + 1, 0);
            clips.mix(&mut self.pending[start..]);
        }

        for (i, frame) in out.chunks_mut(channels).enumerate() {
            let index = (self.pos + i as f64 * self.step) as usize;
            let sample = self.pending.get(index).copied().unwrap_or(0);
            frame.fill(convert(sample));
        }

        let end = self.pos + frames as f64 * self.step;
        let consumed = (end as usize).min(self.pending.len());
        self.pending.drain(..consumed);
        self.pos = end - consumed as f64;
    }
}

/// Open output stream on the default device, playing a [`SharedClips`].
///
/// Playback stops when this is dropped.
pub struct AudioStream {
    _stream: cpal::Stream,
}

impl AudioStream {
    /// Opens the default output device and starts pulling from `clips`.
    pub fn start(clips: SharedClips) -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .context("no default audio output device")?;

        let supported = output_config(&device)?;
        let sample_format = supported.sample_format();
        let config = supported.config();

        let stream = match sample_format {
            cpal::SampleFormat::F32 => {
                build_stream::<f32>(&device, &config, clips, |s| f32::from(s) / 32_768.0)?
            }
            cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, clips, |s| s)?,
            cpal::SampleFormat::U16 => {
                build_stream::<u16>(&device, &config, clips, |s| (i32::from(s) + 32_768) as u16)?
            }
            other => anyhow::bail!("unsupported audio sample format {other:?}"),
        };
        stream.play().context("failed to start audio stream")?;

        log::info!(
            "audio output: {} Hz, {} channel(s), {sample_format:?}",
            config.sample_rate.0,
            config.channels
        );

        Ok(Self { _stream: stream })
    }
}

/// Prefers a config running at the clips' own rate, then the device default.
fn output_config(device: &cpal::Device) -> Result<cpal::SupportedStreamConfig> {
    let wanted = DEFAULT_SAMPLE_RATE;
    let native = device
        .supported_output_configs()
        .context("failed to query audio output configs")?
        .find(|range| {
            range.min_sample_rate().0 <= wanted
                && wanted <= range.max_sample_rate().0
                && matches!(
                    range.sample_format(),
                    cpal::SampleFormat::F32 | cpal::SampleFormat::I16 | cpal::SampleFormat::U16
                )
        });

    match native {
        Some(range) => Ok(range.with_sample_rate(cpal::SampleRate(wanted))),
        None => device
            .default_output_config()
            .context("no default audio output config"),
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    clips: SharedClips,
    convert: fn(i16) -> T,
) -> Result<cpal::Stream>
where
    T: cpal::SizedSample + Send + 'static,
{
    let channels = usize::from(config.channels);
    let mut bridge = RateBridge::new(DEFAULT_SAMPLE_RATE, config.sample_rate.0);

    device
        .build_output_stream(
            config,
            move |out: &mut [T], _: &cpal::OutputCallbackInfo| {
                bridge.fill(&clips, out, channels, convert);
            },
            |err| log::error!("audio stream error: {err}"),
            None,
        )
        .context("failed to build audio output stream")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: i16) -> SharedClips {
        let mut clips = SharedClips::default();
        let h = clips.load_audio((1..=n).collect());
        clips.play_audio(h, false);
        clips
    }

    #[test]
    fn shared_handle_plays_through_clone() {
        let mut clips = SharedClips::default();
        let h = clips.load_audio(vec![9, 9]);

        let callback_side = clips.clone();
        clips.play_audio(h, false);
        assert_eq!(callback_side.lock().active_voices(), 1);

        let mut out = [0i16; 2];
        callback_side.mix(&mut out);
        assert_eq!(out, [9, 9]);
        assert_eq!(clips.lock().active_voices(), 0);
    }

    #[test]
    fn equal_rates_copy_samples_to_every_channel() {
        let clips = ramp(4);
        let mut bridge = RateBridge::new(44_100, 44_100);

        let mut out = [0i16; 8];
        bridge.fill(&clips, &mut out, 2, |s| s);
        assert_eq!(out, [1, 1, 2, 2, 3, 3, 4, 4]);
    }

    #[test]
    fn faster_device_holds_samples() {
        let clips = ramp(4);
        let mut bridge = RateBridge::new(22_050, 44_100);

        let mut out = [0i16; 3];
        bridge.fill(&clips, &mut out, 1, |s| s);
        assert_eq!(out, [1, 1, 2]);

        // The half-used sample 2 carries into the next callback.
        let mut out = [0i16; 3];
        bridge.fill(&clips, &mut out, 1, |s| s);
        assert_eq!(out, [2, 3, 3]);
    }

    #[test]
    fn slower_device_skips_samples_without_losing_sync() {
        let clips = ramp(10);
        let mut bridge = RateBridge::new(88_200, 44_100);

        let mut out = [0i16; 2];
        bridge.fill(&clips, &mut out, 1, |s| s);
        assert_eq!(out, [1, 3]);
        bridge.fill(&clips, &mut out, 1, |s| s);
        assert_eq!(out, [5, 7]);
    }

    #[test]
    fn conversion_is_applied_per_frame() {
        let clips = ramp(2);
        let mut bridge = RateBridge::new(44_100, 44_100);

        let mut out = [0.0f32; 2];
        bridge.fill(&clips, &mut out, 1, |s| f32::from(s) / 32_768.0);
        assert_eq!(out, [1.0 / 32_768.0, 2.0 / 32_768.0]);
    }
}
