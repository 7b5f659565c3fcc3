//! Concrete providers for the shatter frame loop.
//!
//! - [`DriftField`]: boxes drifting down a spinning tube, shattered on click
//! - [`ClipBank`]: in-memory PCM clips mixed into an output buffer
//! - [`AudioStream`]: plays a [`SharedClips`] bank on the default output device

mod clips;
mod drift;
mod playback;

pub use clips::{
    ClipBank, DEFAULT_SAMPLE_RATE, drone_loop, impact_burst, load_pcm16_file, pcm16_from_bytes,
};
pub use drift::{BOX_COUNT, DriftConfig, DriftField, MAX_PARTICLES, TIMESTEP};
pub use playback::{AudioStream, SharedClips};
