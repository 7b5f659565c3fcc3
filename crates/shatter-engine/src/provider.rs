//! Contracts for the collaborators the frame orchestrator drives.

use crate::scene::InstanceTransform;

/// Simulation that owns the instanced objects.
pub trait GameState {
    /// Called once before the first frame.
    fn init(&mut self);

    /// Advances the simulation by one step.
    fn update(&mut self);

    /// Current instance transforms. Index `i` is drawn with pick ID `i + 256`.
    fn bones(&self) -> &[InstanceTransform];

    /// Reacts to a picked object. `id` is the masked pick value.
    fn explode(&mut self, id: u8);
}

/// Opaque handle to a loaded clip.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct AudioHandle(pub u32);

/// Sound playback.
pub trait AudioOutput {
    /// Registers signed 16-bit PCM samples and returns a handle to them.
    fn load_audio(&mut self, samples: Vec<i16>) -> AudioHandle;

    /// Starts a voice for `handle`.
    fn play_audio(&mut self, handle: AudioHandle, looping: bool);
}
