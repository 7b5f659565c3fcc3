/// Frame timing snapshot.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameTime {
    /// Seconds elapsed since the first frame of the session.
    pub now: f32,

    /// Seconds elapsed since the previous frame tick, clamped.
    pub dt: f32,

    /// Monotonic frame counter; the epoch frame is 0.
    pub frame_index: u64,
}

/// Session clock producing `FrameTime` snapshots from callback timestamps.
///
/// Timestamps are milliseconds from an arbitrary origin (the runtime uses
/// its own start instant). The first call to [`tick`](Self::tick) captures the
/// epoch; the clock never resets afterwards.
///
/// A timestamp earlier than the previous one is treated as "no time passed"
/// so `now` stays monotonic even if the host clock jitters backwards.
#[derive(Debug, Clone)]
pub struct SessionClock {
    epoch_ms: Option<f64>,
    last_secs: f64,
    frame_index: u64,
    dt_max: f32,
}

impl SessionClock {
    /// Creates a clock with the default delta-time clamp (0.25s).
    pub fn new() -> Self {
        Self::with_dt_max(0.25)
    }

    /// Creates a clock with a custom upper bound for `dt`.
    ///
    /// `dt` only feeds frame-rate dependent consumers (e.g. audio mixing);
    /// `now` is never clamped.
    pub fn with_dt_max(dt_max: f32) -> Self {
        debug_assert!(dt_max > 0.0);
        Self {
            epoch_ms: None,
            last_secs: 0.0,
            frame_index: 0,
            dt_max,
        }
    }

    /// Returns the captured epoch, if the first frame has been seen.
    pub fn epoch_ms(&self) -> Option<f64> {
        self.epoch_ms
    }

    /// Advances the clock to `timestamp_ms` and returns a new `FrameTime`.
    pub fn tick(&mut self, timestamp_ms: f64) -> FrameTime {
        let epoch = *self.epoch_ms.get_or_insert(timestamp_ms);

        let secs = ((timestamp_ms - epoch) / 1000.0).max(self.last_secs);
        let dt = ((secs - self.last_secs) as f32).min(self.dt_max);
        self.last_secs = secs;

        let ft = FrameTime {
            now: secs as f32,
            dt,
            frame_index: self.frame_index,
        };

        self.frame_index = self.frame_index.wrapping_add(1);

        ft
    }
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::new()
    }
}
