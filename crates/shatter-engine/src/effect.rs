//! Timed warp effect.

/// Seconds a warp stays active after it is triggered.
pub const WARP_DURATION: f32 = 1.0;

/// Warp parameters for one frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct WarpState {
    /// Seconds since the last trigger.
    pub elapsed: f32,
    pub warping: bool,
}

/// Last-trigger timestamp of the warp effect.
///
/// Starts at 0.0, so a warp plays out during the first second of a session.
#[derive(Debug, Clone, Default)]
pub struct TimedEffect {
    last_trigger: f32,
}

impl TimedEffect {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_trigger(&self) -> f32 {
        self.last_trigger
    }

    /// Restarts the decay at `now`.
    pub fn trigger(&mut self, now: f32) {
        self.last_trigger = now;
    }

    /// Evaluates the effect at `now`; active on `[last_trigger, last_trigger + 1)`.
    pub fn warp(&self, now: f32) -> WarpState {
        let elapsed = now - self.last_trigger;
        WarpState {
            elapsed,
            warping: (0.0..WARP_DURATION).contains(&elapsed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_window_is_half_open() {
        let mut fx = TimedEffect::new();
        fx.trigger(5.0);

        assert!(!fx.warp(4.99).warping);
        assert!(fx.warp(5.0).warping);
        assert!(fx.warp(5.999).warping);
        assert!(!fx.warp(6.0).warping);
        assert!(!fx.warp(60.0).warping);
    }

    #[test]
    fn retrigger_restarts_decay() {
        let mut fx = TimedEffect::new();
        fx.trigger(1.0);
        fx.trigger(1.8);

        let w = fx.warp(2.5);
        assert!(w.warping);
        assert!((w.elapsed - 0.7).abs() < 1e-6);
    }

    #[test]
    fn session_start_counts_as_trigger() {
        let fx = TimedEffect::new();
        assert_eq!(fx.last_trigger(), 0.0);
        assert!(fx.warp(0.5).warping);
        assert!(!fx.warp(1.5).warping);
    }
}
