use std::fmt;

/// High-level response after a surface error.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface was reconfigured; rendering may resume next frame.
    Reconfigured,
    /// Transient error; skip the current frame.
    SkipFrame,
    /// Fatal error (commonly OOM); terminate gracefully.
    Fatal,
}

/// Error returned when no surface texture could be acquired for a frame.
///
/// Carried through `anyhow` so the frame loop can abort the frame with `?`
/// while the caller still recovers the action with `downcast_ref`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct FrameAcquireError {
    pub error: wgpu::SurfaceError,
    pub action: SurfaceErrorAction,
}

impl FrameAcquireError {
    pub fn is_fatal(&self) -> bool {
        self.action == SurfaceErrorAction::Fatal
    }
}

impl fmt::Display for FrameAcquireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to acquire surface texture ({}): {:?}", self.error, self.action)
    }
}

impl std::error::Error for FrameAcquireError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_survives_anyhow() {
        let err: anyhow::Error = FrameAcquireError {
            error: wgpu::SurfaceError::OutOfMemory,
            action: SurfaceErrorAction::Fatal,
        }
        .into();

        let err = err.context("frame aborted");
        let acquire = err.downcast_ref::<FrameAcquireError>().unwrap();
        assert!(acquire.is_fatal());
    }

    #[test]
    fn timeout_is_not_fatal() {
        let e = FrameAcquireError {
            error: wgpu::SurfaceError::Timeout,
            action: SurfaceErrorAction::SkipFrame,
        };
        assert!(!e.is_fatal());
        assert!(e.to_string().contains("SkipFrame"));
    }
}
