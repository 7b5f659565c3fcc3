//! Time subsystem.
//!
//! Turns the raw frame-callback timestamps delivered by the runtime into a
//! monotonic session clock:
//! - the first timestamp seen establishes the epoch
//! - every later timestamp is reported as seconds since that epoch
//!
//! The clock is a plain value owned by the frame loop, so tests can drive it
//! with synthetic timestamps.

mod session_clock;

pub use session_clock::{FrameTime, SessionClock};
