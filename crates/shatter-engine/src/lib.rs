//! Shatter engine crate.
//!
//! Platform + GPU runtime pieces, the three-pass scene, GPU picking and the
//! per-frame orchestrator that ties them to the game and audio providers.

pub mod device;
pub mod window;
pub mod input;
pub mod time;
pub mod core;

pub mod logging;
pub mod scene;
pub mod picking;
pub mod effect;
pub mod provider;
pub mod frame;
