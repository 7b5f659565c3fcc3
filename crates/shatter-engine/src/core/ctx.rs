use winit::window::Window;

use crate::device::Gpu;
use crate::input::{InputFrame, InputState, PointerState};
use crate::scene::{GpuBackend, GpuScene};
use crate::window::RuntimeCtx;

/// Per-frame context passed to `core::App::on_frame`.
///
/// Lifetimes:
/// - `'a` is the duration of the callback invocation
/// - `'w` is the window-borrow lifetime carried by `Gpu<'w>`
pub struct FrameCtx<'a, 'w> {
    pub window:       &'a Window,
    pub gpu:          &'a mut Gpu<'w>,
    pub input:        &'a InputState,
    pub input_frame:  &'a InputFrame,
    /// Milliseconds since the runtime started, sampled when the redraw began.
    pub timestamp_ms: f64,
    pub runtime:      &'a mut RuntimeCtx,
}

impl<'a, 'w> FrameCtx<'a, 'w> {
    /// Pointer position and this frame's click flag.
    pub fn pointer(&self) -> PointerState {
        self.input.pointer(self.input_frame)
    }

    /// Binds `scene` to this frame's GPU context.
    ///
    /// The returned backend acquires the surface texture lazily in
    /// `begin_frame` and presents it in `end_frame`.
    pub fn scene_backend<'s>(&'s mut self, scene: &'s GpuScene) -> GpuBackend<'s, 'w> {
        GpuBackend::new(&mut *self.gpu, scene, Some(self.window))
    }
}
