use anyhow::Result;

use crate::picking::TargetTexel;
use crate::scene::{CommonUniform, InstanceTransform, PostUniform};

/// GPU side of one frame, in the order the orchestrator calls it.
///
/// Uploads (`write_*`) take effect before any pass recorded in the same
/// frame reads them.
pub trait SceneBackend {
    /// Acquires the output and clears color, depth (1.0) and pick (0) targets.
    fn begin_frame(&mut self) -> Result<()>;

    fn write_common(&mut self, block: &CommonUniform);

    fn draw_primary(&mut self) -> Result<()>;

    /// Number of transforms the instance buffer holds.
    fn instance_capacity(&self) -> usize;

    /// Overwrites the head of the instance buffer with `transforms`.
    ///
    /// Fails instead of truncating when `transforms` exceeds
    /// [`instance_capacity`](Self::instance_capacity).
    fn write_instances(&mut self, transforms: &[InstanceTransform]) -> Result<()>;

    /// Draws `count` instances. `count == 0` still runs the (empty) pass.
    fn draw_instanced(&mut self, count: u32) -> Result<()>;

    fn write_post(&mut self, post: &PostUniform);

    fn draw_post(&mut self) -> Result<()>;

    /// Submits the passes recorded so far and reads one pick texel back.
    fn read_pick(&mut self, texel: TargetTexel) -> Result<i32>;

    /// Submits what is left and presents.
    fn end_frame(&mut self) -> Result<()>;
}
