//! Three-pass scene: GPU resources, pipelines and the wgpu frame backend.
//!
//! - primary pass: the bent tube mesh, two procedural instances
//! - instanced pass: provider transforms, color + `R32Sint` pick IDs
//! - post pass: margin-padded color target → surface, with the warp

mod backend;
mod camera;
pub mod layout;
pub mod mesh;
mod registry;

pub use backend::GpuBackend;
pub use camera::CameraRig;
pub use layout::{CommonUniform, InstanceTransform, MeshVertex, PostUniform};
pub use mesh::MeshData;
pub use registry::{GpuScene, PRIMARY_INSTANCES};

use crate::picking::ViewportMapping;

/// Instance buffer size in bytes.
pub const INSTANCE_BUFFER_BYTES: u64 = 16384;

/// Number of `InstanceTransform` records that fit in the instance buffer.
pub const MAX_INSTANCES: usize = INSTANCE_BUFFER_BYTES as usize / size_of::<InstanceTransform>();

/// Scene construction parameters.
#[derive(Debug, Clone)]
pub struct SceneConfig {
    /// Visible viewport in pixels.
    pub viewport: (u32, u32),

    /// Extra pixels on every side of the render targets, sampled by the warp.
    pub margin: u32,

    pub instance_buffer_bytes: u64,

    pub camera: CameraRig,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            viewport: (800, 800),
            margin: 40,
            instance_buffer_bytes: INSTANCE_BUFFER_BYTES,
            camera: CameraRig::default(),
        }
    }
}

impl SceneConfig {
    pub fn mapping(&self) -> ViewportMapping {
        ViewportMapping::new(self.viewport.0, self.viewport.1, self.margin)
    }

    pub fn instance_capacity(&self) -> usize {
        self.instance_buffer_bytes as usize / size_of::<InstanceTransform>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_capacity() {
        assert_eq!(MAX_INSTANCES, 409);
        assert_eq!(SceneConfig::default().instance_capacity(), MAX_INSTANCES);
        assert_eq!(SceneConfig::default().mapping().target_size(), (880, 880));
    }
}
