/// Represents a single acquired frame.
///
/// This object is short-lived and must be finalized promptly. Holding the surface
/// texture prevents acquisition of subsequent frames.
///
/// `encoder` may be swapped for a fresh one mid-frame when recorded work has
/// to reach the GPU early (e.g. before a readback); see `Gpu::flush`.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}
