//! GPU-visible record layouts.
//!
//! Every record is `#[repr(C)]` + `Pod` and mirrors a WGSL struct or a vertex
//! stream. Sizes and field offsets are pinned at compile time.

use std::mem::{offset_of, size_of};
use std::num::NonZeroU64;

use bytemuck::{Pod, Zeroable};

// ── common uniform block ──────────────────────────────────────────────────

/// Shared by the primary and instanced passes (WGSL `CommonBlock`, std140).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct CommonUniform {
    /// Column-major view-projection matrix.
    pub camera: [[f32; 4]; 4],
    /// Scroll phase of the tube, in `[0, 1)`.
    pub offset: f32,
    /// Spin angle of the tube, radians.
    pub rotate: f32,
    pub _pad: [f32; 2],
}

const _: () = {
    assert!(size_of::<CommonUniform>() == 80);
    assert!(offset_of!(CommonUniform, camera) == 0);
    assert!(offset_of!(CommonUniform, offset) == 64);
    assert!(offset_of!(CommonUniform, rotate) == 68);
};

// ── instance transform ────────────────────────────────────────────────────

/// One instanced-shape transform; rotation is a unit quaternion (xyzw).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct InstanceTransform {
    pub position: [f32; 3],
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
}

const _: () = {
    assert!(size_of::<InstanceTransform>() == 40);
    assert!(offset_of!(InstanceTransform, position) == 0);
    assert!(offset_of!(InstanceTransform, rotation) == 12);
    assert!(offset_of!(InstanceTransform, scale) == 28);
};

impl InstanceTransform {
    pub const IDENTITY: Self = Self {
        position: [0.0; 3],
        rotation: [0.0, 0.0, 0.0, 1.0],
        scale: [1.0; 3],
    };

    const ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        2 => Float32x3, // position
        3 => Float32x4, // rotation
        4 => Float32x3  // scale
    ];

    pub(crate) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: size_of::<InstanceTransform>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRS,
        }
    }
}

impl Default for InstanceTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

// ── post-process uniform ──────────────────────────────────────────────────

/// Post-process parameters (WGSL `PostBlock`).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct PostUniform {
    /// Warp origin in viewport pixels, bottom-left origin.
    pub position: [f32; 2],
    /// Seconds since the warp was triggered.
    pub time: f32,
    /// Non-zero while the warp is active.
    pub warping: u32,
    pub viewport: [f32; 2],
    pub margin: f32,
    pub _pad: f32,
}

const _: () = {
    assert!(size_of::<PostUniform>() == 32);
    assert!(offset_of!(PostUniform, position) == 0);
    assert!(offset_of!(PostUniform, time) == 8);
    assert!(offset_of!(PostUniform, warping) == 12);
    assert!(offset_of!(PostUniform, viewport) == 16);
};

// ── mesh vertex ───────────────────────────────────────────────────────────

/// Interleaved static mesh vertex: `3f position, 3f normal`.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

const _: () = assert!(size_of::<MeshVertex>() == 24);

impl MeshVertex {
    const ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x3, // position
        1 => Float32x3  // normal
    ];

    pub(crate) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: size_of::<MeshVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Minimum binding size of a uniform record `T`.
pub(crate) fn min_binding_size<T: Pod>() -> Option<NonZeroU64> {
    NonZeroU64::new(size_of::<T>() as u64)
}
