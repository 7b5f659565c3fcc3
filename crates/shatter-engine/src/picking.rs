//! GPU object picking: ID encoding and pointer → texel mapping.
//!
//! The instanced pass writes `instance_index + PICK_ID_BIAS` into an `R32Sint`
//! target that is cleared to 0. Reading one texel under the pointer after the
//! frame's passes have been submitted tells which instance (if any) was hit.

/// Added to the instance index before it is written to the picking target.
///
/// Keeps every instance value away from the cleared background (0).
pub const PICK_ID_BIAS: i32 = 256;

/// Masks a read-back value down to the object ID handed to `explode`.
pub const PICK_ID_MASK: i32 = 0xFF;

/// Value written to the picking target for instance `index`.
pub fn encode_pick(index: u32) -> i32 {
    index as i32 + PICK_ID_BIAS
}

/// Decodes a read-back picking value.
///
/// Returns `None` for background (0) and the masked object ID otherwise.
pub fn decode_pick(value: i32) -> Option<u8> {
    if value == 0 {
        None
    } else {
        Some((value & PICK_ID_MASK) as u8)
    }
}

/// Pointer position inside the visible viewport, bottom-left origin, clamped.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct ViewportPoint {
    pub x: u32,
    pub y: u32,
}

impl ViewportPoint {
    pub fn as_f32(self) -> [f32; 2] {
        [self.x as f32, self.y as f32]
    }
}

/// Texel of a margin-padded render target, bottom-left origin.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TargetTexel {
    pub x: u32,
    pub y: u32,
}

impl TargetTexel {
    /// Row index counted from the top, as texture copies address it.
    pub fn row_from_top(self, target_height: u32) -> u32 {
        target_height.saturating_sub(1).saturating_sub(self.y)
    }
}

/// Maps surface pointer coordinates to the viewport and to render-target texels.
///
/// Render targets are `viewport + 2 * margin` in each dimension; the visible
/// viewport sits centered inside them.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ViewportMapping {
    pub width: u32,
    pub height: u32,
    pub margin: u32,
}

impl ViewportMapping {
    pub fn new(width: u32, height: u32, margin: u32) -> Self {
        Self { width: width.max(1), height: height.max(1), margin }
    }

    /// Size of the padded render targets.
    pub fn target_size(&self) -> (u32, u32) {
        (self.width + 2 * self.margin, self.height + 2 * self.margin)
    }

    /// Clamps `(x, y)` (top-left origin) into the viewport and flips Y.
    ///
    /// `x' = clamp(x, 0, w-1)`, `y' = h - 1 - clamp(y, 0, h-1)`.
    pub fn pointer_to_viewport(&self, x: i32, y: i32) -> ViewportPoint {
        let cx = x.clamp(0, self.width as i32 - 1) as u32;
        let cy = y.clamp(0, self.height as i32 - 1) as u32;
        ViewportPoint {
            x: cx,
            y: self.height - 1 - cy,
        }
    }

    /// Texel of the padded targets that lies under viewport point `p`.
    pub fn readback_texel(&self, p: ViewportPoint) -> TargetTexel {
        TargetTexel {
            x: p.x + self.margin,
            y: p.y + self.margin,
        }
    }
}
