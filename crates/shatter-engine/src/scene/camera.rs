use glam::{Mat4, Quat, Vec3};

/// Perspective look-at camera.
///
/// Defaults: eye at the origin looking down +x with +z up, 60° vertical
/// field of view, square aspect, depth range `[0.1, 1000]`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CameraRig {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,

    /// Radians per second the view direction turns about `up`. 0 keeps it static.
    pub orbit_rate: f32,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self {
            eye: Vec3::ZERO,
            target: Vec3::X,
            up: Vec3::Z,
            fov_y_degrees: 60.0,
            aspect: 1.0,
            near: 0.1,
            far: 1000.0,
            orbit_rate: 0.0,
        }
    }
}

impl CameraRig {
    pub fn with_aspect(mut self, width: u32, height: u32) -> Self {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
        self
    }

    /// View-projection matrix at session time `now` (seconds).
    ///
    /// Depth maps to `[0, 1]` as wgpu expects.
    pub fn matrix(&self, now: f32) -> Mat4 {
        let forward = self.target - self.eye;
        let forward = if self.orbit_rate != 0.0 {
            Quat::from_axis_angle(self.up.normalize_or_zero(), now * self.orbit_rate) * forward
        } else {
            forward
        };

        let view = Mat4::look_at_rh(self.eye, self.eye + forward, self.up);
        let proj = Mat4::perspective_rh(
            self.fov_y_degrees.to_radians(),
            self.aspect,
            self.near,
            self.far,
        );
        proj * view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    fn project(m: Mat4, p: Vec3) -> Vec3 {
        let c = m * Vec4::new(p.x, p.y, p.z, 1.0);
        c.truncate() / c.w
    }

    #[test]
    fn looks_down_positive_x() {
        let m = CameraRig::default().matrix(0.0);
        let ndc = project(m, Vec3::new(50.0, 0.0, 0.0));
        assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn z_is_up_and_y_is_left() {
        let m = CameraRig::default().matrix(0.0);
        assert!(project(m, Vec3::new(50.0, 0.0, 5.0)).y > 0.0);
        assert!(project(m, Vec3::new(50.0, 5.0, 0.0)).x < 0.0);
    }

    #[test]
    fn static_rig_ignores_time() {
        let rig = CameraRig::default();
        assert_eq!(rig.matrix(0.0), rig.matrix(12.5));
    }

    #[test]
    fn orbit_turns_view() {
        let rig = CameraRig { orbit_rate: 1.0, ..CameraRig::default() };
        assert_ne!(rig.matrix(0.0), rig.matrix(1.0));
    }
}
