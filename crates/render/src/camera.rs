use core::f32::consts::FRAC_PI_2;

use fbscene_input::{Key, KeyState};
use fbscene_math::{Mat4, Vec3};

/// Largest pitch magnitude, just short of straight up or down so the view
/// direction never becomes parallel to the up vector.
pub const PITCH_LIMIT: f32 = FRAC_PI_2 - 1e-3;

/// Fly camera with position, yaw, pitch, and projection parameters.
///
/// Yaw 0 looks down `-Z`; positive yaw turns left (counter-clockwise seen
/// from above). Movement is horizontal and ignores pitch.
#[derive(Debug, Clone, PartialEq)]
pub struct FlyCamera {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    /// Vertical field of view in radians.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    /// Units per second.
    pub move_speed: f32,
    /// Radians per second.
    pub rotation_speed: f32,
}

impl Default for FlyCamera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 3.0),
            yaw: 0.0,
            pitch: 0.0,
            fov: 45.0_f32.to_radians(),
            aspect: 4.0 / 3.0,
            near: 0.1,
            far: 100.0,
            move_speed: 2.0,
            rotation_speed: 1.0,
        }
    }
}

impl FlyCamera {
    /// Unit direction the camera looks along, including pitch.
    pub fn view_direction(&self) -> Vec3 {
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        Vec3::new(-sy * cp, sp, -cy * cp)
    }

    /// Horizontal forward vector.
    pub fn forward(&self) -> Vec3 {
        let (s, c) = self.yaw.sin_cos();
        Vec3::new(-s, 0.0, -c)
    }

    /// Horizontal right vector.
    pub fn right(&self) -> Vec3 {
        let (s, c) = self.yaw.sin_cos();
        Vec3::new(c, 0.0, -s)
    }

    pub fn move_forward(&mut self, dt: f32) {
        self.position = self.position + self.forward() * (self.move_speed * dt);
    }

    pub fn move_backward(&mut self, dt: f32) {
        self.position = self.position - self.forward() * (self.move_speed * dt);
    }

    pub fn move_left(&mut self, dt: f32) {
        self.position = self.position - self.right() * (self.move_speed * dt);
    }

    pub fn move_right(&mut self, dt: f32) {
        self.position = self.position + self.right() * (self.move_speed * dt);
    }

    pub fn move_up(&mut self, dt: f32) {
        self.position.y += self.move_speed * dt;
    }

    pub fn move_down(&mut self, dt: f32) {
        self.position.y -= self.move_speed * dt;
    }

    /// Add yaw and pitch (radians), clamping pitch to [`PITCH_LIMIT`].
    pub fn rotate(&mut self, d_yaw: f32, d_pitch: f32) {
        self.yaw += d_yaw;
        self.pitch = (self.pitch + d_pitch).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Apply one tick of held keys: W/S/A/D move, H/L turn, K/J pitch,
    /// Space/Shift rise and sink.
    pub fn apply_input(&mut self, keys: &KeyState, dt: f32) {
        if keys.is_down(Key::W) {
            self.move_forward(dt);
        }
        if keys.is_down(Key::S) {
            self.move_backward(dt);
        }
        if keys.is_down(Key::A) {
            self.move_left(dt);
        }
        if keys.is_down(Key::D) {
            self.move_right(dt);
        }

        let turn = self.rotation_speed * dt;
        let mut d_yaw = 0.0;
        let mut d_pitch = 0.0;
        if keys.is_down(Key::H) {
            d_yaw += turn;
        }
        if keys.is_down(Key::L) {
            d_yaw -= turn;
        }
        if keys.is_down(Key::K) {
            d_pitch += turn;
        }
        if keys.is_down(Key::J) {
            d_pitch -= turn;
        }
        self.rotate(d_yaw, d_pitch);

        if keys.is_down(Key::Space) {
            self.move_up(dt);
        }
        if keys.is_down(Key::Shift) {
            self.move_down(dt);
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at(self.position, self.position + self.view_direction(), Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective(self.fov, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn held(keys: &[Key]) -> KeyState {
        let mut state = KeyState::new();
        for &k in keys {
            state.set(k, true);
        }
        state
    }

    #[test]
    fn default_camera() {
        let cam = FlyCamera::default();
        assert_eq!(cam.position, Vec3::new(0.0, 0.0, 3.0));
        let vp = cam.view_projection();
        assert!(vp.0.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn default_camera_sees_origin_centred() {
        let cam = FlyCamera::default();
        let ndc = cam.view_projection().transform_point(Vec3::ZERO);
        assert!(ndc.x.abs() < 1e-6 && ndc.y.abs() < 1e-6);
        assert!(ndc.z > -1.0 && ndc.z < 1.0);
    }

    #[test]
    fn camera_movement() {
        let mut cam = FlyCamera::default();
        let start = cam.position;
        cam.move_forward(1.0);
        assert_ne!(cam.position, start);
    }

    #[test]
    fn forward_agrees_with_view_direction_at_zero_pitch() {
        let mut cam = FlyCamera::default();
        for yaw in [0.0, 0.5, -2.0, 3.1] {
            cam.yaw = yaw;
            assert!((cam.forward() - cam.view_direction()).length() < 1e-6);
            assert!(cam.forward().dot(cam.right()).abs() < 1e-6);
        }
    }

    #[test]
    fn strafe_right_moves_towards_screen_right() {
        let mut cam = FlyCamera::default();
        cam.apply_input(&held(&[Key::D]), 0.5);
        assert!(cam.position.x > 0.0);
        let ndc = cam.view_projection().transform_point(Vec3::ZERO);
        assert!(ndc.x < 0.0, "origin should drift left on screen");
    }

    #[test]
    fn turn_left_increases_yaw() {
        let mut cam = FlyCamera::default();
        cam.apply_input(&held(&[Key::H]), 0.25);
        assert!((cam.yaw - 0.25).abs() < 1e-6);
        // Turning left pushes the origin to the right of the screen.
        assert!(cam.view_projection().transform_point(Vec3::ZERO).x > 0.0);

        cam.apply_input(&held(&[Key::L]), 0.25);
        assert!(cam.yaw.abs() < 1e-6);
    }

    #[test]
    fn vertical_keys() {
        let mut cam = FlyCamera::default();
        cam.apply_input(&held(&[Key::Space]), 1.0);
        assert!((cam.position.y - 2.0).abs() < 1e-6);
        cam.apply_input(&held(&[Key::Shift]), 0.5);
        assert!((cam.position.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn pitch_stays_within_bounds() {
        let mut cam = FlyCamera::default();
        for _ in 0..1000 {
            cam.apply_input(&held(&[Key::K]), 0.1);
            assert!(cam.pitch < FRAC_PI_2 && cam.pitch > -FRAC_PI_2);
        }
        assert_eq!(cam.pitch, PITCH_LIMIT);

        for _ in 0..1000 {
            cam.apply_input(&held(&[Key::J]), 0.37);
            assert!(cam.pitch < FRAC_PI_2 && cam.pitch > -FRAC_PI_2);
        }
        assert_eq!(cam.pitch, -PITCH_LIMIT);
        assert!(cam.view_matrix().0.iter().all(|v| v.is_finite()));
    }
}
