use fbscene_input::{Key, KeyState};
use fbscene_math::{Mat4, Transform, Vec3};

use crate::camera::FlyCamera;
use crate::config::SceneConfig;

/// Matrices for one drawn frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameMatrices {
    pub projection: Mat4,
    pub view: Mat4,
    pub model: Mat4,
    /// `projection * view * model`.
    pub mvp: Mat4,
    pub camera_position: Vec3,
}

/// Outcome of one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tick {
    /// The quit key is held; stop without drawing.
    Quit,
    Draw(FrameMatrices),
}

/// Per-run scene state advanced once per frame.
#[derive(Debug, Clone)]
pub struct FrameState {
    pub camera: FlyCamera,
    pub model: Transform,
    /// Turntable speed in radians per second.
    pub animation_rate: f32,
    time: f32,
    frames: u64,
}

impl FrameState {
    pub fn new(camera: FlyCamera, model: Transform, animation_rate: f32) -> Self {
        Self {
            camera,
            model,
            animation_rate,
            time: 0.0,
            frames: 0,
        }
    }

    /// State for a `width` x `height` target. Model transform fields set in
    /// the config replace those of `mesh_transform`.
    pub fn from_config(config: &SceneConfig, mesh_transform: Transform, width: u32, height: u32) -> Self {
        Self::new(
            config.camera(width, height),
            config.model_transform(mesh_transform),
            config.animation_rate,
        )
    }

    /// Seconds accumulated from every delta passed to [`step`](Self::step).
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Number of ticks that produced a frame.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Advance by `delta` seconds under `keys` and build the frame's matrices.
    pub fn step(&mut self, keys: &KeyState, delta: f32) -> Tick {
        self.time += delta;

        if keys.is_down(Key::Q) {
            return Tick::Quit;
        }

        self.camera.apply_input(keys, delta);
        self.frames += 1;
        Tick::Draw(self.matrices())
    }

    /// Matrices for the current state without advancing it.
    pub fn matrices(&self) -> FrameMatrices {
        let projection = self.camera.projection_matrix();
        let view = self.camera.view_matrix();
        let model = self.model.matrix(self.time * self.animation_rate);
        FrameMatrices {
            projection,
            view,
            model,
            mvp: projection * view * model,
            camera_position: self.camera.position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TransformOverride;

    fn state() -> FrameState {
        FrameState::from_config(&SceneConfig::default(), Transform::uniform(3.0), 640, 480)
    }

    fn held(keys: &[Key]) -> KeyState {
        let mut state = KeyState::new();
        for &k in keys {
            state.set(k, true);
        }
        state
    }

    #[test]
    fn forward_tick_moves_towards_origin() {
        let mut s = state();
        let Tick::Draw(m) = s.step(&held(&[Key::W]), 0.1) else {
            panic!("expected a frame");
        };
        assert!(m.camera_position.z < 3.0);
        assert_eq!(m.camera_position.x, 0.0);
        assert_eq!(m.camera_position.y, 0.0);
        assert!((m.camera_position.z - 2.8).abs() < 1e-6);
    }

    #[test]
    fn quit_stops_before_movement() {
        let mut s = state();
        let before = s.camera.clone();
        assert_eq!(s.step(&held(&[Key::Q, Key::W]), 0.1), Tick::Quit);
        assert_eq!(s.camera, before);
        assert_eq!(s.frames(), 0);
    }

    #[test]
    fn time_accumulates_delta() {
        let mut s = state();
        let idle = KeyState::new();
        s.step(&idle, 0.25);
        s.step(&idle, 0.5);
        assert!((s.time() - 0.75).abs() < 1e-6);
        assert_eq!(s.frames(), 2);
    }

    #[test]
    fn mvp_is_projection_view_model() {
        let mut s = state();
        let Tick::Draw(m) = s.step(&held(&[Key::H, Key::Space]), 0.3) else {
            panic!("expected a frame");
        };
        assert_eq!(m.mvp, m.projection * m.view * m.model);
        assert_eq!(m.view, s.camera.view_matrix());
    }

    #[test]
    fn model_spins_with_time() {
        let mut s = state();
        let Tick::Draw(first) = s.step(&KeyState::new(), 0.0) else {
            panic!("expected a frame");
        };
        let Tick::Draw(later) = s.step(&KeyState::new(), 1.0) else {
            panic!("expected a frame");
        };
        assert_eq!(first.model, Transform::uniform(3.0).matrix(0.0));
        assert_eq!(later.model, Transform::uniform(3.0).matrix(0.5));
    }

    #[test]
    fn config_model_transform_wins() {
        let config = SceneConfig {
            model_transform: Some(TransformOverride {
                scale: Some(Vec3::ONE),
                ..TransformOverride::default()
            }),
            ..SceneConfig::default()
        };
        let s = FrameState::from_config(&config, Transform::uniform(3.0), 100, 100);
        assert_eq!(s.model, Transform::uniform(1.0));
        assert_eq!(s.camera.aspect, 1.0);
    }

    #[test]
    fn default_frame_centres_model() {
        let m = state().matrices();
        let ndc = m.mvp.transform_point(Vec3::ZERO);
        assert!(ndc.x.abs() < 1e-6 && ndc.y.abs() < 1e-6, "{ndc:?}");
        assert!(ndc.z > -1.0 && ndc.z < 1.0);
    }
}
