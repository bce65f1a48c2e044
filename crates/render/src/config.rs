use std::path::{Path, PathBuf};

use fbscene_math::{Transform, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::camera::FlyCamera;

/// Errors from loading a scene configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Scene tunables. Every field is optional in YAML; missing fields keep
/// their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Camera translation speed, units per second.
    pub move_speed: f32,
    /// Camera turn speed, radians per second.
    pub rotation_speed: f32,
    /// Model turntable speed, radians per second.
    pub animation_rate: f32,
    pub camera_position: Vec3,
    pub camera_yaw: f32,
    pub camera_pitch: f32,
    /// Fields set here replace the matching fields of the mesh's own
    /// model transform; unset fields keep the mesh's values.
    pub model_transform: Option<TransformOverride>,
    pub clear_color: Vec4,
    /// Direction towards the light; normalised before upload.
    pub light_direction: Vec3,
    pub light_color: Vec3,
    pub object_color: Vec3,
}

/// Partial [`Transform`] from YAML. Each field is optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformOverride {
    pub position: Option<Vec3>,
    /// Euler angles in radians.
    pub rotation: Option<Vec3>,
    pub scale: Option<Vec3>,
}

impl TransformOverride {
    pub fn apply(&self, base: Transform) -> Transform {
        Transform {
            position: self.position.unwrap_or(base.position),
            rotation: self.rotation.unwrap_or(base.rotation),
            scale: self.scale.unwrap_or(base.scale),
        }
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 45.0,
            near: 0.1,
            far: 100.0,
            move_speed: 2.0,
            rotation_speed: 1.0,
            animation_rate: 0.5,
            camera_position: Vec3::new(0.0, 0.0, 3.0),
            camera_yaw: 0.0,
            camera_pitch: 0.0,
            model_transform: None,
            clear_color: Vec4::new(0.2, 0.2, 0.4, 1.0),
            light_direction: Vec3::new(1.0, 1.0, 1.0),
            light_color: Vec3::new(1.0, 1.0, 1.0),
            object_color: Vec3::new(0.8, 0.8, 0.8),
        }
    }
}

impl SceneConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_str(&text).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(path = %path.display(), "loaded scene config");
        Ok(config)
    }

    /// The mesh's model transform with any configured fields applied.
    pub fn model_transform(&self, mesh_transform: Transform) -> Transform {
        match &self.model_transform {
            Some(o) => o.apply(mesh_transform),
            None => mesh_transform,
        }
    }

    /// Camera at the configured start pose, sized for a `width` x `height` target.
    pub fn camera(&self, width: u32, height: u32) -> FlyCamera {
        let mut camera = FlyCamera {
            position: self.camera_position,
            yaw: self.camera_yaw,
            pitch: 0.0,
            fov: self.fov_degrees.to_radians(),
            aspect: width as f32 / height.max(1) as f32,
            near: self.near,
            far: self.far,
            move_speed: self.move_speed,
            rotation_speed: self.rotation_speed,
        };
        camera.rotate(0.0, self.camera_pitch);
        camera
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_camera_defaults() {
        let cfg = SceneConfig::default();
        let cam = cfg.camera(4, 3);
        assert_eq!(cam, FlyCamera::default());
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let cfg = SceneConfig::from_yaml_str(
            "fov_degrees: 60\nclear_color: { x: 0, y: 0, z: 0, w: 1 }\n",
        )
        .unwrap();
        assert_eq!(cfg.fov_degrees, 60.0);
        assert_eq!(cfg.clear_color, Vec4::new(0.0, 0.0, 0.0, 1.0));
        assert_eq!(cfg.move_speed, 2.0);
        assert_eq!(cfg.camera_position, Vec3::new(0.0, 0.0, 3.0));
        assert!(cfg.model_transform.is_none());
    }

    #[test]
    fn model_transform_override() {
        let cfg = SceneConfig::from_yaml_str(
            "model_transform:\n  position: { x: 0, y: -1, z: 0 }\n  scale: { x: 1, y: 1, z: 1 }\n",
        )
        .unwrap();
        let t = cfg.model_transform(Transform::uniform(3.0));
        assert_eq!(t.position, Vec3::new(0.0, -1.0, 0.0));
        assert_eq!(t.rotation, Vec3::ZERO);
        assert_eq!(t.scale, Vec3::ONE);
    }

    #[test]
    fn partial_model_transform_keeps_mesh_scale() {
        let cfg =
            SceneConfig::from_yaml_str("model_transform:\n  position: { x: 1, y: 2, z: 3 }\n").unwrap();
        let t = cfg.model_transform(Transform::uniform(3.0));
        assert_eq!(t.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(t.scale, Vec3::new(3.0, 3.0, 3.0));
        assert_eq!(t.rotation, Vec3::ZERO);
    }

    #[test]
    fn no_override_is_identity() {
        let mesh = Transform::uniform(3.0);
        assert_eq!(SceneConfig::default().model_transform(mesh), mesh);
    }

    #[test]
    fn start_pitch_is_clamped() {
        let cfg = SceneConfig {
            camera_pitch: 10.0,
            ..SceneConfig::default()
        };
        assert_eq!(cfg.camera(1, 1).pitch, crate::PITCH_LIMIT);
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "animation_rate: 0.0\nmove_speed: 5.5").unwrap();
        let cfg = SceneConfig::load(file.path()).unwrap();
        assert_eq!(cfg.animation_rate, 0.0);
        assert_eq!(cfg.move_speed, 5.5);
    }

    #[test]
    fn load_reports_bad_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "fov_degrees: [1, 2").unwrap();
        let err = SceneConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Yaml { .. }));
    }
}
