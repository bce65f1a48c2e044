use fbscene_math::{Vec3, Vec4};
use fbscene_render::{FrameMatrices, SceneConfig};
use glow::HasContext;

use crate::RenderError;
use crate::mesh::GpuMesh;
use crate::program::ShaderProgram;
use crate::target::RenderTarget;

/// Light and material colours for the lit shader.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lighting {
    /// Direction towards the light, normalised.
    pub direction: Vec3,
    pub color: Vec3,
    pub object_color: Vec3,
}

impl Default for Lighting {
    fn default() -> Self {
        Self::from_config(&SceneConfig::default())
    }
}

impl Lighting {
    pub fn from_config(config: &SceneConfig) -> Self {
        Self {
            direction: config.light_direction.normalize(),
            color: config.light_color,
            object_color: config.object_color,
        }
    }
}

/// Draws a mesh into an offscreen target and reads back RGBA8 pixels,
/// bottom row first.
pub struct GlesRenderer {
    target: RenderTarget,
    program: ShaderProgram,
    pixels: Vec<u8>,
    clear_color: Vec4,
}

impl GlesRenderer {
    pub fn new(gl: &glow::Context, width: u32, height: u32, clear_color: Vec4) -> Result<Self, RenderError> {
        let _span = tracing::info_span!("renderer_init", width, height).entered();

        if !gl.supported_extensions().contains("GL_OES_element_index_uint") {
            tracing::warn!("GL_OES_element_index_uint missing; 32-bit indices may not draw");
        }

        let target = RenderTarget::new(gl, width, height)?;
        let program = match ShaderProgram::new(gl) {
            Ok(p) => p,
            Err(e) => {
                target.destroy(gl);
                return Err(e);
            }
        };

        Ok(Self {
            target,
            program,
            pixels: vec![0; pixel_len(width, height)],
            clear_color,
        })
    }

    pub fn width(&self) -> u32 {
        self.target.width()
    }

    pub fn height(&self) -> u32 {
        self.target.height()
    }

    /// Render one frame and return the read-back pixels, `width * height * 4`
    /// bytes in GL row order (bottom-up).
    pub fn render(
        &mut self,
        gl: &glow::Context,
        mesh: &GpuMesh<glow::Context>,
        frame: &FrameMatrices,
        lighting: &Lighting,
    ) -> &[u8] {
        let (w, h) = (self.target.width() as i32, self.target.height() as i32);
        let c = self.clear_color;

        self.target.bind(gl);
        // SAFETY: state changes on the current context with the target bound.
        unsafe {
            gl.viewport(0, 0, w, h);
            gl.enable(glow::DEPTH_TEST);
            gl.clear_color(c.x, c.y, c.z, c.w);
            gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
        }

        self.program.bind(gl);
        self.program.set_matrices(gl, &frame.mvp, &frame.model);
        self.program.set_lighting(
            gl,
            lighting.direction,
            lighting.color,
            frame.camera_position,
            lighting.object_color,
        );
        mesh.draw(gl);

        // SAFETY: `pixels` holds exactly `w * h` RGBA8 texels.
        unsafe {
            gl.read_pixels(
                0,
                0,
                w,
                h,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelPackData::Slice(Some(&mut self.pixels)),
            );
            let error = gl.get_error();
            if error != glow::NO_ERROR {
                tracing::warn!(error = %format!("{error:#06x}"), "GL error after frame");
            }
        }
        &self.pixels
    }

    pub fn destroy(self, gl: &glow::Context) {
        self.program.destroy(gl);
        self.target.destroy(gl);
        tracing::debug!("renderer destroyed");
    }
}

fn pixel_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * 4
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readback_buffer_is_rgba8() {
        assert_eq!(pixel_len(640, 480), 640 * 480 * 4);
        assert_eq!(pixel_len(0, 480), 0);
    }

    #[test]
    fn lighting_direction_is_normalised() {
        let lighting = Lighting::default();
        assert!((lighting.direction.length() - 1.0).abs() < 1e-6);
        let k = 1.0 / 3.0_f32.sqrt();
        assert!((lighting.direction - Vec3::new(k, k, k)).length() < 1e-6);
        assert_eq!(lighting.color, Vec3::ONE);
        assert_eq!(lighting.object_color, Vec3::new(0.8, 0.8, 0.8));
    }

    #[test]
    fn lighting_follows_config() {
        let config = SceneConfig {
            light_direction: Vec3::new(0.0, 2.0, 0.0),
            object_color: Vec3::new(1.0, 0.0, 0.0),
            ..SceneConfig::default()
        };
        let lighting = Lighting::from_config(&config);
        assert_eq!(lighting.direction, Vec3::Y);
        assert_eq!(lighting.object_color, Vec3::new(1.0, 0.0, 0.0));
    }
}
