use fbscene_math::{Mat4, Vec3};
use glow::HasContext;

use crate::RenderError;
use crate::shaders::{FRAGMENT_SHADER, VERTEX_SHADER};

pub const ATTRIB_POSITION: u32 = 0;
pub const ATTRIB_NORMAL: u32 = 1;
pub const ATTRIB_TEXCOORD: u32 = 2;

/// Attribute locations bound before linking.
pub(crate) const ATTRIBUTES: [(u32, &str); 3] = [
    (ATTRIB_POSITION, "a_position"),
    (ATTRIB_NORMAL, "a_normal"),
    (ATTRIB_TEXCOORD, "a_texcoord"),
];

/// Uniform locations looked up once after linking. A uniform the driver
/// optimised away is `None` and its upload becomes a no-op.
#[derive(Debug, Default)]
struct Uniforms {
    mvp: Option<glow::UniformLocation>,
    model: Option<glow::UniformLocation>,
    light_dir: Option<glow::UniformLocation>,
    light_color: Option<glow::UniformLocation>,
    camera_pos: Option<glow::UniformLocation>,
    color: Option<glow::UniformLocation>,
}

/// The linked lit-mesh program.
#[derive(Debug)]
pub struct ShaderProgram {
    program: glow::Program,
    uniforms: Uniforms,
}

impl ShaderProgram {
    pub fn new(gl: &glow::Context) -> Result<Self, RenderError> {
        // SAFETY: all calls run on the current context with objects created here.
        unsafe {
            let vertex = compile(gl, glow::VERTEX_SHADER, "vertex", VERTEX_SHADER)?;
            let fragment = match compile(gl, glow::FRAGMENT_SHADER, "fragment", FRAGMENT_SHADER) {
                Ok(s) => s,
                Err(e) => {
                    gl.delete_shader(vertex);
                    return Err(e);
                }
            };

            let linked = link(gl, vertex, fragment);
            gl.delete_shader(vertex);
            gl.delete_shader(fragment);
            let program = linked?;

            let location = |name: &str| {
                let loc = gl.get_uniform_location(program, name);
                if loc.is_none() {
                    tracing::debug!(uniform = name, "uniform not active");
                }
                loc
            };
            let uniforms = Uniforms {
                mvp: location("u_mvp"),
                model: location("u_model"),
                light_dir: location("u_light_dir"),
                light_color: location("u_light_color"),
                camera_pos: location("u_camera_pos"),
                color: location("u_color"),
            };

            tracing::debug!("shader program linked");
            Ok(Self { program, uniforms })
        }
    }

    pub fn bind(&self, gl: &glow::Context) {
        // SAFETY: the program belongs to the current context.
        unsafe { gl.use_program(Some(self.program)) };
    }

    /// Upload the transform uniforms. The program must be bound.
    pub fn set_matrices(&self, gl: &glow::Context, mvp: &Mat4, model: &Mat4) {
        // SAFETY: column-major 16-float slices for mat4 uniforms.
        unsafe {
            gl.uniform_matrix_4_f32_slice(self.uniforms.mvp.as_ref(), false, mvp.as_slice());
            gl.uniform_matrix_4_f32_slice(self.uniforms.model.as_ref(), false, model.as_slice());
        }
    }

    /// Upload the lighting uniforms. The program must be bound.
    pub fn set_lighting(
        &self,
        gl: &glow::Context,
        light_dir: Vec3,
        light_color: Vec3,
        camera_pos: Vec3,
        color: Vec3,
    ) {
        let set = |loc: &Option<glow::UniformLocation>, v: Vec3| {
            // SAFETY: vec3 uniform on the bound program.
            unsafe { gl.uniform_3_f32(loc.as_ref(), v.x, v.y, v.z) };
        };
        set(&self.uniforms.light_dir, light_dir);
        set(&self.uniforms.light_color, light_color);
        set(&self.uniforms.camera_pos, camera_pos);
        set(&self.uniforms.color, color);
    }

    pub fn destroy(self, gl: &glow::Context) {
        // SAFETY: the program belongs to the current context and is not used again.
        unsafe {
            gl.use_program(None);
            gl.delete_program(self.program);
        }
    }
}

unsafe fn compile(
    gl: &glow::Context,
    kind: u32,
    stage: &'static str,
    source: &str,
) -> Result<glow::Shader, RenderError> {
    unsafe {
        let shader = gl.create_shader(kind).map_err(RenderError::Gl)?;
        gl.shader_source(shader, source);
        gl.compile_shader(shader);
        if !gl.get_shader_compile_status(shader) {
            let log = gl.get_shader_info_log(shader);
            gl.delete_shader(shader);
            return Err(RenderError::ShaderCompile { stage, log });
        }
        Ok(shader)
    }
}

unsafe fn link(
    gl: &glow::Context,
    vertex: glow::Shader,
    fragment: glow::Shader,
) -> Result<glow::Program, RenderError> {
    unsafe {
        let program = gl.create_program().map_err(RenderError::Gl)?;
        gl.attach_shader(program, vertex);
        gl.attach_shader(program, fragment);
        for (index, name) in ATTRIBUTES {
            gl.bind_attrib_location(program, index, name);
        }
        gl.link_program(program);
        gl.detach_shader(program, vertex);
        gl.detach_shader(program, fragment);

        if !gl.get_program_link_status(program) {
            let log = gl.get_program_info_log(program);
            gl.delete_program(program);
            return Err(RenderError::ProgramLink(log));
        }
        Ok(program)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_locations_are_distinct_and_dense() {
        let mut locations: Vec<u32> = ATTRIBUTES.iter().map(|(i, _)| *i).collect();
        locations.sort_unstable();
        assert_eq!(locations, [0, 1, 2]);
        assert_eq!(ATTRIBUTES[0], (ATTRIB_POSITION, "a_position"));
    }
}
