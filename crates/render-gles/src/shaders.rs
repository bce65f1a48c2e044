/// GLSL ES 1.00 vertex shader. Normals go through the model matrix with
/// `w = 0`; the scene only uses uniform scale so no inverse-transpose is
/// needed.
pub const VERTEX_SHADER: &str = r#"#version 100
precision highp float;

attribute vec3 a_position;
attribute vec3 a_normal;
attribute vec2 a_texcoord;

uniform mat4 u_mvp;
uniform mat4 u_model;

varying vec3 v_normal;
varying vec3 v_world_pos;
varying vec2 v_texcoord;

void main() {
    vec4 world = u_model * vec4(a_position, 1.0);
    v_world_pos = world.xyz;
    v_normal = (u_model * vec4(a_normal, 0.0)).xyz;
    v_texcoord = a_texcoord;
    gl_Position = u_mvp * vec4(a_position, 1.0);
}
"#;

/// Diffuse + specular + ambient lighting from a single directional light.
pub const FRAGMENT_SHADER: &str = r#"#version 100
precision mediump float;

varying vec3 v_normal;
varying vec3 v_world_pos;
varying vec2 v_texcoord;

uniform vec3 u_light_dir;
uniform vec3 u_light_color;
uniform vec3 u_camera_pos;
uniform vec3 u_color;

void main() {
    vec3 n = normalize(v_normal);
    vec3 l = normalize(u_light_dir);
    float diffuse = max(dot(n, l), 0.0);

    vec3 view_dir = normalize(u_camera_pos - v_world_pos);
    vec3 reflected = reflect(-l, n);
    float specular = pow(max(dot(view_dir, reflected), 0.0), 32.0) * 0.5;

    float ambient = 0.1;
    vec3 lit = (ambient + diffuse + specular) * u_light_color * u_color;
    gl_FragColor = vec4(lit, 1.0);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shaders_target_glsl_es_100() {
        assert!(VERTEX_SHADER.starts_with("#version 100\n"));
        assert!(FRAGMENT_SHADER.starts_with("#version 100\n"));
        assert!(FRAGMENT_SHADER.contains("precision mediump float;"));
    }

    #[test]
    fn attribute_names_match_bindings() {
        for (_, name) in crate::program::ATTRIBUTES {
            assert!(VERTEX_SHADER.contains(&format!(" {name};")), "{name}");
        }
    }

    #[test]
    fn uniform_names_are_declared() {
        for name in ["u_mvp", "u_model"] {
            assert!(VERTEX_SHADER.contains(&format!("uniform mat4 {name};")));
        }
        for name in ["u_light_dir", "u_light_color", "u_camera_pos", "u_color"] {
            assert!(FRAGMENT_SHADER.contains(&format!("uniform vec3 {name};")));
        }
    }
}
