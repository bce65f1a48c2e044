//! OpenGL ES 2 render backend that needs no display server.
//!
//! A GPU context is created on a DRM render node through GBM and a
//! surfaceless EGL context. Frames are drawn into an off-screen framebuffer
//! object and read back as RGBA8 for the display surface.
//!
//! # Invariants
//! - Every acquired handle is released exactly once, in reverse order of
//!   acquisition, including on early-return error paths.
//! - The renderer never mutates scene state; it only consumes frame matrices.
//! - Shader attribute locations are fixed: position 0, normal 1, texcoord 2.

mod context;
mod mesh;
mod program;
mod renderer;
mod shaders;
mod target;

use std::path::PathBuf;

pub use context::{RenderDevice, find_render_node};
pub use mesh::{BufferApi, GpuMesh};
pub use program::{ATTRIB_NORMAL, ATTRIB_POSITION, ATTRIB_TEXCOORD, ShaderProgram};
pub use renderer::{GlesRenderer, Lighting};
pub use target::RenderTarget;

/// Errors from the GPU context and GL objects.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to scan {dir} for render nodes: {source}")]
    DriDir {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no usable DRM render node in {0}")]
    NoRenderNode(PathBuf),
    #[error("failed to create GBM device: {0}")]
    Gbm(#[source] std::io::Error),
    #[error("no EGL display for the GBM device")]
    NoDisplay,
    #[error("{call} failed: {source}")]
    Egl {
        call: &'static str,
        #[source]
        source: khronos_egl::Error,
    },
    #[error("no EGL config supports OpenGL ES 2")]
    NoConfig,
    #[error("GL object creation failed: {0}")]
    Gl(String),
    #[error("framebuffer incomplete (status {0:#06x})")]
    IncompleteFramebuffer(u32),
    #[error("{stage} shader failed to compile: {log}")]
    ShaderCompile { stage: &'static str, log: String },
    #[error("shader program failed to link: {0}")]
    ProgramLink(String),
    #[error("mesh has no indices to draw")]
    EmptyMesh,
}
