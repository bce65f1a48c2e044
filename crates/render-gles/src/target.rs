use std::collections::HashSet;

use glow::HasContext;

use crate::RenderError;

/// Offscreen colour + depth renderbuffers attached to a framebuffer object.
#[derive(Debug)]
pub struct RenderTarget {
    framebuffer: glow::Framebuffer,
    color: glow::Renderbuffer,
    depth: glow::Renderbuffer,
    width: u32,
    height: u32,
}

/// Colour renderbuffer format: RGBA8 when `GL_OES_rgb8_rgba8` is available,
/// else the core ES2 RGBA4.
pub fn color_format(extensions: &HashSet<String>) -> u32 {
    if extensions.contains("GL_OES_rgb8_rgba8") {
        glow::RGBA8
    } else {
        glow::RGBA4
    }
}

impl RenderTarget {
    pub fn new(gl: &glow::Context, width: u32, height: u32) -> Result<Self, RenderError> {
        let format = color_format(gl.supported_extensions());
        if format != glow::RGBA8 {
            tracing::warn!("GL_OES_rgb8_rgba8 missing, rendering to RGBA4");
        }
        let (w, h) = (width as i32, height as i32);

        // SAFETY: all calls run on the current context with objects created here.
        unsafe {
            let framebuffer = gl.create_framebuffer().map_err(RenderError::Gl)?;
            let color = match gl.create_renderbuffer() {
                Ok(rb) => rb,
                Err(e) => {
                    gl.delete_framebuffer(framebuffer);
                    return Err(RenderError::Gl(e));
                }
            };
            let depth = match gl.create_renderbuffer() {
                Ok(rb) => rb,
                Err(e) => {
                    gl.delete_renderbuffer(color);
                    gl.delete_framebuffer(framebuffer);
                    return Err(RenderError::Gl(e));
                }
            };

            gl.bind_renderbuffer(glow::RENDERBUFFER, Some(color));
            gl.renderbuffer_storage(glow::RENDERBUFFER, format, w, h);
            gl.bind_renderbuffer(glow::RENDERBUFFER, Some(depth));
            gl.renderbuffer_storage(glow::RENDERBUFFER, glow::DEPTH_COMPONENT16, w, h);
            gl.bind_renderbuffer(glow::RENDERBUFFER, None);

            gl.bind_framebuffer(glow::FRAMEBUFFER, Some(framebuffer));
            gl.framebuffer_renderbuffer(
                glow::FRAMEBUFFER,
                glow::COLOR_ATTACHMENT0,
                glow::RENDERBUFFER,
                Some(color),
            );
            gl.framebuffer_renderbuffer(
                glow::FRAMEBUFFER,
                glow::DEPTH_ATTACHMENT,
                glow::RENDERBUFFER,
                Some(depth),
            );

            let status = gl.check_framebuffer_status(glow::FRAMEBUFFER);
            if status != glow::FRAMEBUFFER_COMPLETE {
                gl.bind_framebuffer(glow::FRAMEBUFFER, None);
                gl.delete_renderbuffer(depth);
                gl.delete_renderbuffer(color);
                gl.delete_framebuffer(framebuffer);
                return Err(RenderError::IncompleteFramebuffer(status));
            }

            tracing::debug!(width, height, format, "render target ready");
            Ok(Self {
                framebuffer,
                color,
                depth,
                width,
                height,
            })
        }
    }

    pub fn bind(&self, gl: &glow::Context) {
        // SAFETY: the framebuffer belongs to the current context.
        unsafe { gl.bind_framebuffer(glow::FRAMEBUFFER, Some(self.framebuffer)) };
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn destroy(self, gl: &glow::Context) {
        // SAFETY: the objects belong to the current context and are not used again.
        unsafe {
            gl.bind_framebuffer(glow::FRAMEBUFFER, None);
            gl.delete_renderbuffer(self.depth);
            gl.delete_renderbuffer(self.color);
            gl.delete_framebuffer(self.framebuffer);
        }
    }
}
