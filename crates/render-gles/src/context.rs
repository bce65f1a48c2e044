use std::ffi::c_void;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use gbm::AsRaw;
use khronos_egl as egl;

use crate::RenderError;

type Egl = egl::Instance<egl::Static>;

/// `EGL_PLATFORM_GBM_KHR` from `EGL_KHR_platform_gbm`.
const PLATFORM_GBM_KHR: egl::Enum = 0x31D7;

type GetPlatformDisplayExt =
    unsafe extern "system" fn(egl::Enum, *mut c_void, *const egl::Int) -> egl::EGLDisplay;

#[rustfmt::skip]
const PREFERRED_CONFIG: [egl::Int; 13] = [
    egl::RENDERABLE_TYPE, egl::OPENGL_ES2_BIT,
    egl::RED_SIZE, 8,
    egl::GREEN_SIZE, 8,
    egl::BLUE_SIZE, 8,
    egl::ALPHA_SIZE, 8,
    egl::DEPTH_SIZE, 24,
    egl::NONE,
];

const MINIMAL_CONFIG: [egl::Int; 3] = [egl::RENDERABLE_TYPE, egl::OPENGL_ES2_BIT, egl::NONE];

const CONTEXT_ATTRIBS: [egl::Int; 3] = [egl::CONTEXT_CLIENT_VERSION, 2, egl::NONE];

/// Open the first `renderD*` node in `dir` (sorted by name) that accepts
/// read/write access.
pub fn find_render_node(dir: &Path) -> Result<(File, PathBuf), RenderError> {
    let entries = std::fs::read_dir(dir).map_err(|source| RenderError::DriDir {
        dir: dir.to_path_buf(),
        source,
    })?;

    let mut candidates: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().starts_with("renderD"))
        .map(|e| e.path())
        .collect();
    candidates.sort();

    for path in candidates {
        match OpenOptions::new().read(true).write(true).open(&path) {
            Ok(file) => {
                tracing::info!(node = %path.display(), "opened render node");
                return Ok((file, path));
            }
            Err(e) => tracing::warn!(node = %path.display(), error = %e, "cannot open render node"),
        }
    }
    Err(RenderError::NoRenderNode(dir.to_path_buf()))
}

/// Terminates the EGL display on drop.
struct DisplayGuard {
    egl: Rc<Egl>,
    display: egl::Display,
}

impl Drop for DisplayGuard {
    fn drop(&mut self) {
        if let Err(e) = self.egl.terminate(self.display) {
            tracing::warn!(error = %e, "eglTerminate failed");
        }
    }
}

/// Unbinds and destroys the EGL context on drop.
struct ContextGuard {
    egl: Rc<Egl>,
    display: egl::Display,
    context: egl::Context,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        if let Err(e) = self.egl.make_current(self.display, None, None, None) {
            tracing::warn!(error = %e, "failed to release current context");
        }
        if let Err(e) = self.egl.destroy_context(self.display, self.context) {
            tracing::warn!(error = %e, "eglDestroyContext failed");
        }
    }
}

/// A current OpenGL ES 2 context on a DRM render node, with no surface.
///
/// Fields drop in declaration order: context, display, GBM device, then the
/// render node file descriptor owned by the GBM device.
pub struct RenderDevice {
    gl: glow::Context,
    _context: ContextGuard,
    _display: DisplayGuard,
    _gbm: gbm::Device<File>,
    node: PathBuf,
}

impl RenderDevice {
    /// Acquire every layer in order. A failure at any step releases the
    /// layers already acquired.
    pub fn open(dri_dir: &Path) -> Result<Self, RenderError> {
        let _span = tracing::info_span!("render_device_open").entered();

        let (file, node) = find_render_node(dri_dir)?;
        let gbm = gbm::Device::new(file).map_err(RenderError::Gbm)?;

        let egl = Rc::new(egl::Instance::new(egl::Static));
        let display = DisplayGuard {
            display: platform_display(&egl, &gbm)?,
            egl: Rc::clone(&egl),
        };

        let (major, minor) = egl
            .initialize(display.display)
            .map_err(|source| RenderError::Egl {
                call: "eglInitialize",
                source,
            })?;
        let vendor = query(&egl, display.display, egl::VENDOR);
        let extensions = query(&egl, display.display, egl::EXTENSIONS);
        tracing::info!(version = %format!("{major}.{minor}"), %vendor, "EGL initialized");
        tracing::debug!(%extensions, "EGL extensions");
        if !extensions.split_whitespace().any(|e| e == "EGL_KHR_surfaceless_context") {
            tracing::warn!("EGL_KHR_surfaceless_context not advertised; context creation may fail");
        }

        egl.bind_api(egl::OPENGL_ES_API)
            .map_err(|source| RenderError::Egl {
                call: "eglBindAPI",
                source,
            })?;

        let config = choose_config(&egl, display.display)?;

        let context = egl
            .create_context(display.display, config, None, &CONTEXT_ATTRIBS)
            .map_err(|source| RenderError::Egl {
                call: "eglCreateContext",
                source,
            })?;
        let context = ContextGuard {
            egl: Rc::clone(&egl),
            display: display.display,
            context,
        };

        egl.make_current(display.display, None, None, Some(context.context))
            .map_err(|source| RenderError::Egl {
                call: "eglMakeCurrent",
                source,
            })?;

        // SAFETY: the context made current above stays current for the
        // lifetime of `gl`, and every pointer comes from eglGetProcAddress.
        let gl = unsafe {
            glow::Context::from_loader_function(|name| {
                egl.get_proc_address(name)
                    .map_or(std::ptr::null(), |f| f as *const c_void)
            })
        };
        log_gl_info(&gl);

        Ok(Self {
            gl,
            _context: context,
            _display: display,
            _gbm: gbm,
            node,
        })
    }

    pub fn gl(&self) -> &glow::Context {
        &self.gl
    }

    /// Path of the render node backing this device.
    pub fn node(&self) -> &Path {
        &self.node
    }
}

/// `eglGetPlatformDisplayEXT(EGL_PLATFORM_GBM_KHR)`, falling back to the
/// legacy `eglGetDisplay` when the extension entry point is unavailable.
fn platform_display(egl: &Egl, gbm: &gbm::Device<File>) -> Result<egl::Display, RenderError> {
    let native = gbm.as_raw() as *mut c_void;

    match egl.get_proc_address("eglGetPlatformDisplayEXT") {
        Some(f) => {
            // SAFETY: eglGetPlatformDisplayEXT has exactly this signature.
            let get_platform_display: GetPlatformDisplayExt = unsafe { std::mem::transmute(f) };
            let attribs = [egl::NONE];
            // SAFETY: `native` is a live gbm_device and `attribs` is NONE-terminated.
            let raw = unsafe { get_platform_display(PLATFORM_GBM_KHR, native, attribs.as_ptr()) };
            if !raw.is_null() {
                // SAFETY: `raw` is a display handle returned by EGL.
                return Ok(unsafe { egl::Display::from_ptr(raw) });
            }
            tracing::warn!("eglGetPlatformDisplayEXT returned no display, trying eglGetDisplay");
        }
        None => tracing::warn!("eglGetPlatformDisplayEXT unavailable, trying eglGetDisplay"),
    }

    // SAFETY: Mesa accepts a gbm_device as the native display.
    unsafe { egl.get_display(native as egl::NativeDisplayType) }.ok_or(RenderError::NoDisplay)
}

/// Preferred RGBA8 + depth24 config, else any ES2-renderable config.
fn choose_config(egl: &Egl, display: egl::Display) -> Result<egl::Config, RenderError> {
    pick_config(
        egl.choose_first_config(display, &PREFERRED_CONFIG),
        || egl.choose_first_config(display, &MINIMAL_CONFIG),
    )
}

/// Only the minimal attempt can fail startup; an error or an empty result
/// for the preferred attributes degrades to the minimal list.
fn pick_config<C>(
    preferred: Result<Option<C>, egl::Error>,
    minimal: impl FnOnce() -> Result<Option<C>, egl::Error>,
) -> Result<C, RenderError> {
    match preferred {
        Ok(Some(config)) => return Ok(config),
        Ok(None) => tracing::warn!("no RGBA8/depth24 EGL config, falling back to any ES2 config"),
        Err(e) => tracing::warn!(error = %e, "eglChooseConfig failed for RGBA8/depth24, falling back to any ES2 config"),
    }
    minimal()
        .map_err(|source| RenderError::Egl {
            call: "eglChooseConfig",
            source,
        })?
        .ok_or(RenderError::NoConfig)
}

fn query(egl: &Egl, display: egl::Display, name: egl::Int) -> String {
    egl.query_string(Some(display), name)
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn log_gl_info(gl: &glow::Context) {
    use glow::HasContext;
    // SAFETY: string queries on a current context.
    let (version, renderer, vendor) = unsafe {
        (
            gl.get_parameter_string(glow::VERSION),
            gl.get_parameter_string(glow::RENDERER),
            gl.get_parameter_string(glow::VENDOR),
        )
    };
    tracing::info!(%version, %renderer, %vendor, "GL context ready");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_first_openable_render_node() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["card0", "renderD129", "renderD128", "controlD64"] {
            File::create(dir.path().join(name)).unwrap();
        }
        let (_file, path) = find_render_node(dir.path()).unwrap();
        assert_eq!(path, dir.path().join("renderD128"));
    }

    #[test]
    fn skips_unopenable_nodes() {
        let dir = tempfile::tempdir().unwrap();
        // A directory matches the prefix but cannot be opened for writing.
        std::fs::create_dir(dir.path().join("renderD128")).unwrap();
        File::create(dir.path().join("renderD129")).unwrap();
        let (_file, path) = find_render_node(dir.path()).unwrap();
        assert_eq!(path, dir.path().join("renderD129"));
    }

    #[test]
    fn no_render_node() {
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("card0")).unwrap();
        let err = find_render_node(dir.path()).unwrap_err();
        assert!(matches!(err, RenderError::NoRenderNode(_)));
    }

    #[test]
    fn missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = find_render_node(&dir.path().join("dri")).unwrap_err();
        assert!(matches!(err, RenderError::DriDir { .. }));
    }

    #[test]
    fn preferred_config_wins_without_minimal_query() {
        let picked = pick_config(Ok(Some(1)), || -> Result<Option<i32>, egl::Error> {
            panic!("minimal list should not be queried")
        });
        assert_eq!(picked.unwrap(), 1);
    }

    #[test]
    fn preferred_error_falls_back_to_minimal() {
        let picked = pick_config(Err(egl::Error::BadAttribute), || Ok(Some(2)));
        assert_eq!(picked.unwrap(), 2);

        let picked = pick_config(Ok(None), || Ok(Some(3)));
        assert_eq!(picked.unwrap(), 3);
    }

    #[test]
    fn only_minimal_failure_is_fatal() {
        let err = pick_config::<i32>(Err(egl::Error::BadAttribute), || Ok(None)).unwrap_err();
        assert!(matches!(err, RenderError::NoConfig));

        let err = pick_config::<i32>(Ok(None), || Err(egl::Error::BadDisplay)).unwrap_err();
        assert!(matches!(err, RenderError::Egl { call: "eglChooseConfig", .. }));
    }

    #[test]
    fn config_attribute_lists_are_terminated() {
        assert_eq!(PREFERRED_CONFIG.last(), Some(&egl::NONE));
        assert_eq!(MINIMAL_CONFIG.last(), Some(&egl::NONE));
        assert_eq!(CONTEXT_ATTRIBS, [egl::CONTEXT_CLIENT_VERSION, 2, egl::NONE]);
    }
}
