use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use fbscene_assets::{MeshData, debug_cuboid, load_obj};
use fbscene_display::Framebuffer;
use fbscene_input::{KeyState, Keyboard};
use fbscene_render::{FrameState, SceneConfig, Tick};
use fbscene_render_gles::{GlesRenderer, GpuMesh, Lighting, RenderDevice};
use tracing_subscriber::EnvFilter;

/// Frames between frame-time reports at debug level.
const REPORT_INTERVAL: u64 = 120;

#[derive(Parser, Debug)]
#[command(
    name = "fbscene",
    version,
    about = "Render a spinning OBJ model to the Linux framebuffer",
    after_help = "Keys: W/A/S/D move, H/L turn, K/J look up/down, Space/Shift rise/sink, Q quits."
)]
struct Cli {
    /// Wavefront OBJ model to display
    #[arg(required_unless_present = "debug_cube")]
    model: Option<PathBuf>,

    /// evdev keyboard device
    #[arg(default_value = "/dev/input/event3")]
    input_device: PathBuf,

    /// fbdev device to draw on
    #[arg(long, default_value = "/dev/fb0")]
    framebuffer: PathBuf,

    /// Directory scanned for DRM render nodes
    #[arg(long, default_value = "/dev/dri")]
    dri_dir: PathBuf,

    /// Render a generated cube instead of a model file
    #[arg(long)]
    debug_cube: bool,

    /// YAML scene configuration overriding the defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Stop after this many frames
    #[arg(long)]
    frames: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            // Printing to a closed stdout/stderr is not worth reporting.
            let _ = e.print();
            std::process::exit(code);
        }
    };

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    run(&cli)
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => SceneConfig::load(path).context("loading scene config")?,
        None => SceneConfig::default(),
    };
    let mesh_data = load_mesh(cli)?;

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        ctrlc::set_handler(move || running.store(false, Ordering::SeqCst))
            .context("installing SIGINT handler")?;
    }

    // Declaration order is teardown order in reverse: the GPU objects go
    // first, then the device, then the framebuffer mapping.
    let mut framebuffer = Framebuffer::open(&cli.framebuffer).context("opening framebuffer")?;
    let mut keyboard = match Keyboard::open(&cli.input_device) {
        Ok(k) => k,
        Err(e) => {
            print_input_hint(&cli.input_device);
            return Err(e).context("opening input device");
        }
    };
    let device = RenderDevice::open(&cli.dri_dir).context("creating GPU context")?;
    let gl = device.gl();

    let (width, height) = (framebuffer.width(), framebuffer.height());
    let mut renderer =
        GlesRenderer::new(gl, width, height, config.clear_color).context("creating renderer")?;
    let mesh = match GpuMesh::upload(gl, &mesh_data) {
        Ok(m) => m,
        Err(e) => {
            renderer.destroy(gl);
            return Err(e).context("uploading mesh");
        }
    };

    tracing::info!(
        node = %device.node().display(),
        framebuffer = framebuffer.id(),
        keyboard = %keyboard.path().display(),
        keyboard_name = keyboard.name().unwrap_or("<unnamed>"),
        width,
        height,
        vertices = mesh.vertex_count(),
        "ready"
    );

    let mut session = Session {
        gl,
        framebuffer: &mut framebuffer,
        keyboard: &mut keyboard,
        renderer: &mut renderer,
        mesh: &mesh,
        lighting: Lighting::from_config(&config),
        state: FrameState::from_config(&config, mesh_data.transform, width, height),
        frame_limit: cli.frames,
    };
    let outcome = session.run(&running);
    let frames = session.state.frames();

    mesh.release(gl);
    renderer.destroy(gl);
    drop(device);
    drop(framebuffer);

    tracing::info!(frames, "shut down");
    outcome
}

fn load_mesh(cli: &Cli) -> anyhow::Result<MeshData> {
    if cli.debug_cube {
        if let Some(model) = &cli.model {
            tracing::warn!(model = %model.display(), "--debug-cube given, ignoring model");
        }
        return Ok(debug_cuboid());
    }
    let path = cli.model.as_deref().context("no model given")?;
    let mesh = load_obj(path).with_context(|| format!("loading model {}", path.display()))?;
    tracing::info!(
        model = %path.display(),
        vertices = mesh.vertex_count(),
        faces = mesh.face_count(),
        "model loaded"
    );
    Ok(mesh)
}

fn print_input_hint(path: &Path) {
    eprintln!("Could not open input device {}.", path.display());
    eprintln!("List keyboards with: cat /proc/bus/input/devices");
    eprintln!("Then pass the matching event node, e.g.:");
    eprintln!("  fbscene model.obj /dev/input/event3");
}

/// Everything the frame loop touches, borrowed from `run`.
struct Session<'a> {
    gl: &'a glow::Context,
    framebuffer: &'a mut Framebuffer,
    keyboard: &'a mut Keyboard,
    renderer: &'a mut GlesRenderer,
    mesh: &'a GpuMesh<glow::Context>,
    lighting: Lighting,
    state: FrameState,
    frame_limit: Option<u64>,
}

impl Session<'_> {
    fn run(&mut self, running: &AtomicBool) -> anyhow::Result<()> {
        let mut keys = KeyState::new();
        let mut delta = 0.0_f32;
        let mut report = FrameReport::default();
        let (width, height) = (self.renderer.width(), self.renderer.height());

        while running.load(Ordering::SeqCst) {
            if limit_reached(self.state.frames(), self.frame_limit) {
                tracing::info!(frames = self.state.frames(), "frame limit reached");
                break;
            }
            let start = Instant::now();

            self.keyboard.poll(&mut keys).context("reading input")?;
            let frame = match self.state.step(&keys, delta) {
                Tick::Quit => {
                    tracing::info!("quit key pressed");
                    break;
                }
                Tick::Draw(frame) => frame,
            };

            let pixels = self.renderer.render(self.gl, self.mesh, &frame, &self.lighting);
            self.framebuffer.present(pixels, width, height);

            let elapsed = start.elapsed();
            delta = elapsed.as_secs_f32();
            report.record(elapsed);
        }
        if !running.load(Ordering::SeqCst) {
            tracing::info!("interrupted");
        }
        Ok(())
    }
}

/// True once `frames` drawn frames satisfy `limit`. Checked before each
/// tick, so a limit of 0 draws nothing.
fn limit_reached(frames: u64, limit: Option<u64>) -> bool {
    limit.is_some_and(|limit| frames >= limit)
}

/// Rolling frame-time statistics, logged every [`REPORT_INTERVAL`] frames.
#[derive(Debug, Default)]
struct FrameReport {
    frames: u64,
    total: Duration,
    worst: Duration,
}

impl FrameReport {
    fn record(&mut self, elapsed: Duration) {
        self.frames += 1;
        self.total += elapsed;
        self.worst = self.worst.max(elapsed);
        if self.frames == REPORT_INTERVAL {
            let avg = self.total / self.frames as u32;
            tracing::debug!(
                avg_ms = avg.as_secs_f64() * 1e3,
                worst_ms = self.worst.as_secs_f64() * 1e3,
                fps = 1.0 / avg.as_secs_f64().max(f64::EPSILON),
                "frame time"
            );
            *self = Self::default();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn model_and_default_input_device() {
        let cli = Cli::try_parse_from(["fbscene", "teapot.obj"]).unwrap();
        assert_eq!(cli.model, Some(PathBuf::from("teapot.obj")));
        assert_eq!(cli.input_device, PathBuf::from("/dev/input/event3"));
        assert_eq!(cli.framebuffer, PathBuf::from("/dev/fb0"));
        assert_eq!(cli.dri_dir, PathBuf::from("/dev/dri"));
        assert!(!cli.debug_cube);
        assert!(cli.frames.is_none());
    }

    #[test]
    fn explicit_input_device() {
        let cli = Cli::try_parse_from(["fbscene", "m.obj", "/dev/input/event7", "-v"]).unwrap();
        assert_eq!(cli.input_device, PathBuf::from("/dev/input/event7"));
        assert!(cli.verbose);
    }

    #[test]
    fn missing_model_is_a_usage_error() {
        let err = Cli::try_parse_from(["fbscene"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        assert!(err.use_stderr());
    }

    #[test]
    fn debug_cube_needs_no_model() {
        let cli = Cli::try_parse_from(["fbscene", "--debug-cube", "--frames", "10"]).unwrap();
        assert!(cli.debug_cube);
        assert_eq!(cli.frames, Some(10));
        assert_eq!(load_mesh(&cli).unwrap().index_count(), 36);
    }

    #[test]
    fn help_goes_to_stdout() {
        let err = Cli::try_parse_from(["fbscene", "--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        assert!(!err.use_stderr());
    }

    #[test]
    fn missing_model_file_names_the_step() {
        let cli = Cli::try_parse_from(["fbscene", "/nonexistent/model.obj"]).unwrap();
        let err = load_mesh(&cli).unwrap_err();
        assert!(format!("{err:#}").starts_with("loading model /nonexistent/model.obj"));
    }

    #[test]
    fn frame_limit_is_checked_before_drawing() {
        assert!(limit_reached(0, Some(0)));
        assert!(!limit_reached(0, Some(1)));
        assert!(limit_reached(1, Some(1)));
        assert!(!limit_reached(u64::MAX, None));
    }

    #[test]
    fn report_resets_after_interval() {
        let mut report = FrameReport::default();
        for _ in 0..REPORT_INTERVAL - 1 {
            report.record(Duration::from_millis(16));
        }
        assert_eq!(report.frames, REPORT_INTERVAL - 1);
        report.record(Duration::from_millis(40));
        assert_eq!(report.frames, 0);
        assert_eq!(report.worst, Duration::ZERO);
    }
}
