//! Scene state: everything that decides *what* to draw, with no GPU access.
//!
//! The frame loop feeds key state and elapsed time into [`FrameState::step`]
//! and hands the resulting matrices to a backend.
//!
//! # Invariants
//! - Camera pitch stays strictly inside `(-pi/2, pi/2)`.
//! - `mvp = projection * view * model` for every drawn frame.
//! - A held quit key ends the loop before any movement is applied.

mod camera;
mod config;
mod frame;

pub use camera::{FlyCamera, PITCH_LIMIT};
pub use config::{ConfigError, SceneConfig, TransformOverride};
pub use frame::{FrameMatrices, FrameState, Tick};
