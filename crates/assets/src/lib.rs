//! Asset pipeline: mesh data prepared on the CPU before any GPU upload.
//!
//! The renderer consumes [`MeshData`], never raw file paths. Loading either
//! yields a complete, drawable mesh or an error; nothing is half-built.
//!
//! # Invariants
//! - `normals.len() == positions.len()` after a successful load.
//! - `texcoords`, when present, has one entry per position.
//! - Every index is in range and the index count is a non-zero multiple of 3.

mod mesh;
mod obj;

use std::path::PathBuf;

pub use mesh::{DEFAULT_MODEL_SCALE, MeshData, debug_cuboid};
pub use obj::load_obj;

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to load OBJ {path}: {source}")]
    Obj {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },
    #[error("mesh {path} is empty ({vertices} vertices, {faces} faces)")]
    Empty {
        path: PathBuf,
        vertices: usize,
        faces: usize,
    },
    #[error("mesh index {index} out of range for {vertices} vertices")]
    IndexOutOfRange { index: u32, vertices: usize },
}
