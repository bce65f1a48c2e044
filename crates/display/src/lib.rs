//! Display surface: a memory-mapped Linux framebuffer and the pixel packer
//! that writes rendered RGBA frames into it.
//!
//! # Invariants
//! - Geometry is queried once at open and never changes afterwards.
//! - Only 16, 24 and 32 bits per pixel are accepted; other depths fail at open.
//! - `blit` never writes outside the destination slice and never panics.

mod blit;
mod fb;
mod layout;

pub use blit::blit;
pub use fb::{DisplayError, Framebuffer};
pub use layout::{Bitfield, SurfaceLayout};
