//! Input: raw evdev keyboard events folded into a fixed set of key flags.
//!
//! # Invariants
//! - `KeyState` is written only by `Keyboard::poll` and read by the frame update.
//! - Polling never blocks; an empty queue is not an error.
//! - Auto-repeat counts as held. Codes outside the key set are ignored.

mod device;
mod keys;

pub use device::{InputError, Keyboard};
pub use keys::{Key, KeyState};
