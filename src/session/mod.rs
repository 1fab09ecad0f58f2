//! The controller session: one [`Ch376Msc`] per physical chip.
//!
//! Operations are split by concern into separate `impl` blocks on the same
//! driver struct.

mod attach;
mod driver;
mod files;
mod format;
mod path;
mod read;
mod write;

pub use driver::{Ch376Msc, FileName};
pub use read::ReadChunk;
pub use write::WriteChunk;

use crate::{bus::Ch376Transport, error::Ch376Error};

/// Result of a session operation over transport `T`.
pub type Ch376Result<V, T> = Result<V, Ch376Error<<T as Ch376Transport>::Error>>;
