//! Low-level binary codec: primitive reads/writes and section framing.

mod section;
mod stream;
mod types;

pub use section::{deflate, read_section, write_section, CompressionScheme};
pub use stream::{M3gReader, M3gWriter};
pub use types::{ColorRgb, ColorRgba, ObjectIndex};
