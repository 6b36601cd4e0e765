//! # m3g
//!
//! Rust implementation of the JSR-184 Mobile 3D Graphics (.m3g) binary file
//! format.
//!
//! Original format specified by the JSR-184 expert group. All rights to the
//! original belong to the authors. This is an independent Rust implementation
//! aiming to match the on-wire format for binary compatibility.
//!
//! ## Modules
//!
//! - [`util`] - Errors and shared basics
//! - [`codec`] - Primitive stream codec and section framing
//! - [`objects`] - The per-kind object schemas
//! - [`table`] - Object table: reference identity and dependency order
//! - `encode` - Encoding-choice heuristics (vertex narrowing, stripifier)
//! - [`file`] - Whole-file load and save
//!
//! ## Example
//!
//! ```ignore
//! use m3g::file::SceneFile;
//!
//! let file = SceneFile::load("scene.m3g")?;
//! for root in file.roots() {
//!     println!("root object {root}");
//! }
//! ```

pub mod util;
pub mod codec;
pub mod objects;
pub mod table;
pub mod file;

mod encode;

// Re-export commonly used types
pub use codec::{ColorRgb, ColorRgba, CompressionScheme, ObjectIndex};
pub use file::{NoopResolver, ReferenceResolver, SaveOptions, SceneFile, FILE_IDENTIFIER};
pub use util::{Error, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::codec::{ColorRgb, ColorRgba, CompressionScheme, ObjectIndex};
    pub use crate::file::{NoopResolver, ReferenceResolver, SaveOptions, SceneFile};
    pub use crate::objects::*;
    pub use crate::table::{Expect, ObjectTable};
    pub use crate::util::{Error, Result};
}
