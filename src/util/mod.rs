//! Basic shared types: errors and the crate-wide result alias.

mod error;

pub use error::{Error, Result};
