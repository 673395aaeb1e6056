//! Filesystem primitives for Mirror Manager
//!
//! Normalized path handling plus the small set of durable I/O operations the
//! rest of the workspace relies on: atomic writes for run logs and typed JSON
//! read/write for catalog files.

pub mod error;
pub mod io;
pub mod path;

pub use error::{Error, Result};
pub use io::{read_json, read_text, write_atomic, write_json};
pub use path::NormalizedPath;
