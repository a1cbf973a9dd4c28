//! Pure scheme-to-scheme transformations
//!
//! Each transform returns a fresh tree and never touches its input, so a
//! stored scheme can be shared between callers.

mod interlacer;
mod relativizer;

pub use interlacer::*;
pub use relativizer::*;
