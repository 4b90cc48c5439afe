//! Shared primitives for the kachel tiling pipeline.
//!
//! Contains byte containers, binary value readers/writers, geographic
//! bounding boxes, tile addresses, and the error taxonomy used by the
//! geometry and pipeline crates.

mod concurrency;
mod error;

pub mod io;
pub mod types;

pub use concurrency::WorkerLimits;
pub use error::TilerError;
pub use types::*;
