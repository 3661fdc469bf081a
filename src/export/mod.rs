//! Export of reconstructed geometries to GMT-style text files.
//!
//! Supports plain `.xy` coordinate lists and `.gmt` files whose segments
//! carry feature metadata headers.

mod format;
mod writer;

pub use format::ExportFormat;
pub use writer::{export, write_geometries, ExportError, ExportSummary};
