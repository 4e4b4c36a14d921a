//! On-disk formats.
//!
//! Everything binary shares the framing in [`wire`]: the mesh graph cache,
//! the per-frame puncture caches, and the vortex line files with their
//! offset sidecar. [`vtk`] is the one text format, for viewers.

pub mod graph_file;
pub mod line_file;
pub mod puncture_file;
pub mod vtk;
pub mod wire;

pub use graph_file::{decode_graph, encode_graph, read_graph_file, write_graph_file};
pub use line_file::{decode_frame, encode_frame, write_line_files, VortexFileReader};
pub use vtk::{write_vtk, write_vtk_file};
