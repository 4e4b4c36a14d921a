//! Vortex extraction: puncture detection on faces, edges, and their
//! aggregation into cells and prisms, plus the spatial and temporal tracers
//! that turn punctures into lines and frame-to-frame correspondences.

pub mod dataset;
pub mod extractor;
pub mod puncture;
pub mod space;
pub mod time;

pub use dataset::{Complex, Dataset, TimeSlot};
pub use extractor::{PrismStats, VortexExtractor};
pub use puncture::{PuncturedCell, PuncturedEdge, PuncturedFace};
pub use space::{EventMarker, MarkerKind, SpaceTrace};
pub use time::Correspondence;
