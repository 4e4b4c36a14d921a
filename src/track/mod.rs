//! Frame-to-frame vortex identity tracking.

pub mod matrix;
pub mod transition;

pub use matrix::VortexTransitionMatrix;
pub use transition::{EventKind, VortexEvent, VortexSequence, VortexTransition};
