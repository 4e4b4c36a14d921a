//! Polyline geometry and smoothing for traced vortices.

pub mod bezier;
pub mod line;

pub use bezier::BezierCurve;
pub use line::VortexLine;
