//! Data sources that do not come from a measurement file.

pub mod synth;

pub use synth::*;
