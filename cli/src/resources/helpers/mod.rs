//! Helpers shared by resource implementations and the link engine.
pub mod fs;
