//! Report output: formatting and persistence.

pub mod generator;
pub mod persist;

pub use generator::*;
pub use persist::*;
