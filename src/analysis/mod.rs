//! Analysis modules.
//!
//! `collector` runs the plugins and assembles the report; `aggregator`
//! scores categories and summarizes issues.

pub mod aggregator;
pub mod collector;

pub use aggregator::*;
pub use collector::{collect, CollectOptions};
