//! Hypergrid - descriptor-driven hyper tree grid construction

pub mod core;
pub mod descriptor;
pub mod grid;
pub mod generation;
