//! Network builders, graph export, and a parallel batch driver on top of
//! [`queuesim_core`].
//!
//! This crate is the "model" layer: it never adds a new station kind, it
//! only wires `queuesim_core`'s stations into the canned topologies and
//! matrix-driven networks described in its companion functions, and runs
//! many such networks concurrently when a caller needs a parameter sweep
//! rather than a single run.

pub mod graph;
pub mod network;
pub mod parallel;
