//! Mara Tracker - live wildlife telemetry engine
//!
//! Reconciles pushed animal positions and local simulated motion into one
//! canonical registry, derives rolling statistics, and records movement paths
//! for the animals the user has selected.

pub mod core;
pub mod dashboard;
pub mod registry;
pub mod selection;
pub mod stats;
pub mod telemetry;
