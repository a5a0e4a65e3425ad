//! Ring-formation physics, observables, and strokes for the Glyphloop simulation.
//!
//! This crate owns the physical substrate of the loop: a fixed population
//! of ink quanta advanced one time-step at a time, the statistics pipeline
//! that reduces it to an observable vector, and the slow stroke channel.
//!
//! # Modules
//!
//! - [`state`] -- [`WorldState`] and seeded population creation / reset.
//! - [`spatial_hash`] -- Uniform 16x16 grid for local neighbor search.
//! - [`physics`] -- The per-step integrator ([`step`]).
//! - [`acts`] -- Operator effect table for active glyph acts.
//! - [`observe`] -- Instant, historical, and blended observables.
//! - [`strokes`] -- Stroke deposit, aging, and pruning.
//! - [`detectors`] -- Read-only loop and cluster detection for narration.

pub mod acts;
pub mod detectors;
pub mod observe;
pub mod physics;
pub mod spatial_hash;
pub mod state;
pub mod strokes;

// Re-export primary entry points at crate root.
pub use detectors::{Cluster, StrokeLoop, WorldEvent, detect_clusters, detect_loops, narrate};
pub use observe::{compute, compute_blended, compute_from_snapshots, compute_instant};
pub use physics::step;
pub use state::{WorldState, create, reset};
pub use strokes::deposit_strokes;
