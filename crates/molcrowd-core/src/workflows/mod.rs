//! # Workflows Module
//!
//! High-level entry points that orchestrate complete crowding scenarios.
//!
//! ## Overview
//!
//! Workflows are the top-level API of molcrowd. They tie the arena, the
//! crowding driver, and the caller's energy evaluator together: building the
//! arena, placing the persistent subject bodies, populating the crowd, and
//! running the Metropolis search, with progress reporting throughout.
//!
//! - **Crowding Workflow** ([`crowd`]) - Arena construction through Monte
//!   Carlo search for one scenario, returning occupancy, per-crowder
//!   placements, and acceptance statistics.

pub mod crowd;
