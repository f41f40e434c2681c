//! # Engine Module
//!
//! The stateful layer of the library: the packed-sphere occupancy arena and the
//! Metropolis-Hastings driver that re-arranges its crowder occupants.
//!
//! ## Architecture
//!
//! - **Occupancy Arena** ([`arena`]) - Collision-checked assignment of occupants
//!   to lattice cells, vacancy discovery, occupant relocation, on-demand growth.
//! - **Crowding Driver** ([`crowding`]) - The accept/reject loop, its per-crowder
//!   bookkeeping, and the [`crowding::EnergyModel`] seam to the external energy
//!   evaluator.
//! - **Progress Monitoring** ([`progress`]) - Observer callbacks for phase and
//!   iteration reporting, injected at construction instead of ambient state.
//! - **Error Handling** ([`error`]) - Collision and capacity signals, and the
//!   engine-level error wrapper.

pub mod arena;
pub mod crowding;
pub mod error;
pub mod progress;
