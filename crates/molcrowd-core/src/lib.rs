//! # molcrowd Core Library
//!
//! A library for placing rigid molecular bodies into a bounded spatial arena and
//! re-arranging them with a Metropolis-Hastings Monte Carlo search, built around a
//! hexagonally close-packed sphere lattice with constant-time occupancy tests.
//!
//! ## Architectural Philosophy
//!
//! The library is designed with a strict three-layer architecture to ensure a clear
//! separation of concerns, making it modular, testable, and extensible.
//!
//! - **[`core`]: The Foundation.** Contains the stateless building blocks: the HCP
//!   lattice coordinate system (`HcpGeometry`, `LatticeRef`), occupant tags, and
//!   small geometric utilities such as uniform random rotations.
//!
//! - **[`engine`]: The Logic Core.** This stateful layer owns the occupancy arena
//!   (`PackedSphereArena`), the collision-checked mutation operations on it, and
//!   the Metropolis crowding driver together with its `EnergyModel` collaborator
//!   seam.
//!
//! - **[`workflows`]: The Public API.** The highest-level, user-facing layer. It
//!   ties the `engine` and `core` together to execute a complete crowding
//!   scenario: arena construction, subject placement, crowder population, and the
//!   Monte Carlo search.

pub mod core;
pub mod engine;
pub mod workflows;
