//! Spawn logic consists of 3 parts:
//!
//! - The scheduler counts down every spawn point and decides when it triggers
//! - The occupancy gate decides whether a trigger may spawn at all
//! - Accounting caps the tracked objects a spawn point may have in the world
//!
pub mod accounting;
pub mod occupancy;
pub mod scheduler;
