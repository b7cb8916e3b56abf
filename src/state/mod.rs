//! State module for the resumable crawl
//!
//! # Components
//!
//! - `Account` / `AccountPhase`: per-account record and lifecycle phases
//! - `GraphState`: the in-memory graph (accounts, identity index, distance and
//!   degree maps, blacklist), loaded at startup and mutated by every other
//!   component

mod account;
mod graph;

// Re-export main types
pub use account::{Account, AccountPhase};
pub use graph::GraphState;
