//! Event types and observers.
//!
//! Submodules:
//! - [`touch`] – pointer touches routed to actors, and the drag observer
pub mod touch;
