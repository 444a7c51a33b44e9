//! ECS components for actors.
//!
//! Submodules overview:
//! - [`actor`] – identity and class name of a scripted actor
//! - [`boxcollider`] – axis-aligned rectangle used for spatial queries
//! - [`coordinator`] – pending-operation counter that makes commands block
//! - [`mapposition`] – world-space position of an actor
//! - [`motion`] – destination, velocity and movement flags
//! - [`pathtrail`] – the line a turtle leaves behind
//! - [`persistent`] – marker for entities that survive a session clear
//! - [`rotation`] – heading in degrees
//! - [`stagemember`] – stage membership and collision category
//! - [`visibility`] – hidden marker

pub mod actor;
pub mod boxcollider;
pub mod coordinator;
pub mod mapposition;
pub mod motion;
pub mod pathtrail;
pub mod persistent;
pub mod rotation;
pub mod stagemember;
pub mod visibility;
