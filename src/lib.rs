//! Ropewalk platformer core library
//!
//! Locomotion, ground sensing and the deployable tether for a 2.5D
//! platformer character, on top of a rapier3d physics world.

pub mod config;
pub mod game;
