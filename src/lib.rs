//! Ring Road Traffic Simulation Library
//!
//! A microscopic simulation of vehicles on a closed circular multi-lane
//! road, used to reproduce density-flow and density-speed curves.

pub mod simulation;
