// Team domain module
// Contains the team aggregate and its write payloads

#![allow(clippy::module_inception)]

pub mod team;

pub use team::{Team, TeamData, TeamPatch};
