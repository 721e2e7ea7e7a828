//! Sprint board command line tools
//!
//! Library half of the `sprintboard` binary: a scripted simulator that drives
//! a [`board_sync::BoardSession`] over an in-memory server, and text
//! rendering of its results.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod render;
pub mod simulate;

pub use simulate::{run_simulation, Failure, Script, ScriptStep, SimulationReport, StepReport};
