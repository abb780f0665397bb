//! Hierarchical NAND-gate netlists: elaboration, simulation and tests.
//!
//! A [`Component`] composes NAND gates, constant sources and other components over named buses.
//! [`Component::flatten`] inlines the hierarchy into gates and constants only,
//! [`Sim`] settles the flat netlist to a fixed point,
//! and [`run_test`] drives a [`Test`] against it.

mod common;
mod loc;
mod error;
mod value;
mod bus;
mod defs;
mod component;
mod system;
mod flatten;
pub mod sim;
pub mod testbench;
pub mod load;

#[cfg(test)]
mod tests;

pub use common::*;
pub use loc::*;
pub use error::*;
pub use value::*;
pub use bus::*;
pub use defs::*;
pub use component::*;
pub use system::*;
pub use flatten::{ScopeName, ScopeWire};
pub use sim::{Sim, SimConfig, PassLimit};
pub use testbench::{run_test, run_system, Diagnostic, DiagnosticKind, TestReport};
pub use load::{load_system_from_file, load_system_from_str};
