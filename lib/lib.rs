#![allow(non_snake_case)]

//! Tools for simulating quantum circuits restricted to the Clifford group
//! using the stabilizer tableau formalism.
//!
//! Assumes all operations applied to a [`Tableau`][tableau::Tableau] are
//! Clifford-group transformations (i.e. Hadamard, Pauli, singly controlled
//! Pauli, or phase rotations that are integer multiples of π/2). Anything
//! else is routed through a [`GateDispatcher`][dispatch::GateDispatcher],
//! which either finds an exact Clifford realization or reports the operation
//! as unsupported.

pub mod error;
pub mod gate;
pub mod tableau;
pub mod measure;
pub mod merge;
pub mod clifford;
pub mod dispatch;
pub mod sim;
