//! # Core Module
//!
//! Foundational data structures and I/O for molecular structures.
//!
//! Everything in this layer is stateless with respect to the docking pipeline:
//! a [`models::system::MolecularSystem`] is an immutable value as far as the
//! engine stages are concerned. Stages that change a structure produce a new
//! one and leave their input untouched.

pub mod io;
pub mod models;
