//! Data models for molecular structures: atoms, residues, chains, and the
//! [`system::MolecularSystem`] container that owns them.

pub mod atom;
pub mod chain;
pub mod ids;
pub mod residue;
pub mod system;
