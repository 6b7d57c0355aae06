//! Structure file I/O.
//!
//! Only the PDB text format is read and written natively; every other format
//! the external engines require (PDBQT and friends) is produced by the
//! chemistry toolkit at the [`crate::engine::convert`] boundary.

pub mod pdb;
pub mod traits;
