use super::ids::ResidueId;
use nalgebra::Point3;

/// Represents the role or classification of an atom within a molecular structure.
///
/// The mutation and relaxation stages distinguish backbone atoms (retained across
/// a substitution, restrained during minimization) from side-chain atoms
/// (regenerated by the chemistry toolkit after a substitution).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AtomRole {
    /// Backbone atom, part of the main chain in proteins (e.g. N, CA, C, O).
    Backbone,
    /// Sidechain atom, part of the side groups attached to the backbone.
    Sidechain,
    /// Ligand atom, belonging to a small molecule bound to the structure.
    Ligand,
    /// Water molecule atom.
    Water,
    /// Unknown or unclassified atom role.
    #[default]
    Other,
}

/// Atom names that make up the protein main chain.
///
/// OXT only occurs on the C-terminal residue but is still backbone when present.
pub const BACKBONE_ATOM_NAMES: &[&str] = &["N", "CA", "C", "O", "OXT"];

/// The three canonical anchor atoms used for backbone positional restraints
/// during energy relaxation.
pub const RESTRAINT_ANCHOR_NAMES: &[&str] = &["N", "CA", "C"];

/// An atom in a molecular structure.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// The name of the atom (e.g. "CA", "N", "O").
    pub name: String,
    /// The ID of the parent residue this atom belongs to.
    pub residue_id: ResidueId,
    /// The role or classification of the atom in the molecular structure.
    pub role: AtomRole,
    /// Element symbol (e.g. "C", "N", "S"); empty when the source file omits it.
    pub element: String,
    /// The 3D coordinates of the atom in Angstroms.
    pub position: Point3<f64>,
}

impl Atom {
    /// Creates a new `Atom` with the given name, parent residue, and position.
    ///
    /// The role is inferred from the atom name (backbone names map to
    /// [`AtomRole::Backbone`], everything else defaults to
    /// [`AtomRole::Sidechain`]); callers dealing with ligands or waters
    /// override it afterward.
    pub fn new(name: &str, residue_id: ResidueId, position: Point3<f64>) -> Self {
        let role = if BACKBONE_ATOM_NAMES.contains(&name) {
            AtomRole::Backbone
        } else {
            AtomRole::Sidechain
        };
        Self {
            name: name.to_string(),
            residue_id,
            role,
            element: String::new(),
            position,
        }
    }

    /// Whether this atom is one of the backbone restraint anchors (N, CA, C).
    pub fn is_restraint_anchor(&self) -> bool {
        RESTRAINT_ANCHOR_NAMES.contains(&self.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::KeyData;

    fn dummy_residue_id() -> ResidueId {
        ResidueId::from(KeyData::from_ffi(1))
    }

    #[test]
    fn backbone_names_are_classified_as_backbone() {
        for name in ["N", "CA", "C", "O", "OXT"] {
            let atom = Atom::new(name, dummy_residue_id(), Point3::origin());
            assert_eq!(atom.role, AtomRole::Backbone, "atom {name}");
        }
    }

    #[test]
    fn non_backbone_names_default_to_sidechain() {
        let atom = Atom::new("CB", dummy_residue_id(), Point3::origin());
        assert_eq!(atom.role, AtomRole::Sidechain);
    }

    #[test]
    fn restraint_anchors_are_n_ca_c_only() {
        let anchor = Atom::new("CA", dummy_residue_id(), Point3::origin());
        assert!(anchor.is_restraint_anchor());
        let carbonyl_o = Atom::new("O", dummy_residue_id(), Point3::origin());
        assert!(!carbonyl_o.is_restraint_anchor());
    }
}
