use crate::core::models::atom::AtomRole;
use crate::core::models::residue::AminoAcid;
use crate::core::models::system::MolecularSystem;
use crate::engine::error::EngineError;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::info;

/// A single-residue substitution request.
///
/// Constructed from user input, consumed once by [`apply_mutation`], and
/// discarded. When `expected_original` is set, the residue found at
/// `(chain, residue_number)` must match it; a mismatch is a hard validation
/// failure, never a silent override.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationSpec {
    pub chain: char,
    pub residue_number: isize,
    pub expected_original: Option<AminoAcid>,
    pub target: AminoAcid,
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
#[error("invalid mutation spec '{spec}': {reason}")]
pub struct ParseMutationError {
    pub spec: String,
    pub reason: String,
}

impl MutationSpec {
    /// Parses the colon-separated forms `RES:NEW`, `CHAIN:RES:NEW`, and
    /// `CHAIN:RES:OLD:NEW` (e.g. `87:G`, `A:87:G`, `A:87:D:G`). The chain
    /// defaults to `A`; the identity check is skipped only when no OLD field
    /// was given. Amino acids accept one- or three-letter codes.
    pub fn parse(spec: &str) -> Result<Self, ParseMutationError> {
        let err = |reason: String| ParseMutationError {
            spec: spec.to_string(),
            reason,
        };

        let parts: Vec<&str> = spec.trim().split(':').collect();
        let (chain, number, expected, target) = match parts.as_slice() {
            [number, target] => ('A', *number, None, *target),
            [chain, number, target] => {
                let chain = parse_chain(chain).map_err(&err)?;
                (chain, *number, None, *target)
            }
            [chain, number, expected, target] => {
                let chain = parse_chain(chain).map_err(&err)?;
                (chain, *number, Some(*expected), *target)
            }
            _ => {
                return Err(err(
                    "expected RES:NEW, CHAIN:RES:NEW, or CHAIN:RES:OLD:NEW".to_string(),
                ));
            }
        };

        let residue_number: isize = number
            .parse()
            .map_err(|_| err(format!("bad residue number '{number}'")))?;
        if residue_number < 1 {
            return Err(err(format!(
                "residue number must be >= 1, got {residue_number}"
            )));
        }

        let expected_original = match expected {
            Some(code) => Some(
                AminoAcid::from_str(code)
                    .map_err(|e| err(e.to_string()))?,
            ),
            None => None,
        };
        let target = AminoAcid::from_str(target).map_err(|e| err(e.to_string()))?;

        Ok(Self {
            chain,
            residue_number,
            expected_original,
            target,
        })
    }
}

fn parse_chain(field: &str) -> Result<char, String> {
    let mut chars = field.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphanumeric() => Ok(c.to_ascii_uppercase()),
        _ => Err(format!("bad chain identifier '{field}'")),
    }
}

impl fmt::Display for MutationSpec {
    /// Renders the conventional mutation shorthand, e.g. `A:D87G` (or `A:87G`
    /// when the original residue was not specified).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.expected_original {
            Some(original) => write!(
                f,
                "{}:{}{}{}",
                self.chain,
                original.one_letter(),
                self.residue_number,
                self.target.one_letter()
            ),
            None => write!(
                f,
                "{}:{}{}",
                self.chain,
                self.residue_number,
                self.target.one_letter()
            ),
        }
    }
}

/// Applies a single-residue substitution, producing a new structure.
///
/// The input structure is never modified; the wild type stays available for
/// parallel comparison runs. Backbone atoms of the mutated residue are
/// retained; its side-chain atoms are removed so the chemistry toolkit can
/// regenerate them for the new identity during preparation.
pub fn apply_mutation(
    structure: &MolecularSystem,
    spec: &MutationSpec,
) -> Result<MolecularSystem, EngineError> {
    let not_found = || EngineError::ResidueNotFound {
        chain: spec.chain,
        residue_number: spec.residue_number,
    };

    let chain_id = structure.find_chain_by_id(spec.chain).ok_or_else(not_found)?;
    let residue_id = structure
        .find_residue_by_id(chain_id, spec.residue_number)
        .ok_or_else(not_found)?;
    let residue = structure.residue(residue_id).ok_or_else(not_found)?;

    let found = residue.amino_acid();
    if let Some(expected) = spec.expected_original {
        if found != Some(expected) {
            return Err(EngineError::ResidueMismatch {
                chain: spec.chain,
                residue_number: spec.residue_number,
                expected: expected.three_letter().to_string(),
                found: residue.name.clone(),
            });
        }
    }

    let mut mutated = structure.clone();

    let sidechain_atoms: Vec<_> = residue
        .atoms()
        .iter()
        .copied()
        .filter(|&atom_id| {
            mutated
                .atom(atom_id)
                .is_some_and(|atom| atom.role == AtomRole::Sidechain)
        })
        .collect();
    for atom_id in sidechain_atoms {
        mutated.remove_atom(atom_id);
    }

    mutated
        .rename_residue(residue_id, spec.target.three_letter())
        .ok_or_else(not_found)?;

    info!(
        chain = %spec.chain,
        residue = spec.residue_number,
        from = %residue.name,
        to = %spec.target.three_letter(),
        "Applied point mutation"
    );

    Ok(mutated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use crate::core::models::chain::ChainType;
    use nalgebra::Point3;

    /// Chain A with ASP 87 (backbone + CB/CG/OD1/OD2 side chain) and GLY 88.
    fn aspartate_system() -> MolecularSystem {
        let mut system = MolecularSystem::new();
        let chain_a = system.add_chain('A', ChainType::Protein);

        let asp = system.add_residue(chain_a, 87, "ASP").unwrap();
        for (name, y) in [
            ("N", 0.0),
            ("CA", 1.0),
            ("C", 2.0),
            ("O", 3.0),
            ("CB", 4.0),
            ("CG", 5.0),
            ("OD1", 6.0),
            ("OD2", 7.0),
        ] {
            let atom = Atom::new(name, asp, Point3::new(0.0, y, 0.0));
            system.add_atom_to_residue(asp, atom).unwrap();
        }

        let gly = system.add_residue(chain_a, 88, "GLY").unwrap();
        for (name, y) in [("N", 10.0), ("CA", 11.0), ("C", 12.0), ("O", 13.0)] {
            let atom = Atom::new(name, gly, Point3::new(1.0, y, 0.0));
            system.add_atom_to_residue(gly, atom).unwrap();
        }

        system
    }

    mod spec_parsing {
        use super::*;

        #[test]
        fn parses_all_three_forms() {
            let short = MutationSpec::parse("87:G").unwrap();
            assert_eq!(short.chain, 'A');
            assert_eq!(short.residue_number, 87);
            assert_eq!(short.expected_original, None);
            assert_eq!(short.target, AminoAcid::Glycine);

            let with_chain = MutationSpec::parse("B:12:W").unwrap();
            assert_eq!(with_chain.chain, 'B');
            assert_eq!(with_chain.target, AminoAcid::Tryptophan);

            let full = MutationSpec::parse("A:87:D:G").unwrap();
            assert_eq!(full.expected_original, Some(AminoAcid::AsparticAcid));
            assert_eq!(full.target, AminoAcid::Glycine);
        }

        #[test]
        fn accepts_three_letter_codes() {
            let spec = MutationSpec::parse("A:87:ASP:GLY").unwrap();
            assert_eq!(spec.expected_original, Some(AminoAcid::AsparticAcid));
            assert_eq!(spec.target, AminoAcid::Glycine);
        }

        #[test]
        fn rejects_malformed_specs() {
            assert!(MutationSpec::parse("87").is_err());
            assert!(MutationSpec::parse("A:87:D:G:extra").is_err());
            assert!(MutationSpec::parse("A:notanumber:G").is_err());
            assert!(MutationSpec::parse("A:0:G").is_err());
            assert!(MutationSpec::parse("A:87:Z").is_err());
            assert!(MutationSpec::parse("AB:87:G").is_err());
        }

        #[test]
        fn display_uses_mutation_shorthand() {
            let spec = MutationSpec::parse("A:87:D:G").unwrap();
            assert_eq!(spec.to_string(), "A:D87G");
            let unchecked = MutationSpec::parse("87:G").unwrap();
            assert_eq!(unchecked.to_string(), "A:87G");
        }
    }

    mod application {
        use super::*;

        #[test]
        fn mutation_replaces_identity_and_strips_side_chain() {
            let system = aspartate_system();
            let spec = MutationSpec::parse("A:87:D:G").unwrap();

            let mutated = apply_mutation(&system, &spec).unwrap();

            let chain_a = mutated.find_chain_by_id('A').unwrap();
            let residue_id = mutated.find_residue_by_id(chain_a, 87).unwrap();
            let residue = mutated.residue(residue_id).unwrap();
            assert_eq!(residue.name, "GLY");
            assert_eq!(residue.amino_acid(), Some(AminoAcid::Glycine));

            // Backbone survives, side chain is gone.
            for name in ["N", "CA", "C", "O"] {
                assert!(residue.get_atom_id_by_name(name).is_some(), "missing {name}");
            }
            for name in ["CB", "CG", "OD1", "OD2"] {
                assert!(residue.get_atom_id_by_name(name).is_none(), "kept {name}");
            }
        }

        #[test]
        fn other_residues_are_untouched() {
            let system = aspartate_system();
            let spec = MutationSpec::parse("A:87:D:G").unwrap();

            let mutated = apply_mutation(&system, &spec).unwrap();

            let chain_a = mutated.find_chain_by_id('A').unwrap();
            let gly_id = mutated.find_residue_by_id(chain_a, 88).unwrap();
            let neighbor = mutated.residue(gly_id).unwrap();
            assert_eq!(neighbor.name, "GLY");
            assert_eq!(neighbor.atoms().len(), 4);

            let ca_id = neighbor.get_atom_id_by_name("CA").unwrap();
            let ca = mutated.atom(ca_id).unwrap();
            assert_eq!(ca.position, Point3::new(1.0, 11.0, 0.0));
        }

        #[test]
        fn input_structure_is_never_modified() {
            let system = aspartate_system();
            let spec = MutationSpec::parse("A:87:D:G").unwrap();

            let atoms_before = system.atom_count();
            apply_mutation(&system, &spec).unwrap();

            assert_eq!(system.atom_count(), atoms_before);
            let chain_a = system.find_chain_by_id('A').unwrap();
            let asp_id = system.find_residue_by_id(chain_a, 87).unwrap();
            assert_eq!(system.residue(asp_id).unwrap().name, "ASP");
        }

        #[test]
        fn identity_mismatch_fails_and_leaves_input_unchanged() {
            let system = aspartate_system();
            let spec = MutationSpec::parse("A:87:E:G").unwrap();

            let result = apply_mutation(&system, &spec);
            match result {
                Err(EngineError::ResidueMismatch {
                    chain,
                    residue_number,
                    expected,
                    found,
                }) => {
                    assert_eq!(chain, 'A');
                    assert_eq!(residue_number, 87);
                    assert_eq!(expected, "GLU");
                    assert_eq!(found, "ASP");
                }
                other => panic!("expected ResidueMismatch, got {other:?}"),
            }

            let chain_a = system.find_chain_by_id('A').unwrap();
            let asp_id = system.find_residue_by_id(chain_a, 87).unwrap();
            assert_eq!(system.residue(asp_id).unwrap().name, "ASP");
            assert_eq!(system.residue(asp_id).unwrap().atoms().len(), 8);
        }

        #[test]
        fn unknown_residue_number_fails_with_residue_not_found() {
            let system = aspartate_system();
            let spec = MutationSpec::parse("A:999:G").unwrap();
            assert!(matches!(
                apply_mutation(&system, &spec),
                Err(EngineError::ResidueNotFound {
                    chain: 'A',
                    residue_number: 999
                })
            ));
        }

        #[test]
        fn unknown_chain_fails_with_residue_not_found() {
            let system = aspartate_system();
            let spec = MutationSpec::parse("C:87:G").unwrap();
            assert!(matches!(
                apply_mutation(&system, &spec),
                Err(EngineError::ResidueNotFound { chain: 'C', .. })
            ));
        }

        #[test]
        fn unchecked_spec_skips_identity_validation() {
            let system = aspartate_system();
            let spec = MutationSpec::parse("A:87:W").unwrap();
            let mutated = apply_mutation(&system, &spec).unwrap();

            let chain_a = mutated.find_chain_by_id('A').unwrap();
            let residue_id = mutated.find_residue_by_id(chain_a, 87).unwrap();
            assert_eq!(mutated.residue(residue_id).unwrap().name, "TRP");
        }
    }
}
