use super::ids::{AtomId, ChainId};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The twenty canonical amino acids.
///
/// Conversions accept both one-letter and three-letter codes, matching what
/// mutation specs and structure files use respectively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AminoAcid {
    Alanine,
    Arginine,
    Asparagine,
    AsparticAcid,
    Cysteine,
    GlutamicAcid,
    Glutamine,
    Glycine,
    Histidine,
    Isoleucine,
    Leucine,
    Lysine,
    Methionine,
    Phenylalanine,
    Proline,
    Serine,
    Threonine,
    Tryptophan,
    Tyrosine,
    Valine,
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
#[error("unknown amino acid code: '{0}'")]
pub struct UnknownAminoAcidError(pub String);

impl AminoAcid {
    /// The one-letter code (e.g. `D` for aspartate).
    pub fn one_letter(&self) -> char {
        match self {
            Self::Alanine => 'A',
            Self::Arginine => 'R',
            Self::Asparagine => 'N',
            Self::AsparticAcid => 'D',
            Self::Cysteine => 'C',
            Self::GlutamicAcid => 'E',
            Self::Glutamine => 'Q',
            Self::Glycine => 'G',
            Self::Histidine => 'H',
            Self::Isoleucine => 'I',
            Self::Leucine => 'L',
            Self::Lysine => 'K',
            Self::Methionine => 'M',
            Self::Phenylalanine => 'F',
            Self::Proline => 'P',
            Self::Serine => 'S',
            Self::Threonine => 'T',
            Self::Tryptophan => 'W',
            Self::Tyrosine => 'Y',
            Self::Valine => 'V',
        }
    }

    /// The three-letter code as written in PDB residue records (e.g. `ASP`).
    pub fn three_letter(&self) -> &'static str {
        match self {
            Self::Alanine => "ALA",
            Self::Arginine => "ARG",
            Self::Asparagine => "ASN",
            Self::AsparticAcid => "ASP",
            Self::Cysteine => "CYS",
            Self::GlutamicAcid => "GLU",
            Self::Glutamine => "GLN",
            Self::Glycine => "GLY",
            Self::Histidine => "HIS",
            Self::Isoleucine => "ILE",
            Self::Leucine => "LEU",
            Self::Lysine => "LYS",
            Self::Methionine => "MET",
            Self::Phenylalanine => "PHE",
            Self::Proline => "PRO",
            Self::Serine => "SER",
            Self::Threonine => "THR",
            Self::Tryptophan => "TRP",
            Self::Tyrosine => "TYR",
            Self::Valine => "VAL",
        }
    }

    pub fn from_one_letter(code: char) -> Option<Self> {
        match code.to_ascii_uppercase() {
            'A' => Some(Self::Alanine),
            'R' => Some(Self::Arginine),
            'N' => Some(Self::Asparagine),
            'D' => Some(Self::AsparticAcid),
            'C' => Some(Self::Cysteine),
            'E' => Some(Self::GlutamicAcid),
            'Q' => Some(Self::Glutamine),
            'G' => Some(Self::Glycine),
            'H' => Some(Self::Histidine),
            'I' => Some(Self::Isoleucine),
            'L' => Some(Self::Leucine),
            'K' => Some(Self::Lysine),
            'M' => Some(Self::Methionine),
            'F' => Some(Self::Phenylalanine),
            'P' => Some(Self::Proline),
            'S' => Some(Self::Serine),
            'T' => Some(Self::Threonine),
            'W' => Some(Self::Tryptophan),
            'Y' => Some(Self::Tyrosine),
            'V' => Some(Self::Valine),
            _ => None,
        }
    }

    pub fn from_three_letter(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "ALA" => Some(Self::Alanine),
            "ARG" => Some(Self::Arginine),
            "ASN" => Some(Self::Asparagine),
            "ASP" => Some(Self::AsparticAcid),
            "CYS" => Some(Self::Cysteine),
            "GLU" => Some(Self::GlutamicAcid),
            "GLN" => Some(Self::Glutamine),
            "GLY" => Some(Self::Glycine),
            "HIS" => Some(Self::Histidine),
            "ILE" => Some(Self::Isoleucine),
            "LEU" => Some(Self::Leucine),
            "LYS" => Some(Self::Lysine),
            "MET" => Some(Self::Methionine),
            "PHE" => Some(Self::Phenylalanine),
            "PRO" => Some(Self::Proline),
            "SER" => Some(Self::Serine),
            "THR" => Some(Self::Threonine),
            "TRP" => Some(Self::Tryptophan),
            "TYR" => Some(Self::Tyrosine),
            "VAL" => Some(Self::Valine),
            _ => None,
        }
    }
}

impl FromStr for AminoAcid {
    type Err = UnknownAminoAcidError;

    /// Parses either a one-letter or three-letter code, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let parsed = match trimmed.chars().count() {
            1 => trimmed.chars().next().and_then(Self::from_one_letter),
            3 => Self::from_three_letter(trimmed),
            _ => None,
        };
        parsed.ok_or_else(|| UnknownAminoAcidError(trimmed.to_string()))
    }
}

impl fmt::Display for AminoAcid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.three_letter())
    }
}

/// A residue within a chain.
///
/// Holds the residue's sequence number from the source file, its name
/// (three-letter code for amino acids, arbitrary for hetero residues), and the
/// IDs of its atoms.
#[derive(Debug, Clone, PartialEq)]
pub struct Residue {
    pub residue_number: isize,
    pub name: String,
    pub chain_id: ChainId,
    pub(crate) atoms: Vec<AtomId>,
    atom_name_map: HashMap<String, AtomId>,
}

impl Residue {
    pub(crate) fn new(residue_number: isize, name: &str, chain_id: ChainId) -> Self {
        Self {
            residue_number,
            name: name.to_string(),
            chain_id,
            atoms: Vec::new(),
            atom_name_map: HashMap::new(),
        }
    }

    pub(crate) fn add_atom(&mut self, atom_name: &str, atom_id: AtomId) {
        self.atoms.push(atom_id);
        self.atom_name_map.insert(atom_name.to_string(), atom_id);
    }

    pub(crate) fn remove_atom(&mut self, atom_name: &str, atom_id: AtomId) {
        self.atoms.retain(|&id| id != atom_id);
        self.atom_name_map.remove(atom_name);
    }

    pub fn atoms(&self) -> &[AtomId] {
        &self.atoms
    }

    pub fn get_atom_id_by_name(&self, name: &str) -> Option<AtomId> {
        self.atom_name_map.get(name).copied()
    }

    /// The residue's amino-acid identity, if its name is a canonical code.
    pub fn amino_acid(&self) -> Option<AminoAcid> {
        AminoAcid::from_three_letter(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::KeyData;

    fn dummy_atom_id(n: u64) -> AtomId {
        AtomId::from(KeyData::from_ffi(n))
    }

    fn dummy_chain_id(n: u64) -> ChainId {
        ChainId::from(KeyData::from_ffi(n))
    }

    mod amino_acid_codes {
        use super::*;

        #[test]
        fn one_letter_round_trips_for_all_twenty() {
            let codes = "ARNDCEQGHILKMFPSTWYV";
            for c in codes.chars() {
                let aa = AminoAcid::from_one_letter(c).unwrap();
                assert_eq!(aa.one_letter(), c);
            }
        }

        #[test]
        fn three_letter_round_trips_for_all_twenty() {
            let codes = "ARNDCEQGHILKMFPSTWYV";
            for c in codes.chars() {
                let aa = AminoAcid::from_one_letter(c).unwrap();
                assert_eq!(AminoAcid::from_three_letter(aa.three_letter()), Some(aa));
            }
        }

        #[test]
        fn from_str_accepts_both_code_lengths() {
            assert_eq!("D".parse::<AminoAcid>().unwrap(), AminoAcid::AsparticAcid);
            assert_eq!("asp".parse::<AminoAcid>().unwrap(), AminoAcid::AsparticAcid);
            assert_eq!("Gly".parse::<AminoAcid>().unwrap(), AminoAcid::Glycine);
        }

        #[test]
        fn from_str_rejects_unknown_codes() {
            assert!("X".parse::<AminoAcid>().is_err());
            assert!("XYZ".parse::<AminoAcid>().is_err());
            assert!("ALAN".parse::<AminoAcid>().is_err());
        }
    }

    mod residue_atoms {
        use super::*;

        #[test]
        fn new_residue_initializes_fields_correctly() {
            let chain_id = dummy_chain_id(1);
            let residue = Residue::new(87, "ASP", chain_id);
            assert_eq!(residue.residue_number, 87);
            assert_eq!(residue.name, "ASP");
            assert_eq!(residue.amino_acid(), Some(AminoAcid::AsparticAcid));
            assert!(residue.atoms().is_empty());
            assert!(residue.get_atom_id_by_name("CA").is_none());
        }

        #[test]
        fn add_and_remove_atom_keep_name_map_consistent() {
            let mut residue = Residue::new(5, "ALA", dummy_chain_id(2));
            let atom_id = dummy_atom_id(42);
            residue.add_atom("CA", atom_id);
            assert_eq!(residue.get_atom_id_by_name("CA"), Some(atom_id));
            residue.remove_atom("CA", atom_id);
            assert!(residue.atoms().is_empty());
            assert!(residue.get_atom_id_by_name("CA").is_none());
        }

        #[test]
        fn hetero_residue_has_no_amino_acid_identity() {
            let residue = Residue::new(301, "LIG", dummy_chain_id(3));
            assert_eq!(residue.amino_acid(), None);
        }
    }
}
