use super::traits::MolecularFile;
use crate::core::models::atom::{Atom, AtomRole};
use crate::core::models::chain::ChainType;
use crate::core::models::ids::ChainId;
use crate::core::models::system::MolecularSystem;
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PdbError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Malformed {record} record on line {line}: {reason}")]
    MalformedRecord {
        record: &'static str,
        line: usize,
        reason: String,
    },

    #[error("No atoms found in PDB input")]
    Empty,
}

/// Reader/writer for the PDB text format.
///
/// Parsing is column-based and tolerant: only ATOM and HETATM records are
/// consumed, everything else (REMARK, CONECT, ANISOU, ...) is skipped. Alternate
/// locations other than blank or 'A' are dropped so each atom appears once.
pub struct PdbFile;

const WATER_RESIDUE_NAMES: &[&str] = &["HOH", "WAT", "TIP3"];

fn slice_cols(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end.min(line.len())).unwrap_or("")
}

fn parse_coord(
    line: &str,
    start: usize,
    end: usize,
    line_number: usize,
) -> Result<f64, PdbError> {
    slice_cols(line, start, end)
        .trim()
        .parse::<f64>()
        .map_err(|e| PdbError::MalformedRecord {
            record: "ATOM",
            line: line_number,
            reason: format!("bad coordinate field: {e}"),
        })
}

impl MolecularFile for PdbFile {
    type Error = PdbError;

    fn read_from(reader: &mut impl BufRead) -> Result<MolecularSystem, Self::Error> {
        let mut system = MolecularSystem::new();
        let mut chain_ids: HashMap<char, ChainId> = HashMap::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let line_number = index + 1;

            let is_atom = line.starts_with("ATOM");
            let is_hetatm = line.starts_with("HETATM");
            if !is_atom && !is_hetatm {
                continue;
            }

            let alt_loc = slice_cols(&line, 16, 17).chars().next().unwrap_or(' ');
            if alt_loc != ' ' && alt_loc != 'A' {
                continue;
            }

            let name = slice_cols(&line, 12, 16).trim().to_string();
            if name.is_empty() {
                return Err(PdbError::MalformedRecord {
                    record: if is_atom { "ATOM" } else { "HETATM" },
                    line: line_number,
                    reason: "missing atom name".to_string(),
                });
            }
            let res_name = slice_cols(&line, 17, 20).trim().to_string();
            let chain_char = slice_cols(&line, 21, 22).chars().next().unwrap_or(' ');
            let chain_char = if chain_char == ' ' { 'A' } else { chain_char };
            let residue_number: isize = slice_cols(&line, 22, 26)
                .trim()
                .parse()
                .map_err(|e| PdbError::MalformedRecord {
                    record: if is_atom { "ATOM" } else { "HETATM" },
                    line: line_number,
                    reason: format!("bad residue number: {e}"),
                })?;

            let x = parse_coord(&line, 30, 38, line_number)?;
            let y = parse_coord(&line, 38, 46, line_number)?;
            let z = parse_coord(&line, 46, 54, line_number)?;
            let element = slice_cols(&line, 76, 78).trim().to_string();

            let is_water = WATER_RESIDUE_NAMES.contains(&res_name.as_str());
            let chain_type = if is_atom {
                ChainType::Protein
            } else if is_water {
                ChainType::Water
            } else {
                ChainType::Ligand
            };

            let chain_id = *chain_ids
                .entry(chain_char)
                .or_insert_with(|| system.add_chain(chain_char, chain_type));
            let residue_id = system
                .add_residue(chain_id, residue_number, &res_name)
                .ok_or_else(|| PdbError::MalformedRecord {
                    record: if is_atom { "ATOM" } else { "HETATM" },
                    line: line_number,
                    reason: "residue rejected by system".to_string(),
                })?;

            let mut atom = Atom::new(&name, residue_id, nalgebra::Point3::new(x, y, z));
            atom.element = element;
            if is_hetatm {
                atom.role = if is_water {
                    AtomRole::Water
                } else {
                    AtomRole::Ligand
                };
            }
            system.add_atom_to_residue(residue_id, atom);
        }

        if system.atom_count() == 0 {
            return Err(PdbError::Empty);
        }
        Ok(system)
    }

    fn write_to(system: &MolecularSystem, writer: &mut impl Write) -> Result<(), Self::Error> {
        let mut serial: usize = 0;

        let mut chains: Vec<_> = system.chains_iter().map(|(_, c)| c).collect();
        chains.sort_by_key(|c| c.id);

        for chain in &chains {
            for &residue_id in chain.residues() {
                let residue = match system.residue(residue_id) {
                    Some(r) => r,
                    None => continue,
                };
                for &atom_id in residue.atoms() {
                    let atom = match system.atom(atom_id) {
                        Some(a) => a,
                        None => continue,
                    };
                    serial += 1;
                    let record = match atom.role {
                        AtomRole::Backbone | AtomRole::Sidechain => "ATOM  ",
                        _ => "HETATM",
                    };
                    // Four-character atom names fill the whole field; shorter
                    // names are indented one column per the PDB convention.
                    let name_field = if atom.name.len() >= 4 {
                        atom.name.clone()
                    } else {
                        format!(" {:<3}", atom.name)
                    };
                    writeln!(
                        writer,
                        "{record}{serial:>5} {name_field:<4} {res_name:>3} {chain}{res_num:>4}    {x:>8.3}{y:>8.3}{z:>8.3}  1.00  0.00          {element:>2}",
                        record = record,
                        serial = serial,
                        name_field = name_field,
                        res_name = residue.name,
                        chain = chain.id,
                        res_num = residue.residue_number,
                        x = atom.position.x,
                        y = atom.position.y,
                        z = atom.position.z,
                        element = atom.element,
                    )?;
                }
            }
            writeln!(writer, "TER")?;
        }
        writeln!(writer, "END")?;
        Ok(())
    }
}
