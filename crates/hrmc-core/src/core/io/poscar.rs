use crate::core::io::traits::StructureFile;
use crate::core::models::configuration::Configuration;
use crate::core::models::lattice::{Lattice, LatticeError};
use crate::core::models::site::Site;
use nalgebra::{Matrix3, Point3, Vector3};
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PoscarError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse {
        line: usize,
        kind: PoscarParseErrorKind,
    },
    #[error("Invalid lattice: {0}")]
    Lattice(#[from] LatticeError),
    #[error("Unexpected end of file: {0}")]
    Truncated(&'static str),
}

#[derive(Debug, Error)]
pub enum PoscarParseErrorKind {
    #[error("Invalid float value '{0}'")]
    InvalidFloat(String),
    #[error("Invalid atom count '{0}'")]
    InvalidCount(String),
    #[error("Expected {expected} values, found {found}")]
    WrongFieldCount { expected: usize, found: usize },
    #[error("Species names are required on line 6 (VASP 5 format)")]
    MissingSpecies,
    #[error("Species line has {species} entries but count line has {counts}")]
    SpeciesCountMismatch { species: usize, counts: usize },
    #[error("Unknown coordinate mode '{0}', expected Direct or Cartesian")]
    UnknownCoordinateMode(String),
}

/// VASP POSCAR/CONTCAR structure files (VASP 5 flavor, species names required).
pub struct PoscarFile;

struct LineReader<'a, R: BufRead> {
    lines: std::io::Lines<&'a mut R>,
    line_num: usize,
}

impl<'a, R: BufRead> LineReader<'a, R> {
    fn new(reader: &'a mut R) -> Self {
        Self {
            lines: reader.lines(),
            line_num: 0,
        }
    }

    fn next_line(&mut self, what: &'static str) -> Result<String, PoscarError> {
        self.line_num += 1;
        match self.lines.next() {
            Some(line) => Ok(line?),
            None => Err(PoscarError::Truncated(what)),
        }
    }

    fn parse_error(&self, kind: PoscarParseErrorKind) -> PoscarError {
        PoscarError::Parse {
            line: self.line_num,
            kind,
        }
    }

    fn floats(&self, line: &str, expected: usize) -> Result<Vec<f64>, PoscarError> {
        let fields: Vec<&str> = line.split_whitespace().take(expected).collect();
        if fields.len() < expected {
            return Err(self.parse_error(PoscarParseErrorKind::WrongFieldCount {
                expected,
                found: fields.len(),
            }));
        }
        fields
            .iter()
            .map(|f| {
                f.parse::<f64>()
                    .map_err(|_| self.parse_error(PoscarParseErrorKind::InvalidFloat(f.to_string())))
            })
            .collect()
    }
}

fn species_runs(configuration: &Configuration) -> Vec<(&str, usize)> {
    let mut runs: Vec<(&str, usize)> = Vec::new();
    for site in configuration.sites() {
        match runs.last_mut() {
            Some((species, count)) if *species == site.species => *count += 1,
            _ => runs.push((site.species.as_str(), 1)),
        }
    }
    runs
}

impl StructureFile for PoscarFile {
    type Error = PoscarError;

    fn read_from(reader: &mut impl BufRead) -> Result<Configuration, Self::Error> {
        let mut lines = LineReader::new(reader);
        let _comment = lines.next_line("comment line")?;

        let scale_line = lines.next_line("scale factor")?;
        let scale = lines.floats(&scale_line, 1)?[0];

        let mut rows = [[0.0; 3]; 3];
        for row in &mut rows {
            let line = lines.next_line("lattice vectors")?;
            let values = lines.floats(&line, 3)?;
            row.copy_from_slice(&values);
        }
        let raw = Matrix3::new(
            rows[0][0], rows[0][1], rows[0][2], rows[1][0], rows[1][1], rows[1][2], rows[2][0],
            rows[2][1], rows[2][2],
        );
        // A negative scale factor is the target cell volume.
        let matrix = if scale < 0.0 {
            let factor = (-scale / raw.determinant().abs()).cbrt();
            raw * factor
        } else {
            raw * scale
        };
        let lattice = Lattice::new(matrix)?;

        let species_line = lines.next_line("species names")?;
        let species: Vec<String> = species_line
            .split_whitespace()
            .map(str::to_string)
            .collect();
        if species.is_empty() || species.iter().all(|s| s.parse::<usize>().is_ok()) {
            return Err(lines.parse_error(PoscarParseErrorKind::MissingSpecies));
        }

        let counts_line = lines.next_line("atom counts")?;
        let counts: Vec<usize> = counts_line
            .split_whitespace()
            .map(|c| {
                c.parse::<usize>()
                    .map_err(|_| lines.parse_error(PoscarParseErrorKind::InvalidCount(c.to_string())))
            })
            .collect::<Result<_, _>>()?;
        if counts.len() != species.len() {
            return Err(lines.parse_error(PoscarParseErrorKind::SpeciesCountMismatch {
                species: species.len(),
                counts: counts.len(),
            }));
        }

        let mut mode_line = lines.next_line("coordinate mode")?;
        if mode_line.trim_start().starts_with(['S', 's']) {
            mode_line = lines.next_line("coordinate mode")?;
        }
        let cartesian = match mode_line.trim_start().chars().next() {
            Some('D' | 'd') => false,
            Some('C' | 'c' | 'K' | 'k') => true,
            _ => {
                return Err(lines.parse_error(PoscarParseErrorKind::UnknownCoordinateMode(
                    mode_line.trim().to_string(),
                )));
            }
        };
        let coordinate_scale = if cartesian && scale > 0.0 { scale } else { 1.0 };

        let mut sites = Vec::with_capacity(counts.iter().sum());
        for (name, &count) in species.iter().zip(&counts) {
            for _ in 0..count {
                let line = lines.next_line("atomic positions")?;
                let v = lines.floats(&line, 3)?;
                let site = if cartesian {
                    let point = Point3::new(v[0], v[1], v[2]) * coordinate_scale;
                    Site::from_cartesian(name, point, &lattice)
                } else {
                    Site::new(name, Vector3::new(v[0], v[1], v[2]), &lattice)
                };
                sites.push(site);
            }
        }

        Ok(Configuration::new(lattice, sites))
    }

    fn write_to(
        configuration: &Configuration,
        comment: &str,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        writeln!(writer, "{}", comment.lines().next().unwrap_or(""))?;
        writeln!(writer, "1.0")?;
        for axis in 0..3 {
            let v = configuration.lattice().vector(axis);
            writeln!(writer, "  {:>20.16} {:>20.16} {:>20.16}", v.x, v.y, v.z)?;
        }
        let runs = species_runs(configuration);
        let names: Vec<&str> = runs.iter().map(|(s, _)| *s).collect();
        let counts: Vec<String> = runs.iter().map(|(_, c)| c.to_string()).collect();
        writeln!(writer, "{}", names.join(" "))?;
        writeln!(writer, "{}", counts.join(" "))?;
        writeln!(writer, "direct")?;
        for site in configuration.sites() {
            let f = site.frac_coords();
            writeln!(
                writer,
                "  {:.16} {:.16} {:.16} {}",
                f.x, f.y, f.z, site.species
            )?;
        }
        Ok(())
    }
}
