use crate::core::models::configuration::Configuration;
use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Appends frames to a VASP XDATCAR trajectory.
///
/// The cell and species header is written together with the first frame; every
/// later frame only adds a `Direct configuration=` block, so the lattice is
/// assumed fixed for the whole trajectory.
#[derive(Debug, Clone)]
pub struct XdatcarWriter {
    path: PathBuf,
    title: String,
}

impl XdatcarWriter {
    pub fn new(path: impl Into<PathBuf>, title: &str) -> Self {
        Self {
            path: path.into(),
            title: title.to_string(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append_frame(&self, configuration: &Configuration, frame: usize) -> io::Result<()> {
        let needs_header = !self.path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = BufWriter::new(file);

        if needs_header {
            writeln!(writer, "{}", self.title)?;
            writeln!(writer, "           1")?;
            for axis in 0..3 {
                let v = configuration.lattice().vector(axis);
                writeln!(writer, "    {:>12.6} {:>12.6} {:>12.6}", v.x, v.y, v.z)?;
            }
            let mut names: Vec<&str> = Vec::new();
            let mut counts: Vec<usize> = Vec::new();
            for site in configuration.sites() {
                if names.last() == Some(&site.species.as_str()) {
                    if let Some(last) = counts.last_mut() {
                        *last += 1;
                    }
                } else {
                    names.push(site.species.as_str());
                    counts.push(1);
                }
            }
            let name_line: Vec<String> = names.iter().map(|n| format!("{:>5}", n)).collect();
            let count_line: Vec<String> = counts.iter().map(|c| format!("{:>5}", c)).collect();
            writeln!(writer, "{}", name_line.join(""))?;
            writeln!(writer, "{}", count_line.join(""))?;
        }

        writeln!(writer, "Direct configuration= {:>5}", frame)?;
        for site in configuration.sites() {
            let f = site.frac_coords();
            writeln!(writer, "  {:.8} {:.8} {:.8}", f.x, f.y, f.z)?;
        }
        writer.flush()
    }
}
