use super::acceptance::Decision;
use super::state::{AcceptedStep, RunCounters};
use crate::core::io::poscar::{PoscarError, PoscarFile};
use crate::core::io::traits::StructureFile;
use crate::core::io::xdatcar::XdatcarWriter;
use crate::core::models::configuration::Configuration;
use crate::core::scoring::PdfProfile;
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const STRUCTURE_FILE: &str = "output.vasp";
pub const TRAJECTORY_FILE: &str = "XDATCAR";
pub const ERROR_LOG_FILE: &str = "errors.txt";
pub const ACCEPTANCE_LOG_FILE: &str = "acceptance_probabilities.txt";
pub const ERROR_PLOT_FILE: &str = "error_plotting.txt";
pub const PDF_SNAPSHOT_FILE: &str = "pdfs.csv";

const RUN_FILES: [&str; 6] = [
    STRUCTURE_FILE,
    TRAJECTORY_FILE,
    ERROR_LOG_FILE,
    ACCEPTANCE_LOG_FILE,
    ERROR_PLOT_FILE,
    PDF_SNAPSHOT_FILE,
];

#[derive(Debug, Error)]
pub enum RunLogError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to write structure snapshot: {0}")]
    Structure(#[from] PoscarError),
    #[error("Failed to write PDF snapshot: {0}")]
    Csv(#[from] csv::Error),
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> RunLogError + '_ {
    move |source| RunLogError::Io {
        path: path.to_string_lossy().to_string(),
        source,
    }
}

/// Append-only diagnostics of one run.
///
/// Creating a log removes every output file left by a previous run in the same
/// directory, so each file describes exactly one run. Writes happen only from
/// the orchestrating thread.
#[derive(Debug)]
pub struct RunLog {
    directory: PathBuf,
    trajectory: XdatcarWriter,
}

impl RunLog {
    pub fn create(directory: &Path) -> Result<Self, RunLogError> {
        fs::create_dir_all(directory).map_err(io_error(directory))?;
        for name in RUN_FILES {
            let path = directory.join(name);
            if path.exists() {
                fs::remove_file(&path).map_err(io_error(&path))?;
            }
        }
        Ok(Self {
            directory: directory.to_path_buf(),
            trajectory: XdatcarWriter::new(directory.join(TRAJECTORY_FILE), "hrmc trajectory"),
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn path_of(&self, name: &str) -> PathBuf {
        self.directory.join(name)
    }

    fn append_lines<I>(&self, name: &str, lines: I) -> Result<(), RunLogError>
    where
        I: IntoIterator<Item = String>,
    {
        let path = self.path_of(name);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(io_error(&path))?;
        let mut writer = BufWriter::new(file);
        for line in lines {
            writeln!(writer, "{}", line).map_err(io_error(&path))?;
        }
        writer.flush().map_err(io_error(&path))
    }

    /// Appends one `tag: accepted, probability, error, energy` line per decision.
    pub fn record_decisions(&self, decisions: &[Decision]) -> Result<(), RunLogError> {
        if decisions.is_empty() {
            return Ok(());
        }
        self.append_lines(ACCEPTANCE_LOG_FILE, decisions.iter().map(|d| d.to_string()))
    }

    pub fn record_accepted(
        &self,
        accepted: &AcceptedStep,
        counters: &RunCounters,
        error_tolerance: f64,
    ) -> Result<(), RunLogError> {
        self.append_lines(
            ERROR_LOG_FILE,
            [format!(
                "step # = {}, error = {}, moved = {}, tot_moves = {}, moves attempted = {}, error_const = {}",
                accepted.step,
                accepted.error,
                accepted.moved,
                counters.moves,
                counters.moves_attempted,
                error_tolerance
            )],
        )?;
        self.append_lines(
            ERROR_PLOT_FILE,
            [format!("{} {} {}", accepted.step, accepted.error, accepted.energy)],
        )
    }

    /// Overwrites the best-structure snapshot.
    pub fn write_structure(&self, configuration: &Configuration) -> Result<(), RunLogError> {
        PoscarFile::write_to_path(configuration, "hrmc refined structure", self.path_of(STRUCTURE_FILE))?;
        Ok(())
    }

    pub fn append_frame(&self, configuration: &Configuration, frame: usize) -> Result<(), RunLogError> {
        self.trajectory
            .append_frame(configuration, frame)
            .map_err(io_error(self.trajectory.path()))
    }

    /// Overwrites the PDF snapshot with the current curves.
    pub fn write_profile(&self, profile: &PdfProfile) -> Result<(), RunLogError> {
        let mut writer = csv::Writer::from_path(self.path_of(PDF_SNAPSHOT_FILE))?;
        writer.write_record(["r", "g_calc_scaled", "g_exp"])?;
        for ((r, calc), exp) in profile
            .r
            .iter()
            .zip(&profile.calculated)
            .zip(&profile.experimental)
        {
            writer.write_record([r.to_string(), calc.to_string(), exp.to_string()])?;
        }
        writer.flush().map_err(io_error(&self.path_of(PDF_SNAPSHOT_FILE)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::lattice::Lattice;
    use crate::core::models::site::Site;
    use crate::engine::acceptance::DecisionScope;
    use nalgebra::Vector3;

    fn config() -> Configuration {
        let lattice = Lattice::cubic(4.0).unwrap();
        let sites = vec![Site::new("Ar", Vector3::new(0.0, 0.0, 0.0), &lattice)];
        Configuration::new(lattice, sites)
    }

    #[test]
    fn create_resets_previous_run_files_only() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(ERROR_LOG_FILE), "stale\n").unwrap();
        fs::write(dir.path().join(TRAJECTORY_FILE), "stale\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "keep\n").unwrap();

        RunLog::create(dir.path()).unwrap();

        assert!(!dir.path().join(ERROR_LOG_FILE).exists());
        assert!(!dir.path().join(TRAJECTORY_FILE).exists());
        assert!(dir.path().join("notes.txt").exists());
    }

    #[test]
    fn create_makes_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("run").join("a");
        let log = RunLog::create(&nested).unwrap();
        assert!(nested.is_dir());
        assert_eq!(log.directory(), nested.as_path());
    }

    #[test]
    fn decisions_and_accepted_steps_are_appended() {
        let dir = tempfile::tempdir().unwrap();
        let log = RunLog::create(dir.path()).unwrap();
        let decision = Decision {
            scope: DecisionScope::Single,
            accepted: false,
            probability: Some(0.25),
            error: 1.5,
            energy: -3.0,
        };
        log.record_decisions(&[decision]).unwrap();
        log.record_decisions(&[Decision {
            scope: DecisionScope::Batch,
            accepted: true,
            probability: None,
            ..decision
        }])
        .unwrap();

        let accepted = AcceptedStep {
            step: 3,
            error: 1.25,
            energy: -4.0,
            moved: 2,
        };
        let counters = RunCounters {
            steps: 3,
            accepted_steps: 1,
            moves: 2,
            moves_attempted: 24,
        };
        log.record_accepted(&accepted, &counters, 0.002).unwrap();

        let probabilities = fs::read_to_string(log.path_of(ACCEPTANCE_LOG_FILE)).unwrap();
        assert_eq!(
            probabilities,
            "single: false, 0.25, 1.5, -3\nbatch: true, n/a, 1.5, -3\n"
        );
        let errors = fs::read_to_string(log.path_of(ERROR_LOG_FILE)).unwrap();
        assert_eq!(
            errors,
            "step # = 3, error = 1.25, moved = 2, tot_moves = 2, moves attempted = 24, error_const = 0.002\n"
        );
        let plotting = fs::read_to_string(log.path_of(ERROR_PLOT_FILE)).unwrap();
        assert_eq!(plotting, "3 1.25 -4\n");
    }

    #[test]
    fn structure_snapshot_is_overwritten_and_frames_appended() {
        let dir = tempfile::tempdir().unwrap();
        let log = RunLog::create(dir.path()).unwrap();
        log.write_structure(&config()).unwrap();
        log.write_structure(&config()).unwrap();
        log.append_frame(&config(), 1).unwrap();
        log.append_frame(&config(), 2).unwrap();

        let restored = PoscarFile::read_from_path(log.path_of(STRUCTURE_FILE)).unwrap();
        assert_eq!(restored.len(), 1);
        let trajectory = fs::read_to_string(log.path_of(TRAJECTORY_FILE)).unwrap();
        assert_eq!(trajectory.matches("Direct configuration=").count(), 2);
    }

    #[test]
    fn profile_snapshot_is_csv_with_header() {
        let dir = tempfile::tempdir().unwrap();
        let log = RunLog::create(dir.path()).unwrap();
        let profile = PdfProfile {
            r: vec![1.0, 1.5],
            calculated: vec![0.5, -0.25],
            experimental: vec![0.75, 0.0],
            calibration_slope: 2.0,
        };
        log.write_profile(&profile).unwrap();

        let mut reader = csv::Reader::from_path(log.path_of(PDF_SNAPSHOT_FILE)).unwrap();
        let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(headers, vec!["r", "g_calc_scaled", "g_exp"]);
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[1][1], "-0.25");
    }
}
