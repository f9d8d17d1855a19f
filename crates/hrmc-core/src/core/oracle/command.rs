use super::{EnergyEvaluationError, EnergyOracle, OracleLoadError};
use crate::core::io::poscar::PoscarFile;
use crate::core::io::traits::StructureFile;
use crate::core::models::configuration::Configuration;
use serde::Deserialize;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process::Command;
use tracing::trace;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct CommandOracleConfig {
    pub program: String,
    /// Arguments placed before the structure path.
    #[serde(default)]
    pub args: Vec<String>,
    /// Directory the program runs in, and where temporary structures are written.
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
}

/// Evaluates energies out of process.
///
/// Each call writes the configuration as a POSCAR to its own temporary file,
/// runs `program args... <path>`, and reads the energy as the final number on
/// the last non-empty line of standard output. Concurrent calls never share a
/// file. There is no timeout: a hung evaluator stalls its batch.
#[derive(Debug, Clone)]
pub struct CommandOracle {
    config: CommandOracleConfig,
}

impl CommandOracle {
    pub fn new(config: CommandOracleConfig) -> Result<Self, OracleLoadError> {
        if config.program.trim().is_empty() {
            return Err(OracleLoadError::Invalid(
                "command oracle requires a program".to_string(),
            ));
        }
        Ok(Self { config })
    }
}

fn parse_energy(stdout: &str) -> Option<f64> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .last()?
        .split(|c: char| c.is_whitespace() || c == '=' || c == ':' || c == ',')
        .filter(|token| !token.is_empty())
        .last()?
        .parse()
        .ok()
}

impl EnergyOracle for CommandOracle {
    fn evaluate(&self, configuration: &Configuration) -> Result<f64, EnergyEvaluationError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("hrmc-candidate-").suffix(".vasp");
        let file = match &self.config.working_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        {
            let mut writer = BufWriter::new(file.as_file());
            PoscarFile::write_to(configuration, "hrmc candidate", &mut writer)?;
            writer.flush()?;
        }

        let mut command = Command::new(&self.config.program);
        command.args(&self.config.args).arg(file.path());
        if let Some(dir) = &self.config.working_dir {
            command.current_dir(dir);
        }
        trace!(program = %self.config.program, path = %file.path().display(), "Running energy command.");
        let output = command.output()?;

        if !output.status.success() {
            return Err(EnergyEvaluationError::CommandFailed {
                program: self.config.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        let energy = parse_energy(&stdout).ok_or_else(|| EnergyEvaluationError::UnparsableOutput {
            output: stdout.trim().to_string(),
        })?;
        if energy.is_finite() {
            Ok(energy)
        } else {
            Err(EnergyEvaluationError::NonFinite(energy))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn energy_is_last_number_of_last_line() {
        assert_eq!(parse_energy("step 1\nTotal energy = -12.5\n\n"), Some(-12.5));
        assert_eq!(parse_energy("-3.25"), Some(-3.25));
        assert_eq!(parse_energy("pe: 1e3"), Some(1000.0));
        assert_eq!(parse_energy("done\n"), None);
        assert_eq!(parse_energy(""), None);
    }

    #[test]
    fn empty_program_is_rejected() {
        let config = CommandOracleConfig {
            program: "  ".to_string(),
            args: Vec::new(),
            working_dir: None,
        };
        assert!(CommandOracle::new(config).is_err());
    }

    #[cfg(unix)]
    mod process {
        use super::*;
        use crate::core::models::lattice::Lattice;
        use crate::core::models::site::Site;
        use nalgebra::Vector3;

        fn config() -> Configuration {
            let lattice = Lattice::cubic(5.0).unwrap();
            let sites = vec![Site::new("Ar", Vector3::new(0.0, 0.0, 0.0), &lattice)];
            Configuration::new(lattice, sites)
        }

        fn shell(script: &str) -> CommandOracle {
            CommandOracle::new(CommandOracleConfig {
                program: "sh".to_string(),
                args: vec!["-c".to_string(), script.to_string(), "sh".to_string()],
                working_dir: None,
            })
            .unwrap()
        }

        #[test]
        fn reads_energy_from_stdout_and_receives_structure_path() {
            let oracle = shell("grep -q Ar \"$1\" && echo 'Energy: -42.0'");
            assert_eq!(oracle.evaluate(&config()).unwrap(), -42.0);
        }

        #[test]
        fn non_zero_exit_is_command_failure() {
            let oracle = shell("echo boom >&2; exit 3");
            let err = oracle.evaluate(&config()).unwrap_err();
            match err {
                EnergyEvaluationError::CommandFailed { stderr, .. } => assert_eq!(stderr, "boom"),
                other => panic!("unexpected error: {other}"),
            }
        }

        #[test]
        fn garbage_output_is_unparsable() {
            let oracle = shell("echo converged");
            assert!(matches!(
                oracle.evaluate(&config()),
                Err(EnergyEvaluationError::UnparsableOutput { .. })
            ));
        }

        #[test]
        fn working_dir_receives_temporary_structure() {
            let dir = tempfile::tempdir().unwrap();
            let oracle = CommandOracle::new(CommandOracleConfig {
                program: "sh".to_string(),
                args: vec![
                    "-c".to_string(),
                    "test \"$(dirname \"$1\")\" = \"$(pwd)\" && echo 1.5".to_string(),
                    "sh".to_string(),
                ],
                working_dir: Some(dir.path().to_path_buf()),
            })
            .unwrap();
            assert_eq!(oracle.evaluate(&config()).unwrap(), 1.5);
        }
    }
}
