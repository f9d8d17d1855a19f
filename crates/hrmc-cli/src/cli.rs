use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Tony Kan, Ted Yu",
    version,
    about = "HRMC CLI - Hybrid Reverse Monte Carlo refinement of periodic structures against an experimental pair distribution function.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Refine a structure against an experimental G(r) curve and an energy oracle.
    Refine(RefineArgs),
    /// List the move generators and validators that can be named in a config file.
    Policies,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyArg {
    /// Rebuild the whole neighbor list after every accepted change.
    FullRebuild,
    /// Recompute only the rows touched by moved sites.
    Patch,
}

/// Arguments for the `refine` subcommand.
#[derive(Args, Debug)]
pub struct RefineArgs {
    // --- Core Arguments ---
    /// Path to the run configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Path to the initial structure (POSCAR). Overrides `structure` in the config file.
    #[arg(short = 'i', long, value_name = "PATH")]
    pub structure: Option<PathBuf>,

    /// Path to the experimental G(r) curve. Overrides `reference` in the config file.
    #[arg(short = 'r', long, value_name = "PATH")]
    pub reference: Option<PathBuf>,

    /// Path to the energy oracle definition. Overrides `oracle` in the config file.
    #[arg(short = 'e', long, value_name = "PATH")]
    pub oracle: Option<PathBuf>,

    /// Directory receiving the run files.
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    // --- Loop Overrides ---
    /// Override the number of iterations.
    #[arg(short = 'n', long, value_name = "INT")]
    pub max_steps: Option<usize>,

    /// Override the number of candidates attempted per iteration.
    #[arg(short = 'b', long, value_name = "INT")]
    pub batch_width: Option<usize>,

    /// Seed the random number generator for a reproducible run.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,

    /// Override the neighbor list update strategy.
    #[arg(long, value_enum, value_name = "STRATEGY")]
    pub neighbor_strategy: Option<StrategyArg>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S annealing.temperature-decay=0.995
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refine_arguments_parse_with_global_flags() {
        let cli = Cli::try_parse_from([
            "hrmc",
            "-vv",
            "-j",
            "4",
            "refine",
            "-c",
            "run.toml",
            "-n",
            "50",
            "--neighbor-strategy",
            "patch",
            "-S",
            "batch.width=3",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.threads, Some(4));
        let Commands::Refine(args) = cli.command else {
            panic!("expected refine subcommand");
        };
        assert_eq!(args.config, Some(PathBuf::from("run.toml")));
        assert_eq!(args.max_steps, Some(50));
        assert_eq!(args.neighbor_strategy, Some(StrategyArg::Patch));
        assert_eq!(args.set_values, vec!["batch.width=3".to_string()]);
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["hrmc", "-q", "-v", "policies"]);
        assert!(result.is_err());
    }
}
