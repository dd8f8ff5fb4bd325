//! Command line for the `drivecheck` binary.
//!
//! ```bash
//! drivecheck --name "Ada Lovelace" --application-number A-17
//! drivecheck run --config assessment.json --windowed
//! drivecheck export --format attempts > attempts.csv
//! drivecheck stats --json
//! drivecheck calibrate --hz 120
//! ```

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use drivecheck_store::ExportFormat;

#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "drivecheck")]
#[command(version)]
#[command(about = "Timed driving aptitude assessment")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Assessment configuration (JSON). Defaults apply when absent.
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory holding `session_<id>.json` files
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub run: RunArgs,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Run the assessment in a window (default)
    Run(RunArgs),

    /// Print stored sessions in a tabular or JSON form
    Export(ExportArgs),

    /// Print totals across stored sessions
    Stats(StatsArgs),

    /// Measure how steadily this machine can pace frames
    Calibrate(CalibrateArgs),
}

#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct RunArgs {
    /// Candidate name
    #[arg(long, default_value = "")]
    pub name: String,

    /// Candidate application number
    #[arg(long, default_value = "")]
    pub application_number: String,

    /// Run in a window instead of borderless fullscreen
    #[arg(long)]
    pub windowed: bool,
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct ExportArgs {
    #[arg(short, long, value_enum, default_value_t = ExportFormatArg::Summary)]
    pub format: ExportFormatArg,

    /// Write to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct StatsArgs {
    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct CalibrateArgs {
    /// Nominal frame rate
    #[arg(long, default_value_t = 60.0)]
    pub hz: f64,

    /// Frames to pace
    #[arg(long, default_value_t = 240)]
    pub frames: u64,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormatArg {
    Summary,
    Attempts,
    Json,
}

impl From<ExportFormatArg> for ExportFormat {
    fn from(arg: ExportFormatArg) -> Self {
        match arg {
            ExportFormatArg::Summary => ExportFormat::Summary,
            ExportFormatArg::Attempts => ExportFormat::Attempts,
            ExportFormatArg::Json => ExportFormat::Json,
        }
    }
}

impl Cli {
    /// The subcommand to run; bare `drivecheck` runs the assessment.
    pub fn selected(&self) -> Command {
        self.command
            .clone()
            .unwrap_or_else(|| Command::Run(self.run.clone()))
    }
}

pub fn parse_args<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    Cli::try_parse_from(args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_invocation_runs() {
        let cli = parse_args(["drivecheck", "--name", "Ada", "--application-number", "A-1"]).unwrap();
        assert_eq!(
            cli.selected(),
            Command::Run(RunArgs {
                name: "Ada".into(),
                application_number: "A-1".into(),
                windowed: false,
            })
        );
    }

    #[test]
    fn export_takes_a_format() {
        let cli = parse_args(["drivecheck", "export", "--format", "attempts"]).unwrap();
        match cli.selected() {
            Command::Export(args) => {
                assert_eq!(ExportFormat::from(args.format), ExportFormat::Attempts);
                assert_eq!(args.output, None);
            }
            other => panic!("expected export, got {other:?}"),
        }
        assert!(parse_args(["drivecheck", "export", "--format", "xml"]).is_err());
    }

    #[test]
    fn global_options_follow_subcommands() {
        let cli = parse_args([
            "drivecheck",
            "stats",
            "--json",
            "--config",
            "a.json",
            "--data-dir",
            "/tmp/sessions",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("a.json")));
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/sessions")));
        assert_eq!(cli.selected(), Command::Stats(StatsArgs { json: true }));
    }

    #[test]
    fn calibrate_has_defaults() {
        let cli = parse_args(["drivecheck", "calibrate"]).unwrap();
        assert_eq!(
            cli.selected(),
            Command::Calibrate(CalibrateArgs {
                hz: 60.0,
                frames: 240,
            })
        );
        let cli = parse_args(["drivecheck", "calibrate", "--hz", "120", "--frames", "30"]).unwrap();
        assert_eq!(
            cli.selected(),
            Command::Calibrate(CalibrateArgs {
                hz: 120.0,
                frames: 30,
            })
        );
    }
}
