mod app;
mod cli;
mod keys;
mod logging;
mod paths;
mod shell;

use std::fs;

use anyhow::{Context, Result};
use drivecheck_core::Participant;
use drivecheck_experiment::{Assessment, AssessmentConfig};
use drivecheck_store::{AggregateStats, ExportFormat, JsonDirRepository, SessionRepository};
use drivecheck_timing::{FrameLoop, MonotonicClock};
use log::info;

use crate::app::App;
use crate::cli::{CalibrateArgs, Cli, Command, ExportArgs, RunArgs, StatsArgs};
use crate::shell::Shell;

fn main() -> Result<()> {
    let cli = cli::parse_args(std::env::args_os()).unwrap_or_else(|e| e.exit());
    logging::init_logger(cli.verbose);

    if let Command::Calibrate(args) = cli.selected() {
        return calibrate(&args);
    }

    let data_dir = cli.data_dir.clone().unwrap_or_else(paths::default_session_dir);
    let repository = JsonDirRepository::open(&data_dir)
        .with_context(|| format!("opening session store at {}", data_dir.display()))?;

    match cli.selected() {
        Command::Run(args) => run(&cli, args, repository),
        Command::Export(args) => export(&args, &repository),
        Command::Stats(args) => stats(&args, &repository),
        Command::Calibrate(args) => calibrate(&args),
    }
}

fn run(cli: &Cli, args: RunArgs, repository: JsonDirRepository) -> Result<()> {
    let config = match &cli.config {
        Some(path) => AssessmentConfig::from_json_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => AssessmentConfig::default(),
    };
    info!("sessions are saved to {}", repository.dir().display());

    let assessment = Assessment::from_config(config, MonotonicClock::new())?;
    let participant = Participant {
        name: args.name,
        application_number: args.application_number,
    };
    let shell = Shell::new(assessment, repository, participant);
    App::new(shell, args.windowed)?.run()
}

fn export(args: &ExportArgs, repository: &JsonDirRepository) -> Result<()> {
    let format = ExportFormat::from(args.format);
    let sessions = repository.list_sessions()?;
    let rendered = format.render(&sessions)?;
    match &args.output {
        Some(path) => {
            fs::write(path, rendered).with_context(|| format!("writing {}", path.display()))?;
            info!("exported {} sessions as {format} to {}", sessions.len(), path.display());
        }
        None => print!("{rendered}"),
    }
    Ok(())
}

fn stats(args: &StatsArgs, repository: &JsonDirRepository) -> Result<()> {
    let sessions = repository.list_sessions()?;
    let stats = AggregateStats::from_sessions(&sessions);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("{stats}");
    }
    Ok(())
}

fn calibrate(args: &CalibrateArgs) -> Result<()> {
    anyhow::ensure!(
        args.hz.is_finite() && args.hz > 0.0,
        "--hz must be a positive number"
    );
    let frame_loop = FrameLoop::new(MonotonicClock::new(), args.hz);
    info!(
        "pacing {} frames at {:.1} Hz ({:.3} ms each)",
        args.frames,
        args.hz,
        frame_loop.interval_ms()
    );
    let stats = frame_loop.calibrate(args.frames);
    println!(
        "frames {}  mean {:.3} ms  jitter {:.3} ms  min {:.3} ms  max {:.3} ms  {:.1} fps",
        stats.samples,
        stats.average_frame_ms,
        stats.jitter_ms,
        stats.min_frame_ms,
        stats.max_frame_ms,
        stats.effective_fps
    );
    Ok(())
}
