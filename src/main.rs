use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use pedalchord::midi_io::{self, PortInfo, PortType};
use pedalchord::{Controller, Driver, PortSelector, Processor, QuitStatus, RunOutcome};
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(author, version, about = "MIDI foot-pedal remapper")]
struct Cli {
    /// Log at debug level (RUST_LOG overrides).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Do not write the debug log file.
    #[arg(long, global = true)]
    no_log_file: bool,

    /// Directory for the debug log file.
    #[arg(long, global = true, default_value = ".")]
    log_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Remap a pedal board from an input port to an output port.
    Run(RunArgs),
    /// List MIDI input and output ports.
    List,
    /// Check a controller document and print a summary.
    Validate(ConfigArgs),
    /// Print the bank names as sent to the receiving device.
    Banks(ConfigArgs),
}

#[derive(Args)]
struct ConfigArgs {
    /// Controller document (JSON).
    #[arg(short, long)]
    config: PathBuf,
}

#[derive(Args)]
struct RunArgs {
    #[command(flatten)]
    config: ConfigArgs,
    /// Input port: number from `list` or a name pattern (`*`, `?`).
    /// Asked for on a terminal, otherwise the first port.
    #[arg(long)]
    in_port: Option<PortSelector>,
    /// Output port: number from `list` or a name pattern (`*`, `?`).
    /// Asked for on a terminal, otherwise the first port.
    #[arg(long)]
    out_port: Option<PortSelector>,
}

const EXIT_REBOOT: u8 = 3;
const EXIT_SHUTDOWN: u8 = 4;

/// Rotated debug logs kept next to the current one.
const LOG_FILES_KEPT: usize = 5;

fn debug_log_appender(dir: &Path) -> Result<RollingFileAppender> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("debug")
        .filename_suffix("log")
        .max_log_files(LOG_FILES_KEPT)
        .build(dir)
        .with_context(|| format!("failed to open debug log in {}", dir.display()))
}

/// Console at info (debug with `-v`, `RUST_LOG` overrides) plus a debug-level
/// log file. The returned guard flushes the file on drop.
fn init_logging(cli: &Cli) -> Option<WorkerGuard> {
    let default_level = if cli.verbose { "debug" } else { "info" };
    let console = fmt::layer().with_filter(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
    );

    let appender = (!cli.no_log_file).then(|| debug_log_appender(&cli.log_dir));
    let (file, guard, failure) = match appender {
        Some(Ok(appender)) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(LevelFilter::DEBUG);
            (Some(layer), Some(guard), None)
        }
        Some(Err(e)) => (None, None, Some(e)),
        None => (None, None, None),
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .try_init()
        .ok();
    if let Some(e) = failure {
        warn!("Logging to the console only: {:#}", e);
    }
    guard
}

/// Uses the given selector, or asks on a terminal when there is none.
fn choose_port(
    given: Option<PortSelector>,
    port_type: PortType,
    ports: impl FnOnce() -> Vec<PortInfo>,
) -> Result<Option<PortSelector>> {
    if given.is_some() || !io::stdin().is_terminal() {
        return Ok(given);
    }
    let chosen = midi_io::prompt_port(
        port_type,
        &ports(),
        &mut io::stdin().lock(),
        &mut io::stdout(),
    )?;
    Ok(chosen)
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let _log_guard = init_logging(&cli);

    match cli.command {
        Commands::Run(args) => execute_run(args),
        Commands::List => {
            print_ports("Input", &midi_io::list_input_ports());
            print_ports("Output", &midi_io::list_output_ports());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Validate(args) => {
            let controller = load(&args.config)?;
            println!(
                "{}: {} banks, {} pedals",
                args.config.display(),
                controller.banks().len(),
                controller.pedal_count()
            );
            Ok(ExitCode::SUCCESS)
        }
        Commands::Banks(args) => {
            let controller = load(&args.config)?;
            for (index, name) in pedalchord::bank_names(&controller)?.iter().enumerate() {
                println!("{} - {}", index + 1, name);
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load(path: &Path) -> Result<Controller> {
    pedalchord::load_controller(path)
        .with_context(|| format!("failed to load controller document {}", path.display()))
}

fn print_ports(title: &str, ports: &[PortInfo]) {
    println!("{} ports:", title);
    if ports.is_empty() {
        println!("  (none)");
    }
    for port in ports {
        println!("  {}: {}", port.index + 1, port.name);
    }
}

fn execute_run(args: RunArgs) -> Result<ExitCode> {
    let mut controller = load(&args.config.config)?;
    let in_port = choose_port(args.in_port, PortType::Input, midi_io::list_input_ports)?;
    let out_port = choose_port(args.out_port, PortType::Output, midi_io::list_output_ports)?;
    let mut connection = midi_io::open(in_port.as_ref(), out_port.as_ref())
        .context("failed to open MIDI ports")?;

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = Arc::clone(&shutdown);
    ctrlc::set_handler(move || {
        shutdown_clone.store(true, Ordering::SeqCst);
    })?;

    let driver = Driver::new();
    loop {
        let mut processor = Processor::new(controller.clone());
        let outcome = driver.run(
            &mut processor,
            &connection.events,
            &mut connection.output,
            &shutdown,
        );

        let status = match outcome {
            RunOutcome::Finished(status) => status,
            RunOutcome::Interrupted => {
                info!("Interrupted");
                return Ok(ExitCode::SUCCESS);
            }
            RunOutcome::InputClosed => {
                return Err(anyhow::anyhow!("MIDI input closed unexpectedly"));
            }
        };

        info!("Stopped: {}", status.name());
        match status {
            QuitStatus::Quit => return Ok(ExitCode::SUCCESS),
            QuitStatus::Reboot => return Ok(ExitCode::from(EXIT_REBOOT)),
            QuitStatus::Shutdown => return Ok(ExitCode::from(EXIT_SHUTDOWN)),
            QuitStatus::Reload => match load(&args.config.config) {
                Ok(reloaded) => {
                    info!("Reloaded {}", args.config.config.display());
                    controller = reloaded;
                }
                Err(e) => error!("Reload failed, keeping previous configuration: {:#}", e),
            },
        }
    }
}
