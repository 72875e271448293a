//! Touchstone CLI - validate gesture configurations and replay input traces.

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::cell::RefCell;
use std::fs;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use thiserror::Error;
use touchstone::{GestureError, GestureInput, Manager, ManagerOptions};
use touchstone_core::{ElementId, ElementTree, RawInput, Surface};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const ROOT: ElementId = ElementId(1);

/// Suffixes a recognizer's events may carry.
const SUFFIXES: [&str; 11] = [
    "", "start", "move", "end", "cancel", "left", "right", "up", "down", "in", "out",
];

#[derive(Parser)]
#[command(name = "touchstone")]
#[command(about = "Gesture recognition configuration and replay tool")]
#[command(version)]
struct Cli {
    /// Log recognizer activity to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a manager configuration
    Check {
        /// Configuration file (.yaml, .yml or .json)
        config: PathBuf,
    },

    /// Feed a JSON-lines trace of raw input through a manager
    Replay {
        /// Raw input trace, one JSON event per line
        trace: PathBuf,

        /// Configuration file (default: stock preset)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,

        /// Leave timers pending at the end of the trace
        #[arg(long)]
        no_settle: bool,
    },

    /// Print the stock preset as YAML
    Preset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Gesture(#[from] GestureError),

    #[error("trace line {line}: {source}")]
    Trace {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Output(#[from] io::Error),
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Check { config } => check(&config),
        Commands::Replay {
            trace,
            config,
            format,
            no_settle,
        } => replay(&trace, config.as_deref(), format, !no_settle),
        Commands::Preset => preset(),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "touchstone=debug",
        _ => "touchstone=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_options(path: &Path) -> Result<ManagerOptions, CliError> {
    let content = fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let options = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => ManagerOptions::from_json(&content)?,
        _ => ManagerOptions::from_yaml(&content)?,
    };
    debug!(path = %path.display(), recognizers = options.recognizers.len(), "loaded configuration");
    Ok(options)
}

fn build_manager(options: ManagerOptions) -> Result<Manager, GestureError> {
    let surface: Rc<dyn Surface> = Rc::new(ElementTree::new(ROOT));
    Manager::new(surface, ROOT, options)
}

fn check(path: &Path) -> Result<(), CliError> {
    let manager = build_manager(load_options(path)?)?;
    let mut out = io::stdout().lock();
    writeln!(out, "Configuration valid: {}", path.display())?;
    write_summary(&mut out, &manager)?;
    Ok(())
}

fn write_summary(out: &mut impl Write, manager: &Manager) -> io::Result<()> {
    writeln!(out, "  Input: {:?}", manager.input_class())?;
    writeln!(out, "  Touch action: {}", manager.touch_action())?;
    writeln!(out, "  Recognizers:")?;
    let name_of = |id| {
        manager
            .recognizers()
            .iter()
            .find(|r| r.id() == id)
            .map_or("?", touchstone::Recognizer::event)
    };
    for recognizer in manager.recognizers() {
        let with: Vec<&str> = recognizer.simultaneous().map(name_of).collect();
        let requires: Vec<&str> = recognizer.require_failures().iter().map(|id| name_of(*id)).collect();
        write!(out, "    {:<12} {:<6}", recognizer.event(), recognizer.kind())?;
        if !recognizer.is_enabled() {
            write!(out, " disabled")?;
        }
        if !with.is_empty() {
            write!(out, " with={}", with.join(","))?;
        }
        if !requires.is_empty() {
            write!(out, " requires-failure={}", requires.join(","))?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn preset() -> Result<(), CliError> {
    let yaml = ManagerOptions::preset().to_yaml()?;
    print!("{yaml}");
    Ok(())
}

#[derive(Serialize)]
struct Emitted<'a> {
    event: &'a str,
    input: &'a GestureInput,
}

type Log = Rc<RefCell<Vec<(String, GestureInput)>>>;

fn subscribe(manager: &Manager) -> Log {
    let mut names: Vec<String> = manager
        .recognizers()
        .iter()
        .flat_map(|r| SUFFIXES.iter().map(move |s| format!("{}{s}", r.event())))
        .collect();
    names.sort();
    names.dedup();

    let log: Log = Rc::default();
    let sink = Rc::clone(&log);
    manager.on(&names.join(" "), move |event| {
        sink.borrow_mut().push((event.name.clone(), event.input.clone()));
    });
    log
}

fn write_event(out: &mut dyn Write, format: Format, name: &str, input: &GestureInput) -> io::Result<()> {
    match format {
        Format::Text => writeln!(
            out,
            "{:>8} {:<14} x={:<8.1} y={:<8.1} pointers={} dx={:.1} dy={:.1} v={:.3}",
            input.time_ms,
            name,
            input.center.x,
            input.center.y,
            input.pointers.len(),
            input.delta_x,
            input.delta_y,
            input.velocity,
        ),
        Format::Json => {
            let line = serde_json::to_string(&Emitted { event: name, input }).map_err(io::Error::other)?;
            writeln!(out, "{line}")
        }
    }
}

/// Parse one trace line. Blank lines and `#` comments yield `None`.
fn parse_line(line: &str, number: usize) -> Result<Option<RawInput>, CliError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let mut raw: RawInput = serde_json::from_str(line).map_err(|source| CliError::Trace { line: number, source })?;
    raw.retarget(|id| id == ROOT, ROOT);
    Ok(Some(raw))
}

fn replay(trace: &Path, config: Option<&Path>, format: Format, settle: bool) -> Result<(), CliError> {
    let options = match config {
        Some(path) => load_options(path)?,
        None => ManagerOptions::preset(),
    };
    let file = fs::File::open(trace).map_err(|source| CliError::Io {
        path: trace.to_path_buf(),
        source,
    })?;
    let mut out = io::stdout().lock();
    let count = run_trace(BufReader::new(file), options, format, settle, &mut out)?;
    info!(events = count, trace = %trace.display(), "replay finished");
    Ok(())
}

/// Replay `reader` and write every emitted event. Returns the number of
/// gesture events written.
fn run_trace(
    reader: impl BufRead,
    options: ManagerOptions,
    format: Format,
    settle: bool,
    out: &mut impl Write,
) -> Result<usize, CliError> {
    let mut manager = build_manager(options)?;
    let log = subscribe(&manager);
    let mut written = 0;
    let mut flush = |log: &Log, out: &mut dyn Write| -> io::Result<()> {
        for (name, input) in log.borrow_mut().drain(..) {
            write_event(out, format, &name, &input)?;
            written += 1;
        }
        Ok(())
    };

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let Some(raw) = parse_line(&line, index + 1)? else {
            continue;
        };
        manager.handle(&raw);
        flush(&log, out)?;
    }

    if settle {
        while let Some(due) = manager.next_timer() {
            manager.advance(due);
        }
        flush(&log, out)?;
    }
    Ok(written)
}
