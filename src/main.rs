//! ptplay - plays ProTracker modules in the terminal.
//!
//! Usage:
//!   ptplay path/to/file.mod
//!   ptplay path/to/file.mod --info

mod config;
mod ui;

use std::fs;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use pt_audio::session_sink;
use pt_engine::Sequencer;
use pt_formats::load_mod;
use pt_ir::Module;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use config::{BackendChoice, PlayerConfig};
use ui::input::{self, RawMode};
use ui::terminal::TerminalRenderer;

#[derive(Parser, Debug)]
#[command(version, about = "Play a ProTracker module")]
struct Args {
    /// Module file to play
    file: PathBuf,

    /// Print module details and exit
    #[arg(long)]
    info: bool,

    /// TOML settings file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Audio output
    #[arg(long, value_enum)]
    backend: Option<BackendChoice>,

    /// Starting tempo
    #[arg(long)]
    bpm: Option<u16>,

    /// Pan channels apart, 0.0 to 1.0
    #[arg(long)]
    separation: Option<f32>,

    /// Don't print rows while playing
    #[arg(long)]
    quiet: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = settings(&args)?;
    debug!(?config, "settings");

    let data = fs::read(&args.file).with_context(|| format!("reading {}", args.file.display()))?;
    let module =
        load_mod(&data).with_context(|| format!("loading {}", args.file.display()))?;
    print_info(&module);
    if args.info {
        return Ok(());
    }

    let sink = session_sink(config.backend.into()).context("opening audio output")?;
    info!(backend = sink.name(), "audio ready");

    let module = Arc::new(module);
    let channels = module.channel_count;
    let mut sequencer = Sequencer::new(module, sink, config.engine_config());
    if config.render {
        sequencer = sequencer.with_renderer(Box::new(TerminalRenderer::new()));
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("starting runtime")?;

    // Without a terminal there are no keys; Ctrl-C ends the process as usual
    let _raw = if std::io::stdin().is_terminal() {
        println!("{}", input::HELP);
        println!();
        let raw = RawMode::enable().context("enabling raw terminal mode")?;
        input::spawn_input(sequencer.transport(), channels).context("starting input thread")?;
        Some(raw)
    } else {
        None
    };

    runtime.block_on(sequencer.play());
    Ok(())
}

/// Config file values, then command-line overrides.
fn settings(args: &Args) -> anyhow::Result<PlayerConfig> {
    let mut config = match &args.config {
        Some(path) => PlayerConfig::load(path)?,
        None => PlayerConfig::default(),
    };
    if let Some(backend) = args.backend {
        config.backend = backend;
    }
    if let Some(bpm) = args.bpm {
        config.initial_bpm = bpm;
    }
    if args.separation.is_some() {
        config.stereo_separation = args.separation;
    }
    if args.quiet {
        config.render = false;
    }
    Ok(config)
}

fn print_info(module: &Module) {
    println!("Title:    {}", module.title);
    println!("Format:   {}", module.format_name());
    println!("Channels: {}", module.channel_count);
    println!("Patterns: {}", module.patterns.len());
    println!(
        "Length:   {} (restart at {})",
        module.sequence().len(),
        module.restart_position()
    );

    let with_data = module.samples.iter().filter(|s| !s.is_empty()).count();
    println!("Samples:  {} (with data)", with_data);
    for (i, sample) in module.samples.iter().enumerate() {
        if sample.is_empty() && sample.name.is_empty() {
            continue;
        }
        let looping = if sample.should_loop() { "loop" } else { "" };
        println!(
            "  {:02X} {:<22} {:>6} vol {:>2} fine {:>2} {}",
            i + 1,
            sample.name.as_str(),
            sample.len(),
            sample.volume,
            sample.finetune,
            looping
        );
    }
    println!();
}
