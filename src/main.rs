mod cli;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use serde::Serialize;
use tokio::sync::{broadcast, oneshot};
use vs_av::{FfmpegEngine, FfprobeProber, MediaEngine, ToolRegistry};
use vs_core::config::Config;
use vs_core::events::{Event, EventPayload};
use vs_split::{ArtifactSummary, SourceVideo, SplitOrchestrator, SplitRequest};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            // Verbose mode: engine output included
            "vidsplit=debug,vs_split=debug,vs_av=trace,vs_core=debug".to_string()
        } else {
            "vidsplit=info,vs_split=info,vs_av=info,vs_core=warn".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Split {
            input,
            slice,
            output_dir,
            json,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(split_file(
                &input,
                slice.as_deref(),
                output_dir,
                json,
                cli.config.as_deref(),
            ))
        }
        Commands::Probe { file, json } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(probe_file(&file, json, cli.config.as_deref()))
        }
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("vidsplit {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// A saved clip, as reported by `split --json`.
#[derive(Serialize)]
struct SavedClip {
    #[serde(flatten)]
    summary: ArtifactSummary,
    path: PathBuf,
}

#[derive(Serialize)]
struct SplitReport {
    source: String,
    duration_seconds: u64,
    slice_seconds: u64,
    clips: Vec<SavedClip>,
}

async fn split_file(
    input: &Path,
    slice: Option<&str>,
    output_dir: Option<PathBuf>,
    json: bool,
    config_path: Option<&Path>,
) -> Result<()> {
    let config = Config::load_or_default(config_path);
    for warning in config.validate() {
        tracing::warn!("config: {warning}");
    }

    if !input.exists() {
        anyhow::bail!("Input file does not exist: {:?}", input);
    }

    let request = match slice {
        Some(s) => s.parse::<SplitRequest>()?,
        None => SplitRequest::new(config.split.slice_seconds)?,
    };
    let output_dir = output_dir.unwrap_or_else(|| config.split.output_dir.clone());

    let tools = ToolRegistry::discover(&config.tools);
    let prober = FfprobeProber::from_registry(&tools)?;
    let info = prober.probe(input).await?;
    tracing::debug!("Source info: {:?}", info);

    let container = config.split.output_container(info.container);
    match (config.split.container, info.container) {
        (Some(configured), Some(probed)) if configured != probed => tracing::warn!(
            "Writing {configured} segments from a {probed} source; stream copy fails if {configured} cannot hold its codecs"
        ),
        (_, None) => tracing::warn!(
            "Could not determine the source container ({}); writing {container}",
            info.format_name.as_deref().unwrap_or("unknown format")
        ),
        _ => {}
    }

    let engine = Arc::new(FfmpegEngine::new(tools).with_exec_timeout(config.split.exec_timeout()));
    let orchestrator = Arc::new(
        SplitOrchestrator::new(engine.clone() as Arc<dyn MediaEngine>).with_container(container),
    );

    tracing::info!("Loading ffmpeg...");
    orchestrator.load_engine().await?;
    if let Some(version) = engine.version() {
        tracing::info!("Using {version}");
    }

    let source = SourceVideo::from_file(input, info.duration_seconds).await?;
    orchestrator.select_source(source);

    let (done_tx, done_rx) = oneshot::channel();
    let renderer = tokio::spawn(render_events(orchestrator.subscribe(), done_rx, json));
    let interrupt = {
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                orchestrator.cancel();
            }
        })
    };

    let result = orchestrator.split(&request).await;
    interrupt.abort();
    let _ = done_tx.send(());
    let _ = renderer.await;
    let artifacts = result?;

    let mut clips = Vec::with_capacity(artifacts.len());
    for artifact in &artifacts {
        let path = artifact.save_to(&output_dir).await?;
        clips.push(SavedClip {
            summary: artifact.summary(),
            path,
        });
    }

    if json {
        let report = SplitReport {
            source: input.display().to_string(),
            duration_seconds: info.duration_seconds,
            slice_seconds: request.slice_seconds(),
            clips,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if clips.is_empty() {
        println!("Source has no duration; nothing to split.");
    } else {
        println!("\nSplit into {} clip(s) in {}:", clips.len(), output_dir.display());
        for clip in &clips {
            println!(
                "  {} ({} bytes) {}",
                clip.path.display(),
                clip.summary.size,
                clip.summary.reference
            );
        }
    }

    Ok(())
}

/// Print run progress to stderr until the run ends or `done` fires.
///
/// A request rejected before the run starts publishes nothing, so `done`
/// is what ends rendering in that case.
async fn render_events(
    mut rx: broadcast::Receiver<Event>,
    mut done: oneshot::Receiver<()>,
    quiet: bool,
) {
    let mut total = 0;
    loop {
        let event = tokio::select! {
            received = rx.recv() => match received {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            },
            _ = &mut done => {
                // Everything the run published is already buffered.
                while let Ok(event) = rx.try_recv() {
                    show(&event.payload, &mut total, quiet);
                }
                break;
            }
        };
        show(&event.payload, &mut total, quiet);
        if event.payload.is_terminal() {
            break;
        }
    }
}

fn show(payload: &EventPayload, total: &mut usize, quiet: bool) {
    if quiet {
        return;
    }
    match payload {
        EventPayload::RunProcessing { total_segments, .. } => *total = *total_segments,
        EventPayload::SegmentStarted { index, name, .. } => {
            eprintln!("[{}/{}] {}", index + 1, total, name);
        }
        EventPayload::SegmentProgress { percent, .. } => eprint!("\r      {percent:>3}%"),
        EventPayload::SegmentCompleted { size, .. } => eprintln!("\r      done ({size} bytes)"),
        EventPayload::RunFailed { error, .. } => eprintln!("\nFailed: {error}"),
        EventPayload::RunCancelled { .. } => eprintln!("\nCancelled"),
        _ => {}
    }
}

async fn probe_file(file: &Path, json: bool, config_path: Option<&Path>) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    let config = Config::load_or_default(config_path);
    let tools = ToolRegistry::discover(&config.tools);
    let info = FfprobeProber::from_registry(&tools)?.probe(file).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        println!("File: {}", file.display());
        if let Some(ref format) = info.format_name {
            println!("Format: {format}");
        }
        if let Some(container) = info.container {
            println!("Container: {container}");
        }
        if let Some(size) = info.size {
            println!("Size: {size} bytes");
        }
        let secs = info.duration_seconds;
        println!(
            "Duration: {:02}:{:02}:{:02} ({:.3}s)",
            secs / 3600,
            (secs / 60) % 60,
            secs % 60,
            info.duration_exact
        );
    }

    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    println!("Checking external tools...\n");

    let config = Config::load_or_default(config_path);
    let tools = ToolRegistry::discover(&config.tools).check_all();
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version.lines().next().unwrap_or(""));
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Install ffmpeg to enable splitting.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let contents = std::fs::read_to_string(p)?;
            Config::from_json(&contents)?
        }
        None => {
            println!("No config file specified, using defaults");
            Config::default()
        }
    };

    let warnings = config.validate();
    if warnings.is_empty() {
        println!("✓ Configuration is valid");
    } else {
        println!("Configuration has {} warning(s):", warnings.len());
        for warning in &warnings {
            println!("  ! {warning}");
        }
    }
    println!("  Slice: {}s", config.split.slice_seconds);
    match config.split.container {
        Some(container) => println!("  Container: {container}"),
        None => println!("  Container: same as source"),
    }
    println!("  Output dir: {}", config.split.output_dir.display());
    println!("  Exec timeout: {}s", config.split.exec_timeout_secs);

    Ok(())
}
