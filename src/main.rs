//! NDI Monitor CLI
//!
//! Runs one monitoring session against an NDI source (with the `ndi`
//! feature) or a mock source, and writes the session report on exit.

use clap::Parser;
use ndi_monitor::{FileConfig, FrameSource, SamplingLoop};
#[cfg(not(feature = "ndi"))]
use ndi_monitor::MockSource;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "ndi-monitor", version, about = "Frame-metadata monitor for NDI video sources")]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Session length in seconds; 0 runs until Ctrl-C.
    #[arg(long, default_value_t = 60)]
    duration: u64,

    /// Connect to the named source instead of the first one discovered.
    #[cfg(feature = "ndi")]
    #[arg(long)]
    source: Option<String>,

    /// List discovered sources and exit.
    #[cfg(feature = "ndi")]
    #[arg(long)]
    list: bool,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    info!("NDI Monitor v{}", ndi_monitor::VERSION);

    let config = match &args.config {
        Some(path) => match FileConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config: {e}");
                std::process::exit(1);
            }
        },
        None => FileConfig::default(),
    };

    #[cfg(feature = "ndi")]
    run_ndi(&args, &config);

    #[cfg(not(feature = "ndi"))]
    {
        info!("Built without the `ndi` feature; monitoring a mock source");
        run_session(MockSource::new(), &config, args.duration);
    }
}

#[cfg(feature = "ndi")]
fn run_ndi(args: &Args, config: &FileConfig) {
    use ndi_monitor::source::{NdiFinder, NdiRuntime, NdiSource};

    let runtime = match NdiRuntime::new() {
        Ok(runtime) => Arc::new(runtime),
        Err(e) => {
            eprintln!("Failed to initialize NDI: {e}");
            std::process::exit(1);
        }
    };
    let finder = match NdiFinder::new(&runtime) {
        Ok(finder) => finder,
        Err(e) => {
            eprintln!("Failed to create source finder: {e}");
            std::process::exit(1);
        }
    };

    info!("Discovering sources...");
    let sources = finder.wait_for_sources(config.source.discovery_timeout());
    if args.list {
        for source in &sources {
            println!("{}\t{}", source.name, source.address);
        }
        return;
    }

    let wanted = args.source.as_ref().or(config.source.source_name.as_ref());
    let chosen = match wanted {
        Some(name) => sources.iter().find(|s| &s.name == name),
        None => sources.first(),
    };
    let Some(chosen) = chosen else {
        eprintln!("No matching NDI source found ({} discovered)", sources.len());
        std::process::exit(1);
    };

    info!(source = %chosen.name, address = %chosen.address, "Connecting");
    match NdiSource::connect(&runtime, chosen) {
        Ok(source) => run_session(source, config, args.duration),
        Err(e) => {
            eprintln!("Failed to connect: {e}");
            std::process::exit(1);
        }
    }
}

fn run_session<S: FrameSource + Send + 'static>(source: S, config: &FileConfig, duration: u64) {
    let mut sampler = SamplingLoop::new(source, config.sampling.clone(), config.report.clone());
    if let Err(e) = sampler.start() {
        eprintln!("Failed to start sampling: {e}");
        std::process::exit(1);
    }

    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);
    if let Err(e) = ctrlc::set_handler(move || flag.store(false, Ordering::SeqCst)) {
        warn!("Failed to install Ctrl-C handler: {e}");
    }

    let deadline = (duration > 0).then(|| Instant::now() + Duration::from_secs(duration));
    while running.load(Ordering::SeqCst) {
        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            break;
        }
        std::thread::sleep(Duration::from_millis(200));
    }

    match sampler.stop() {
        Ok(summary) => {
            if !summary.clean_shutdown {
                warn!("Sampling thread did not stop in time; the final window may be missing");
            }
            if let Some(report) = summary.report {
                println!("Log written to {}", report.log.display());
                match report.chart {
                    Some(chart) => println!("Chart written to {}", chart.display()),
                    None => info!("Chart skipped (fewer than two aggregated records)"),
                }
            }
        }
        Err(e) => {
            eprintln!("Failed to emit report: {e}");
            std::process::exit(1);
        }
    }
}
