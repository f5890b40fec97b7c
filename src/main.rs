// -----------------------------------------------------------------------------
// traffic-gen - synthetic multi-actor S3 traffic driven through a storage CLI
// -----------------------------------------------------------------------------

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use tokio::runtime::Builder as RtBuilder;
use tracing::info;

use traffic_gen::config::GeneratorConfig;
use traffic_gen::constants::DEFAULT_LOCK_PATH;
use traffic_gen::lock::{self, LockStatus};
use traffic_gen::logfile::RotatingFile;
use traffic_gen::Supervisor;

#[derive(Parser)]
#[command(name = "traffic-gen", version, about = "Synthetic S3 traffic generator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Also append logs to this file (rolls over at 100 MB, keeps 5 backups)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate traffic until the duration elapses or SIGINT/SIGTERM
    ///
    /// Examples:
    ///   traffic-gen run
    ///   traffic-gen run --config configs/traffic.yaml --duration 30m
    ///   traffic-gen run --client-binary /usr/local/bin/obsctl --endpoint http://minio:9000
    Run {
        /// YAML config file; built-in personas when omitted
        #[arg(short = 'c', long)]
        config: Option<PathBuf>,

        /// Override run duration (e.g. "90s", "2h")
        #[arg(long, value_parser = humantime::parse_duration)]
        duration: Option<Duration>,

        #[arg(long)]
        client_binary: Option<PathBuf>,

        #[arg(long)]
        temp_root: Option<PathBuf>,

        #[arg(long)]
        endpoint: Option<String>,
    },
    /// Report whether a generator currently holds the lock
    Status {
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long)]
        lock_path: Option<PathBuf>,
    },
    /// Print the effective configuration as YAML
    ShowConfig {
        #[arg(short = 'c', long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    init_logging(level, cli.log_file.as_deref())?;

    match cli.command {
        Commands::Run {
            config,
            duration,
            client_binary,
            temp_root,
            endpoint,
        } => {
            let mut cfg = GeneratorConfig::load(config.as_deref())?;
            if let Some(d) = duration {
                cfg.duration = d;
            }
            if let Some(b) = client_binary {
                cfg.client.binary = b;
            }
            if let Some(t) = temp_root {
                cfg.temp_root = t;
            }
            if let Some(e) = endpoint {
                cfg.client.endpoint = e;
            }
            cfg.validate().context("invalid configuration after overrides")?;
            run_cmd(cfg)
        }
        Commands::Status { config, lock_path } => {
            let path = match lock_path {
                Some(p) => p,
                None if config.is_some() => GeneratorConfig::load(config.as_deref())?.lock_path,
                None => PathBuf::from(DEFAULT_LOCK_PATH),
            };
            status_cmd(&path);
            Ok(())
        }
        Commands::ShowConfig { config } => {
            let cfg = GeneratorConfig::load(config.as_deref())?;
            print!("{}", cfg.to_yaml()?);
            Ok(())
        }
    }
}

fn init_logging(level: &str, log_file: Option<&Path>) -> Result<()> {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(format!("traffic_gen={}", level)));
    let file_layer = match log_file {
        Some(path) => {
            let file = RotatingFile::open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            Some(
                fmt::layer()
                    .with_writer(std::sync::Mutex::new(file))
                    .with_ansi(false)
                    .with_target(false),
            )
        }
        None => None,
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(file_layer)
        .init();
    if let Some(path) = log_file {
        info!(path = %path.display(), "logging to file");
    }
    Ok(())
}

fn run_cmd(cfg: GeneratorConfig) -> Result<()> {
    // One worker per actor
    let rt = RtBuilder::new_multi_thread()
        .worker_threads(cfg.actors.len().max(1))
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    let summary = rt.block_on(Supervisor::new(cfg).run())?;
    info!(
        reason = %summary.stop_reason,
        operations = summary.snapshot.global.operations,
        errors = summary.snapshot.global.errors,
        "traffic generator finished"
    );
    if !summary.unacknowledged.is_empty() {
        eprintln!("actors without stop acknowledgement: {}", summary.unacknowledged.join(", "));
    }
    if summary.final_cleanup.protected_files > 0 {
        eprintln!(
            "{} in-flight files left behind by final cleanup",
            summary.final_cleanup.protected_files
        );
    }
    Ok(())
}

fn status_cmd(path: &Path) {
    match lock::status(path) {
        LockStatus::NotRunning => println!("not running (no lock at {})", path.display()),
        LockStatus::Running(pid) => println!("running (pid {}, lock {})", pid, path.display()),
        LockStatus::Stale(Some(pid)) => println!("stale lock at {} (pid {} is gone)", path.display(), pid),
        LockStatus::Stale(None) => println!("stale lock at {} (no readable pid)", path.display()),
    }
}
