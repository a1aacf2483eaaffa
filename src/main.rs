use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use vitalwatch::{App, DataSource, FileSource, Settings, StreamSource};

#[derive(Parser, Debug)]
#[command(name = "vitalwatch")]
#[command(about = "Aggregate patient vital signs and report threshold alerts")]
struct Args {
    /// Path to a JSON file holding the latest batch of snapshots
    #[arg(short, long, default_value = "vitals.json", conflicts_with_all = ["connect", "listen"])]
    file: PathBuf,

    /// Connect to a TCP gateway streaming snapshots (host:port)
    #[arg(short, long, conflicts_with_all = ["file", "listen"])]
    connect: Option<String>,

    /// Accept bedside device connections on this address (host:port)
    #[arg(short, long, conflicts_with_all = ["file", "connect"])]
    listen: Option<String>,

    /// Poll interval in seconds (overrides the config file)
    #[arg(short, long)]
    refresh: Option<u64>,

    /// Path to a TOML settings file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Ingest the file once, export the resulting state to JSON and exit
    #[arg(short, long, conflicts_with_all = ["connect", "listen"])]
    export: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let settings = Settings::load(args.config.as_deref()).context("Failed to load settings")?;
    init_tracing(&settings.log_level);

    let refresh = Duration::from_secs(args.refresh.unwrap_or(settings.refresh_secs).max(1));

    if let Some(ref export_path) = args.export {
        return export_to_file(&args.file, export_path, &settings);
    }

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let source: Box<dyn DataSource> = if let Some(ref addr) = args.connect {
            tracing::info!("Connecting to {}...", addr);
            let stream = tokio::net::TcpStream::connect(addr.as_str())
                .await
                .with_context(|| format!("Failed to connect to {}", addr))?;
            Box::new(StreamSource::spawn(stream, addr))
        } else if let Some(ref addr) = args.listen {
            Box::new(StreamSource::listen(addr.as_str(), "devices").await?)
        } else {
            Box::new(FileSource::new(&args.file))
        };

        run(App::new(source, settings.thresholds), refresh).await
    })
}

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

/// Poll on a fixed cadence, printing the alert whenever it changes.
async fn run(mut app: App, refresh: Duration) -> Result<()> {
    tracing::info!("Monitoring {} every {:?}", app.source_description(), refresh);

    let mut interval = tokio::time::interval(refresh);
    let mut shown = None;
    let mut last_error: Option<String> = None;

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                return Ok(());
            }
        }

        app.reload_data();

        if app.load_error != last_error {
            if let Some(ref err) = app.load_error {
                tracing::warn!("{}: {}", app.source_description(), err);
            }
            last_error = app.load_error.clone();
        }

        let current = app.alert();
        if current != shown {
            match &current {
                Some(alert) => println!("{}", alert),
                None => println!("No active alert"),
            }
            shown = current;
        }
    }
}

/// Ingest one batch from `input` and write the resulting state to `output`.
fn export_to_file(input: &Path, output: &Path, settings: &Settings) -> Result<()> {
    let mut app = App::new(Box::new(FileSource::new(input)), settings.thresholds);

    if !app.reload_data() {
        let reason = app.load_error.unwrap_or_else(|| "no data".to_string());
        anyhow::bail!("Could not read {}: {}", input.display(), reason);
    }

    app.export_state(output)?;
    println!("Exported vitals state to: {}", output.display());
    Ok(())
}
