use barcode_reader::config::ConfigLoader;
use barcode_reader::logging::init_logging;
use barcode_reader::{
    AppError, BarcodeDecoder, Config, ConfigError, JsonCatalog, LineSource,
    PortDiscovery, PortOpener, PortSwitcher, ProductCatalog, ReaderContext, ScanService,
    ScanSession, ScannedItem, SystemPortOpener,
};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

#[cfg(feature = "journal")]
use barcode_reader::{ScanJournal, Shift};

// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    version,
    about = "Reads barcodes from a serial scanner and tracks the scans of a work shift.",
    long_about = "Opens the configured serial scanner, decodes every barcode it sends, resolves it against the product catalog and keeps a per-shift tally. The shift is journaled so it survives restarts."
)]
struct Args {
    /// Configuration file (overrides BRREADER_CONFIG and the default locations).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serial device to read from.
    #[arg(short, long)]
    port: Option<String>,

    /// Product catalog JSON file.
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// List openable serial ports and exit.
    #[arg(short, long)]
    list_ports: bool,

    /// Decode a single barcode, print it as JSON and exit.
    #[arg(long, value_name = "BARCODE")]
    decode: Option<String>,

    /// Start a fresh shift instead of restoring the last one.
    #[arg(long)]
    clear: bool,

    /// Do not journal scans.
    #[arg(long)]
    no_journal: bool,

    /// Log at debug level unless RUST_LOG is set.
    #[arg(short, long)]
    verbose: bool,
}

// --- Main Application Entry Point ---
#[tokio::main]
async fn main() -> Result<(), AppError> {
    let args = Args::parse();
    let config = load_config(&args)?;
    init_logging(&config.logging, args.verbose)?;

    if let Some(ref raw) = args.decode {
        let event = BarcodeDecoder::new(config.decoder.clone()).decode_str(raw, chrono::Utc::now())?;
        println!("{}", serde_json::to_string_pretty(&event).map_err(|e| AppError::Io(e.into()))?);
        return Ok(());
    }

    let shared = ReaderContext::new(config.serial.separator);
    let opener: Arc<dyn PortOpener> =
        Arc::new(SystemPortOpener::new(config.serial.port_configuration()));
    let discovery = PortDiscovery::new(Arc::clone(&shared), Arc::clone(&opener), config.discovery.clone());

    if args.list_ports {
        let listing = tokio::task::spawn_blocking(move || discovery.list_ports())
            .await
            .map_err(|e| AppError::Io(std::io::Error::other(e)))?;
        if listing.is_empty() {
            println!("No serial ports available");
        }
        for entry in listing {
            let marker = if entry.active { " (active)" } else { "" };
            println!("{}{}", entry.name, marker);
        }
        return Ok(());
    }

    let port = config.serial.port.clone().ok_or_else(|| {
        ConfigError::validation("serial.port", "no serial port configured; pass --port")
    })?;

    let catalog: Arc<dyn ProductCatalog> = Arc::new(JsonCatalog::load(&config.catalog.path)?);
    info!(path = %config.catalog.path.display(), products = catalog.len(), "Product catalog loaded");

    let session = Arc::new(ScanSession::new());
    #[cfg(feature = "journal")]
    let journal = open_journal(&config, &args, &session, &port).await?;
    #[cfg(not(feature = "journal"))]
    if args.clear {
        info!("Starting with an empty session");
    }

    let service = ScanService::new(
        PortSwitcher::new(Arc::clone(&shared), opener),
        discovery,
        BarcodeDecoder::new(config.decoder.clone()),
        Arc::clone(&catalog),
        Arc::clone(&session),
    );

    let (tx, mut tokens) = tokio::sync::mpsc::unbounded_channel();
    let reader = LineSource::new(Arc::clone(&shared), tx, config.serial.reader_options()).spawn()?;

    if let Err(e) = service.switch_to(&port) {
        error!(port = %port, error = %e, "Cannot open the configured scanner port");
        reader.shutdown_async().await;
        return Err(e.into());
    }
    info!(port = %port, "Waiting for scans; press Ctrl+C to stop");

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            token = tokens.recv() => {
                let Some(token) = token else {
                    warn!("Serial reader stopped unexpectedly");
                    break;
                };
                let Ok(item) = service.dispatch(&token) else {
                    continue;
                };
                print_scan(&item, session.frequency(item.event.product_code));
                #[cfg(feature = "journal")]
                if let Some((ref journal, ref shift)) = journal {
                    if let Err(e) = journal.record(&shift.id, &item.event).await {
                        warn!(error = %e, "Failed to journal scan");
                    }
                }
            }
            _ = &mut shutdown => break,
        }
    }

    reader.shutdown_async().await;
    print_summary(&service);
    Ok(())
}

fn load_config(args: &Args) -> Result<Config, AppError> {
    let loader = match args.config {
        Some(ref path) => ConfigLoader::load_from(path)?,
        None => ConfigLoader::load()?,
    };
    let mut config = loader.into_config();

    // Command-line values take precedence over file and environment.
    if let Some(ref port) = args.port {
        config.serial.port = Some(port.clone());
    }
    if let Some(ref catalog) = args.catalog {
        config.catalog.path = catalog.clone();
    }
    if args.no_journal {
        config.journal.enabled = false;
    }
    config.validate()?;
    Ok(config)
}

/// Resume the latest open shift, or start a new one.
#[cfg(feature = "journal")]
async fn open_journal(
    config: &Config,
    args: &Args,
    session: &ScanSession,
    port: &str,
) -> Result<Option<(ScanJournal, Shift)>, AppError> {
    if !config.journal.enabled {
        return Ok(None);
    }
    let journal = ScanJournal::new(&config.journal.database_url).await?;

    let previous = journal.latest_open_shift().await?;
    let shift = match previous {
        Some(shift) if !args.clear => {
            let events = journal.load(&shift.id).await?;
            info!(shift = %shift.id, scans = events.len(), "Restored open shift");
            session.restore(events);
            shift
        }
        previous => {
            if let Some(old) = previous {
                journal.close_shift(&old.id).await?;
                info!(shift = %old.id, "Closed previous shift");
            }
            let shift = journal.open_shift(Some(port)).await?;
            info!(shift = %shift.id, "Started new shift");
            shift
        }
    };
    Ok(Some((journal, shift)))
}

fn print_scan(item: &ScannedItem, count: usize) {
    let event = &item.event;
    let mut line = format!("{:013} {}", event.product_code, item.product.name);
    if let Some(weight) = event.weight_grams {
        line.push_str(&format!(" {weight:.3}"));
    }
    if let Some(date) = event.pack_date {
        line.push_str(&format!(" packed {date}"));
    }
    println!("{line} [x{count}]");
}

fn print_summary(service: &ScanService) {
    let snapshot = service.snapshot();
    println!();
    println!("Session summary: {} scans", snapshot.events.len());
    for (code, count) in &snapshot.frequencies {
        let name = service
            .catalog()
            .lookup(*code)
            .map(|p| p.name)
            .unwrap_or_else(|_| "<unknown>".to_string());
        println!("{code:013} {name:<40} {count:>5}");
    }
}

// --- Graceful Shutdown Handler ---
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Signal received, shutting down");
}
