// Main entry point
use clap::Parser;
use colored::Colorize;
use serde::Serialize;
use std::sync::Arc;
use stellar_tales::application::swpc::XrayRange;
use stellar_tales::domain::model::{AlertLevel, Feed, Origin};
use stellar_tales::infrastructure::config::{self, load_config, Config};
use stellar_tales::infrastructure::network::{create_client, ReqwestTransport};
use stellar_tales::interfaces::cli::{Cli, Command};
use stellar_tales::service_worker::{CacheStorage, ServiceWorker};
use stellar_tales::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config()?;

    if config.logging.enable {
        init_logging(&config.logging)?;
    }

    if cli.command == Command::GenerateConfig {
        config::generate_config_sample()?;
        return Ok(());
    }

    let transport = ReqwestTransport::new(create_client(&config)?);
    let state = AppState::new(config, Arc::new(transport.clone()));
    let janitor = state.cache.spawn_janitor();

    tokio::select! {
        result = run(&state, transport, &cli) => result?,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("\nInterrupted, shutting down...");
        }
    }

    janitor.abort();
    Ok(())
}

async fn run(state: &AppState, transport: ReqwestTransport, cli: &Cli) -> anyhow::Result<()> {
    let json = cli.json;
    match &cli.command {
        Command::Summary => {
            let feed = state.donki.summary().await;
            if json {
                return print_json(&feed);
            }
            print_origin(feed.origin);
            let summary = &feed.data;
            println!("Alert level: {}", paint_level(summary.alert_level));
            for flare in &summary.flares {
                println!("  ☀️  {} {}  {}", flare.begin_time, flare.class_type.bold(), flare.explanation);
            }
            for cme in &summary.cmes {
                println!("  💨 {}  {}", cme.start_time, cme.explanation);
            }
            for storm in &summary.storms {
                println!("  🧲 {}  {}", storm.start_time, storm.explanation);
            }
        }
        Command::Flares => {
            print_list(state.donki.solar_flares().await, json, |f| {
                format!("{} {:>5}  {}", f.begin_time, f.class_type, f.explanation)
            })?
        }
        Command::Cmes => print_list(state.donki.cmes().await, json, |c| {
            format!("{}  {}", c.start_time, c.explanation)
        })?,
        Command::Storms => print_list(state.donki.geomagnetic_storms().await, json, |s| {
            format!("{}  Kp {:.1}  {}", s.start_time, s.max_kp, s.explanation)
        })?,
        Command::Sep => print_list(state.donki.particle_events().await, json, |e| {
            format!("{}  {}", e.event_time, e.explanation)
        })?,
        Command::Apod { date } => {
            let feed = state.donki.picture_of_the_day(*date).await;
            if json {
                return print_json(&feed);
            }
            print_origin(feed.origin);
            let apod = &feed.data;
            println!("{} ({})", apod.title.bold(), apod.date);
            println!("{}", apod.url.cyan());
            println!("\n{}", apod.explanation);
        }
        Command::Images { query } => {
            let query = query.join(" ");
            print_list(state.donki.search_images(&query).await, json, |i| {
                format!(
                    "{}  {}",
                    i.title.bold(),
                    i.thumbnail_url.as_deref().unwrap_or("-")
                )
            })?
        }
        Command::Alerts => print_list(state.swpc.alerts().await, json, |a| {
            format!("{}  {}", a.issued, a.headline)
        })?,
        Command::Notifications => print_list(state.swpc.notifications().await, json, |n| {
            format!("{}  {:?}  {}", n.issued, n.kind, n.headline)
        })?,
        Command::Xray { week } => {
            let range = if *week {
                XrayRange::SevenDays
            } else {
                XrayRange::OneDay
            };
            print_list(state.swpc.xray_flux(range).await, json, |p| {
                format!("{}  {:.2e} W/m²  {}", p.time, p.flux, p.energy)
            })?
        }
        Command::Wind => {
            let (mag, plasma) = tokio::join!(
                state.swpc.solar_wind_magnetic(),
                state.swpc.solar_wind_plasma()
            );
            if json {
                return print_json(&serde_json::json!({ "magnetic": mag, "plasma": plasma }));
            }
            if let Some(latest) = mag.data.last() {
                println!("Bz {:?} nT, Bt {:?} nT at {}", latest.bz_gsm, latest.bt, latest.time);
            }
            if let Some(latest) = plasma.data.last() {
                println!(
                    "Speed {:?} km/s, density {:?} p/cm³ at {}",
                    latest.speed, latest.density, latest.time
                );
            }
        }
        Command::Kp => print_list(state.swpc.kp_forecast().await, json, |k| {
            format!("{}  Kp {:.2}  {:?}", k.time, k.kp, k.kind)
        })?,
        Command::Aurora => {
            let feed = state.swpc.aurora_forecast().await;
            if json {
                return print_json(&serde_json::json!({
                    "images": state.swpc.aurora_images(),
                    "forecast": feed,
                }));
            }
            print_origin(feed.origin);
            let images = state.swpc.aurora_images();
            println!("North: {}", images.north.cyan());
            println!("South: {}", images.south.cyan());
            let active = feed.data.coordinates.iter().filter(|p| p.intensity > 0.0).count();
            println!("{} grid points with aurora", active);
        }
        Command::Precache => precache(&state.config, transport).await?,
        Command::Status => print_status(state),
        Command::GenerateConfig => config::generate_config_sample()?,
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_origin(origin: Origin) {
    if origin == Origin::Fallback {
        eprintln!("{}", "Live data unavailable, showing sample data.".yellow());
    }
}

fn print_list<T: Serialize>(
    feed: Feed<Vec<T>>,
    json: bool,
    line: impl Fn(&T) -> String,
) -> anyhow::Result<()> {
    if json {
        return print_json(&feed);
    }
    print_origin(feed.origin);
    if feed.data.is_empty() {
        println!("Nothing to report.");
    }
    for item in &feed.data {
        println!("  {}", line(item));
    }
    Ok(())
}

fn paint_level(level: AlertLevel) -> colored::ColoredString {
    match level {
        AlertLevel::Low => "LOW".green(),
        AlertLevel::Moderate => "MODERATE".yellow(),
        AlertLevel::High => "HIGH".red().bold(),
    }
}

async fn precache(config: &Config, transport: ReqwestTransport) -> anyhow::Result<()> {
    let mut worker = ServiceWorker::new(&config.service_worker, CacheStorage::new(), transport)?;
    let report = worker.install().await?;
    let deleted = worker.activate()?;

    println!(
        "{} {}",
        "Installed".green().bold(),
        worker.app_bucket()
    );
    for asset in &report.cached {
        println!("  ✔ {}", asset);
    }
    for asset in &report.failed {
        println!("  ✘ {}", asset.red());
    }
    for bucket in &deleted {
        println!("  removed {}", bucket);
    }
    Ok(())
}

/// Initialize logging with path and level configuration
fn init_logging(logging: &config::Logging) -> anyhow::Result<()> {
    use tracing_subscriber::EnvFilter;

    let level = match logging.level.as_str() {
        "DEBUG" => "debug",
        "INFO" => "info",
        "WARN" => "warn",
        "ERROR" => "error",
        _ => "warn",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if let Some(path) = &logging.path {
        if !path.is_empty() {
            // Log to file
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(file)
                .init();
            return Ok(());
        }
    }

    // stderr keeps stdout clean for --json
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

fn print_status(state: &AppState) {
    println!("{}", "Stellar Tales Status".green().bold());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    println!(
        "Config: {}",
        config::get_config_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "Not found".to_string())
    );

    let nasa = &state.config.nasa;
    if nasa.resolved_api_key() == config::DEMO_API_KEY {
        println!("NASA API: demo key (rate limited)");
    } else {
        println!("NASA API: Configured");
    }
    println!("NASA base: {}", nasa.api_base());
    println!("SWPC base: {}", state.config.swpc.base_url);

    let stats = state.cache.stats();
    println!(
        "Request cache: {} entries, {} pending, default ttl {}s",
        stats.size,
        stats.pending,
        state.cache.default_ttl().as_secs()
    );
    println!(
        "Offline cache: {} (version {})",
        stellar_tales::service_worker::app_bucket_name(&state.config.service_worker.version),
        state.config.service_worker.version
    );
}
