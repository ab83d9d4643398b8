use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand};

use satpass::cache::{BatchScheduler, PassCache, UpdateTask, DEFAULT_BATCH_SIZE};
use satpass::catalog::{load_station, Catalog};
use satpass::config::PredictConfig;
use satpass::ground::GroundPoint;
use satpass::predict::{
    compute_passes, filter_passes, Pass, PassGeometry, PredictionMode, VisibilityFilters,
    DEFAULT_HORIZON_HOURS,
};
use satpass::sampling::{Frame, SampledPositionCache};

#[derive(Parser)]
#[command(name = "satpass")]
#[command(about = "Satellite pass prediction and orbit sampling")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Predict passes for every object in a TLE directory
    Passes {
        #[arg(long)]
        tle_dir: PathBuf,
        /// YAML station file (alternative to --lat/--lon)
        #[arg(long)]
        station: Option<PathBuf>,
        #[arg(long)]
        lat: Option<f64>,
        #[arg(long)]
        lon: Option<f64>,
        #[arg(long, default_value_t = 2.0)]
        height_m: f64,
        #[arg(long, value_enum, default_value = "elevation")]
        mode: PredictionMode,
        /// Prediction window ahead of the reference time, e.g. "4days"
        #[arg(long, default_value = "4days")]
        window: humantime::Duration,
        #[arg(long, default_value_t = 0.0)]
        min_elevation: f64,
        #[arg(long, default_value_t = DEFAULT_HORIZON_HOURS)]
        horizon_hours: i64,
        /// Keep only passes with the ground point in darkness
        #[arg(long)]
        hide_sunlit: bool,
        /// Keep only passes with the object in sunlight
        #[arg(long)]
        only_lit: bool,
        /// Reference time (RFC 3339), defaults to the current time
        #[arg(long)]
        at: Option<DateTime<Utc>>,
        #[arg(long)]
        json: bool,
    },
    /// Print the sampled position of one object at a given time
    Position {
        #[arg(long)]
        tle_dir: PathBuf,
        #[arg(long)]
        norad_id: u32,
        /// Reference time (RFC 3339), defaults to the current time
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
    /// Run a batched pass-cache refresh over the whole catalog
    Update {
        #[arg(long)]
        tle_dir: PathBuf,
        #[arg(long)]
        station: Option<PathBuf>,
        #[arg(long)]
        lat: Option<f64>,
        #[arg(long)]
        lon: Option<f64>,
        #[arg(long, default_value_t = 2.0)]
        height_m: f64,
        #[arg(long, value_enum, default_value = "elevation")]
        mode: PredictionMode,
        #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
        batch_size: usize,
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Passes {
            tle_dir,
            station,
            lat,
            lon,
            height_m,
            mode,
            window,
            min_elevation,
            horizon_hours,
            hide_sunlit,
            only_lit,
            at,
            json,
        } => {
            let ground = match resolve_ground(station, lat, lon, height_m) {
                Ok(g) => g,
                Err(e) => return fail(&e),
            };
            let filters = VisibilityFilters {
                hide_sunlit,
                show_only_lit: only_lit,
            };
            run_passes(
                tle_dir,
                ground,
                mode,
                window,
                min_elevation,
                horizon_hours,
                filters,
                at,
                json,
            )
        }
        Commands::Position {
            tle_dir,
            norad_id,
            at,
        } => run_position(tle_dir, norad_id, at),
        Commands::Update {
            tle_dir,
            station,
            lat,
            lon,
            height_m,
            mode,
            batch_size,
            at,
        } => {
            let ground = match resolve_ground(station, lat, lon, height_m) {
                Ok(g) => g,
                Err(e) => return fail(&e),
            };
            run_update(tle_dir, ground, mode, batch_size, at).await
        }
    }
}

fn fail(message: &str) -> ExitCode {
    eprintln!("Error: {message}");
    ExitCode::FAILURE
}

fn resolve_ground(
    station: Option<PathBuf>,
    lat: Option<f64>,
    lon: Option<f64>,
    height_m: f64,
) -> Result<GroundPoint, String> {
    if let Some(path) = station {
        return load_station(&path).map_err(|e| e.to_string());
    }
    match (lat, lon) {
        (Some(lat), Some(lon)) => {
            GroundPoint::new(lat, lon, height_m, None).map_err(|e| e.to_string())
        }
        _ => Err("either --station or both --lat and --lon are required".into()),
    }
}

fn load_catalog(tle_dir: PathBuf) -> Result<Catalog, String> {
    let mut catalog = Catalog::new(tle_dir);
    catalog.load_all().map_err(|e| e.to_string())?;
    if catalog.is_empty() {
        return Err("no objects loaded from the TLE directory".into());
    }
    Ok(catalog)
}

#[allow(clippy::too_many_arguments)]
fn run_passes(
    tle_dir: PathBuf,
    ground: GroundPoint,
    mode: PredictionMode,
    window: humantime::Duration,
    min_elevation: f64,
    horizon_hours: i64,
    filters: VisibilityFilters,
    at: Option<DateTime<Utc>>,
    json: bool,
) -> ExitCode {
    let catalog = match load_catalog(tle_dir) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };

    let now = at.unwrap_or_else(Utc::now);
    let horizon = Duration::from_std(window.into()).unwrap_or_else(|_| Duration::days(4));
    let cfg = PredictConfig {
        min_elevation_deg: min_elevation,
        ..PredictConfig::default()
    };

    let mut all: Vec<Pass> = Vec::new();
    for model in catalog.objects() {
        match compute_passes(model, &ground, mode, now, now + horizon, &cfg) {
            Ok(passes) => all.extend(passes),
            Err(e) => log::warn!("skipping {}: {e}", model.name()),
        }
    }

    let visible = filter_passes(&all, now, horizon_hours, &filters);

    if json {
        match serde_json::to_string_pretty(&visible) {
            Ok(out) => println!("{out}"),
            Err(e) => return fail(&e.to_string()),
        }
        return ExitCode::SUCCESS;
    }

    if visible.is_empty() {
        println!("no passes over {} in the next {}", ground.name(), window);
        return ExitCode::SUCCESS;
    }

    println!(
        "{} passes over {} ({} objects):",
        visible.len(),
        ground.name(),
        catalog.len()
    );
    for pass in &visible {
        print_pass(pass);
    }
    ExitCode::SUCCESS
}

fn print_pass(pass: &Pass) {
    let geometry = match pass.geometry {
        PassGeometry::Elevation {
            max_elevation_deg,
            apex_azimuth_deg,
        } => format!("max el {max_elevation_deg:5.1} deg @ az {apex_azimuth_deg:5.1}"),
        PassGeometry::Swath {
            min_distance_km,
            swath_width_km,
        } => format!("min dist {min_distance_km:6.1} km (swath {swath_width_km:.0} km)"),
    };
    let epoch_note = if pass.epoch_in_future {
        "  [elements not yet valid]"
    } else {
        ""
    };
    println!(
        "  {}  {} .. {}  {:4}s  {}  ground dark {}/{}  eclipsed {}/{}{}",
        pass.satellite,
        pass.start.format("%Y-%m-%d %H:%M:%S"),
        pass.end.format("%H:%M:%S"),
        pass.duration_seconds,
        geometry,
        pass.illumination.ground_dark_at_start,
        pass.illumination.ground_dark_at_end,
        pass.illumination.object_eclipsed_at_start,
        pass.illumination.object_eclipsed_at_end,
        epoch_note,
    );
}

fn run_position(tle_dir: PathBuf, norad_id: u32, at: Option<DateTime<Utc>>) -> ExitCode {
    let catalog = match load_catalog(tle_dir) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    let model = match catalog.get(norad_id) {
        Some(m) => m.clone(),
        None => return fail(&format!("no object with NORAD id {norad_id}")),
    };

    let time = at.unwrap_or_else(Utc::now);
    let mut cache = SampledPositionCache::new(model.clone());
    if let Err(e) = cache.ensure_coverage(time) {
        return fail(&e.to_string());
    }

    let inertial = cache.position_at(time, Frame::Inertial);
    let fixed = cache.position_at(time, Frame::Fixed);
    match (inertial, fixed) {
        (Some(inertial), Some(fixed)) => {
            println!("{} @ {}", model.name(), time.format("%Y-%m-%d %H:%M:%S"));
            println!(
                "  inertial  [{:10.3}, {:10.3}, {:10.3}] km",
                inertial.position[0], inertial.position[1], inertial.position[2]
            );
            println!(
                "  fixed     [{:10.3}, {:10.3}, {:10.3}] km",
                fixed.position[0], fixed.position[1], fixed.position[2]
            );
            if let Ok((lat, lon)) = model.subpoint(time) {
                println!(
                    "  subpoint  {:8.4} deg, {:9.4} deg",
                    lat.to_degrees(),
                    lon.to_degrees()
                );
            }
            ExitCode::SUCCESS
        }
        _ => fail("position unavailable"),
    }
}

async fn run_update(
    tle_dir: PathBuf,
    ground: GroundPoint,
    mode: PredictionMode,
    batch_size: usize,
    at: Option<DateTime<Utc>>,
) -> ExitCode {
    let catalog = match load_catalog(tle_dir) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };

    let now = at.unwrap_or_else(Utc::now);
    let ground = Arc::new(ground);
    let tasks: Vec<UpdateTask> = catalog
        .objects()
        .map(|model| UpdateTask {
            model: model.clone(),
            ground: ground.clone(),
            mode,
            cache: Arc::new(Mutex::new(PassCache::new())),
        })
        .collect();

    let report = BatchScheduler::new(batch_size)
        .run(
            tasks,
            now,
            VisibilityFilters::default(),
            &PredictConfig::default(),
        )
        .await;

    println!(
        "updated {}, unchanged {}, failed {}",
        report.updated,
        report.unchanged,
        report.failures.len()
    );
    for (name, error) in &report.failures {
        println!("  {name}: {error}");
    }

    if report.failures.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
