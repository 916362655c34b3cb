use clap::Parser;
use peaksieve::{
    Calibration, CandidateList, ChargeMap, GridExtent, GridPosition, NeighborhoodGeometry,
    NoiseSuppressor, PeakStatusMap, SuppressionConfig,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));
const EXAMPLE_EVENT_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/event.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "Peak noise suppression CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Print an example event file and exit.
    #[arg(long)]
    print_example_event: bool,
    /// Enable tracing output for performance profiling.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct GeometryJson {
    pad_radius: u8,
    time_radius: u8,
}

impl Default for GeometryJson {
    fn default() -> Self {
        let geometry = NeighborhoodGeometry::default();
        Self {
            pad_radius: geometry.pad_radius,
            time_radius: geometry.time_radius,
        }
    }
}

impl From<GeometryJson> for NeighborhoodGeometry {
    fn from(value: GeometryJson) -> Self {
        Self {
            pad_radius: value.pad_radius,
            time_radius: value.time_radius,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct SuppressionConfigJson {
    capacity: usize,
    batch_size: usize,
    slots_per_lane: usize,
    parallel: bool,
    verify_candidates: bool,
}

impl Default for SuppressionConfigJson {
    fn default() -> Self {
        let cfg = SuppressionConfig::default();
        Self {
            capacity: cfg.capacity,
            batch_size: cfg.batch_size,
            slots_per_lane: cfg.slots_per_lane,
            parallel: cfg.parallel,
            verify_candidates: cfg.verify_candidates,
        }
    }
}

impl From<SuppressionConfigJson> for SuppressionConfig {
    fn from(value: SuppressionConfigJson) -> Self {
        Self {
            capacity: value.capacity,
            batch_size: value.batch_size,
            slots_per_lane: value.slots_per_lane,
            parallel: value.parallel,
            verify_candidates: value.verify_candidates,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct CalibrationJson {
    noise_epsilon: f32,
    peak_charge_threshold: f32,
}

impl Default for CalibrationJson {
    fn default() -> Self {
        let cal = Calibration::default();
        Self {
            noise_epsilon: cal.noise_epsilon,
            peak_charge_threshold: cal.peak_charge_threshold,
        }
    }
}

impl From<CalibrationJson> for Calibration {
    fn from(value: CalibrationJson) -> Self {
        Self {
            noise_epsilon: value.noise_epsilon,
            peak_charge_threshold: value.peak_charge_threshold,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Config {
    event_path: String,
    output_path: Option<String>,
    geometry: GeometryJson,
    suppression: SuppressionConfigJson,
    calibration: CalibrationJson,
}

/// Sparse event: only non-zero charges are listed.
#[derive(Debug, Deserialize)]
struct Event {
    rows: usize,
    pads: usize,
    times: usize,
    /// `[row, pad, time, charge]`
    charges: Vec<(u16, u16, u16, f32)>,
    /// `[row, pad, time]`, as produced by the peak finder.
    candidates: Vec<(u16, u16, u16)>,
}

#[derive(Debug, Serialize)]
struct PositionRecord {
    row: u16,
    pad: u16,
    time: u16,
}

impl From<GridPosition> for PositionRecord {
    fn from(value: GridPosition) -> Self {
        Self {
            row: value.row,
            pad: value.pad,
            time: value.time,
        }
    }
}

#[derive(Debug, Serialize)]
struct Output {
    confirmed: usize,
    suppressed: usize,
    kept: Vec<PositionRecord>,
    removed: Vec<PositionRecord>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("peaksieve=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }
    if cli.print_example_event {
        println!("{EXAMPLE_EVENT_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.event_path.is_empty() {
        return Err("event_path must be set in the config".into());
    }

    let event_text = fs::read_to_string(&config.event_path)?;
    let event: Event = serde_json::from_str(&event_text)?;

    let geometry: NeighborhoodGeometry = config.geometry.into();
    let suppressor = NoiseSuppressor::new(
        geometry,
        config.suppression.into(),
        config.calibration.into(),
    )?;

    let extent = GridExtent::for_geometry(event.rows, event.pads, event.times, geometry)?;
    let mut charge = ChargeMap::new(extent)?;
    let mut status = PeakStatusMap::new(extent)?;
    for (row, pad, time, q) in event.charges {
        let pos = GridPosition::new(row, pad, time);
        if !charge.set_charge(pos, q) {
            return Err(format!("charge at ({row}, {pad}, {time}) is outside the grid").into());
        }
    }

    let positions: Vec<_> = event
        .candidates
        .into_iter()
        .map(|(row, pad, time)| GridPosition::new(row, pad, time))
        .collect();
    for &pos in &positions {
        status.mark_candidate(pos);
    }
    let candidates = CandidateList::new(positions, suppressor.config().capacity)?;

    let report = suppressor.run(&charge, &mut status, &candidates)?;
    tracing::info!(
        confirmed = report.summary.confirmed,
        suppressed = report.summary.suppressed,
        "noise suppression finished"
    );

    let kept = report
        .kept_positions(&candidates)
        .map(PositionRecord::from)
        .collect();
    let removed = candidates
        .positions()
        .iter()
        .enumerate()
        .filter(|(idx, _)| !report.decisions.is_kept(*idx))
        .map(|(_, pos)| PositionRecord::from(*pos))
        .collect();
    let output = Output {
        confirmed: report.summary.confirmed,
        suppressed: report.summary.suppressed,
        kept,
        removed,
    };
    let json = serde_json::to_string_pretty(&output)?;

    match config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}
