//! # loraplan-runner
//!
//! CLI runner for the LoRa link planner.
//!
//! This is the main entry point for evaluating single link budgets and for
//! searching the parameter grid for the best feasible configuration.

mod export;

use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use thiserror::Error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use export::{ExportFormat, FileExporter};
use loraplan_phy::tables::{
    self, SPREADING_FACTOR_MAX, SPREADING_FACTOR_MIN, TX_POWER_MAX_DBM, TX_POWER_MIN_DBM,
};
use loraplan_phy::{evaluate_link, Bandwidth, LinkParams, LinkReport, PhyError};
use loraplan_sweep::{
    optimize_with_observer, score, FeasibleRegion, SweepConfig, SweepError, SweepObserver,
};

// ============================================================================
// Error Types
// ============================================================================

/// Errors surfaced by the runner.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// Link model error.
    #[error("Link model error: {0}")]
    Phy(#[from] PhyError),

    /// Optimizer error.
    #[error("Optimizer error: {0}")]
    Sweep(#[from] SweepError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

// ============================================================================
// CLI Configuration
// ============================================================================

/// Output format for results.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    Text,
    /// JSON for programmatic consumption.
    Json,
}

/// loraplan - LoRa link budget planner
#[derive(Parser, Debug)]
#[command(name = "loraplan")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Evaluate the link model for one parameter combination
    Evaluate(EvaluateConfig),
    /// Search the parameter grid for the best feasible configuration
    Optimize(OptimizeConfig),
    /// List the embedded radio tables
    Tables,
}

/// Configuration for a single link evaluation
#[derive(Parser, Debug)]
#[command(allow_hyphen_values = true)]
pub struct EvaluateConfig {
    /// Spreading factor (6-12)
    #[arg(long, default_value = "12")]
    pub sf: u8,

    /// Coding rate selector (1-4, representing 4/5 to 4/8)
    #[arg(long, default_value = "1")]
    pub cr: u8,

    /// Transmit power in dBm (-2 to 20)
    #[arg(long, default_value = "14", allow_hyphen_values = true)]
    pub power: i8,

    /// Bandwidth code (1 = 125 kHz, 2 = 250 kHz, 3 = 500 kHz)
    #[arg(long, default_value = "1")]
    pub bandwidth: u8,

    /// Plane-Earth path loss exponent (4 open ground, higher for obstructions)
    #[arg(long, default_value = "4.0")]
    pub npe: f64,

    /// Transmit antenna height in meters
    #[arg(long, default_value = "1.0")]
    pub h_tx: f64,

    /// Receive antenna height in meters
    #[arg(long, default_value = "1.0")]
    pub h_rx: f64,

    /// Combined antenna gains in dB
    #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
    pub gains: f64,

    /// Payload size in bytes
    #[arg(long, default_value = "32")]
    pub payload: u32,

    /// Output format: text or json
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Configuration for a grid search
///
/// Supports loading settings from one or more YAML files, with CLI
/// arguments as final overrides. YAML files are merged in order (later
/// files override earlier).
///
/// ## Example YAML
///
/// ```yaml
/// charge_uc_max: 2.0
/// charge_uc_min: 0.1
/// distance_km_max: 3.0
/// distance_km_min: 0.0
/// path_loss_exponent: 4.0
/// payload_bytes: 12
/// ```
#[derive(Parser, Debug)]
#[command(allow_hyphen_values = true)]
pub struct OptimizeConfig {
    /// Path(s) to YAML configuration file(s). Multiple files are merged in
    /// order (later overrides earlier).
    #[arg(short, long = "config", value_name = "FILE")]
    pub configs: Vec<PathBuf>,

    /// Exclusive upper bound on charge per packet in µC (overrides config file)
    #[arg(long)]
    pub charge_max: Option<f64>,

    /// Exclusive lower bound on charge per packet in µC (overrides config file)
    #[arg(long)]
    pub charge_min: Option<f64>,

    /// Exclusive upper bound on range in km (overrides config file)
    #[arg(long)]
    pub distance_max: Option<f64>,

    /// Exclusive lower bound on range in km (overrides config file)
    #[arg(long)]
    pub distance_min: Option<f64>,

    /// Plane-Earth path loss exponent (overrides config file)
    #[arg(long)]
    pub npe: Option<f64>,

    /// Transmit antenna height in meters (overrides config file)
    #[arg(long)]
    pub h_tx: Option<f64>,

    /// Receive antenna height in meters (overrides config file)
    #[arg(long)]
    pub h_rx: Option<f64>,

    /// Combined antenna gains in dB (overrides config file)
    #[arg(long, allow_hyphen_values = true)]
    pub gains: Option<f64>,

    /// Payload size in bytes (overrides config file)
    #[arg(long)]
    pub payload: Option<u32>,

    /// Utility weight on range (overrides config file)
    #[arg(long)]
    pub distance_weight: Option<f64>,

    /// Utility weight on charge (overrides config file)
    #[arg(long)]
    pub charge_weight: Option<f64>,

    /// Write the full evaluated grid to this path for plotting
    #[arg(long, value_name = "FILE")]
    pub export: Option<PathBuf>,

    /// Export format: csv or json
    #[arg(long, value_enum, default_value = "csv")]
    pub export_format: ExportFormat,

    /// Output format: text or json
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Optimizer settings parsed from a YAML file. Every field is optional;
/// missing fields fall back to the [`SweepConfig`] defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    charge_uc_max: Option<f64>,
    charge_uc_min: Option<f64>,
    distance_km_max: Option<f64>,
    distance_km_min: Option<f64>,
    path_loss_exponent: Option<f64>,
    h_transmit_m: Option<f64>,
    h_receive_m: Option<f64>,
    gains_db: Option<f64>,
    payload_bytes: Option<u32>,
    distance_weight: Option<f64>,
    charge_weight: Option<f64>,
}

impl FileConfig {
    /// Merge another file on top of this one (other takes precedence).
    fn merge(&mut self, other: FileConfig) {
        macro_rules! take {
            ($field:ident) => {
                if other.$field.is_some() {
                    self.$field = other.$field;
                }
            };
        }
        take!(charge_uc_max);
        take!(charge_uc_min);
        take!(distance_km_max);
        take!(distance_km_min);
        take!(path_loss_exponent);
        take!(h_transmit_m);
        take!(h_receive_m);
        take!(gains_db);
        take!(payload_bytes);
        take!(distance_weight);
        take!(charge_weight);
    }
}

impl OptimizeConfig {
    /// Load and merge YAML configs, then apply CLI overrides to produce the
    /// final sweep configuration.
    fn resolve(&self) -> Result<SweepConfig, RunnerError> {
        let mut file = FileConfig::default();
        for path in &self.configs {
            let text = fs::read_to_string(path)?;
            let parsed: FileConfig = serde_yaml::from_str(&text).map_err(|e| {
                RunnerError::ConfigError(format!("{}: {}", path.display(), e))
            })?;
            file.merge(parsed);
        }

        let defaults = SweepConfig::default();
        Ok(SweepConfig {
            region: FeasibleRegion {
                charge_uc_max: self
                    .charge_max
                    .or(file.charge_uc_max)
                    .unwrap_or(defaults.region.charge_uc_max),
                charge_uc_min: self
                    .charge_min
                    .or(file.charge_uc_min)
                    .unwrap_or(defaults.region.charge_uc_min),
                distance_km_max: self
                    .distance_max
                    .or(file.distance_km_max)
                    .unwrap_or(defaults.region.distance_km_max),
                distance_km_min: self
                    .distance_min
                    .or(file.distance_km_min)
                    .unwrap_or(defaults.region.distance_km_min),
            },
            path_loss_exponent: self
                .npe
                .or(file.path_loss_exponent)
                .unwrap_or(defaults.path_loss_exponent),
            h_transmit_m: self.h_tx.or(file.h_transmit_m).unwrap_or(defaults.h_transmit_m),
            h_receive_m: self.h_rx.or(file.h_receive_m).unwrap_or(defaults.h_receive_m),
            gains_db: self.gains.or(file.gains_db).unwrap_or(defaults.gains_db),
            payload_bytes: self
                .payload
                .or(file.payload_bytes)
                .unwrap_or(defaults.payload_bytes),
            distance_weight: self
                .distance_weight
                .or(file.distance_weight)
                .unwrap_or(defaults.distance_weight),
            charge_weight: self
                .charge_weight
                .or(file.charge_weight)
                .unwrap_or(defaults.charge_weight),
        })
    }
}

// ============================================================================
// Command Handlers
// ============================================================================

/// Print a link report as human-readable text.
fn print_report(report: &LinkReport) {
    println!("Modulation:");
    println!("  Spreading Factor: SF{}", report.spreading_factor);
    println!("  Coding Rate:      4/{}", report.coding_rate + 4);
    println!("  Bandwidth:        {} kHz", report.bandwidth_khz);
    println!("  TX Power:         {} dBm", report.tx_power_dbm);
    println!("  Payload:          {} bytes", report.payload_bytes);
    println!();
    println!("Derived:");
    println!("  Time on Air:      {:.3} ms", report.packet_time_ms);
    println!("  Charge/Packet:    {:.3} µC", report.charge_uc);
    println!("  Energy/Packet:    {:.3} µJ", report.energy_uj());
    println!("  Max Path Loss:    {:.1} dB", report.max_path_loss_db);
    println!("  RSSI at Limit:    {:.1} dBm", report.rssi_dbm);
    println!("  Max Distance:     {:.3} km", report.max_distance_km);
}

/// Evaluate the link model for one parameter combination.
fn evaluate_command(config: EvaluateConfig) -> Result<(), RunnerError> {
    let params = LinkParams {
        spreading_factor: config.sf,
        coding_rate: config.cr,
        tx_power_dbm: config.power,
        bandwidth_code: config.bandwidth,
        path_loss_exponent: config.npe,
        h_transmit_m: config.h_tx,
        h_receive_m: config.h_rx,
        gains_db: config.gains,
        payload_bytes: config.payload,
    };
    let report = evaluate_link(&params)?;

    match config.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => {
            println!("Link Budget");
            println!("===========");
            println!();
            print_report(&report);
        }
    }
    Ok(())
}

/// Search the parameter grid for the best feasible configuration.
fn optimize_command(config: OptimizeConfig) -> Result<(), RunnerError> {
    let sweep_config = config.resolve()?;

    let mut exporter = config
        .export
        .as_ref()
        .map(|path| FileExporter::new(path.clone(), config.export_format));

    let outcome = optimize_with_observer(
        &sweep_config,
        exporter.as_mut().map(|e| e as &mut dyn SweepObserver),
    )?;

    if let Some(exporter) = exporter {
        exporter.finish()?;
    }

    let feasible = outcome
        .results
        .iter()
        .filter(|r| sweep_config.region.contains(r))
        .count();
    tracing::info!(
        "evaluated {} grid points, {} feasible",
        outcome.results.len(),
        feasible
    );

    let best = outcome.best();
    match config.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(best)?),
        OutputFormat::Text => {
            println!("Optimum Configuration");
            println!("=====================");
            println!();
            println!("Feasible Region:");
            println!(
                "  Charge:   ({}, {}) µC",
                sweep_config.region.charge_uc_min, sweep_config.region.charge_uc_max
            );
            println!(
                "  Distance: ({}, {}) km",
                sweep_config.region.distance_km_min, sweep_config.region.distance_km_max
            );
            println!(
                "  Grid:     {} points, {} feasible",
                outcome.results.len(),
                feasible
            );
            println!();
            print_report(best);
            println!();
            println!("  Utility Score:    {:.3}", score(best, &sweep_config));
            if let Some(path) = &config.export {
                println!();
                println!("Sweep population written to {}", path.display());
            }
        }
    }
    Ok(())
}

/// List the embedded radio tables.
fn tables_command() -> Result<(), RunnerError> {
    println!("Transmit Current Draw (SX1276)");
    println!("==============================");
    println!();
    println!("  dBm      mA");
    for power in TX_POWER_MIN_DBM..=TX_POWER_MAX_DBM {
        println!("  {:>3}   {:>5.1}", power, tables::tx_current_ma(power)?);
    }
    println!();
    println!("Receiver Sensitivity Floor (dBm)");
    println!("================================");
    println!();
    println!("   SF   125 kHz   250 kHz   500 kHz");
    for sf in SPREADING_FACTOR_MIN..=SPREADING_FACTOR_MAX {
        println!(
            "  {:>3}   {:>7.0}   {:>7.0}   {:>7.0}",
            sf,
            tables::sensitivity_floor_dbm(Bandwidth::Bw125, sf)?,
            tables::sensitivity_floor_dbm(Bandwidth::Bw250, sf)?,
            tables::sensitivity_floor_dbm(Bandwidth::Bw500, sf)?,
        );
    }
    Ok(())
}

fn main() -> Result<(), RunnerError> {
    // Initialize tracing subscriber with RUST_LOG env filter
    // Default to "warn" level if RUST_LOG is not set
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Evaluate(config) => evaluate_command(config)?,
        Commands::Optimize(config) => optimize_command(config)?,
        Commands::Tables => tables_command()?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_optimize_config() -> OptimizeConfig {
        OptimizeConfig {
            configs: Vec::new(),
            charge_max: None,
            charge_min: None,
            distance_max: None,
            distance_min: None,
            npe: None,
            h_tx: None,
            h_rx: None,
            gains: None,
            payload: None,
            distance_weight: None,
            charge_weight: None,
            export: None,
            export_format: ExportFormat::Csv,
            format: OutputFormat::Text,
        }
    }

    #[test]
    fn test_resolve_falls_back_to_defaults() {
        let resolved = bare_optimize_config().resolve().unwrap();
        assert_eq!(resolved, SweepConfig::default());
    }

    #[test]
    fn test_resolve_applies_cli_overrides() {
        let mut config = bare_optimize_config();
        config.charge_max = Some(5.0);
        config.payload = Some(48);
        config.gains = Some(-2.5);

        let resolved = config.resolve().unwrap();
        assert_eq!(resolved.region.charge_uc_max, 5.0);
        assert_eq!(resolved.payload_bytes, 48);
        assert_eq!(resolved.gains_db, -2.5);
        // Untouched fields keep their defaults.
        assert_eq!(resolved.region.charge_uc_min, 0.1);
        assert_eq!(resolved.distance_weight, 1.0);
    }

    #[test]
    fn test_file_config_merge_prefers_later_files() {
        let mut base = FileConfig {
            payload_bytes: Some(16),
            distance_weight: Some(2.0),
            ..FileConfig::default()
        };
        base.merge(FileConfig {
            payload_bytes: Some(64),
            ..FileConfig::default()
        });
        assert_eq!(base.payload_bytes, Some(64));
        assert_eq!(base.distance_weight, Some(2.0));
    }
}
