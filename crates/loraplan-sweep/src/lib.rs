//! # loraplan-sweep
//!
//! Constrained grid search over the LoRa link parameter space.
//!
//! The optimizer evaluates every combination of transmit power, spreading
//! factor and bandwidth through [`loraplan_phy::evaluate_link`], filters
//! the results through a caller-supplied feasibility box, scores the
//! survivors with a weighted linear utility and returns the best one.
//!
//! The full evaluated population (feasible or not) is kept in sweep order
//! and can be handed to a [`SweepObserver`] for plotting or export; nothing
//! an observer does flows back into the selection.

use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use loraplan_phy::{evaluate_link, LinkParams, LinkReport};

pub use loraplan_phy::PhyError;

// ============================================================================
// Grid Definition
// ============================================================================

/// Coding rate held fixed across the sweep.
///
/// Coding rate only lengthens the packet, so the lowest setting dominates
/// under any utility that penalizes charge; the grid does not sweep it.
pub const CODING_RATE_FIXED: u8 = 1;

/// Transmit power sweep range, dBm, iterated ascending.
pub const TX_POWER_SWEEP_DBM: RangeInclusive<i8> = 0..=20;
/// Spreading factor sweep range, iterated ascending.
pub const SPREADING_FACTOR_SWEEP: RangeInclusive<u8> = 6..=12;
/// Bandwidth code sweep range, iterated ascending.
pub const BANDWIDTH_CODE_SWEEP: RangeInclusive<u8> = 1..=3;

// ============================================================================
// Error Types
// ============================================================================

/// Errors raised by the optimizer.
#[derive(Debug, Error)]
pub enum SweepError {
    /// A grid point failed a table lookup. The grid is built from table
    /// keys, so this indicates a grid/table mismatch rather than bad user
    /// input; the whole sweep aborts.
    #[error(transparent)]
    Phy(#[from] PhyError),

    /// No grid point fell strictly inside the feasibility box.
    #[error("no parameter combination falls inside the feasible region ({region})")]
    InfeasibleRegion {
        /// The box that admitted no grid point.
        region: FeasibleRegion,
    },
}

// ============================================================================
// Feasibility Box
// ============================================================================

/// Caller-specified feasibility box over charge and distance.
///
/// All four bounds are strict: a report sitting exactly on a bound is
/// excluded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeasibleRegion {
    /// Exclusive upper bound on transmit charge per packet, µC.
    pub charge_uc_max: f64,
    /// Exclusive lower bound on transmit charge per packet, µC.
    pub charge_uc_min: f64,
    /// Exclusive upper bound on range, km.
    pub distance_km_max: f64,
    /// Exclusive lower bound on range, km.
    pub distance_km_min: f64,
}

impl FeasibleRegion {
    /// True when the report lies strictly inside the box.
    pub fn contains(&self, report: &LinkReport) -> bool {
        report.charge_uc < self.charge_uc_max
            && report.charge_uc > self.charge_uc_min
            && report.max_distance_km < self.distance_km_max
            && report.max_distance_km > self.distance_km_min
    }
}

impl fmt::Display for FeasibleRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "charge ({}, {}) µC, distance ({}, {}) km",
            self.charge_uc_min, self.charge_uc_max, self.distance_km_min, self.distance_km_max
        )
    }
}

// ============================================================================
// Sweep Configuration
// ============================================================================

/// Optimizer inputs: the feasibility box, the propagation scenario shared by
/// every grid point, and the utility weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Feasibility box applied to every evaluated grid point.
    pub region: FeasibleRegion,
    /// Plane-Earth path loss exponent.
    pub path_loss_exponent: f64,
    /// Transmit antenna height, meters.
    pub h_transmit_m: f64,
    /// Receive antenna height, meters.
    pub h_receive_m: f64,
    /// Combined antenna gains, dB.
    pub gains_db: f64,
    /// Payload size, bytes.
    pub payload_bytes: u32,
    /// Utility weight on range.
    pub distance_weight: f64,
    /// Utility weight on charge.
    pub charge_weight: f64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        SweepConfig {
            region: FeasibleRegion {
                charge_uc_max: 2.0,
                charge_uc_min: 0.1,
                distance_km_max: 3.0,
                distance_km_min: 0.0,
            },
            path_loss_exponent: 4.0,
            h_transmit_m: 1.0,
            h_receive_m: 1.0,
            gains_db: 0.0,
            payload_bytes: 12,
            distance_weight: 1.0,
            charge_weight: 1.0,
        }
    }
}

// ============================================================================
// Sweep and Selection
// ============================================================================

/// Utility of one report under the configured weights. Higher is better.
pub fn score(report: &LinkReport, config: &SweepConfig) -> f64 {
    report.max_distance_km * config.distance_weight - report.charge_uc * config.charge_weight
}

/// Evaluate the full parameter grid.
///
/// Iteration order is fixed: transmit power ascending, then spreading
/// factor ascending, then bandwidth code ascending, with the coding rate
/// pinned at [`CODING_RATE_FIXED`]. The order decides which point wins a
/// score tie, so it is part of the contract.
pub fn sweep_grid(config: &SweepConfig) -> Result<Vec<LinkReport>, SweepError> {
    let mut results = Vec::new();
    for tx_power_dbm in TX_POWER_SWEEP_DBM {
        for spreading_factor in SPREADING_FACTOR_SWEEP {
            for bandwidth_code in BANDWIDTH_CODE_SWEEP {
                let params = LinkParams {
                    spreading_factor,
                    coding_rate: CODING_RATE_FIXED,
                    tx_power_dbm,
                    bandwidth_code,
                    path_loss_exponent: config.path_loss_exponent,
                    h_transmit_m: config.h_transmit_m,
                    h_receive_m: config.h_receive_m,
                    gains_db: config.gains_db,
                    payload_bytes: config.payload_bytes,
                };
                results.push(evaluate_link(&params)?);
            }
        }
    }
    Ok(results)
}

/// Select the best-scoring feasible report, returning its index.
///
/// The running best is replaced only on strict score improvement, so the
/// first point reaching the top score wins ties.
pub fn select_best(results: &[LinkReport], config: &SweepConfig) -> Result<usize, SweepError> {
    let mut best: Option<(usize, f64)> = None;
    for (index, report) in results.iter().enumerate() {
        if !config.region.contains(report) {
            continue;
        }
        let candidate = score(report, config);
        let improves = match best {
            None => true,
            Some((_, current)) => candidate > current,
        };
        if improves {
            best = Some((index, candidate));
        }
    }
    match best {
        Some((index, _)) => Ok(index),
        None => Err(SweepError::InfeasibleRegion {
            region: config.region,
        }),
    }
}

// ============================================================================
// Outcome and Observer Boundary
// ============================================================================

/// Result of one optimization call: the full evaluated population in sweep
/// order and the index of the winner within it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepOutcome {
    /// Every evaluated grid point, in sweep order.
    pub results: Vec<LinkReport>,
    /// Index of the winning report in `results`.
    pub best_index: usize,
}

impl SweepOutcome {
    /// The winning report.
    pub fn best(&self) -> &LinkReport {
        &self.results[self.best_index]
    }
}

/// Receiver for the full sweep population, for plotting or export.
///
/// Implementations see every evaluated point (feasible or not), the winner,
/// and the feasibility box. The optimizer consumes nothing back, so an
/// observer failure cannot change the selection.
pub trait SweepObserver {
    /// Called once after a successful selection.
    fn observe(&mut self, results: &[LinkReport], best: &LinkReport, region: &FeasibleRegion);
}

/// Run the full sweep and select the winner.
pub fn optimize(config: &SweepConfig) -> Result<SweepOutcome, SweepError> {
    optimize_with_observer(config, None)
}

/// Run the full sweep, select the winner and hand the population to an
/// optional observer.
pub fn optimize_with_observer(
    config: &SweepConfig,
    observer: Option<&mut dyn SweepObserver>,
) -> Result<SweepOutcome, SweepError> {
    let results = sweep_grid(config)?;
    let best_index = select_best(&results, config)?;
    if let Some(observer) = observer {
        observer.observe(&results, &results[best_index], &config.region);
    }
    Ok(SweepOutcome {
        results,
        best_index,
    })
}
