//! # loraplan-phy
//!
//! LoRa physical-layer link model.
//!
//! This crate provides:
//! - Link parameter configuration ([`LinkParams`], [`Bandwidth`])
//! - Embedded radio tables ([`tables`])
//! - Time-on-air calculations ([`airtime`])
//! - Link budget evaluation ([`evaluate_link`], [`LinkReport`])
//!
//! Everything here is a deterministic pure function of its inputs: no state,
//! no I/O, no randomness. Evaluating the same parameter tuple twice yields
//! bit-identical output.

pub mod airtime;
pub mod link;
pub mod params;
pub mod tables;

use thiserror::Error;

pub use link::{evaluate_link, plane_earth_distance_km, LinkReport};
pub use params::{Bandwidth, LinkParams};

// ============================================================================
// Error Types
// ============================================================================

/// Errors raised by the link model's table lookups.
///
/// The model has no fallback values: a key outside one of the embedded
/// tables fails immediately rather than defaulting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PhyError {
    /// Bandwidth selector code outside the {1, 2, 3} mapping.
    #[error("unknown bandwidth code {0} (valid codes: 1 = 125 kHz, 2 = 250 kHz, 3 = 500 kHz)")]
    InvalidBandwidthCode(u8),

    /// Spreading factor outside the sensitivity-floor tables.
    #[error("spreading factor {0} outside the supported range 6-12")]
    InvalidSpreadingFactor(u8),

    /// Transmit power outside the current-draw table.
    #[error("transmit power {0} dBm outside the supported range -2 to 20 dBm")]
    InvalidTxPower(i8),
}
