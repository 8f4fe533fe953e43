//! Link parameter types.

use serde::{Deserialize, Serialize};

use crate::PhyError;

/// Channel width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Bandwidth {
    /// 125 kHz.
    Bw125,
    /// 250 kHz.
    Bw250,
    /// 500 kHz.
    Bw500,
}

impl Bandwidth {
    /// Resolve a bandwidth selector code (1, 2 or 3).
    pub fn from_code(code: u8) -> Result<Self, PhyError> {
        match code {
            1 => Ok(Bandwidth::Bw125),
            2 => Ok(Bandwidth::Bw250),
            3 => Ok(Bandwidth::Bw500),
            other => Err(PhyError::InvalidBandwidthCode(other)),
        }
    }

    /// Selector code for this bandwidth.
    pub fn code(&self) -> u8 {
        match self {
            Bandwidth::Bw125 => 1,
            Bandwidth::Bw250 => 2,
            Bandwidth::Bw500 => 3,
        }
    }

    /// Channel width in kHz.
    pub fn khz(&self) -> u32 {
        match self {
            Bandwidth::Bw125 => 125,
            Bandwidth::Bw250 => 250,
            Bandwidth::Bw500 => 500,
        }
    }

    /// Channel width in Hz.
    pub fn hz(&self) -> f64 {
        self.khz() as f64 * 1000.0
    }
}

/// One LoRa link parameter tuple, the input to [`crate::evaluate_link`].
///
/// Modulation fields are kept as raw selector values and validated against
/// the embedded tables at evaluation time; out-of-table values surface as
/// [`PhyError`] rather than being clamped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkParams {
    /// Spreading factor (6-12).
    pub spreading_factor: u8,
    /// Coding rate selector (1-4, representing 4/5 to 4/8).
    pub coding_rate: u8,
    /// Programmed transmit power in dBm (-2 to 20).
    pub tx_power_dbm: i8,
    /// Bandwidth selector code (1 = 125 kHz, 2 = 250 kHz, 3 = 500 kHz).
    pub bandwidth_code: u8,
    /// Plane-Earth path loss exponent: 4 over open ground, higher for trees
    /// or buildings. Fit a site-specific value to measurements when possible.
    pub path_loss_exponent: f64,
    /// Transmit antenna height in meters.
    pub h_transmit_m: f64,
    /// Receive antenna height in meters.
    pub h_receive_m: f64,
    /// Combined transmit and receive antenna gains in dB.
    pub gains_db: f64,
    /// Payload size in bytes.
    pub payload_bytes: u32,
}

impl Default for LinkParams {
    fn default() -> Self {
        LinkParams {
            spreading_factor: 12,
            coding_rate: 1,
            tx_power_dbm: 14,
            bandwidth_code: 1,
            path_loss_exponent: 4.0,
            h_transmit_m: 1.0,
            h_receive_m: 1.0,
            gains_db: 0.0,
            payload_bytes: 32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bandwidth_codes_round_trip() {
        for code in 1..=3u8 {
            let bw = Bandwidth::from_code(code).unwrap();
            assert_eq!(bw.code(), code);
        }
        assert_eq!(Bandwidth::from_code(1).unwrap().khz(), 125);
        assert_eq!(Bandwidth::from_code(2).unwrap().khz(), 250);
        assert_eq!(Bandwidth::from_code(3).unwrap().khz(), 500);
    }

    #[test]
    fn test_bandwidth_unknown_code_is_rejected() {
        assert_eq!(
            Bandwidth::from_code(0),
            Err(PhyError::InvalidBandwidthCode(0))
        );
        assert_eq!(
            Bandwidth::from_code(4),
            Err(PhyError::InvalidBandwidthCode(4))
        );
    }

    #[test]
    fn test_default_params_match_reference_scenario() {
        let params = LinkParams::default();
        assert_eq!(params.spreading_factor, 12);
        assert_eq!(params.coding_rate, 1);
        assert_eq!(params.tx_power_dbm, 14);
        assert_eq!(params.bandwidth_code, 1);
        assert_eq!(params.path_loss_exponent, 4.0);
        assert_eq!(params.payload_bytes, 32);
    }
}
