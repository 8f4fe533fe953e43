//! Link budget evaluation.
//!
//! [`evaluate_link`] maps one [`LinkParams`] tuple to a [`LinkReport`]:
//! time on air, transmit charge, maximum tolerable path loss against the
//! receiver sensitivity floor, and maximum range under the Plane-Earth
//! channel model.

use serde::{Deserialize, Serialize};

use crate::airtime::{self, round3};
use crate::params::{Bandwidth, LinkParams};
use crate::tables;
use crate::PhyError;

/// Derived physical-layer metrics for one parameter tuple.
///
/// Field order matches the historical positional row layout still consumed
/// by downstream plotting tooling; [`LinkReport::as_row`] flattens the
/// record in that same order. Position 1 carries charge per packet in µC
/// (unnormalized); energy in µJ is derived via [`LinkReport::energy_uj`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkReport {
    /// Maximum communication range under the Plane-Earth model, km.
    pub max_distance_km: f64,
    /// Transmit charge consumed by one packet, µC.
    pub charge_uc: f64,
    /// Spreading factor the report was computed for.
    pub spreading_factor: u8,
    /// Coding rate selector.
    pub coding_rate: u8,
    /// Channel width in kHz.
    pub bandwidth_khz: u32,
    /// Programmed transmit power, dBm.
    pub tx_power_dbm: i8,
    /// Maximum tolerable path loss, dB.
    pub max_path_loss_db: f64,
    /// Signal strength at the receiver over the maximum-loss path, dBm.
    pub rssi_dbm: f64,
    /// On-air time of one packet, ms.
    pub packet_time_ms: f64,
    /// Payload size, bytes.
    pub payload_bytes: u32,
}

impl LinkReport {
    /// Transmit energy of one packet at the nominal supply voltage, µJ.
    pub fn energy_uj(&self) -> f64 {
        round3(self.charge_uc * tables::SUPPLY_VOLTAGE_V)
    }

    /// Flatten into the historical positional row order.
    pub fn as_row(&self) -> [f64; 10] {
        [
            self.max_distance_km,
            self.charge_uc,
            self.spreading_factor as f64,
            self.coding_rate as f64,
            self.bandwidth_khz as f64,
            self.tx_power_dbm as f64,
            self.max_path_loss_db,
            self.rssi_dbm,
            self.packet_time_ms,
            self.payload_bytes as f64,
        ]
    }
}

/// Maximum range in kilometers under the Plane-Earth two-ray model.
///
/// Inverts `L = 10 * NPE * log10(d) - 20 * log10(h_t * h_r)` for the
/// distance at which the path loss budget is exhausted. Monotonic in both
/// the loss budget and the antenna height product.
pub fn plane_earth_distance_km(
    max_path_loss_db: f64,
    h_transmit_m: f64,
    h_receive_m: f64,
    path_loss_exponent: f64,
) -> f64 {
    let height_gain_db = 20.0 * (h_transmit_m * h_receive_m).log10();
    10f64.powf((max_path_loss_db + height_gain_db) / (10.0 * path_loss_exponent)) / 1000.0
}

/// Evaluate the link model for one parameter tuple.
///
/// Fails with a [`PhyError`] when the bandwidth code, transmit power or
/// spreading factor is missing from the embedded tables.
pub fn evaluate_link(params: &LinkParams) -> Result<LinkReport, PhyError> {
    let bandwidth = Bandwidth::from_code(params.bandwidth_code)?;

    let packet_time_ms = airtime::time_on_air_ms(
        params.spreading_factor,
        params.coding_rate,
        bandwidth,
        params.payload_bytes,
    );

    let current_ma = tables::tx_current_ma(params.tx_power_dbm)?;
    let charge_uc = round3(packet_time_ms * current_ma / 1000.0);

    let floor_dbm = tables::sensitivity_floor_dbm(bandwidth, params.spreading_factor)?;
    let max_path_loss_db = params.tx_power_dbm as f64 - floor_dbm;
    let rssi_dbm = params.tx_power_dbm as f64 + params.gains_db - max_path_loss_db;

    let max_distance_km = round3(plane_earth_distance_km(
        max_path_loss_db,
        params.h_transmit_m,
        params.h_receive_m,
        params.path_loss_exponent,
    ));

    Ok(LinkReport {
        max_distance_km,
        charge_uc,
        spreading_factor: params.spreading_factor,
        coding_rate: params.coding_rate,
        bandwidth_khz: bandwidth.khz(),
        tx_power_dbm: params.tx_power_dbm,
        max_path_loss_db,
        rssi_dbm,
        packet_time_ms,
        payload_bytes: params.payload_bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_scenario_sf12_14dbm_125khz() {
        // SF12 / CR1 / 14 dBm / 125 kHz / NPE 4 / 1 m antennas / 32 bytes.
        let report = evaluate_link(&LinkParams::default()).unwrap();

        assert_eq!(report.packet_time_ms, 1417.216);
        assert_eq!(report.charge_uc, 62.358); // 1417.216 ms * 44 mA
        assert_eq!(report.energy_uj(), 205.781);
        assert_eq!(report.max_path_loss_db, 151.0); // 14 - (-137)
        assert_eq!(report.rssi_dbm, -137.0);
        assert_eq!(report.max_distance_km, 5.957); // 10^(151/40) / 1000
        assert_eq!(report.bandwidth_khz, 125);
    }

    #[test]
    fn test_evaluation_is_idempotent() {
        let params = LinkParams::default();
        let first = evaluate_link(&params).unwrap();
        let second = evaluate_link(&params).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_plane_earth_distance_grows_with_path_loss() {
        let mut previous = 0.0;
        for loss in [100.0, 120.0, 140.0, 151.0, 160.0] {
            let distance = plane_earth_distance_km(loss, 1.0, 1.0, 4.0);
            assert!(distance > previous);
            previous = distance;
        }
    }

    #[test]
    fn test_plane_earth_distance_grows_with_antenna_heights() {
        let low = plane_earth_distance_km(151.0, 1.0, 1.0, 4.0);
        let mid = plane_earth_distance_km(151.0, 2.0, 1.0, 4.0);
        let high = plane_earth_distance_km(151.0, 2.0, 3.0, 4.0);
        assert!(low < mid && mid < high);
    }

    #[test]
    fn test_rougher_terrain_shortens_range() {
        let open = plane_earth_distance_km(151.0, 1.0, 1.0, 4.0);
        let wooded = plane_earth_distance_km(151.0, 1.0, 1.0, 4.8);
        assert!(wooded < open);
    }

    #[test]
    fn test_gains_shift_rssi_only() {
        let baseline = evaluate_link(&LinkParams::default()).unwrap();
        let gained = evaluate_link(&LinkParams {
            gains_db: 3.0,
            ..LinkParams::default()
        })
        .unwrap();

        assert_eq!(gained.rssi_dbm, baseline.rssi_dbm + 3.0);
        assert_eq!(gained.max_path_loss_db, baseline.max_path_loss_db);
        assert_eq!(gained.max_distance_km, baseline.max_distance_km);
    }

    #[test]
    fn test_unknown_bandwidth_code_fails() {
        let result = evaluate_link(&LinkParams {
            bandwidth_code: 4,
            ..LinkParams::default()
        });
        assert_eq!(result, Err(PhyError::InvalidBandwidthCode(4)));
    }

    #[test]
    fn test_unknown_power_fails() {
        let result = evaluate_link(&LinkParams {
            tx_power_dbm: 21,
            ..LinkParams::default()
        });
        assert_eq!(result, Err(PhyError::InvalidTxPower(21)));
    }

    #[test]
    fn test_unknown_spreading_factor_fails() {
        let result = evaluate_link(&LinkParams {
            spreading_factor: 13,
            ..LinkParams::default()
        });
        assert_eq!(result, Err(PhyError::InvalidSpreadingFactor(13)));
    }

    #[test]
    fn test_row_order_matches_field_order() {
        let report = evaluate_link(&LinkParams::default()).unwrap();
        let row = report.as_row();
        assert_eq!(row[0], report.max_distance_km);
        assert_eq!(row[1], report.charge_uc);
        assert_eq!(row[2], 12.0);
        assert_eq!(row[3], 1.0);
        assert_eq!(row[4], 125.0);
        assert_eq!(row[5], 14.0);
        assert_eq!(row[8], report.packet_time_ms);
        assert_eq!(row[9], 32.0);
    }
}
