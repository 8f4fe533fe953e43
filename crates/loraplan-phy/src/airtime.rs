//! LoRa time-on-air calculation.
//!
//! Implements the Semtech time-on-air formula for one uplink packet:
//! preamble time plus payload symbol time, both multiples of the chirp
//! symbol duration `2^SF / BW`.

use crate::params::Bandwidth;

/// Number of programmed preamble symbols. The radio appends 4.25 symbols of
/// sync word and start-frame delimiter on top of these.
pub const PREAMBLE_SYMBOLS: u32 = 6;

/// Explicit-header flag in the payload symbol formula (always on here).
const EXPLICIT_HEADER: f64 = 1.0;
/// Low-data-rate optimization flag (always off here).
const LOW_DR_OPTIMIZE: f64 = 0.0;

/// Round to three decimal places.
pub(crate) fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Duration of one chirp symbol in milliseconds.
pub fn symbol_time_ms(spreading_factor: u8, bandwidth: Bandwidth) -> f64 {
    2f64.powi(spreading_factor as i32) / bandwidth.hz() * 1000.0
}

/// Number of payload symbols in one packet.
///
/// The coded block count can come out negative for tiny payloads at high
/// spreading factors; the formula floors it at zero, leaving only the fixed
/// 8-symbol payload preamble.
pub fn payload_symbol_count(payload_bytes: u32, spreading_factor: u8, coding_rate: u8) -> f64 {
    let ps = payload_bytes as f64;
    let sf = spreading_factor as f64;
    let cr = coding_rate as f64;
    let blocks = ((8.0 * ps - 4.0 * sf + 28.0 + 16.0 - 20.0 * EXPLICIT_HEADER)
        / (4.0 * (sf - 2.0 * LOW_DR_OPTIMIZE)))
        .ceil();
    8.0 + (blocks * (cr + 4.0)).max(0.0)
}

/// Total on-air time of one packet in milliseconds (preamble plus payload),
/// rounded to three decimals.
pub fn time_on_air_ms(
    spreading_factor: u8,
    coding_rate: u8,
    bandwidth: Bandwidth,
    payload_bytes: u32,
) -> f64 {
    let t_sym = symbol_time_ms(spreading_factor, bandwidth);
    let t_preamble = (PREAMBLE_SYMBOLS as f64 + 4.25) * t_sym;
    let t_payload = payload_symbol_count(payload_bytes, spreading_factor, coding_rate) * t_sym;
    round3(t_preamble + t_payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_time_reference_values() {
        assert_eq!(symbol_time_ms(12, Bandwidth::Bw125), 32.768);
        assert_eq!(symbol_time_ms(7, Bandwidth::Bw125), 1.024);
        assert_eq!(symbol_time_ms(6, Bandwidth::Bw500), 0.128);
    }

    #[test]
    fn test_payload_symbol_count_reference_values() {
        // 32 bytes at SF12/CR1: ceil(232/48) * 5 = 25 coded symbols.
        assert_eq!(payload_symbol_count(32, 12, 1), 33.0);
        // 12 bytes at SF12/CR1: ceil(72/48) * 5 = 10 coded symbols.
        assert_eq!(payload_symbol_count(12, 12, 1), 18.0);
    }

    #[test]
    fn test_payload_symbol_count_floors_at_preamble_block() {
        // 1 byte at SF12: the coded block count goes negative and is clamped,
        // leaving the fixed 8 symbols.
        assert_eq!(payload_symbol_count(1, 12, 1), 8.0);
    }

    #[test]
    fn test_time_on_air_reference_packet() {
        // SF12, CR1, 125 kHz, 32 bytes: 10.25 preamble + 33 payload symbols
        // at 32.768 ms each.
        assert_eq!(time_on_air_ms(12, 1, Bandwidth::Bw125, 32), 1417.216);
    }

    #[test]
    fn test_time_on_air_grows_with_payload() {
        let mut previous = 0.0;
        for payload in [8, 16, 32, 64, 128] {
            let toa = time_on_air_ms(9, 1, Bandwidth::Bw125, payload);
            assert!(toa > previous);
            previous = toa;
        }
    }

    #[test]
    fn test_time_on_air_grows_with_spreading_factor() {
        let mut previous = 0.0;
        for sf in 6..=12 {
            let toa = time_on_air_ms(sf, 1, Bandwidth::Bw125, 32);
            assert!(toa > previous, "SF{} should be slower than SF{}", sf, sf - 1);
            previous = toa;
        }
    }

    #[test]
    fn test_time_on_air_shrinks_with_bandwidth() {
        let narrow = time_on_air_ms(9, 1, Bandwidth::Bw125, 32);
        let medium = time_on_air_ms(9, 1, Bandwidth::Bw250, 32);
        let wide = time_on_air_ms(9, 1, Bandwidth::Bw500, 32);
        assert!(narrow > medium && medium > wide);
    }

    #[test]
    fn test_time_on_air_grows_with_coding_rate() {
        let mut previous = 0.0;
        for cr in 1..=4 {
            let toa = time_on_air_ms(9, cr, Bandwidth::Bw125, 32);
            assert!(toa > previous);
            previous = toa;
        }
    }
}
