//! # CRC-16/XMODEM Implementation
//!
//! Integrity checksum for the LoRa wire frame.
//!
//! **Polynomial**: 0x1021 (x^16 + x^12 + x^5 + 1)
//! **Initial Value**: 0x0000, no reflection, no final XOR

/// CRC-16/XMODEM polynomial
const CRC16_POLY: u16 = 0x1021;

/// Precomputed CRC16 lookup table for fast calculation
const CRC16_TABLE: [u16; 256] = generate_crc16_table();

/// Generate CRC16 lookup table at compile time
const fn generate_crc16_table() -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;

    while i < 256 {
        let mut crc = (i as u16) << 8;
        let mut j = 0;

        while j < 8 {
            if (crc & 0x8000) != 0 {
                crc = (crc << 1) ^ CRC16_POLY;
            } else {
                crc <<= 1;
            }
            j += 1;
        }

        table[i] = crc;
        i += 1;
    }

    table
}

/// Calculate the CRC-16/XMODEM checksum of a frame body using the
/// lookup table (fast).
///
/// # Arguments
///
/// * `data` - Byte slice to calculate CRC for (the JSON body of a frame)
///
/// # Returns
///
/// * `u16` - Calculated CRC16 checksum
pub fn crc16_xmodem(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;

    for &byte in data {
        let index = ((crc >> 8) ^ byte as u16) & 0xFF;
        crc = (crc << 8) ^ CRC16_TABLE[index as usize];
    }

    crc
}

/// Calculate CRC-16/XMODEM using the direct bitwise algorithm (slow).
///
/// Easier to verify against the published algorithm; used to
/// cross-check the lookup table implementation in tests.
#[allow(dead_code)]
fn crc16_xmodem_slow(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;

    for &byte in data {
        crc ^= (byte as u16) << 8;

        for _ in 0..8 {
            if (crc & 0x8000) != 0 {
                crc = (crc << 1) ^ CRC16_POLY;
            } else {
                crc <<= 1;
            }
        }
    }

    crc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc16_empty() {
        assert_eq!(crc16_xmodem(&[]), 0x0000);
    }

    #[test]
    fn test_crc16_known_vector() {
        // Canonical XMODEM check value for "123456789"
        assert_eq!(crc16_xmodem(b"123456789"), 0x31C3);
    }

    #[test]
    fn test_crc16_single_byte() {
        let data = [0x00];
        assert_eq!(crc16_xmodem(&data), crc16_xmodem_slow(&data));

        let data = [0xFF];
        let crc = crc16_xmodem(&data);
        assert_eq!(crc, crc16_xmodem_slow(&data));
        assert_ne!(crc, 0x0000);
    }

    #[test]
    fn test_crc16_lookup_table_matches_slow() {
        let test_data = [
            b"{}".to_vec(),
            br#"{"uid":"RMT1","fix":true}"#.to_vec(),
            vec![0x00; 64],
            vec![0xFF; 10],
            vec![0x01, 0x02, 0x03, 0x04, 0x05],
        ];

        for data in test_data.iter() {
            assert_eq!(
                crc16_xmodem(data),
                crc16_xmodem_slow(data),
                "CRC mismatch for data: {:?}",
                data
            );
        }
    }

    #[test]
    fn test_crc16_changes_with_data() {
        let crc1 = crc16_xmodem(br#"{"lat":-33.5}"#);
        let crc2 = crc16_xmodem(br#"{"lat":-33.6}"#);
        assert_ne!(crc1, crc2, "CRC should change when data changes");
    }
}
