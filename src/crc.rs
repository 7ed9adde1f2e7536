/// CRC-8 used by every checksummed word on the wire.
///
/// Polynomial 0x31 (x⁸ + x⁵ + x⁴ + 1), initialization 0xFF, no reflection and
/// no final xor.
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc: u8 = 0xFF;
    for byte in data.iter().copied() {
        crc ^= byte;
        for _ in 0..8 {
            if crc & 0x80 == 0 {
                crc <<= 1;
            } else {
                crc = (crc << 1) ^ 0x31u8;
            }
        }
    }
    crc
}
