//! Command framing and response word parsing.
//!
//! Every command starts with a big-endian 16-bit opcode. A command that takes
//! an argument appends the big-endian argument word followed by the CRC of
//! that word. Responses arrive as 3-byte words: two data bytes and their CRC.

use crate::crc::crc8;

/// Length of a response word on the wire.
pub const WORD_LEN: usize = 3;

/// Opcodes understood by the sensor.
#[repr(u16)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Command {
    StartMeasurement = 0x0010,
    StopMeasurement = 0x0104,
    GetDataReady = 0x0202,
    ReadMeasurement = 0x0300,
    StartFanCleaning = 0x5607,
    ReadFirmwareVersion = 0xD100,
    ReadDeviceStatus = 0xD206,
    Reset = 0xD304,
}

/// A response word whose checksum byte did not match its data.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "thiserror", derive(thiserror::Error))]
#[cfg_attr(
    feature = "thiserror",
    error("checksum mismatch: expected {expected:#04x}, received {received:#04x}")
)]
pub struct ChecksumError {
    pub expected: u8,
    pub received: u8,
}

impl Command {
    pub fn opcode(self) -> u16 {
        self as u16
    }
}

/// Builds a bare command frame.
pub fn command(cmd: Command) -> [u8; 2] {
    cmd.opcode().to_be_bytes()
}

/// Builds a command frame carrying one argument word and its checksum.
pub fn command_with_arg(cmd: Command, arg: u16) -> [u8; 5] {
    let [c0, c1] = cmd.opcode().to_be_bytes();
    let [a0, a1] = arg.to_be_bytes();
    [c0, c1, a0, a1, crc8(&[a0, a1])]
}

/// Returns the data bytes of a response word if its checksum holds.
pub fn word_data(word: &[u8; WORD_LEN]) -> Result<[u8; 2], ChecksumError> {
    let [d0, d1, received] = *word;
    let expected = crc8(&[d0, d1]);
    if expected != received {
        return Err(ChecksumError { expected, received });
    }
    Ok([d0, d1])
}

/// Parses a response word into its big-endian value.
pub fn parse_word(word: &[u8; WORD_LEN]) -> Result<u16, ChecksumError> {
    word_data(word).map(u16::from_be_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(value: u16) -> [u8; WORD_LEN] {
        let [hi, lo] = value.to_be_bytes();
        [hi, lo, sensirion_i2c::crc8::calculate(&[hi, lo])]
    }

    #[test]
    fn bare_command_is_big_endian() {
        assert_eq!(command(Command::GetDataReady), [0x02, 0x02]);
        assert_eq!(command(Command::ReadMeasurement), [0x03, 0x00]);
        assert_eq!(command(Command::StopMeasurement), [0x01, 0x04]);
        assert_eq!(command(Command::Reset), [0xd3, 0x04]);
        assert_eq!(command(Command::ReadFirmwareVersion), [0xd1, 0x00]);
    }

    #[test]
    fn start_measurement_frame() {
        assert_eq!(
            command_with_arg(Command::StartMeasurement, 0x0300),
            [0x00, 0x10, 0x03, 0x00, 0xac]
        );
    }

    #[test]
    fn argument_checksum_covers_argument_only() {
        for cmd in [Command::StartMeasurement, Command::Reset] {
            for arg in [0x0000, 0x0001, 0x0300, 0xbeef, 0xffff] {
                let frame = command_with_arg(cmd, arg);
                assert_eq!(frame.len(), 5);
                assert_eq!(frame[..2], cmd.opcode().to_be_bytes());
                assert_eq!(frame[2..4], arg.to_be_bytes());
                assert_eq!(frame[4], crc8(&arg.to_be_bytes()));
            }
        }
    }

    #[test]
    fn word_round_trip() {
        for value in 0..=u16::MAX {
            assert_eq!(parse_word(&word(value)), Ok(value));
        }
    }

    #[test]
    fn bad_checksum_is_rejected() {
        let good = word(0xbeef);
        assert_eq!(good[2], 0x92);
        for received in (0..=u8::MAX).filter(|crc| *crc != 0x92) {
            assert_eq!(
                parse_word(&[0xbe, 0xef, received]),
                Err(ChecksumError {
                    expected: 0x92,
                    received
                })
            );
        }
    }
}
