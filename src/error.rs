use embedded_hal::digital;

use crate::frame::ChecksumError;
use crate::types::DecodeErrors;

/// Everything that can go wrong while talking to the sensor.
///
/// `E` is the error type of the I²C bus.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "thiserror", derive(thiserror::Error))]
pub enum Error<E> {
    /// The sensor did not acknowledge a command.
    #[cfg_attr(feature = "thiserror", error("I²C write error: {0:?}"))]
    BusAck(E),
    /// Reading the response from the sensor failed.
    #[cfg_attr(feature = "thiserror", error("I²C read error: {0:?}"))]
    BusRead(E),
    /// A checksummed response word was corrupt.
    #[cfg_attr(feature = "thiserror", error("response word failed the checksum"))]
    Checksum,
    /// Some measurement fields were corrupt. The remaining fields were updated
    /// and the failed ones still hold the value from an earlier read.
    #[cfg_attr(feature = "thiserror", error("partial measurement: {0}"))]
    PartialRead(DecodeErrors),
    /// No new measurement is available yet.
    #[cfg_attr(feature = "thiserror", error("no measurement data ready"))]
    NotReady,
    /// Continuous measurement could not be started.
    #[cfg_attr(feature = "thiserror", error("failed to start measurement: {0:?}"))]
    InitFailure(E),
    /// The auxiliary power rail could not be switched.
    #[cfg_attr(feature = "thiserror", error("power rail error: {0:?}"))]
    Power(digital::ErrorKind),
}

impl<E> From<ChecksumError> for Error<E> {
    fn from(_: ChecksumError) -> Self {
        Error::Checksum
    }
}

impl<E> From<DecodeErrors> for Error<E> {
    fn from(errors: DecodeErrors) -> Self {
        Error::PartialRead(errors)
    }
}

impl<E> From<sensirion_i2c::i2c::Error<E>> for Error<E::Error>
where
    E: embedded_hal::i2c::I2c,
{
    fn from(e: sensirion_i2c::i2c::Error<E>) -> Self {
        match e {
            sensirion_i2c::i2c::Error::I2cWrite(e) => Error::BusAck(e),
            sensirion_i2c::i2c::Error::I2cRead(e) => Error::BusRead(e),
            sensirion_i2c::i2c::Error::Crc => Error::Checksum,
        }
    }
}
