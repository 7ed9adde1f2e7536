//! embedded-hal driver for the Sensirion SPS30 particulate matter sensor over
//! I²C.
//!
//! The driver owns the I²C bus, a delay source and the output pin that enables
//! the auxiliary power rail feeding the sensor. A measurement session goes
//! through [`Sps30::init`], then repeated [`Sps30::read_measurement`] calls,
//! then [`Sps30::deinit`].
//!
//! ```ignore
//! let mut sps30 = Sps30::new(i2c, delay, power_pin);
//! sps30.init()?;
//! loop {
//!     match sps30.read_measurement() {
//!         Ok(m) => log::info!("PM2.5: {} µg/m³", m.mass_pm2_5),
//!         Err(Error::NotReady) => {}
//!         Err(Error::PartialRead(failed)) => log::warn!("stale fields: {:?}", failed),
//!         Err(e) => return Err(e),
//!     }
//!     delay.delay_ms(1000);
//! }
//! ```
#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, OutputPin};
use embedded_hal::i2c::I2c;
use log::{debug, warn};

pub mod crc;
mod error;
pub mod frame;
mod types;

pub use error::Error;
pub use frame::{ChecksumError, Command};
pub use types::{DecodeError, DecodeErrors, Field, Measurement, MEASUREMENT_LEN};

use frame::{command, command_with_arg, WORD_LEN};

/// 7-bit I²C address of the sensor.
pub const I2C_ADDR: u8 = 0x69;

/// Argument of the start-measurement command: big-endian IEEE754 float output.
pub const START_MEASUREMENT_ARG: u16 = 0x0300;

/// Time for the sensor to come up after the power rail is enabled.
pub const POWER_UP_DELAY_MS: u32 = 100;
/// Time between a command and reading its response.
pub const COMMAND_DELAY_MS: u32 = 3;
/// Time for the sensor to settle after stop-measurement.
pub const STOP_DELAY_MS: u32 = 100;
/// Time for the sensor to come back after a reset.
pub const RESET_DELAY_MS: u32 = 100;

/// Measurement session state.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum State {
    Uninitialized,
    Measuring,
    Stopped,
}

/// SPS30 driver.
pub struct Sps30<I2C, D, P> {
    i2c: I2C,
    delay: D,
    power: P,
    state: State,
    measurement: Measurement,
    firmware_version: Option<u16>,
}

impl<I2C, D, P> Sps30<I2C, D, P>
where
    I2C: I2c,
    D: DelayNs,
    P: OutputPin,
{
    pub fn new(i2c: I2C, delay: D, power: P) -> Self {
        Self {
            i2c,
            delay,
            power,
            state: State::Uninitialized,
            measurement: Measurement::default(),
            firmware_version: None,
        }
    }

    /// Gives back the bus, the delay and the power pin.
    pub fn release(self) -> (I2C, D, P) {
        (self.i2c, self.delay, self.power)
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// The last measurement values. After a partial read, the fields that
    /// failed still hold their previous values.
    pub fn measurement(&self) -> &Measurement {
        &self.measurement
    }

    /// Firmware version read during the last [`init`](Self::init), if it
    /// succeeded.
    pub fn firmware_version(&self) -> Option<u16> {
        self.firmware_version
    }

    /// Powers the sensor and starts continuous measurement.
    pub fn init(&mut self) -> Result<(), Error<I2C::Error>> {
        debug!("Powering up SPS30");
        self.power.set_high().map_err(power_error)?;
        self.delay.delay_ms(POWER_UP_DELAY_MS);

        self.firmware_version = match self.read_firmware_version() {
            Ok(version) => {
                debug!("SPS30 firmware {}.{}", version >> 8, version & 0xff);
                Some(version)
            }
            Err(e) => {
                warn!("Could not read SPS30 firmware version: {:?}", e);
                None
            }
        };

        self.i2c
            .write(
                I2C_ADDR,
                &command_with_arg(Command::StartMeasurement, START_MEASUREMENT_ARG),
            )
            .map_err(Error::InitFailure)?;

        self.state = State::Measuring;
        debug!("SPS30 measuring");
        Ok(())
    }

    /// Stops measuring and powers the sensor down.
    ///
    /// The power rail is switched off even when the stop command fails.
    pub fn deinit(&mut self) -> Result<(), Error<I2C::Error>> {
        let stopped = self.send(Command::StopMeasurement);
        if stopped.is_err() {
            warn!("SPS30 did not acknowledge stop-measurement");
        }
        self.delay.delay_ms(STOP_DELAY_MS);
        let powered_down = self.power.set_low().map_err(power_error);
        self.state = State::Stopped;
        debug!("SPS30 powered down");

        stopped.and(powered_down)
    }

    /// Checks whether a new measurement can be read.
    pub fn data_ready(&mut self) -> Result<bool, Error<I2C::Error>> {
        self.send(Command::GetDataReady)?;
        self.delay.delay_ms(COMMAND_DELAY_MS);

        // this register carries no checksum
        let mut buf = [0u8; 2];
        self.i2c.read(I2C_ADDR, &mut buf).map_err(Error::BusRead)?;
        Ok(u16::from_be_bytes(buf) == 1)
    }

    /// Reads the latest measurement.
    ///
    /// Returns [`Error::NotReady`] without touching the measurement when the
    /// sensor has no new data. When some fields fail their checksum,
    /// [`Error::PartialRead`] lists them and the other fields are still updated
    /// in [`measurement`](Self::measurement).
    pub fn read_measurement(&mut self) -> Result<Measurement, Error<I2C::Error>> {
        if !self.data_ready()? {
            return Err(Error::NotReady);
        }

        self.send(Command::ReadMeasurement)?;
        self.delay.delay_ms(COMMAND_DELAY_MS);

        let mut buf = [0u8; MEASUREMENT_LEN];
        self.i2c.read(I2C_ADDR, &mut buf).map_err(Error::BusRead)?;
        self.measurement.update(&buf)?;
        Ok(self.measurement)
    }

    /// Reads the firmware version, major in the high byte and minor in the low
    /// byte.
    pub fn read_firmware_version(&mut self) -> Result<u16, Error<I2C::Error>> {
        let [version] = self.read_words::<1, WORD_LEN>(Command::ReadFirmwareVersion)?;
        Ok(version)
    }

    /// Reads the 32-bit device status register.
    pub fn read_device_status(&mut self) -> Result<u32, Error<I2C::Error>> {
        let [hi, lo] = self.read_words::<2, { 2 * WORD_LEN }>(Command::ReadDeviceStatus)?;
        Ok((u32::from(hi) << 16) | u32::from(lo))
    }

    /// Spins the fan at full speed for 10 seconds to blow out accumulated
    /// dust.
    pub fn start_fan_cleaning(&mut self) -> Result<(), Error<I2C::Error>> {
        self.send(Command::StartFanCleaning)
    }

    /// Resets the sensor. It comes back idle, so measurement has to be
    /// started again with [`init`](Self::init).
    pub fn reset(&mut self) -> Result<(), Error<I2C::Error>> {
        self.send(Command::Reset)?;
        self.delay.delay_ms(RESET_DELAY_MS);
        self.state = State::Uninitialized;
        Ok(())
    }

    fn send(&mut self, cmd: Command) -> Result<(), Error<I2C::Error>> {
        self.i2c
            .write(I2C_ADDR, &command(cmd))
            .map_err(Error::BusAck)
    }

    fn read_words<const N: usize, const LEN: usize>(
        &mut self,
        cmd: Command,
    ) -> Result<[u16; N], Error<I2C::Error>> {
        self.send(cmd)?;
        self.delay.delay_ms(COMMAND_DELAY_MS);

        debug_assert_eq!(LEN, N * WORD_LEN);
        let mut buf = [0u8; LEN];
        sensirion_i2c::i2c::read_words_with_crc(&mut self.i2c, I2C_ADDR, &mut buf)?;

        // checksums were validated by the read
        let mut words = [0u16; N];
        for (word, chunk) in words.iter_mut().zip(buf.chunks_exact(WORD_LEN)) {
            *word = u16::from_be_bytes([chunk[0], chunk[1]]);
        }
        Ok(words)
    }
}

fn power_error<E: digital::Error, I>(e: E) -> Error<I> {
    Error::Power(e.kind())
}
