use log::error;

use crate::frame::{word_data, WORD_LEN};

/// Length of the read-measurement response.
pub const MEASUREMENT_LEN: usize = FIELD_COUNT * FIELD_LEN;

const FIELD_COUNT: usize = 10;
/// Each float is sent as two response words.
const FIELD_LEN: usize = 2 * WORD_LEN;

/// Byte offset of every field inside the read-measurement response.
const LAYOUT: [(Field, usize); FIELD_COUNT] = [
    (Field::MassPm1_0, 0),
    (Field::MassPm2_5, 6),
    (Field::MassPm4_0, 12),
    (Field::MassPm10_0, 18),
    (Field::NumberPm0_5, 24),
    (Field::NumberPm1_0, 30),
    (Field::NumberPm2_5, 36),
    (Field::NumberPm4_0, 42),
    (Field::NumberPm10_0, 48),
    (Field::TypicalParticleSize, 54),
];

/// A value reported by the read-measurement command, in wire order.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Field {
    MassPm1_0,
    MassPm2_5,
    MassPm4_0,
    MassPm10_0,
    NumberPm0_5,
    NumberPm1_0,
    NumberPm2_5,
    NumberPm4_0,
    NumberPm10_0,
    TypicalParticleSize,
}

impl Field {
    pub const ALL: [Field; FIELD_COUNT] = [
        Field::MassPm1_0,
        Field::MassPm2_5,
        Field::MassPm4_0,
        Field::MassPm10_0,
        Field::NumberPm0_5,
        Field::NumberPm1_0,
        Field::NumberPm2_5,
        Field::NumberPm4_0,
        Field::NumberPm10_0,
        Field::TypicalParticleSize,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Field::MassPm1_0 => "MC 1.0",
            Field::MassPm2_5 => "MC 2.5",
            Field::MassPm4_0 => "MC 4.0",
            Field::MassPm10_0 => "MC 10.0",
            Field::NumberPm0_5 => "NC 0.5",
            Field::NumberPm1_0 => "NC 1.0",
            Field::NumberPm2_5 => "NC 2.5",
            Field::NumberPm4_0 => "NC 4.0",
            Field::NumberPm10_0 => "NC 10.0",
            Field::TypicalParticleSize => "typical particle size",
        }
    }

    fn bit(self) -> u16 {
        1 << self as u8
    }
}

/// A measurement field that could not be reconstructed because one of its
/// words failed the checksum.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "thiserror", derive(thiserror::Error))]
#[cfg_attr(feature = "thiserror", error("checksum mismatch in field {}", .field.name()))]
pub struct DecodeError {
    pub field: Field,
}

/// Every field that failed during one decode pass.
#[derive(Copy, Clone, Default, PartialEq, Eq)]
pub struct DecodeErrors {
    failed: u16,
}

impl DecodeErrors {
    fn push(&mut self, field: Field) {
        self.failed |= field.bit();
    }

    pub fn is_empty(&self) -> bool {
        self.failed == 0
    }

    pub fn len(&self) -> usize {
        self.failed.count_ones() as usize
    }

    pub fn contains(&self, field: Field) -> bool {
        self.failed & field.bit() != 0
    }

    /// Failed fields in wire order.
    pub fn iter(&self) -> impl Iterator<Item = DecodeError> + '_ {
        Field::ALL
            .into_iter()
            .filter(move |field| self.contains(*field))
            .map(|field| DecodeError { field })
    }
}

impl core::fmt::Debug for DecodeErrors {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list()
            .entries(self.iter().map(|e| e.field))
            .finish()
    }
}

#[cfg(feature = "thiserror")]
impl core::fmt::Display for DecodeErrors {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} field(s) failed the checksum:", self.len())?;
        for e in self.iter() {
            write!(f, " {}", e.field.name())?;
        }
        Ok(())
    }
}

/// SPS30 sensor data.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Measurement {
    /// Mass Concentration PM1.0 [μg/m³]
    pub mass_pm1_0: f32,
    /// Mass Concentration PM2.5 [μg/m³]
    pub mass_pm2_5: f32,
    /// Mass Concentration PM4.0 [μg/m³]
    pub mass_pm4_0: f32,
    /// Mass Concentration PM10 [μg/m³]
    pub mass_pm10_0: f32,
    /// Number Concentration PM0.5 [#/cm³]
    pub number_pm0_5: f32,
    /// Number Concentration PM1.0 [#/cm³]
    pub number_pm1_0: f32,
    /// Number Concentration PM2.5 [#/cm³]
    pub number_pm2_5: f32,
    /// Number Concentration PM4.0 [#/cm³]
    pub number_pm4_0: f32,
    /// Number Concentration PM10 [#/cm³]
    pub number_pm10_0: f32,
    /// Typical Particle Size [μm]
    pub typical_particle_size: f32,
}

impl Measurement {
    /// Decodes a read-measurement response into a fresh record.
    ///
    /// On failure only the failed fields are reported and the good ones are
    /// dropped. Use [`update`](Self::update) to keep them.
    pub fn decode(buf: &[u8; MEASUREMENT_LEN]) -> Result<Self, DecodeErrors> {
        let mut measurement = Self::default();
        measurement.update(buf)?;
        Ok(measurement)
    }

    /// Decodes a read-measurement response in place.
    ///
    /// All ten fields are attempted. A field whose words fail the checksum keeps
    /// its previous value and is reported in the returned error.
    pub fn update(&mut self, buf: &[u8; MEASUREMENT_LEN]) -> Result<(), DecodeErrors> {
        let mut errors = DecodeErrors::default();
        for (field, offset) in LAYOUT {
            match decode_float(&buf[offset..offset + FIELD_LEN]) {
                Some(value) => *self.get_mut(field) = value,
                None => {
                    error!("Error while parsing {}", field.name());
                    errors.push(field);
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn get(&self, field: Field) -> f32 {
        match field {
            Field::MassPm1_0 => self.mass_pm1_0,
            Field::MassPm2_5 => self.mass_pm2_5,
            Field::MassPm4_0 => self.mass_pm4_0,
            Field::MassPm10_0 => self.mass_pm10_0,
            Field::NumberPm0_5 => self.number_pm0_5,
            Field::NumberPm1_0 => self.number_pm1_0,
            Field::NumberPm2_5 => self.number_pm2_5,
            Field::NumberPm4_0 => self.number_pm4_0,
            Field::NumberPm10_0 => self.number_pm10_0,
            Field::TypicalParticleSize => self.typical_particle_size,
        }
    }

    fn get_mut(&mut self, field: Field) -> &mut f32 {
        match field {
            Field::MassPm1_0 => &mut self.mass_pm1_0,
            Field::MassPm2_5 => &mut self.mass_pm2_5,
            Field::MassPm4_0 => &mut self.mass_pm4_0,
            Field::MassPm10_0 => &mut self.mass_pm10_0,
            Field::NumberPm0_5 => &mut self.number_pm0_5,
            Field::NumberPm1_0 => &mut self.number_pm1_0,
            Field::NumberPm2_5 => &mut self.number_pm2_5,
            Field::NumberPm4_0 => &mut self.number_pm4_0,
            Field::NumberPm10_0 => &mut self.number_pm10_0,
            Field::TypicalParticleSize => &mut self.typical_particle_size,
        }
    }

    /// All fields in wire order.
    pub fn as_array(&self) -> [f32; FIELD_COUNT] {
        Field::ALL.map(|field| self.get(field))
    }
}

/// Reassembles a big-endian binary32 from two response words.
fn decode_float(group: &[u8]) -> Option<f32> {
    let mut hi = [0u8; WORD_LEN];
    let mut lo = [0u8; WORD_LEN];
    hi.copy_from_slice(&group[..WORD_LEN]);
    lo.copy_from_slice(&group[WORD_LEN..FIELD_LEN]);

    let [b0, b1] = word_data(&hi).ok()?;
    let [b2, b3] = word_data(&lo).ok()?;
    Some(f32::from_bits(u32::from_be_bytes([b0, b1, b2, b3])))
}
