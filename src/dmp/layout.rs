//! DMP FIFO record layout
//!
//! A DMP record is self-describing. It starts with a 16-bit header whose bits say
//! which fields follow. Bit 3 of the header announces a second 16-bit header with
//! its own field bits. Fields appear in a fixed order, primary fields first, and the
//! record always ends with a 2-byte footer.
//!
//! ```text
//! | header | header2? | primary fields... | secondary fields... | footer |
//! |   2    |    2     |   per FieldKind   |    per FieldKind    |   2    |
//! ```
//!
//! Every field is big-endian on the wire. [`ByteOrder`] maps the wire bytes into a
//! little-endian canonical layout, `canonical[table[i]] = wire[i]`, from which the
//! typed values in [`record`](super::record) are read.

/// Primary header bits
#[derive(Debug, Clone, Copy)]
pub struct HeaderBits;

impl HeaderBits {
    /// Raw accelerometer (3 x i16)
    pub const ACCEL: u16 = 0x8000;
    /// Raw gyroscope plus bias (6 x i16)
    pub const GYRO: u16 = 0x4000;
    /// Raw compass (3 x i16)
    pub const COMPASS: u16 = 0x2000;
    /// Ambient light sensor (8 raw bytes)
    pub const ALS: u16 = 0x1000;
    /// 6-axis quaternion (3 x i32, Q30)
    pub const QUAT6: u16 = 0x0800;
    /// 9-axis quaternion (3 x i32, Q30, plus i16 accuracy)
    pub const QUAT9: u16 = 0x0400;
    /// Low-precision 6-axis quaternion (3 x i16, Q14)
    pub const PQUAT6: u16 = 0x0200;
    /// Geomagnetic rotation vector (3 x i32, Q30, plus i16 accuracy)
    pub const GEOMAG: u16 = 0x0100;
    /// Pressure (6 raw bytes)
    pub const PRESSURE: u16 = 0x0080;
    /// Calibrated gyroscope (3 x i32)
    pub const GYRO_CALIBR: u16 = 0x0040;
    /// Calibrated compass (3 x i32)
    pub const COMPASS_CALIBR: u16 = 0x0020;
    /// Step detector timestamp (u32)
    pub const STEP_DETECTOR: u16 = 0x0010;
    /// A secondary header follows the primary header
    pub const HEADER2: u16 = 0x0008;
}

/// Secondary header bits
#[derive(Debug, Clone, Copy)]
pub struct Header2Bits;

impl Header2Bits {
    /// Accelerometer accuracy (u16)
    pub const ACCEL_ACCURACY: u16 = 0x4000;
    /// Gyroscope accuracy (u16)
    pub const GYRO_ACCURACY: u16 = 0x2000;
    /// Compass accuracy (u16)
    pub const COMPASS_ACCURACY: u16 = 0x1000;
    /// FSYNC delay (u16)
    pub const FSYNC: u16 = 0x0800;
    /// Pickup gesture (u16)
    pub const PICKUP: u16 = 0x0400;
    /// Batch mode enabled; carries no payload
    pub const BATCH_MODE_ENABLE: u16 = 0x0100;
    /// Activity recognition event (6 bytes)
    pub const ACTIVITY_RECOG: u16 = 0x0080;
    /// Secondary sensor on/off request (u16)
    pub const SECONDARY_ON_OFF: u16 = 0x0040;
}

/// Header length in bytes
pub const HEADER_LEN: usize = 2;
/// Secondary header length in bytes
pub const HEADER2_LEN: usize = 2;
/// Footer length in bytes
pub const FOOTER_LEN: usize = 2;
/// Longest field payload
pub const MAX_FIELD_LEN: usize = 14;
/// Longest record the default layout can produce
pub const MAX_RECORD_LEN: usize = 136;

/// Wire-to-canonical byte permutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ByteOrder {
    /// One 16-bit value
    Int16,
    /// Three 16-bit values
    Int16x3,
    /// Six 16-bit values
    Int16x6,
    /// One 32-bit value
    Int32,
    /// Three 32-bit values
    Int32x3,
    /// Three 32-bit values followed by one 16-bit value
    Quat9,
    /// Two single bytes followed by one 32-bit value
    Activity,
    /// Bytes are kept as they arrive
    Raw,
}

impl ByteOrder {
    /// Canonical index of each wire byte, or `None` for [`ByteOrder::Raw`]
    pub const fn table(self) -> Option<&'static [usize]> {
        match self {
            Self::Int16 => Some(&[1, 0]),
            Self::Int16x3 => Some(&[1, 0, 3, 2, 5, 4]),
            Self::Int16x6 => Some(&[1, 0, 3, 2, 5, 4, 7, 6, 9, 8, 11, 10]),
            Self::Int32 => Some(&[3, 2, 1, 0]),
            Self::Int32x3 => Some(&[3, 2, 1, 0, 7, 6, 5, 4, 11, 10, 9, 8]),
            Self::Quat9 => Some(&[3, 2, 1, 0, 7, 6, 5, 4, 11, 10, 9, 8, 13, 12]),
            Self::Activity => Some(&[0, 1, 5, 4, 3, 2]),
            Self::Raw => None,
        }
    }

    /// Remap wire bytes into canonical order
    ///
    /// `wire` and `canonical` must have the same length, which for every table other
    /// than `Raw` is the table length.
    pub fn to_canonical(self, wire: &[u8], canonical: &mut [u8]) {
        match self.table() {
            Some(table) => {
                for (&byte, &index) in wire.iter().zip(table) {
                    canonical[index] = byte;
                }
            }
            None => canonical.copy_from_slice(wire),
        }
    }

    /// Remap canonical bytes back into wire order
    pub fn to_wire(self, canonical: &[u8], wire: &mut [u8]) {
        match self.table() {
            Some(table) => {
                for (byte, &index) in wire.iter_mut().zip(table) {
                    *byte = canonical[index];
                }
            }
            None => wire.copy_from_slice(canonical),
        }
    }
}

/// Kind of a record field; fixes its length and byte order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FieldKind {
    /// Raw accelerometer
    Accel,
    /// Raw gyroscope plus bias
    Gyro,
    /// Raw compass
    Compass,
    /// Ambient light
    Als,
    /// 6-axis quaternion
    Quat6,
    /// 9-axis quaternion
    Quat9,
    /// Low-precision 6-axis quaternion
    PQuat6,
    /// Geomagnetic rotation vector
    Geomag,
    /// Pressure
    Pressure,
    /// Calibrated gyroscope
    GyroCalibr,
    /// Calibrated compass
    CompassCalibr,
    /// Step detector timestamp
    StepDetector,
    /// Accelerometer accuracy
    AccelAccuracy,
    /// Gyroscope accuracy
    GyroAccuracy,
    /// Compass accuracy
    CompassAccuracy,
    /// FSYNC delay
    Fsync,
    /// Pickup gesture
    Pickup,
    /// Activity recognition event
    ActivityRecog,
    /// Secondary sensor on/off request
    SecondaryOnOff,
}

#[allow(clippy::len_without_is_empty)]
impl FieldKind {
    /// Payload length in bytes
    pub const fn len(self) -> usize {
        match self {
            Self::Accel | Self::Compass | Self::PQuat6 | Self::Pressure | Self::ActivityRecog => 6,
            Self::Gyro | Self::Quat6 | Self::GyroCalibr | Self::CompassCalibr => 12,
            Self::Quat9 | Self::Geomag => 14,
            Self::Als => 8,
            Self::StepDetector => 4,
            Self::AccelAccuracy
            | Self::GyroAccuracy
            | Self::CompassAccuracy
            | Self::Fsync
            | Self::Pickup
            | Self::SecondaryOnOff => 2,
        }
    }

    /// Wire-to-canonical remap
    pub const fn byte_order(self) -> ByteOrder {
        match self {
            Self::Accel | Self::Compass | Self::PQuat6 => ByteOrder::Int16x3,
            Self::Gyro => ByteOrder::Int16x6,
            Self::Quat6 | Self::GyroCalibr | Self::CompassCalibr => ByteOrder::Int32x3,
            Self::Quat9 | Self::Geomag => ByteOrder::Quat9,
            Self::ActivityRecog => ByteOrder::Activity,
            Self::StepDetector => ByteOrder::Int32,
            Self::AccelAccuracy
            | Self::GyroAccuracy
            | Self::CompassAccuracy
            | Self::Fsync
            | Self::Pickup
            | Self::SecondaryOnOff => ByteOrder::Int16,
            Self::Als | Self::Pressure => ByteOrder::Raw,
        }
    }
}

/// One entry of a layout table: a header bit and the field it announces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FieldSpec {
    bit: u16,
    kind: FieldKind,
}

#[allow(clippy::len_without_is_empty)]
impl FieldSpec {
    /// Field `kind` announced by header bit `bit`
    pub const fn new(bit: u16, kind: FieldKind) -> Self {
        Self { bit, kind }
    }

    /// Header bit
    pub const fn bit(&self) -> u16 {
        self.bit
    }

    /// Field kind
    pub const fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Payload length in bytes
    pub const fn len(&self) -> usize {
        self.kind.len()
    }
}

/// Primary header fields in wire order
pub const PRIMARY_FIELDS: &[FieldSpec] = &[
    FieldSpec::new(HeaderBits::ACCEL, FieldKind::Accel),
    FieldSpec::new(HeaderBits::GYRO, FieldKind::Gyro),
    FieldSpec::new(HeaderBits::COMPASS, FieldKind::Compass),
    FieldSpec::new(HeaderBits::ALS, FieldKind::Als),
    FieldSpec::new(HeaderBits::QUAT6, FieldKind::Quat6),
    FieldSpec::new(HeaderBits::QUAT9, FieldKind::Quat9),
    FieldSpec::new(HeaderBits::PQUAT6, FieldKind::PQuat6),
    FieldSpec::new(HeaderBits::GEOMAG, FieldKind::Geomag),
    FieldSpec::new(HeaderBits::PRESSURE, FieldKind::Pressure),
    FieldSpec::new(HeaderBits::GYRO_CALIBR, FieldKind::GyroCalibr),
    FieldSpec::new(HeaderBits::COMPASS_CALIBR, FieldKind::CompassCalibr),
    FieldSpec::new(HeaderBits::STEP_DETECTOR, FieldKind::StepDetector),
];

/// Secondary header fields in wire order
pub const SECONDARY_FIELDS: &[FieldSpec] = &[
    FieldSpec::new(Header2Bits::ACCEL_ACCURACY, FieldKind::AccelAccuracy),
    FieldSpec::new(Header2Bits::GYRO_ACCURACY, FieldKind::GyroAccuracy),
    FieldSpec::new(Header2Bits::COMPASS_ACCURACY, FieldKind::CompassAccuracy),
    FieldSpec::new(Header2Bits::FSYNC, FieldKind::Fsync),
    FieldSpec::new(Header2Bits::PICKUP, FieldKind::Pickup),
    FieldSpec::new(Header2Bits::ACTIVITY_RECOG, FieldKind::ActivityRecog),
    FieldSpec::new(Header2Bits::SECONDARY_ON_OFF, FieldKind::SecondaryOnOff),
];

/// Sum of the payload lengths of the fields whose bit is set in `header`
pub fn fields_len(table: &[FieldSpec], header: u16) -> usize {
    table
        .iter()
        .filter(|spec| header & spec.bit() != 0)
        .map(FieldSpec::len)
        .sum()
}

/// Wire length of a record with the given headers
///
/// `header2` is only counted when `header` announces it.
pub fn record_len(primary: &[FieldSpec], secondary: &[FieldSpec], header: u16, header2: u16) -> usize {
    let mut len = HEADER_LEN + fields_len(primary, header) + FOOTER_LEN;
    if header & HeaderBits::HEADER2 != 0 {
        len += HEADER2_LEN + fields_len(secondary, header2);
    }
    len
}

/// Longest record a pair of tables can produce
pub fn max_record_len(primary: &[FieldSpec], secondary: &[FieldSpec]) -> usize {
    HEADER_LEN
        + HEADER2_LEN
        + primary.iter().map(FieldSpec::len).sum::<usize>()
        + secondary.iter().map(FieldSpec::len).sum::<usize>()
        + FOOTER_LEN
}
