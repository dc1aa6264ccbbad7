//! Decoded DMP records
//!
//! A [`DmpRecord`] carries the two headers, the footer and one `Option` per field
//! kind. Values are the raw fixed-point numbers the DMP produces; scaling to
//! physical units is left to the caller.
//!
//! Quaternions are Q30 (`1 << 30` is 1.0). Only x, y and z are transmitted; the
//! scalar part is `sqrt(1 - (x² + y² + z²))`.

use super::layout::{
    FieldKind, HEADER2_LEN, HEADER_LEN, HeaderBits, MAX_FIELD_LEN, PRIMARY_FIELDS,
    SECONDARY_FIELDS, record_len,
};

/// Three-axis sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Vector3<T> {
    /// X axis
    pub x: T,
    /// Y axis
    pub y: T,
    /// Z axis
    pub z: T,
}

/// Raw gyroscope sample with the bias the DMP applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GyroSample {
    /// Raw rate
    pub raw: Vector3<i16>,
    /// Bias
    pub bias: Vector3<i16>,
}

/// 6-axis quaternion (Q30)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Quaternion6 {
    /// Q1
    pub x: i32,
    /// Q2
    pub y: i32,
    /// Q3
    pub z: i32,
}

/// 9-axis quaternion (Q30) with heading accuracy
///
/// Also used for the geomagnetic rotation vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Quaternion9 {
    /// Q1
    pub x: i32,
    /// Q2
    pub y: i32,
    /// Q3
    pub z: i32,
    /// Heading accuracy
    pub accuracy: i16,
}

/// Set of recognised activities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ActivityState(pub u8);

impl ActivityState {
    /// In a vehicle
    pub const DRIVE: Self = Self(0x01);
    /// Walking
    pub const WALK: Self = Self(0x02);
    /// Running
    pub const RUN: Self = Self(0x04);
    /// On a bicycle
    pub const BIKE: Self = Self(0x08);
    /// Tilting
    pub const TILT: Self = Self(0x10);
    /// Still
    pub const STILL: Self = Self(0x20);

    /// True if every activity in `other` is present
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

/// Activity recognition event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ActivityEvent {
    /// Activities that started
    pub state_start: ActivityState,
    /// Activities that ended
    pub state_end: ActivityState,
    /// DMP timestamp
    pub timestamp: u32,
}

/// Secondary sensor on/off request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SecondaryOnOff(pub u16);

impl SecondaryOnOff {
    /// Turn the gyroscope off
    pub const GYRO_OFF: u16 = 0x0001;
    /// Turn the gyroscope on
    pub const GYRO_ON: u16 = 0x0002;
    /// Turn the compass off
    pub const COMPASS_OFF: u16 = 0x0004;
    /// Turn the compass on
    pub const COMPASS_ON: u16 = 0x0008;
    /// Turn the proximity sensor off
    pub const PROX_OFF: u16 = 0x0010;
    /// Turn the proximity sensor on
    pub const PROX_ON: u16 = 0x0020;

    /// True if `bit` is requested
    pub const fn requests(self, bit: u16) -> bool {
        self.0 & bit != 0
    }
}

/// One decoded field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DmpField {
    /// Raw accelerometer
    Accel(Vector3<i16>),
    /// Raw gyroscope plus bias
    Gyro(GyroSample),
    /// Raw compass
    Compass(Vector3<i16>),
    /// Ambient light
    Als([u8; 8]),
    /// 6-axis quaternion
    Quat6(Quaternion6),
    /// 9-axis quaternion
    Quat9(Quaternion9),
    /// Low-precision 6-axis quaternion (Q14)
    PQuat6(Vector3<i16>),
    /// Geomagnetic rotation vector
    Geomag(Quaternion9),
    /// Pressure
    Pressure([u8; 6]),
    /// Calibrated gyroscope
    GyroCalibr(Vector3<i32>),
    /// Calibrated compass
    CompassCalibr(Vector3<i32>),
    /// Step detector timestamp
    StepDetector(u32),
    /// Accelerometer accuracy
    AccelAccuracy(u16),
    /// Gyroscope accuracy
    GyroAccuracy(u16),
    /// Compass accuracy
    CompassAccuracy(u16),
    /// FSYNC delay
    Fsync(u16),
    /// Pickup gesture
    Pickup(u16),
    /// Activity recognition event
    ActivityRecog(ActivityEvent),
    /// Secondary sensor on/off request
    SecondaryOnOff(SecondaryOnOff),
}

fn le_i16(bytes: &[u8], at: usize) -> i16 {
    i16::from_le_bytes([bytes[at], bytes[at + 1]])
}

fn le_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

fn le_i32(bytes: &[u8], at: usize) -> i32 {
    i32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

fn vec_i16(bytes: &[u8], at: usize) -> Vector3<i16> {
    Vector3 {
        x: le_i16(bytes, at),
        y: le_i16(bytes, at + 2),
        z: le_i16(bytes, at + 4),
    }
}

fn vec_i32(bytes: &[u8]) -> Vector3<i32> {
    Vector3 {
        x: le_i32(bytes, 0),
        y: le_i32(bytes, 4),
        z: le_i32(bytes, 8),
    }
}

fn put_vec_i16(out: &mut [u8], at: usize, v: Vector3<i16>) {
    out[at..at + 2].copy_from_slice(&v.x.to_le_bytes());
    out[at + 2..at + 4].copy_from_slice(&v.y.to_le_bytes());
    out[at + 4..at + 6].copy_from_slice(&v.z.to_le_bytes());
}

fn put_vec_i32(out: &mut [u8], v: Vector3<i32>) {
    out[0..4].copy_from_slice(&v.x.to_le_bytes());
    out[4..8].copy_from_slice(&v.y.to_le_bytes());
    out[8..12].copy_from_slice(&v.z.to_le_bytes());
}

impl DmpField {
    /// Build a field from its canonical (little-endian) bytes
    ///
    /// `bytes` must hold at least `kind.len()` bytes.
    pub fn from_canonical(kind: FieldKind, bytes: &[u8]) -> Self {
        match kind {
            FieldKind::Accel => Self::Accel(vec_i16(bytes, 0)),
            FieldKind::Gyro => Self::Gyro(GyroSample {
                raw: vec_i16(bytes, 0),
                bias: vec_i16(bytes, 6),
            }),
            FieldKind::Compass => Self::Compass(vec_i16(bytes, 0)),
            FieldKind::Als => {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(&bytes[..8]);
                Self::Als(raw)
            }
            FieldKind::Quat6 => {
                let v = vec_i32(bytes);
                Self::Quat6(Quaternion6 { x: v.x, y: v.y, z: v.z })
            }
            FieldKind::Quat9 => Self::Quat9(quat9(bytes)),
            FieldKind::PQuat6 => Self::PQuat6(vec_i16(bytes, 0)),
            FieldKind::Geomag => Self::Geomag(quat9(bytes)),
            FieldKind::Pressure => {
                let mut raw = [0u8; 6];
                raw.copy_from_slice(&bytes[..6]);
                Self::Pressure(raw)
            }
            FieldKind::GyroCalibr => Self::GyroCalibr(vec_i32(bytes)),
            FieldKind::CompassCalibr => Self::CompassCalibr(vec_i32(bytes)),
            FieldKind::StepDetector => {
                Self::StepDetector(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
            }
            FieldKind::AccelAccuracy => Self::AccelAccuracy(le_u16(bytes, 0)),
            FieldKind::GyroAccuracy => Self::GyroAccuracy(le_u16(bytes, 0)),
            FieldKind::CompassAccuracy => Self::CompassAccuracy(le_u16(bytes, 0)),
            FieldKind::Fsync => Self::Fsync(le_u16(bytes, 0)),
            FieldKind::Pickup => Self::Pickup(le_u16(bytes, 0)),
            FieldKind::ActivityRecog => Self::ActivityRecog(ActivityEvent {
                state_start: ActivityState(bytes[0]),
                state_end: ActivityState(bytes[1]),
                timestamp: u32::from_le_bytes([bytes[2], bytes[3], bytes[4], bytes[5]]),
            }),
            FieldKind::SecondaryOnOff => Self::SecondaryOnOff(SecondaryOnOff(le_u16(bytes, 0))),
        }
    }

    /// Decode a field from its wire bytes
    ///
    /// `wire` must hold at least `kind.len()` bytes.
    pub fn from_wire(kind: FieldKind, wire: &[u8]) -> Self {
        let len = kind.len();
        let mut canonical = [0u8; MAX_FIELD_LEN];
        kind.byte_order().to_canonical(&wire[..len], &mut canonical[..len]);
        Self::from_canonical(kind, &canonical[..len])
    }

    /// Kind of this field
    pub const fn kind(&self) -> FieldKind {
        match self {
            Self::Accel(_) => FieldKind::Accel,
            Self::Gyro(_) => FieldKind::Gyro,
            Self::Compass(_) => FieldKind::Compass,
            Self::Als(_) => FieldKind::Als,
            Self::Quat6(_) => FieldKind::Quat6,
            Self::Quat9(_) => FieldKind::Quat9,
            Self::PQuat6(_) => FieldKind::PQuat6,
            Self::Geomag(_) => FieldKind::Geomag,
            Self::Pressure(_) => FieldKind::Pressure,
            Self::GyroCalibr(_) => FieldKind::GyroCalibr,
            Self::CompassCalibr(_) => FieldKind::CompassCalibr,
            Self::StepDetector(_) => FieldKind::StepDetector,
            Self::AccelAccuracy(_) => FieldKind::AccelAccuracy,
            Self::GyroAccuracy(_) => FieldKind::GyroAccuracy,
            Self::CompassAccuracy(_) => FieldKind::CompassAccuracy,
            Self::Fsync(_) => FieldKind::Fsync,
            Self::Pickup(_) => FieldKind::Pickup,
            Self::ActivityRecog(_) => FieldKind::ActivityRecog,
            Self::SecondaryOnOff(_) => FieldKind::SecondaryOnOff,
        }
    }

    /// Write the canonical (little-endian) bytes of this field into `out`
    ///
    /// `out` must hold at least `self.kind().len()` bytes.
    pub fn write_canonical(&self, out: &mut [u8]) {
        match *self {
            Self::Accel(v) | Self::Compass(v) | Self::PQuat6(v) => put_vec_i16(out, 0, v),
            Self::Gyro(sample) => {
                put_vec_i16(out, 0, sample.raw);
                put_vec_i16(out, 6, sample.bias);
            }
            Self::Als(raw) => out[..8].copy_from_slice(&raw),
            Self::Pressure(raw) => out[..6].copy_from_slice(&raw),
            Self::Quat6(q) => put_vec_i32(out, Vector3 { x: q.x, y: q.y, z: q.z }),
            Self::Quat9(q) | Self::Geomag(q) => {
                put_vec_i32(out, Vector3 { x: q.x, y: q.y, z: q.z });
                out[12..14].copy_from_slice(&q.accuracy.to_le_bytes());
            }
            Self::GyroCalibr(v) | Self::CompassCalibr(v) => put_vec_i32(out, v),
            Self::StepDetector(timestamp) => out[..4].copy_from_slice(&timestamp.to_le_bytes()),
            Self::AccelAccuracy(value)
            | Self::GyroAccuracy(value)
            | Self::CompassAccuracy(value)
            | Self::Fsync(value)
            | Self::Pickup(value)
            | Self::SecondaryOnOff(SecondaryOnOff(value)) => {
                out[..2].copy_from_slice(&value.to_le_bytes());
            }
            Self::ActivityRecog(event) => {
                out[0] = event.state_start.0;
                out[1] = event.state_end.0;
                out[2..6].copy_from_slice(&event.timestamp.to_le_bytes());
            }
        }
    }
}

fn quat9(bytes: &[u8]) -> Quaternion9 {
    let v = vec_i32(bytes);
    Quaternion9 {
        x: v.x,
        y: v.y,
        z: v.z,
        accuracy: le_i16(bytes, 12),
    }
}

/// One decoded DMP record
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DmpRecord {
    /// Primary header
    pub header: u16,
    /// Secondary header (0 when absent)
    pub header2: u16,
    /// Raw accelerometer
    pub accel: Option<Vector3<i16>>,
    /// Raw gyroscope plus bias
    pub gyro: Option<GyroSample>,
    /// Raw compass
    pub compass: Option<Vector3<i16>>,
    /// Ambient light
    pub als: Option<[u8; 8]>,
    /// 6-axis quaternion
    pub quat6: Option<Quaternion6>,
    /// 9-axis quaternion
    pub quat9: Option<Quaternion9>,
    /// Low-precision 6-axis quaternion
    pub pquat6: Option<Vector3<i16>>,
    /// Geomagnetic rotation vector
    pub geomag: Option<Quaternion9>,
    /// Pressure
    pub pressure: Option<[u8; 6]>,
    /// Calibrated gyroscope
    pub gyro_calibr: Option<Vector3<i32>>,
    /// Calibrated compass
    pub compass_calibr: Option<Vector3<i32>>,
    /// Step detector timestamp
    pub step_detector: Option<u32>,
    /// Accelerometer accuracy
    pub accel_accuracy: Option<u16>,
    /// Gyroscope accuracy
    pub gyro_accuracy: Option<u16>,
    /// Compass accuracy
    pub compass_accuracy: Option<u16>,
    /// FSYNC delay
    pub fsync: Option<u16>,
    /// Pickup gesture
    pub pickup: Option<u16>,
    /// Activity recognition event
    pub activity: Option<ActivityEvent>,
    /// Secondary sensor on/off request
    pub secondary_on_off: Option<SecondaryOnOff>,
    /// Footer
    pub footer: u16,
}

impl DmpRecord {
    /// Store a decoded field
    pub fn set(&mut self, field: DmpField) {
        match field {
            DmpField::Accel(v) => self.accel = Some(v),
            DmpField::Gyro(v) => self.gyro = Some(v),
            DmpField::Compass(v) => self.compass = Some(v),
            DmpField::Als(v) => self.als = Some(v),
            DmpField::Quat6(v) => self.quat6 = Some(v),
            DmpField::Quat9(v) => self.quat9 = Some(v),
            DmpField::PQuat6(v) => self.pquat6 = Some(v),
            DmpField::Geomag(v) => self.geomag = Some(v),
            DmpField::Pressure(v) => self.pressure = Some(v),
            DmpField::GyroCalibr(v) => self.gyro_calibr = Some(v),
            DmpField::CompassCalibr(v) => self.compass_calibr = Some(v),
            DmpField::StepDetector(v) => self.step_detector = Some(v),
            DmpField::AccelAccuracy(v) => self.accel_accuracy = Some(v),
            DmpField::GyroAccuracy(v) => self.gyro_accuracy = Some(v),
            DmpField::CompassAccuracy(v) => self.compass_accuracy = Some(v),
            DmpField::Fsync(v) => self.fsync = Some(v),
            DmpField::Pickup(v) => self.pickup = Some(v),
            DmpField::ActivityRecog(v) => self.activity = Some(v),
            DmpField::SecondaryOnOff(v) => self.secondary_on_off = Some(v),
        }
    }

    /// The stored field of `kind`, if any
    pub fn get(&self, kind: FieldKind) -> Option<DmpField> {
        match kind {
            FieldKind::Accel => self.accel.map(DmpField::Accel),
            FieldKind::Gyro => self.gyro.map(DmpField::Gyro),
            FieldKind::Compass => self.compass.map(DmpField::Compass),
            FieldKind::Als => self.als.map(DmpField::Als),
            FieldKind::Quat6 => self.quat6.map(DmpField::Quat6),
            FieldKind::Quat9 => self.quat9.map(DmpField::Quat9),
            FieldKind::PQuat6 => self.pquat6.map(DmpField::PQuat6),
            FieldKind::Geomag => self.geomag.map(DmpField::Geomag),
            FieldKind::Pressure => self.pressure.map(DmpField::Pressure),
            FieldKind::GyroCalibr => self.gyro_calibr.map(DmpField::GyroCalibr),
            FieldKind::CompassCalibr => self.compass_calibr.map(DmpField::CompassCalibr),
            FieldKind::StepDetector => self.step_detector.map(DmpField::StepDetector),
            FieldKind::AccelAccuracy => self.accel_accuracy.map(DmpField::AccelAccuracy),
            FieldKind::GyroAccuracy => self.gyro_accuracy.map(DmpField::GyroAccuracy),
            FieldKind::CompassAccuracy => self.compass_accuracy.map(DmpField::CompassAccuracy),
            FieldKind::Fsync => self.fsync.map(DmpField::Fsync),
            FieldKind::Pickup => self.pickup.map(DmpField::Pickup),
            FieldKind::ActivityRecog => self.activity.map(DmpField::ActivityRecog),
            FieldKind::SecondaryOnOff => self.secondary_on_off.map(DmpField::SecondaryOnOff),
        }
    }

    /// Wire length of this record under the default layout
    pub fn wire_len(&self) -> usize {
        record_len(PRIMARY_FIELDS, SECONDARY_FIELDS, self.header, self.header2)
    }

    /// Encode this record in FIFO wire order under the default layout
    ///
    /// The headers decide which fields are written; a field whose bit is set but
    /// whose value is `None` is written as zeros. Returns the number of bytes
    /// written, or `None` if `out` is shorter than [`wire_len`](Self::wire_len).
    pub fn encode(&self, out: &mut [u8]) -> Option<usize> {
        let len = self.wire_len();
        if out.len() < len {
            return None;
        }

        out[..HEADER_LEN].copy_from_slice(&self.header.to_be_bytes());
        let mut pos = HEADER_LEN;

        let has_header2 = self.header & HeaderBits::HEADER2 != 0;
        if has_header2 {
            out[pos..pos + HEADER2_LEN].copy_from_slice(&self.header2.to_be_bytes());
            pos += HEADER2_LEN;
        }

        let passes = [
            (PRIMARY_FIELDS, self.header),
            (SECONDARY_FIELDS, if has_header2 { self.header2 } else { 0 }),
        ];
        for (table, header) in passes {
            for spec in table.iter().filter(|spec| header & spec.bit() != 0) {
                let kind = spec.kind();
                let mut canonical = [0u8; MAX_FIELD_LEN];
                if let Some(field) = self.get(kind) {
                    field.write_canonical(&mut canonical);
                }
                kind.byte_order()
                    .to_wire(&canonical[..kind.len()], &mut out[pos..pos + kind.len()]);
                pos += kind.len();
            }
        }

        out[pos..pos + 2].copy_from_slice(&self.footer.to_be_bytes());
        Some(pos + 2)
    }
}
