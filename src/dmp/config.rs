//! DMP sensor configuration tables
//!
//! The DMP is configured through a handful of 16-bit words in its memory:
//!
//! - `DATA_OUT_CTL1` and `DATA_OUT_CTL2` select which fields appear in FIFO records
//!   (the same bits as the record headers).
//! - `DATA_INTR_CTL` selects which fields raise the DMP interrupt.
//! - `DATA_RDY_STATUS` tells the DMP which physical sensors it should wait for.
//! - `MOTION_EVENT_CTL` turns on calibration and the fusion engines.
//! - One output-rate divider and counter per output ([`DmpOdrRegister`]).
//!
//! [`DmpSensor`] maps an Android sensor type onto the control bits it needs.
//! All words are written MSB first.

use super::layout::{Header2Bits, HeaderBits};
use crate::Error;

/// DMP memory addresses of the control words
#[derive(Debug, Clone, Copy)]
pub struct DmpMemoryAddresses;

impl DmpMemoryAddresses {
    /// Record field enables (header bits)
    pub const DATA_OUT_CTL1: u16 = 0x0040;
    /// Record field enables (header2 bits)
    pub const DATA_OUT_CTL2: u16 = 0x0042;
    /// DMP interrupt sources
    pub const DATA_INTR_CTL: u16 = 0x004C;
    /// Calibration and fusion enables
    pub const MOTION_EVENT_CTL: u16 = 0x004E;
    /// Physical sensors the DMP waits for
    pub const DATA_RDY_STATUS: u16 = 0x008A;
}

/// `DATA_OUT_CTL1` bits
///
/// The field bits are the primary header bits; the low three bits only select
/// which step events are reported.
#[derive(Debug, Clone, Copy)]
pub struct DataOutputControl1;

impl DataOutputControl1 {
    /// Raw accelerometer
    pub const ACCEL: u16 = HeaderBits::ACCEL;
    /// Raw gyroscope
    pub const GYRO: u16 = HeaderBits::GYRO;
    /// Raw compass
    pub const COMPASS: u16 = HeaderBits::COMPASS;
    /// Ambient light
    pub const ALS: u16 = HeaderBits::ALS;
    /// 6-axis quaternion
    pub const QUAT6: u16 = HeaderBits::QUAT6;
    /// 9-axis quaternion
    pub const QUAT9: u16 = HeaderBits::QUAT9;
    /// Low-precision 6-axis quaternion
    pub const PQUAT6: u16 = HeaderBits::PQUAT6;
    /// Geomagnetic rotation vector
    pub const GEOMAG: u16 = HeaderBits::GEOMAG;
    /// Pressure
    pub const PRESSURE: u16 = HeaderBits::PRESSURE;
    /// Calibrated gyroscope
    pub const GYRO_CALIBR: u16 = HeaderBits::GYRO_CALIBR;
    /// Calibrated compass
    pub const COMPASS_CALIBR: u16 = HeaderBits::COMPASS_CALIBR;
    /// Step detector
    pub const STEP_DETECTOR: u16 = HeaderBits::STEP_DETECTOR;
    /// Secondary header
    pub const HEADER2: u16 = HeaderBits::HEADER2;
    /// Step indicator bit 2
    pub const STEP_IND_2: u16 = 0x0004;
    /// Step indicator bit 1
    pub const STEP_IND_1: u16 = 0x0002;
    /// Step indicator bit 0
    pub const STEP_IND_0: u16 = 0x0001;
}

/// `DATA_OUT_CTL2` bits
#[derive(Debug, Clone, Copy)]
pub struct DataOutputControl2;

impl DataOutputControl2 {
    /// Accelerometer accuracy
    pub const ACCEL_ACCURACY: u16 = Header2Bits::ACCEL_ACCURACY;
    /// Gyroscope accuracy
    pub const GYRO_ACCURACY: u16 = Header2Bits::GYRO_ACCURACY;
    /// Compass accuracy
    pub const COMPASS_ACCURACY: u16 = Header2Bits::COMPASS_ACCURACY;
    /// Batch mode
    pub const BATCH_MODE_ENABLE: u16 = Header2Bits::BATCH_MODE_ENABLE;
}

/// `DATA_RDY_STATUS` bits
#[derive(Debug, Clone, Copy)]
pub struct DataReadyStatus;

impl DataReadyStatus {
    /// Gyroscope samples
    pub const GYRO: u16 = 0x0001;
    /// Accelerometer samples
    pub const ACCEL: u16 = 0x0002;
    /// Secondary (compass) samples
    pub const SECONDARY_COMPASS: u16 = 0x0008;
}

/// `MOTION_EVENT_CTL` bits
#[derive(Debug, Clone, Copy)]
pub struct MotionEventControl;

impl MotionEventControl {
    /// Geomagnetic rotation vector engine
    pub const GEOMAG: u16 = 0x0008;
    /// 9-axis fusion
    pub const NINE_AXIS: u16 = 0x0040;
    /// Compass calibration
    pub const COMPASS_CALIBR: u16 = 0x0080;
    /// Gyroscope calibration
    pub const GYRO_CALIBR: u16 = 0x0100;
    /// Accelerometer calibration
    pub const ACCEL_CALIBR: u16 = 0x0200;
    /// Pedometer interrupt
    pub const PEDOMETER_INTERRUPT: u16 = 0x2000;
}

/// Output-rate divider registers in DMP memory
///
/// Each output has a divider (the ODR value) and a counter that must be cleared
/// when the divider changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DmpOdrRegister {
    /// 9-axis quaternion
    Quat9,
    /// 6-axis quaternion
    Quat6,
    /// Raw accelerometer
    Accel,
    /// Raw gyroscope
    Gyro,
    /// Raw compass
    Compass,
    /// Calibrated gyroscope
    GyroCalibr,
    /// Calibrated compass
    CompassCalibr,
    /// Ambient light
    Als,
    /// Low-precision 6-axis quaternion
    PQuat6,
    /// Geomagnetic rotation vector
    Geomag,
    /// Pressure
    Pressure,
}

impl DmpOdrRegister {
    const ALL: [Self; 11] = [
        Self::Quat9,
        Self::Quat6,
        Self::Accel,
        Self::Gyro,
        Self::Compass,
        Self::GyroCalibr,
        Self::CompassCalibr,
        Self::Als,
        Self::PQuat6,
        Self::Geomag,
        Self::Pressure,
    ];

    /// Memory address of the divider
    pub const fn address(self) -> u16 {
        match self {
            Self::Quat9 => 0x00A8,
            Self::Quat6 => 0x00AC,
            Self::Accel => 0x00BE,
            Self::Gyro => 0x00BA,
            Self::Compass => 0x00B6,
            Self::GyroCalibr => 0x00B8,
            Self::CompassCalibr => 0x00B4,
            Self::Als => 0x00B2,
            Self::PQuat6 => 0x00A4,
            Self::Geomag => 0x00A0,
            Self::Pressure => 0x00BC,
        }
    }

    /// Memory address of the counter paired with the divider
    pub const fn counter(self) -> u16 {
        self.address() - 0x20
    }

    /// Look up a divider by memory address
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidDmpRegister` if `address` is not a divider.
    pub fn from_address<E>(address: u16) -> Result<Self, Error<E>> {
        Self::try_from(address).map_err(|_| Error::InvalidDmpRegister)
    }
}

impl TryFrom<u16> for DmpOdrRegister {
    /// The rejected address
    type Error = u16;

    fn try_from(address: u16) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|register| register.address() == address)
            .ok_or(address)
    }
}

/// Physical sensors a DMP output depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[allow(clippy::struct_excessive_bools)]
pub struct SensorNeeds {
    /// Accelerometer
    pub accel: bool,
    /// Gyroscope
    pub gyro: bool,
    /// Compass
    pub compass: bool,
}

impl SensorNeeds {
    const A: Self = Self {
        accel: true,
        gyro: false,
        compass: false,
    };
    const G: Self = Self {
        accel: false,
        gyro: true,
        compass: false,
    };
    const C: Self = Self {
        accel: false,
        gyro: false,
        compass: true,
    };
    const AG: Self = Self {
        accel: true,
        gyro: true,
        compass: false,
    };
    const AC: Self = Self {
        accel: true,
        gyro: false,
        compass: true,
    };
    const AGC: Self = Self {
        accel: true,
        gyro: true,
        compass: true,
    };
}

/// Sensor types the DMP can be asked for
///
/// Named after the Android sensor types the DMP firmware implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DmpSensor {
    /// Calibrated accelerometer
    Accelerometer,
    /// Calibrated gyroscope
    Gyroscope,
    /// Raw accelerometer
    RawAccelerometer,
    /// Raw gyroscope
    RawGyroscope,
    /// Uncalibrated magnetometer
    MagneticFieldUncalibrated,
    /// Uncalibrated gyroscope
    GyroscopeUncalibrated,
    /// Activity classification (not available)
    ActivityClassification,
    /// Step detector
    StepDetector,
    /// Step counter
    StepCounter,
    /// 6-axis rotation vector
    GameRotationVector,
    /// 9-axis rotation vector
    RotationVector,
    /// Accelerometer plus compass rotation vector
    GeomagneticRotationVector,
    /// Calibrated magnetometer
    GeomagneticField,
    /// Significant motion
    SignificantMotion,
    /// Flip and pickup gestures (not available)
    FlipPickup,
    /// Tilt detector
    WakeupTilt,
    /// Gravity vector
    Gravity,
    /// Linear acceleration
    LinearAcceleration,
    /// Orientation
    Orientation,
    /// Body-to-sensor transform (not available)
    B2s,
}

impl DmpSensor {
    const ALL: [Self; 20] = [
        Self::Accelerometer,
        Self::Gyroscope,
        Self::RawAccelerometer,
        Self::RawGyroscope,
        Self::MagneticFieldUncalibrated,
        Self::GyroscopeUncalibrated,
        Self::ActivityClassification,
        Self::StepDetector,
        Self::StepCounter,
        Self::GameRotationVector,
        Self::RotationVector,
        Self::GeomagneticRotationVector,
        Self::GeomagneticField,
        Self::SignificantMotion,
        Self::FlipPickup,
        Self::WakeupTilt,
        Self::Gravity,
        Self::LinearAcceleration,
        Self::Orientation,
        Self::B2s,
    ];

    /// Android sensor type number
    ///
    /// Inverse of `DmpSensor::try_from(u8)`.
    pub const fn android_index(self) -> u8 {
        match self {
            Self::Accelerometer => 1,
            Self::GeomagneticField => 2,
            Self::Orientation => 3,
            Self::Gyroscope => 4,
            Self::Gravity => 9,
            Self::LinearAcceleration => 10,
            Self::RotationVector => 11,
            Self::MagneticFieldUncalibrated => 14,
            Self::GameRotationVector => 15,
            Self::GyroscopeUncalibrated => 16,
            Self::SignificantMotion => 17,
            Self::StepDetector => 18,
            Self::StepCounter => 19,
            Self::GeomagneticRotationVector => 20,
            Self::WakeupTilt => 41,
            Self::RawAccelerometer => 42,
            Self::RawGyroscope => 43,
            Self::B2s => 45,
            Self::FlipPickup => 46,
            Self::ActivityClassification => 47,
        }
    }

    /// Look up a sensor by Android sensor type number
    ///
    /// # Errors
    ///
    /// Returns `Error::SensorNotSupported` for a type with no `DmpSensor` counterpart.
    pub fn from_android_index<E>(index: u8) -> Result<Self, Error<E>> {
        Self::try_from(index).map_err(|_| Error::SensorNotSupported)
    }

    /// `DATA_OUT_CTL1` bits for this sensor, or `None` if the DMP cannot produce it
    pub const fn control_bits(self) -> Option<u16> {
        match self {
            Self::Accelerometer | Self::RawAccelerometer => Some(0x8008),
            Self::GeomagneticField => Some(0x0028),
            Self::Orientation | Self::RotationVector => Some(0x0408),
            Self::Gyroscope | Self::RawGyroscope => Some(0x4048),
            Self::Gravity | Self::GameRotationVector => Some(0x0808),
            Self::LinearAcceleration => Some(0x8808),
            Self::MagneticFieldUncalibrated => Some(0x2008),
            Self::GyroscopeUncalibrated => Some(0x4008),
            Self::SignificantMotion | Self::WakeupTilt => Some(0x0000),
            Self::StepDetector => Some(0x0018),
            Self::StepCounter => Some(0x0010),
            Self::GeomagneticRotationVector => Some(0x0108),
            Self::ActivityClassification | Self::FlipPickup | Self::B2s => None,
        }
    }

    /// Physical sensors the output depends on
    pub const fn needs(self) -> SensorNeeds {
        match self {
            Self::Accelerometer
            | Self::RawAccelerometer
            | Self::SignificantMotion
            | Self::StepDetector
            | Self::StepCounter
            | Self::WakeupTilt
            | Self::ActivityClassification
            | Self::FlipPickup => SensorNeeds::A,
            Self::Gyroscope | Self::RawGyroscope | Self::GyroscopeUncalibrated => SensorNeeds::G,
            Self::GeomagneticField | Self::MagneticFieldUncalibrated => SensorNeeds::C,
            Self::Gravity | Self::LinearAcceleration | Self::GameRotationVector => SensorNeeds::AG,
            Self::GeomagneticRotationVector => SensorNeeds::AC,
            Self::Orientation | Self::RotationVector | Self::B2s => SensorNeeds::AGC,
        }
    }
}

impl TryFrom<u8> for DmpSensor {
    /// The rejected Android sensor type
    type Error = u8;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|sensor| sensor.android_index() == index)
            .ok_or(index)
    }
}

/// `DATA_OUT_CTL2` accuracy bits implied by a `DATA_OUT_CTL1` value
pub const fn accuracy_bits(ctl1: u16) -> u16 {
    let mut ctl2 = 0;
    if ctl1 & DataOutputControl1::ACCEL != 0 {
        ctl2 |= DataOutputControl2::ACCEL_ACCURACY;
    }
    if ctl1 & (DataOutputControl1::GYRO | DataOutputControl1::GYRO_CALIBR) != 0 {
        ctl2 |= DataOutputControl2::GYRO_ACCURACY;
    }
    if ctl1
        & (DataOutputControl1::COMPASS
            | DataOutputControl1::COMPASS_CALIBR
            | DataOutputControl1::QUAT9
            | DataOutputControl1::GEOMAG)
        != 0
    {
        ctl2 |= DataOutputControl2::COMPASS_ACCURACY;
    }
    ctl2
}

/// `DATA_RDY_STATUS` value for a set of sensor needs
pub const fn data_ready_bits(needs: SensorNeeds) -> u16 {
    let mut status = 0;
    if needs.accel {
        status |= DataReadyStatus::ACCEL;
    }
    if needs.gyro {
        status |= DataReadyStatus::GYRO;
    }
    if needs.compass {
        status |= DataReadyStatus::SECONDARY_COMPASS;
    }
    status
}

/// `MOTION_EVENT_CTL` value for a set of sensor needs and a `DATA_OUT_CTL1` value
pub const fn motion_event_bits(needs: SensorNeeds, ctl1: u16) -> u16 {
    let mut events = 0;
    if needs.accel {
        events |= MotionEventControl::ACCEL_CALIBR;
    }
    if needs.gyro {
        events |= MotionEventControl::GYRO_CALIBR;
    }
    if needs.compass {
        events |= MotionEventControl::COMPASS_CALIBR;
    }
    if ctl1 & DataOutputControl1::QUAT9 != 0 {
        events |= MotionEventControl::NINE_AXIS;
    }
    let step_bits = DataOutputControl1::STEP_DETECTOR
        | DataOutputControl1::STEP_IND_0
        | DataOutputControl1::STEP_IND_1
        | DataOutputControl1::STEP_IND_2;
    if ctl1 & step_bits != 0 {
        events |= MotionEventControl::PEDOMETER_INTERRUPT;
    }
    if ctl1 & DataOutputControl1::GEOMAG != 0 {
        events |= MotionEventControl::GEOMAG;
    }
    events
}
