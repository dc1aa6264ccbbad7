#![no_std]
#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod device;
pub mod i2c_master;
pub mod interface;
pub mod interrupt;
pub mod registers;
pub mod status;

// DMP support (feature-gated)
#[cfg(feature = "dmp")]
pub mod dmp;

// Re-export main types
pub use device::{ClockSource, FifoMode, Icm20948Driver, RegisterAddress};
pub use i2c_master::{DelayPoll, PeripheralSlot, PollLimit, Slv4Transfer, WaitStrategy};
pub use interface::{I2cInterface, SerifInterface, SpiInterface, Transport};
pub use interrupt::InterruptEnables;
pub use status::{ErrorAccumulator, Status};

/// ICM-20948 I2C address when AD0 pin is low (default: 0x68)
///
/// Use [`I2cInterface::default()`] for this configuration.
pub const I2C_ADDRESS_AD0_LOW: u8 = 0x68;

/// ICM-20948 I2C address when AD0 pin is high (alternative: 0x69)
///
/// Use [`I2cInterface::alternative()`] for this configuration.
pub const I2C_ADDRESS_AD0_HIGH: u8 = 0x69;

/// Expected value of `WHO_AM_I` register
pub const WHO_AM_I_VALUE: u8 = 0xEA;

/// Register bank identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Bank {
    /// Bank 0 - Primary configuration, FIFO, DMP memory window
    Bank0 = 0,
    /// Bank 1 - Self-test and offsets
    Bank1 = 1,
    /// Bank 2 - Sensor configuration and DMP program start address
    Bank2 = 2,
    /// Bank 3 - I2C master configuration
    Bank3 = 3,
}

impl TryFrom<u8> for Bank {
    /// The rejected bank index
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Bank0),
            1 => Ok(Self::Bank1),
            2 => Ok(Self::Bank2),
            3 => Ok(Self::Bank3),
            other => Err(other),
        }
    }
}

/// Driver errors
///
/// `E` is the error type of the underlying transport. Use [`Error::status`] to
/// classify an error by severity.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// Communication error with the device
    Bus(E),
    /// Invalid `WHO_AM_I` register value (contains the actual value read)
    InvalidDevice(u8),
    /// Invalid parameter (bank index, slot index, transfer length)
    InvalidParameter,
    /// The transport does not implement the requested direction
    NotImplemented,
    /// No data to transfer or no data ready
    NoData,
    /// Auxiliary I2C transaction was NACKed, lost arbitration or never completed
    SecondaryBus,
    /// No DMP firmware image is attached to the driver
    DmpNotSupported,
    /// DMP firmware read-back did not match the image
    DmpVerifyFailed,
    /// The DMP cannot produce the requested sensor
    SensorNotSupported,
    /// Address is not a DMP output-rate register
    InvalidDmpRegister,
}

impl<E> From<E> for Error<E> {
    fn from(error: E) -> Self {
        Self::Bus(error)
    }
}

impl<E> Error<Error<E>> {
    /// Lift an error from a transport whose own error type is [`Error`]
    ///
    /// Only `Bus(e)` stays nested. Every other variant moves to the outer level, so
    /// the result classifies exactly like `inner`.
    ///
    /// ```
    /// # use icm20948_dmp::{Error, Status};
    /// let missing: Error<Error<()>> = Error::hoist(Error::NotImplemented);
    /// assert_eq!(missing, Error::NotImplemented);
    /// assert_eq!(missing.status(), Status::NotImplemented);
    /// assert_eq!(Error::hoist(Error::Bus(())), Error::Bus(Error::Bus(())));
    /// ```
    pub fn hoist(inner: Error<E>) -> Self {
        match inner {
            Error::Bus(error) => Self::Bus(Error::Bus(error)),
            Error::InvalidDevice(id) => Self::InvalidDevice(id),
            Error::InvalidParameter => Self::InvalidParameter,
            Error::NotImplemented => Self::NotImplemented,
            Error::NoData => Self::NoData,
            Error::SecondaryBus => Self::SecondaryBus,
            Error::DmpNotSupported => Self::DmpNotSupported,
            Error::DmpVerifyFailed => Self::DmpVerifyFailed,
            Error::SensorNotSupported => Self::SensorNotSupported,
            Error::InvalidDmpRegister => Self::InvalidDmpRegister,
        }
    }

    /// Collapse the nesting of an error from [`SpiInterface`] or [`SerifInterface`]
    ///
    /// A failed callback or SPI transfer reaches the caller as `Bus(Bus(e))`; this
    /// returns `Bus(e)`.
    pub fn flatten(self) -> Error<E> {
        match self {
            Self::Bus(inner) => inner,
            Self::InvalidDevice(id) => Error::InvalidDevice(id),
            Self::InvalidParameter => Error::InvalidParameter,
            Self::NotImplemented => Error::NotImplemented,
            Self::NoData => Error::NoData,
            Self::SecondaryBus => Error::SecondaryBus,
            Self::DmpNotSupported => Error::DmpNotSupported,
            Self::DmpVerifyFailed => Error::DmpVerifyFailed,
            Self::SensorNotSupported => Error::SensorNotSupported,
            Self::InvalidDmpRegister => Error::InvalidDmpRegister,
        }
    }
}
