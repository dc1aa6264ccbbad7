//! Status codes and worst-error accumulation
//!
//! Every [`Error`] and every DMP read outcome maps onto a [`Status`]. The variants
//! are declared in ascending severity, so `Ord` on `Status` is the single place that
//! decides which of two failures is "worse".
//!
//! Configuration sequences whose steps are independent of each other (the four
//! interrupt-enable registers, an ODR value and its counter) run every step and
//! report the most severe failure through [`ErrorAccumulator`].

use crate::Error;

/// Driver status code, ordered by severity (`Ok` is the least severe)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Status {
    /// Operation succeeded
    Ok,
    /// A record was decoded and more FIFO bytes are already waiting
    FifoMoreDataAvailable,
    /// The FIFO does not yet hold the rest of the current record
    FifoNoDataAvailable,
    /// No data to transfer or no sample ready
    NoDataAvailable,
    /// Parameter out of range
    ParamError,
    /// The DMP cannot produce the requested sensor
    SensorNotSupported,
    /// No DMP firmware image available
    DmpNotSupported,
    /// Transport is missing a direction
    NotImplemented,
    /// Address is not a DMP output-rate register
    InvalidDmpRegister,
    /// `WHO_AM_I` mismatch
    WrongDeviceId,
    /// DMP firmware read-back mismatch
    DmpVerifyFailed,
    /// Auxiliary I2C NACK or poll timeout
    BusError,
    /// Transport-level failure
    Transport,
}

impl Status {
    /// True for the outcomes a caller is expected to see in steady state
    pub const fn is_recoverable(self) -> bool {
        matches!(
            self,
            Self::Ok | Self::FifoMoreDataAvailable | Self::FifoNoDataAvailable
        )
    }
}

impl<E> Error<E> {
    /// Severity of this error
    pub const fn status(&self) -> Status {
        match self {
            Self::Bus(_) => Status::Transport,
            Self::InvalidDevice(_) => Status::WrongDeviceId,
            Self::InvalidParameter => Status::ParamError,
            Self::NotImplemented => Status::NotImplemented,
            Self::NoData => Status::NoDataAvailable,
            Self::SecondaryBus => Status::BusError,
            Self::DmpNotSupported => Status::DmpNotSupported,
            Self::DmpVerifyFailed => Status::DmpVerifyFailed,
            Self::SensorNotSupported => Status::SensorNotSupported,
            Self::InvalidDmpRegister => Status::InvalidDmpRegister,
        }
    }

    /// Keep the more severe of two errors
    ///
    /// On a tie the receiver (the earlier error) wins.
    #[must_use]
    pub fn worst(self, other: Self) -> Self {
        if other.status() > self.status() {
            other
        } else {
            self
        }
    }
}

/// Collects the results of independent steps and keeps the most severe error
///
/// ```
/// # use icm20948_dmp::{Error, ErrorAccumulator};
/// let mut acc = ErrorAccumulator::<()>::new();
/// acc.record(Err::<(), _>(Error::NoData));
/// acc.record(Err::<(), _>(Error::SecondaryBus));
/// acc.record(Ok::<(), Error<()>>(()));
/// assert_eq!(acc.finish(), Err(Error::SecondaryBus));
/// ```
#[derive(Debug)]
pub struct ErrorAccumulator<E> {
    worst: Option<Error<E>>,
}

impl<E> Default for ErrorAccumulator<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> ErrorAccumulator<E> {
    /// Start with no recorded failure
    pub const fn new() -> Self {
        Self { worst: None }
    }

    /// Record one step, returning its value on success
    pub fn record<T>(&mut self, result: Result<T, Error<E>>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                self.worst = Some(match self.worst.take() {
                    Some(previous) => previous.worst(error),
                    None => error,
                });
                None
            }
        }
    }

    /// Status of the worst failure so far
    pub fn status(&self) -> Status {
        self.worst.as_ref().map_or(Status::Ok, Error::status)
    }

    /// `Ok(())` if every step succeeded, otherwise the most severe error
    ///
    /// # Errors
    ///
    /// Returns the most severe recorded error.
    pub fn finish(self) -> Result<(), Error<E>> {
        self.worst.map_or(Ok(()), Err)
    }
}
