//! Bus interface implementations for the ICM-20948
//!
//! Every transport implements `device_driver::RegisterInterface` with an 8-bit
//! register address, plus [`Transport`], which decides how its failures are
//! reported. The driver never sees the physical bus; it only issues
//! `read_register` / `write_register` calls for the currently selected bank.
//!
//! - [`I2cInterface`] for `embedded_hal::i2c::I2c`
//! - [`SpiInterface`] for `embedded_hal::spi::SpiDevice`
//! - [`SerifInterface`] for a pair of user callbacks (either may be absent)

use crate::I2C_ADDRESS_AD0_LOW;

use crate::Error;
use device_driver::RegisterInterface;

/// A register transport the driver can run on
///
/// A custom `RegisterInterface` only needs an empty `impl Transport for MyBus {}`;
/// the provided [`Transport::classify`] reports every failure as [`Error::Bus`].
pub trait Transport: RegisterInterface<AddressType = u8> {
    /// Turn a failed register access into a driver error
    fn classify(error: Self::Error) -> Error<Self::Error> {
        Error::Bus(error)
    }
}

/// The driver's view of a [`Transport`]: failures arrive already classified
pub(crate) struct Classified<I>(pub(crate) I);

impl<I: Transport> RegisterInterface for Classified<I> {
    type Error = Error<I::Error>;
    type AddressType = u8;

    fn read_register(
        &mut self,
        address: Self::AddressType,
        size_bits: u32,
        read_data: &mut [u8],
    ) -> Result<(), Self::Error> {
        self.0
            .read_register(address, size_bits, read_data)
            .map_err(I::classify)
    }

    fn write_register(
        &mut self,
        address: Self::AddressType,
        size_bits: u32,
        write_data: &[u8],
    ) -> Result<(), Self::Error> {
        self.0
            .write_register(address, size_bits, write_data)
            .map_err(I::classify)
    }
}

/// I2C interface for the ICM-20948
pub struct I2cInterface<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C> I2cInterface<I2C> {
    /// Create a new I2C interface with the default address (0x68, AD0 pin LOW)
    ///
    /// # Example
    /// ```ignore
    /// let interface = I2cInterface::default(i2c);
    /// let mut imu = Icm20948Driver::new(interface)?;
    /// ```
    pub const fn default(i2c: I2C) -> Self {
        Self {
            i2c,
            address: I2C_ADDRESS_AD0_LOW,
        }
    }

    /// Create a new I2C interface with the alternative address (0x69, AD0 pin HIGH)
    pub const fn alternative(i2c: I2C) -> Self {
        Self {
            i2c,
            address: crate::I2C_ADDRESS_AD0_HIGH,
        }
    }

    /// Create a new I2C interface with a custom device address
    pub const fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    /// Device address used on the bus
    pub const fn address(&self) -> u8 {
        self.address
    }

    /// Consume the interface and return the I2C peripheral
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C, E> RegisterInterface for I2cInterface<I2C>
where
    I2C: embedded_hal::i2c::I2c<Error = E>,
{
    type Error = E;
    type AddressType = u8;

    fn read_register(
        &mut self,
        address: Self::AddressType,
        _size_bits: u32,
        read_data: &mut [u8],
    ) -> Result<(), Self::Error> {
        self.i2c.write_read(self.address, &[address], read_data)
    }

    fn write_register(
        &mut self,
        address: Self::AddressType,
        _size_bits: u32,
        write_data: &[u8],
    ) -> Result<(), Self::Error> {
        // Adjacent writes in one transaction are merged on the wire (no repeated
        // start), so the register address and payload go out as a single frame.
        let mut operations = [
            embedded_hal::i2c::Operation::Write(&[address]),
            embedded_hal::i2c::Operation::Write(write_data),
        ];
        self.i2c.transaction(self.address, &mut operations)
    }
}

impl<I2C: embedded_hal::i2c::I2c> Transport for I2cInterface<I2C> {}

/// SPI interface for the ICM-20948
///
/// Chip select is owned by the `SpiDevice` implementation, e.g.
/// `embedded_hal_bus::spi::ExclusiveDevice`.
///
/// When using SPI, call [`Icm20948Driver::enable_spi_mode`](crate::Icm20948Driver::enable_spi_mode)
/// once after construction to disable the I2C slave interface.
pub struct SpiInterface<SPI> {
    spi: SPI,
}

impl<SPI> SpiInterface<SPI> {
    /// Create a new SPI interface with the given SPI device
    pub const fn new(spi: SPI) -> Self {
        Self { spi }
    }

    /// Consume the interface and return the SPI device
    pub fn release(self) -> SPI {
        self.spi
    }
}

impl<SPI, E> RegisterInterface for SpiInterface<SPI>
where
    SPI: embedded_hal::spi::SpiDevice<Error = E>,
{
    type Error = Error<E>;
    type AddressType = u8;

    fn read_register(
        &mut self,
        address: Self::AddressType,
        _size_bits: u32,
        read_data: &mut [u8],
    ) -> Result<(), Self::Error> {
        // MSB set selects a read
        let read_address = address | 0x80;

        let mut operations = [
            embedded_hal::spi::Operation::Write(&[read_address]),
            embedded_hal::spi::Operation::Read(read_data),
        ];

        self.spi.transaction(&mut operations).map_err(Error::Bus)
    }

    fn write_register(
        &mut self,
        address: Self::AddressType,
        _size_bits: u32,
        write_data: &[u8],
    ) -> Result<(), Self::Error> {
        let write_address = address & 0x7F;

        let mut operations = [
            embedded_hal::spi::Operation::Write(&[write_address]),
            embedded_hal::spi::Operation::Write(write_data),
        ];

        self.spi.transaction(&mut operations).map_err(Error::Bus)
    }
}

impl<SPI: embedded_hal::spi::SpiDevice> Transport for SpiInterface<SPI> {
    fn classify(error: Error<SPI::Error>) -> Error<Error<SPI::Error>> {
        Error::hoist(error)
    }
}

/// Register write callback: `(register, bytes)`
pub type SerifWrite<'a, E> = &'a mut dyn FnMut(u8, &[u8]) -> Result<(), E>;

/// Register read callback: `(register, buffer)`
pub type SerifRead<'a, E> = &'a mut dyn FnMut(u8, &mut [u8]) -> Result<(), E>;

/// Callback-based transport
///
/// For buses that are not exposed through `embedded-hal`, or for host-side
/// tooling. Either direction may be left out; an access in a missing direction
/// fails with [`Error::NotImplemented`]. Through the driver that error is reported
/// as-is, not wrapped in [`Error::Bus`], so its [`Error::status`] is
/// [`Status::NotImplemented`](crate::Status::NotImplemented).
///
/// ```
/// # use icm20948_dmp::{Error, SerifInterface};
/// # use device_driver::RegisterInterface;
/// let mut log = [0u8; 2];
/// let mut write = |reg: u8, data: &[u8]| -> Result<(), ()> {
///     log = [reg, data[0]];
///     Ok(())
/// };
/// let mut serif = SerifInterface::write_only(&mut write);
/// assert_eq!(serif.write_register(0x7F, 8, &[0x20]), Ok(()));
/// let mut buf = [0u8; 1];
/// assert_eq!(serif.read_register(0x00, 8, &mut buf), Err(Error::NotImplemented));
/// ```
pub struct SerifInterface<'a, E> {
    write: Option<SerifWrite<'a, E>>,
    read: Option<SerifRead<'a, E>>,
}

impl<'a, E> SerifInterface<'a, E> {
    /// Create an interface with both directions
    pub fn new(write: SerifWrite<'a, E>, read: SerifRead<'a, E>) -> Self {
        Self {
            write: Some(write),
            read: Some(read),
        }
    }

    /// Create an interface that can only write
    pub fn write_only(write: SerifWrite<'a, E>) -> Self {
        Self {
            write: Some(write),
            read: None,
        }
    }

    /// Create an interface that can only read
    pub fn read_only(read: SerifRead<'a, E>) -> Self {
        Self {
            write: None,
            read: Some(read),
        }
    }
}

impl<E> RegisterInterface for SerifInterface<'_, E> {
    type Error = Error<E>;
    type AddressType = u8;

    fn read_register(
        &mut self,
        address: Self::AddressType,
        _size_bits: u32,
        read_data: &mut [u8],
    ) -> Result<(), Self::Error> {
        let read = self.read.as_mut().ok_or(Error::NotImplemented)?;
        read(address, read_data).map_err(Error::Bus)
    }

    fn write_register(
        &mut self,
        address: Self::AddressType,
        _size_bits: u32,
        write_data: &[u8],
    ) -> Result<(), Self::Error> {
        let write = self.write.as_mut().ok_or(Error::NotImplemented)?;
        write(address, write_data).map_err(Error::Bus)
    }
}

impl<E> Transport for SerifInterface<'_, E> {
    fn classify(error: Error<E>) -> Error<Error<E>> {
        Error::hoist(error)
    }
}
