//! Driver handle and bank-indirected register access
//!
//! Every register access goes through [`Icm20948Driver::select_bank`], which keeps a
//! mirror of `REG_BANK_SEL` and skips the select write when the requested bank is
//! already active. The mirror is cleared before a select is issued, so a failed
//! select is always retried by the next access.

use crate::interrupt::InterruptEnables;
use crate::interface::{Classified, Transport};
use crate::registers::{RegisterDevice, raw};
use crate::status::ErrorAccumulator;
use crate::{Bank, Error, WHO_AM_I_VALUE};

use device_driver::RegisterInterface;

#[cfg(feature = "dmp")]
use crate::dmp::DmpDecoder;

/// FIFO_RST value that holds every FIFO in reset
const FIFO_RESET_ASSERT: u8 = 0x1F;
/// FIFO_RST value that releases the FIFOs
const FIFO_RESET_RELEASE: u8 = 0x1E;

/// A register location: bank plus offset within the bank
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisterAddress {
    /// Register bank
    pub bank: Bank,
    /// Offset within the bank
    pub offset: u8,
}

impl RegisterAddress {
    /// Create a register address
    pub const fn new(bank: Bank, offset: u8) -> Self {
        Self { bank, offset }
    }
}

/// Clock source selection (`PWR_MGMT_1.CLKSEL`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockSource {
    /// Internal 20 MHz oscillator
    Internal20MHz = 0,
    /// Auto-select best available clock
    AutoSelect = 1,
    /// Stop clock and keep timing generator in reset
    Stop = 7,
}

/// FIFO behaviour when full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FifoMode {
    /// Oldest data is overwritten
    #[default]
    Stream,
    /// Writes stop when the FIFO is full
    Snapshot,
}

impl FifoMode {
    /// `FIFO_MODE` register value (one bit per FIFO)
    pub const fn register_value(self) -> u8 {
        match self {
            Self::Stream => 0x00,
            Self::Snapshot => 0x1F,
        }
    }
}

/// Burst size in bits for a buffer of `len` bytes
fn size_bits(len: usize) -> u32 {
    u32::try_from(len).map_or(u32::MAX, |n| n.saturating_mul(8))
}

/// Main driver for the ICM-20948
pub struct Icm20948Driver<I> {
    pub(crate) device: RegisterDevice<Classified<I>>,
    current_bank: Option<Bank>,
    #[cfg(feature = "dmp")]
    pub(crate) current_mem_bank: Option<u8>,
    #[cfg(feature = "dmp")]
    pub(crate) dmp_firmware: Option<&'static [u8]>,
    #[cfg(feature = "dmp")]
    pub(crate) firmware_loaded: bool,
    #[cfg(feature = "dmp")]
    pub(crate) decoder: DmpDecoder,
}

impl<I> Icm20948Driver<I>
where
    I: Transport,
{
    /// Create a new ICM-20948 driver instance
    ///
    /// Selects bank 0 and verifies `WHO_AM_I`. The device is not reset or woken.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Communication with the device fails
    /// - The `WHO_AM_I` register contains an unexpected value
    pub fn new(interface: I) -> Result<Self, Error<I::Error>> {
        let mut driver = Self {
            device: RegisterDevice::new(Classified(interface)),
            current_bank: None,
            #[cfg(feature = "dmp")]
            current_mem_bank: None,
            #[cfg(feature = "dmp")]
            dmp_firmware: None,
            #[cfg(feature = "dmp")]
            firmware_loaded: false,
            #[cfg(feature = "dmp")]
            decoder: DmpDecoder::new(),
        };

        driver.select_bank(Bank::Bank0)?;
        driver.check_id()?;

        Ok(driver)
    }

    /// Consume the driver and return the interface
    pub fn release(self) -> I {
        self.device.interface.0
    }

    /// Bank the driver believes is selected (`None` after a failed select or a reset)
    pub const fn current_bank(&self) -> Option<Bank> {
        self.current_bank
    }

    /// Select a register bank
    ///
    /// No bus traffic if `bank` is already selected.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails. The cached bank is
    /// then unknown and the next access re-issues the select.
    pub fn select_bank(&mut self, bank: Bank) -> Result<(), Error<I::Error>> {
        if self.current_bank == Some(bank) {
            return Ok(());
        }

        self.current_bank = None;
        self.device.reg_bank_sel().write(|w| {
            w.set_user_bank(bank as u8);
        })?;
        self.current_bank = Some(bank);

        Ok(())
    }

    /// Select a register bank by index
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidParameter` for an index above 3, without touching the bus.
    pub fn select_bank_index(&mut self, index: u8) -> Result<(), Error<I::Error>> {
        let bank = Bank::try_from(index).map_err(|_| Error::InvalidParameter)?;
        self.select_bank(bank)
    }

    /// Read `buffer.len()` bytes starting at `address`
    ///
    /// # Errors
    ///
    /// Returns an error if the bank select or the read fails. `buffer` is untouched
    /// when the bank select fails.
    pub fn read_register(
        &mut self,
        address: RegisterAddress,
        buffer: &mut [u8],
    ) -> Result<(), Error<I::Error>> {
        self.select_bank(address.bank)?;
        self.device
            .interface
            .read_register(address.offset, size_bits(buffer.len()), buffer)?;
        Ok(())
    }

    /// Write `data` starting at `address`
    ///
    /// # Errors
    ///
    /// Returns an error if the bank select or the write fails.
    pub fn write_register(
        &mut self,
        address: RegisterAddress,
        data: &[u8],
    ) -> Result<(), Error<I::Error>> {
        self.select_bank(address.bank)?;
        self.device
            .interface
            .write_register(address.offset, size_bits(data.len()), data)?;
        Ok(())
    }

    /// Read the `WHO_AM_I` register
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn read_who_am_i(&mut self) -> Result<u8, Error<I::Error>> {
        self.select_bank(Bank::Bank0)?;
        let who_am_i = self.device.who_am_i().read()?;
        Ok(who_am_i.who_am_i())
    }

    /// Verify the device identity
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidDevice` with the value read if it is not 0xEA.
    pub fn check_id(&mut self) -> Result<(), Error<I::Error>> {
        let who_am_i = self.read_who_am_i()?;
        if who_am_i != WHO_AM_I_VALUE {
            #[cfg(feature = "defmt")]
            defmt::warn!("Unexpected WHO_AM_I: 0x{:02X}", who_am_i);
            return Err(Error::InvalidDevice(who_am_i));
        }
        Ok(())
    }

    /// Software reset
    ///
    /// All registers return to their reset values, so both the register bank and
    /// the DMP memory page mirrors are invalidated. The caller is responsible for
    /// waiting for the reset to complete (up to 100 ms) before the next access.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn sw_reset(&mut self) -> Result<(), Error<I::Error>> {
        self.select_bank(Bank::Bank0)?;
        self.device.pwr_mgmt_1().modify(|w| {
            w.set_device_reset(true);
        })?;

        self.current_bank = None;
        #[cfg(feature = "dmp")]
        {
            self.current_mem_bank = None;
            self.firmware_loaded = false;
            self.decoder.discard();
        }

        #[cfg(feature = "defmt")]
        defmt::debug!("Software reset issued");

        Ok(())
    }

    /// Put the device to sleep or wake it up
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_sleep(&mut self, sleep: bool) -> Result<(), Error<I::Error>> {
        self.select_bank(Bank::Bank0)?;
        self.device.pwr_mgmt_1().modify(|w| {
            w.set_sleep(sleep);
        })?;
        Ok(())
    }

    /// Enable or disable low-power mode
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_low_power(&mut self, enable: bool) -> Result<(), Error<I::Error>> {
        self.select_bank(Bank::Bank0)?;
        self.device.pwr_mgmt_1().modify(|w| {
            w.set_lp_en(enable);
        })?;
        Ok(())
    }

    /// Select the clock source
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_clock_source(&mut self, source: ClockSource) -> Result<(), Error<I::Error>> {
        self.select_bank(Bank::Bank0)?;
        self.device.pwr_mgmt_1().modify(|w| {
            w.set_clksel(source as u8);
        })?;
        Ok(())
    }

    /// Enable SPI mode by disabling the I2C slave interface
    ///
    /// Call once after construction when using [`SpiInterface`](crate::SpiInterface).
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn enable_spi_mode(&mut self) -> Result<(), Error<I::Error>> {
        self.select_bank(Bank::Bank0)?;
        self.device.user_ctrl().modify(|w| {
            w.set_i_2_c_if_dis(true);
        })?;
        Ok(())
    }

    /// True if new raw sensor data is ready (`INT_STATUS_1.RAW_DATA_0_RDY_INT`)
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn data_ready(&mut self) -> Result<bool, Error<I::Error>> {
        self.select_bank(Bank::Bank0)?;
        let status = self.device.int_status_1().read()?;
        Ok(status.raw_data_0_rdy_int())
    }

    /// Like [`data_ready`](Self::data_ready), but reports "not ready" as an error
    ///
    /// # Errors
    ///
    /// Returns `Error::NoData` when no sample is ready.
    pub fn require_data_ready(&mut self) -> Result<(), Error<I::Error>> {
        if self.data_ready()? {
            Ok(())
        } else {
            Err(Error::NoData)
        }
    }

    /// Write all four interrupt-enable registers
    ///
    /// Every register is written even if an earlier one fails.
    ///
    /// # Errors
    ///
    /// Returns the most severe error seen across the four writes.
    pub fn set_interrupt_enables(
        &mut self,
        enables: &InterruptEnables,
    ) -> Result<(), Error<I::Error>> {
        self.select_bank(Bank::Bank0)?;

        let mut acc = ErrorAccumulator::new();
        acc.record(
            self.device
                .int_enable()
                .write(|w| {
                    w.set_i_2_c_mst_int_en(enables.i2c_master);
                    w.set_dmp_int_1_en(enables.dmp);
                    w.set_pll_rdy_en(enables.pll_ready);
                    w.set_wom_int_en(enables.wake_on_motion);
                    w.set_reg_wof_en(enables.wake_on_fsync);
                }),
        );
        acc.record(
            self.device
                .int_enable_1()
                .write(|w| w.set_raw_data_0_rdy_en(enables.raw_data_ready)),
        );
        acc.record(
            self.device
                .int_enable_2()
                .write(|w| w.set_fifo_overflow_en(enables.fifo_overflow)),
        );
        acc.record(
            self.device
                .int_enable_3()
                .write(|w| w.set_fifo_wm_en(enables.fifo_watermark)),
        );

        #[cfg(feature = "defmt")]
        defmt::debug!("Interrupt enables written: {}", enables);

        acc.finish()
    }

    /// Read all four interrupt-enable registers into `enables`
    ///
    /// Fields backed by a register that could not be read keep their previous value.
    ///
    /// # Errors
    ///
    /// Returns the most severe error seen across the four reads.
    pub fn read_interrupt_enables(
        &mut self,
        enables: &mut InterruptEnables,
    ) -> Result<(), Error<I::Error>> {
        self.select_bank(Bank::Bank0)?;

        let mut acc = ErrorAccumulator::new();
        if let Some(reg) = acc.record(self.device.int_enable().read()) {
            enables.i2c_master = reg.i_2_c_mst_int_en();
            enables.dmp = reg.dmp_int_1_en();
            enables.pll_ready = reg.pll_rdy_en();
            enables.wake_on_motion = reg.wom_int_en();
            enables.wake_on_fsync = reg.reg_wof_en();
        }
        if let Some(reg) = acc.record(self.device.int_enable_1().read()) {
            enables.raw_data_ready = reg.raw_data_0_rdy_en();
        }
        if let Some(reg) = acc.record(self.device.int_enable_2().read()) {
            enables.fifo_overflow = reg.fifo_overflow_en();
        }
        if let Some(reg) = acc.record(self.device.int_enable_3().read()) {
            enables.fifo_watermark = reg.fifo_wm_en();
        }

        acc.finish()
    }

    /// Enable or disable the FIFO (`USER_CTRL.FIFO_EN`)
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_fifo_enable(&mut self, enable: bool) -> Result<(), Error<I::Error>> {
        self.select_bank(Bank::Bank0)?;
        self.device.user_ctrl().modify(|w| {
            w.set_fifo_en(enable);
        })?;
        Ok(())
    }

    /// Reset the FIFO
    ///
    /// Asserts reset on every FIFO, then releases it. Any partially decoded DMP
    /// record is discarded as well.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn reset_fifo(&mut self) -> Result<(), Error<I::Error>> {
        self.select_bank(Bank::Bank0)?;

        #[cfg(feature = "dmp")]
        self.decoder.discard();

        self.device
            .fifo_rst()
            .write(|w| w.set_fifo_reset(FIFO_RESET_ASSERT))?;
        self.device
            .fifo_rst()
            .write(|w| w.set_fifo_reset(FIFO_RESET_RELEASE))?;
        Ok(())
    }

    /// Select stream or snapshot mode for every FIFO
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_fifo_mode(&mut self, mode: FifoMode) -> Result<(), Error<I::Error>> {
        self.select_bank(Bank::Bank0)?;
        self.device
            .fifo_mode()
            .write(|w| w.set_fifo_mode(mode.register_value()))?;
        Ok(())
    }

    /// Number of bytes in the FIFO (13 bits)
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn fifo_count(&mut self) -> Result<u16, Error<I::Error>> {
        self.select_bank(Bank::Bank0)?;

        let count_h = self.device.fifo_counth().read()?;
        let count_l = self.device.fifo_countl().read()?;

        // High register carries bits 12:8
        Ok((u16::from(count_h.fifo_cnt_h() & 0x1F) << 8) | u16::from(count_l.fifo_cnt_l()))
    }

    /// Burst read `buffer.len()` bytes from the FIFO
    ///
    /// # Errors
    ///
    /// Returns `Error::NoData` for an empty buffer, or an error if communication
    /// with the device fails.
    pub fn read_fifo(&mut self, buffer: &mut [u8]) -> Result<(), Error<I::Error>> {
        if buffer.is_empty() {
            return Err(Error::NoData);
        }
        self.read_register(RegisterAddress::new(Bank::Bank0, raw::FIFO_R_W), buffer)
    }

    /// Enable or disable the DMP (`USER_CTRL.DMP_EN`)
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_dmp_enable(&mut self, enable: bool) -> Result<(), Error<I::Error>> {
        self.select_bank(Bank::Bank0)?;
        self.device.user_ctrl().modify(|w| {
            w.set_dmp_en(enable);
        })?;
        Ok(())
    }

    /// Reset the DMP (`USER_CTRL.DMP_RST`)
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn reset_dmp(&mut self) -> Result<(), Error<I::Error>> {
        self.select_bank(Bank::Bank0)?;
        self.device.user_ctrl().modify(|w| {
            w.set_dmp_rst(true);
        })?;
        Ok(())
    }
}
