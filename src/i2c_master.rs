//! Auxiliary I2C master
//!
//! The ICM-20948 can master a secondary I2C bus. Two mechanisms are exposed:
//!
//! - **Slot 4** performs one single-byte transfer per arm. It is used to talk to a
//!   peripheral directly, e.g. to bring up a magnetometer before it is bound to a
//!   persistent slot. Completion is polled through `I2C_MST_STATUS`; how long to poll
//!   is decided by a [`WaitStrategy`].
//! - **Slots 0-3** repeat their transfer at the sample rate and land the result in
//!   `EXT_SLV_SENS_DATA`. They are programmed with [`PeripheralSlot`].
//!
//! # Example
//!
//! ```ignore
//! # use icm20948_dmp::{Icm20948Driver, PeripheralSlot};
//! # let mut imu: Icm20948Driver<_> = todo!();
//! imu.i2c_master_enable(true)?;
//! let who = imu.i2c_master_single_read(0x0C, 0x01)?;
//!
//! // Stream 9 bytes of magnetometer status and data through slot 0
//! imu.configure_peripheral(0, &PeripheralSlot::read(0x0C, 0x10, 9))?;
//! # Ok::<(), icm20948_dmp::Error<()>>(())
//! ```

use crate::interface::Transport;
use crate::registers::slot;
use crate::{Bank, Error, Icm20948Driver, RegisterAddress};

use embedded_hal::delay::DelayNs;

/// Default iteration ceiling for a slot-4 status poll
pub const DEFAULT_MAX_POLLS: u32 = 1000;

/// `I2C_MST_CTRL` clock setting used by [`Icm20948Driver::i2c_master_enable`] (345.6 kHz)
pub const I2C_MASTER_CLOCK: u8 = 0x07;

/// Number of persistent peripheral slots
pub const PERIPHERAL_SLOTS: u8 = 4;

/// Decides how long to wait for a slot-4 transfer to complete
pub trait WaitStrategy {
    /// Number of status polls before giving up
    fn max_polls(&self) -> u32;

    /// Called after poll number `poll` (starting at 0) did not see completion
    ///
    /// Not called after the last allowed poll.
    fn backoff(&mut self, poll: u32);
}

impl<W: WaitStrategy + ?Sized> WaitStrategy for &mut W {
    fn max_polls(&self) -> u32 {
        (**self).max_polls()
    }

    fn backoff(&mut self, poll: u32) {
        (**self).backoff(poll);
    }
}

/// Iteration-bounded busy wait
///
/// The time bound depends on bus speed. Use [`DelayPoll`] for a wall-clock bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollLimit(pub u32);

impl Default for PollLimit {
    fn default() -> Self {
        Self(DEFAULT_MAX_POLLS)
    }
}

impl WaitStrategy for PollLimit {
    fn max_polls(&self) -> u32 {
        self.0
    }

    fn backoff(&mut self, _poll: u32) {}
}

/// Sleeps a fixed interval between polls
///
/// Bounds the wait to roughly `(max_polls - 1) * interval_us` microseconds plus bus
/// time.
///
/// ```ignore
/// let mut wait = DelayPoll::new(&mut delay, 100, 50); // ~5 ms
/// imu.i2c_master_transaction(0x0C, 0x01, Slv4Transfer::Read(&mut buf), true, &mut wait)?;
/// ```
pub struct DelayPoll<D> {
    delay: D,
    interval_us: u32,
    max_polls: u32,
}

impl<D: DelayNs> DelayPoll<D> {
    /// Poll up to `max_polls` times, sleeping `interval_us` between polls
    pub const fn new(delay: D, interval_us: u32, max_polls: u32) -> Self {
        Self {
            delay,
            interval_us,
            max_polls,
        }
    }

    /// Return the delay provider
    pub fn release(self) -> D {
        self.delay
    }
}

impl<D: DelayNs> WaitStrategy for DelayPoll<D> {
    fn max_polls(&self) -> u32 {
        self.max_polls
    }

    fn backoff(&mut self, _poll: u32) {
        self.delay.delay_us(self.interval_us);
    }
}

/// Direction and data of a slot-4 transfer
#[derive(Debug)]
pub enum Slv4Transfer<'a> {
    /// Read into the buffer, one byte per transfer
    Read(&'a mut [u8]),
    /// Write the bytes, one per transfer
    Write(&'a [u8]),
}

impl Slv4Transfer<'_> {
    /// Number of bytes to move
    pub fn len(&self) -> usize {
        match self {
            Self::Read(buf) => buf.len(),
            Self::Write(data) => data.len(),
        }
    }

    /// True if there is nothing to transfer
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True for a read
    pub const fn is_read(&self) -> bool {
        matches!(self, Self::Read(_))
    }
}

/// Configuration of one persistent peripheral slot (0-3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[allow(clippy::struct_excessive_bools)]
pub struct PeripheralSlot {
    /// 7-bit target address
    pub address: u8,
    /// Target register
    pub register: u8,
    /// Bytes per transfer (0-15)
    pub length: u8,
    /// Read (true) or write (false)
    pub read: bool,
    /// Slot enabled
    pub enable: bool,
    /// Data-only transfer: do not send `register`
    pub data_only: bool,
    /// Group byte pairs ending on an odd register
    pub group: bool,
    /// Swap the bytes of each pair
    pub swap: bool,
    /// Byte written by a write slot (`I2C_SLVx_DO`)
    pub data_out: Option<u8>,
}

impl PeripheralSlot {
    /// Enabled read slot
    pub const fn read(address: u8, register: u8, length: u8) -> Self {
        Self {
            address,
            register,
            length,
            read: true,
            enable: true,
            data_only: false,
            group: false,
            swap: false,
            data_out: None,
        }
    }

    /// Enabled write slot sending `value` to `register`
    pub const fn write(address: u8, register: u8, value: u8) -> Self {
        Self {
            address,
            register,
            length: 1,
            read: false,
            enable: true,
            data_only: false,
            group: false,
            swap: false,
            data_out: Some(value),
        }
    }

    /// Set the enable flag
    #[must_use]
    pub const fn with_enable(mut self, enable: bool) -> Self {
        self.enable = enable;
        self
    }

    /// Set the data-only flag
    #[must_use]
    pub const fn with_data_only(mut self, data_only: bool) -> Self {
        self.data_only = data_only;
        self
    }

    /// Set the grouping flag
    #[must_use]
    pub const fn with_group(mut self, group: bool) -> Self {
        self.group = group;
        self
    }

    /// Set the byte-swap flag
    #[must_use]
    pub const fn with_swap(mut self, swap: bool) -> Self {
        self.swap = swap;
        self
    }

    /// Byte for the slot's `DO` register, written along with the slot
    #[must_use]
    pub const fn with_data_out(mut self, value: u8) -> Self {
        self.data_out = Some(value);
        self
    }

    /// `I2C_SLVx_ADDR` value
    pub const fn addr_byte(&self) -> u8 {
        let rnw = if self.read { slot::ADDR_RNW } else { 0 };
        (self.address & 0x7F) | rnw
    }

    /// `I2C_SLVx_CTRL` value
    pub const fn ctrl_byte(&self) -> u8 {
        let mut ctrl = self.length & slot::CTRL_LENG_MASK;
        if self.group {
            ctrl |= slot::CTRL_GRP;
        }
        if self.data_only {
            ctrl |= slot::CTRL_REG_DIS;
        }
        if self.swap {
            ctrl |= slot::CTRL_BYTE_SW;
        }
        if self.enable {
            ctrl |= slot::CTRL_EN;
        }
        ctrl
    }
}

impl<I> Icm20948Driver<I>
where
    I: Transport,
{
    /// Enable or disable auxiliary bus passthrough (`INT_PIN_CFG.BYPASS_EN`)
    ///
    /// With passthrough on, the host sees the auxiliary bus directly.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn i2c_master_passthrough(&mut self, passthrough: bool) -> Result<(), Error<I::Error>> {
        self.select_bank(Bank::Bank0)?;
        self.device.int_pin_cfg().modify(|w| {
            w.set_bypass_en(passthrough);
        })?;
        Ok(())
    }

    /// Enable or disable the auxiliary I2C master
    ///
    /// Enabling turns passthrough off and sets the master clock to 345.6 kHz with a
    /// stop between reads.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn i2c_master_enable(&mut self, enable: bool) -> Result<(), Error<I::Error>> {
        self.i2c_master_passthrough(false)?;

        self.select_bank(Bank::Bank3)?;
        self.device.bank_3_i_2_c_mst_ctrl().modify(|w| {
            w.set_i_2_c_mst_clk(I2C_MASTER_CLOCK);
            w.set_i_2_c_mst_p_nsr(true);
        })?;

        self.select_bank(Bank::Bank0)?;
        self.device.user_ctrl().modify(|w| {
            w.set_i_2_c_mst_en(enable);
        })?;

        #[cfg(feature = "defmt")]
        defmt::debug!("I2C master enable: {}", enable);

        Ok(())
    }

    /// Reset the auxiliary I2C master (`USER_CTRL.I2C_MST_RST`)
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn i2c_master_reset(&mut self) -> Result<(), Error<I::Error>> {
        self.select_bank(Bank::Bank0)?;
        self.device.user_ctrl().modify(|w| {
            w.set_i_2_c_mst_rst(true);
        })?;
        Ok(())
    }

    /// Move bytes to or from a peripheral through slot 4, one byte per transfer
    ///
    /// The target address and register are written once. Each byte is then staged
    /// (writes), armed, and polled for completion under `wait`. Reads fetch the byte
    /// from `I2C_SLV4_DI` before the next one is armed.
    ///
    /// # Arguments
    ///
    /// * `address` - 7-bit peripheral address
    /// * `register` - peripheral register
    /// * `transfer` - direction and data
    /// * `send_register` - send `register` before the data byte (false = data only)
    /// * `wait` - poll budget and backoff
    ///
    /// # Errors
    ///
    /// - `Error::NoData` if `transfer` is empty
    /// - `Error::SecondaryBus` on NACK, lost arbitration or an exhausted poll budget;
    ///   the remaining bytes are not attempted
    /// - `Error::Bus` if communication with the ICM-20948 fails
    pub fn i2c_master_transaction<W>(
        &mut self,
        address: u8,
        register: u8,
        transfer: Slv4Transfer<'_>,
        send_register: bool,
        wait: &mut W,
    ) -> Result<(), Error<I::Error>>
    where
        W: WaitStrategy + ?Sized,
    {
        if transfer.is_empty() {
            return Err(Error::NoData);
        }

        self.select_bank(Bank::Bank3)?;
        let is_read = transfer.is_read();
        self.device.bank_3_i_2_c_slv_4_addr().write(|w| {
            w.set_i_2_c_id_4(address & 0x7F);
            w.set_i_2_c_slv_4_rnw(is_read);
        })?;
        self.device
            .bank_3_i_2_c_slv_4_reg()
            .write(|w| w.set_i_2_c_slv_4_reg(register))?;

        match transfer {
            Slv4Transfer::Write(data) => {
                for &byte in data {
                    self.select_bank(Bank::Bank3)?;
                    self.device
                        .bank_3_i_2_c_slv_4_do()
                        .write(|w| w.set_i_2_c_slv_4_do(byte))?;
                    self.arm_slv4(send_register)?;
                    self.wait_for_slv4_done(wait)?;
                }
            }
            Slv4Transfer::Read(buffer) => {
                for byte in buffer.iter_mut() {
                    self.select_bank(Bank::Bank3)?;
                    self.arm_slv4(send_register)?;
                    self.wait_for_slv4_done(wait)?;

                    self.select_bank(Bank::Bank3)?;
                    *byte = self.device.bank_3_i_2_c_slv_4_di().read()?.i_2_c_slv_4_di();
                }
            }
        }

        Ok(())
    }

    /// Read one peripheral register through slot 4
    ///
    /// # Errors
    ///
    /// See [`i2c_master_transaction`](Self::i2c_master_transaction).
    pub fn i2c_master_single_read(&mut self, address: u8, register: u8) -> Result<u8, Error<I::Error>> {
        let mut byte = [0u8];
        self.i2c_master_read(address, register, &mut byte)?;
        Ok(byte[0])
    }

    /// Write one peripheral register through slot 4
    ///
    /// # Errors
    ///
    /// See [`i2c_master_transaction`](Self::i2c_master_transaction).
    pub fn i2c_master_single_write(
        &mut self,
        address: u8,
        register: u8,
        value: u8,
    ) -> Result<(), Error<I::Error>> {
        self.i2c_master_write(address, register, &[value])
    }

    /// Read `buffer.len()` bytes through slot 4 with the default poll limit
    ///
    /// # Errors
    ///
    /// See [`i2c_master_transaction`](Self::i2c_master_transaction).
    pub fn i2c_master_read(
        &mut self,
        address: u8,
        register: u8,
        buffer: &mut [u8],
    ) -> Result<(), Error<I::Error>> {
        self.i2c_master_transaction(
            address,
            register,
            Slv4Transfer::Read(buffer),
            true,
            &mut PollLimit::default(),
        )
    }

    /// Write `data` through slot 4 with the default poll limit
    ///
    /// # Errors
    ///
    /// See [`i2c_master_transaction`](Self::i2c_master_transaction).
    pub fn i2c_master_write(
        &mut self,
        address: u8,
        register: u8,
        data: &[u8],
    ) -> Result<(), Error<I::Error>> {
        self.i2c_master_transaction(
            address,
            register,
            Slv4Transfer::Write(data),
            true,
            &mut PollLimit::default(),
        )
    }

    /// Program persistent peripheral slot `index` (0-3)
    ///
    /// Writes `ADDR`, `REG` and `CTRL` (plus `DO` when `data_out` is set). No polling.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidParameter` for a slot above 3 or a length above 15,
    /// before any bus access.
    pub fn configure_peripheral(
        &mut self,
        index: u8,
        config: &PeripheralSlot,
    ) -> Result<(), Error<I::Error>> {
        if index >= PERIPHERAL_SLOTS || config.length > slot::CTRL_LENG_MASK {
            return Err(Error::InvalidParameter);
        }

        let at = |offset| RegisterAddress::new(Bank::Bank3, slot::register(index, offset));

        self.write_register(at(slot::ADDR), &[config.addr_byte()])?;
        self.write_register(at(slot::REG), &[config.register])?;
        self.write_register(at(slot::CTRL), &[config.ctrl_byte()])?;
        if let Some(value) = config.data_out {
            self.write_register(at(slot::DO), &[value])?;
        }

        #[cfg(feature = "defmt")]
        defmt::debug!("Peripheral slot {} configured: {}", index, config);

        Ok(())
    }

    /// Clear the enable bit of peripheral slot `index` (0-3)
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidParameter` for a slot above 3, or an error if
    /// communication with the device fails.
    pub fn disable_peripheral(&mut self, index: u8) -> Result<(), Error<I::Error>> {
        if index >= PERIPHERAL_SLOTS {
            return Err(Error::InvalidParameter);
        }

        let ctrl = RegisterAddress::new(Bank::Bank3, slot::register(index, slot::CTRL));
        let mut value = [0u8];
        self.read_register(ctrl, &mut value)?;
        self.write_register(ctrl, &[value[0] & !slot::CTRL_EN])
    }

    /// Start one slot-4 transfer (bank 3 must be selected)
    fn arm_slv4(&mut self, send_register: bool) -> Result<(), Error<I::Error>> {
        self.device.bank_3_i_2_c_slv_4_ctrl().write(|w| {
            w.set_i_2_c_slv_4_en(true);
            w.set_i_2_c_slv_4_int_en(false);
            w.set_i_2_c_slv_4_reg_dis(!send_register);
            w.set_i_2_c_mst_dly(0);
        })?;
        Ok(())
    }

    /// Poll `I2C_MST_STATUS` until slot 4 reports done
    ///
    /// The status register clears on read, so a NACK or lost arbitration seen on
    /// any poll ends the wait.
    fn wait_for_slv4_done<W>(&mut self, wait: &mut W) -> Result<(), Error<I::Error>>
    where
        W: WaitStrategy + ?Sized,
    {
        let max_polls = wait.max_polls();
        for poll in 0..max_polls {
            self.select_bank(Bank::Bank0)?;
            let status = self.device.i_2_c_mst_status().read()?;

            if status.i_2_c_slv_4_nack() || status.i_2_c_lost_arb() {
                #[cfg(feature = "defmt")]
                defmt::warn!(
                    "Slot 4 transfer failed (nack={}, lost_arb={})",
                    status.i_2_c_slv_4_nack(),
                    status.i_2_c_lost_arb()
                );
                return Err(Error::SecondaryBus);
            }

            if status.i_2_c_slv_4_done() {
                return Ok(());
            }

            // No back-off once the budget is spent
            if poll + 1 < max_polls {
                wait.backoff(poll);
            }
        }

        #[cfg(feature = "defmt")]
        defmt::warn!("Slot 4 transfer timed out after {} polls", max_polls);

        Err(Error::SecondaryBus)
    }
}
