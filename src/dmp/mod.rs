//! Digital Motion Processor (DMP) support
//!
//! The DMP has no firmware of its own. The host attaches an image with
//! [`Icm20948Driver::attach_dmp_firmware`] and uploads it with
//! [`Icm20948Driver::load_dmp_firmware`] after every power-up. Once running, the DMP
//! pushes self-describing records into the hardware FIFO, which
//! [`Icm20948Driver::read_dmp_data`] decodes one at a time.
//!
//! ## Usage Example
//!
//! ```ignore
//! # use icm20948_dmp::{Icm20948Driver, InterruptEnables};
//! # use icm20948_dmp::dmp::{DmpOdrRegister, DmpReadOutcome, DmpSensor, DMP_START_ADDRESS};
//! # let mut imu: Icm20948Driver<_> = todo!();
//! # static IMAGE: [u8; 1] = [0];
//! imu.attach_dmp_firmware(&IMAGE);
//! imu.load_dmp_firmware()?;
//! imu.set_dmp_start_address(DMP_START_ADDRESS)?;
//!
//! imu.enable_dmp_sensor(DmpSensor::GameRotationVector, true)?;
//! imu.set_dmp_sensor_period(DmpOdrRegister::Quat6, 0)?;
//! imu.set_fifo_enable(true)?;
//! imu.set_dmp_enable(true)?;
//! imu.reset_dmp()?;
//! imu.reset_fifo()?;
//!
//! loop {
//!     match imu.read_dmp_data()? {
//!         DmpReadOutcome::Incomplete(_) => break,
//!         outcome => {
//!             if let Some(quat) = outcome.record().and_then(|r| r.quat6) {
//!                 // quat.x, quat.y, quat.z are Q30
//!             }
//!         }
//!     }
//! }
//! # Ok::<(), icm20948_dmp::Error<()>>(())
//! ```

pub mod config;
pub mod decoder;
pub mod layout;
pub mod loader;
pub mod record;

pub use config::{
    DataOutputControl1, DataOutputControl2, DataReadyStatus, DmpMemoryAddresses,
    DmpOdrRegister, DmpSensor, MotionEventControl, SensorNeeds,
};
pub use decoder::{DecodeStage, DmpDecoder, DmpReadOutcome, FifoSource};
pub use layout::{FieldKind, FieldSpec, Header2Bits, HeaderBits, PRIMARY_FIELDS, SECONDARY_FIELDS};
pub use loader::{DMP_LOAD_START, DMP_START_ADDRESS};
pub use record::{
    ActivityEvent, ActivityState, DmpField, DmpRecord, GyroSample, Quaternion6, Quaternion9,
    SecondaryOnOff, Vector3,
};

use crate::interface::Transport;
use crate::registers::raw;
use crate::status::ErrorAccumulator;
use crate::{Bank, Error, Icm20948Driver, RegisterAddress};

const MEM_R_W: RegisterAddress = RegisterAddress::new(Bank::Bank0, raw::MEM_R_W);

impl<I> Icm20948Driver<I>
where
    I: Transport,
{
    /// Select a DMP memory page
    ///
    /// No bus traffic if `page` is already selected. Like the register bank mirror,
    /// the page mirror is cleared before the select is issued.
    fn select_mem_page(&mut self, page: u8) -> Result<(), Error<I::Error>> {
        self.select_bank(Bank::Bank0)?;
        if self.current_mem_bank == Some(page) {
            return Ok(());
        }

        self.current_mem_bank = None;
        self.device.mem_bank_sel().write(|w| w.set_mem_bank_sel(page))?;
        self.current_mem_bank = Some(page);
        Ok(())
    }

    fn check_dmp_range(address: u16, len: usize) -> Result<(), Error<I::Error>> {
        if len == 0 {
            return Err(Error::NoData);
        }
        if !loader::fits(address, len) {
            return Err(Error::InvalidParameter);
        }
        Ok(())
    }

    /// Write `data` into DMP memory starting at `address`
    ///
    /// The transfer is split into bursts of at most 16 bytes that never cross a
    /// 256-byte page.
    ///
    /// # Errors
    ///
    /// Returns `Error::NoData` for empty `data`, `Error::InvalidParameter` if the
    /// range runs past the end of DMP memory, or an error if communication fails.
    pub fn write_dmp_memory(&mut self, address: u16, data: &[u8]) -> Result<(), Error<I::Error>> {
        Self::check_dmp_range(address, data.len())?;

        for chunk in loader::chunks(address, data.len()) {
            self.select_mem_page(chunk.page)?;
            self.device
                .mem_start_addr()
                .write(|w| w.set_mem_start_addr(chunk.offset))?;
            self.write_register(MEM_R_W, &data[chunk.range()])?;

            #[cfg(feature = "defmt")]
            defmt::trace!(
                "DMP write: page={} offset=0x{:02X} len={}",
                chunk.page,
                chunk.offset,
                chunk.len
            );
        }

        Ok(())
    }

    /// Read `buffer.len()` bytes of DMP memory starting at `address`
    ///
    /// # Errors
    ///
    /// Returns `Error::NoData` for an empty buffer, `Error::InvalidParameter` if the
    /// range runs past the end of DMP memory, or an error if communication fails.
    pub fn read_dmp_memory(
        &mut self,
        address: u16,
        buffer: &mut [u8],
    ) -> Result<(), Error<I::Error>> {
        Self::check_dmp_range(address, buffer.len())?;

        for chunk in loader::chunks(address, buffer.len()) {
            self.select_mem_page(chunk.page)?;
            self.device
                .mem_start_addr()
                .write(|w| w.set_mem_start_addr(chunk.offset))?;
            self.read_register(MEM_R_W, &mut buffer[chunk.range()])?;

            #[cfg(feature = "defmt")]
            defmt::trace!(
                "DMP read: page={} offset=0x{:02X} len={}",
                chunk.page,
                chunk.offset,
                chunk.len
            );
        }

        Ok(())
    }

    fn write_dmp_word(&mut self, address: u16, value: u16) -> Result<(), Error<I::Error>> {
        self.write_dmp_memory(address, &value.to_be_bytes())
    }

    fn require_dmp_firmware(&self) -> Result<&'static [u8], Error<I::Error>> {
        self.dmp_firmware.ok_or(Error::DmpNotSupported)
    }

    /// Attach the DMP firmware image
    ///
    /// Every DMP operation except raw memory access fails with
    /// `Error::DmpNotSupported` until an image is attached. Attaching marks the
    /// firmware as not loaded.
    pub fn attach_dmp_firmware(&mut self, image: &'static [u8]) {
        self.dmp_firmware = Some(image);
        self.firmware_loaded = false;
    }

    /// True once [`load_dmp_firmware`](Self::load_dmp_firmware) has succeeded
    pub const fn is_dmp_firmware_loaded(&self) -> bool {
        self.firmware_loaded
    }

    /// Upload the attached firmware image and verify it
    ///
    /// Wakes the chip and leaves low-power mode first. The image is written at
    /// [`DMP_LOAD_START`] and then read back chunk by chunk. Does nothing if the
    /// firmware is already loaded.
    ///
    /// # Errors
    ///
    /// Returns `Error::DmpNotSupported` without an attached image,
    /// `Error::DmpVerifyFailed` if the read-back differs, or an error if
    /// communication fails.
    pub fn load_dmp_firmware(&mut self) -> Result<(), Error<I::Error>> {
        let image = self.require_dmp_firmware()?;
        if self.firmware_loaded {
            return Ok(());
        }

        self.set_sleep(false)?;
        self.set_low_power(false)?;

        self.write_dmp_memory(DMP_LOAD_START, image)?;

        let mut readback = [0u8; loader::MAX_TRANSFER];
        for chunk in loader::chunks(DMP_LOAD_START, image.len()) {
            let address = u16::from_be_bytes([chunk.page, chunk.offset]);
            let actual = &mut readback[..chunk.len];
            self.read_dmp_memory(address, actual)?;
            if *actual != image[chunk.range()] {
                #[cfg(feature = "defmt")]
                defmt::warn!("DMP firmware mismatch at 0x{:04X}", address);
                return Err(Error::DmpVerifyFailed);
            }
        }

        self.firmware_loaded = true;

        #[cfg(feature = "defmt")]
        defmt::info!("DMP firmware loaded ({} bytes)", image.len());

        Ok(())
    }

    /// Set the DMP program start address (`PRGM_START_ADDRH/L`, Bank 2)
    ///
    /// # Errors
    ///
    /// Returns `Error::DmpNotSupported` without an attached image, or an error if
    /// communication fails.
    pub fn set_dmp_start_address(&mut self, address: u16) -> Result<(), Error<I::Error>> {
        self.require_dmp_firmware()?;

        let [high, low] = address.to_be_bytes();
        self.select_bank(Bank::Bank2)?;
        self.device
            .bank_2_prgm_start_addrh()
            .write(|w| w.set_prgm_start_addrh(high))?;
        self.device
            .bank_2_prgm_start_addrl()
            .write(|w| w.set_prgm_start_addrl(low))?;

        #[cfg(feature = "defmt")]
        defmt::debug!("DMP start address: 0x{:04X}", address);

        Ok(())
    }

    /// Set the output-rate divider of one DMP output
    ///
    /// Writes `interval` to the divider and clears its counter. Both writes are
    /// attempted even if the first fails.
    ///
    /// # Errors
    ///
    /// Returns `Error::DmpNotSupported` without an attached image, an error if waking
    /// the chip fails, or the most severe error of the two writes.
    pub fn set_dmp_sensor_period(
        &mut self,
        register: DmpOdrRegister,
        interval: u16,
    ) -> Result<(), Error<I::Error>> {
        self.require_dmp_firmware()?;

        self.set_sleep(false)?;
        self.set_low_power(false)?;

        let mut acc = ErrorAccumulator::new();
        acc.record(self.write_dmp_word(register.address(), interval));
        acc.record(self.write_dmp_word(register.counter(), 0));

        #[cfg(feature = "defmt")]
        defmt::debug!("DMP ODR {}: {}", register, interval);

        acc.finish()
    }

    /// Enable or disable one DMP output
    ///
    /// Writes `DATA_OUT_CTL1`, `DATA_OUT_CTL2`, `DATA_RDY_STATUS` and
    /// `MOTION_EVENT_CTL` in that order. The words are replaced, not merged, so the
    /// last sensor enabled decides the record shape. Disabling writes zero to all
    /// four.
    ///
    /// # Errors
    ///
    /// Returns `Error::DmpNotSupported` without an attached image,
    /// `Error::SensorNotSupported` for a sensor the DMP cannot produce, or an error
    /// if communication fails.
    pub fn enable_dmp_sensor(
        &mut self,
        sensor: DmpSensor,
        enable: bool,
    ) -> Result<(), Error<I::Error>> {
        self.require_dmp_firmware()?;
        let bits = sensor.control_bits().ok_or(Error::SensorNotSupported)?;

        self.set_sleep(false)?;
        self.set_low_power(false)?;

        let (ctl1, needs) = if enable {
            (bits, sensor.needs())
        } else {
            (0, SensorNeeds::default())
        };

        self.write_dmp_word(DmpMemoryAddresses::DATA_OUT_CTL1, ctl1)?;
        self.write_dmp_word(DmpMemoryAddresses::DATA_OUT_CTL2, config::accuracy_bits(ctl1))?;
        self.write_dmp_word(
            DmpMemoryAddresses::DATA_RDY_STATUS,
            config::data_ready_bits(needs),
        )?;
        self.write_dmp_word(
            DmpMemoryAddresses::MOTION_EVENT_CTL,
            config::motion_event_bits(needs, ctl1),
        )?;

        #[cfg(feature = "defmt")]
        defmt::debug!("DMP sensor {} enabled={} ctl1=0x{:04X}", sensor, enable, ctl1);

        Ok(())
    }

    /// Enable or disable the DMP interrupt for one output (`DATA_INTR_CTL`)
    ///
    /// # Errors
    ///
    /// Returns `Error::DmpNotSupported` without an attached image,
    /// `Error::SensorNotSupported` for a sensor the DMP cannot produce, or an error
    /// if communication fails.
    pub fn enable_dmp_sensor_interrupt(
        &mut self,
        sensor: DmpSensor,
        enable: bool,
    ) -> Result<(), Error<I::Error>> {
        self.require_dmp_firmware()?;
        let bits = sensor.control_bits().ok_or(Error::SensorNotSupported)?;

        self.set_sleep(false)?;
        self.set_low_power(false)?;

        let bits = if enable { bits } else { 0 };
        self.write_dmp_word(DmpMemoryAddresses::DATA_INTR_CTL, bits)
    }

    /// Decode the next DMP record from the FIFO
    ///
    /// A record that is only partly in the FIFO yields
    /// [`DmpReadOutcome::Incomplete`]; the bytes already read are kept and the next
    /// call resumes the same record.
    ///
    /// # Errors
    ///
    /// Returns `Error::DmpNotSupported` without an attached image, or an error if
    /// communication fails.
    pub fn read_dmp_data(&mut self) -> Result<DmpReadOutcome, Error<I::Error>> {
        self.require_dmp_firmware()?;

        let mut decoder = core::mem::take(&mut self.decoder);
        let outcome = decoder.decode(self);
        self.decoder = decoder;
        outcome
    }

    /// The DMP record decoder
    pub const fn dmp_decoder(&self) -> &DmpDecoder {
        &self.decoder
    }

    /// Replace the DMP record decoder, e.g. with one built by
    /// [`DmpDecoder::with_layout`]
    pub fn set_dmp_decoder(&mut self, decoder: DmpDecoder) {
        self.decoder = decoder;
    }
}

impl<I> FifoSource for Icm20948Driver<I>
where
    I: Transport,
{
    type Error = Error<I::Error>;

    fn fifo_count(&mut self) -> Result<u16, Self::Error> {
        Icm20948Driver::fifo_count(self)
    }

    fn read_fifo(&mut self, buffer: &mut [u8]) -> Result<(), Self::Error> {
        Icm20948Driver::read_fifo(self, buffer)
    }
}
