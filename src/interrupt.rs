//! Interrupt source configuration
//!
//! The four `INT_ENABLE` registers (Bank 0, 0x10-0x13) are described by a single
//! [`InterruptEnables`] value. Writing or reading it touches every register even when
//! one of them fails; the driver reports the most severe failure.
//!
//! # Example
//!
//! ```ignore
//! # use icm20948_dmp::{Icm20948Driver, InterruptEnables};
//! # let mut imu: Icm20948Driver<_> = todo!();
//! let enables = InterruptEnables::new()
//!     .with_dmp(true)
//!     .with_fifo_overflow(0x1F);
//! imu.set_interrupt_enables(&enables)?;
//! # Ok::<(), icm20948_dmp::Error<()>>(())
//! ```

/// Mask of the per-FIFO bit fields in `INT_ENABLE_2` and `INT_ENABLE_3`
pub const FIFO_MASK: u8 = 0x1F;

/// Interrupt source enables
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[allow(clippy::struct_excessive_bools)]
pub struct InterruptEnables {
    /// Auxiliary I2C master interrupt (`INT_ENABLE.I2C_MST_INT_EN`)
    pub i2c_master: bool,
    /// DMP interrupt (`INT_ENABLE.DMP_INT1_EN`)
    pub dmp: bool,
    /// PLL ready (`INT_ENABLE.PLL_RDY_EN`)
    pub pll_ready: bool,
    /// Wake on motion (`INT_ENABLE.WOM_INT_EN`)
    pub wake_on_motion: bool,
    /// Wake on FSYNC (`INT_ENABLE.REG_WOF_EN`)
    pub wake_on_fsync: bool,
    /// Raw data ready (`INT_ENABLE_1.RAW_DATA_0_RDY_EN`)
    pub raw_data_ready: bool,
    /// FIFO overflow, one bit per FIFO (`INT_ENABLE_2`, 5 bits)
    pub fifo_overflow: u8,
    /// FIFO watermark, one bit per FIFO (`INT_ENABLE_3`, 5 bits)
    pub fifo_watermark: u8,
}

impl InterruptEnables {
    /// All sources disabled
    pub const fn new() -> Self {
        Self {
            i2c_master: false,
            dmp: false,
            pll_ready: false,
            wake_on_motion: false,
            wake_on_fsync: false,
            raw_data_ready: false,
            fifo_overflow: 0,
            fifo_watermark: 0,
        }
    }

    /// Sources used when streaming DMP records: DMP interrupt and FIFO overflow
    pub const fn dmp_streaming() -> Self {
        Self::new().with_dmp(true).with_fifo_overflow(FIFO_MASK)
    }

    /// Set the auxiliary I2C master interrupt
    #[must_use]
    pub const fn with_i2c_master(mut self, enable: bool) -> Self {
        self.i2c_master = enable;
        self
    }

    /// Set the DMP interrupt
    #[must_use]
    pub const fn with_dmp(mut self, enable: bool) -> Self {
        self.dmp = enable;
        self
    }

    /// Set the PLL ready interrupt
    #[must_use]
    pub const fn with_pll_ready(mut self, enable: bool) -> Self {
        self.pll_ready = enable;
        self
    }

    /// Set the wake-on-motion interrupt
    #[must_use]
    pub const fn with_wake_on_motion(mut self, enable: bool) -> Self {
        self.wake_on_motion = enable;
        self
    }

    /// Set the wake-on-FSYNC interrupt
    #[must_use]
    pub const fn with_wake_on_fsync(mut self, enable: bool) -> Self {
        self.wake_on_fsync = enable;
        self
    }

    /// Set the raw data ready interrupt
    #[must_use]
    pub const fn with_raw_data_ready(mut self, enable: bool) -> Self {
        self.raw_data_ready = enable;
        self
    }

    /// Set the FIFO overflow bits (masked to 5 bits)
    #[must_use]
    pub const fn with_fifo_overflow(mut self, fifos: u8) -> Self {
        self.fifo_overflow = fifos & FIFO_MASK;
        self
    }

    /// Set the FIFO watermark bits (masked to 5 bits)
    #[must_use]
    pub const fn with_fifo_watermark(mut self, fifos: u8) -> Self {
        self.fifo_watermark = fifos & FIFO_MASK;
        self
    }

    /// True if no source is enabled
    pub const fn is_empty(&self) -> bool {
        !self.i2c_master
            && !self.dmp
            && !self.pll_ready
            && !self.wake_on_motion
            && !self.wake_on_fsync
            && !self.raw_data_ready
            && self.fifo_overflow == 0
            && self.fifo_watermark == 0
    }
}
