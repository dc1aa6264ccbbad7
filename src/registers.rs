//! Register definitions for the ICM-20948
//!
//! The ICM-20948 uses a bank-switching architecture where registers at addresses 0x00-0x7F
//! have different meanings depending on which bank is selected via `REG_BANK_SEL` (0x7F).
//! Only the registers the driver core touches are described here.
//!
//! ## Bank Architecture
//! - **Bank 0**: Power, interrupts, FIFO and the DMP memory window
//! - **Bank 2**: DMP program start address
//! - **Bank 3**: Auxiliary I2C master and peripheral slots
//!
//! All registers that share addresses across banks use `ALLOW_ADDRESS_OVERLAP = true`.
//! Peripheral slots 0-3 are addressed by index (see [`slot`]) rather than through
//! generated accessors.

device_driver::create_device!(
    device_name: Icm20948,
    dsl: {
        config {
            type RegisterAddressType = u8;
            type DefaultByteOrder = BE;
        }

        // ==================== BANK 0 REGISTERS ====================

        /// WHO_AM_I - Device ID Register (Bank 0, 0x00)
        /// Expected value: 0xEA
        register WhoAmI {
            const ADDRESS = 0x00;
            const SIZE_BITS = 8;
            const ALLOW_ADDRESS_OVERLAP = true;

            /// Device ID (should read 0xEA)
            who_am_i: uint = 0..8,
        },

        /// USER_CTRL - User Control (Bank 0, 0x03)
        register UserCtrl {
            const ADDRESS = 0x03;
            const SIZE_BITS = 8;
            const ALLOW_ADDRESS_OVERLAP = true;

            reserved_0: uint = 0..1,
            /// I2C master reset
            i2c_mst_rst: bool = 1,
            /// SRAM reset
            sram_rst: bool = 2,
            /// DMP reset
            dmp_rst: bool = 3,
            /// I2C interface disable (SPI only)
            i2c_if_dis: bool = 4,
            /// I2C master enable
            i2c_mst_en: bool = 5,
            /// FIFO enable
            fifo_en: bool = 6,
            /// DMP enable
            dmp_en: bool = 7,
        },

        /// PWR_MGMT_1 - Power Management 1 (Bank 0, 0x06)
        register PwrMgmt1 {
            const ADDRESS = 0x06;
            const SIZE_BITS = 8;
            const ALLOW_ADDRESS_OVERLAP = true;

            /// Clock source select (0=internal 20MHz, 1-5=auto select best, 7=stop clock)
            clksel: uint = 0..3,
            /// Temperature sensor disable
            temp_dis: bool = 3,
            reserved_4: uint = 4..5,
            /// Low power mode enable
            lp_en: bool = 5,
            /// Sleep mode enable
            sleep: bool = 6,
            /// Device reset
            device_reset: bool = 7,
        },

        /// INT_PIN_CFG - Interrupt Pin Configuration (Bank 0, 0x0F)
        register IntPinCfg {
            const ADDRESS = 0x0F;
            const SIZE_BITS = 8;
            const ALLOW_ADDRESS_OVERLAP = true;

            reserved_0: uint = 0..1,
            /// Auxiliary bus bypass (passthrough) enable
            bypass_en: bool = 1,
            /// FSYNC interrupt mode select
            fsync_int_mode_en: bool = 2,
            /// FSYNC active low
            actl_fsync: bool = 3,
            /// Interrupt status clear on any read
            int_anyrd_2clear: bool = 4,
            /// Latch interrupt
            int1_latch_int_en: bool = 5,
            /// INT1 open drain
            int1_open: bool = 6,
            /// INT1 active low
            int1_actl: bool = 7,
        },

        /// INT_ENABLE - Interrupt Enable (Bank 0, 0x10)
        register IntEnable {
            const ADDRESS = 0x10;
            const SIZE_BITS = 8;
            const ALLOW_ADDRESS_OVERLAP = true;

            reserved_2_0: uint = 0..3,
            /// I2C master interrupt enable
            i2c_mst_int_en: bool = 3,
            /// DMP interrupt enable
            dmp_int1_en: bool = 4,
            /// PLL ready interrupt enable
            pll_rdy_en: bool = 5,
            /// Wake on motion interrupt enable
            wom_int_en: bool = 6,
            /// Wake on FSYNC interrupt enable
            reg_wof_en: bool = 7,
        },

        /// INT_ENABLE_1 - Interrupt Enable 1 (Bank 0, 0x11)
        register IntEnable1 {
            const ADDRESS = 0x11;
            const SIZE_BITS = 8;
            const ALLOW_ADDRESS_OVERLAP = true;

            /// Raw data ready interrupt enable
            raw_data_0_rdy_en: bool = 0,
            reserved_7_1: uint = 1..8,
        },

        /// INT_ENABLE_2 - Interrupt Enable 2 (Bank 0, 0x12)
        register IntEnable2 {
            const ADDRESS = 0x12;
            const SIZE_BITS = 8;
            const ALLOW_ADDRESS_OVERLAP = true;

            /// FIFO overflow interrupt enable (one bit per FIFO)
            fifo_overflow_en: uint = 0..5,
            reserved_7_5: uint = 5..8,
        },

        /// INT_ENABLE_3 - Interrupt Enable 3 (Bank 0, 0x13)
        register IntEnable3 {
            const ADDRESS = 0x13;
            const SIZE_BITS = 8;
            const ALLOW_ADDRESS_OVERLAP = true;

            /// FIFO watermark interrupt enable (one bit per FIFO)
            fifo_wm_en: uint = 0..5,
            reserved_7_5: uint = 5..8,
        },

        /// I2C_MST_STATUS - I2C Master Status (Bank 0, 0x17)
        /// Cleared on read
        register I2cMstStatus {
            const ADDRESS = 0x17;
            const SIZE_BITS = 8;
            const ALLOW_ADDRESS_OVERLAP = true;

            /// Slot 0-3 NACK flags
            i2c_slv_nack: uint = 0..4,
            /// Slot 4 NACK
            i2c_slv4_nack: bool = 4,
            /// Lost arbitration
            i2c_lost_arb: bool = 5,
            /// Slot 4 transfer done
            i2c_slv4_done: bool = 6,
            /// FSYNC pass through
            pass_through: bool = 7,
        },

        /// INT_STATUS_1 - Interrupt Status 1 (Bank 0, 0x1A)
        register IntStatus1 {
            const ADDRESS = 0x1A;
            const SIZE_BITS = 8;
            const ALLOW_ADDRESS_OVERLAP = true;

            /// Raw data ready interrupt
            raw_data_0_rdy_int: bool = 0,
            reserved_7_1: uint = 1..8,
        },

        /// FIFO_RST - FIFO Reset (Bank 0, 0x68)
        register FifoRst {
            const ADDRESS = 0x68;
            const SIZE_BITS = 8;
            const ALLOW_ADDRESS_OVERLAP = true;

            /// FIFO reset bits (one per FIFO)
            fifo_reset: uint = 0..5,
            reserved_7_5: uint = 5..8,
        },

        /// FIFO_MODE - FIFO Mode (Bank 0, 0x69)
        register FifoMode {
            const ADDRESS = 0x69;
            const SIZE_BITS = 8;
            const ALLOW_ADDRESS_OVERLAP = true;

            /// FIFO mode bits (one per FIFO, 1=snapshot)
            fifo_mode: uint = 0..5,
            reserved_7_5: uint = 5..8,
        },

        /// FIFO_COUNTH - FIFO Count High (Bank 0, 0x70)
        register FifoCounth {
            const ADDRESS = 0x70;
            const SIZE_BITS = 8;
            const ALLOW_ADDRESS_OVERLAP = true;

            /// FIFO count high bits (12:8)
            fifo_cnt_h: uint = 0..5,
            reserved_7_5: uint = 5..8,
        },

        /// FIFO_COUNTL - FIFO Count Low (Bank 0, 0x71)
        register FifoCountl {
            const ADDRESS = 0x71;
            const SIZE_BITS = 8;
            const ALLOW_ADDRESS_OVERLAP = true;

            /// FIFO count low byte (7:0)
            fifo_cnt_l: uint = 0..8,
        },

        /// MEM_START_ADDR - DMP Memory Start Address (Bank 0, 0x7C)
        register MemStartAddr {
            const ADDRESS = 0x7C;
            const SIZE_BITS = 8;
            const ALLOW_ADDRESS_OVERLAP = true;

            /// Offset within the selected DMP memory page
            mem_start_addr: uint = 0..8,
        },

        /// MEM_BANK_SEL - DMP Memory Bank Select (Bank 0, 0x7E)
        register MemBankSel {
            const ADDRESS = 0x7E;
            const SIZE_BITS = 8;
            const ALLOW_ADDRESS_OVERLAP = true;

            /// DMP memory page (address bits 15:8)
            mem_bank_sel: uint = 0..8,
        },

        /// REG_BANK_SEL - Register Bank Selection (All Banks, 0x7F)
        register RegBankSel {
            const ADDRESS = 0x7F;
            const SIZE_BITS = 8;
            const ALLOW_ADDRESS_OVERLAP = true;

            reserved_3_0: uint = 0..4,
            /// User bank selection (0-3, shifted left by 4 bits: 0x00, 0x10, 0x20, 0x30)
            user_bank: uint = 4..6,
            reserved_7_6: uint = 6..8,
        },

        // ==================== BANK 2 REGISTERS ====================

        /// PRGM_START_ADDRH - DMP Program Start Address High (Bank 2, 0x50)
        register Bank2PrgmStartAddrh {
            const ADDRESS = 0x50;
            const SIZE_BITS = 8;
            const ALLOW_ADDRESS_OVERLAP = true;

            /// DMP program start address high byte
            prgm_start_addrh: uint = 0..8,
        },

        /// PRGM_START_ADDRL - DMP Program Start Address Low (Bank 2, 0x51)
        register Bank2PrgmStartAddrl {
            const ADDRESS = 0x51;
            const SIZE_BITS = 8;
            const ALLOW_ADDRESS_OVERLAP = true;

            /// DMP program start address low byte
            prgm_start_addrl: uint = 0..8,
        },

        // ==================== BANK 3 REGISTERS ====================

        /// I2C_MST_CTRL (Bank 3, 0x01)
        register Bank3I2cMstCtrl {
            const ADDRESS = 0x01;
            const SIZE_BITS = 8;
            const ALLOW_ADDRESS_OVERLAP = true;

            /// I2C master clock speed
            i2c_mst_clk: uint = 0..4,
            /// Stop between reads instead of a repeated start
            i2c_mst_p_nsr: bool = 4,
            reserved_6_5: uint = 5..7,
            /// Multi-master enable
            mult_mst_en: bool = 7,
        },

        /// I2C_SLV4_ADDR (Bank 3, 0x13)
        register Bank3I2cSlv4Addr {
            const ADDRESS = 0x13;
            const SIZE_BITS = 8;
            const ALLOW_ADDRESS_OVERLAP = true;

            /// Target 7-bit address
            i2c_id_4: uint = 0..7,
            /// Direction (1=read, 0=write)
            i2c_slv4_rnw: bool = 7,
        },

        /// I2C_SLV4_REG (Bank 3, 0x14)
        register Bank3I2cSlv4Reg {
            const ADDRESS = 0x14;
            const SIZE_BITS = 8;
            const ALLOW_ADDRESS_OVERLAP = true;

            /// Target register
            i2c_slv4_reg: uint = 0..8,
        },

        /// I2C_SLV4_CTRL (Bank 3, 0x15)
        /// Writing with EN set starts one single-byte transfer
        register Bank3I2cSlv4Ctrl {
            const ADDRESS = 0x15;
            const SIZE_BITS = 8;
            const ALLOW_ADDRESS_OVERLAP = true;

            /// Master delay
            i2c_mst_dly: uint = 0..5,
            /// Data-only transfer (no register byte)
            i2c_slv4_reg_dis: bool = 5,
            /// Completion interrupt enable
            i2c_slv4_int_en: bool = 6,
            /// Start transfer
            i2c_slv4_en: bool = 7,
        },

        /// I2C_SLV4_DO (Bank 3, 0x16)
        register Bank3I2cSlv4Do {
            const ADDRESS = 0x16;
            const SIZE_BITS = 8;
            const ALLOW_ADDRESS_OVERLAP = true;

            /// Byte to write
            i2c_slv4_do: uint = 0..8,
        },

        /// I2C_SLV4_DI (Bank 3, 0x17)
        register Bank3I2cSlv4Di {
            const ADDRESS = 0x17;
            const SIZE_BITS = 8;
            const ALLOW_ADDRESS_OVERLAP = true;

            /// Byte read
            i2c_slv4_di: uint = 0..8,
        }
    }
);

pub use Icm20948 as RegisterDevice;

/// Raw addresses for burst and indexed access
pub mod raw {
    /// FIFO read/write window (Bank 0)
    pub const FIFO_R_W: u8 = 0x72;
    /// DMP memory read/write window (Bank 0)
    pub const MEM_R_W: u8 = 0x7D;
}

/// Peripheral slot 0-3 register layout (Bank 3)
///
/// Each slot occupies four consecutive registers starting at
/// `I2C_SLV0_ADDR + 4 * slot`.
pub mod slot {
    /// `I2C_SLV0_ADDR`
    pub const BASE: u8 = 0x03;
    /// Registers per slot
    pub const STRIDE: u8 = 4;
    /// Offset of `I2C_SLVx_ADDR`
    pub const ADDR: u8 = 0;
    /// Offset of `I2C_SLVx_REG`
    pub const REG: u8 = 1;
    /// Offset of `I2C_SLVx_CTRL`
    pub const CTRL: u8 = 2;
    /// Offset of `I2C_SLVx_DO`
    pub const DO: u8 = 3;

    /// `ADDR`: read direction
    pub const ADDR_RNW: u8 = 0x80;
    /// `CTRL`: transfer length mask
    pub const CTRL_LENG_MASK: u8 = 0x0F;
    /// `CTRL`: group byte pairs
    pub const CTRL_GRP: u8 = 0x10;
    /// `CTRL`: data-only transfer
    pub const CTRL_REG_DIS: u8 = 0x20;
    /// `CTRL`: swap bytes of each pair
    pub const CTRL_BYTE_SW: u8 = 0x40;
    /// `CTRL`: slot enable
    pub const CTRL_EN: u8 = 0x80;

    /// Address of register `offset` in `slot`
    pub const fn register(slot: u8, offset: u8) -> u8 {
        BASE + slot * STRIDE + offset
    }
}
