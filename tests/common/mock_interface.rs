//! Mock interface implementation for testing the ICM-20948 driver

use device_driver::RegisterInterface;
use icm20948_dmp::{Bank, Transport};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

/// Bank 0 addresses the mock gives special behaviour
pub mod addr {
    pub const WHO_AM_I: u8 = 0x00;
    pub const USER_CTRL: u8 = 0x03;
    pub const PWR_MGMT_1: u8 = 0x06;
    pub const INT_PIN_CFG: u8 = 0x0F;
    pub const INT_ENABLE: u8 = 0x10;
    pub const INT_ENABLE_1: u8 = 0x11;
    pub const INT_ENABLE_2: u8 = 0x12;
    pub const INT_ENABLE_3: u8 = 0x13;
    pub const I2C_MST_STATUS: u8 = 0x17;
    pub const INT_STATUS_1: u8 = 0x1A;
    pub const FIFO_RST: u8 = 0x68;
    pub const FIFO_MODE: u8 = 0x69;
    pub const FIFO_COUNTH: u8 = 0x70;
    pub const FIFO_COUNTL: u8 = 0x71;
    pub const FIFO_R_W: u8 = 0x72;
    pub const MEM_START_ADDR: u8 = 0x7C;
    pub const MEM_R_W: u8 = 0x7D;
    pub const MEM_BANK_SEL: u8 = 0x7E;
    pub const REG_BANK_SEL: u8 = 0x7F;

    // Bank 2
    pub const PRGM_START_ADDRH: u8 = 0x50;
    pub const PRGM_START_ADDRL: u8 = 0x51;

    // Bank 3
    pub const I2C_MST_CTRL: u8 = 0x01;
    pub const I2C_SLV4_ADDR: u8 = 0x13;
    pub const I2C_SLV4_REG: u8 = 0x14;
    pub const I2C_SLV4_CTRL: u8 = 0x15;
    pub const I2C_SLV4_DO: u8 = 0x16;
    pub const I2C_SLV4_DI: u8 = 0x17;
}

/// Records operations performed on the mock interface
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Read register operation
    ReadRegister {
        /// Bank where the register was read
        bank: Bank,
        /// Register address
        address: u8,
        /// Value that was returned
        value: u8,
    },
    /// Write register operation
    WriteRegister {
        /// Bank where the register was written
        bank: Bank,
        /// Register address
        address: u8,
        /// Value that was written
        value: u8,
    },
    /// Bank switch operation
    BankSwitch {
        /// Previous bank
        from: Bank,
        /// New bank
        to: Bank,
    },
}

/// How the simulated auxiliary bus answers slot-4 transfers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slv4Behaviour {
    /// Every transfer completes
    Complete,
    /// Transfer number `n` (1-based) is NACKed, the others complete
    NackOnArm(usize),
    /// Transfer number `n` (1-based) loses arbitration
    LostArbitrationOnArm(usize),
    /// No transfer ever completes
    NeverDone,
}

#[derive(Debug)]
struct MockState {
    /// Simulated register values (bank, address) -> value
    registers: HashMap<(Bank, u8), u8>,
    current_bank: Bank,
    operations: Vec<Operation>,

    fail_next_read: bool,
    fail_next_write: bool,
    fail_bank_switch: bool,
    /// Remaining injected failures per register
    write_failures: HashMap<(Bank, u8), usize>,

    /// FIFO bytes visible through FIFO_COUNTH/L
    fifo: VecDeque<u8>,
    /// FIFO bytes the DMP has not produced yet
    fifo_pending: VecDeque<u8>,

    slv4_behaviour: Slv4Behaviour,
    slv4_arms: usize,
    /// Registers of the simulated auxiliary peripheral
    peripheral: HashMap<u8, u8>,

    dmp_memory: Vec<u8>,
    /// DMP address whose read-back is corrupted
    corrupt_dmp_read: Option<u16>,
}

impl MockState {
    fn new() -> Self {
        let mut state = Self {
            registers: HashMap::new(),
            current_bank: Bank::Bank0,
            operations: Vec::new(),
            fail_next_read: false,
            fail_next_write: false,
            fail_bank_switch: false,
            write_failures: HashMap::new(),
            fifo: VecDeque::new(),
            fifo_pending: VecDeque::new(),
            slv4_behaviour: Slv4Behaviour::Complete,
            slv4_arms: 0,
            peripheral: HashMap::new(),
            dmp_memory: vec![0; 0x1_0000],
            corrupt_dmp_read: None,
        };

        state.registers.insert((Bank::Bank0, addr::WHO_AM_I), 0xEA);
        state.registers.insert((Bank::Bank0, addr::REG_BANK_SEL), 0x00);

        state
    }

    fn register(&self, bank: Bank, address: u8) -> u8 {
        self.registers.get(&(bank, address)).copied().unwrap_or(0)
    }

    fn dmp_address(&self) -> u16 {
        u16::from_be_bytes([
            self.register(Bank::Bank0, addr::MEM_BANK_SEL),
            self.register(Bank::Bank0, addr::MEM_START_ADDR),
        ])
    }

    /// Advance MEM_START_ADDR within the current page
    fn bump_dmp_offset(&mut self) {
        let offset = self.register(Bank::Bank0, addr::MEM_START_ADDR);
        self.registers
            .insert((Bank::Bank0, addr::MEM_START_ADDR), offset.wrapping_add(1));
    }

    fn read_byte(&mut self, bank: Bank, address: u8) -> u8 {
        match (bank, address) {
            (Bank::Bank0, addr::FIFO_COUNTH) => ((self.fifo.len() >> 8) & 0x1F) as u8,
            (Bank::Bank0, addr::FIFO_COUNTL) => (self.fifo.len() & 0xFF) as u8,
            (Bank::Bank0, addr::FIFO_R_W) => self.fifo.pop_front().unwrap_or(0xFF),
            (Bank::Bank0, addr::MEM_R_W) => {
                let at = self.dmp_address();
                let mut value = self.dmp_memory[usize::from(at)];
                if self.corrupt_dmp_read == Some(at) {
                    value ^= 0xFF;
                }
                self.bump_dmp_offset();
                value
            }
            (Bank::Bank0, addr::I2C_MST_STATUS) => {
                // Read-to-clear
                let value = self.register(bank, address);
                self.registers.insert((bank, address), 0);
                value
            }
            _ => self.register(bank, address),
        }
    }

    fn write_byte(&mut self, bank: Bank, address: u8, value: u8) {
        match (bank, address) {
            (Bank::Bank0, addr::MEM_R_W) => {
                let at = self.dmp_address();
                self.dmp_memory[usize::from(at)] = value;
                self.bump_dmp_offset();
            }
            (Bank::Bank3, addr::I2C_SLV4_CTRL) => {
                self.registers.insert((bank, address), value);
                if value & 0x80 != 0 {
                    self.simulate_slv4_transfer();
                }
            }
            _ => {
                self.registers.insert((bank, address), value);
            }
        }
    }

    fn simulate_slv4_transfer(&mut self) {
        self.slv4_arms += 1;
        let arm = self.slv4_arms;

        let status = match self.slv4_behaviour {
            Slv4Behaviour::NeverDone => return,
            Slv4Behaviour::NackOnArm(n) if n == arm => 0x10,
            Slv4Behaviour::LostArbitrationOnArm(n) if n == arm => 0x20,
            _ => 0x40,
        };

        if status == 0x40 {
            let target = self.register(Bank::Bank3, addr::I2C_SLV4_ADDR);
            let reg = self.register(Bank::Bank3, addr::I2C_SLV4_REG);
            if target & 0x80 != 0 {
                let value = self.peripheral.get(&reg).copied().unwrap_or(0);
                self.registers
                    .insert((Bank::Bank3, addr::I2C_SLV4_DI), value);
            } else {
                let value = self.register(Bank::Bank3, addr::I2C_SLV4_DO);
                self.peripheral.insert(reg, value);
            }
        }

        let current = self.register(Bank::Bank0, addr::I2C_MST_STATUS);
        self.registers
            .insert((Bank::Bank0, addr::I2C_MST_STATUS), current | status);
    }

    fn take_write_failure(&mut self, bank: Bank, address: u8) -> bool {
        match self.write_failures.get_mut(&(bank, address)) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }
}

/// Mock interface for testing
#[derive(Clone)]
pub struct MockInterface {
    state: Rc<RefCell<MockState>>,
}

#[allow(dead_code)]
impl MockInterface {
    /// Create a new mock interface with default register values
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(MockState::new())),
        }
    }

    /// Set a register value
    pub fn set_register(&self, bank: Bank, address: u8, value: u8) {
        self.state
            .borrow_mut()
            .registers
            .insert((bank, address), value);
    }

    /// Get a register value
    pub fn get_register(&self, bank: Bank, address: u8) -> u8 {
        self.state.borrow().register(bank, address)
    }

    /// Set WHO_AM_I register value
    pub fn set_who_am_i(&self, value: u8) {
        self.set_register(Bank::Bank0, addr::WHO_AM_I, value);
    }

    /// Bank the mock hardware has selected
    pub fn current_bank(&self) -> Bank {
        self.state.borrow().current_bank
    }

    /// Append bytes to the FIFO, visible immediately
    pub fn push_fifo(&self, bytes: &[u8]) {
        self.state.borrow_mut().fifo.extend(bytes.iter().copied());
    }

    /// Append bytes the FIFO will only show after [`release_fifo`](Self::release_fifo)
    pub fn push_fifo_pending(&self, bytes: &[u8]) {
        self.state
            .borrow_mut()
            .fifo_pending
            .extend(bytes.iter().copied());
    }

    /// Make `count` pending bytes visible
    pub fn release_fifo(&self, count: usize) {
        let mut state = self.state.borrow_mut();
        for _ in 0..count {
            match state.fifo_pending.pop_front() {
                Some(byte) => state.fifo.push_back(byte),
                None => break,
            }
        }
    }

    /// Bytes still visible in the FIFO
    pub fn fifo_len(&self) -> usize {
        self.state.borrow().fifo.len()
    }

    /// Set how slot-4 transfers complete
    pub fn set_slv4_behaviour(&self, behaviour: Slv4Behaviour) {
        let mut state = self.state.borrow_mut();
        state.slv4_behaviour = behaviour;
        state.slv4_arms = 0;
    }

    /// Number of slot-4 transfers armed so far
    pub fn slv4_arms(&self) -> usize {
        self.state.borrow().slv4_arms
    }

    /// Set a register of the simulated auxiliary peripheral
    pub fn set_peripheral_register(&self, register: u8, value: u8) {
        self.state.borrow_mut().peripheral.insert(register, value);
    }

    /// Get a register of the simulated auxiliary peripheral
    pub fn peripheral_register(&self, register: u8) -> Option<u8> {
        self.state.borrow().peripheral.get(&register).copied()
    }

    /// Copy of DMP memory
    pub fn dmp_memory(&self, address: u16, len: usize) -> Vec<u8> {
        let start = usize::from(address);
        self.state.borrow().dmp_memory[start..start + len].to_vec()
    }

    /// Fill DMP memory directly
    pub fn set_dmp_memory(&self, address: u16, bytes: &[u8]) {
        let start = usize::from(address);
        self.state.borrow_mut().dmp_memory[start..start + bytes.len()].copy_from_slice(bytes);
    }

    /// Corrupt reads of one DMP memory address
    pub fn corrupt_dmp_read(&self, address: u16) {
        self.state.borrow_mut().corrupt_dmp_read = Some(address);
    }

    /// Inject a read failure on the next read operation
    pub fn fail_next_read(&self) {
        self.state.borrow_mut().fail_next_read = true;
    }

    /// Inject a write failure on the next write operation
    pub fn fail_next_write(&self) {
        self.state.borrow_mut().fail_next_write = true;
    }

    /// Fail the next `count` writes to one register
    pub fn fail_writes_to(&self, bank: Bank, address: u8, count: usize) {
        self.state
            .borrow_mut()
            .write_failures
            .insert((bank, address), count);
    }

    /// Inject a bank switch failure
    pub fn fail_bank_switch(&self, enable: bool) {
        self.state.borrow_mut().fail_bank_switch = enable;
    }

    /// Get the operations log
    pub fn operations(&self) -> Vec<Operation> {
        self.state.borrow().operations.clone()
    }

    /// Clear the operations log
    pub fn clear_operations(&self) {
        self.state.borrow_mut().operations.clear();
    }

    /// Count bank switch operations
    pub fn bank_switch_count(&self) -> usize {
        self.state
            .borrow()
            .operations
            .iter()
            .filter(|op| matches!(op, Operation::BankSwitch { .. }))
            .count()
    }

    /// Values written to one register, in order
    pub fn writes_to(&self, bank: Bank, address: u8) -> Vec<u8> {
        self.state
            .borrow()
            .operations
            .iter()
            .filter_map(|op| match *op {
                Operation::WriteRegister {
                    bank: b,
                    address: a,
                    value,
                } if b == bank && a == address => Some(value),
                _ => None,
            })
            .collect()
    }

    /// Number of reads of one register
    pub fn reads_of(&self, bank: Bank, address: u8) -> usize {
        self.state
            .borrow()
            .operations
            .iter()
            .filter(|op| {
                matches!(op, Operation::ReadRegister { bank: b, address: a, .. } if *b == bank && *a == address)
            })
            .count()
    }
}

/// Mock error type
#[derive(Debug, Clone, PartialEq)]
pub enum MockError {
    /// Simulated communication error
    Communication,
    /// Simulated bank switch error
    BankSwitch,
}

/// FIFO and DMP memory data ports do not advance the register address
fn is_data_port(bank: Bank, address: u8) -> bool {
    bank == Bank::Bank0 && (address == addr::FIFO_R_W || address == addr::MEM_R_W)
}

impl RegisterInterface for MockInterface {
    type Error = MockError;
    type AddressType = u8;

    fn read_register(
        &mut self,
        address: Self::AddressType,
        _size_bits: u32,
        read_data: &mut [u8],
    ) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();

        if state.fail_next_read {
            state.fail_next_read = false;
            return Err(MockError::Communication);
        }

        if address == addr::REG_BANK_SEL {
            let current_bank = state.current_bank;
            read_data[0] = (current_bank as u8) << 4;
            state.operations.push(Operation::ReadRegister {
                bank: current_bank,
                address,
                value: read_data[0],
            });
            return Ok(());
        }

        let bank = state.current_bank;
        let port = is_data_port(bank, address);
        for (i, byte) in read_data.iter_mut().enumerate() {
            let reg_addr = if port {
                address
            } else {
                address.wrapping_add(i as u8)
            };
            *byte = state.read_byte(bank, reg_addr);
            state.operations.push(Operation::ReadRegister {
                bank,
                address: reg_addr,
                value: *byte,
            });
        }

        Ok(())
    }

    fn write_register(
        &mut self,
        address: Self::AddressType,
        _size_bits: u32,
        write_data: &[u8],
    ) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();

        if state.fail_next_write {
            state.fail_next_write = false;
            return Err(MockError::Communication);
        }

        if address == addr::REG_BANK_SEL {
            let new_bank = match (write_data[0] >> 4) & 0x03 {
                0 => Bank::Bank0,
                1 => Bank::Bank1,
                2 => Bank::Bank2,
                _ => Bank::Bank3,
            };

            if state.fail_bank_switch {
                return Err(MockError::BankSwitch);
            }

            let old_bank = state.current_bank;
            state.current_bank = new_bank;
            state.operations.push(Operation::BankSwitch {
                from: old_bank,
                to: new_bank,
            });
            state
                .registers
                .insert((Bank::Bank0, addr::REG_BANK_SEL), write_data[0]);

            return Ok(());
        }

        let bank = state.current_bank;
        if state.take_write_failure(bank, address) {
            return Err(MockError::Communication);
        }

        let port = is_data_port(bank, address);
        for (i, &byte) in write_data.iter().enumerate() {
            let reg_addr = if port {
                address
            } else {
                address.wrapping_add(i as u8)
            };
            state.write_byte(bank, reg_addr, byte);
            state.operations.push(Operation::WriteRegister {
                bank,
                address: reg_addr,
                value: byte,
            });
        }

        Ok(())
    }
}

impl Transport for MockInterface {}

impl Default for MockInterface {
    fn default() -> Self {
        Self::new()
    }
}
