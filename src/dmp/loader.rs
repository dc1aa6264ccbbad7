//! DMP memory transfer planning
//!
//! DMP memory is reached through three Bank 0 registers:
//! - `MEM_BANK_SEL` (0x7E): selects a 256-byte page
//! - `MEM_START_ADDR` (0x7C): sets the offset within the page
//! - `MEM_R_W` (0x7D): data port, auto-incrementing
//!
//! The auto-increment does not carry into the next page, so a transfer is split into
//! chunks that never cross a page boundary and never exceed [`MAX_TRANSFER`] bytes.

/// DMP memory address the firmware image is loaded at
pub const DMP_LOAD_START: u16 = 0x0090;

/// DMP program start address written to `PRGM_START_ADDRH/L` after loading
pub const DMP_START_ADDRESS: u16 = 0x1000;

/// Largest single burst through `MEM_R_W`
pub const MAX_TRANSFER: usize = 16;

/// Size of one DMP memory page
pub const PAGE_SIZE: usize = 256;

/// Size of the addressable DMP memory
pub const MEMORY_SIZE: usize = 0x1_0000;

/// One page-safe burst
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MemoryChunk {
    /// Page (`MEM_BANK_SEL`)
    pub page: u8,
    /// Offset within the page (`MEM_START_ADDR`)
    pub offset: u8,
    /// Offset of the chunk within the caller's buffer
    pub start: usize,
    /// Chunk length
    pub len: usize,
}

impl MemoryChunk {
    /// Range of the chunk within the caller's buffer
    pub const fn range(&self) -> core::ops::Range<usize> {
        self.start..self.start + self.len
    }
}

/// Iterator over the page-safe bursts of a transfer
#[derive(Debug, Clone)]
pub struct MemoryChunks {
    address: usize,
    done: usize,
    len: usize,
}

impl Iterator for MemoryChunks {
    type Item = MemoryChunk;

    fn next(&mut self) -> Option<MemoryChunk> {
        if self.done >= self.len {
            return None;
        }

        let address = self.address + self.done;
        let to_page_end = PAGE_SIZE - (address % PAGE_SIZE);
        let len = (self.len - self.done).min(MAX_TRANSFER).min(to_page_end);

        let chunk = MemoryChunk {
            page: u8::try_from(address / PAGE_SIZE).ok()?,
            offset: u8::try_from(address % PAGE_SIZE).ok()?,
            start: self.done,
            len,
        };
        self.done += len;
        Some(chunk)
    }
}

/// True if `len` bytes starting at `address` lie inside DMP memory
pub fn fits(address: u16, len: usize) -> bool {
    usize::from(address)
        .checked_add(len)
        .is_some_and(|end| end <= MEMORY_SIZE)
}

/// Split a transfer of `len` bytes at `address` into page-safe bursts
///
/// Bursts past the end of DMP memory are not produced; check [`fits`] first.
pub fn chunks(address: u16, len: usize) -> MemoryChunks {
    MemoryChunks {
        address: usize::from(address),
        done: 0,
        len,
    }
}
