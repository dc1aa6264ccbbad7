//! Table-driven DMP FIFO stream decoder
//!
//! [`DmpDecoder::decode`] pulls one record out of a [`FifoSource`]. The hardware FIFO
//! may hold only part of a record; the decoder then returns
//! [`DmpReadOutcome::Incomplete`] and keeps the bytes it already pulled in a staging
//! buffer. The next call re-parses the record from its first header byte, so a
//! record delivered in several pieces decodes exactly as if it had arrived at once.
//!
//! Availability is tracked as the number of known-unparsed bytes: staged bytes not
//! yet parsed plus the last FIFO count. Before each piece (header, secondary header,
//! field, footer) the decoder checks that the piece fits. If it does not, the FIFO
//! count is queried once more; if it still does not fit, the attempt stops.

use heapless::Vec;

use super::layout::{
    FOOTER_LEN, FieldKind, FieldSpec, HEADER2_LEN, HEADER_LEN, HeaderBits, MAX_RECORD_LEN,
    PRIMARY_FIELDS, SECONDARY_FIELDS, max_record_len,
};
use super::record::{DmpField, DmpRecord};
use crate::status::Status;

/// Byte source the decoder pulls from
///
/// The driver implements this over `FIFO_COUNTH/L` and `FIFO_R_W`.
pub trait FifoSource {
    /// Error type of the source
    type Error;

    /// Number of bytes currently readable
    ///
    /// # Errors
    ///
    /// Returns an error if the count cannot be read.
    fn fifo_count(&mut self) -> Result<u16, Self::Error>;

    /// Read exactly `buffer.len()` bytes
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes cannot be read.
    fn read_fifo(&mut self, buffer: &mut [u8]) -> Result<(), Self::Error>;
}

impl<S: FifoSource + ?Sized> FifoSource for &mut S {
    type Error = S::Error;

    fn fifo_count(&mut self) -> Result<u16, Self::Error> {
        (**self).fifo_count()
    }

    fn read_fifo(&mut self, buffer: &mut [u8]) -> Result<(), Self::Error> {
        (**self).read_fifo(buffer)
    }
}

/// Piece of a record the decoder was waiting for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeStage {
    /// The 2-byte primary header
    PrimaryHeader,
    /// The 2-byte secondary header
    SecondaryHeader,
    /// A field payload
    Field(FieldKind),
    /// The 2-byte footer
    Footer,
}

/// Result of one decode attempt
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DmpReadOutcome {
    /// A record was decoded and nothing else is known to be waiting
    Complete(DmpRecord),
    /// A record was decoded and more bytes are already waiting
    MoreAvailable(DmpRecord),
    /// The FIFO does not hold the rest of the record yet
    Incomplete(DecodeStage),
}

impl DmpReadOutcome {
    /// Status code of this outcome
    pub const fn status(&self) -> Status {
        match self {
            Self::Complete(_) => Status::Ok,
            Self::MoreAvailable(_) => Status::FifoMoreDataAvailable,
            Self::Incomplete(_) => Status::FifoNoDataAvailable,
        }
    }

    /// The decoded record, if any
    pub const fn record(&self) -> Option<&DmpRecord> {
        match self {
            Self::Complete(record) | Self::MoreAvailable(record) => Some(record),
            Self::Incomplete(_) => None,
        }
    }

    /// Take the decoded record, if any
    pub fn into_record(self) -> Option<DmpRecord> {
        match self {
            Self::Complete(record) | Self::MoreAvailable(record) => Some(record),
            Self::Incomplete(_) => None,
        }
    }
}

/// Parse position within the staged bytes
struct Cursor {
    pos: usize,
    remaining: usize,
}

/// DMP record decoder
#[derive(Debug, Clone)]
pub struct DmpDecoder {
    primary: &'static [FieldSpec],
    secondary: &'static [FieldSpec],
    staging: Vec<u8, MAX_RECORD_LEN>,
}

impl Default for DmpDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl DmpDecoder {
    /// Decoder for the ICM-20948 DMP record layout
    pub const fn new() -> Self {
        Self {
            primary: PRIMARY_FIELDS,
            secondary: SECONDARY_FIELDS,
            staging: Vec::new(),
        }
    }

    /// Decoder for a custom pair of layout tables
    ///
    /// Returns `None` if the longest record the tables can describe does not fit the
    /// staging buffer.
    pub fn with_layout(primary: &'static [FieldSpec], secondary: &'static [FieldSpec]) -> Option<Self> {
        if max_record_len(primary, secondary) > MAX_RECORD_LEN {
            return None;
        }
        Some(Self {
            primary,
            secondary,
            staging: Vec::new(),
        })
    }

    /// Drop any partially received record
    ///
    /// Call after resetting the FIFO or to resynchronise after a transport error.
    pub fn discard(&mut self) {
        self.staging.clear();
    }

    /// Bytes of the current record already pulled from the FIFO
    pub fn staged_len(&self) -> usize {
        self.staging.len()
    }

    /// Decode one record from `source`
    ///
    /// # Errors
    ///
    /// Returns the source error if the FIFO count or a FIFO read fails. Staged bytes
    /// are kept, but the hardware may have consumed part of a failed read; call
    /// [`discard`](Self::discard) and reset the FIFO to resynchronise.
    pub fn decode<S: FifoSource + ?Sized>(
        &mut self,
        source: &mut S,
    ) -> Result<DmpReadOutcome, S::Error> {
        let mut cursor = Cursor {
            pos: 0,
            remaining: self.staging.len(),
        };
        let mut record = DmpRecord::default();

        let Some(at) = self.pull(source, &mut cursor, HEADER_LEN)? else {
            return Ok(DmpReadOutcome::Incomplete(DecodeStage::PrimaryHeader));
        };
        record.header = self.be_u16(at);

        if record.header & HeaderBits::HEADER2 != 0 {
            let Some(at) = self.pull(source, &mut cursor, HEADER2_LEN)? else {
                return Ok(DmpReadOutcome::Incomplete(DecodeStage::SecondaryHeader));
            };
            record.header2 = self.be_u16(at);
        }

        let passes = [
            (self.primary, record.header),
            (self.secondary, record.header2),
        ];
        for (table, header) in passes {
            for spec in table.iter().filter(|spec| header & spec.bit() != 0) {
                let kind = spec.kind();
                let Some(at) = self.pull(source, &mut cursor, kind.len())? else {
                    return Ok(DmpReadOutcome::Incomplete(DecodeStage::Field(kind)));
                };
                record.set(DmpField::from_wire(kind, &self.staging[at..]));
            }
        }

        let Some(at) = self.pull(source, &mut cursor, FOOTER_LEN)? else {
            return Ok(DmpReadOutcome::Incomplete(DecodeStage::Footer));
        };
        record.footer = self.be_u16(at);

        #[cfg(feature = "defmt")]
        defmt::trace!(
            "DMP record: header=0x{:04X} header2=0x{:04X} len={}",
            record.header,
            record.header2,
            self.staging.len()
        );

        self.staging.clear();

        if cursor.remaining > 0 {
            Ok(DmpReadOutcome::MoreAvailable(record))
        } else {
            Ok(DmpReadOutcome::Complete(record))
        }
    }

    /// Make `len` bytes available at the cursor and advance past them
    ///
    /// Returns the staging offset of the piece, or `None` if the FIFO does not hold
    /// enough bytes yet.
    fn pull<S: FifoSource + ?Sized>(
        &mut self,
        source: &mut S,
        cursor: &mut Cursor,
        len: usize,
    ) -> Result<Option<usize>, S::Error> {
        if cursor.remaining < len {
            let unparsed = self.staging.len() - cursor.pos;
            cursor.remaining = unparsed + usize::from(source.fifo_count()?);
            if cursor.remaining < len {
                return Ok(None);
            }
        }

        let start = cursor.pos;
        let end = start + len;
        let staged = self.staging.len();
        if end > staged {
            // Capacity is guaranteed by the layout check in `with_layout`
            if self.staging.resize(end, 0).is_err() {
                return Ok(None);
            }
            if let Err(error) = source.read_fifo(&mut self.staging[staged..end]) {
                self.staging.truncate(staged);
                return Err(error);
            }
        }

        cursor.pos = end;
        cursor.remaining -= len;
        Ok(Some(start))
    }

    fn be_u16(&self, at: usize) -> u16 {
        u16::from_be_bytes([self.staging[at], self.staging[at + 1]])
    }
}
