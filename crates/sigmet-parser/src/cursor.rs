//! Record-aware reader over a SIGMET file.
//!
//! A SIGMET raw volume is a sequence of fixed 6144-byte records. Records
//! from the third onward start with a 12-byte block header, and no
//! primitive field is allowed to straddle a record boundary.

use std::io::{Read, Seek, SeekFrom};

use crate::error::{SigmetError, SigmetResult};

/// Size of every record in the file.
pub const RECORD_SIZE: u64 = 6144;

/// Size of the block header at the start of each data record.
pub const BLOCK_HEADER_SIZE: u64 = 12;

/// Header at the start of every data record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockHeader {
    /// Record number (0-based index of the record in the file)
    pub record: i16,
    /// Sweep number the record belongs to (1-based)
    pub sweep: i16,
    /// Byte offset of the first ray in this record
    pub first_ray_offset: i16,
    /// Number of rays starting in this record
    pub ray_count: i16,
}

/// Little-endian cursor over a record-structured source.
#[derive(Debug)]
pub struct RecordCursor<R> {
    inner: R,
    position: u64,
    len: u64,
}

impl<R: Read + Seek> RecordCursor<R> {
    /// Wrap a source, measuring its length and rewinding to the start.
    pub fn new(mut inner: R) -> SigmetResult<Self> {
        let len = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(0))?;
        Ok(Self {
            inner,
            position: 0,
            len,
        })
    }

    /// Total length of the source in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Whether the source is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of complete or partial records in the source.
    pub fn record_count(&self) -> u64 {
        self.len.div_ceil(RECORD_SIZE)
    }

    /// Current absolute byte position.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Whether the position has reached the end of the source.
    pub fn is_eof(&self) -> bool {
        self.position >= self.len
    }

    /// Move to an absolute byte position.
    pub fn seek(&mut self, pos: u64) -> SigmetResult<()> {
        self.inner.seek(SeekFrom::Start(pos))?;
        self.position = pos;
        Ok(())
    }

    /// Whether the position sits exactly on a record boundary.
    pub fn at_record_boundary(&self) -> bool {
        self.position % RECORD_SIZE == 0
    }

    /// Bytes left before the next record boundary.
    pub fn remaining_in_record(&self) -> u64 {
        RECORD_SIZE - self.position % RECORD_SIZE
    }

    /// Whether reading `n` bytes from here would cross a record boundary.
    pub fn crosses_boundary(&self, n: usize) -> bool {
        self.position % RECORD_SIZE + n as u64 > RECORD_SIZE
    }

    /// Start of the record after the one containing the position. A
    /// position already on a boundary is its own next record.
    pub fn next_record_start(&self) -> u64 {
        self.position.div_ceil(RECORD_SIZE) * RECORD_SIZE
    }

    /// Fill `buf` from the current position within one record.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> SigmetResult<()> {
        if self.crosses_boundary(buf.len()) || self.position + buf.len() as u64 > self.len {
            return Err(SigmetError::truncated(self.position, buf.len()));
        }
        self.inner.read_exact(buf).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                SigmetError::truncated(self.position, buf.len())
            } else {
                SigmetError::IoError(e)
            }
        })?;
        self.position += buf.len() as u64;
        Ok(())
    }

    /// Read one byte.
    pub fn read_u8(&mut self) -> SigmetResult<u8> {
        let mut buf = [0u8; 1];
        self.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    /// Read a little-endian 16-bit signed integer.
    pub fn read_i16(&mut self) -> SigmetResult<i16> {
        let mut buf = [0u8; 2];
        self.read_exact(&mut buf)?;
        Ok(i16::from_le_bytes(buf))
    }

    /// Read a little-endian 32-bit signed integer.
    pub fn read_i32(&mut self) -> SigmetResult<i32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(i32::from_le_bytes(buf))
    }

    /// Advance by `n` bytes within the current record.
    pub fn skip(&mut self, n: u64) -> SigmetResult<()> {
        if n > self.remaining_in_record() {
            return Err(SigmetError::truncated(self.position, n as usize));
        }
        self.seek(self.position + n)
    }

    /// Read the 12-byte header at the start of a data record.
    pub fn read_block_header(&mut self) -> SigmetResult<BlockHeader> {
        let mut buf = [0u8; BLOCK_HEADER_SIZE as usize];
        self.read_exact(&mut buf)?;
        Ok(BlockHeader {
            record: i16::from_le_bytes([buf[0], buf[1]]),
            sweep: i16::from_le_bytes([buf[2], buf[3]]),
            first_ray_offset: i16::from_le_bytes([buf[4], buf[5]]),
            ray_count: i16::from_le_bytes([buf[6], buf[7]]),
        })
    }

    /// Consume a block header if the position is on a record boundary.
    /// Returns whether one was consumed.
    pub fn skip_block_header(&mut self) -> SigmetResult<bool> {
        if !self.at_record_boundary() {
            return Ok(false);
        }
        self.read_block_header()?;
        Ok(true)
    }

    /// Read a fixed-width text field, trimming NUL padding and spaces.
    pub fn read_string(&mut self, width: usize) -> SigmetResult<String> {
        let mut buf = vec![0u8; width];
        self.read_exact(&mut buf)?;
        let end = buf.iter().position(|&b| b == 0).unwrap_or(width);
        Ok(String::from_utf8_lossy(&buf[..end]).trim().to_string())
    }

    /// Read a 16-bit value at an absolute position.
    pub fn read_i16_at(&mut self, pos: u64) -> SigmetResult<i16> {
        self.seek(pos)?;
        self.read_i16()
    }

    /// Read a 32-bit value at an absolute position.
    pub fn read_i32_at(&mut self, pos: u64) -> SigmetResult<i32> {
        self.seek(pos)?;
        self.read_i32()
    }

    /// Give back the underlying source.
    pub fn into_inner(self) -> R {
        self.inner
    }
}
