//! Run-length decoding of compressed radials.
//!
//! A radial is a stream of little-endian 16-bit control words:
//!
//! - `1` ends the ray; any bins not yet produced are left missing
//! - negative: the next `(c & 0x7FFF) * 2` bytes are literal samples
//! - positive: `c * 2` samples of raw value 0
//! - `0` (or `0x8000`): an empty run
//!
//! The stream continues across record boundaries. A literal run cut by a
//! boundary resumes with its remaining bytes after the block header; every
//! other stop at a boundary resumes with a fresh control word.

use std::io::{Read, Seek};

use crate::cursor::RecordCursor;
use crate::error::{SigmetError, SigmetResult};

/// Control word that terminates a ray.
pub const END_OF_RAY: i16 = 1;

/// Receives decoded samples for one radial.
pub trait RadialSink {
    /// A literal sample at gate `index`.
    fn literal(&mut self, index: usize, byte: u8);

    /// `count` zero samples starting at gate `start`.
    fn zeros(&mut self, start: usize, count: usize);
}

/// Sink that discards samples. The scanner only needs to walk the stream.
#[derive(Debug, Default, Clone, Copy)]
pub struct SkipSink;

impl RadialSink for SkipSink {
    fn literal(&mut self, _index: usize, _byte: u8) {}

    fn zeros(&mut self, _start: usize, _count: usize) {}
}

/// Sink that keeps the raw bytes of a radial. Gates never written stay 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleBuffer {
    samples: Vec<u8>,
}

impl SampleBuffer {
    /// Zero-filled buffer for `bins` gates.
    pub fn new(bins: usize) -> Self {
        Self {
            samples: vec![0; bins],
        }
    }

    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<u8> {
        self.samples
    }
}

impl RadialSink for SampleBuffer {
    fn literal(&mut self, index: usize, byte: u8) {
        if let Some(slot) = self.samples.get_mut(index) {
            *slot = byte;
        }
    }

    fn zeros(&mut self, start: usize, count: usize) {
        let end = (start + count).min(self.samples.len());
        if start < end {
            self.samples[start..end].fill(0);
        }
    }
}

/// Why [`RunLengthDecoder::resume`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStatus {
    /// All bins produced. The control word after the ray is not consumed.
    Complete,
    /// A `1` control word ended the ray before all bins were produced.
    EndOfRay,
    /// The cursor reached a record boundary. Consume the block header and
    /// call `resume` again.
    RecordBoundary,
}

/// Resumable decoder state for one radial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunLengthDecoder {
    bins: usize,
    produced: usize,
    pending_literal: usize,
}

impl RunLengthDecoder {
    /// Decoder for a radial of `bins` gates starting at a control word.
    pub fn new(bins: usize) -> Self {
        Self::with_pending_literal(bins, 0)
    }

    /// Decoder whose stream starts with `bytes` literal samples that belong
    /// to an already-read control word.
    pub fn with_pending_literal(bins: usize, bytes: usize) -> Self {
        Self {
            bins,
            produced: 0,
            pending_literal: bytes,
        }
    }

    pub fn bins(&self) -> usize {
        self.bins
    }

    /// Gates produced so far.
    pub fn produced(&self) -> usize {
        self.produced
    }

    /// Literal bytes still owed by the current run.
    pub fn pending_literal(&self) -> usize {
        self.pending_literal
    }

    pub fn is_complete(&self) -> bool {
        self.produced >= self.bins && self.pending_literal == 0
    }

    /// Consume the bytes owed by the current literal run only.
    ///
    /// Returns `false` if a record boundary interrupted the run.
    pub fn drain_literal<R: Read + Seek>(
        &mut self,
        cursor: &mut RecordCursor<R>,
        sink: &mut impl RadialSink,
    ) -> SigmetResult<bool> {
        while self.pending_literal > 0 {
            if cursor.at_record_boundary() {
                return Ok(false);
            }
            if cursor.is_eof() {
                return Err(self.truncated(cursor.position()));
            }

            let available = cursor.remaining_in_record().min(cursor.len() - cursor.position());
            let chunk = (self.pending_literal as u64).min(available) as usize;
            let mut buf = vec![0u8; chunk];
            cursor.read_exact(&mut buf)?;
            for byte in buf {
                // Bytes past the last gate belong to the run but are dropped.
                if self.produced < self.bins {
                    sink.literal(self.produced, byte);
                    self.produced += 1;
                }
            }
            self.pending_literal -= chunk;
        }
        Ok(true)
    }

    /// Decode until the radial is complete, ends early, or a record
    /// boundary is reached.
    pub fn resume<R: Read + Seek>(
        &mut self,
        cursor: &mut RecordCursor<R>,
        sink: &mut impl RadialSink,
    ) -> SigmetResult<DecodeStatus> {
        loop {
            if !self.drain_literal(cursor, sink)? {
                return Ok(DecodeStatus::RecordBoundary);
            }
            if self.produced >= self.bins {
                return Ok(DecodeStatus::Complete);
            }
            if cursor.at_record_boundary() {
                return Ok(DecodeStatus::RecordBoundary);
            }
            if cursor.is_eof() {
                return Err(self.truncated(cursor.position()));
            }

            let control = cursor.read_i16()?;
            if control == END_OF_RAY {
                return Ok(DecodeStatus::EndOfRay);
            }
            if control < 0 {
                self.pending_literal = (control as u16 & 0x7fff) as usize * 2;
            } else if control > 0 {
                let count = (control as usize * 2).min(self.bins - self.produced);
                sink.zeros(self.produced, count);
                self.produced += count;
            }
        }
    }

    /// Error for a stream that ended before the radial was complete.
    pub fn truncated(&self, offset: u64) -> SigmetError {
        SigmetError::TruncatedRay {
            offset,
            produced: self.produced,
            bins: self.bins,
        }
    }
}
