//! Forward scan of the data records.
//!
//! [`RayBuilder`] walks every record after the two header records once,
//! building a [`Ray`] descriptor for each radial without keeping any
//! samples. The scan is a state machine: whenever a record boundary is
//! reached the block header of the next record is consumed and the
//! interrupted stage picks up where it stopped.

use std::collections::BTreeMap;
use std::io::{Read, Seek};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::angle::{angle16, azimuth_midpoint, elevation, gate_step};
use crate::cursor::{BlockHeader, RecordCursor, RECORD_SIZE};
use crate::error::{SigmetError, SigmetResult};
use crate::header::{IngestDataHeader, ProductHeader, INGEST_DATA_HEADER_SIZE};
use crate::ray::{even_bins, DataType, Ray, RayLocation};
use crate::rle::{DecodeStatus, RunLengthDecoder, SkipSink, END_OF_RAY};

/// First byte of the data records.
pub const DATA_START: u64 = 2 * RECORD_SIZE;

/// Words in the header at the start of each compressed ray.
const RAY_HEADER_WORDS: usize = 6;

/// Summary of one sweep taken from its ingest data headers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepInfo {
    /// 1-based sweep number
    pub sweep: i16,
    /// Seconds since midnight at sweep start
    pub base_time: i32,
    pub year: i16,
    pub month: i16,
    pub day: i16,
    pub start_time: Option<DateTime<Utc>>,
    /// Fixed angle of the sweep (degrees)
    pub fixed_angle: f32,
    pub bin_length: i16,
    /// Nominal rays per data type
    pub rays_in_sweep: i16,
    /// Ray slots over all data types
    pub ray_slots: usize,
    pub data_types: Vec<DataType>,
    /// Gates of the last ray decoded in the sweep
    pub gates: usize,
    /// Rays emitted, sentinels included
    pub rays_emitted: usize,
}

impl SweepInfo {
    fn from_headers(sweep: i16, headers: &[IngestDataHeader]) -> SigmetResult<Self> {
        let first = headers
            .first()
            .ok_or_else(|| SigmetError::invalid_header("sweep without ingest data headers"))?;
        let data_types = headers
            .iter()
            .map(IngestDataHeader::data_type)
            .collect::<SigmetResult<Vec<_>>>()?;
        let ray_slots = headers
            .iter()
            .map(|h| h.actual_rays.max(0) as usize)
            .sum();

        Ok(Self {
            sweep,
            base_time: first.base_time,
            year: first.year,
            month: first.month,
            day: first.day,
            start_time: first.start_time(),
            fixed_angle: angle16(first.sweep_angle),
            bin_length: first.bin_length,
            rays_in_sweep: first.rays_in_sweep,
            ray_slots,
            data_types,
            gates: 0,
            rays_emitted: 0,
        })
    }

    /// Data type of ray slot `slot`; slots cycle through the data types.
    pub fn data_type_for_slot(&self, slot: usize) -> SigmetResult<DataType> {
        let index = if self.data_types.len() > 1 {
            slot % self.data_types.len()
        } else {
            0
        };
        self.data_types
            .get(index)
            .copied()
            .ok_or_else(|| SigmetError::invalid_header("sweep has no data types"))
    }

    /// Timestamp of a ray of this sweep.
    pub fn ray_time(&self, ray: &Ray) -> Option<DateTime<Utc>> {
        if ray.is_sentinel() {
            return None;
        }
        crate::header::sweep_time(
            self.year,
            self.month,
            self.day,
            self.base_time + ray.time as i32,
        )
    }
}

/// Everything the scan produces.
#[derive(Debug, Clone, Default)]
pub struct ScanOutput {
    /// Rays per data type in scan order
    pub rays: BTreeMap<DataType, Vec<Ray>>,
    /// First non-sentinel ray in the file
    pub first_ray: Option<Ray>,
    /// Last non-sentinel ray in the file
    pub last_ray: Option<Ray>,
    pub sweeps: Vec<SweepInfo>,
}

impl ScanOutput {
    pub fn ray_count(&self) -> usize {
        self.rays.values().map(Vec::len).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    BlockHeader,
    IngestHeaders,
    CompressionPrefix,
    RayHeader,
    InlineData,
    Radial,
    RayTerminator,
    EmitRay,
    Finished,
}

/// State of the ray being scanned that must survive a record boundary.
#[derive(Debug, Clone, Default)]
struct PendingRay {
    /// begin az, begin elev, end az, end elev, bins, time
    fields: [i16; RAY_HEADER_WORDS],
    header_pos: usize,
    inline_bytes: usize,
    offset: Option<u64>,
    offset1: u64,
    decoder: Option<RunLengthDecoder>,
    ended_early: bool,
}

impl PendingRay {
    fn new(inline_bytes: usize) -> Self {
        Self {
            inline_bytes,
            ..Self::default()
        }
    }

    fn bins(&self) -> usize {
        even_bins(self.fields[4])
    }
}

/// Scans the data records of a volume.
pub struct RayBuilder<'a, R> {
    cursor: &'a mut RecordCursor<R>,
    header: &'a ProductHeader,
    stage: Stage,
    resume: Stage,
    block: BlockHeader,
    sweep: Option<SweepInfo>,
    slot: usize,
    ray: PendingRay,
    output: ScanOutput,
}

impl<'a, R: Read + Seek> RayBuilder<'a, R> {
    pub fn new(cursor: &'a mut RecordCursor<R>, header: &'a ProductHeader) -> Self {
        Self {
            cursor,
            header,
            stage: Stage::BlockHeader,
            resume: Stage::IngestHeaders,
            block: BlockHeader::default(),
            sweep: None,
            slot: 0,
            ray: PendingRay::default(),
            output: ScanOutput::default(),
        }
    }

    /// Run the scan to completion.
    pub fn scan(mut self) -> SigmetResult<ScanOutput> {
        if self.header.number_sweeps == 0 {
            warn!("Volume header declares no sweeps");
            return Ok(self.output);
        }

        self.cursor.seek(DATA_START)?;
        loop {
            self.stage = match self.stage {
                Stage::BlockHeader => self.read_block_header()?,
                Stage::IngestHeaders => self.read_ingest_headers()?,
                Stage::CompressionPrefix => self.read_compression_prefix()?,
                Stage::RayHeader => self.read_ray_header()?,
                Stage::InlineData => self.read_inline_data()?,
                Stage::Radial => self.decode_radial()?,
                Stage::RayTerminator => self.read_ray_terminator()?,
                Stage::EmitRay => self.emit_ray()?,
                Stage::Finished => break,
            };
        }

        if let Some(sweep) = self.sweep.take() {
            self.output.sweeps.push(sweep);
        }
        debug!(
            sweeps = self.output.sweeps.len(),
            rays = self.output.ray_count(),
            "Scan complete"
        );
        Ok(self.output)
    }

    /// Suspend `stage` until the next block header has been read.
    fn interrupt(&mut self, stage: Stage) -> Stage {
        self.resume = stage;
        Stage::BlockHeader
    }

    fn read_block_header(&mut self) -> SigmetResult<Stage> {
        if self.cursor.is_eof() {
            return self.end_of_file();
        }

        self.block = self.cursor.read_block_header()?;
        Ok(self.resume)
    }

    /// End of file on a record boundary. Only fatal inside a ray.
    fn end_of_file(&mut self) -> SigmetResult<Stage> {
        let offset = self.cursor.position();
        match self.resume {
            Stage::RayHeader => {
                let remaining = (RAY_HEADER_WORDS - self.ray.header_pos) * 2;
                Err(SigmetError::truncated(offset, remaining))
            }
            Stage::InlineData | Stage::Radial => Err(match self.ray.decoder.as_ref() {
                Some(decoder) => decoder.truncated(offset),
                None => SigmetError::TruncatedRay {
                    offset,
                    produced: 0,
                    bins: self.ray.bins(),
                },
            }),
            Stage::RayTerminator => {
                warn!(offset, "End of file in place of ray terminator");
                Ok(Stage::EmitRay)
            }
            _ => {
                let sweeps = self.output.sweeps.len() + usize::from(self.sweep.is_some());
                if self.resume != Stage::IngestHeaders
                    || sweeps < self.header.number_sweeps as usize
                {
                    warn!(
                        offset,
                        sweeps,
                        expected = self.header.number_sweeps,
                        "End of file before the last sweep was complete"
                    );
                }
                Ok(Stage::Finished)
            }
        }
    }

    fn read_ingest_headers(&mut self) -> SigmetResult<Stage> {
        let nparams = self.header.nparams;
        if self.cursor.crosses_boundary(nparams * INGEST_DATA_HEADER_SIZE) {
            return Err(SigmetError::truncated(
                self.cursor.position(),
                nparams * INGEST_DATA_HEADER_SIZE,
            ));
        }

        let mut headers = Vec::with_capacity(nparams);
        for _ in 0..nparams {
            headers.push(IngestDataHeader::read(self.cursor)?);
        }
        let info = SweepInfo::from_headers(self.block.sweep, &headers)?;
        debug!(
            sweep = info.sweep,
            slots = info.ray_slots,
            data_types = ?info.data_types,
            offset = self.cursor.position(),
            "Sweep start"
        );

        if let Some(previous) = self.sweep.replace(info) {
            self.output.sweeps.push(previous);
        }
        self.slot = 0;

        if self.sweep.as_ref().map_or(0, |s| s.ray_slots) == 0 {
            return self.finish_sweep();
        }
        Ok(Stage::CompressionPrefix)
    }

    fn read_compression_prefix(&mut self) -> SigmetResult<Stage> {
        if self.cursor.at_record_boundary() {
            return Ok(self.interrupt(Stage::CompressionPrefix));
        }

        let offset = self.cursor.position();
        let control = self.cursor.read_i16()?;
        if control == END_OF_RAY {
            // Empty slot
            return self.next_slot();
        }

        let words = (control as u16 & 0x7fff) as usize;
        if words < RAY_HEADER_WORDS {
            return Err(SigmetError::InvalidRayPrefix { offset, words });
        }
        self.ray = PendingRay::new((words - RAY_HEADER_WORDS) * 2);
        Ok(Stage::RayHeader)
    }

    fn read_ray_header(&mut self) -> SigmetResult<Stage> {
        while self.ray.header_pos < RAY_HEADER_WORDS {
            if self.cursor.at_record_boundary() {
                return Ok(self.interrupt(Stage::RayHeader));
            }
            self.ray.fields[self.ray.header_pos] = self.cursor.read_i16()?;
            self.ray.header_pos += 1;
        }
        Ok(Stage::InlineData)
    }

    fn read_inline_data(&mut self) -> SigmetResult<Stage> {
        if self.ray.offset.is_none() {
            if self.cursor.at_record_boundary() {
                return Ok(self.interrupt(Stage::InlineData));
            }
            self.ray.offset = Some(self.cursor.position());
            self.ray.decoder = Some(RunLengthDecoder::with_pending_literal(
                self.ray.bins(),
                self.ray.inline_bytes,
            ));
        }

        let Some(decoder) = self.ray.decoder.as_mut() else {
            return Ok(Stage::Radial);
        };
        if !decoder.drain_literal(self.cursor, &mut SkipSink)? {
            return Ok(self.interrupt(Stage::InlineData));
        }
        if self.cursor.at_record_boundary() {
            return Ok(self.interrupt(Stage::InlineData));
        }
        self.ray.offset1 = self.cursor.position();
        Ok(Stage::Radial)
    }

    fn decode_radial(&mut self) -> SigmetResult<Stage> {
        let bins = self.ray.bins();
        let decoder = self
            .ray
            .decoder
            .get_or_insert_with(|| RunLengthDecoder::new(bins));
        match decoder.resume(self.cursor, &mut SkipSink)? {
            DecodeStatus::Complete => Ok(Stage::RayTerminator),
            DecodeStatus::EndOfRay => {
                self.ray.ended_early = true;
                Ok(Stage::EmitRay)
            }
            DecodeStatus::RecordBoundary => Ok(self.interrupt(Stage::Radial)),
        }
    }

    fn read_ray_terminator(&mut self) -> SigmetResult<Stage> {
        if self.cursor.is_eof() {
            warn!(
                offset = self.cursor.position(),
                "End of file in place of ray terminator"
            );
            return Ok(Stage::EmitRay);
        }
        if self.cursor.at_record_boundary() {
            return Ok(self.interrupt(Stage::RayTerminator));
        }

        let offset = self.cursor.position();
        let word = self.cursor.read_i16()?;
        if word != END_OF_RAY {
            warn!(offset, word, "Unexpected word after complete ray");
        }
        Ok(Stage::EmitRay)
    }

    fn emit_ray(&mut self) -> SigmetResult<Stage> {
        let info = self
            .sweep
            .as_mut()
            .ok_or_else(|| SigmetError::invalid_header("ray data before sweep headers"))?;
        let data_type = info.data_type_for_slot(self.slot)?;
        let bins = self.ray.bins();
        let sweep = self.block.sweep;

        let ray = if self.ray.ended_early {
            Ray::sentinel(bins, sweep, data_type)
        } else {
            let fields = self.ray.fields;
            let range_first = self.header.range_first_m();
            let range_last = self.header.range_last_m();
            let gate_bins = i16::try_from(bins).unwrap_or(i16::MAX);
            Ray {
                range: range_first,
                step: gate_step(range_first, range_last, gate_bins),
                azimuth: azimuth_midpoint(fields[0], fields[2]),
                elevation: elevation(fields[3]),
                bins,
                time: fields[5],
                data_type,
                sweep,
                location: Some(RayLocation {
                    offset: self.ray.offset.unwrap_or(self.ray.offset1),
                    data_read: self.ray.inline_bytes,
                    offset1: self.ray.offset1,
                }),
            }
        };

        info.rays_emitted += 1;
        if !ray.is_sentinel() {
            info.gates = bins;
            if self.output.first_ray.is_none() {
                self.output.first_ray = Some(ray);
            }
            self.output.last_ray = Some(ray);
        }
        self.output.rays.entry(data_type).or_default().push(ray);

        self.next_slot()
    }

    fn next_slot(&mut self) -> SigmetResult<Stage> {
        self.slot += 1;
        let slots = self.sweep.as_ref().map_or(0, |s| s.ray_slots);
        if self.slot < slots {
            return Ok(Stage::CompressionPrefix);
        }
        self.finish_sweep()
    }

    /// The current sweep has no more ray slots. Stop after the last sweep,
    /// otherwise continue with the next record.
    fn finish_sweep(&mut self) -> SigmetResult<Stage> {
        if let Some(info) = self.sweep.as_ref() {
            debug!(
                sweep = info.sweep,
                rays = info.rays_emitted,
                offset = self.cursor.position(),
                "Sweep complete"
            );
        }

        if self.block.sweep >= self.header.number_sweeps {
            return Ok(Stage::Finished);
        }
        let next = self.cursor.next_record_start();
        self.cursor.seek(next)?;
        Ok(self.interrupt(Stage::IngestHeaders))
    }
}
