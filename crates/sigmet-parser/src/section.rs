//! On-demand decoding of (sweep × radial × gate) sections.

use std::io::{Read, Seek};

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::assembler::SweepGroups;
use crate::calibration::CalibrationContext;
use crate::cursor::RecordCursor;
use crate::error::{SigmetError, SigmetResult};
use crate::ray::Ray;
use crate::rle::{DecodeStatus, RunLengthDecoder, SampleBuffer};

/// Inclusive index range with a stride, iterated in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionRange {
    pub first: usize,
    pub last: usize,
    pub stride: usize,
}

impl SectionRange {
    pub fn new(first: usize, last: usize, stride: usize) -> SigmetResult<Self> {
        let range = Self {
            first,
            last,
            stride,
        };
        range.validate()?;
        Ok(range)
    }

    /// Every index from `first` to `last`.
    pub fn span(first: usize, last: usize) -> SigmetResult<Self> {
        Self::new(first, last, 1)
    }

    /// A single index.
    pub fn single(index: usize) -> Self {
        Self {
            first: index,
            last: index,
            stride: 1,
        }
    }

    pub fn validate(&self) -> SigmetResult<()> {
        if self.stride == 0 {
            return Err(SigmetError::invalid_range("stride must be > 0"));
        }
        if self.first > self.last {
            return Err(SigmetError::invalid_range(format!(
                "first {} is after last {}",
                self.first, self.last
            )));
        }
        Ok(())
    }

    /// Number of indices in the range.
    pub fn len(&self) -> usize {
        if self.is_empty() {
            return 0;
        }
        (self.last - self.first) / self.stride + 1
    }

    /// An invalid range selects nothing.
    pub fn is_empty(&self) -> bool {
        self.stride == 0 || self.first > self.last
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> {
        (self.first..=self.last)
            .step_by(self.stride.max(1))
            .take(self.len())
    }

    /// Parse `first:last[:stride]` or a single index.
    pub fn parse(s: &str) -> SigmetResult<Self> {
        let parts: Vec<&str> = s.split(':').map(str::trim).collect();
        let number = |p: &str| {
            p.parse::<usize>()
                .map_err(|_| SigmetError::invalid_range(format!("invalid index '{p}' in '{s}'")))
        };
        match parts.as_slice() {
            [index] => Ok(Self::single(number(index)?)),
            [first, last] => Self::span(number(first)?, number(last)?),
            [first, last, stride] => Self::new(number(first)?, number(last)?, number(stride)?),
            _ => Err(SigmetError::invalid_range(format!(
                "expected first:last[:stride], got '{s}'"
            ))),
        }
    }
}

/// A request for decoded values.
///
/// Sweep indices are 0-based: index `i` selects sweep number `i + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub sweeps: SectionRange,
    pub radials: SectionRange,
    pub gates: SectionRange,
}

impl Section {
    pub fn shape(&self) -> [usize; 3] {
        [self.sweeps.len(), self.radials.len(), self.gates.len()]
    }
}

/// Decoded values in row-major (sweep, radial, gate) order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionData {
    pub shape: [usize; 3],
    pub values: Vec<f32>,
}

impl SectionData {
    /// Value at a position within the section.
    pub fn get(&self, sweep: usize, radial: usize, gate: usize) -> Option<f32> {
        let [_, radials, gates] = self.shape;
        if sweep >= self.shape[0] || radial >= radials || gate >= gates {
            return None;
        }
        self.values.get((sweep * radials + radial) * gates + gate).copied()
    }

    /// All gate values of one radial.
    pub fn radial(&self, sweep: usize, radial: usize) -> Option<&[f32]> {
        let [sweeps, radials, gates] = self.shape;
        if sweep >= sweeps || radial >= radials {
            return None;
        }
        let start = (sweep * radials + radial) * gates;
        self.values.get(start..start + gates)
    }
}

/// Decodes sections of one data type.
pub struct SectionReader<'a, R> {
    cursor: &'a mut RecordCursor<R>,
    groups: &'a SweepGroups,
    calibration: &'a CalibrationContext,
    absent_value: f32,
}

impl<'a, R: Read + Seek> SectionReader<'a, R> {
    pub fn new(
        cursor: &'a mut RecordCursor<R>,
        groups: &'a SweepGroups,
        calibration: &'a CalibrationContext,
        absent_value: f32,
    ) -> Self {
        Self {
            cursor,
            groups,
            calibration,
            absent_value,
        }
    }

    /// Decode the requested section.
    ///
    /// Radials that do not exist in the file, sentinel rays and gates
    /// beyond a ray's bins are filled with the absent value without
    /// touching the file.
    pub fn read(&mut self, section: &Section) -> SigmetResult<SectionData> {
        section.sweeps.validate()?;
        section.radials.validate()?;
        section.gates.validate()?;

        let shape = section.shape();
        let mut values = Vec::with_capacity(shape.iter().product());
        let groups = self.groups;

        for sweep_index in section.sweeps.iter() {
            let group = i16::try_from(sweep_index + 1)
                .ok()
                .and_then(|sweep| groups.get(sweep));
            for radial in section.radials.iter() {
                match group.and_then(|g| g.rays.get(radial)) {
                    Some(ray) => self.read_radial(ray, &section.gates, &mut values)?,
                    None => self.fill_absent(section.gates.len(), &mut values),
                }
            }
        }

        Ok(SectionData { shape, values })
    }

    fn fill_absent(&self, count: usize, values: &mut Vec<f32>) {
        values.extend(std::iter::repeat(self.absent_value).take(count));
    }

    fn read_radial(
        &mut self,
        ray: &Ray,
        gates: &SectionRange,
        values: &mut Vec<f32>,
    ) -> SigmetResult<()> {
        if ray.is_sentinel() {
            self.fill_absent(gates.len(), values);
            return Ok(());
        }

        let samples = decode_samples(self.cursor, ray)?;
        for gate in gates.iter() {
            let value = match samples.get(gate) {
                Some(&raw) => self.calibration.calibrate(ray.data_type, raw),
                None => self.absent_value,
            };
            values.push(value);
        }
        Ok(())
    }
}

/// Re-read the raw samples of one ray from the file.
///
/// Gates a stop code left undelivered stay at raw 0.
pub fn decode_samples<R: Read + Seek>(
    cursor: &mut RecordCursor<R>,
    ray: &Ray,
) -> SigmetResult<Vec<u8>> {
    let mut buffer = SampleBuffer::new(ray.bins);
    let Some(location) = ray.location else {
        return Ok(buffer.into_samples());
    };
    trace!(
        offset = location.offset,
        data_read = location.data_read,
        offset1 = location.offset1,
        "Decoding radial"
    );

    let mut decoder = RunLengthDecoder::with_pending_literal(ray.bins, location.data_read);
    cursor.seek(location.offset)?;
    while !decoder.drain_literal(cursor, &mut buffer)? {
        cursor.read_block_header()?;
    }

    cursor.seek(location.offset1)?;
    loop {
        match decoder.resume(cursor, &mut buffer)? {
            DecodeStatus::Complete | DecodeStatus::EndOfRay => break,
            DecodeStatus::RecordBoundary => {
                cursor.read_block_header()?;
            }
        }
    }
    Ok(buffer.into_samples())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_iteration() {
        let range = SectionRange::new(2, 9, 3).unwrap();
        assert_eq!(range.iter().collect::<Vec<_>>(), vec![2, 5, 8]);
        assert_eq!(range.len(), 3);
        assert_eq!(SectionRange::single(4).len(), 1);
    }

    #[test]
    fn test_invalid_range_is_empty() {
        assert!(!SectionRange::single(0).is_empty());
        let backwards = SectionRange {
            first: 5,
            last: 2,
            stride: 1,
        };
        assert!(backwards.is_empty());
        assert_eq!(backwards.len(), 0);
        assert_eq!(backwards.iter().count(), 0);

        let no_stride = SectionRange {
            first: 0,
            last: 3,
            stride: 0,
        };
        assert!(no_stride.is_empty());
        assert_eq!(no_stride.iter().count(), 0);
        assert!(no_stride.validate().is_err());
    }

    #[test]
    fn test_range_validation() {
        assert!(SectionRange::new(0, 5, 0).is_err());
        assert!(SectionRange::new(5, 4, 1).is_err());
        assert!(SectionRange::new(5, 5, 1).is_ok());
    }

    #[test]
    fn test_range_parse() {
        assert_eq!(SectionRange::parse("3").unwrap(), SectionRange::single(3));
        assert_eq!(
            SectionRange::parse("0:359").unwrap(),
            SectionRange::span(0, 359).unwrap()
        );
        assert_eq!(
            SectionRange::parse("0:10:5").unwrap().iter().collect::<Vec<_>>(),
            vec![0, 5, 10]
        );
        assert!(SectionRange::parse("a:3").is_err());
        assert!(SectionRange::parse("1:2:3:4").is_err());
    }

    #[test]
    fn test_section_data_indexing() {
        let data = SectionData {
            shape: [2, 2, 3],
            values: (0..12).map(|v| v as f32).collect(),
        };
        assert_eq!(data.get(1, 0, 2), Some(8.0));
        assert_eq!(data.radial(0, 1), Some(&[3.0, 4.0, 5.0][..]));
        assert_eq!(data.get(2, 0, 0), None);
    }
}
