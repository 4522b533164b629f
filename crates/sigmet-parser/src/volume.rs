//! An open SIGMET raw volume.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::assembler::{assemble_all, SweepGroups};
use crate::calibration::CalibrationContext;
use crate::config::ReaderConfig;
use crate::cursor::RecordCursor;
use crate::error::{SigmetError, SigmetResult};
use crate::header::ProductHeader;
use crate::ray::{DataType, Ray};
use crate::ray_builder::{RayBuilder, SweepInfo};
use crate::section::{decode_samples, Section, SectionData, SectionRange, SectionReader};

/// A scanned volume. Sample values are decoded from the source on demand.
#[derive(Debug)]
pub struct SigmetVolume<R> {
    cursor: RecordCursor<R>,
    config: ReaderConfig,
    header: ProductHeader,
    calibration: CalibrationContext,
    groups: BTreeMap<DataType, SweepGroups>,
    sweeps: Vec<SweepInfo>,
    first_ray: Option<Ray>,
    last_ray: Option<Ray>,
}

impl SigmetVolume<BufReader<File>> {
    /// Open and scan a file with the default configuration.
    pub fn open(path: impl AsRef<Path>) -> SigmetResult<Self> {
        Self::open_with_config(path, ReaderConfig::default())
    }

    pub fn open_with_config(path: impl AsRef<Path>, config: ReaderConfig) -> SigmetResult<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(BufReader::new(file), config)
    }
}

impl SigmetVolume<Cursor<Bytes>> {
    /// Scan a volume held in memory.
    pub fn from_bytes(data: Bytes, config: ReaderConfig) -> SigmetResult<Self> {
        Self::from_reader(Cursor::new(data), config)
    }
}

impl<R: Read + Seek> SigmetVolume<R> {
    /// Read the headers and scan every ray of a volume.
    pub fn from_reader(reader: R, config: ReaderConfig) -> SigmetResult<Self> {
        config.validate().map_err(SigmetError::Config)?;

        let mut cursor = RecordCursor::new(reader)?;
        if let Some(max) = config.max_bytes() {
            if cursor.len() > max {
                return Err(SigmetError::Config(format!(
                    "file has {} records, limit is {}",
                    cursor.record_count(),
                    config.max_records.unwrap_or_default()
                )));
            }
        }

        let header = ProductHeader::read(&mut cursor, config.verify_format)?;
        let calibration = header.calibration()?;
        let scan = RayBuilder::new(&mut cursor, &header).scan()?;
        let groups = assemble_all(scan.rays);

        for (data_type, sweep_groups) in &groups {
            if sweep_groups.len() != header.number_sweeps.max(0) as usize {
                warn!(
                    data_type = %data_type,
                    groups = sweep_groups.len(),
                    expected = header.number_sweeps,
                    "Sweep count differs from header"
                );
            }
        }

        info!(
            station = %header.station_name,
            sweeps = scan.sweeps.len(),
            data_types = groups.len(),
            rays = groups.values().map(SweepGroups::ray_count).sum::<usize>(),
            "Scanned SIGMET volume"
        );

        Ok(Self {
            cursor,
            config,
            header,
            calibration,
            groups,
            sweeps: scan.sweeps,
            first_ray: scan.first_ray,
            last_ray: scan.last_ray,
        })
    }

    pub fn header(&self) -> &ProductHeader {
        &self.header
    }

    pub fn calibration(&self) -> &CalibrationContext {
        &self.calibration
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Data types present in the file.
    pub fn data_types(&self) -> Vec<DataType> {
        self.groups.keys().copied().collect()
    }

    /// Sorted sweep groups of one data type.
    pub fn sweep_groups(&self, data_type: DataType) -> Option<&SweepGroups> {
        self.groups.get(&data_type)
    }

    /// Per-sweep information in file order.
    pub fn sweeps(&self) -> &[SweepInfo] {
        &self.sweeps
    }

    pub fn sweep_info(&self, sweep: i16) -> Option<&SweepInfo> {
        self.sweeps.iter().find(|s| s.sweep == sweep)
    }

    pub fn first_ray(&self) -> Option<&Ray> {
        self.first_ray.as_ref()
    }

    pub fn last_ray(&self) -> Option<&Ray> {
        self.last_ray.as_ref()
    }

    /// Start of the first sweep.
    pub fn time_coverage_start(&self) -> Option<DateTime<Utc>> {
        self.sweeps.first().and_then(|s| s.start_time)
    }

    /// Start of the last sweep plus the time offset of the last ray.
    pub fn time_coverage_end(&self) -> Option<DateTime<Utc>> {
        let sweep = self.sweeps.last()?;
        match self.last_ray {
            Some(ray) => sweep.ray_time(&ray),
            None => sweep.start_time,
        }
    }

    /// Decode a section of one data type.
    ///
    /// A data type absent from the file yields a section filled with the
    /// absent value.
    pub fn read_section(
        &mut self,
        data_type: DataType,
        sweeps: SectionRange,
        radials: SectionRange,
        gates: SectionRange,
    ) -> SigmetResult<SectionData> {
        let section = Section {
            sweeps,
            radials,
            gates,
        };
        let empty = SweepGroups::default();
        let groups = self.groups.get(&data_type).unwrap_or(&empty);
        SectionReader::new(
            &mut self.cursor,
            groups,
            &self.calibration,
            self.config.absent_value,
        )
        .read(&section)
    }

    /// Raw sample bytes of one ray.
    pub fn raw_samples(&mut self, ray: &Ray) -> SigmetResult<Vec<u8>> {
        decode_samples(&mut self.cursor, ray)
    }

    /// Calibrated values of every gate of one ray.
    pub fn ray_values(&mut self, ray: &Ray) -> SigmetResult<Vec<f32>> {
        if ray.is_sentinel() {
            return Ok(vec![self.config.absent_value; ray.bins]);
        }
        let samples = self.raw_samples(ray)?;
        Ok(samples
            .into_iter()
            .map(|raw| self.calibration.calibrate(ray.data_type, raw))
            .collect())
    }

    /// Give back the underlying source.
    pub fn into_inner(self) -> R {
        self.cursor.into_inner()
    }
}
