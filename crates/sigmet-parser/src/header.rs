//! Product and ingest header records.
//!
//! The first record of a raw volume is the product header and the second
//! the ingest header. Only the fields needed to decode and describe the
//! volume are read, each from its fixed byte offset.

use std::io::{Read, Seek};

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::angle::{geo_angle32, nyquist};
use crate::calibration::CalibrationContext;
use crate::cursor::RecordCursor;
use crate::error::{SigmetError, SigmetResult};
use crate::ray::{even_bins, DataType};

/// Value of the format discriminator for raw product files.
pub const RAW_FORMAT_ID: i16 = 15;

/// Size of one ingest data header at the start of a sweep.
pub const INGEST_DATA_HEADER_SIZE: usize = 76;

// ===== Fixed Offsets =====

const FORMAT_ID: u64 = 24;
const PRF: u64 = 452;
const WAVELENGTH: u64 = 480;
const STATION_NAME: u64 = 6288;
const STATION_NAME_SETUP: u64 = 6306;
const STATION_NAME_WIDTH: usize = 16;
const LATITUDE: u64 = 6324;
const LONGITUDE: u64 = 6328;
const GROUND_HEIGHT: u64 = 6332;
const RADAR_HEIGHT: u64 = 6334;
const RAYS_PER_SWEEP: u64 = 6340;
const RADAR_ALTITUDE: u64 = 6344;
const TIME_BEGIN: u64 = 6648;
const TIME_END: u64 = 6652;
const DATA_MASK: u64 = 6772;
const MULTI_PRF: u64 = 6912;
const RANGE_FIRST: u64 = 7408;
const RANGE_LAST: u64 = 7412;
const BINS: u64 = 7418;
const BIN_STEP: u64 = 7424;
const NUMBER_SWEEPS: u64 = 7574;

/// Whether the source carries the raw-volume format discriminator.
pub fn is_sigmet<R: Read + Seek>(cursor: &mut RecordCursor<R>) -> SigmetResult<bool> {
    if cursor.len() < FORMAT_ID + 2 {
        return Ok(false);
    }
    Ok(cursor.read_i16_at(FORMAT_ID)? == RAW_FORMAT_ID)
}

/// Volume-wide metadata from the first two records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductHeader {
    pub station_name: String,
    pub station_name_setup: String,
    /// Degrees north
    pub latitude: f32,
    /// Degrees east
    pub longitude: f32,
    /// Ground height above sea level (m)
    pub ground_height: i16,
    /// Radar height above ground (m)
    pub radar_height: i16,
    /// Radar altitude above sea level (m)
    pub radar_altitude: i32,
    /// Nominal rays per sweep
    pub rays_per_sweep: i16,
    /// Volume start and end as recorded by the ingest task
    pub time_begin: i32,
    pub time_end: i32,
    /// Pulse repetition frequency (Hz)
    pub prf: i32,
    /// Wavelength (1/100 cm)
    pub wavelength: i32,
    /// Nyquist velocity (m/s)
    pub nyquist: f32,
    pub data_mask: i32,
    /// Number of data types recorded per ray slot
    pub nparams: usize,
    pub multiprf: i16,
    /// Range of the first bin (cm)
    pub range_first: i32,
    /// Range of the last bin (cm)
    pub range_last: i32,
    /// Nominal bins per ray, made even
    pub bins: usize,
    /// Bin spacing (cm)
    pub bin_step: i32,
    pub number_sweeps: i16,
}

impl ProductHeader {
    /// Read the header fields. With `verify_format`, a file whose
    /// discriminator is not 15 is rejected.
    pub fn read<R: Read + Seek>(
        cursor: &mut RecordCursor<R>,
        verify_format: bool,
    ) -> SigmetResult<Self> {
        let format_id = cursor.read_i16_at(FORMAT_ID)?;
        if verify_format && format_id != RAW_FORMAT_ID {
            return Err(SigmetError::FormatMismatch { found: format_id });
        }

        let prf = cursor.read_i32_at(PRF)?;
        let wavelength = cursor.read_i32_at(WAVELENGTH)?;

        cursor.seek(STATION_NAME)?;
        let station_name = cursor.read_string(STATION_NAME_WIDTH)?;
        cursor.seek(STATION_NAME_SETUP)?;
        let station_name_setup = cursor.read_string(STATION_NAME_WIDTH)?;

        let data_mask = cursor.read_i32_at(DATA_MASK)?;
        let nparams = data_mask.count_ones() as usize;
        if nparams == 0 {
            return Err(SigmetError::invalid_header("data type mask is empty"));
        }

        let number_sweeps = cursor.read_i16_at(NUMBER_SWEEPS)?;
        if number_sweeps < 0 {
            return Err(SigmetError::invalid_header(format!(
                "negative sweep count {number_sweeps}"
            )));
        }

        Ok(Self {
            station_name,
            station_name_setup,
            latitude: geo_angle32(cursor.read_i32_at(LATITUDE)?),
            longitude: geo_angle32(cursor.read_i32_at(LONGITUDE)?),
            ground_height: cursor.read_i16_at(GROUND_HEIGHT)?,
            radar_height: cursor.read_i16_at(RADAR_HEIGHT)?,
            radar_altitude: cursor.read_i32_at(RADAR_ALTITUDE)? / 100,
            rays_per_sweep: cursor.read_i16_at(RAYS_PER_SWEEP)?,
            time_begin: cursor.read_i32_at(TIME_BEGIN)?,
            time_end: cursor.read_i32_at(TIME_END)?,
            prf,
            wavelength,
            nyquist: nyquist(prf, wavelength),
            data_mask,
            nparams,
            multiprf: cursor.read_i16_at(MULTI_PRF)?,
            range_first: cursor.read_i32_at(RANGE_FIRST)?,
            range_last: cursor.read_i32_at(RANGE_LAST)?,
            bins: even_bins(cursor.read_i16_at(BINS)?),
            bin_step: cursor.read_i32_at(BIN_STEP)?,
            number_sweeps,
        })
    }

    /// Calibration constants for this volume.
    pub fn calibration(&self) -> SigmetResult<CalibrationContext> {
        CalibrationContext::new(self.multiprf, self.nyquist)
    }

    /// Range to the first bin in metres.
    pub fn range_first_m(&self) -> f32 {
        self.range_first as f32 * 0.01
    }

    /// Range to the last bin in metres.
    pub fn range_last_m(&self) -> f32 {
        self.range_last as f32 * 0.01
    }
}

/// Per-data-type header at the start of every sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestDataHeader {
    /// Seconds since midnight at sweep start
    pub base_time: i32,
    pub year: i16,
    pub month: i16,
    pub day: i16,
    pub sweep: i16,
    pub rays_in_sweep: i16,
    pub first_ray_index: i16,
    pub actual_rays: i16,
    /// Fixed angle of the sweep (binary angle)
    pub sweep_angle: i16,
    pub bin_length: i16,
    pub data_type: i16,
}

impl IngestDataHeader {
    /// Decode a header from its 76 raw bytes.
    pub fn parse(buf: &[u8; INGEST_DATA_HEADER_SIZE]) -> Self {
        let i16_at = |pos: usize| i16::from_le_bytes([buf[pos], buf[pos + 1]]);
        Self {
            base_time: i32::from_le_bytes([buf[12], buf[13], buf[14], buf[15]]),
            year: i16_at(18),
            month: i16_at(20),
            day: i16_at(22),
            sweep: i16_at(24),
            rays_in_sweep: i16_at(26),
            first_ray_index: i16_at(28),
            actual_rays: i16_at(32),
            sweep_angle: i16_at(34),
            bin_length: i16_at(36),
            data_type: i16_at(38),
        }
    }

    /// Read one header at the cursor position.
    pub fn read<R: Read + Seek>(cursor: &mut RecordCursor<R>) -> SigmetResult<Self> {
        let mut buf = [0u8; INGEST_DATA_HEADER_SIZE];
        cursor.read_exact(&mut buf)?;
        Ok(Self::parse(&buf))
    }

    /// Typed data type of this header.
    pub fn data_type(&self) -> SigmetResult<DataType> {
        DataType::try_from(self.data_type)
    }

    /// Sweep start as a UTC timestamp, if the date is valid.
    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        sweep_time(self.year, self.month, self.day, self.base_time)
    }
}

/// Timestamp `seconds` after midnight of the given date.
pub fn sweep_time(year: i16, month: i16, day: i16, seconds: i32) -> Option<DateTime<Utc>> {
    let date = NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32)?;
    let midnight = date.and_hms_opt(0, 0, 0)?;
    let start = Utc.from_utc_datetime(&midnight);
    start.checked_add_signed(Duration::seconds(seconds as i64))
}
