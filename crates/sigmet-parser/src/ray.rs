//! Radial descriptors.

use serde::{Deserialize, Serialize};

use crate::error::SigmetError;

/// Missing-data value for angles, ranges and calibrated samples.
pub const MISSING_VALUE: f32 = -999.99;

/// Time offset carried by a sentinel ray.
pub const MISSING_TIME: i16 = -99;

/// Offset reported for a sentinel ray.
pub const MISSING_OFFSET: i64 = -999;

/// Radar moment carried by a ray.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DataType {
    /// Uncorrected reflectivity (dBZ)
    TotalPower,
    /// Corrected reflectivity (dBZ)
    Reflectivity,
    /// Mean radial velocity (m/s)
    Velocity,
    /// Spectrum width (m/s)
    Width,
    /// Differential reflectivity (dB)
    DifferentialReflectivity,
}

impl DataType {
    pub const ALL: [DataType; 5] = [
        DataType::TotalPower,
        DataType::Reflectivity,
        DataType::Velocity,
        DataType::Width,
        DataType::DifferentialReflectivity,
    ];

    /// Code used in ingest data headers.
    pub fn code(self) -> i16 {
        match self {
            DataType::TotalPower => 1,
            DataType::Reflectivity => 2,
            DataType::Velocity => 3,
            DataType::Width => 4,
            DataType::DifferentialReflectivity => 5,
        }
    }

    /// Variable name used for this moment.
    pub fn name(self) -> &'static str {
        match self {
            DataType::TotalPower => "Total_Power",
            DataType::Reflectivity => "Reflectivity",
            DataType::Velocity => "Velocity",
            DataType::Width => "Width",
            DataType::DifferentialReflectivity => "Differential_Reflectivity",
        }
    }

    /// Physical unit of calibrated values.
    pub fn units(self) -> &'static str {
        match self {
            DataType::TotalPower | DataType::Reflectivity => "dBZ",
            DataType::Velocity | DataType::Width => "m/s",
            DataType::DifferentialReflectivity => "dB",
        }
    }

    /// Parse a user-supplied name (case-insensitive, short forms allowed).
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().replace(['-', ' '], "_").as_str() {
            "total_power" | "totalpower" | "dbt" => Some(DataType::TotalPower),
            "reflectivity" | "dbz" => Some(DataType::Reflectivity),
            "velocity" | "vel" => Some(DataType::Velocity),
            "width" | "spectrum_width" => Some(DataType::Width),
            "differential_reflectivity" | "zdr" => Some(DataType::DifferentialReflectivity),
            _ => None,
        }
    }
}

impl TryFrom<i16> for DataType {
    type Error = SigmetError;

    fn try_from(code: i16) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(DataType::TotalPower),
            2 => Ok(DataType::Reflectivity),
            3 => Ok(DataType::Velocity),
            4 => Ok(DataType::Width),
            5 => Ok(DataType::DifferentialReflectivity),
            other => Err(SigmetError::UnknownDataType(other)),
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Where a ray's samples live in the file.
///
/// `offset` is the first inline literal byte after the ray header and
/// `data_read` the number of such bytes; `offset1` is the first control
/// word of the rest of the stream. Both offsets point past any block
/// header, never at a record boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RayLocation {
    pub offset: u64,
    pub data_read: usize,
    pub offset1: u64,
}

/// Descriptor of one radial. Samples are decoded on demand.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ray {
    /// Range to the first gate (m)
    pub range: f32,
    /// Distance between gates (m)
    pub step: f32,
    /// Azimuth at the middle of the ray (degrees)
    pub azimuth: f32,
    /// Elevation at the end of the ray (degrees)
    pub elevation: f32,
    /// Number of gates, always even
    pub bins: usize,
    /// Seconds since the start of the sweep
    pub time: i16,
    pub data_type: DataType,
    /// 1-based sweep number
    pub sweep: i16,
    /// `None` for a sentinel ray
    pub location: Option<RayLocation>,
}

impl Ray {
    /// Sentinel for a ray whose stream ended with a stop code.
    pub fn sentinel(bins: usize, sweep: i16, data_type: DataType) -> Self {
        Self {
            range: MISSING_VALUE,
            step: MISSING_VALUE,
            azimuth: MISSING_VALUE,
            elevation: MISSING_VALUE,
            bins,
            time: MISSING_TIME,
            data_type,
            sweep,
            location: None,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.location.is_none()
    }

    /// Start of inline data, or `-999` for a sentinel.
    pub fn offset(&self) -> i64 {
        self.location.map_or(MISSING_OFFSET, |l| l.offset as i64)
    }

    /// Inline byte count, or `0` for a sentinel.
    pub fn data_read(&self) -> usize {
        self.location.map_or(0, |l| l.data_read)
    }

    /// Start of the run-length stream, or `-999` for a sentinel.
    pub fn offset1(&self) -> i64 {
        self.location.map_or(MISSING_OFFSET, |l| l.offset1 as i64)
    }
}

/// Round an odd gate count up to the next even number.
pub fn even_bins(raw: i16) -> usize {
    let bins = raw.max(0) as usize;
    bins + bins % 2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_type_codes() {
        for dt in DataType::ALL {
            assert_eq!(DataType::try_from(dt.code()).unwrap(), dt);
        }
        assert!(matches!(
            DataType::try_from(7),
            Err(SigmetError::UnknownDataType(7))
        ));
        assert!(DataType::try_from(0).is_err());
    }

    #[test]
    fn test_data_type_names() {
        assert_eq!(DataType::from_name("zdr"), Some(DataType::DifferentialReflectivity));
        assert_eq!(DataType::from_name("Total-Power"), Some(DataType::TotalPower));
        assert_eq!(DataType::from_name("Reflectivity"), Some(DataType::Reflectivity));
        assert_eq!(DataType::from_name("kdp"), None);
        assert_eq!(DataType::Velocity.units(), "m/s");
    }

    #[test]
    fn test_even_bins() {
        assert_eq!(even_bins(0), 0);
        assert_eq!(even_bins(499), 500);
        assert_eq!(even_bins(500), 500);
        assert_eq!(even_bins(-3), 0);
        for raw in 0..1000 {
            assert_eq!(even_bins(raw) % 2, 0);
        }
    }

    #[test]
    fn test_sentinel_ray() {
        let ray = Ray::sentinel(500, 2, DataType::Velocity);
        assert!(ray.is_sentinel());
        assert_eq!(ray.azimuth, MISSING_VALUE);
        assert_eq!(ray.time, MISSING_TIME);
        assert_eq!(ray.offset(), -999);
        assert_eq!(ray.data_read(), 0);
        assert_eq!(ray.offset1(), -999);
        assert_eq!(ray.bins, 500);
    }
}
