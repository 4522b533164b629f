//! JSON views of an opened volume.

use std::io::{Read, Seek};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use sigmet_parser::{DataType, ProductHeader, SectionRange, SigmetVolume, SweepInfo};

/// Everything printed for a volume.
#[derive(Debug, Serialize)]
pub struct VolumeSummary {
    pub header: ProductHeader,
    pub data_types: Vec<DataTypeSummary>,
    pub sweeps: Vec<SweepInfo>,
    pub time_coverage_start: Option<DateTime<Utc>>,
    pub time_coverage_end: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<SectionSummary>,
}

#[derive(Debug, Serialize)]
pub struct DataTypeSummary {
    pub data_type: DataType,
    pub name: &'static str,
    pub units: &'static str,
    pub rays: usize,
    /// Rays per sweep group, sentinels included
    pub rays_per_sweep: Vec<usize>,
}

/// A decoded section. Absent values serialize as `null`.
#[derive(Debug, Serialize)]
pub struct SectionSummary {
    pub data_type: DataType,
    pub shape: [usize; 3],
    pub values: Vec<f32>,
}

/// Section requested on the command line.
#[derive(Debug, Clone)]
pub struct SectionRequest {
    pub data_type: DataType,
    pub sweeps: SectionRange,
    pub radials: SectionRange,
    pub gates: SectionRange,
}

impl SectionRequest {
    /// Build a request from the raw flag values. Missing ranges default to
    /// the first sweep, the first radial and every gate of the volume.
    pub fn parse(
        data_type: &str,
        sweeps: Option<&str>,
        radials: Option<&str>,
        gates: Option<&str>,
        header: &ProductHeader,
    ) -> Result<Self> {
        let data_type = DataType::from_name(data_type)
            .ok_or_else(|| anyhow!("unknown data type '{data_type}'"))?;
        let range = |value: Option<&str>, flag: &str, default| -> Result<SectionRange> {
            match value {
                Some(s) => {
                    SectionRange::parse(s).with_context(|| format!("invalid --{flag} '{s}'"))
                }
                None => Ok(default),
            }
        };

        let all_gates = SectionRange::span(0, header.bins.max(1) - 1)?;
        Ok(Self {
            data_type,
            sweeps: range(sweeps, "sweeps", SectionRange::single(0))?,
            radials: range(radials, "radials", SectionRange::single(0))?,
            gates: range(gates, "gates", all_gates)?,
        })
    }
}

/// Summarize a volume, decoding `request` if given.
pub fn summarize<R: Read + Seek>(
    volume: &mut SigmetVolume<R>,
    request: Option<&SectionRequest>,
) -> Result<VolumeSummary> {
    let data_types = volume
        .data_types()
        .into_iter()
        .filter_map(|data_type| {
            let groups = volume.sweep_groups(data_type)?;
            Some(DataTypeSummary {
                data_type,
                name: data_type.name(),
                units: data_type.units(),
                rays: groups.ray_count(),
                rays_per_sweep: groups.iter().map(|g| g.len()).collect(),
            })
        })
        .collect();

    let section = match request {
        Some(request) => {
            let data = volume
                .read_section(
                    request.data_type,
                    request.sweeps,
                    request.radials,
                    request.gates,
                )
                .context("failed to decode section")?;
            Some(SectionSummary {
                data_type: request.data_type,
                shape: data.shape,
                values: data.values,
            })
        }
        None => None,
    };

    Ok(VolumeSummary {
        header: volume.header().clone(),
        data_types,
        sweeps: volume.sweeps().to_vec(),
        time_coverage_start: volume.time_coverage_start(),
        time_coverage_end: volume.time_coverage_end(),
        section,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use sigmet_parser::ReaderConfig;
    use test_utils::{SigmetFileBuilder, TestRay, TestSweep, REFLECTIVITY, VELOCITY};

    fn volume() -> SigmetVolume<std::io::Cursor<Bytes>> {
        let data = SigmetFileBuilder::new()
            .with_data_types(&[REFLECTIVITY, VELOCITY])
            .with_sweep(
                TestSweep::new(3600, 0.5)
                    .ray(TestRay::new(0.0, 1.0, 0.5, 0).literal(&[80; 10]))
                    .ray(TestRay::new(0.0, 1.0, 0.5, 0).literal(&[128; 10]))
                    .ray(TestRay::new(1.0, 2.0, 0.5, 1).zeros(5))
                    .empty_slot(),
            )
            .build();
        SigmetVolume::from_bytes(Bytes::from(data), ReaderConfig::default()).unwrap()
    }

    #[test]
    fn test_summary_without_section() {
        let mut volume = volume();
        let summary = summarize(&mut volume, None).unwrap();
        assert_eq!(summary.data_types.len(), 2);
        assert_eq!(summary.data_types[0].name, "Reflectivity");
        assert_eq!(summary.data_types[0].rays_per_sweep, vec![2]);
        assert_eq!(summary.data_types[1].rays, 1);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["header"]["station_name"], "TESTRADAR");
        assert!(json.get("section").is_none());
        assert_eq!(json["sweeps"][0]["ray_slots"], 4);
    }

    #[test]
    fn test_summary_with_section() {
        let mut volume = volume();
        let request = SectionRequest::parse(
            "dbz",
            None,
            Some("0:2"),
            Some("0:9:3"),
            volume.header(),
        )
        .unwrap();
        let summary = summarize(&mut volume, Some(&request)).unwrap();
        let section = summary.section.as_ref().unwrap();
        assert_eq!(section.shape, [1, 3, 4]);
        assert_eq!(&section.values[..4], &[8.0; 4]);

        // the third radial is not in the file
        let json = serde_json::to_value(&summary).unwrap();
        assert!(json["section"]["values"][8].is_null());
    }

    #[test]
    fn test_section_request_errors() {
        let volume = volume();
        assert!(SectionRequest::parse("rain", None, None, None, volume.header()).is_err());
        assert!(SectionRequest::parse("vel", Some("3:1"), None, None, volume.header()).is_err());

        let request = SectionRequest::parse("vel", None, None, None, volume.header()).unwrap();
        assert_eq!(request.gates.len(), 10);
    }
}
