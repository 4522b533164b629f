//! Checks against a captured radar volume.
//!
//! These tests require a real SIGMET raw file. Place one at
//! `crates/sigmet-parser/testdata/sigmet_volume.raw` or point
//! `TEST_DATA_DIR` at a directory holding it; otherwise the tests skip.

use sigmet_parser::{is_sigmet, RecordCursor, SectionRange, SigmetVolume};
use test_utils::require_test_file;

#[test]
fn test_captured_volume_structure() {
    let path = require_test_file!("sigmet_volume.raw");

    let file = std::fs::File::open(&path).unwrap();
    let mut cursor = RecordCursor::new(file).unwrap();
    assert!(is_sigmet(&mut cursor).unwrap());

    let volume = SigmetVolume::open(&path).unwrap();
    let header = volume.header();
    println!(
        "{}: {} sweeps, {} bins, nyquist {} m/s",
        header.station_name, header.number_sweeps, header.bins, header.nyquist
    );
    assert!(header.number_sweeps > 0);
    assert!((-90.0..=90.0).contains(&header.latitude));

    for data_type in volume.data_types() {
        let groups = volume.sweep_groups(data_type).unwrap();
        for group in groups.iter() {
            for ray in &group.rays {
                assert_eq!(ray.bins % 2, 0);
                if ray.is_sentinel() {
                    continue;
                }
                assert!((0.0..360.0).contains(&ray.azimuth), "azimuth {}", ray.azimuth);
                assert!(ray.location.is_some());
            }
            // sorted by time within the group
            let times: Vec<i16> = group
                .rays
                .iter()
                .filter(|r| !r.is_sentinel())
                .map(|r| r.time)
                .collect();
            assert!(times.windows(2).all(|w| w[0] <= w[1]));
        }
    }

    assert!(volume.time_coverage_start() <= volume.time_coverage_end());
}

#[test]
fn test_captured_volume_first_sweep_reads() {
    let path = require_test_file!("sigmet_volume.raw");

    let mut volume = SigmetVolume::open(&path).unwrap();
    let Some(data_type) = volume.data_types().first().copied() else {
        return;
    };
    let Some(group) = volume.sweep_groups(data_type).and_then(|g| g.get(1)) else {
        return;
    };
    let radials = group.len();
    let gates = group.max_bins().max(1);

    let data = volume
        .read_section(
            data_type,
            SectionRange::single(0),
            SectionRange::span(0, radials.saturating_sub(1)).unwrap(),
            SectionRange::span(0, gates - 1).unwrap(),
        )
        .unwrap();
    assert_eq!(data.shape, [1, radials, gates]);
    assert!(data.values.iter().any(|v| !v.is_nan()));
}
