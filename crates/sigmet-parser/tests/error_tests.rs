//! Rejection of malformed and foreign files.

mod common;

use std::io::Cursor;

use bytes::Bytes;
use sigmet_parser::{
    is_sigmet, ReaderConfig, RecordCursor, SigmetError, SigmetVolume, RECORD_SIZE,
};
use test_utils::{SigmetFileBuilder, TestRay, TestSweep, REFLECTIVITY};

fn open(data: Vec<u8>) -> Result<SigmetVolume<Cursor<Bytes>>, SigmetError> {
    SigmetVolume::from_bytes(Bytes::from(data), ReaderConfig::default())
}

fn long_ray_volume() -> Vec<u8> {
    SigmetFileBuilder::new()
        .with_sweep(
            TestSweep::new(0, 0.5).ray(TestRay::new(0.0, 1.0, 0.5, 0).literal(&[9u8; 6000])),
        )
        .build()
}

#[test]
fn test_format_mismatch() {
    let data = SigmetFileBuilder::new()
        .with_format_id(27)
        .with_sweep(TestSweep::new(0, 0.5).ray(TestRay::new(0.0, 1.0, 0.5, 0).zeros(5)))
        .build();

    let mut cursor = RecordCursor::new(Cursor::new(data.clone())).unwrap();
    assert!(!is_sigmet(&mut cursor).unwrap());

    match open(data.clone()) {
        Err(SigmetError::FormatMismatch { found }) => assert_eq!(found, 27),
        other => panic!("expected format mismatch, got {other:?}"),
    }

    // Without verification the volume still decodes
    let config = ReaderConfig {
        verify_format: false,
        ..ReaderConfig::default()
    };
    let volume = SigmetVolume::from_bytes(Bytes::from(data), config).unwrap();
    assert_eq!(volume.sweeps().len(), 1);
}

#[test]
fn test_is_sigmet_on_short_input() {
    let mut cursor = RecordCursor::new(Cursor::new(vec![0u8; 10])).unwrap();
    assert!(!is_sigmet(&mut cursor).unwrap());

    let mut cursor = RecordCursor::new(Cursor::new(common::three_sweep_volume())).unwrap();
    assert!(is_sigmet(&mut cursor).unwrap());
}

#[test]
fn test_unknown_data_type() {
    let data = SigmetFileBuilder::new()
        .with_data_types(&[9])
        .with_sweep(TestSweep::new(0, 0.5).ray(TestRay::new(0.0, 1.0, 0.5, 0).zeros(5)))
        .build();
    assert!(matches!(open(data), Err(SigmetError::UnknownDataType(9))));
}

#[test]
fn test_empty_data_mask() {
    let data = SigmetFileBuilder::new()
        .with_data_types(&[])
        .with_number_sweeps(1)
        .build();
    assert!(matches!(open(data), Err(SigmetError::InvalidHeader(_))));
}

#[test]
fn test_invalid_multiprf() {
    let data = SigmetFileBuilder::new()
        .with_multiprf(5)
        .with_sweep(TestSweep::new(0, 0.5).ray(TestRay::new(0.0, 1.0, 0.5, 0).zeros(5)))
        .build();
    assert!(matches!(open(data), Err(SigmetError::InvalidHeader(_))));
}

#[test]
fn test_truncated_ray() {
    let mut data = long_ray_volume();
    data.truncate(2 * RECORD_SIZE as usize + 1000);
    match open(data) {
        Err(SigmetError::TruncatedRay { produced, bins, .. }) => {
            assert_eq!(bins, 6000);
            assert!(produced > 0 && produced < 6000);
        }
        other => panic!("expected truncated ray, got {other:?}"),
    }
}

#[test]
fn test_literal_run_cut_at_record_boundary() {
    let mut data = SigmetFileBuilder::new()
        .with_sweep(
            TestSweep::new(0, 0.5).ray(TestRay::new(0.0, 1.0, 0.5, 0).literal(&[9u8; 8000])),
        )
        .build();
    assert!(data.len() > 3 * RECORD_SIZE as usize);
    data.truncate(3 * RECORD_SIZE as usize);

    // block header, ingest header, prefix, ray header and the literal control word
    let first_sample = 12 + 76 + 2 + 12 + 2;
    match open(data) {
        Err(SigmetError::TruncatedRay {
            offset,
            produced,
            bins,
        }) => {
            assert_eq!(offset, 3 * RECORD_SIZE);
            assert_eq!(bins, 8000);
            assert_eq!(produced, RECORD_SIZE as usize - first_sample);
        }
        other => panic!("expected truncated ray, got {other:?}"),
    }
}

#[test]
fn test_inline_data_cut_at_record_boundary() {
    let mut data = SigmetFileBuilder::new()
        .with_sweep(
            TestSweep::new(0, 0.5).ray(TestRay::new(0.0, 1.0, 0.5, 0).inline(&[9u8; 8000])),
        )
        .build();
    data.truncate(3 * RECORD_SIZE as usize);

    // block header, ingest header, prefix and ray header
    let first_sample = 12 + 76 + 2 + 12;
    match open(data) {
        Err(SigmetError::TruncatedRay { produced, bins, .. }) => {
            assert_eq!(bins, 8000);
            assert_eq!(produced, RECORD_SIZE as usize - first_sample);
        }
        other => panic!("expected truncated ray, got {other:?}"),
    }
}

#[test]
fn test_truncated_record() {
    let mut data = long_ray_volume();
    // cut inside the first ingest data header
    data.truncate(2 * RECORD_SIZE as usize + 50);
    assert!(matches!(
        open(data),
        Err(SigmetError::TruncatedRecord { .. })
    ));
}

#[test]
fn test_truncated_ray_header() {
    let mut data = SigmetFileBuilder::new()
        .with_sweep(TestSweep::new(0, 0.5).ray(TestRay::new(0.0, 1.0, 0.5, 0).zeros(5)))
        .build();
    // block header + one ingest header + prefix word + 3 bytes of ray header
    data.truncate(2 * RECORD_SIZE as usize + 12 + 76 + 2 + 3);
    assert!(matches!(
        open(data),
        Err(SigmetError::TruncatedRecord { .. })
    ));
}

#[test]
fn test_invalid_ray_prefix() {
    let mut data = SigmetFileBuilder::new()
        .with_sweep(TestSweep::new(0, 0.5).ray(TestRay::new(0.0, 1.0, 0.5, 0).zeros(5)))
        .build();
    // prefix claims 3 words, too short for the ray header
    let prefix = 2 * RECORD_SIZE as usize + 12 + 76;
    data[prefix..prefix + 2].copy_from_slice(&(0x8003u16 as i16).to_le_bytes());
    assert!(matches!(
        open(data),
        Err(SigmetError::InvalidRayPrefix { words: 3, .. })
    ));
}

#[test]
fn test_missing_sweeps_stop_at_end_of_file() {
    // Header declares three sweeps but the file holds one
    let data = SigmetFileBuilder::new()
        .with_data_types(&[REFLECTIVITY])
        .with_number_sweeps(3)
        .with_sweep(
            TestSweep::new(0, 0.5).ray(TestRay::new(0.0, 1.0, 0.5, 0).literal(&[70; 10])),
        )
        .build();
    let volume = open(data).unwrap();
    assert_eq!(volume.sweeps().len(), 1);
    assert_eq!(
        volume
            .sweep_groups(sigmet_parser::DataType::Reflectivity)
            .unwrap()
            .len(),
        1
    );
}

#[test]
fn test_record_limit() {
    let config = ReaderConfig {
        max_records: Some(3),
        ..ReaderConfig::default()
    };
    let result = SigmetVolume::from_bytes(Bytes::from(common::three_sweep_volume()), config);
    assert!(matches!(result, Err(SigmetError::Config(_))));
}

#[test]
fn test_invalid_config() {
    let config = ReaderConfig {
        absent_value: f32::NEG_INFINITY,
        ..ReaderConfig::default()
    };
    let result = SigmetVolume::from_bytes(Bytes::from(common::three_sweep_volume()), config);
    assert!(matches!(result, Err(SigmetError::Config(_))));
}
