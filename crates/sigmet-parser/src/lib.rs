//! SIGMET/IRIS raw radar volume decoder.
//!
//! A raw volume is a sequence of 6144-byte little-endian records: a
//! product header, an ingest header, then data records holding
//! run-length compressed rays grouped in sweeps. Opening a volume scans
//! every ray once and keeps only descriptors; sample values are decoded
//! and calibrated from the file when a section is requested.
//!
//! # Example
//!
//! ```ignore
//! use sigmet_parser::{DataType, SectionRange, SigmetVolume};
//!
//! let mut volume = SigmetVolume::open("volume.raw")?;
//! let data = volume.read_section(
//!     DataType::Reflectivity,
//!     SectionRange::single(0),
//!     SectionRange::span(0, 359)?,
//!     SectionRange::span(0, 99)?,
//! )?;
//! ```

pub mod angle;
pub mod assembler;
pub mod calibration;
pub mod config;
pub mod cursor;
pub mod error;
pub mod header;
pub mod ray;
pub mod ray_builder;
pub mod rle;
pub mod rounding;
pub mod section;
pub mod volume;

pub use assembler::{SweepGroup, SweepGroups};
pub use calibration::{calibrate, CalibrationContext};
pub use config::ReaderConfig;
pub use cursor::{BlockHeader, RecordCursor, RECORD_SIZE};
pub use error::{SigmetError, SigmetResult};
pub use header::{is_sigmet, IngestDataHeader, ProductHeader};
pub use ray::{DataType, Ray, RayLocation, MISSING_VALUE};
pub use ray_builder::{RayBuilder, ScanOutput, SweepInfo};
pub use section::{Section, SectionData, SectionRange, SectionReader};
pub use volume::SigmetVolume;
