//! Builder for synthetic SIGMET raw volumes.
//!
//! Produces byte-exact record-structured files: a product header record,
//! an ingest header record, then one or more data records per sweep with a
//! 12-byte block header at the start of every record. Rays are encoded with
//! the run-length control words from explicit segments, so tests control
//! exactly where runs fall relative to record boundaries.

/// Size of every record.
pub const RECORD_SIZE: usize = 6144;

/// Data type codes used in ingest data headers.
pub const TOTAL_POWER: i16 = 1;
pub const REFLECTIVITY: i16 = 2;
pub const VELOCITY: i16 = 3;
pub const WIDTH: i16 = 4;
pub const DIFFERENTIAL_REFLECTIVITY: i16 = 5;

/// Convert degrees to a 16-bit binary angle.
pub fn binary_angle(degrees: f32) -> i16 {
    let counts = (degrees as f64 / 360.0 * 65536.0).round() as i64;
    (counts & 0xffff) as u16 as i16
}

/// Convert degrees to a signed 32-bit binary angle.
pub fn binary_angle32(degrees: f64) -> i32 {
    (degrees / 360.0 * 4_294_967_296.0).round() as i64 as i32
}

/// One run of a compressed ray.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Literal sample bytes (even length)
    Literal(Vec<u8>),
    /// Zero run of this many words (two samples each)
    Zeros(u16),
    /// Stop code ending the ray early
    Stop,
}

/// A ray to encode.
#[derive(Debug, Clone, PartialEq)]
pub struct TestRay {
    pub begin_azimuth: i16,
    pub begin_elevation: i16,
    pub end_azimuth: i16,
    pub end_elevation: i16,
    pub time: i16,
    /// Declared bins; computed from the segments when `None`
    pub bins: Option<i16>,
    /// Literal bytes carried by the prefix word after the ray header
    pub inline: Vec<u8>,
    pub segments: Vec<Segment>,
    /// Word written after a complete ray
    pub terminator: i16,
}

impl TestRay {
    /// Ray between two azimuths at a fixed elevation.
    pub fn new(begin_azimuth: f32, end_azimuth: f32, elevation: f32, time: i16) -> Self {
        Self {
            begin_azimuth: binary_angle(begin_azimuth),
            begin_elevation: binary_angle(elevation),
            end_azimuth: binary_angle(end_azimuth),
            end_elevation: binary_angle(elevation),
            time,
            bins: None,
            inline: Vec::new(),
            segments: Vec::new(),
            terminator: 1,
        }
    }

    /// Literal bytes stored right after the ray header.
    pub fn inline(mut self, bytes: &[u8]) -> Self {
        assert!(bytes.len() % 2 == 0, "inline data must be whole words");
        self.inline = bytes.to_vec();
        self
    }

    pub fn literal(mut self, bytes: &[u8]) -> Self {
        assert!(bytes.len() % 2 == 0, "literal runs must be whole words");
        self.segments.push(Segment::Literal(bytes.to_vec()));
        self
    }

    pub fn zeros(mut self, words: u16) -> Self {
        self.segments.push(Segment::Zeros(words));
        self
    }

    pub fn stop(mut self) -> Self {
        self.segments.push(Segment::Stop);
        self
    }

    pub fn bins(mut self, bins: i16) -> Self {
        self.bins = Some(bins);
        self
    }

    pub fn terminator(mut self, word: i16) -> Self {
        self.terminator = word;
        self
    }

    /// Samples encoded by the inline data and segments.
    pub fn encoded_samples(&self) -> usize {
        self.inline.len()
            + self
                .segments
                .iter()
                .map(|s| match s {
                    Segment::Literal(bytes) => bytes.len(),
                    Segment::Zeros(words) => *words as usize * 2,
                    Segment::Stop => 0,
                })
                .sum::<usize>()
    }

    /// Expected raw samples after decoding, `bins` long.
    pub fn expected_samples(&self) -> Vec<u8> {
        let bins = self.declared_bins().max(0) as usize;
        let bins = bins + bins % 2;
        let mut samples = self.inline.clone();
        for segment in &self.segments {
            match segment {
                Segment::Literal(bytes) => samples.extend_from_slice(bytes),
                Segment::Zeros(words) => samples.resize(samples.len() + *words as usize * 2, 0),
                Segment::Stop => break,
            }
        }
        samples.resize(bins, 0);
        samples
    }

    fn declared_bins(&self) -> i16 {
        self.bins.unwrap_or(self.encoded_samples() as i16)
    }

    fn ends_early(&self) -> bool {
        self.segments.contains(&Segment::Stop)
    }

    /// Control-word stream for this ray.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        let prefix_words = 6 + self.inline.len() / 2;
        push_word(&mut out, (0x8000 | prefix_words as u16) as i16);
        for field in [
            self.begin_azimuth,
            self.begin_elevation,
            self.end_azimuth,
            self.end_elevation,
            self.declared_bins(),
            self.time,
        ] {
            push_word(&mut out, field);
        }
        out.extend_from_slice(&self.inline);

        for segment in &self.segments {
            match segment {
                Segment::Literal(bytes) => {
                    push_word(&mut out, (0x8000 | (bytes.len() / 2) as u16) as i16);
                    out.extend_from_slice(bytes);
                }
                Segment::Zeros(words) => push_word(&mut out, *words as i16),
                Segment::Stop => push_word(&mut out, 1),
            }
        }
        if !self.ends_early() {
            push_word(&mut out, self.terminator);
        }
        out
    }
}

/// A ray slot in a sweep.
#[derive(Debug, Clone, PartialEq)]
pub enum RaySlot {
    Ray(TestRay),
    /// Slot holding only a stop code
    Empty,
}

impl From<TestRay> for RaySlot {
    fn from(ray: TestRay) -> Self {
        RaySlot::Ray(ray)
    }
}

/// A sweep to encode. Slots cycle through the volume's data types.
#[derive(Debug, Clone, PartialEq)]
pub struct TestSweep {
    pub base_time: i32,
    pub year: i16,
    pub month: i16,
    pub day: i16,
    /// Fixed angle in degrees
    pub angle: f32,
    pub slots: Vec<RaySlot>,
}

impl TestSweep {
    pub fn new(base_time: i32, angle: f32) -> Self {
        Self {
            base_time,
            year: 2008,
            month: 7,
            day: 15,
            angle,
            slots: Vec::new(),
        }
    }

    pub fn date(mut self, year: i16, month: i16, day: i16) -> Self {
        self.year = year;
        self.month = month;
        self.day = day;
        self
    }

    pub fn ray(mut self, slot: impl Into<RaySlot>) -> Self {
        self.slots.push(slot.into());
        self
    }

    pub fn empty_slot(mut self) -> Self {
        self.slots.push(RaySlot::Empty);
        self
    }
}

/// Builder for a complete raw volume.
#[derive(Debug, Clone)]
pub struct SigmetFileBuilder {
    pub format_id: i16,
    pub prf: i32,
    pub wavelength: i32,
    pub station_name: String,
    pub station_name_setup: String,
    pub latitude: f64,
    pub longitude: f64,
    pub ground_height: i16,
    pub radar_height: i16,
    pub rays_per_sweep: i16,
    pub radar_altitude_cm: i32,
    pub data_types: Vec<i16>,
    pub multiprf: i16,
    pub range_first_cm: i32,
    pub range_last_cm: i32,
    pub bins: i16,
    pub bin_step_cm: i32,
    /// Declared sweep count; the number of sweeps added when `None`
    pub number_sweeps: Option<i16>,
    pub sweeps: Vec<TestSweep>,
}

impl Default for SigmetFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SigmetFileBuilder {
    /// Single-reflectivity volume with PRF 1000 Hz and a 5.35 cm wavelength.
    pub fn new() -> Self {
        Self {
            format_id: 15,
            prf: 1000,
            wavelength: 535,
            station_name: "TESTRADAR".to_string(),
            station_name_setup: "TESTRADAR-SETUP".to_string(),
            latitude: 45.0,
            longitude: -90.0,
            ground_height: 200,
            radar_height: 20,
            rays_per_sweep: 360,
            radar_altitude_cm: 22_000,
            data_types: vec![REFLECTIVITY],
            multiprf: 0,
            range_first_cm: 100_000,
            range_last_cm: 100_000 + 25_000 * 9,
            bins: 10,
            bin_step_cm: 25_000,
            number_sweeps: None,
            sweeps: Vec::new(),
        }
    }

    pub fn with_data_types(mut self, data_types: &[i16]) -> Self {
        self.data_types = data_types.to_vec();
        self
    }

    pub fn with_prf(mut self, prf: i32, wavelength: i32) -> Self {
        self.prf = prf;
        self.wavelength = wavelength;
        self
    }

    pub fn with_multiprf(mut self, multiprf: i16) -> Self {
        self.multiprf = multiprf;
        self
    }

    pub fn with_format_id(mut self, format_id: i16) -> Self {
        self.format_id = format_id;
        self
    }

    pub fn with_station(mut self, name: &str, latitude: f64, longitude: f64) -> Self {
        self.station_name = name.to_string();
        self.latitude = latitude;
        self.longitude = longitude;
        self
    }

    /// Gate geometry: first and last range in cm and the bin count.
    pub fn with_gates(mut self, range_first_cm: i32, range_last_cm: i32, bins: i16) -> Self {
        self.range_first_cm = range_first_cm;
        self.range_last_cm = range_last_cm;
        self.bins = bins;
        self
    }

    pub fn with_number_sweeps(mut self, number_sweeps: i16) -> Self {
        self.number_sweeps = Some(number_sweeps);
        self
    }

    pub fn with_sweep(mut self, sweep: TestSweep) -> Self {
        self.sweeps.push(sweep);
        self
    }

    fn data_mask(&self) -> i32 {
        self.data_types.iter().fold(0, |mask, &code| mask | (1 << code))
    }

    /// Encode the volume.
    pub fn build(&self) -> Vec<u8> {
        let mut buf = vec![0u8; 2 * RECORD_SIZE];
        self.write_headers(&mut buf);

        for (index, sweep) in self.sweeps.iter().enumerate() {
            let mut writer = RecordWriter::new(&mut buf, index as i16 + 1);
            for (i, &code) in self.data_types.iter().enumerate() {
                writer.write(&self.ingest_data_header(sweep, index as i16 + 1, i, code));
            }
            for slot in &sweep.slots {
                match slot {
                    RaySlot::Ray(ray) => writer.write(&ray.encode()),
                    RaySlot::Empty => writer.write(&1i16.to_le_bytes()),
                }
            }
            writer.pad_record();
        }
        buf
    }

    fn write_headers(&self, buf: &mut [u8]) {
        put_i16(buf, 24, self.format_id);
        put_i32(buf, 452, self.prf);
        put_i32(buf, 480, self.wavelength);

        put_str(buf, 6288, &self.station_name);
        put_str(buf, 6306, &self.station_name_setup);
        put_i32(buf, 6324, binary_angle32(self.latitude));
        put_i32(buf, 6328, binary_angle32(self.longitude));
        put_i16(buf, 6332, self.ground_height);
        put_i16(buf, 6334, self.radar_height);
        put_i16(buf, 6340, self.rays_per_sweep);
        put_i32(buf, 6344, self.radar_altitude_cm);
        put_i32(buf, 6772, self.data_mask());
        put_i16(buf, 6912, self.multiprf);
        put_i32(buf, 7408, self.range_first_cm);
        put_i32(buf, 7412, self.range_last_cm);
        put_i16(buf, 7418, self.bins);
        put_i32(buf, 7424, self.bin_step_cm);
        put_i16(
            buf,
            7574,
            self.number_sweeps.unwrap_or(self.sweeps.len() as i16),
        );
    }

    fn ingest_data_header(
        &self,
        sweep: &TestSweep,
        number: i16,
        index: usize,
        code: i16,
    ) -> Vec<u8> {
        let nparams = self.data_types.len();
        let actual = sweep
            .slots
            .iter()
            .enumerate()
            .filter(|(slot, _)| slot % nparams == index)
            .count();

        let mut header = vec![0u8; 76];
        put_i32(&mut header, 12, sweep.base_time);
        put_i16(&mut header, 18, sweep.year);
        put_i16(&mut header, 20, sweep.month);
        put_i16(&mut header, 22, sweep.day);
        put_i16(&mut header, 24, number);
        put_i16(&mut header, 26, sweep.slots.len().div_ceil(nparams) as i16);
        put_i16(&mut header, 28, 0);
        put_i16(&mut header, 32, actual as i16);
        put_i16(&mut header, 34, binary_angle(sweep.angle));
        put_i16(&mut header, 36, self.bins);
        put_i16(&mut header, 38, code);
        header
    }
}

/// Appends bytes, starting every record with a block header.
struct RecordWriter<'a> {
    buf: &'a mut Vec<u8>,
    sweep: i16,
}

impl<'a> RecordWriter<'a> {
    fn new(buf: &'a mut Vec<u8>, sweep: i16) -> Self {
        Self { buf, sweep }
    }

    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            if self.buf.len() % RECORD_SIZE == 0 {
                let record = (self.buf.len() / RECORD_SIZE) as i16;
                for word in [record, self.sweep, 0, 0, 0, 0] {
                    push_word(self.buf, word);
                }
            }
            self.buf.push(byte);
        }
    }

    fn pad_record(&mut self) {
        let rem = self.buf.len() % RECORD_SIZE;
        if rem != 0 {
            self.buf.resize(self.buf.len() + RECORD_SIZE - rem, 0);
        }
    }
}

fn push_word(out: &mut Vec<u8>, word: i16) {
    out.extend_from_slice(&word.to_le_bytes());
}

fn put_i16(buf: &mut [u8], pos: usize, value: i16) {
    buf[pos..pos + 2].copy_from_slice(&value.to_le_bytes());
}

fn put_i32(buf: &mut [u8], pos: usize, value: i32) {
    buf[pos..pos + 4].copy_from_slice(&value.to_le_bytes());
}

fn put_str(buf: &mut [u8], pos: usize, value: &str) {
    let bytes = value.as_bytes();
    let len = bytes.len().min(16);
    buf[pos..pos + len].copy_from_slice(&bytes[..len]);
}
