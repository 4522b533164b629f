//! Shared synthetic volumes for integration tests.

#![allow(dead_code)]

use test_utils::{SigmetFileBuilder, TestRay, TestSweep, REFLECTIVITY, VELOCITY};

/// Samples of the 6000-gate ray in sweep 3. Long enough to cross a record.
pub fn long_ray_samples() -> Vec<u8> {
    (0..6000).map(|i| (i % 200 + 1) as u8).collect()
}

/// Reflectivity/velocity volume with three sweeps.
///
/// Sweep 1 rays are out of time order. Sweep 2 straddles north and holds
/// a velocity ray cut short by a stop code and an empty velocity slot.
/// Sweep 3 holds a reflectivity ray spanning two records.
pub fn three_sweep_builder() -> SigmetFileBuilder {
    let sweep1 = TestSweep::new(3600, 0.5)
        // reflectivity, fully zero-run
        .ray(TestRay::new(20.0, 21.0, 0.5, 2).zeros(5))
        // velocity, fully zero-run
        .ray(TestRay::new(10.0, 11.0, 0.5, 0).zeros(5))
        // reflectivity, fully literal
        .ray(TestRay::new(10.0, 11.0, 0.5, 0).literal(&[64, 66, 68, 70, 72, 74, 76, 78, 80, 164]))
        // velocity, literal
        .ray(TestRay::new(15.0, 16.0, 0.5, 1).literal(&[255, 1, 128, 0, 255, 1, 128, 0, 255, 1]))
        // reflectivity, inline + zero run + literal
        .ray(
            TestRay::new(15.0, 16.0, 0.5, 1)
                .inline(&[100, 100])
                .zeros(2)
                .literal(&[120, 140, 0, 2]),
        )
        // velocity, inline only
        .ray(TestRay::new(20.0, 21.0, 0.5, 2).inline(&[128; 10]));

    let sweep2 = TestSweep::new(3650, 1.5)
        .ray(TestRay::new(0.2, 0.8, 1.5, 1).literal(&[70; 10]))
        .ray(TestRay::new(90.0, 91.0, 1.5, 0).literal(&[200, 200]).stop().bins(10))
        .ray(TestRay::new(359.0, 0.5, 1.5, 0).literal(&[80; 10]))
        .empty_slot()
        .ray(TestRay::new(358.0, 359.0, 1.5, 0).literal(&[90; 10]))
        .ray(TestRay::new(100.0, 101.0, 1.5, 0).literal(&[255; 10]))
        .ray(TestRay::new(1.2, 1.8, 1.5, 1).literal(&[60; 10]));

    let sweep3 = TestSweep::new(3700, 2.5)
        .ray(TestRay::new(45.0, 46.0, 2.5, 3).literal(&long_ray_samples()))
        .ray(
            TestRay::new(45.0, 46.0, 2.5, 5)
                .zeros(3)
                .literal(&[129, 130, 131, 132])
                .terminator(0),
        );

    SigmetFileBuilder::new()
        .with_data_types(&[REFLECTIVITY, VELOCITY])
        .with_sweep(sweep1)
        .with_sweep(sweep2)
        .with_sweep(sweep3)
}

/// Encoded bytes of [`three_sweep_builder`].
pub fn three_sweep_volume() -> Vec<u8> {
    three_sweep_builder().build()
}
