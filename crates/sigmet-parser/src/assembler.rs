//! Grouping of rays into sorted sweeps.
//!
//! Every step is a pure function over owned ray vectors:
//! [`correct_wraparound`] shifts high azimuths below zero so a sweep
//! crossing north sorts in physical order, [`sort_radials`] orders by
//! time then azimuth, and [`restore_azimuths`] brings shifted azimuths
//! back into 0-360.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::ray::{DataType, Ray};

/// A sub-group whose largest azimuth exceeds this sits just west of north.
const HIGH_AZIMUTH: f32 = 330.0;

/// A sub-group whose largest azimuth is below this sits just east of north.
const LOW_AZIMUTH: f32 = 50.0;

/// Radials of one sweep in time/azimuth order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepGroup {
    /// 1-based sweep number
    pub sweep: i16,
    pub rays: Vec<Ray>,
}

impl SweepGroup {
    pub fn len(&self) -> usize {
        self.rays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rays.is_empty()
    }

    /// Largest gate count of any ray in the sweep.
    pub fn max_bins(&self) -> usize {
        self.rays.iter().map(|r| r.bins).max().unwrap_or(0)
    }
}

/// Sweep groups of one data type, ascending by sweep number.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SweepGroups {
    groups: Vec<SweepGroup>,
}

impl SweepGroups {
    /// Group rays by sweep and sort each sweep.
    pub fn assemble(rays: Vec<Ray>) -> Self {
        let mut by_sweep: BTreeMap<i16, Vec<Ray>> = BTreeMap::new();
        for ray in rays {
            by_sweep.entry(ray.sweep).or_default().push(ray);
        }

        let groups = by_sweep
            .into_iter()
            .map(|(sweep, rays)| SweepGroup {
                sweep,
                rays: sort_sweep(rays),
            })
            .collect();
        Self { groups }
    }

    /// Group for a 1-based sweep number.
    pub fn get(&self, sweep: i16) -> Option<&SweepGroup> {
        self.groups
            .binary_search_by_key(&sweep, |g| g.sweep)
            .ok()
            .map(|i| &self.groups[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &SweepGroup> {
        self.groups.iter()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn ray_count(&self) -> usize {
        self.groups.iter().map(SweepGroup::len).sum()
    }
}

/// Assemble the scanned rays of every data type.
pub fn assemble_all(rays: BTreeMap<DataType, Vec<Ray>>) -> BTreeMap<DataType, SweepGroups> {
    rays.into_iter()
        .map(|(data_type, rays)| (data_type, SweepGroups::assemble(rays)))
        .collect()
}

/// Wraparound correction, sort and azimuth restore for one sweep.
pub fn sort_sweep(rays: Vec<Ray>) -> Vec<Ray> {
    restore_azimuths(sort_radials(correct_wraparound(rays)))
}

/// Shift sub-groups near 360° down by a full turn when another sub-group
/// sits just past 0°.
///
/// Sub-groups are runs of consecutive rays (in scan order) sharing a time
/// value. Sentinel rays take part in no sub-group's maximum.
pub fn correct_wraparound(mut rays: Vec<Ray>) -> Vec<Ray> {
    let runs = time_runs(&rays);
    let maxima: Vec<Option<f32>> = runs
        .iter()
        .map(|run| {
            rays[run.clone()]
                .iter()
                .filter(|r| !r.is_sentinel())
                .map(|r| r.azimuth)
                .reduce(f32::max)
        })
        .collect();

    let has_high = maxima.iter().flatten().any(|&m| m > HIGH_AZIMUTH);
    let has_low = maxima.iter().flatten().any(|&m| m < LOW_AZIMUTH);
    if !(has_high && has_low) {
        return rays;
    }

    for (run, max) in runs.into_iter().zip(maxima) {
        if max.is_some_and(|m| m > HIGH_AZIMUTH) {
            for ray in rays[run].iter_mut().filter(|r| !r.is_sentinel()) {
                ray.azimuth -= 360.0;
            }
        }
    }
    rays
}

/// Stable sort by time, then azimuth.
pub fn sort_radials(mut rays: Vec<Ray>) -> Vec<Ray> {
    rays.sort_by(|a, b| {
        a.time
            .cmp(&b.time)
            .then_with(|| a.azimuth.total_cmp(&b.azimuth))
    });
    rays
}

/// Add a full turn back to azimuths in (-361, 0).
pub fn restore_azimuths(mut rays: Vec<Ray>) -> Vec<Ray> {
    for ray in &mut rays {
        if ray.azimuth < 0.0 && ray.azimuth > -361.0 {
            ray.azimuth += 360.0;
        }
    }
    rays
}

/// Index ranges of consecutive rays with equal time.
fn time_runs(rays: &[Ray]) -> Vec<std::ops::Range<usize>> {
    let mut runs = Vec::new();
    let mut start = 0;
    for i in 1..=rays.len() {
        if i == rays.len() || rays[i].time != rays[start].time {
            if start < i {
                runs.push(start..i);
            }
            start = i;
        }
    }
    runs
}
