//! Adaptive step sizing for scrubbing the displayed time toward a pointer target.
//!
//! Steps shrink where the sky color changes quickly (dawn, dusk) and grow where it is
//! static (midday, midnight). When a scrub would pass through more than one dawn/dusk
//! zone, everything before the last zone is skipped in a single jump.

use crate::sky_core::color::{triple_delta, ColorTriple};
use crate::sky_core::config::AnimatorConfig;
use crate::sky_core::solar::fraction;
use crate::sky_core::time::DayInfo;

/// Color deltas below this count as "nothing is changing".
const NEGLIGIBLE_DELTA: f64 = 1e-3;
/// Altitudes (degrees) where a static day sky is about to start its evening glow.
const IMPENDING_TRANSITION_DEG: (f64, f64) = (6.0, 30.0);

pub fn ease_out_expo(progress: f64) -> f64 {
    if progress >= 1.0 {
        1.0
    } else {
        1.0 - 2f64.powf(-10.0 * progress.max(0.0))
    }
}

/// A window around a sunrise or sunset where sky color changes quickly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Zone {
    pub start: f64,
    pub end: f64,
}

impl Zone {
    pub fn contains(&self, ms: f64) -> bool {
        ms >= self.start && ms <= self.end
    }

    fn overlaps_open(&self, lo: f64, hi: f64) -> bool {
        self.end > lo && self.start < hi
    }
}

/// Zones around every sunrise and sunset of `days`, sorted, overlaps merged.
pub fn transition_zones(days: &[DayInfo], half_width_ms: f64) -> Vec<Zone> {
    let mut zones: Vec<Zone> = days
        .iter()
        .flat_map(|d| [d.sunrise, d.sunset])
        .map(|center| Zone {
            start: center - half_width_ms,
            end: center + half_width_ms,
        })
        .collect();
    zones.sort_by(|a, b| a.start.total_cmp(&b.start));

    let mut merged: Vec<Zone> = Vec::with_capacity(zones.len());
    for zone in zones {
        match merged.last_mut() {
            Some(last) if zone.start <= last.end => last.end = last.end.max(zone.end),
            _ => merged.push(zone),
        }
    }
    merged
}

/// Zones touched strictly between `from` and `to`, in travel order.
pub fn zones_crossed(zones: &[Zone], from: f64, to: f64) -> Vec<Zone> {
    let (lo, hi) = if from <= to { (from, to) } else { (to, from) };
    let mut crossed: Vec<Zone> = zones
        .iter()
        .copied()
        .filter(|z| z.overlaps_open(lo, hi))
        .collect();
    if to < from {
        crossed.reverse();
    }
    crossed
}

/// Where to jump when the path crosses two or more zones and we are not already in
/// the last of them: the edge of that last zone facing the current position.
pub fn skip_edge(zones: &[Zone], from: f64, to: f64) -> Option<f64> {
    let crossed = zones_crossed(zones, from, to);
    if crossed.len() < 2 {
        return None;
    }
    let last = crossed.last()?;
    if last.contains(from) {
        return None;
    }
    Some(if to > from { last.start } else { last.end })
}

/// Distance to the nearest zone edge strictly ahead of `from`.
pub fn next_edge_distance(zones: &[Zone], from: f64, direction: f64) -> Option<f64> {
    zones
        .iter()
        .flat_map(|z| [z.start, z.end])
        .map(|edge| (edge - from) * direction)
        .filter(|d| *d > 0.0)
        .min_by(|a, b| a.total_cmp(b))
}

pub struct ScrubPosition<'a> {
    pub display_ms: f64,
    pub scrub_target_ms: f64,
    pub scrub_start_ms: f64,
    pub altitude_deg: f64,
    pub zones: &'a [Zone],
}

/// The displayed time after one scrub frame.
pub fn next_display_ms<F>(config: &AnimatorConfig, pos: &ScrubPosition<'_>, colors_at: F) -> f64
where
    F: Fn(f64) -> ColorTriple,
{
    let remaining = pos.scrub_target_ms - pos.display_ms;
    let distance = remaining.abs();
    if distance < config.snap_threshold_ms {
        return pos.scrub_target_ms;
    }
    let direction = remaining.signum();

    if let Some(edge) = skip_edge(pos.zones, pos.display_ms, pos.scrub_target_ms) {
        log::debug!(
            "skipping {:.0}s of transitions to zone edge",
            (edge - pos.display_ms).abs() / 1000.0
        );
        return edge;
    }

    let probe_ms = pos.display_ms + direction * config.probe_offset_ms;
    let delta = triple_delta(&colors_at(pos.display_ms), &colors_at(probe_ms)) as f64;

    let mut step = if delta > NEGLIGIBLE_DELTA {
        config.target_delta_per_frame as f64 / delta * config.probe_offset_ms
    } else if pos.altitude_deg > IMPENDING_TRANSITION_DEG.0
        && pos.altitude_deg < IMPENDING_TRANSITION_DEG.1
    {
        config.impending_step_ms
    } else {
        config.max_step_ms
    };

    let progress = fraction(
        (pos.display_ms - pos.scrub_start_ms).abs(),
        (pos.scrub_target_ms - pos.scrub_start_ms).abs(),
    );
    step *= 2.0 - ease_out_expo(progress);

    if let Some(edge) = next_edge_distance(pos.zones, pos.display_ms, direction) {
        step = step.min(edge);
    }

    let step = step
        .max(config.min_step_ms)
        .min(config.max_step_ms)
        .min(distance);
    pos.display_ms + direction * step
}
