use anyhow::{anyhow, Result};

use crate::sky_core::time::{Clock, DayInfo, DAY_MS};
use crate::sky_runtime::animator::SkyFrame;

/// Opaque identity of whatever the pointer is tracking (a forecast row, a chart).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(pub u64);

/// Largest integer a JavaScript number holds exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

impl ElementId {
    /// Accepts only non-negative whole numbers that survive the trip through a JS number.
    pub fn from_js_number(id: f64) -> Result<Self> {
        if !id.is_finite() || id < 0.0 || id.fract() != 0.0 || id > MAX_SAFE_INTEGER {
            return Err(anyhow!("element id must be a non-negative safe integer, got {id}"));
        }
        Ok(Self(id as u64))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackingState {
    pub target_ms: f64,
    pub tracked: Option<ElementId>,
}

impl TrackingState {
    pub fn idle(now_ms: f64) -> Self {
        Self {
            target_ms: now_ms,
            tracked: None,
        }
    }

    pub fn tracking(target_ms: f64, element: ElementId) -> Self {
        Self {
            target_ms,
            tracked: Some(element),
        }
    }

    pub fn is_tracking(&self) -> bool {
        self.tracked.is_some()
    }
}

/// Everything the animator needs from the surrounding dashboard.
pub trait SkyHost: Clock {
    fn find_day_for_ms(&self, ms: f64) -> Option<DayInfo>;

    fn tracking_state(&self) -> TrackingState;

    /// Called after a tick that changed the displayed time or colors.
    fn paint(&mut self, _frame: &SkyFrame) {}
}

/// Sunrise/sunset lookup over a list of known days.
#[derive(Debug, Clone, Default)]
pub struct DayTable {
    days: Vec<DayInfo>,
    repeat: bool,
}

impl DayTable {
    pub fn new(mut days: Vec<DayInfo>) -> Self {
        days.sort_by(|a, b| a.solar_noon().total_cmp(&b.solar_noon()));
        Self {
            days,
            repeat: false,
        }
    }

    /// Treats one day as representative of every other day.
    pub fn repeating(day: DayInfo) -> Self {
        Self {
            days: vec![day],
            repeat: true,
        }
    }

    /// Days packed as `[ms, sunrise, sunset, ms, sunrise, sunset, ...]`.
    pub fn from_flat(flat: &[f64]) -> Result<Self> {
        if flat.len() % 3 != 0 {
            return Err(anyhow!(
                "day list needs (ms, sunrise, sunset) triples, got {} values",
                flat.len()
            ));
        }
        let days = flat
            .chunks_exact(3)
            .map(|d| DayInfo::new(d[0], d[1], d[2]))
            .collect();
        Ok(Self::new(days))
    }

    pub fn find(&self, ms: f64) -> Option<DayInfo> {
        if self.repeat {
            let day = self.days.first()?;
            let offset = ((ms - day.solar_noon()) / DAY_MS).round();
            return Some(day.shifted(offset as i32));
        }
        self.days
            .iter()
            .filter(|d| (ms - d.solar_noon()).abs() <= DAY_MS * 0.5)
            .min_by(|a, b| {
                (ms - a.solar_noon())
                    .abs()
                    .total_cmp(&(ms - b.solar_noon()).abs())
            })
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::{DayTable, ElementId};
    use crate::sky_core::time::{DayInfo, DAY_MS, HOUR_MS};

    const MIDNIGHT: f64 = 1_699_920_000_000.0;

    fn day(midnight: f64) -> DayInfo {
        DayInfo::new(midnight, midnight + 6.0 * HOUR_MS, midnight + 18.0 * HOUR_MS)
    }

    #[test]
    fn table_finds_the_day_with_the_nearest_noon() {
        let table = DayTable::new(vec![day(MIDNIGHT + DAY_MS), day(MIDNIGHT)]);
        assert_eq!(table.find(MIDNIGHT + 3.0 * HOUR_MS), Some(day(MIDNIGHT)));
        assert_eq!(table.find(MIDNIGHT + 30.0 * HOUR_MS), Some(day(MIDNIGHT + DAY_MS)));
        assert_eq!(table.find(MIDNIGHT + 5.0 * DAY_MS), None);
    }

    #[test]
    fn repeating_table_shifts_to_any_day() {
        let table = DayTable::repeating(day(MIDNIGHT));
        let found = table.find(MIDNIGHT + 3.0 * DAY_MS + 2.0 * HOUR_MS).unwrap();
        assert_eq!(found, day(MIDNIGHT + 3.0 * DAY_MS));
    }

    #[test]
    fn flat_day_lists_must_be_whole_triples() {
        let m = MIDNIGHT;
        let flat = [m, m + 6.0 * HOUR_MS, m + 18.0 * HOUR_MS];
        let table = DayTable::from_flat(&flat).unwrap();
        assert_eq!(table.find(m + 12.0 * HOUR_MS), Some(day(m)));

        assert!(DayTable::from_flat(&[m, m + 6.0 * HOUR_MS]).is_err());
        assert!(DayTable::from_flat(&[]).unwrap().find(m).is_none());
    }

    #[test]
    fn element_ids_reject_lossy_numbers() {
        assert_eq!(ElementId::from_js_number(42.0).unwrap(), ElementId(42));
        assert_eq!(ElementId::from_js_number(0.0).unwrap(), ElementId(0));
        for bad in [-1.0, 2.5, f64::NAN, f64::INFINITY, 1e17] {
            assert!(ElementId::from_js_number(bad).is_err(), "{bad}");
        }
    }
}
