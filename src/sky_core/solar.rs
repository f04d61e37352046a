use std::f64::consts::{FRAC_PI_2, PI};

use crate::sky_core::time::DAY_MS;

/// Peak solar altitude in radians. Fixed rather than derived from latitude or season.
pub const MAX_ALTITUDE: f64 = FRAC_PI_2 * 0.8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolarPosition {
    /// Elevation above the horizon in radians, negative below it.
    pub altitude: f64,
    /// True before solar noon (or before sunrise), false after.
    pub morning: bool,
}

impl SolarPosition {
    pub fn degrees(&self) -> f64 {
        self.altitude.to_degrees()
    }
}

pub fn sun_altitude(ms: f64, sunrise: f64, sunset: f64) -> f64 {
    solar_position(ms, sunrise, sunset).altitude
}

pub fn solar_position(ms: f64, sunrise: f64, sunset: f64) -> SolarPosition {
    let (ms, sunrise, sunset) = normalize(ms, sunrise, sunset);
    let day_length = sunset - sunrise;
    let half_night = (DAY_MS - day_length) * 0.5;

    if day_length > 0.0 && ms >= sunrise && ms <= sunset {
        let progress = fraction(ms - sunrise, day_length);
        return SolarPosition {
            altitude: MAX_ALTITUDE * (PI * progress).sin(),
            morning: progress < 0.5,
        };
    }

    if ms < sunrise {
        let progress = fraction(ms - (sunrise - half_night), half_night);
        SolarPosition {
            altitude: -MAX_ALTITUDE * (1.0 - progress),
            morning: true,
        }
    } else {
        let progress = fraction(ms - sunset, half_night);
        SolarPosition {
            altitude: -MAX_ALTITUDE * progress,
            morning: false,
        }
    }
}

/// Rewrites a cross-midnight day (`sunrise > sunset`) so that `sunrise < sunset`
/// holds around `ms`.
fn normalize(ms: f64, sunrise: f64, sunset: f64) -> (f64, f64, f64) {
    if sunrise <= sunset {
        return (ms, sunrise, sunset);
    }
    if ms < sunset {
        // early side of a day that started the previous evening
        (ms + DAY_MS, sunrise, sunset + DAY_MS)
    } else if ms >= sunrise {
        (ms, sunrise, sunset + DAY_MS)
    } else if ms - sunset <= sunrise - ms {
        (ms, sunrise - DAY_MS, sunset)
    } else {
        (ms, sunrise, sunset + DAY_MS)
    }
}

/// `num / den` clamped to `[0, 1]`. A degenerate span counts as fully progressed.
pub(crate) fn fraction(num: f64, den: f64) -> f64 {
    if den.is_nan() || den <= 0.0 || !num.is_finite() {
        return 1.0;
    }
    (num / den).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::{solar_position, sun_altitude, MAX_ALTITUDE};
    use crate::sky_core::time::{DAY_MS, HOUR_MS, MINUTE_MS};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const SUNRISE: f64 = 1_700_000_000_000.0;
    const SUNSET: f64 = 1_700_043_600_000.0;

    #[test]
    fn daytime_curve_is_zero_at_ends_and_peaks_at_noon() {
        assert!(sun_altitude(SUNRISE, SUNRISE, SUNSET).abs() < 1e-12);
        assert!(sun_altitude(SUNSET, SUNRISE, SUNSET).abs() < 1e-12);

        let noon = (SUNRISE + SUNSET) / 2.0;
        let peak = sun_altitude(noon, SUNRISE, SUNSET);
        assert!((peak - MAX_ALTITUDE).abs() < 1e-12);
        assert!((peak.to_degrees() - 72.0).abs() < 1e-9);

        for offset in [HOUR_MS, 3.0 * HOUR_MS, 5.0 * HOUR_MS] {
            assert!(sun_altitude(noon - offset, SUNRISE, SUNSET) < peak);
            assert!(sun_altitude(noon + offset, SUNRISE, SUNSET) < peak);
        }
    }

    #[test]
    fn no_jump_at_sunrise_or_sunset() {
        for edge in [SUNRISE, SUNSET] {
            let before = sun_altitude(edge - 1.0, SUNRISE, SUNSET);
            let after = sun_altitude(edge + 1.0, SUNRISE, SUNSET);
            assert!((before - after).abs() < 1e-6, "jump at {edge}: {before} vs {after}");
        }
    }

    #[test]
    fn night_ramps_bottom_out_at_negative_peak() {
        let day_length = SUNSET - SUNRISE;
        let half_night = (DAY_MS - day_length) / 2.0;
        let deepest = sun_altitude(SUNSET + half_night, SUNRISE, SUNSET);
        assert!((deepest + MAX_ALTITUDE).abs() < 1e-12);
        let earliest = sun_altitude(SUNRISE - half_night - HOUR_MS, SUNRISE, SUNSET);
        assert!((earliest + MAX_ALTITUDE).abs() < 1e-12);
        assert!(solar_position(SUNRISE - HOUR_MS, SUNRISE, SUNSET).morning);
        assert!(!solar_position(SUNSET + HOUR_MS, SUNRISE, SUNSET).morning);
    }

    #[test]
    fn cross_midnight_day_is_daytime_late_in_the_evening() {
        let midnight = 1_699_920_000_000.0;
        let sunrise = midnight + 22.0 * HOUR_MS;
        let sunset = midnight + 7.0 * HOUR_MS;

        assert!(sun_altitude(midnight + 23.0 * HOUR_MS, sunrise, sunset) > 0.0);
        assert!(sun_altitude(midnight + 3.0 * HOUR_MS, sunrise, sunset) > 0.0);
        assert!(sun_altitude(midnight + 14.0 * HOUR_MS, sunrise, sunset) < 0.0);
    }

    #[test]
    fn cross_midnight_night_side_is_continuous() {
        let midnight = 1_699_920_000_000.0;
        let sunrise = midnight + 22.0 * HOUR_MS;
        let sunset = midnight + 7.0 * HOUR_MS;

        let mut prev = sun_altitude(sunset, sunrise, sunset);
        let mut ms = sunset;
        while ms < sunrise {
            ms += MINUTE_MS;
            let alt = sun_altitude(ms, sunrise, sunset);
            assert!((alt - prev).abs() < 0.01, "jump at {ms}");
            prev = alt;
        }
    }

    #[test]
    fn degenerate_days_stay_finite() {
        let polar_night = sun_altitude(SUNRISE + HOUR_MS, SUNRISE, SUNRISE);
        assert!(polar_night.is_finite());
        let endless_day = sun_altitude(SUNRISE - HOUR_MS, SUNRISE, SUNRISE + 2.0 * DAY_MS);
        assert!(endless_day.is_finite());
    }

    #[test]
    fn random_samples_stay_in_range_and_move_slowly() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let ms = SUNRISE - 6.0 * HOUR_MS + rng.random_range(0.0..DAY_MS);
            let a = sun_altitude(ms, SUNRISE, SUNSET);
            let b = sun_altitude(ms + 1_000.0, SUNRISE, SUNSET);
            assert!(a.abs() <= MAX_ALTITUDE + 1e-12);
            assert!((a - b).abs() < 1e-3);
        }
    }
}
