use serde::{Deserialize, Serialize};

pub const SECOND_MS: f64 = 1_000.0;
pub const MINUTE_MS: f64 = 60.0 * SECOND_MS;
pub const HOUR_MS: f64 = 60.0 * MINUTE_MS;
pub const DAY_MS: f64 = 24.0 * HOUR_MS;

/// Sunrise and sunset for one calendar day, all in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DayInfo {
    pub ms: f64,
    pub sunrise: f64,
    pub sunset: f64,
}

impl DayInfo {
    pub fn new(ms: f64, sunrise: f64, sunset: f64) -> Self {
        Self {
            ms,
            sunrise,
            sunset,
        }
    }

    pub fn solar_noon(&self) -> f64 {
        (self.sunrise + self.sunset) * 0.5
    }

    /// The same sunrise/sunset shifted by whole days.
    pub fn shifted(&self, days: i32) -> Self {
        let offset = days as f64 * DAY_MS;
        Self {
            ms: self.ms + offset,
            sunrise: self.sunrise + offset,
            sunset: self.sunset + offset,
        }
    }
}

pub trait Clock {
    fn now_ms(&self) -> f64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        #[cfg(not(target_arch = "wasm32"))]
        use std::time::{SystemTime, UNIX_EPOCH};
        #[cfg(target_arch = "wasm32")]
        use web_time::{SystemTime, UNIX_EPOCH};

        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64()
            * SECOND_MS
    }
}

/// A clock that only moves when told to, optionally faster than real time.
pub struct SimulatedClock {
    now_ms: f64,
    pub speed: f64,
}

impl SimulatedClock {
    pub fn new(start_ms: f64, speed: f64) -> Self {
        Self {
            now_ms: start_ms,
            speed,
        }
    }

    pub fn update(&mut self, dt_seconds: f64) {
        self.now_ms += dt_seconds * SECOND_MS * self.speed;
    }

    pub fn set(&mut self, ms: f64) {
        self.now_ms = ms;
    }
}

impl Clock for SimulatedClock {
    fn now_ms(&self) -> f64 {
        self.now_ms
    }
}
