//! Native preview tool: prints the scattering gradient and palette colors for one
//! moment, optionally writes them to a PNG, and can replay a scrub through the animator.

mod config;
mod png;

pub use config::PreviewConfig;
pub use png::write_preview_png;

use anyhow::Result;

use crate::sky_core::atmosphere::render_sky_gradient;
use crate::sky_core::color::{ColorTriple, Rgb};
use crate::sky_core::config::SkyConfig;
use crate::sky_core::palette::{sky_colors_for_altitude, sky_colors_with};
use crate::sky_core::solar::solar_position;
use crate::sky_core::time::{
    Clock, DayInfo, SimulatedClock, SystemClock, DAY_MS, HOUR_MS, MINUTE_MS,
};
use crate::sky_runtime::{DayTable, ElementId, SkyAnimator, SkyFrame, SkyHost, TrackingState};

/// Schedule used when no day is given on the command line: a 12 hour day.
const EXAMPLE_SUNRISE: f64 = 1_700_000_000_000.0;
const EXAMPLE_SUNSET: f64 = 1_700_043_600_000.0;

const SIMULATED_FRAME_SECONDS: f64 = 1.0 / 60.0;
const SIMULATION_LIMIT_SECONDS: f64 = 60.0;

pub fn run(preview: &PreviewConfig) -> Result<()> {
    let mut sky = match &preview.config_path {
        Some(path) => SkyConfig::load_from(path),
        None => SkyConfig::load(),
    };
    if let Some(space) = preview.space {
        sky.color_space = space;
    }

    let (day, time_ms) = preview_day(preview, &SystemClock);
    let (sunrise, sunset) = (day.sunrise, day.sunset);

    let (altitude_deg, triple) = match preview.altitude_deg {
        Some(deg) => {
            let triple = sky_colors_for_altitude(&sky.palettes, deg, true, sky.color_space);
            (deg, triple)
        }
        None => {
            let sun = solar_position(time_ms, sunrise, sunset);
            let triple = sky_colors_with(&sky.palettes, time_ms, sunrise, sunset, sky.color_space);
            (sun.degrees(), triple)
        }
    };

    let gradient = render_sky_gradient(altitude_deg.to_radians());
    println!("altitude: {altitude_deg:.2} deg");
    println!("palette:  {}", format_triple(&triple));
    println!("zenith:   {}", gradient.zenith_color);
    println!("horizon:  {}", gradient.horizon_color);
    println!("gradient: {}", gradient.gradient);

    if let Some(path) = &preview.png_path {
        write_preview_png(path, &gradient, &triple, sky.color_space)?;
    }

    if let Some(scrub_to) = preview.simulate_scrub_to {
        simulate_scrub(sky, day, time_ms, scrub_to);
    }
    Ok(())
}

/// The day to preview and the moment within it. Without `--time` the moment is
/// `clock`'s now; without `--sunrise`/`--sunset` the example day's schedule is
/// repeated onto whichever day that moment falls in.
fn preview_day(preview: &PreviewConfig, clock: &impl Clock) -> (DayInfo, f64) {
    let time_ms = preview.time_ms.unwrap_or_else(|| clock.now_ms());
    match (preview.sunrise_ms, preview.sunset_ms) {
        (Some(sunrise), Some(sunset)) => {
            let day = DayInfo::new(sunrise - 6.0 * HOUR_MS, sunrise, sunset);
            (day, time_ms)
        }
        _ => {
            let example =
                DayInfo::new(EXAMPLE_SUNRISE - 6.0 * HOUR_MS, EXAMPLE_SUNRISE, EXAMPLE_SUNSET);
            let day = DayTable::repeating(example).find(time_ms).unwrap_or(example);
            (day, time_ms)
        }
    }
}

struct PreviewHost {
    clock: SimulatedClock,
    days: DayTable,
    tracking: Option<f64>,
}

impl Clock for PreviewHost {
    fn now_ms(&self) -> f64 {
        self.clock.now_ms()
    }
}

impl SkyHost for PreviewHost {
    fn find_day_for_ms(&self, ms: f64) -> Option<DayInfo> {
        self.days.find(ms)
    }

    fn tracking_state(&self) -> TrackingState {
        match self.tracking {
            Some(target) => TrackingState::tracking(target, ElementId(1)),
            None => TrackingState::idle(self.now_ms()),
        }
    }

    fn paint(&mut self, frame: &SkyFrame) {
        println!(
            "{}  {}{}",
            clock_label(frame.display_ms),
            format_triple(&frame.colors),
            if frame.is_transitioning { "  (fading)" } else { "" }
        );
    }
}

/// Drives the animator at 60 fps: track `from_ms`, let it settle, then drag to `to_ms`.
fn simulate_scrub(config: SkyConfig, day: DayInfo, from_ms: f64, to_ms: f64) -> SkyFrame {
    let host = PreviewHost {
        clock: SimulatedClock::new(from_ms, 1.0),
        days: DayTable::repeating(day),
        tracking: Some(from_ms),
    };
    let mut animator = SkyAnimator::new(host, config);

    let mut frame = animator.tick();
    let mut elapsed = 0.0;
    let mut dragged = false;
    let mut frames = 0usize;
    while elapsed < SIMULATION_LIMIT_SECONDS {
        animator.host_mut().clock.update(SIMULATED_FRAME_SECONDS);
        elapsed += SIMULATED_FRAME_SECONDS;
        frame = animator.tick();
        frames += 1;

        if !dragged && !frame.is_transitioning && frame.display_ms == from_ms {
            log::info!("dragging to {}", clock_label(to_ms));
            animator.host_mut().tracking = Some(to_ms);
            dragged = true;
        } else if dragged && frame.display_ms == to_ms {
            break;
        }
    }

    log::info!(
        "scrub finished after {frames} frames ({:.1} min per frame on average)",
        (to_ms - from_ms).abs() / MINUTE_MS / frames.max(1) as f64
    );
    animator.destroy();
    frame
}

fn format_triple(triple: &ColorTriple) -> String {
    triple
        .iter()
        .map(|c: &Rgb| c.to_hex())
        .collect::<Vec<_>>()
        .join(" ")
}

/// UTC wall-clock label.
fn clock_label(ms: f64) -> String {
    let minutes = (ms.rem_euclid(DAY_MS) / MINUTE_MS).floor() as u32;
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}
