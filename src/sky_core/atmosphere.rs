//! Single-scattering sky model.
//!
//! Marches 32 view rays from a camera just above the ground out to the top of the
//! atmosphere and accumulates Rayleigh and Mie in-scattering, attenuated by Rayleigh,
//! Mie and ozone extinction along both the view ray and the ray toward the sun. Each
//! ray's radiance is exposed, warmed slightly when dim, ACES tonemapped and gamma
//! encoded into one gradient stop.
//!
//! This is too slow to run every frame; the animator uses the palette interpolator.

use std::f64::consts::PI;

use glam::{DVec3, Vec3};
use serde::Serialize;

use crate::sky_core::color::{relative_luminance, Rgb};

const GROUND_RADIUS: f64 = 6_360_000.0;
const TOP_RADIUS: f64 = 6_460_000.0;
const CAMERA_HEIGHT: f64 = 200.0;

const RAYLEIGH_SCATTERING: DVec3 = DVec3::new(5.802e-6, 13.558e-6, 33.1e-6);
const RAYLEIGH_SCALE_HEIGHT: f64 = 8_000.0;
const MIE_SCATTERING: f64 = 3.996e-6;
const MIE_EXTINCTION: f64 = 4.440e-6;
const MIE_SCALE_HEIGHT: f64 = 1_200.0;
const MIE_ASYMMETRY: f64 = 0.8;
const OZONE_ABSORPTION: DVec3 = DVec3::new(0.650e-6, 1.881e-6, 0.085e-6);
const OZONE_CENTER: f64 = 25_000.0;
const OZONE_HALF_WIDTH: f64 = 15_000.0;

const SUN_INTENSITY: f64 = 20.0;
const EXPOSURE: f32 = 1.2;
const WARM_BIAS: Vec3 = Vec3::new(0.12, 0.03, -0.08);
const WARM_KNEE: f32 = 0.05;
const GAMMA: f32 = 1.0 / 2.2;

pub const VIEW_SAMPLES: usize = 32;
pub const MARCH_STEPS: usize = 32;
const LIGHT_STEPS: usize = 8;

const FIELD_OF_VIEW_DEG: f64 = 80.0;
const HORIZON_TILT_DEG: f64 = 0.5;
const VIEW_AZIMUTH_DEG: f64 = 45.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradientStop {
    /// 0 at the zenith sample, 100 at the horizon sample.
    pub offset: f32,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkyGradient {
    /// CSS `linear-gradient(to bottom, ...)`.
    pub gradient: String,
    pub zenith_color: String,
    pub horizon_color: String,
    pub zenith_rgb: [u8; 3],
    pub horizon_rgb: [u8; 3],
    pub stops: Vec<GradientStop>,
}

impl SkyGradient {
    /// Color at `t` from 0 (top) to 1 (bottom), linear between stops.
    pub fn sample(&self, t: f32) -> Rgb {
        let Some(last) = self.stops.last() else {
            return Rgb::BLACK;
        };
        let offset = t.clamp(0.0, 1.0) * 100.0;
        let mut prev = &self.stops[0];
        for stop in &self.stops {
            if stop.offset >= offset {
                let span = stop.offset - prev.offset;
                if span <= 0.0 || stop.offset == offset {
                    return stop.color;
                }
                let local = (offset - prev.offset) / span;
                return Rgb::from_vec3(prev.color.to_vec3().lerp(stop.color.to_vec3(), local));
            }
            prev = stop;
        }
        last.color
    }
}

pub fn render_sky_gradient(altitude: f64) -> SkyGradient {
    let sun = DVec3::new(altitude.cos(), altitude.sin(), 0.0);

    let colors = maybe_par_map!(0..VIEW_SAMPLES, |i| {
        let radiance = in_scattered_radiance(view_direction(i), sun);
        Rgb::from_vec3(post_process(radiance.as_vec3()))
    });

    let stops: Vec<GradientStop> = colors
        .into_iter()
        .enumerate()
        .map(|(i, color)| GradientStop {
            offset: i as f32 / (VIEW_SAMPLES - 1) as f32 * 100.0,
            color,
        })
        .collect();

    let body = stops
        .iter()
        .map(|s| format!("{} {:.2}%", s.color.to_css(), s.offset))
        .collect::<Vec<_>>()
        .join(", ");

    let zenith = stops[0].color;
    let horizon = stops[VIEW_SAMPLES - 1].color;

    SkyGradient {
        gradient: format!("linear-gradient(to bottom, {body})"),
        zenith_color: zenith.to_css(),
        horizon_color: horizon.to_css(),
        zenith_rgb: zenith.to_u8(),
        horizon_rgb: horizon.to_u8(),
        stops,
    }
}

/// Sample 0 looks highest, the last sample sits just above the horizon.
fn view_direction(i: usize) -> DVec3 {
    let top_down = 1.0 - i as f64 / (VIEW_SAMPLES - 1) as f64;
    let elevation = (HORIZON_TILT_DEG + FIELD_OF_VIEW_DEG * top_down).to_radians();
    let azimuth = VIEW_AZIMUTH_DEG.to_radians();
    DVec3::new(
        elevation.cos() * azimuth.cos(),
        elevation.sin(),
        elevation.cos() * azimuth.sin(),
    )
}

#[derive(Clone, Copy, Default)]
struct Density {
    rayleigh: f64,
    mie: f64,
    ozone: f64,
}

impl Density {
    fn at(point: DVec3) -> Self {
        let height = (point.length() - GROUND_RADIUS).max(0.0);
        Self {
            rayleigh: (-height / RAYLEIGH_SCALE_HEIGHT).exp(),
            mie: (-height / MIE_SCALE_HEIGHT).exp(),
            ozone: (1.0 - (height - OZONE_CENTER).abs() / OZONE_HALF_WIDTH).max(0.0),
        }
    }

    fn accumulate(&mut self, other: Density, ds: f64) {
        self.rayleigh += other.rayleigh * ds;
        self.mie += other.mie * ds;
        self.ozone += other.ozone * ds;
    }

    /// Beer–Lambert transmittance for this much optical depth.
    fn transmittance(&self, other: &Density) -> DVec3 {
        let tau = RAYLEIGH_SCATTERING * (self.rayleigh + other.rayleigh)
            + DVec3::splat(MIE_EXTINCTION * (self.mie + other.mie))
            + OZONE_ABSORPTION * (self.ozone + other.ozone);
        DVec3::new((-tau.x).exp(), (-tau.y).exp(), (-tau.z).exp())
    }
}

fn in_scattered_radiance(dir: DVec3, sun: DVec3) -> DVec3 {
    let origin = DVec3::new(0.0, GROUND_RADIUS + CAMERA_HEIGHT, 0.0);
    let Some((_, mut t_max)) = ray_sphere(origin, dir, TOP_RADIUS) else {
        return DVec3::ZERO;
    };
    if let Some((t_ground, _)) = ray_sphere(origin, dir, GROUND_RADIUS) {
        if t_ground > 0.0 {
            t_max = t_ground;
        }
    }

    let mu = dir.dot(sun);
    let phase_r = rayleigh_phase(mu);
    let phase_m = mie_phase(mu);

    let ds = t_max / MARCH_STEPS as f64;
    let mut view_depth = Density::default();
    let mut radiance = DVec3::ZERO;

    for step in 0..MARCH_STEPS {
        let point = origin + dir * ((step as f64 + 0.5) * ds);
        let local = Density::at(point);
        view_depth.accumulate(local, ds);

        let Some(sun_depth) = sun_optical_depth(point, sun) else {
            continue;
        };
        let transmittance = view_depth.transmittance(&sun_depth);
        let scattering = RAYLEIGH_SCATTERING * (local.rayleigh * phase_r)
            + DVec3::splat(MIE_SCATTERING * local.mie * phase_m);
        radiance += transmittance * scattering * ds;
    }

    radiance * SUN_INTENSITY
}

/// Optical depth from `point` to the top of the atmosphere toward the sun, or `None`
/// when the planet is in the way.
fn sun_optical_depth(point: DVec3, sun: DVec3) -> Option<Density> {
    if let Some((t_ground, _)) = ray_sphere(point, sun, GROUND_RADIUS) {
        if t_ground > 0.0 {
            return None;
        }
    }
    let (_, t_exit) = ray_sphere(point, sun, TOP_RADIUS)?;
    let ds = t_exit.max(0.0) / LIGHT_STEPS as f64;
    let mut depth = Density::default();
    for step in 0..LIGHT_STEPS {
        let p = point + sun * ((step as f64 + 0.5) * ds);
        depth.accumulate(Density::at(p), ds);
    }
    Some(depth)
}

/// Both intersection distances of a ray with a sphere centred on the planet.
fn ray_sphere(origin: DVec3, dir: DVec3, radius: f64) -> Option<(f64, f64)> {
    let b = origin.dot(dir);
    let c = origin.length_squared() - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let root = disc.sqrt();
    Some((-b - root, -b + root))
}

fn rayleigh_phase(mu: f64) -> f64 {
    3.0 / (16.0 * PI) * (1.0 + mu * mu)
}

fn mie_phase(mu: f64) -> f64 {
    let g = MIE_ASYMMETRY;
    let denom = (1.0 + g * g - 2.0 * g * mu).max(1e-6);
    (1.0 - g * g) / (4.0 * PI * denom.powf(1.5))
}

// warm bias runs before the tonemap
fn post_process(radiance: Vec3) -> Vec3 {
    let exposed = radiance * EXPOSURE;
    let luminance = relative_luminance(exposed).max(0.0);
    let warmth = WARM_KNEE / (WARM_KNEE + luminance);
    let biased = exposed * (Vec3::ONE + WARM_BIAS * warmth);
    aces(biased).powf(GAMMA)
}

fn aces(x: Vec3) -> Vec3 {
    let x = x.max(Vec3::ZERO);
    let mapped = (x * (x * 2.51 + 0.03)) / (x * (x * 2.43 + 0.59) + 0.14);
    mapped.clamp(Vec3::ZERO, Vec3::ONE)
}
