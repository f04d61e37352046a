use serde::{Deserialize, Serialize};

use crate::sky_core::color::{mix_triple, ColorSpace, ColorTriple, Rgb};
use crate::sky_core::solar::solar_position;

/// Below this the sky is fully night.
pub const ASTRONOMICAL_TWILIGHT_DEG: f64 = -18.0;
/// Civil twilight ends and the golden hour begins.
pub const CIVIL_TWILIGHT_DEG: f64 = -6.0;
/// Above this the sky is fully day.
pub const GOLDEN_HOUR_END_DEG: f64 = 6.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkyPalettes {
    pub night: ColorTriple,
    pub dawn: ColorTriple,
    pub day: ColorTriple,
    pub dusk: ColorTriple,
}

impl SkyPalettes {
    pub fn builtin() -> Self {
        Self {
            night: triple(0x1b2440, 0x0f1730, 0x070b1c),
            dawn: triple(0xf6a46b, 0xc98aa4, 0x4a5a96),
            day: triple(0xbfe0f5, 0x7fbbe8, 0x3a7fd0),
            dusk: triple(0xf2844f, 0xa8628f, 0x2f3b73),
        }
    }
}

impl Default for SkyPalettes {
    fn default() -> Self {
        Self::builtin()
    }
}

fn triple(horizon: u32, middle: u32, zenith: u32) -> ColorTriple {
    [
        Rgb::from_hex_u32(horizon),
        Rgb::from_hex_u32(middle),
        Rgb::from_hex_u32(zenith),
    ]
}

pub fn sky_colors(ms: f64, sunrise: f64, sunset: f64, space: ColorSpace) -> ColorTriple {
    sky_colors_with(&SkyPalettes::builtin(), ms, sunrise, sunset, space)
}

pub fn sky_colors_with(
    palettes: &SkyPalettes,
    ms: f64,
    sunrise: f64,
    sunset: f64,
    space: ColorSpace,
) -> ColorTriple {
    let sun = solar_position(ms, sunrise, sunset);
    sky_colors_for_altitude(palettes, sun.degrees(), sun.morning, space)
}

pub fn sky_colors_for_altitude(
    palettes: &SkyPalettes,
    altitude_deg: f64,
    morning: bool,
    space: ColorSpace,
) -> ColorTriple {
    let glow = if morning {
        &palettes.dawn
    } else {
        &palettes.dusk
    };

    if altitude_deg <= ASTRONOMICAL_TWILIGHT_DEG {
        palettes.night
    } else if altitude_deg <= CIVIL_TWILIGHT_DEG {
        let t = (altitude_deg - ASTRONOMICAL_TWILIGHT_DEG) / 12.0;
        mix_triple(&palettes.night, glow, t as f32, space)
    } else if altitude_deg <= GOLDEN_HOUR_END_DEG {
        let t = (altitude_deg - CIVIL_TWILIGHT_DEG) / 12.0;
        mix_triple(glow, &palettes.day, t as f32, space)
    } else {
        palettes.day
    }
}
