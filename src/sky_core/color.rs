//! Color conversion, perceptual distance and interpolation shared by both sky renderers
//! and the animator.

use std::fmt;

use anyhow::{anyhow, Context, Result};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// An sRGB color with channels in `[0, 1]`. Serialized as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

/// Gradient stops ordered `[horizon, middle, zenith]`.
pub type ColorTriple = [Rgb; 3];

pub const HORIZON: usize = 0;
pub const MIDDLE: usize = 1;
pub const ZENITH: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorSpace {
    Srgb,
    #[serde(alias = "linear")]
    LinearSrgb,
    #[default]
    Oklab,
    Oklch,
}

impl std::str::FromStr for ColorSpace {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "srgb" => Ok(Self::Srgb),
            "linear" | "linear_srgb" | "linear-srgb" => Ok(Self::LinearSrgb),
            "oklab" => Ok(Self::Oklab),
            "oklch" => Ok(Self::Oklch),
            other => Err(anyhow!("unknown color space: {other}")),
        }
    }
}

impl Rgb {
    pub const BLACK: Rgb = Rgb {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };
    pub const WHITE: Rgb = Rgb {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };

    pub fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub fn from_hex_u32(hex: u32) -> Self {
        Self::from_u8([(hex >> 16) as u8, (hex >> 8) as u8, hex as u8])
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let digits = s.trim().trim_start_matches('#');
        let expanded: String = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect(),
            6 => digits.to_string(),
            _ => return Err(anyhow!("expected #rgb or #rrggbb, got {s:?}")),
        };
        let value =
            u32::from_str_radix(&expanded, 16).with_context(|| format!("invalid hex color {s:?}"))?;
        Ok(Self::from_hex_u32(value))
    }

    pub fn from_u8(rgb: [u8; 3]) -> Self {
        Self::new(
            rgb[0] as f32 / 255.0,
            rgb[1] as f32 / 255.0,
            rgb[2] as f32 / 255.0,
        )
    }

    pub fn to_u8(self) -> [u8; 3] {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b)]
    }

    pub fn to_hex(self) -> String {
        let [r, g, b] = self.to_u8();
        format!("#{r:02x}{g:02x}{b:02x}")
    }

    pub fn to_css(self) -> String {
        let [r, g, b] = self.to_u8();
        format!("rgb({r}, {g}, {b})")
    }

    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.r, self.g, self.b)
    }

    pub fn from_vec3(v: Vec3) -> Self {
        let v = v.clamp(Vec3::ZERO, Vec3::ONE);
        Self::new(v.x, v.y, v.z)
    }

    pub fn to_linear(self) -> Vec3 {
        Vec3::new(
            srgb_to_linear(self.r),
            srgb_to_linear(self.g),
            srgb_to_linear(self.b),
        )
    }

    pub fn from_linear(v: Vec3) -> Self {
        Self::from_vec3(Vec3::new(
            linear_to_srgb(v.x),
            linear_to_srgb(v.y),
            linear_to_srgb(v.z),
        ))
    }

    /// OKLab `(L, a, b)`.
    pub fn to_oklab(self) -> Vec3 {
        let c = self.to_linear();
        let l = 0.412_221_47 * c.x + 0.536_332_55 * c.y + 0.051_445_995 * c.z;
        let m = 0.211_903_5 * c.x + 0.680_699_5 * c.y + 0.107_396_96 * c.z;
        let s = 0.088_302_46 * c.x + 0.281_718_85 * c.y + 0.629_978_7 * c.z;

        let (l, m, s) = (l.cbrt(), m.cbrt(), s.cbrt());
        Vec3::new(
            0.210_454_26 * l + 0.793_617_8 * m - 0.004_072_047 * s,
            1.977_998_5 * l - 2.428_592_2 * m + 0.450_593_7 * s,
            0.025_904_037 * l + 0.782_771_77 * m - 0.808_675_77 * s,
        )
    }

    pub fn from_oklab(lab: Vec3) -> Self {
        let l = lab.x + 0.396_337_78 * lab.y + 0.215_803_76 * lab.z;
        let m = lab.x - 0.105_561_346 * lab.y - 0.063_854_17 * lab.z;
        let s = lab.x - 0.089_484_18 * lab.y - 1.291_485_5 * lab.z;

        let (l, m, s) = (l * l * l, m * m * m, s * s * s);
        Self::from_linear(Vec3::new(
            4.076_741_7 * l - 3.307_711_6 * m + 0.230_969_94 * s,
            -1.268_438 * l + 2.609_757_4 * m - 0.341_319_38 * s,
            -0.004_196_086_3 * l - 0.703_418_6 * m + 1.707_614_7 * s,
        ))
    }

    /// OKLCh `(L, C, h)` with `h` in radians.
    pub fn to_oklch(self) -> Vec3 {
        let lab = self.to_oklab();
        Vec3::new(lab.x, lab.y.hypot(lab.z), lab.z.atan2(lab.y))
    }

    pub fn from_oklch(lch: Vec3) -> Self {
        Self::from_oklab(Vec3::new(lch.x, lch.y * lch.z.cos(), lch.y * lch.z.sin()))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl TryFrom<String> for Rgb {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        Self::from_hex(&value)
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_hex()
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.040_45 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn linear_to_srgb(c: f32) -> f32 {
    let c = c.max(0.0);
    if c <= 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

/// Chroma below which a color's hue is meaningless.
const ACHROMATIC: f32 = 1e-4;

pub fn mix(a: Rgb, b: Rgb, t: f32, space: ColorSpace) -> Rgb {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    match space {
        ColorSpace::Srgb => Rgb::from_vec3(a.to_vec3().lerp(b.to_vec3(), t)),
        ColorSpace::LinearSrgb => Rgb::from_linear(a.to_linear().lerp(b.to_linear(), t)),
        ColorSpace::Oklab => Rgb::from_oklab(a.to_oklab().lerp(b.to_oklab(), t)),
        ColorSpace::Oklch => {
            let la = a.to_oklch();
            let lb = b.to_oklch();
            let (ha, hb) = match (la.y < ACHROMATIC, lb.y < ACHROMATIC) {
                (true, false) => (lb.z, lb.z),
                (false, true) => (la.z, la.z),
                _ => (la.z, lb.z),
            };
            let mut dh = hb - ha;
            if dh > std::f32::consts::PI {
                dh -= std::f32::consts::TAU;
            } else if dh < -std::f32::consts::PI {
                dh += std::f32::consts::TAU;
            }
            Rgb::from_oklch(Vec3::new(
                la.x + (lb.x - la.x) * t,
                la.y + (lb.y - la.y) * t,
                ha + dh * t,
            ))
        }
    }
}

/// Euclidean OKLab distance scaled by 100, so 1.0 is roughly one just-noticeable step.
pub fn perceptual_delta(a: Rgb, b: Rgb) -> f32 {
    (a.to_oklab() - b.to_oklab()).length() * 100.0
}

/// Moves `from` at most `max_step` perceptual units toward `to`, landing on `to` when
/// it is already within reach.
pub fn step_toward(from: Rgb, to: Rgb, max_step: f32) -> Rgb {
    let delta = perceptual_delta(from, to);
    if delta <= max_step.max(0.0) {
        return to;
    }
    mix(from, to, max_step / delta, ColorSpace::Oklab)
}

/// Picks whichever candidate stands out more against `background`. With `want_shadow`
/// the other one is returned, which pairs a text color with its outline.
pub fn contrast_color(background: Rgb, a: Rgb, b: Rgb, want_shadow: bool) -> Rgb {
    let bg = background.to_oklab().x;
    let contrast_a = (a.to_oklab().x - bg).abs();
    let contrast_b = (b.to_oklab().x - bg).abs();
    let (high, low) = if contrast_a >= contrast_b { (a, b) } else { (b, a) };
    if want_shadow {
        low
    } else {
        high
    }
}

pub fn relative_luminance(c: Vec3) -> f32 {
    c.dot(Vec3::new(0.2126, 0.7152, 0.0722))
}

pub fn mix_triple(a: &ColorTriple, b: &ColorTriple, t: f32, space: ColorSpace) -> ColorTriple {
    [
        mix(a[0], b[0], t, space),
        mix(a[1], b[1], t, space),
        mix(a[2], b[2], t, space),
    ]
}

/// Largest per-stop perceptual distance between two triples.
pub fn triple_delta(a: &ColorTriple, b: &ColorTriple) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| perceptual_delta(*x, *y))
        .fold(0.0, f32::max)
}

/// Builds a triple from caller-supplied stops. Anything but three stops is a caller
/// bug: debug builds panic, release builds pad with the last stop or truncate.
pub fn triple_from_slice(stops: &[Rgb]) -> ColorTriple {
    debug_assert_eq!(stops.len(), 3, "sky palettes need exactly three stops");
    let last = stops.last().copied().unwrap_or(Rgb::BLACK);
    let at = |i: usize| stops.get(i).copied().unwrap_or(last);
    [at(0), at(1), at(2)]
}
