use std::path::Path;

use anyhow::{Context, Result};

use crate::sky_core::atmosphere::SkyGradient;
use crate::sky_core::color::{mix, ColorSpace, ColorTriple, HORIZON, MIDDLE, ZENITH};

const WIDTH: u32 = 256;
const HEIGHT: u32 = 512;

/// Left half: the scattering gradient. Right half: the palette triple, zenith on top.
pub fn write_preview_png(
    path: &Path,
    gradient: &SkyGradient,
    triple: &ColorTriple,
    space: ColorSpace,
) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let image = image::RgbImage::from_fn(WIDTH, HEIGHT, |x, y| {
        let t = y as f32 / (HEIGHT - 1) as f32;
        let color = if x < WIDTH / 2 {
            gradient.sample(t)
        } else if t < 0.5 {
            mix(triple[ZENITH], triple[MIDDLE], t * 2.0, space)
        } else {
            mix(triple[MIDDLE], triple[HORIZON], t * 2.0 - 1.0, space)
        };
        image::Rgb(color.to_u8())
    });

    image
        .save(path)
        .with_context(|| format!("failed to encode {}", path.display()))?;
    log::info!("preview saved: {}", path.display());
    Ok(())
}
