use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};

use crate::sky_core::color::ColorSpace;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PreviewConfig {
    pub altitude_deg: Option<f64>,
    pub time_ms: Option<f64>,
    pub sunrise_ms: Option<f64>,
    pub sunset_ms: Option<f64>,
    pub space: Option<ColorSpace>,
    pub png_path: Option<PathBuf>,
    pub simulate_scrub_to: Option<f64>,
    /// `None` reads `config.json` from the working directory.
    pub config_path: Option<PathBuf>,
}

impl PreviewConfig {
    pub fn from_env_args() -> Result<Self> {
        Self::from_iter(
            std::env::args_os().skip(1),
            std::env::var_os("SKY_ENGINE_CONFIG"),
        )
    }

    fn from_iter<I>(args: I, env_config: Option<OsString>) -> Result<Self>
    where
        I: IntoIterator<Item = OsString>,
    {
        let mut config = Self::default();

        if let Some(path) = env_config.filter(|p| !p.is_empty()) {
            config.config_path = Some(PathBuf::from(path));
        }

        let mut iter = args.into_iter();
        while let Some(arg) = iter.next() {
            let arg_str = arg.to_string_lossy().to_string();
            let mut value = || -> Result<String> {
                iter.next()
                    .map(|v| v.to_string_lossy().to_string())
                    .ok_or_else(|| anyhow!("{arg_str} requires a value"))
            };
            match arg_str.as_str() {
                "--altitude" => config.altitude_deg = Some(parse_number(&arg_str, &value()?)?),
                "--time" => config.time_ms = Some(parse_number(&arg_str, &value()?)?),
                "--sunrise" => config.sunrise_ms = Some(parse_number(&arg_str, &value()?)?),
                "--sunset" => config.sunset_ms = Some(parse_number(&arg_str, &value()?)?),
                "--space" => config.space = Some(value()?.parse()?),
                "--png" => config.png_path = Some(PathBuf::from(value()?)),
                "--simulate-scrub" => {
                    config.simulate_scrub_to = Some(parse_number(&arg_str, &value()?)?)
                }
                "--config" => config.config_path = Some(PathBuf::from(value()?)),
                other => return Err(anyhow!("unknown argument: {other}")),
            }
        }

        if config.sunrise_ms.is_some() != config.sunset_ms.is_some() {
            return Err(anyhow!("--sunrise and --sunset must be given together"));
        }
        Ok(config)
    }
}

fn parse_number(flag: &str, value: &str) -> Result<f64> {
    let parsed: f64 = value
        .trim()
        .parse()
        .with_context(|| format!("{flag} expects a number, got {value:?}"))?;
    if !parsed.is_finite() {
        return Err(anyhow!("{flag} must be finite"));
    }
    Ok(parsed)
}
