#[cfg(not(target_arch = "wasm32"))]
pub mod preview;
pub mod sky_core;
pub mod sky_runtime;

pub use sky_core::atmosphere::{render_sky_gradient, SkyGradient};
pub use sky_core::palette::sky_colors;
pub use sky_core::solar::sun_altitude;
pub use sky_runtime::{SkyAnimator, SkyFrame, SkyHost};

#[cfg(target_arch = "wasm32")]
mod web_entry {
    use wasm_bindgen::prelude::*;

    use crate::sky_core::color::{ColorSpace, ColorTriple};
    use crate::sky_core::config::SkyConfig;
    use crate::sky_core::time::{Clock, DayInfo, SimulatedClock, SystemClock};
    use crate::sky_runtime::{
        DayTable, ElementId, SkyAnimator, SkyFrame, SkyHost, TrackingState,
    };

    #[wasm_bindgen(start)]
    pub fn wasm_main() {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            // Another module already installed a logger.
            return;
        }
        log::info!("sky engine ready");
    }

    fn hex_list(triple: &ColorTriple) -> Vec<String> {
        triple.iter().map(|c| c.to_hex()).collect()
    }

    fn parse_space(space: Option<String>) -> Result<ColorSpace, JsError> {
        match space {
            Some(name) => name
                .parse()
                .map_err(|e: anyhow::Error| JsError::new(&e.to_string())),
            None => Ok(ColorSpace::default()),
        }
    }

    #[wasm_bindgen(js_name = getSunAltitude)]
    pub fn get_sun_altitude(ms: f64, sunrise: f64, sunset: f64) -> f64 {
        crate::sun_altitude(ms, sunrise, sunset)
    }

    /// `[horizon, middle, zenith]` as `#rrggbb`.
    #[wasm_bindgen(js_name = getSkyColors)]
    pub fn get_sky_colors(
        ms: f64,
        sunrise: f64,
        sunset: f64,
        space: Option<String>,
    ) -> Result<Vec<String>, JsError> {
        let space = parse_space(space)?;
        Ok(hex_list(&crate::sky_colors(ms, sunrise, sunset, space)))
    }

    #[wasm_bindgen(getter_with_clone)]
    pub struct RenderedSky {
        pub gradient: String,
        #[wasm_bindgen(js_name = zenithColor)]
        pub zenith_color: String,
        #[wasm_bindgen(js_name = horizonColor)]
        pub horizon_color: String,
        #[wasm_bindgen(js_name = zenithRgb)]
        pub zenith_rgb: Vec<u8>,
        #[wasm_bindgen(js_name = horizonRgb)]
        pub horizon_rgb: Vec<u8>,
    }

    #[wasm_bindgen(js_name = renderSkyGradient)]
    pub fn render_sky_gradient(altitude: f64) -> RenderedSky {
        let sky = crate::render_sky_gradient(altitude);
        RenderedSky {
            gradient: sky.gradient,
            zenith_color: sky.zenith_color,
            horizon_color: sky.horizon_color,
            zenith_rgb: sky.zenith_rgb.to_vec(),
            horizon_rgb: sky.horizon_rgb.to_vec(),
        }
    }

    fn js_error(e: anyhow::Error) -> JsError {
        JsError::new(&format!("{e:#}"))
    }

    /// Host state pushed in from JavaScript before every tick.
    struct PageHost {
        clock: SimulatedClock,
        days: DayTable,
        tracking: Option<(f64, ElementId)>,
    }

    impl Clock for PageHost {
        fn now_ms(&self) -> f64 {
            self.clock.now_ms()
        }
    }

    impl SkyHost for PageHost {
        fn find_day_for_ms(&self, ms: f64) -> Option<DayInfo> {
            self.days.find(ms)
        }

        fn tracking_state(&self) -> TrackingState {
            match self.tracking {
                Some((target, element)) => TrackingState::tracking(target, element),
                None => TrackingState::idle(self.now_ms()),
            }
        }
    }

    #[wasm_bindgen(getter_with_clone)]
    pub struct WasmSkyFrame {
        /// `[horizon, middle, zenith]` as `#rrggbb`.
        pub colors: Vec<String>,
        #[wasm_bindgen(js_name = displayMs)]
        pub display_ms: f64,
        #[wasm_bindgen(js_name = isTransitioning)]
        pub is_transitioning: bool,
    }

    impl From<SkyFrame> for WasmSkyFrame {
        fn from(frame: SkyFrame) -> Self {
            Self {
                colors: hex_list(&frame.colors),
                display_ms: frame.display_ms,
                is_transitioning: frame.is_transitioning,
            }
        }
    }

    #[wasm_bindgen]
    pub struct WasmSkyAnimator {
        inner: SkyAnimator<PageHost>,
    }

    #[wasm_bindgen]
    impl WasmSkyAnimator {
        /// `config_json` follows the `config.json` layout; omit it for defaults.
        /// `now_ms` defaults to the wall clock.
        #[wasm_bindgen(constructor)]
        pub fn new(
            now_ms: Option<f64>,
            config_json: Option<String>,
        ) -> Result<WasmSkyAnimator, JsError> {
            let config = match config_json {
                Some(json) => SkyConfig::from_json_str(&json).map_err(js_error)?,
                None => SkyConfig::default(),
            };
            let host = PageHost {
                clock: SimulatedClock::new(now_ms.unwrap_or_else(|| SystemClock.now_ms()), 1.0),
                days: DayTable::default(),
                tracking: None,
            };
            Ok(Self {
                inner: SkyAnimator::new(host, config),
            })
        }

        /// Flat `[ms, sunrise, sunset, ms, sunrise, sunset, ...]`.
        #[wasm_bindgen(js_name = setDays)]
        pub fn set_days(&mut self, flat: &[f64]) -> Result<(), JsError> {
            self.inner.host_mut().days = DayTable::from_flat(flat).map_err(js_error)?;
            Ok(())
        }

        /// Pass `target_ms` together with `tracked` (a stable integer id of the hovered
        /// element); leave both out when the pointer is released. `now_ms` defaults to
        /// the wall clock.
        pub fn tick(
            &mut self,
            now_ms: Option<f64>,
            target_ms: Option<f64>,
            tracked: Option<f64>,
        ) -> Result<WasmSkyFrame, JsError> {
            let tracking = match (target_ms, tracked) {
                (Some(target), Some(id)) => {
                    Some((target, ElementId::from_js_number(id).map_err(js_error)?))
                }
                (None, None) => None,
                _ => {
                    return Err(JsError::new(
                        "targetMs and tracked must be given together or not at all",
                    ))
                }
            };

            let host = self.inner.host_mut();
            host.clock.set(now_ms.unwrap_or_else(|| SystemClock.now_ms()));
            host.tracking = tracking;
            Ok(self.inner.tick().into())
        }

        #[wasm_bindgen(js_name = displayMs)]
        pub fn display_ms(&self) -> f64 {
            self.inner.display_ms()
        }

        #[wasm_bindgen(js_name = isTransitioning)]
        pub fn is_transitioning(&self) -> bool {
            self.inner.is_transitioning()
        }

        pub fn destroy(&mut self) {
            self.inner.destroy();
        }
    }
}
