// Binary entry point, native only.
// On wasm32 the cdylib exports in lib.rs are used instead.

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    use sky_engine::preview::{self, PreviewConfig};

    env_logger::init();
    let config = PreviewConfig::from_env_args()?;
    log::debug!("preview options: {config:?}");
    preview::run(&config)
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Wasm entry point is #[wasm_bindgen(start)] in lib.rs.
}
