/// Maps `$f` over `$range` into a `Vec`, across the rayon pool on native targets.
/// Output order always follows the range.
#[cfg(not(target_arch = "wasm32"))]
macro_rules! maybe_par_map {
    ($range:expr, $f:expr) => {{
        use rayon::prelude::*;
        ($range).into_par_iter().map($f).collect::<Vec<_>>()
    }};
}

#[cfg(target_arch = "wasm32")]
macro_rules! maybe_par_map {
    ($range:expr, $f:expr) => {
        ($range).into_iter().map($f).collect::<Vec<_>>()
    };
}
