#[macro_use]
mod par;

pub mod atmosphere;
pub mod color;
pub mod config;
pub mod palette;
pub mod solar;
pub mod time;
