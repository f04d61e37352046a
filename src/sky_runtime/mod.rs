pub mod animator;
pub mod host;
pub mod scrub;

pub use animator::{SkyAnimator, SkyFrame, TransitionPhase};
pub use host::{DayTable, ElementId, SkyHost, TrackingState};
