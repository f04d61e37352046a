//! Frame-driven sky animator.
//!
//! The host calls [`SkyAnimator::tick`] once per rendered frame. When the tracked
//! target starts, stops or changes identity, the animator waits out a short settle
//! delay and then fades from the current colors to the colors at the new time. While
//! a target is being tracked and nothing is fading, the displayed time is scrubbed
//! toward the pointer in adaptively sized steps (see [`crate::sky_runtime::scrub`]).
//!
//! Both the settle delay and the throttled fade are deadlines checked against
//! [`SkyHost::now_ms`] inside `tick`; nothing runs between ticks.

use crate::sky_core::color::{contrast_color, mix_triple, ColorTriple, Rgb, MIDDLE};
use crate::sky_core::config::SkyConfig;
use crate::sky_core::palette::sky_colors_with;
use crate::sky_core::solar::{fraction, solar_position};
use crate::sky_core::time::{DayInfo, DAY_MS};
use crate::sky_runtime::host::{ElementId, SkyHost, TrackingState};
use crate::sky_runtime::scrub::{self, ScrubPosition};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkyFrame {
    pub colors: ColorTriple,
    pub display_ms: f64,
    pub is_transitioning: bool,
}

impl SkyFrame {
    /// Foreground and matching shadow for text drawn over the middle of the sky.
    pub fn text_colors(&self, light: Rgb, dark: Rgb) -> (Rgb, Rgb) {
        let background = self.colors[MIDDLE];
        (
            contrast_color(background, light, dark, false),
            contrast_color(background, light, dark, true),
        )
    }
}

/// A fade in flight from the colors on screen to the sky at `target_ms`.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    target_ms: f64,
    from: ColorTriple,
    to: ColorTriple,
    started_at_ms: f64,
    next_frame_at_ms: f64,
}

impl Transition {
    pub fn target_ms(&self) -> f64 {
        self.target_ms
    }

    /// Colors the fade ends on.
    pub fn to(&self) -> ColorTriple {
        self.to
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransitionPhase {
    Idle,
    Settling { fires_at_ms: f64, target_ms: f64 },
    Transitioning(Transition),
}

pub struct SkyAnimator<H: SkyHost> {
    host: H,
    config: SkyConfig,
    display_ms: f64,
    display_colors: ColorTriple,
    scrub_target_ms: f64,
    scrub_start_display_ms: f64,
    phase: TransitionPhase,
    was_tracking: bool,
    last_tracked: Option<ElementId>,
    destroyed: bool,
}

impl<H: SkyHost> SkyAnimator<H> {
    /// Starts on the configured default colors and immediately schedules a fade to the
    /// sky at the host's current time.
    pub fn new(host: H, config: SkyConfig) -> Self {
        let now = host.now_ms();
        let mut animator = Self {
            host,
            display_ms: now,
            display_colors: config.default_colors,
            scrub_target_ms: now,
            scrub_start_display_ms: now,
            phase: TransitionPhase::Idle,
            was_tracking: false,
            last_tracked: None,
            destroyed: false,
            config,
        };
        animator.schedule_settle(now, now);
        animator
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn colors(&self) -> ColorTriple {
        self.display_colors
    }

    pub fn display_ms(&self) -> f64 {
        self.display_ms
    }

    pub fn is_transitioning(&self) -> bool {
        !matches!(self.phase, TransitionPhase::Idle)
    }

    pub fn phase(&self) -> &TransitionPhase {
        &self.phase
    }

    pub fn frame(&self) -> SkyFrame {
        SkyFrame {
            colors: self.display_colors,
            display_ms: self.display_ms,
            is_transitioning: self.is_transitioning(),
        }
    }

    pub fn tick(&mut self) -> SkyFrame {
        if self.destroyed {
            return self.frame();
        }

        let now = self.host.now_ms();
        let tracking = self.host.tracking_state();
        let before = (self.display_ms, self.display_colors);

        if self.target_changed(&tracking) {
            let target_ms = if tracking.is_tracking() {
                tracking.target_ms
            } else {
                now
            };
            self.schedule_settle(now, target_ms);
        }

        self.advance_phase(now);

        if tracking.is_tracking() && !self.is_transitioning() {
            self.scrub(tracking.target_ms);
        }

        let frame = self.frame();
        if before != (frame.display_ms, frame.colors) {
            self.host.paint(&frame);
        }
        frame
    }

    /// Cancels any pending settle or fade. Later ticks change nothing.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.phase = TransitionPhase::Idle;
        self.destroyed = true;
        log::debug!("sky animator destroyed at {:.0}", self.display_ms);
    }

    fn target_changed(&mut self, tracking: &TrackingState) -> bool {
        let is_tracking = tracking.is_tracking();
        let changed = is_tracking != self.was_tracking
            || (is_tracking && tracking.tracked != self.last_tracked);
        self.was_tracking = is_tracking;
        self.last_tracked = tracking.tracked;
        changed
    }

    /// Replaces whatever was pending with a fresh settle delay.
    fn schedule_settle(&mut self, now: f64, target_ms: f64) {
        if !matches!(self.phase, TransitionPhase::Idle) {
            log::debug!("cancelling pending sky transition");
        }
        self.phase = TransitionPhase::Settling {
            fires_at_ms: now + self.config.animator.settle_ms,
            target_ms,
        };
    }

    fn advance_phase(&mut self, now: f64) {
        if let TransitionPhase::Settling {
            fires_at_ms,
            target_ms,
        } = self.phase
        {
            if now >= fires_at_ms {
                self.begin_transition(now, target_ms);
            }
        }

        let TransitionPhase::Transitioning(transition) = &mut self.phase else {
            return;
        };
        if now < transition.next_frame_at_ms {
            return;
        }

        let progress = fraction(
            now - transition.started_at_ms,
            self.config.animator.transition_ms,
        );
        if progress >= 1.0 {
            let target_ms = transition.target_ms;
            self.display_colors = transition.to;
            self.finish_at(target_ms);
            return;
        }

        let eased = scrub::ease_out_expo(progress);
        self.display_colors = mix_triple(
            &transition.from,
            &transition.to,
            eased as f32,
            self.config.color_space,
        );
        transition.next_frame_at_ms = now + self.config.animator.frame_interval_ms();
    }

    fn begin_transition(&mut self, now: f64, target_ms: f64) {
        let Some(day) = self.host.find_day_for_ms(target_ms) else {
            log::debug!("no day info for {target_ms:.0}, using default colors");
            self.display_colors = self.config.default_colors;
            self.finish_at(target_ms);
            return;
        };

        log::debug!("sky transition toward {target_ms:.0}");
        self.phase = TransitionPhase::Transitioning(Transition {
            target_ms,
            from: self.display_colors,
            to: self.palette_colors(target_ms, &day),
            started_at_ms: now,
            next_frame_at_ms: now,
        });
    }

    fn finish_at(&mut self, target_ms: f64) {
        self.display_ms = target_ms;
        self.scrub_target_ms = target_ms;
        self.scrub_start_display_ms = target_ms;
        self.phase = TransitionPhase::Idle;
    }

    fn scrub(&mut self, target_ms: f64) {
        let animator = &self.config.animator;
        if (target_ms - self.scrub_target_ms).abs() > animator.snap_threshold_ms {
            self.scrub_start_display_ms = self.display_ms;
            self.scrub_target_ms = target_ms;
        }
        if self.display_ms == self.scrub_target_ms {
            return;
        }

        let Some(here) = self.host.find_day_for_ms(self.display_ms) else {
            self.display_ms = self.scrub_target_ms;
            self.display_colors = self.config.default_colors;
            return;
        };

        let days = self.days_spanning(self.display_ms, self.scrub_target_ms);
        let zones = scrub::transition_zones(&days, animator.zone_half_width_ms);

        let pos = ScrubPosition {
            display_ms: self.display_ms,
            scrub_target_ms: self.scrub_target_ms,
            scrub_start_ms: self.scrub_start_display_ms,
            altitude_deg: solar_position(self.display_ms, here.sunrise, here.sunset).degrees(),
            zones: &zones,
        };
        let next = scrub::next_display_ms(animator, &pos, |ms| self.colors_at(ms));

        self.display_ms = next;
        self.display_colors = self.colors_at(next);
    }

    /// Every known day from one day before the earlier end to one day after the later.
    fn days_spanning(&self, a: f64, b: f64) -> Vec<DayInfo> {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let mut days: Vec<DayInfo> = Vec::new();
        let mut push = |day: Option<DayInfo>| {
            if let Some(day) = day.filter(|d| !days.contains(d)) {
                days.push(day);
            }
        };

        let mut ms = lo - DAY_MS;
        while ms <= hi + DAY_MS {
            push(self.host.find_day_for_ms(ms));
            ms += DAY_MS;
        }
        push(self.host.find_day_for_ms(hi));
        days
    }

    fn colors_at(&self, ms: f64) -> ColorTriple {
        match self.host.find_day_for_ms(ms) {
            Some(day) => self.palette_colors(ms, &day),
            None => self.config.default_colors,
        }
    }

    fn palette_colors(&self, ms: f64, day: &DayInfo) -> ColorTriple {
        sky_colors_with(
            &self.config.palettes,
            ms,
            day.sunrise,
            day.sunset,
            self.config.color_space,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sky_core::palette::SkyPalettes;
    use crate::sky_core::time::{Clock, SimulatedClock, DAY_MS, HOUR_MS, SECOND_MS};
    use crate::sky_runtime::host::DayTable;

    const MIDNIGHT: f64 = 1_699_920_000_000.0;
    const SUNRISE: f64 = MIDNIGHT + 6.0 * HOUR_MS;
    const SUNSET: f64 = MIDNIGHT + 18.0 * HOUR_MS;
    const FRAME_MS: f64 = 16.0;

    struct FakeHost {
        clock: SimulatedClock,
        days: DayTable,
        tracking: Option<(f64, ElementId)>,
        paints: usize,
    }

    impl Clock for FakeHost {
        fn now_ms(&self) -> f64 {
            self.clock.now_ms()
        }
    }

    impl SkyHost for FakeHost {
        fn find_day_for_ms(&self, ms: f64) -> Option<DayInfo> {
            self.days.find(ms)
        }

        fn tracking_state(&self) -> TrackingState {
            match self.tracking {
                Some((target, id)) => TrackingState::tracking(target, id),
                None => TrackingState::idle(self.now_ms()),
            }
        }

        fn paint(&mut self, _frame: &SkyFrame) {
            self.paints += 1;
        }
    }

    fn animator_at(now: f64, days: DayTable) -> SkyAnimator<FakeHost> {
        let host = FakeHost {
            clock: SimulatedClock::new(now, 1.0),
            days,
            tracking: None,
            paints: 0,
        };
        SkyAnimator::new(host, SkyConfig::default())
    }

    fn today() -> DayTable {
        DayTable::repeating(DayInfo::new(MIDNIGHT, SUNRISE, SUNSET))
    }

    fn run_for(animator: &mut SkyAnimator<FakeHost>, duration_ms: f64) -> Vec<SkyFrame> {
        let mut frames = Vec::new();
        let end = animator.host().now_ms() + duration_ms;
        while animator.host().now_ms() < end {
            animator.host_mut().clock.update(FRAME_MS / 1000.0);
            frames.push(animator.tick());
        }
        frames
    }

    fn track(animator: &mut SkyAnimator<FakeHost>, target: f64, id: u64) {
        animator.host_mut().tracking = Some((target, ElementId(id)));
    }

    /// Starts tracking `target` and waits for the fade to land on it.
    fn settled_on(target: f64) -> SkyAnimator<FakeHost> {
        let mut animator = animator_at(MIDNIGHT + 12.0 * HOUR_MS, today());
        run_for(&mut animator, 500.0);
        track(&mut animator, target, 1);
        run_for(&mut animator, 500.0);
        assert!(!animator.is_transitioning());
        assert_eq!(animator.display_ms(), target);
        animator
    }

    #[test]
    fn first_frames_fade_from_defaults_to_the_current_sky() {
        let now = MIDNIGHT + 12.0 * HOUR_MS;
        let mut animator = animator_at(now, today());
        assert_eq!(animator.colors(), SkyConfig::default().default_colors);
        assert!(animator.is_transitioning());

        let frames = run_for(&mut animator, 500.0);
        assert!(frames.iter().any(|f| f.is_transitioning));
        assert!(!animator.is_transitioning());
        assert_eq!(animator.colors(), SkyPalettes::builtin().day);
        assert_eq!(animator.display_ms(), now);
        assert!(animator.host().paints > 0);
    }

    #[test]
    fn new_target_settles_then_fades_and_lands_on_it() {
        let mut animator = animator_at(MIDNIGHT + 12.0 * HOUR_MS, today());
        run_for(&mut animator, 500.0);

        let target = MIDNIGHT + 2.0 * HOUR_MS;
        track(&mut animator, target, 1);
        let frames = run_for(&mut animator, 80.0);
        assert!(frames.iter().all(|f| f.is_transitioning));
        assert!(frames.iter().all(|f| f.colors == SkyPalettes::builtin().day));
        assert!(frames.iter().all(|f| f.display_ms == MIDNIGHT + 12.0 * HOUR_MS));

        run_for(&mut animator, 500.0);
        assert!(!animator.is_transitioning());
        assert_eq!(animator.display_ms(), target);
        assert_eq!(animator.colors(), SkyPalettes::builtin().night);
        assert_eq!(animator.scrub_target_ms, target);
    }

    #[test]
    fn fade_updates_are_throttled() {
        let mut animator = animator_at(MIDNIGHT + 12.0 * HOUR_MS, today());
        run_for(&mut animator, 500.0);
        track(&mut animator, MIDNIGHT + 2.0 * HOUR_MS, 1);

        let mut changes = 0;
        let mut last = animator.colors();
        let end = animator.host().now_ms() + 600.0;
        while animator.host().now_ms() < end {
            animator.host_mut().clock.update(0.004);
            let frame = animator.tick();
            if frame.colors != last {
                changes += 1;
                last = frame.colors;
            }
        }
        assert!(changes >= 3, "{changes} color updates");
        assert!(changes <= 7, "{changes} color updates");
    }

    #[test]
    fn switching_elements_mid_fade_restarts_toward_the_new_target() {
        let mut animator = animator_at(MIDNIGHT + 12.0 * HOUR_MS, today());
        run_for(&mut animator, 500.0);

        track(&mut animator, MIDNIGHT + 2.0 * HOUR_MS, 1);
        run_for(&mut animator, 200.0);
        let TransitionPhase::Transitioning(fade) = animator.phase() else {
            panic!("expected a fade, got {:?}", animator.phase());
        };
        assert_eq!(fade.target_ms(), MIDNIGHT + 2.0 * HOUR_MS);
        assert_eq!(fade.to(), SkyPalettes::builtin().night);

        let second = MIDNIGHT + 14.0 * HOUR_MS;
        track(&mut animator, second, 2);
        animator.host_mut().clock.update(FRAME_MS / 1000.0);
        animator.tick();
        assert!(matches!(
            animator.phase(),
            TransitionPhase::Settling { target_ms, .. } if *target_ms == second
        ));

        run_for(&mut animator, 500.0);
        assert_eq!(animator.display_ms(), second);
        assert_eq!(animator.colors(), SkyPalettes::builtin().day);
    }

    #[test]
    fn releasing_the_pointer_fades_back_to_now() {
        let mut animator = settled_on(MIDNIGHT + 2.0 * HOUR_MS);
        animator.host_mut().tracking = None;
        run_for(&mut animator, 500.0);
        let now = animator.host().now_ms();
        assert!(!animator.is_transitioning());
        assert!((animator.display_ms() - now).abs() < 1_000.0);
        assert_eq!(animator.colors(), SkyPalettes::builtin().day);

        let held = animator.display_ms();
        run_for(&mut animator, 1_000.0);
        assert_eq!(animator.display_ms(), held);
    }

    #[test]
    fn close_targets_snap_on_the_next_tick() {
        let mut animator = settled_on(MIDNIGHT + 12.0 * HOUR_MS);
        animator.display_ms = animator.scrub_target_ms - 10.0 * SECOND_MS;
        animator.host_mut().clock.update(FRAME_MS / 1000.0);
        let frame = animator.tick();
        assert_eq!(frame.display_ms, animator.scrub_target_ms);
        assert_eq!(frame.display_ms, MIDNIGHT + 12.0 * HOUR_MS);
    }

    #[test]
    fn scrubbing_moves_strictly_toward_a_fixed_target() {
        let mut animator = settled_on(MIDNIGHT + 8.0 * HOUR_MS);
        let target = MIDNIGHT + 23.0 * HOUR_MS;
        track(&mut animator, target, 1);

        let mut distance = (target - animator.display_ms()).abs();
        let mut ticks = 0;
        while animator.display_ms() != target {
            animator.host_mut().clock.update(FRAME_MS / 1000.0);
            animator.tick();
            let next = (target - animator.display_ms()).abs();
            assert!(next < distance, "stalled at {}", animator.display_ms());
            distance = next;
            ticks += 1;
            assert!(ticks < 2_000, "scrub never finished");
        }
        assert!(!animator.is_transitioning());
    }

    #[test]
    fn scrub_skips_transitions_it_is_only_passing_through() {
        let mut animator = settled_on(MIDNIGHT + 2.0 * HOUR_MS);
        let target = MIDNIGHT + 20.0 * HOUR_MS;
        track(&mut animator, target, 1);

        let mut visited = Vec::new();
        let mut ticks = 0;
        while animator.display_ms() != target {
            animator.host_mut().clock.update(FRAME_MS / 1000.0);
            visited.push(animator.tick().display_ms);
            ticks += 1;
            assert!(ticks < 2_000, "scrub never finished");
        }

        assert_eq!(visited[0], SUNSET - HOUR_MS);
        let sunrise_zone = (SUNRISE - HOUR_MS)..=(SUNRISE + HOUR_MS);
        assert!(visited.iter().all(|ms| !sunrise_zone.contains(ms)));
        let in_sunset_zone = visited
            .iter()
            .filter(|ms| (SUNSET - HOUR_MS..=SUNSET + HOUR_MS).contains(*ms))
            .count();
        assert!(in_sunset_zone > 10, "only {in_sunset_zone} frames through dusk");
    }

    #[test]
    fn multi_day_scrub_skips_straight_to_the_last_transition() {
        let mut animator = settled_on(MIDNIGHT + 2.0 * HOUR_MS);
        let target = MIDNIGHT + 3.0 * DAY_MS + 4.0 * HOUR_MS;
        track(&mut animator, target, 1);

        let mut jumps = Vec::new();
        let mut ticks = 0;
        while animator.display_ms() != target {
            let before = animator.display_ms();
            animator.host_mut().clock.update(FRAME_MS / 1000.0);
            let after = animator.tick().display_ms;
            if after - before > 5.0 * HOUR_MS {
                jumps.push(after);
            }
            ticks += 1;
            assert!(ticks < 2_000, "scrub never finished");
        }

        assert_eq!(jumps, vec![SUNSET + 2.0 * DAY_MS - HOUR_MS]);
    }

    #[test]
    fn destroy_stops_all_further_changes() {
        let mut animator = animator_at(MIDNIGHT + 12.0 * HOUR_MS, today());
        track(&mut animator, MIDNIGHT + 2.0 * HOUR_MS, 1);
        run_for(&mut animator, 150.0);
        assert!(animator.is_transitioning());

        animator.destroy();
        animator.destroy();
        let frozen = animator.frame();
        let paints = animator.host().paints;

        track(&mut animator, MIDNIGHT + 20.0 * HOUR_MS, 2);
        let frames = run_for(&mut animator, 1_000.0);
        assert!(frames.iter().all(|f| f.colors == frozen.colors));
        assert!(frames.iter().all(|f| f.display_ms == frozen.display_ms));
        assert!(!animator.is_transitioning());
        assert_eq!(animator.host().paints, paints);
    }

    #[test]
    fn missing_day_info_uses_defaults_instantly() {
        let mut animator = animator_at(MIDNIGHT + 12.0 * HOUR_MS, DayTable::default());
        let defaults = SkyConfig::default().default_colors;

        let frames = run_for(&mut animator, 200.0);
        assert!(!frames.iter().any(|f| f.colors != defaults));
        assert!(!animator.is_transitioning());

        track(&mut animator, MIDNIGHT + 2.0 * HOUR_MS, 1);
        run_for(&mut animator, 200.0);
        assert_eq!(animator.display_ms(), MIDNIGHT + 2.0 * HOUR_MS);

        track(&mut animator, MIDNIGHT + 9.0 * HOUR_MS, 1);
        animator.host_mut().clock.update(FRAME_MS / 1000.0);
        let frame = animator.tick();
        assert_eq!(frame.display_ms, MIDNIGHT + 9.0 * HOUR_MS);
        assert_eq!(frame.colors, defaults);
    }

    #[test]
    fn text_colors_follow_the_sky() {
        let night = SkyFrame {
            colors: SkyPalettes::builtin().night,
            display_ms: 0.0,
            is_transitioning: false,
        };
        assert_eq!(night.text_colors(Rgb::WHITE, Rgb::BLACK), (Rgb::WHITE, Rgb::BLACK));
    }
}
