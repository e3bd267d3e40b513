// SPDX-License-Identifier: MIT OR Apache-2.0
//! Stage UI rendering.
//!
//! Features:
//! - Raw input collection from egui (wheel, touch, arrow keys)
//! - Native scroll suppression for consumed input
//! - Enter/exit slide animation driven by the last direction
//! - Section indicator dots

use crate::input::{NavKey, RawInput};
use crate::intent::Direction;
use crate::sequencer::{InputOutcome, Sequencer};
use crate::state::SectionChange;
use egui::{Color32, Pos2, Rect, Sense, Stroke, Vec2};
use std::time::{Duration, Instant};

const INDICATOR_RADIUS: f32 = 4.0;
const INDICATOR_SPACING: f32 = 16.0;
const INDICATOR_MARGIN: f32 = 24.0;

/// How long a handled wheel notch keeps the page still.
///
/// egui spreads a notch over several frames; this outlasts that.
pub const WHEEL_SETTLE: Duration = Duration::from_millis(500);

const NAV_KEYS: [(egui::Key, NavKey); 4] = [
    (egui::Key::ArrowUp, NavKey::ArrowUp),
    (egui::Key::ArrowDown, NavKey::ArrowDown),
    (egui::Key::ArrowLeft, NavKey::ArrowLeft),
    (egui::Key::ArrowRight, NavKey::ArrowRight),
];

/// Collects raw stage input from an egui context
#[derive(Debug, Default)]
pub struct StageInput {
    /// Touch currently tracked for swipe detection
    active_touch: Option<egui::TouchId>,
}

impl StageInput {
    /// Create a new input collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Gather this frame's raw events.
    ///
    /// Only the first finger of a multi-touch gesture is tracked.
    pub fn collect(&mut self, ctx: &egui::Context) -> Vec<RawInput> {
        ctx.input(|input| {
            let mut raw = Vec::new();

            for event in &input.events {
                if let egui::Event::Touch { id, phase, pos, .. } = event {
                    match phase {
                        egui::TouchPhase::Start if self.active_touch.is_none() => {
                            self.active_touch = Some(*id);
                            raw.push(RawInput::TouchStart { y: Some(pos.y) });
                        }
                        egui::TouchPhase::End if self.active_touch == Some(*id) => {
                            self.active_touch = None;
                            raw.push(RawInput::TouchEnd { y: Some(pos.y) });
                        }
                        egui::TouchPhase::Cancel if self.active_touch == Some(*id) => {
                            self.active_touch = None;
                            raw.push(RawInput::TouchCancel);
                        }
                        _ => {}
                    }
                }
            }

            // egui reports positive y when content should move down
            let delta_y = -input.raw_scroll_delta.y;
            if delta_y != 0.0 {
                raw.push(RawInput::Wheel { delta_y });
            }

            for (key, nav) in NAV_KEYS {
                if input.key_pressed(key) {
                    raw.push(RawInput::Key(nav));
                }
            }

            raw
        })
    }

    /// Forget the tracked touch, returning the cancel the sequencer never saw
    pub fn release(&mut self) -> Option<RawInput> {
        self.active_touch.take().map(|_| RawInput::TouchCancel)
    }

    /// Drop this frame's scrolling, including any smoothed leftover
    pub fn suppress_scroll(ctx: &egui::Context) {
        ctx.input_mut(|input| {
            input.raw_scroll_delta = Vec2::ZERO;
            input.smooth_scroll_delta = Vec2::ZERO;
        });
    }

    /// Keep a consumed event away from scroll areas and other widgets
    pub fn suppress_native(ctx: &egui::Context, raw: &RawInput) {
        match raw {
            RawInput::Wheel { .. } => Self::suppress_scroll(ctx),
            RawInput::Key(nav) => {
                if let Some((key, _)) = NAV_KEYS.iter().find(|(_, n)| n == nav) {
                    ctx.input_mut(|input| input.consume_key(egui::Modifiers::NONE, *key));
                }
            }
            RawInput::TouchStart { .. } | RawInput::TouchEnd { .. } | RawInput::TouchCancel => {}
        }
    }
}

/// How a section is being shown this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionRole {
    /// Active and settled
    Resting,
    /// Sliding in
    Entering,
    /// Sliding out
    Exiting,
}

/// Per-frame rendering context handed to the section host
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectionFrame {
    /// Section being drawn
    pub index: usize,
    /// Resting, entering or exiting
    pub role: SectionRole,
    /// Direction of the transition in progress (or the last one)
    pub direction: Direction,
    /// Eased transition progress in `0.0..=1.0`
    pub progress: f32,
    /// Whether the section has ever been active
    pub viewed: bool,
}

/// Owner of the actual section content
pub trait SectionHost {
    /// Short label for the section indicator
    fn section_title(&self, index: usize) -> String;

    /// Draw one section into `ui`
    fn section_ui(&mut self, ui: &mut egui::Ui, frame: SectionFrame);
}

/// A running slide animation between two sections
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageTransition {
    /// Section sliding out
    pub from: usize,
    /// Section sliding in
    pub to: usize,
    /// Direction of travel
    pub direction: Direction,
    /// When the animation began
    pub started_at: Instant,
    /// Animation length
    pub duration: Duration,
}

impl StageTransition {
    /// Start animating a section change
    pub fn new(change: SectionChange, started_at: Instant, duration: Duration) -> Self {
        Self {
            from: change.previous_index,
            to: change.active_index,
            direction: change.direction,
            started_at,
            duration,
        }
    }

    /// Linear progress in `0.0..=1.0`
    pub fn linear_progress(&self, now: Instant) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.started_at);
        (elapsed.as_secs_f32() / self.duration.as_secs_f32()).clamp(0.0, 1.0)
    }

    /// Eased progress in `0.0..=1.0`
    pub fn progress(&self, now: Instant) -> f32 {
        ease_out_cubic(self.linear_progress(now))
    }

    /// Whether the animation has run its course
    pub fn is_finished(&self, now: Instant) -> bool {
        self.linear_progress(now) >= 1.0
    }

    /// Vertical offsets `(exiting, entering)` for a stage `height` tall.
    ///
    /// The entering section comes in from the side matching the direction;
    /// the exiting one leaves towards the opposite side.
    pub fn offsets(&self, progress: f32, height: f32) -> (f32, f32) {
        let sign = self.direction.factor();
        let exiting = -sign * progress * height;
        let entering = sign * (1.0 - progress) * height;
        (exiting, entering)
    }
}

fn ease_out_cubic(t: f32) -> f32 {
    1.0 - (1.0 - t).powi(3)
}

/// Result of showing a stage for one frame
#[derive(Debug)]
pub struct StageResponse {
    /// Response covering the whole stage
    pub response: egui::Response,
    /// Section change triggered this frame, if any
    pub change: Option<SectionChange>,
    /// Whether any event this frame was handed back to native scrolling
    pub passed_through: bool,
}

/// A full-viewport stage driven by a [`Sequencer`]
#[derive(Debug)]
pub struct StagePanel {
    /// The sequencer driving this stage
    sequencer: Sequencer,
    /// Raw input collector
    input: StageInput,
    /// Slide animation in progress
    transition: Option<StageTransition>,
    /// Page scrolling is dropped until then after a consumed wheel
    page_hold_until: Option<Instant>,
    /// Scrolling the nested panel leaves over is dropped until then
    nested_hold_until: Option<Instant>,
    /// Whether the stage listens to input this frame
    pub interactive: bool,
    /// Draw the section indicator dots
    pub show_indicator: bool,
}

impl StagePanel {
    /// Create a stage panel around a sequencer
    pub fn new(sequencer: Sequencer) -> Self {
        Self {
            sequencer,
            input: StageInput::new(),
            transition: None,
            page_hold_until: None,
            nested_hold_until: None,
            interactive: true,
            show_indicator: true,
        }
    }

    /// The underlying sequencer
    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    /// The slide animation in progress, if any
    pub fn transition(&self) -> Option<&StageTransition> {
        self.transition.as_ref()
    }

    /// Feed raw events to the sequencer and start animations.
    ///
    /// Returns the section change (if any) and whether anything passed through.
    pub fn process_input(
        &mut self,
        ctx: &egui::Context,
        raw_inputs: &[RawInput],
        now: Instant,
    ) -> (Option<SectionChange>, bool) {
        let mut change = None;
        let mut passed_through = false;

        for raw in raw_inputs {
            let is_wheel = matches!(raw, RawInput::Wheel { .. });
            let outcome = self.sequencer.handle_input(*raw, now);
            match outcome {
                InputOutcome::PassThrough => {
                    if is_wheel {
                        self.page_hold_until = None;
                        self.nested_hold_until = None;
                    }
                    if !matches!(raw, RawInput::TouchStart { .. }) {
                        passed_through = true;
                    }
                }
                InputOutcome::NestedScroll => {
                    if is_wheel {
                        self.nested_hold_until = Some(now + WHEEL_SETTLE);
                    }
                }
                InputOutcome::Dropped | InputOutcome::Transitioned(_) => {
                    StageInput::suppress_native(ctx, raw);
                    if is_wheel {
                        self.page_hold_until = Some(now + WHEEL_SETTLE);
                    }
                }
            }
            if let InputOutcome::Transitioned(section_change) = outcome {
                self.transition = Some(StageTransition::new(
                    section_change,
                    now,
                    self.sequencer.config().transition_duration(),
                ));
                change = Some(section_change);
            }
        }

        (change, passed_through)
    }

    /// Show the stage at `size`, letting `host` draw the sections
    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        size: Vec2,
        host: &mut dyn SectionHost,
        now: Instant,
    ) -> StageResponse {
        self.sequencer.poll(now);

        let (rect, response) = ui.allocate_exact_size(size, Sense::hover());

        let mut change = None;
        let mut passed_through = false;
        if self.interactive {
            let hovered = response.contains_pointer();
            let raw: Vec<RawInput> = self
                .input
                .collect(ui.ctx())
                .into_iter()
                .filter(|raw| hovered || matches!(raw, RawInput::Key(_)))
                .collect();
            (change, passed_through) = self.process_input(ui.ctx(), &raw, now);
        } else {
            self.page_hold_until = None;
            self.nested_hold_until = None;
            // A gesture cut off here will never report its end
            if let Some(cancel) = self.input.release() {
                self.sequencer.handle_input(cancel, now);
            }
        }

        self.page_hold_until = self.page_hold_until.filter(|until| now < *until);
        self.nested_hold_until = self.nested_hold_until.filter(|until| now < *until);
        let holding_page = self.interactive
            && (self.sequencer.is_transitioning() || self.page_hold_until.is_some());
        if holding_page {
            StageInput::suppress_scroll(ui.ctx());
        }

        if self.transition.is_some_and(|t| t.is_finished(now)) {
            self.transition = None;
        }

        match self.transition {
            Some(transition) => {
                let progress = transition.progress(now);
                let (exit_offset, enter_offset) = transition.offsets(progress, rect.height());
                self.section_ui(ui, rect, transition.from, SectionRole::Exiting, exit_offset, progress, host);
                self.section_ui(ui, rect, transition.to, SectionRole::Entering, enter_offset, progress, host);
                ui.ctx().request_repaint();
            }
            None => {
                let active = self.sequencer.active_index();
                self.section_ui(ui, rect, active, SectionRole::Resting, 0.0, 1.0, host);
            }
        }

        // The nested panel has taken what it could; the rest must not reach the page
        if self.interactive && self.nested_hold_until.is_some() {
            StageInput::suppress_scroll(ui.ctx());
        }

        if self.show_indicator {
            self.draw_indicator(ui, rect, &*host);
        }

        if let Some(remaining) = self.sequencer.remaining(now) {
            ui.ctx().request_repaint_after(remaining);
        }

        StageResponse {
            response,
            change,
            passed_through,
        }
    }

    fn section_ui(
        &self,
        ui: &mut egui::Ui,
        stage_rect: Rect,
        index: usize,
        role: SectionRole,
        offset_y: f32,
        progress: f32,
        host: &mut dyn SectionHost,
    ) {
        let rect = stage_rect.translate(Vec2::new(0.0, offset_y));
        let frame = SectionFrame {
            index,
            role,
            direction: self.sequencer.direction(),
            progress,
            viewed: self.sequencer.sections().get(index).is_some_and(|s| s.viewed),
        };

        let mut child = ui.new_child(egui::UiBuilder::new().max_rect(rect));
        child.set_clip_rect(stage_rect.intersect(ui.clip_rect()));
        child.push_id(("lumen_stage_section", index), |ui| {
            host.section_ui(ui, frame);
        });
    }

    fn draw_indicator(&self, ui: &egui::Ui, rect: Rect, host: &dyn SectionHost) {
        let painter = ui.painter_at(rect);
        let count = self.sequencer.section_count();
        let total_height = INDICATOR_SPACING * (count.saturating_sub(1)) as f32;
        let x = rect.right() - INDICATOR_MARGIN;
        let top = rect.center().y - total_height / 2.0;
        let active = self.sequencer.active_index();

        for (i, section) in self.sequencer.sections().iter().enumerate() {
            let center = Pos2::new(x, top + INDICATOR_SPACING * i as f32);
            if i == active {
                painter.circle_filled(center, INDICATOR_RADIUS + 1.5, Color32::from_rgb(255, 196, 92));
            } else if section.viewed {
                painter.circle_filled(center, INDICATOR_RADIUS, Color32::from_gray(170));
            } else {
                painter.circle_stroke(center, INDICATOR_RADIUS, Stroke::new(1.0, Color32::from_gray(120)));
            }

            let hit = Rect::from_center_size(center, Vec2::splat(INDICATOR_SPACING));
            ui.interact(hit, ui.id().with(("lumen_stage_indicator", i)), Sense::hover())
                .on_hover_text(host.section_title(i));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::{NestedScrollContext, SharedScrollState};
    use crate::config::SequencerConfig;

    const FRAME: Duration = Duration::from_millis(16);

    struct BlankHost;

    impl SectionHost for BlankHost {
        fn section_title(&self, index: usize) -> String {
            format!("Section {index}")
        }

        fn section_ui(&mut self, _ui: &mut egui::Ui, _frame: SectionFrame) {}
    }

    fn wheel_down() -> egui::Event {
        egui::Event::MouseWheel {
            unit: egui::MouseWheelUnit::Line,
            delta: Vec2::new(0.0, -1.0),
            modifiers: egui::Modifiers::NONE,
        }
    }

    /// Run one frame of a scrolling page topped by `panel`, returning the page offset
    fn page_frame(ctx: &egui::Context, panel: &mut StagePanel, events: Vec<egui::Event>, now: Instant) -> f32 {
        let input = egui::RawInput {
            screen_rect: Some(Rect::from_min_size(Pos2::ZERO, Vec2::new(800.0, 600.0))),
            events,
            ..Default::default()
        };
        let mut offset = 0.0;
        let _ = ctx.run(input, |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| {
                let output = egui::ScrollArea::vertical().show(ui, |ui| {
                    panel.show(ui, Vec2::new(760.0, 560.0), &mut BlankHost, now);
                    ui.add_space(2000.0);
                });
                offset = output.state.offset.y;
            });
        });
        offset
    }

    /// Lay the page out with the pointer resting on the stage
    fn hover_stage(ctx: &egui::Context, panel: &mut StagePanel, t0: Instant) -> Instant {
        for i in 0..2 {
            let pointer = egui::Event::PointerMoved(Pos2::new(400.0, 300.0));
            page_frame(ctx, panel, vec![pointer], t0 + FRAME * i);
        }
        t0 + FRAME * 2
    }

    fn change(from: usize, to: usize, direction: Direction) -> SectionChange {
        SectionChange {
            active_index: to,
            previous_index: from,
            direction,
        }
    }

    #[test]
    fn test_transition_progress() {
        let t0 = Instant::now();
        let transition = StageTransition::new(
            change(0, 1, Direction::Forward),
            t0,
            Duration::from_millis(800),
        );

        assert_eq!(transition.linear_progress(t0), 0.0);
        assert!((transition.linear_progress(t0 + Duration::from_millis(400)) - 0.5).abs() < 1e-3);
        assert!(transition.progress(t0 + Duration::from_millis(400)) > 0.5);
        assert!(!transition.is_finished(t0 + Duration::from_millis(799)));
        assert!(transition.is_finished(t0 + Duration::from_millis(800)));
        assert_eq!(transition.progress(t0 + Duration::from_secs(3)), 1.0);
    }

    #[test]
    fn test_forward_offsets() {
        let transition = StageTransition::new(
            change(0, 1, Direction::Forward),
            Instant::now(),
            Duration::from_millis(800),
        );

        // Entering section starts below the stage, exiting one leaves upwards
        assert_eq!(transition.offsets(0.0, 600.0), (0.0, 600.0));
        assert_eq!(transition.offsets(1.0, 600.0), (-600.0, 0.0));
    }

    #[test]
    fn test_backward_offsets() {
        let transition = StageTransition::new(
            change(2, 1, Direction::Backward),
            Instant::now(),
            Duration::from_millis(800),
        );

        let (exiting, entering) = transition.offsets(0.5, 600.0);
        assert_eq!(exiting, 300.0);
        assert_eq!(entering, -300.0);
    }

    #[test]
    fn test_process_input_starts_transition() {
        let ctx = egui::Context::default();
        let sequencer = Sequencer::new(SequencerConfig::new(3)).unwrap();
        let mut panel = StagePanel::new(sequencer);
        let now = Instant::now();

        let (change, passed) = panel.process_input(&ctx, &[RawInput::Key(NavKey::ArrowDown)], now);
        assert_eq!(change.map(|c| c.active_index), Some(1));
        assert!(!passed);
        assert_eq!(panel.transition().map(|t| t.to), Some(1));

        // Retreat while locked is held, not passed through
        let (change, passed) = panel.process_input(&ctx, &[RawInput::Wheel { delta_y: -40.0 }], now);
        assert!(change.is_none());
        assert!(!passed);
    }

    #[test]
    fn test_process_input_passes_through_at_top() {
        let ctx = egui::Context::default();
        let sequencer = Sequencer::new(SequencerConfig::new(3)).unwrap();
        let mut panel = StagePanel::new(sequencer);

        let (change, passed) = panel.process_input(
            &ctx,
            &[RawInput::Wheel { delta_y: -40.0 }],
            Instant::now(),
        );
        assert!(change.is_none());
        assert!(passed);
        assert_eq!(panel.sequencer().active_index(), 0);
    }

    #[test]
    fn test_consumed_wheel_keeps_page_still() {
        let ctx = egui::Context::default();
        let mut panel = StagePanel::new(Sequencer::new(SequencerConfig::new(3)).unwrap());
        let mut now = hover_stage(&ctx, &mut panel, Instant::now());

        let offset = page_frame(&ctx, &mut panel, vec![wheel_down()], now);
        assert_eq!(panel.sequencer().active_index(), 1);
        assert_eq!(offset, 0.0);

        // The notch keeps draining into the smoothed delta for a while
        for _ in 0..40 {
            now += FRAME;
            assert_eq!(page_frame(&ctx, &mut panel, Vec::new(), now), 0.0);
        }
        assert_eq!(panel.sequencer().active_index(), 1);
    }

    #[test]
    fn test_held_wheel_at_exit_gate_keeps_page_still() {
        let ctx = egui::Context::default();
        let sequencer = Sequencer::restore(SequencerConfig::new(3), 2, &[0, 2]).unwrap();
        let mut panel = StagePanel::new(sequencer);
        let mut now = hover_stage(&ctx, &mut panel, Instant::now());

        for frame in 0..30 {
            let events = if frame % 5 == 0 { vec![wheel_down()] } else { Vec::new() };
            assert_eq!(page_frame(&ctx, &mut panel, events, now), 0.0);
            now += FRAME;
        }
        assert_eq!(panel.sequencer().active_index(), 2);
        assert!(!panel.sequencer().is_transitioning());
    }

    #[test]
    fn test_open_exit_gate_scrolls_page() {
        let ctx = egui::Context::default();
        let sequencer = Sequencer::restore(SequencerConfig::new(3), 2, &[0, 1, 2]).unwrap();
        let mut panel = StagePanel::new(sequencer);
        let mut now = hover_stage(&ctx, &mut panel, Instant::now());

        let mut offset = page_frame(&ctx, &mut panel, vec![wheel_down()], now);
        for _ in 0..20 {
            now += FRAME;
            offset = page_frame(&ctx, &mut panel, Vec::new(), now);
        }
        assert!(offset > 0.0);
        assert_eq!(panel.sequencer().active_index(), 2);
    }

    #[test]
    fn test_nested_scroll_away_from_panel_keeps_page_still() {
        let ctx = egui::Context::default();
        let nested = SharedScrollState::new();
        nested.set(NestedScrollContext::from_metrics(100.0, 100.0, 600.0));
        let sequencer = Sequencer::restore(SequencerConfig::new(3), 1, &[0, 1])
            .unwrap()
            .with_nested_panel(1, nested)
            .unwrap();
        let mut panel = StagePanel::new(sequencer);
        let mut now = hover_stage(&ctx, &mut panel, Instant::now());

        // No nested scroll area is under the pointer, so nothing may move
        for _ in 0..20 {
            assert_eq!(page_frame(&ctx, &mut panel, vec![wheel_down()], now), 0.0);
            now += FRAME;
        }
        assert_eq!(panel.sequencer().active_index(), 1);
        assert!(!panel.sequencer().sections()[2].viewed);
    }

    #[test]
    fn test_release_returns_cancel() {
        let mut input = StageInput::new();
        assert_eq!(input.release(), None);

        input.active_touch = Some(egui::TouchId(3));
        assert_eq!(input.release(), Some(RawInput::TouchCancel));
        assert_eq!(input.active_touch, None);
    }

    #[test]
    fn test_leaving_view_releases_touch() {
        let ctx = egui::Context::default();
        let mut panel = StagePanel::new(Sequencer::new(SequencerConfig::new(3)).unwrap());
        panel.input.active_touch = Some(egui::TouchId(7));
        panel.interactive = false;

        let offset = page_frame(&ctx, &mut panel, Vec::new(), Instant::now());
        assert_eq!(offset, 0.0);
        assert_eq!(panel.input.active_touch, None);
    }
}
