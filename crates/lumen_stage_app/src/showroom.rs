// SPDX-License-Identifier: MIT OR Apache-2.0
//! Showroom stages - section content hosted inside sequenced stages.

use crate::manifest::{SectionSpec, StageSpec};
use crate::theme::SiteTheme;
use lumen_stage_sequencer::{
    NestedScrollContext, SectionFrame, SectionHost, SectionRole, Sequencer, SharedScrollState,
    StagePanel,
};
use std::time::Instant;

/// Share of a stage that must be on screen before it takes input
const INTERACTIVE_VISIBILITY: f32 = 0.9;

/// Draws section copy for one stage
pub struct ShowroomHost {
    sections: Vec<SectionSpec>,
    nested_section: Option<usize>,
    /// Scroll position of the nested panel, read by the sequencer
    nested_scroll: SharedScrollState,
    theme: SiteTheme,
}

impl ShowroomHost {
    fn opacity(frame: &SectionFrame) -> f32 {
        match frame.role {
            SectionRole::Resting => 1.0,
            SectionRole::Entering => frame.progress,
            SectionRole::Exiting => 1.0 - frame.progress,
        }
    }

    fn nested_panel_ui(&mut self, ui: &mut egui::Ui, section: &SectionSpec, frame: &SectionFrame, height: f32) {
        let color = SiteTheme::faded(self.theme.colors.text_primary, Self::opacity(frame));
        let output = egui::ScrollArea::vertical()
            .max_height(height)
            .auto_shrink([false, true])
            .show(ui, |ui| {
                for paragraph in &section.paragraphs {
                    egui::Frame::none()
                        .fill(self.theme.colors.bg_panel)
                        .rounding(self.theme.rounding)
                        .inner_margin(egui::Margin::same(16.0))
                        .show(ui, |ui| {
                            ui.label(egui::RichText::new(paragraph).size(18.0).color(color));
                        });
                    ui.add_space(12.0);
                }
            });

        // Only the settled section reports; a sliding copy would overwrite it
        if frame.role == SectionRole::Resting {
            self.nested_scroll.set(NestedScrollContext::from_metrics(
                output.state.offset.y,
                output.inner_rect.height(),
                output.content_size.y,
            ));
        }
    }
}

impl SectionHost for ShowroomHost {
    fn section_title(&self, index: usize) -> String {
        self.sections
            .get(index)
            .map_or_else(|| format!("Section {}", index + 1), |s| s.title.clone())
    }

    fn section_ui(&mut self, ui: &mut egui::Ui, frame: SectionFrame) {
        let rect = ui.max_rect();
        let opacity = Self::opacity(&frame);
        ui.painter()
            .rect_filled(rect, 0.0, self.theme.section_backdrop(frame.index));

        // Lamp glow, brightening as the section settles
        let glow_center = egui::pos2(rect.center().x, rect.top() + rect.height() * 0.18);
        ui.painter().circle_filled(
            glow_center,
            rect.width().min(rect.height()) * (0.1 + 0.08 * opacity),
            SiteTheme::faded(self.theme.colors.accent_soft, opacity),
        );

        let Some(section) = self.sections.get(frame.index).cloned() else {
            return;
        };

        ui.vertical_centered(|ui| {
            ui.add_space(rect.height() * 0.3);
            ui.label(
                egui::RichText::new(&section.title)
                    .size(self.theme.heading_size)
                    .strong()
                    .color(SiteTheme::faded(self.theme.colors.text_primary, opacity)),
            );
            if !section.tagline.is_empty() {
                ui.label(
                    egui::RichText::new(&section.tagline)
                        .size(self.theme.tagline_size)
                        .color(SiteTheme::faded(self.theme.colors.accent, opacity)),
                );
            }
            ui.add_space(24.0);

            if self.nested_section == Some(frame.index) {
                ui.set_max_width(rect.width().min(640.0));
                self.nested_panel_ui(ui, &section, &frame, rect.height() * 0.35);
            } else {
                for paragraph in &section.paragraphs {
                    ui.label(
                        egui::RichText::new(paragraph)
                            .size(18.0)
                            .color(SiteTheme::faded(self.theme.colors.text_secondary, opacity)),
                    );
                }
            }

            if !frame.viewed {
                ui.label(egui::RichText::new("new").small().color(self.theme.colors.accent));
            }
        });
    }
}

/// A named stage on the page: sequencer panel plus its content host
pub struct StageSlot {
    /// Manifest name
    pub name: String,
    /// Manifest entry the slot was built from
    pub spec: StageSpec,
    /// Stage panel driving the sequencer
    pub panel: StagePanel,
    /// Section content
    pub host: ShowroomHost,
    /// Where the stage was drawn last frame
    last_rect: Option<egui::Rect>,
    /// Whether the stage has handed scrolling back to the page since its last change
    released: bool,
}

impl StageSlot {
    /// Build a stage from its manifest entry
    pub fn build(name: &str, spec: &StageSpec, theme: &SiteTheme) -> lumen_stage_sequencer::Result<Self> {
        let nested_scroll = SharedScrollState::new();

        let stage_name = name.to_string();
        let mut sequencer = Sequencer::new(spec.sequencer_config())?.on_section_change(move |change| {
            tracing::info!(
                stage = %stage_name,
                "Showing section {} ({:?})",
                change.active_index,
                change.direction
            );
        });
        if let Some(section) = spec.nested_section {
            sequencer = sequencer.with_nested_panel(section, nested_scroll.clone())?;
        }

        Ok(Self {
            name: name.to_string(),
            spec: spec.clone(),
            panel: StagePanel::new(sequencer),
            host: ShowroomHost {
                sections: spec.sections.clone(),
                nested_section: spec.nested_section,
                nested_scroll,
                theme: theme.clone(),
            },
            last_rect: None,
            released: false,
        })
    }

    /// Whether enough of the stage was visible last frame to take input
    fn is_in_view(&self, visible: egui::Rect) -> bool {
        self.last_rect.is_some_and(|rect| {
            rect.intersect(visible).height() >= rect.height() * INTERACTIVE_VISIBILITY
        })
    }

    /// Draw the stage at `size`
    pub fn show(&mut self, ui: &mut egui::Ui, size: egui::Vec2, now: Instant) {
        self.panel.interactive = self.is_in_view(ui.clip_rect());

        let response = ui
            .push_id(&self.name, |ui| self.panel.show(ui, size, &mut self.host, now))
            .inner;
        self.last_rect = Some(response.response.rect);

        if response.change.is_some() {
            self.released = false;
        } else if response.passed_through && !self.released {
            self.released = true;
            tracing::debug!(
                stage = %self.name,
                "Page scrolling resumed at section {}",
                self.panel.sequencer().active_index()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::StageManifest;

    #[test]
    fn test_build_all_showroom_stages() {
        let manifest = StageManifest::showroom();
        let theme = SiteTheme::default();

        for (name, spec) in &manifest.stages {
            let slot = StageSlot::build(name, spec, &theme).unwrap();
            assert_eq!(slot.panel.sequencer().section_count(), spec.sections.len());
            assert_eq!(slot.panel.sequencer().active_index(), 0);
        }
    }

    #[test]
    fn test_section_titles() {
        let manifest = StageManifest::showroom();
        let slot = StageSlot::build("hero", &manifest.stages["hero"], &SiteTheme::default()).unwrap();
        assert_eq!(slot.host.section_title(0), "Lumen");
        assert_eq!(slot.host.section_title(7), "Section 8");
    }

    #[test]
    fn test_headless_frame() {
        let manifest = StageManifest::showroom();
        let mut slot = StageSlot::build("voices", &manifest.stages["voices"], &SiteTheme::default()).unwrap();
        let ctx = egui::Context::default();

        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| {
                slot.show(ui, egui::vec2(800.0, 600.0), Instant::now());
            });
        });

        assert!(slot.last_rect.is_some());
        assert!(!slot.panel.sequencer().is_transitioning());
    }

    #[test]
    fn test_release_tracks_pass_through() {
        let manifest = StageManifest::showroom();
        let mut slot = StageSlot::build("hero", &manifest.stages["hero"], &SiteTheme::default()).unwrap();
        let ctx = egui::Context::default();
        let screen = egui::Rect::from_min_size(egui::Pos2::ZERO, egui::vec2(800.0, 600.0));

        let frame = |slot: &mut StageSlot, events: Vec<egui::Event>| {
            let input = egui::RawInput {
                screen_rect: Some(screen),
                events,
                ..Default::default()
            };
            let _ = ctx.run(input, |ctx| {
                egui::CentralPanel::default().show(ctx, |ui| {
                    slot.show(ui, egui::vec2(780.0, 580.0), Instant::now());
                });
            });
        };

        // Lay out twice so the stage counts as in view and hovered
        let pointer = egui::Event::PointerMoved(egui::pos2(400.0, 300.0));
        frame(&mut slot, vec![pointer.clone()]);
        frame(&mut slot, vec![pointer]);
        assert!(slot.panel.interactive);

        // Scrolling up from the first section belongs to the page
        let wheel_up = egui::Event::MouseWheel {
            unit: egui::MouseWheelUnit::Line,
            delta: egui::vec2(0.0, 1.0),
            modifiers: egui::Modifiers::NONE,
        };
        frame(&mut slot, vec![wheel_up]);
        assert!(slot.released);

        frame(&mut slot, vec![egui::Event::Key {
            key: egui::Key::ArrowDown,
            physical_key: None,
            pressed: true,
            repeat: false,
            modifiers: egui::Modifiers::NONE,
        }]);
        assert_eq!(slot.panel.sequencer().active_index(), 1);
        assert!(!slot.released);
    }
}
