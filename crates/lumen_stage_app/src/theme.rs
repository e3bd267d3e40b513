// SPDX-License-Identifier: MIT OR Apache-2.0
//! Site theme - the showroom's night palette with a warm lamp accent.

use egui::{Color32, Rounding, Stroke, Style, Visuals};

/// Palette for the showroom
#[derive(Debug, Clone)]
pub struct SiteColors {
    pub bg_page: Color32,
    pub bg_panel: Color32,
    pub text_primary: Color32,
    pub text_secondary: Color32,
    pub accent: Color32,
    pub accent_soft: Color32,
    pub border: Color32,
    /// Backdrops cycled through by section index
    pub section_backdrops: [Color32; 4],
}

impl Default for SiteColors {
    fn default() -> Self {
        Self {
            bg_page: Color32::from_rgb(14, 13, 12),
            bg_panel: Color32::from_rgb(26, 24, 22),
            text_primary: Color32::from_rgb(240, 234, 224),
            text_secondary: Color32::from_rgb(160, 152, 140),
            accent: Color32::from_rgb(255, 196, 92),
            accent_soft: Color32::from_rgba_unmultiplied(255, 196, 92, 40),
            border: Color32::from_rgb(58, 54, 50),
            section_backdrops: [
                Color32::from_rgb(20, 18, 17),
                Color32::from_rgb(34, 28, 22),
                Color32::from_rgb(22, 26, 30),
                Color32::from_rgb(30, 22, 26),
            ],
        }
    }
}

/// Complete site theme
#[derive(Debug, Clone)]
pub struct SiteTheme {
    pub colors: SiteColors,
    /// Heading size on stage sections
    pub heading_size: f32,
    /// Tagline size on stage sections
    pub tagline_size: f32,
    /// Widget rounding
    pub rounding: f32,
}

impl Default for SiteTheme {
    fn default() -> Self {
        Self {
            colors: SiteColors::default(),
            heading_size: 56.0,
            tagline_size: 22.0,
            rounding: 6.0,
        }
    }
}

impl SiteTheme {
    /// Backdrop for a section
    pub fn section_backdrop(&self, index: usize) -> Color32 {
        let backdrops = &self.colors.section_backdrops;
        backdrops[index % backdrops.len()]
    }

    /// Fade a color by an opacity in `0.0..=1.0`
    pub fn faded(color: Color32, opacity: f32) -> Color32 {
        color.gamma_multiply(opacity.clamp(0.0, 1.0))
    }

    /// Convert to egui Style
    pub fn to_egui_style(&self) -> Style {
        let mut style = Style::default();
        style.visuals = self.to_egui_visuals();
        style.spacing.item_spacing = egui::vec2(8.0, 10.0);
        style
    }

    /// Convert to egui Visuals
    pub fn to_egui_visuals(&self) -> Visuals {
        let colors = &self.colors;
        let mut visuals = Visuals::dark();

        visuals.window_fill = colors.bg_panel;
        visuals.window_stroke = Stroke::new(1.0, colors.border);
        visuals.window_rounding = Rounding::same(self.rounding);
        visuals.panel_fill = colors.bg_page;

        visuals.widgets.inactive.bg_fill = colors.bg_panel;
        visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, colors.text_primary);
        visuals.widgets.inactive.rounding = Rounding::same(self.rounding);
        visuals.widgets.hovered.bg_fill = colors.accent_soft;
        visuals.widgets.hovered.bg_stroke = Stroke::new(1.0, colors.accent);
        visuals.widgets.hovered.rounding = Rounding::same(self.rounding);

        visuals.selection.bg_fill = colors.accent_soft;
        visuals.selection.stroke = Stroke::new(1.0, colors.accent);
        visuals.override_text_color = Some(colors.text_primary);
        visuals.hyperlink_color = colors.accent;
        visuals.extreme_bg_color = colors.bg_page;

        visuals
    }

    /// Apply this theme to an egui context
    pub fn apply(&self, ctx: &egui::Context) {
        ctx.set_style(self.to_egui_style());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_backdrop_cycles() {
        let theme = SiteTheme::default();
        assert_eq!(theme.section_backdrop(0), theme.section_backdrop(4));
        assert_ne!(theme.section_backdrop(0), theme.section_backdrop(1));
    }

    #[test]
    fn test_faded_clamps() {
        let color = Color32::from_rgb(200, 100, 50);
        assert_eq!(SiteTheme::faded(color, 1.5), color);
        assert_eq!(SiteTheme::faded(color, -1.0), Color32::TRANSPARENT);
    }
}
