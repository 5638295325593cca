use crate::widgets::catalog::ColorScheme;
use eframe::egui::{self, Color32, CornerRadius, FontId, Frame, Margin, Stroke, TextStyle};

/// Slate palette for the dashboard. The canvas sits darkest, widget cards
/// one step up, side panels in between.
#[derive(Debug, Clone)]
pub struct Theme {
    pub canvas: Color32,
    pub panel: Color32,
    pub card: Color32,
    pub card_hover: Color32,
    pub top_bar: Color32,
    pub accent: Color32,
    pub accent_pressed: Color32,
    pub success: Color32,
    pub warning: Color32,
    pub danger: Color32,
    pub text: Color32,
    pub text_muted: Color32,
    pub text_on_accent: Color32,
    pub border: Color32,
    pub grid_cell: Color32,
    pub chart_bar: Color32,
    pub spacing_4: f32,
    pub spacing_8: f32,
    pub spacing_12: f32,
    pub spacing_16: f32,
    pub radius_card: u8,
    pub radius_canvas: u8,
    pub radius_window: u8,
    pub button_height: f32,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            canvas: Color32::from_rgb(0x0B, 0x12, 0x1C),
            panel: Color32::from_rgb(0x11, 0x1A, 0x27),
            card: Color32::from_rgb(0x18, 0x23, 0x33),
            card_hover: Color32::from_rgb(0x1F, 0x2C, 0x40),
            top_bar: Color32::from_rgb(0x0E, 0x16, 0x22),
            accent: Color32::from_rgb(0x38, 0xBD, 0xF8),
            accent_pressed: Color32::from_rgb(0x02, 0x84, 0xC7),
            success: Color32::from_rgb(0x34, 0xD3, 0x99),
            warning: Color32::from_rgb(0xFB, 0xBF, 0x24),
            danger: Color32::from_rgb(0xF8, 0x71, 0x71),
            text: Color32::from_rgb(0xE2, 0xE8, 0xF0),
            text_muted: Color32::from_rgb(0x94, 0xA3, 0xB8),
            text_on_accent: Color32::from_rgb(0x08, 0x2F, 0x49),
            border: Color32::from_rgba_premultiplied(148, 163, 184, 28),
            grid_cell: Color32::from_rgba_premultiplied(56, 189, 248, 18),
            chart_bar: Color32::from_rgb(0x7D, 0xD3, 0xFC),
            spacing_4: 4.0,
            spacing_8: 8.0,
            spacing_12: 12.0,
            spacing_16: 16.0,
            radius_card: 6,
            radius_canvas: 10,
            radius_window: 8,
            button_height: 32.0,
        }
    }
}

impl Theme {
    pub fn apply_visuals(&self, ctx: &egui::Context) {
        let mut visuals = egui::Visuals::dark();
        visuals.panel_fill = self.panel;
        visuals.window_fill = self.panel;
        visuals.extreme_bg_color = self.canvas;
        visuals.faint_bg_color = self.card_hover;
        visuals.override_text_color = Some(self.text);
        visuals.hyperlink_color = self.accent;
        visuals.selection.bg_fill = self.accent_pressed;

        for state in [
            &mut visuals.widgets.noninteractive,
            &mut visuals.widgets.inactive,
            &mut visuals.widgets.open,
        ] {
            state.bg_fill = self.card;
            state.weak_bg_fill = self.card;
            state.bg_stroke = Stroke::NONE;
            state.fg_stroke.color = self.text;
        }
        visuals.widgets.hovered.bg_fill = self.card_hover;
        visuals.widgets.hovered.weak_bg_fill = self.card_hover;
        visuals.widgets.hovered.bg_stroke = Stroke::new(1.0, self.border);
        visuals.widgets.active.bg_fill = self.accent_pressed;
        visuals.widgets.active.weak_bg_fill = self.accent_pressed;
        visuals.widgets.active.bg_stroke = Stroke::NONE;

        visuals.window_stroke = Stroke::new(1.0, self.border);
        visuals.window_corner_radius = CornerRadius::same(self.radius_window);
        visuals.window_shadow = egui::epaint::Shadow {
            offset: [0, 6],
            blur: 18,
            spread: 0,
            color: Color32::from_rgba_premultiplied(0, 0, 0, 80),
        };

        let mut style = (*ctx.style()).clone();
        style.visuals = visuals;
        style.spacing.item_spacing = egui::vec2(self.spacing_8, self.spacing_8);
        style.spacing.button_padding = egui::vec2(self.spacing_12, 6.0);
        style.text_styles.insert(TextStyle::Heading, FontId::proportional(16.0));
        style.text_styles.insert(TextStyle::Body, FontId::proportional(13.0));
        style.text_styles.insert(TextStyle::Small, FontId::proportional(11.0));
        ctx.set_style(style);
    }

    pub fn composer_frame(&self) -> Frame {
        Frame::new()
            .fill(self.card)
            .inner_margin(Margin::symmetric(self.spacing_8 as i8, 6))
            .corner_radius(CornerRadius::same(self.radius_card))
            .stroke(Stroke::new(1.0, self.border))
    }

    pub fn subtle_button_stroke(&self) -> Stroke {
        Stroke::new(1.0, self.border)
    }

    /// Fill and border of a restyled widget body.
    pub fn scheme_colors(&self, scheme: ColorScheme) -> (Color32, Color32) {
        match scheme {
            ColorScheme::Blue => (
                Color32::from_rgba_premultiplied(0x1E, 0x3A, 0x8A, 140),
                Color32::from_rgb(0x3B, 0x82, 0xF6),
            ),
            ColorScheme::Green => (
                Color32::from_rgba_premultiplied(0x14, 0x53, 0x2D, 140),
                self.success,
            ),
            ColorScheme::Purple => (
                Color32::from_rgba_premultiplied(0x4C, 0x1D, 0x95, 140),
                Color32::from_rgb(0xA8, 0x55, 0xF7),
            ),
            ColorScheme::Red => (
                Color32::from_rgba_premultiplied(0x7F, 0x1D, 0x1D, 140),
                self.danger,
            ),
        }
    }

    pub fn scheme_frame(&self, scheme: ColorScheme) -> Frame {
        let (fill, border) = self.scheme_colors(scheme);
        Frame::new()
            .fill(fill)
            .inner_margin(Margin::same(self.spacing_8 as i8))
            .corner_radius(CornerRadius::same(self.radius_card))
            .stroke(Stroke::new(2.0, border))
    }
}
