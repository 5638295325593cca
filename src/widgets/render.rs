use crate::theme::Theme;
use crate::widgets::catalog::{ActivityKind, WidgetContent};
use eframe::egui::{self, Align2, FontId, RichText, Sense};

/// Draws a widget body into the space left inside its grid cell.
pub fn render_content(content: &WidgetContent, ui: &mut egui::Ui, theme: &Theme) {
    match content {
        WidgetContent::Chart { labels, values } => render_chart(labels, values, ui, theme),
        WidgetContent::Table { headers, rows } => {
            egui::Grid::new(ui.next_auto_id())
                .striped(true)
                .spacing(egui::vec2(theme.spacing_12, theme.spacing_4))
                .show(ui, |ui| {
                    for header in headers {
                        ui.label(RichText::new(header).strong().size(12.0));
                    }
                    ui.end_row();
                    for row in rows {
                        for cell in row {
                            ui.label(RichText::new(cell).size(12.0));
                        }
                        ui.end_row();
                    }
                });
        }
        WidgetContent::Card { body, tip } => {
            ui.label(RichText::new(body).color(theme.text).size(13.0));
            ui.add_space(theme.spacing_8);
            ui.label(RichText::new(tip).color(theme.text_muted).size(12.0).italics());
        }
        WidgetContent::Metric {
            value,
            label,
            change,
        } => {
            ui.vertical_centered(|ui| {
                ui.label(RichText::new(value).size(28.0).strong().color(theme.accent));
                ui.label(RichText::new(label).color(theme.text_muted).size(12.0));
                ui.label(RichText::new(change).color(theme.success).size(12.0));
            });
        }
        WidgetContent::Gauge { percentage, label } => {
            ui.vertical_centered(|ui| {
                ui.label(RichText::new(format!("{percentage}%")).size(24.0).strong());
                ui.add(
                    egui::ProgressBar::new(f32::from((*percentage).min(100)) / 100.0)
                        .fill(theme.success)
                        .desired_height(theme.spacing_8),
                );
                ui.label(RichText::new(label).color(theme.text_muted).size(12.0));
            });
        }
        WidgetContent::Activity { items } => {
            for item in items {
                let dot = match item.kind {
                    ActivityKind::Success => theme.success,
                    ActivityKind::Info => theme.accent,
                };
                ui.horizontal(|ui| {
                    ui.colored_label(dot, "●");
                    ui.label(RichText::new(&item.message).size(12.0));
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.label(RichText::new(&item.time).color(theme.text_muted).size(11.0));
                    });
                });
            }
        }
        WidgetContent::Panel { heading, body } => {
            ui.label(RichText::new(heading).size(16.0).strong());
            ui.add_space(theme.spacing_4);
            ui.label(RichText::new(body).color(theme.text).size(13.0));
        }
        WidgetContent::Themed { scheme, inner } => {
            theme.scheme_frame(*scheme).show(ui, |ui| {
                ui.set_min_size(ui.available_size());
                render_content(inner, ui, theme);
            });
        }
        WidgetContent::Placeholder { message } => {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new(message).color(theme.text_muted).size(13.0));
            });
        }
    }
}

fn render_chart(labels: &[String], values: &[f64], ui: &mut egui::Ui, theme: &Theme) {
    let size = ui.available_size().max(egui::vec2(40.0, 40.0));
    let (rect, _) = ui.allocate_exact_size(size, Sense::hover());
    let painter = ui.painter_at(rect);
    let peak = values.iter().copied().fold(0.0_f64, f64::max);
    if values.is_empty() || peak <= 0.0 {
        return;
    }

    let label_band = 16.0;
    let slot = rect.width() / values.len() as f32;
    let plot_height = (rect.height() - label_band).max(1.0);
    for (index, value) in values.iter().enumerate() {
        let height = (value / peak) as f32 * plot_height;
        let left = rect.left() + slot * index as f32 + slot * 0.2;
        let bar = egui::Rect::from_min_max(
            egui::pos2(left, rect.top() + plot_height - height),
            egui::pos2(left + slot * 0.6, rect.top() + plot_height),
        );
        painter.rect_filled(bar, egui::CornerRadius::same(2), theme.chart_bar);
        if let Some(label) = labels.get(index) {
            painter.text(
                egui::pos2(bar.center().x, rect.bottom() - label_band / 2.0),
                Align2::CENTER_CENTER,
                label,
                FontId::proportional(11.0),
                theme.text_muted,
            );
        }
    }
}
