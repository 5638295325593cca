use crate::chat::assistant::{apply_action, respond, welcome_message};
use crate::chat::responder::Responder;
use crate::chat::{ChatMessage, ChatOwner, Sender, Suggestion};
use crate::config::{AppConfig, GridConfig};
use crate::dashboard::store::{canvas_height, LayoutChange, LayoutStore};
use crate::dashboard::LayoutRect;
use crate::event::AppEvent;
use crate::persistence::gateway::PersistenceGateway;
use crate::theme::Theme;
use crate::widgets::catalog::WidgetRegistry;
use crate::widgets::render::render_content;
use chrono::Local;
use eframe::egui::{self, Color32, CornerRadius, RichText, ScrollArea, Sense, Stroke, UiBuilder};
use std::sync::mpsc::{Receiver, TryRecvError};
use tracing::{debug, info};

const TITLE_BAR_HEIGHT: f32 = 28.0;
const RESIZE_HANDLE: f32 = 14.0;

/// Pixel mapping of the grid canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
struct GridGeometry {
    origin: egui::Pos2,
    col_width: f32,
    row_height: f32,
    margin: f32,
}

impl GridGeometry {
    fn new(canvas: egui::Rect, grid: &GridConfig) -> Self {
        let columns = grid.columns.max(1) as f32;
        let usable = canvas.width() - grid.margin * (columns + 1.0);
        Self {
            origin: canvas.min,
            col_width: (usable / columns).max(1.0),
            row_height: grid.row_height,
            margin: grid.margin,
        }
    }

    fn cell_rect(&self, rect: &LayoutRect) -> egui::Rect {
        let span = |cells: u32, unit: f32| {
            let cells = cells.max(1) as f32;
            cells * unit + (cells - 1.0) * self.margin
        };
        let min = egui::pos2(
            self.origin.x + self.margin + rect.x as f32 * (self.col_width + self.margin),
            self.origin.y + self.margin + rect.y as f32 * (self.row_height + self.margin),
        );
        egui::Rect::from_min_size(
            min,
            egui::vec2(span(rect.w, self.col_width), span(rect.h, self.row_height)),
        )
    }

    fn columns_in(&self, dx: f32) -> i64 {
        (dx / (self.col_width + self.margin)).round() as i64
    }

    fn rows_in(&self, dy: f32) -> i64 {
        (dy / (self.row_height + self.margin)).round() as i64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DragKind {
    Move,
    Resize,
}

#[derive(Debug, Clone, PartialEq)]
struct DragState {
    id: String,
    kind: DragKind,
    offset: egui::Vec2,
}

/// Snaps an in-progress gesture to grid cells, keeping the rect inside the
/// grid and within its size bounds.
fn dropped_rect(
    rect: &LayoutRect,
    drag: &DragState,
    geometry: &GridGeometry,
    columns: u32,
) -> LayoutRect {
    let dx = geometry.columns_in(drag.offset.x);
    let dy = geometry.rows_in(drag.offset.y);
    let mut dropped = rect.clone();
    match drag.kind {
        DragKind::Move => {
            let max_x = columns.saturating_sub(rect.w) as i64;
            dropped.x = (rect.x as i64 + dx).clamp(0, max_x) as u32;
            dropped.y = (rect.y as i64 + dy).max(0) as u32;
        }
        DragKind::Resize => {
            let max_w = rect.max_w.min(columns.saturating_sub(rect.x)).max(rect.min_w);
            dropped.w = (rect.w as i64 + dx).clamp(rect.min_w as i64, max_w as i64) as u32;
            dropped.h = (rect.h as i64 + dy).clamp(rect.min_h as i64, rect.max_h as i64) as u32;
        }
    }
    dropped
}

/// Deferred UI intents, applied once the frame's borrows are released.
#[derive(Debug, Clone, PartialEq)]
enum UiAction {
    AddWidget(String),
    RemoveWidget(String),
    ToggleChat(ChatOwner),
    CloseChat,
    SendChat,
    FillInput(String),
    Move(LayoutRect),
    Resize { id: String, w: u32, h: u32 },
    ClearDashboard,
}

pub struct DashboardApp {
    rx: Receiver<AppEvent>,
    responder: Responder,
    registry: WidgetRegistry,
    store: LayoutStore,
    gateway: PersistenceGateway,
    theme: Theme,
    grid: GridConfig,
    chat_enabled: bool,
    open_chat: Option<ChatOwner>,
    chat_input: String,
    drag: Option<DragState>,
    restore_complete: bool,
    visuals_applied: bool,
    scroll_to_bottom: bool,
}

impl DashboardApp {
    pub fn new(
        rx: Receiver<AppEvent>,
        responder: Responder,
        config: &AppConfig,
        gateway: PersistenceGateway,
    ) -> Self {
        let mut app = Self {
            rx,
            responder,
            registry: WidgetRegistry::builtin(),
            store: LayoutStore::new(config.grid.columns, config.grid.max_rows_floor),
            gateway,
            theme: Theme::default(),
            grid: config.grid.clone(),
            chat_enabled: config.chat.enabled,
            open_chat: None,
            chat_input: String::new(),
            drag: None,
            restore_complete: false,
            visuals_applied: false,
            scroll_to_bottom: false,
        };
        app.restore_saved();
        app
    }

    fn restore_saved(&mut self) {
        if let Some(state) = self.gateway.restore() {
            debug!(version = %state.version, chats = state.chats.len(), "restoring dashboard");
            let widgets = state.rehydrate(&self.registry);
            self.store
                .restore(widgets, state.layout, state.chats, &self.registry);
        }
        self.restore_complete = true;
        info!(
            widgets = self.store.widgets().len(),
            persistence = self.gateway.is_available(),
            "dashboard ready"
        );
    }

    /// Writes the snapshot once the initial restore is done.
    fn save(&self) {
        if self.restore_complete {
            self.gateway.save(&self.store);
        }
    }

    fn commit(&mut self, change: LayoutChange) {
        if !change.is_committed() {
            return;
        }
        debug!(?change, "layout committed");
        if change == LayoutChange::Cleared {
            self.gateway.clear();
        } else {
            self.save();
        }
    }

    fn add_widget(&mut self, widget_type: &str) {
        let widget = self.registry.instantiate(widget_type, None);
        let change = self.store.add(widget, None, &self.registry);
        self.commit(change);
    }

    fn remove_widget(&mut self, id: &str) {
        if self.open_chat.as_ref().and_then(ChatOwner::widget_id) == Some(id) {
            self.open_chat = None;
        }
        if self.drag.as_ref().is_some_and(|drag| drag.id == id) {
            self.drag = None;
        }
        let change = self.store.remove(id);
        self.commit(change);
    }

    fn clear_dashboard(&mut self) {
        self.open_chat = None;
        self.drag = None;
        let change = self.store.clear();
        self.commit(change);
    }

    /// Opens the chat for `owner`, or closes it when it is already open.
    fn toggle_chat(&mut self, owner: ChatOwner) {
        if self.open_chat.as_ref() == Some(&owner) {
            self.open_chat = None;
            return;
        }

        let target = owner
            .widget_id()
            .and_then(|id| self.store.widget(id))
            .cloned();
        let (session, _) = self.store.open_chat(&owner);
        if session.is_empty() {
            let id = session.next_message_id();
            session.push(welcome_message(id, target.as_ref()));
            self.save();
        }
        self.open_chat = Some(owner);
        self.chat_input.clear();
        self.scroll_to_bottom = true;
    }

    fn submit_chat(&mut self) {
        let text = self.chat_input.trim().to_string();
        let Some(owner) = self.open_chat.clone() else {
            return;
        };
        if text.is_empty() {
            return;
        }

        let (session, _) = self.store.open_chat(&owner);
        if session.is_awaiting_response() {
            return;
        }
        session.push_user(text.clone());
        session.set_awaiting_response(true);
        self.save();

        self.responder.schedule(owner, text);
        self.chat_input.clear();
        self.scroll_to_bottom = true;
    }

    fn drain_events(&mut self, ctx: &egui::Context) {
        loop {
            match self.rx.try_recv() {
                Ok(event) => self.apply_event(event, ctx),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    debug!("event channel disconnected");
                    break;
                }
            }
        }
    }

    fn apply_event(&mut self, event: AppEvent, ctx: &egui::Context) {
        match event {
            AppEvent::AssistantTurnDue { owner, input } => {
                let target = owner
                    .widget_id()
                    .and_then(|id| self.store.widget(id))
                    .cloned();
                if owner.widget_id().is_some() && target.is_none() {
                    debug!(owner = owner.storage_key(), "dropping reply for removed widget");
                    return;
                }

                let mut reply = respond(&input, &self.registry, target.as_ref());
                let action = reply.action.take();
                debug!(
                    owner = owner.storage_key(),
                    intent = reply.intent.name(),
                    "assistant replied"
                );
                let Some(session) = self.store.chat_mut(&owner) else {
                    debug!(owner = owner.storage_key(), "dropping reply for closed session");
                    return;
                };
                let id = session.next_message_id();
                session.push(reply.into_message(id));
                session.set_awaiting_response(false);

                if let Some(action) = action {
                    let change = apply_action(&mut self.store, &self.registry, &owner, action);
                    if change.is_committed() {
                        debug!(?change, "assistant changed the dashboard");
                    }
                }
                self.save();
                self.scroll_to_bottom = true;
                ctx.request_repaint();
            }
        }
    }

    fn apply_ui_action(&mut self, action: UiAction) {
        match action {
            UiAction::AddWidget(widget_type) => self.add_widget(&widget_type),
            UiAction::RemoveWidget(id) => self.remove_widget(&id),
            UiAction::ToggleChat(owner) => self.toggle_chat(owner),
            UiAction::CloseChat => self.open_chat = None,
            UiAction::SendChat => self.submit_chat(),
            UiAction::FillInput(text) => self.chat_input = text,
            UiAction::Move(rect) => {
                let rects = self
                    .store
                    .layout()
                    .iter()
                    .map(|current| {
                        if current.id == rect.id {
                            rect.clone()
                        } else {
                            current.clone()
                        }
                    })
                    .collect();
                let change = self.store.replace_layout(rects);
                let pushed = self.store.push_collisions(&rect.id);
                self.commit(change.or(pushed));
            }
            UiAction::Resize { id, w, h } => {
                let change = self.store.resize(&id, w, h);
                let pushed = self.store.push_collisions(&id);
                self.commit(change.or(pushed));
            }
            UiAction::ClearDashboard => self.clear_dashboard(),
        }
    }

    fn render_top_bar(&self, ctx: &egui::Context, actions: &mut Vec<UiAction>) {
        let theme = &self.theme;
        egui::TopBottomPanel::top("top_bar")
            .frame(egui::Frame::new().fill(theme.top_bar).inner_margin(
                egui::Margin::symmetric(theme.spacing_16 as i8, theme.spacing_8 as i8),
            ))
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.strong("Gridboard");
                    ui.separator();
                    ui.label(
                        RichText::new(format!("{} components", self.store.widgets().len()))
                            .color(theme.text_muted),
                    );
                    ui.separator();
                    let (label, color) = if self.gateway.is_available() {
                        ("Saved locally", theme.success)
                    } else {
                        ("Not saving", theme.warning)
                    };
                    ui.label(RichText::new(label).color(color));

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        let clear = egui::Button::new("Clear dashboard")
                            .stroke(theme.subtle_button_stroke());
                        if ui.add_enabled(!self.store.is_empty(), clear).clicked() {
                            actions.push(UiAction::ClearDashboard);
                        }
                        if self.chat_enabled {
                            let assistant = egui::Button::new(
                                RichText::new("AI Assistant").color(theme.text_on_accent),
                            )
                            .fill(theme.accent)
                            .corner_radius(CornerRadius::same(theme.radius_card));
                            if ui.add(assistant).clicked() {
                                actions.push(UiAction::ToggleChat(ChatOwner::Assistant));
                            }
                        }
                    });
                });
            });
    }

    fn render_library_panel(&self, ctx: &egui::Context, actions: &mut Vec<UiAction>) {
        let theme = &self.theme;
        egui::SidePanel::left("library_panel")
            .resizable(true)
            .default_width(220.0)
            .show(ctx, |ui| {
                ui.heading("Components");
                ui.label(RichText::new("Click to add to the dashboard").color(theme.text_muted));
                ui.separator();
                for template in self.registry.templates() {
                    let label = RichText::new(template.title).color(theme.text);
                    let button = egui::Button::new(label)
                        .min_size(egui::vec2(ui.available_width(), theme.button_height))
                        .stroke(theme.subtle_button_stroke());
                    if ui
                        .add(button)
                        .on_hover_text(format!("type: {}", template.widget_type))
                        .clicked()
                    {
                        actions.push(UiAction::AddWidget(template.widget_type.to_string()));
                    }
                }
            });
    }

    fn render_canvas(&mut self, ctx: &egui::Context, actions: &mut Vec<UiAction>) {
        let Self {
            store,
            theme,
            grid,
            drag,
            chat_enabled,
            open_chat,
            ..
        } = self;

        egui::CentralPanel::default().show(ctx, |ui| {
            ScrollArea::vertical()
                .id_salt("grid_canvas")
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    let height =
                        canvas_height(store.max_row(), grid.row_height, grid.margin, grid.margin);
                    let (canvas, _) = ui.allocate_exact_size(
                        egui::vec2(ui.available_width(), height),
                        Sense::hover(),
                    );
                    let geometry = GridGeometry::new(canvas, grid);
                    ui.painter().rect_filled(
                        canvas,
                        CornerRadius::same(theme.radius_canvas),
                        theme.canvas,
                    );

                    if store.is_empty() {
                        ui.painter().text(
                            canvas.center_top() + egui::vec2(0.0, 120.0),
                            egui::Align2::CENTER_CENTER,
                            "Add components from the library or ask the AI Assistant",
                            egui::FontId::proportional(15.0),
                            theme.text_muted,
                        );
                    }

                    for rect in store.layout() {
                        let Some(widget) = store.widget(&rect.id) else {
                            continue;
                        };
                        let active = drag.as_ref().filter(|d| d.id == rect.id);
                        let shown = match active {
                            Some(gesture) => {
                                let cell = geometry.cell_rect(rect);
                                ui.painter().rect_filled(
                                    geometry.cell_rect(&dropped_rect(
                                        rect,
                                        gesture,
                                        &geometry,
                                        store.columns(),
                                    )),
                                    CornerRadius::same(theme.radius_card),
                                    theme.grid_cell,
                                );
                                match gesture.kind {
                                    DragKind::Move => cell.translate(gesture.offset),
                                    DragKind::Resize => egui::Rect::from_min_size(
                                        cell.min,
                                        (cell.size() + gesture.offset).max(egui::vec2(40.0, 40.0)),
                                    ),
                                }
                            }
                            None => geometry.cell_rect(rect),
                        };

                        let chat_open = open_chat.as_ref().and_then(ChatOwner::widget_id)
                            == Some(rect.id.as_str());
                        ui.painter().rect(
                            shown,
                            CornerRadius::same(theme.radius_card),
                            theme.card,
                            Stroke::new(
                                1.0,
                                if chat_open {
                                    theme.accent
                                } else {
                                    theme.border
                                },
                            ),
                            egui::StrokeKind::Inside,
                        );

                        let title_bar = egui::Rect::from_min_size(
                            shown.min,
                            egui::vec2(shown.width(), TITLE_BAR_HEIGHT),
                        );
                        let handle = egui::Rect::from_min_max(
                            shown.max - egui::vec2(RESIZE_HANDLE, RESIZE_HANDLE),
                            shown.max,
                        );

                        let move_response = ui
                            .interact(title_bar, ui.id().with(("move", &rect.id)), Sense::drag())
                            .on_hover_cursor(egui::CursorIcon::Grab);
                        let resize_response = ui
                            .interact(handle, ui.id().with(("resize", &rect.id)), Sense::drag())
                            .on_hover_cursor(egui::CursorIcon::ResizeNwSe);

                        for (response, kind) in [
                            (&move_response, DragKind::Move),
                            (&resize_response, DragKind::Resize),
                        ] {
                            if response.drag_started() {
                                *drag = Some(DragState {
                                    id: rect.id.clone(),
                                    kind,
                                    offset: egui::Vec2::ZERO,
                                });
                            }
                            if response.dragged() {
                                if let Some(gesture) =
                                    drag.as_mut().filter(|d| d.id == rect.id && d.kind == kind)
                                {
                                    gesture.offset += response.drag_delta();
                                }
                            }
                            if response.drag_stopped() {
                                if let Some(gesture) = drag.take().filter(|d| d.id == rect.id) {
                                    let dropped =
                                        dropped_rect(rect, &gesture, &geometry, store.columns());
                                    actions.push(match gesture.kind {
                                        DragKind::Move => UiAction::Move(dropped),
                                        DragKind::Resize => UiAction::Resize {
                                            id: dropped.id.clone(),
                                            w: dropped.w,
                                            h: dropped.h,
                                        },
                                    });
                                }
                            }
                        }

                        let title_area = title_bar.shrink2(egui::vec2(theme.spacing_8, 0.0));
                        ui.scope_builder(UiBuilder::new().max_rect(title_area), |ui| {
                            ui.horizontal_centered(|ui| {
                                if let Some(scheme) = widget.content.scheme() {
                                    ui.colored_label(theme.scheme_colors(scheme).1, "●")
                                        .on_hover_text(scheme.as_str());
                                }
                                ui.label(RichText::new(&widget.title).strong().size(13.0));
                                ui.with_layout(
                                    egui::Layout::right_to_left(egui::Align::Center),
                                    |ui| {
                                        if ui.small_button("✕").on_hover_text("Remove").clicked() {
                                            actions.push(UiAction::RemoveWidget(rect.id.clone()));
                                        }
                                        if *chat_enabled
                                            && ui.small_button("💬").on_hover_text("Chat").clicked()
                                        {
                                            actions.push(UiAction::ToggleChat(ChatOwner::Widget(
                                                rect.id.clone(),
                                            )));
                                        }
                                    },
                                );
                            });
                        });

                        let body = egui::Rect::from_min_max(
                            egui::pos2(shown.left(), title_bar.bottom()),
                            shown.max,
                        )
                        .shrink(theme.spacing_8);
                        if body.is_positive() {
                            ui.scope_builder(UiBuilder::new().max_rect(body), |ui| {
                                ui.set_clip_rect(body.intersect(ui.clip_rect()));
                                render_content(&widget.content, ui, theme);
                            });
                        }

                        ui.painter().line_segment(
                            [
                                handle.right_top() + egui::vec2(-3.0, 4.0),
                                handle.left_bottom() + egui::vec2(4.0, -3.0),
                            ],
                            Stroke::new(1.5, theme.text_muted),
                        );
                    }
                });
        });
    }

    fn render_chat_window(&mut self, ctx: &egui::Context, actions: &mut Vec<UiAction>) {
        let Some(owner) = self.open_chat.clone() else {
            return;
        };
        let title = match owner.widget_id().and_then(|id| self.store.widget(id)) {
            Some(widget) => format!("Chat: {}", widget.title),
            None => "AI Assistant".to_string(),
        };
        let Some(session) = self.store.chat(&owner) else {
            return;
        };
        let theme = &self.theme;
        let awaiting = session.is_awaiting_response();
        let scroll_to_bottom = std::mem::take(&mut self.scroll_to_bottom);
        let chat_input = &mut self.chat_input;

        let mut open = true;
        egui::Window::new(title)
            .id(egui::Id::new(("chat_window", owner.storage_key().to_string())))
            .open(&mut open)
            .collapsible(true)
            .resizable(true)
            .default_size([360.0, 440.0])
            .anchor(egui::Align2::RIGHT_BOTTOM, [-theme.spacing_16, -theme.spacing_16])
            .show(ctx, |ui| {
                let transcript_height = (ui.available_height() - 60.0).max(160.0);
                ScrollArea::vertical()
                    .id_salt(("chat_transcript", owner.storage_key().to_string()))
                    .max_height(transcript_height)
                    .stick_to_bottom(true)
                    .show(ui, |ui| {
                        for message in session.messages() {
                            render_message(message, ui, theme, actions);
                        }
                        if awaiting {
                            ui.label(
                                RichText::new("AI is typing...")
                                    .italics()
                                    .color(theme.text_muted),
                            );
                        }
                        if scroll_to_bottom {
                            ui.scroll_to_cursor(Some(egui::Align::BOTTOM));
                        }
                    });

                ui.separator();
                let hint = if awaiting {
                    "Waiting for response..."
                } else {
                    "Type a message..."
                };
                theme.composer_frame().show(ui, |ui| {
                    ui.horizontal(|ui| {
                        let response = ui.add_enabled(
                            !awaiting,
                            egui::TextEdit::singleline(chat_input)
                                .desired_width(ui.available_width() - 70.0)
                                .hint_text(hint),
                        );
                        let mut send_now =
                            response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                        send_now |= ui
                            .add_enabled(
                                !awaiting && !chat_input.trim().is_empty(),
                                egui::Button::new("Send"),
                            )
                            .clicked();
                        if send_now && !awaiting {
                            actions.push(UiAction::SendChat);
                        }
                    });
                });
            });

        if !open {
            actions.push(UiAction::CloseChat);
        }
    }
}

fn render_message(
    message: &ChatMessage,
    ui: &mut egui::Ui,
    theme: &Theme,
    actions: &mut Vec<UiAction>,
) {
    let (speaker, fill) = match message.sender {
        Sender::User => ("You", theme.accent_pressed),
        Sender::Assistant => ("AI", theme.card_hover),
    };
    egui::Frame::new()
        .fill(fill)
        .corner_radius(CornerRadius::same(theme.radius_card))
        .inner_margin(egui::Margin::same(theme.spacing_8 as i8))
        .show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.label(RichText::new(speaker).strong().size(12.0));
                ui.label(
                    RichText::new(message.timestamp.with_timezone(&Local).format("%H:%M").to_string())
                        .color(theme.text_muted)
                        .size(11.0),
                );
            });
            ui.label(RichText::new(&message.text).size(13.0));
            if let Some(widget) = &message.attached_widget {
                ui.label(
                    RichText::new(format!("Added: {}", widget.title))
                        .color(theme.success)
                        .size(12.0),
                );
            }
            if !message.suggestions.is_empty() {
                ui.horizontal_wrapped(|ui| {
                    for suggestion in &message.suggestions {
                        let chip = egui::Button::new(RichText::new(suggestion.label()).size(12.0))
                            .fill(Color32::TRANSPARENT)
                            .stroke(theme.subtle_button_stroke());
                        if ui.add(chip).clicked() {
                            actions.push(match suggestion {
                                Suggestion::Text(text) => UiAction::FillInput(text.clone()),
                                Suggestion::Widget(widget) => {
                                    UiAction::AddWidget(widget.widget_type.clone())
                                }
                            });
                        }
                    }
                });
            }
        });
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if !self.visuals_applied {
            self.theme.apply_visuals(ctx);
            self.visuals_applied = true;
        }
        self.drain_events(ctx);

        let mut actions = Vec::new();
        self.render_top_bar(ctx, &mut actions);
        self.render_library_panel(ctx, &mut actions);
        self.render_canvas(ctx, &mut actions);
        self.render_chat_window(ctx, &mut actions);
        for action in actions {
            self.apply_ui_action(action);
        }

        if self.store.chats().any(|session| session.is_awaiting_response()) {
            ctx.request_repaint_after(self.responder.delay());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{dropped_rect, DragKind, DragState, GridGeometry};
    use crate::config::GridConfig;
    use crate::dashboard::store::{LayoutChange, LayoutStore};
    use crate::dashboard::{GridPos, GridSize, LayoutRect};
    use crate::widgets::catalog::WidgetRegistry;
    use eframe::egui;
    use pretty_assertions::assert_eq;

    fn geometry() -> GridGeometry {
        // 12 columns of 60px with 8px gaps and 8px padding.
        let width = 12.0 * 60.0 + 13.0 * 8.0;
        let canvas = egui::Rect::from_min_size(egui::Pos2::ZERO, egui::vec2(width, 600.0));
        GridGeometry::new(canvas, &GridConfig::default())
    }

    fn drag(kind: DragKind, dx: f32, dy: f32) -> DragState {
        DragState {
            id: "chart-1".to_string(),
            kind,
            offset: egui::vec2(dx, dy),
        }
    }

    #[test]
    fn cell_rect_spans_gaps_between_cells() {
        let geometry = geometry();
        let rect = LayoutRect::new("chart-1", GridPos { x: 2, y: 1 }, GridSize::new(2, 2));
        let cell = geometry.cell_rect(&rect);
        assert_eq!(cell.min, egui::pos2(8.0 + 2.0 * 68.0, 8.0 + 48.0));
        assert_eq!(cell.size(), egui::vec2(128.0, 88.0));
    }

    #[test]
    fn move_snaps_to_the_nearest_cell_and_stays_on_the_grid() {
        let geometry = geometry();
        let rect = LayoutRect::new("chart-1", GridPos { x: 2, y: 1 }, GridSize::new(2, 2));

        let moved = dropped_rect(&rect, &drag(DragKind::Move, 140.0, 50.0), &geometry, 12);
        assert_eq!((moved.x, moved.y, moved.w, moved.h), (4, 2, 2, 2));

        let pinned = dropped_rect(&rect, &drag(DragKind::Move, 5000.0, -5000.0), &geometry, 12);
        assert_eq!((pinned.x, pinned.y), (10, 0));
    }

    #[test]
    fn resize_respects_bounds_and_grid_edge() {
        let geometry = geometry();
        let rect = LayoutRect::new("chart-1", GridPos { x: 8, y: 0 }, GridSize::new(2, 2));

        let grown = dropped_rect(&rect, &drag(DragKind::Resize, 1000.0, 96.0), &geometry, 12);
        assert_eq!((grown.x, grown.w, grown.h), (8, 4, 4));

        let shrunk = dropped_rect(&rect, &drag(DragKind::Resize, -1000.0, -1000.0), &geometry, 12);
        assert_eq!((shrunk.w, shrunk.h), (1, 1));
    }

    #[test]
    fn dropping_a_widget_onto_another_pushes_it_down() {
        let registry = WidgetRegistry::builtin();
        let mut store = LayoutStore::default();
        for id in ["chart-1", "chart-2"] {
            let mut widget = registry.instantiate("chart", None);
            widget.id = id.to_string();
            store.add(widget, None, &registry);
        }
        let geometry = geometry();
        let start = store.rect("chart-1").cloned().expect("rect chart-1");

        let dropped = dropped_rect(&start, &drag(DragKind::Move, 136.0, 0.0), &geometry, 12);
        assert_eq!((dropped.x, dropped.y), (2, 0));
        let rects = store
            .layout()
            .iter()
            .map(|r| if r.id == dropped.id { dropped.clone() } else { r.clone() })
            .collect();
        let change = store.replace_layout(rects).or(store.push_collisions(&dropped.id));

        assert_eq!(change, LayoutChange::Reflowed);
        assert_eq!(store.rect("chart-1").map(|r| (r.x, r.y)), Some((2, 0)));
        assert_eq!(store.rect("chart-2").map(|r| (r.x, r.y)), Some((2, 2)));
    }
}
