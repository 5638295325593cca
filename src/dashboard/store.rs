use crate::chat::{ChatOwner, ChatSession};
use crate::dashboard::placement::{place, push_down, scan_limit};
use crate::dashboard::{
    DescriptorPatch, GridPos, GridSize, LayoutRect, WidgetDescriptor, DEFAULT_MAX_H, DEFAULT_MAX_W,
    DEFAULT_MIN_H, DEFAULT_MIN_W, GRID_COLUMNS, MAX_ROWS_FLOOR,
};
use crate::widgets::catalog::WidgetRegistry;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// What a store mutation did. The UI layer re-reads widgets and layout and
/// persists on anything but `Unchanged`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutChange {
    Unchanged,
    Added { id: String },
    Removed { id: String },
    Resized { id: String },
    Updated { id: String },
    Reflowed,
    Restored,
    Cleared,
}

impl LayoutChange {
    pub fn is_committed(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }

    /// `self` unless it is `Unchanged`, then `other`.
    pub fn or(self, other: LayoutChange) -> LayoutChange {
        if self.is_committed() {
            self
        } else {
            other
        }
    }
}

/// Rects and descriptors are kept in lockstep: every id appears in both or
/// in neither.
#[derive(Debug, Clone)]
pub struct LayoutStore {
    columns: u32,
    max_rows_floor: u32,
    rects: Vec<LayoutRect>,
    widgets: Vec<WidgetDescriptor>,
    chats: BTreeMap<ChatOwner, ChatSession>,
}

impl Default for LayoutStore {
    fn default() -> Self {
        Self::new(GRID_COLUMNS, MAX_ROWS_FLOOR)
    }
}

impl LayoutStore {
    pub fn new(columns: u32, max_rows_floor: u32) -> Self {
        Self {
            columns: columns.max(1),
            max_rows_floor,
            rects: Vec::new(),
            widgets: Vec::new(),
            chats: BTreeMap::new(),
        }
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn layout(&self) -> &[LayoutRect] {
        &self.rects
    }

    pub fn widgets(&self) -> &[WidgetDescriptor] {
        &self.widgets
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty() && self.rects.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.widgets.iter().any(|w| w.id == id)
    }

    pub fn widget(&self, id: &str) -> Option<&WidgetDescriptor> {
        self.widgets.iter().find(|w| w.id == id)
    }

    pub fn rect(&self, id: &str) -> Option<&LayoutRect> {
        self.rects.iter().find(|r| r.id == id)
    }

    /// Lowest occupied row edge, `0` for an empty grid.
    pub fn max_row(&self) -> u32 {
        self.rects.iter().map(LayoutRect::bottom).max().unwrap_or(0)
    }

    /// Explicit size if given, else the catalogue default, clamped to the
    /// default bounds and the grid width.
    pub fn resolve_size(&self, hint: Option<GridSize>, default: GridSize) -> GridSize {
        let size = hint.unwrap_or(default);
        GridSize::new(
            size.w.clamp(DEFAULT_MIN_W, DEFAULT_MAX_W.min(self.columns)),
            size.h.clamp(DEFAULT_MIN_H, DEFAULT_MAX_H),
        )
    }

    pub fn add(
        &mut self,
        widget: WidgetDescriptor,
        size_hint: Option<GridSize>,
        registry: &WidgetRegistry,
    ) -> LayoutChange {
        if self.contains(&widget.id) || self.rect(&widget.id).is_some() {
            return LayoutChange::Unchanged;
        }

        let size = self.resolve_size(size_hint, registry.default_size(&widget.widget_type));
        let rect = self.place_rect(&widget.id, size);
        debug!(
            id = %widget.id,
            widget_type = %widget.widget_type,
            x = rect.x,
            y = rect.y,
            w = rect.w,
            h = rect.h,
            "widget added"
        );

        let id = widget.id.clone();
        self.rects.push(rect);
        self.widgets.push(widget);
        LayoutChange::Added { id }
    }

    fn place_rect(&self, id: &str, size: GridSize) -> LayoutRect {
        let max_rows = scan_limit(&self.rects, size, self.max_rows_floor);
        let pos = place(size, &self.rects, self.columns, max_rows);
        LayoutRect::new(id, pos, size)
    }

    /// Drops the widget, its rect and its chat session.
    pub fn remove(&mut self, id: &str) -> LayoutChange {
        let before = self.widgets.len() + self.rects.len();
        self.widgets.retain(|w| w.id != id);
        self.rects.retain(|r| r.id != id);
        let chat_removed = self
            .chats
            .remove(&ChatOwner::Widget(id.to_string()))
            .is_some();

        if before == self.widgets.len() + self.rects.len() && !chat_removed {
            return LayoutChange::Unchanged;
        }
        debug!(id, "widget removed");
        LayoutChange::Removed { id: id.to_string() }
    }

    /// Sets the size as given. Bounds and collisions are the grid UI's job.
    pub fn resize(&mut self, id: &str, w: u32, h: u32) -> LayoutChange {
        let Some(rect) = self.rects.iter_mut().find(|r| r.id == id) else {
            return LayoutChange::Unchanged;
        };
        if rect.w == w && rect.h == h {
            return LayoutChange::Unchanged;
        }
        rect.w = w;
        rect.h = h;
        debug!(id, w, h, "widget resized");
        LayoutChange::Resized { id: id.to_string() }
    }

    /// Resize as the grid does it: the size is held to the rect's bounds,
    /// the rect shifts left if it would cross the right edge, and whatever
    /// it now covers is pushed down.
    pub fn resize_in_grid(&mut self, id: &str, size: GridSize) -> LayoutChange {
        let columns = self.columns;
        let Some(rect) = self.rects.iter_mut().find(|r| r.id == id) else {
            return LayoutChange::Unchanged;
        };
        let max_w = rect.max_w.min(columns).max(1);
        let max_h = rect.max_h.max(1);
        let w = size.w.clamp(rect.min_w.clamp(1, max_w), max_w);
        let h = size.h.clamp(rect.min_h.clamp(1, max_h), max_h);
        let x = rect.x.min(columns - w);
        let shifted = x != rect.x;
        rect.x = x;

        let resized = self.resize(id, w, h);
        let pushed = self.push_collisions(id);
        if shifted || resized.is_committed() || pushed.is_committed() {
            LayoutChange::Resized { id: id.to_string() }
        } else {
            LayoutChange::Unchanged
        }
    }

    /// Moves every rect that overlaps `id` out of its way, downwards.
    pub fn push_collisions(&mut self, id: &str) -> LayoutChange {
        if !push_down(&mut self.rects, id) {
            return LayoutChange::Unchanged;
        }
        debug!(id, "rects pushed down");
        LayoutChange::Reflowed
    }

    pub fn update_descriptor(&mut self, id: &str, patch: DescriptorPatch) -> LayoutChange {
        let Some(widget) = self.widgets.iter_mut().find(|w| w.id == id) else {
            return LayoutChange::Unchanged;
        };
        if let Some(widget_type) = patch.widget_type {
            widget.widget_type = widget_type;
        }
        if let Some(title) = patch.title {
            widget.title = title;
        }
        if let Some(content) = patch.content {
            widget.content = content;
        }
        debug!(id, title = %widget.title, "widget updated");
        LayoutChange::Updated { id: id.to_string() }
    }

    /// Overwrites every rect after a grid reflow. Ids are trusted to match.
    pub fn replace_layout(&mut self, rects: Vec<LayoutRect>) -> LayoutChange {
        if rects == self.rects {
            return LayoutChange::Unchanged;
        }
        self.rects = rects;
        LayoutChange::Reflowed
    }

    /// Loads restored state. Rects without a widget are dropped and widgets
    /// without a rect are placed, so the id sets match afterwards. Rects that
    /// are off the grid or overlap an earlier rect are discarded and their
    /// widgets placed afresh.
    pub fn restore(
        &mut self,
        widgets: Vec<WidgetDescriptor>,
        rects: Vec<LayoutRect>,
        chats: Vec<ChatSession>,
        registry: &WidgetRegistry,
    ) -> LayoutChange {
        self.widgets.clear();
        self.rects.clear();
        for widget in widgets {
            if !self.contains(&widget.id) {
                self.widgets.push(widget);
            }
        }
        for rect in rects {
            if !self.contains(&rect.id) || self.rect(&rect.id).is_some() {
                continue;
            }
            let clashes = self.rects.iter().any(|kept| {
                kept.overlaps(GridPos { x: rect.x, y: rect.y }, GridSize::new(rect.w, rect.h))
            });
            if !rect.is_sane(self.columns) || clashes {
                warn!(
                    id = %rect.id,
                    x = rect.x,
                    y = rect.y,
                    w = rect.w,
                    h = rect.h,
                    "discarding unusable saved rect"
                );
                continue;
            }
            self.rects.push(rect);
        }

        let unplaced: Vec<(String, GridSize)> = self
            .widgets
            .iter()
            .filter(|w| self.rect(&w.id).is_none())
            .map(|w| {
                let size = self.resolve_size(None, registry.default_size(&w.widget_type));
                (w.id.clone(), size)
            })
            .collect();
        for (id, size) in unplaced {
            let rect = self.place_rect(&id, size);
            self.rects.push(rect);
        }

        self.chats = chats
            .into_iter()
            .filter(|session| match session.owner() {
                ChatOwner::Assistant => true,
                ChatOwner::Widget(id) => self.contains(id),
            })
            .map(|session| (session.owner().clone(), session))
            .collect();
        LayoutChange::Restored
    }

    pub fn clear(&mut self) -> LayoutChange {
        self.rects.clear();
        self.widgets.clear();
        self.chats.clear();
        LayoutChange::Cleared
    }

    /// Session for `owner`, created on first use. The flag is `true` when
    /// the session was just created.
    pub fn open_chat(&mut self, owner: &ChatOwner) -> (&mut ChatSession, bool) {
        let created = !self.chats.contains_key(owner);
        let session = self
            .chats
            .entry(owner.clone())
            .or_insert_with(|| ChatSession::new(owner.clone()));
        (session, created)
    }

    pub fn chat(&self, owner: &ChatOwner) -> Option<&ChatSession> {
        self.chats.get(owner)
    }

    pub fn chat_mut(&mut self, owner: &ChatOwner) -> Option<&mut ChatSession> {
        self.chats.get_mut(owner)
    }

    pub fn chats(&self) -> impl Iterator<Item = &ChatSession> {
        self.chats.values()
    }
}

/// Pixel height of the grid canvas; never shorter than 600.
pub fn canvas_height(max_row: u32, row_height: f32, margin: f32, padding: f32) -> f32 {
    const MIN_HEIGHT: f32 = 600.0;
    if max_row == 0 {
        return MIN_HEIGHT;
    }
    let rows = max_row as f32;
    (rows * row_height + (rows - 1.0) * margin + padding * 2.0).max(MIN_HEIGHT)
}

#[cfg(test)]
mod tests {
    use super::{canvas_height, LayoutChange, LayoutStore};
    use crate::chat::{ChatOwner, ChatSession};
    use crate::dashboard::{DescriptorPatch, GridPos, GridSize, LayoutRect};
    use crate::widgets::catalog::{WidgetContent, WidgetRegistry};
    use pretty_assertions::assert_eq;

    fn ids(store: &LayoutStore) -> (Vec<String>, Vec<String>) {
        let mut widgets: Vec<_> = store.widgets().iter().map(|w| w.id.clone()).collect();
        let mut rects: Vec<_> = store.layout().iter().map(|r| r.id.clone()).collect();
        widgets.sort();
        rects.sort();
        (widgets, rects)
    }

    fn widget(registry: &WidgetRegistry, widget_type: &str, id: &str) -> crate::dashboard::WidgetDescriptor {
        let mut widget = registry.instantiate(widget_type, None);
        widget.id = id.to_string();
        widget
    }

    #[test]
    fn add_places_widgets_row_major() {
        let registry = WidgetRegistry::builtin();
        let mut store = LayoutStore::default();

        let change = store.add(widget(&registry, "chart", "chart-1"), None, &registry);
        assert_eq!(change, LayoutChange::Added { id: "chart-1".to_string() });
        store.add(widget(&registry, "table", "table-1"), None, &registry);

        let first = store.rect("chart-1").expect("chart rect");
        let second = store.rect("table-1").expect("table rect");
        assert_eq!((first.x, first.y, first.w, first.h), (0, 0, 2, 2));
        assert_eq!((second.x, second.y), (2, 0));
        assert_eq!(ids(&store).0, ids(&store).1);
    }

    #[test]
    fn add_is_idempotent_per_id() {
        let registry = WidgetRegistry::builtin();
        let mut store = LayoutStore::default();
        store.add(widget(&registry, "card", "card-5"), None, &registry);
        let layout = store.layout().to_vec();

        let change = store.add(widget(&registry, "gauge", "card-5"), Some(GridSize::new(6, 6)), &registry);
        assert_eq!(change, LayoutChange::Unchanged);
        assert_eq!(store.layout(), layout.as_slice());
        assert_eq!(store.widgets().len(), 1);
        assert_eq!(store.widgets()[0].widget_type, "card");
    }

    #[test]
    fn size_hint_is_clamped_to_default_bounds() {
        let registry = WidgetRegistry::builtin();
        let mut store = LayoutStore::default();
        store.add(widget(&registry, "chart", "wide"), Some(GridSize::new(40, 0)), &registry);
        let rect = store.rect("wide").expect("rect");
        assert_eq!((rect.w, rect.h), (12, 1));
        assert_eq!((rect.min_w, rect.max_w, rect.min_h, rect.max_h), (1, 12, 1, 50));
    }

    #[test]
    fn remove_drops_rect_widget_and_chat() {
        let registry = WidgetRegistry::builtin();
        let mut store = LayoutStore::default();
        store.add(widget(&registry, "list", "list-3"), None, &registry);
        let owner = ChatOwner::Widget("list-3".to_string());
        store.open_chat(&owner).0.push_user("make it bigger");

        assert_eq!(store.remove("list-3"), LayoutChange::Removed { id: "list-3".to_string() });
        assert!(store.widget("list-3").is_none());
        assert!(store.rect("list-3").is_none());
        assert!(store.chat(&owner).is_none());

        assert_eq!(store.remove("list-3"), LayoutChange::Unchanged);
    }

    #[test]
    fn resize_trusts_the_caller() {
        let registry = WidgetRegistry::builtin();
        let mut store = LayoutStore::default();
        store.add(widget(&registry, "chart", "a"), None, &registry);
        store.add(widget(&registry, "chart", "b"), None, &registry);

        assert_eq!(store.resize("a", 6, 4), LayoutChange::Resized { id: "a".to_string() });
        let a = store.rect("a").expect("rect a");
        assert_eq!((a.w, a.h), (6, 4));
        // Overlaps "b" now; the store does not push it away.
        assert_eq!(store.rect("b").map(|r| (r.x, r.y)), Some((2, 0)));

        assert_eq!(store.resize("a", 6, 4), LayoutChange::Unchanged);
        assert_eq!(store.resize("missing", 1, 1), LayoutChange::Unchanged);
    }

    fn row_of_cards(store: &mut LayoutStore, registry: &WidgetRegistry) {
        for index in 0..6 {
            store.add(widget(registry, "card", &format!("w{index}")), None, registry);
        }
    }

    fn assert_on_grid_and_disjoint(store: &LayoutStore) {
        let rects = store.layout();
        for (index, a) in rects.iter().enumerate() {
            assert!(a.x + a.w <= store.columns(), "{} crosses the right edge", a.id);
            for b in &rects[index + 1..] {
                assert!(
                    !a.overlaps(GridPos { x: b.x, y: b.y }, GridSize::new(b.w, b.h)),
                    "{} overlaps {}",
                    a.id,
                    b.id
                );
            }
        }
    }

    #[test]
    fn resize_in_grid_shifts_left_at_the_right_edge() {
        let registry = WidgetRegistry::builtin();
        let mut store = LayoutStore::default();
        row_of_cards(&mut store, &registry);

        let change = store.resize_in_grid("w5", GridSize::new(6, 4));
        assert_eq!(change, LayoutChange::Resized { id: "w5".to_string() });
        let grown = store.rect("w5").expect("rect w5");
        assert_eq!((grown.x, grown.y, grown.w, grown.h), (6, 0, 6, 4));
        assert_eq!(store.rect("w3").map(|r| (r.x, r.y)), Some((6, 4)));
        assert_on_grid_and_disjoint(&store);

        assert_eq!(store.resize_in_grid("w5", GridSize::new(6, 4)), LayoutChange::Unchanged);
        assert_eq!(store.resize_in_grid("missing", GridSize::new(6, 4)), LayoutChange::Unchanged);
    }

    #[test]
    fn resize_in_grid_pushes_neighbours_down() {
        let registry = WidgetRegistry::builtin();
        let mut store = LayoutStore::default();
        row_of_cards(&mut store, &registry);

        store.resize_in_grid("w0", GridSize::new(6, 4));
        let grown = store.rect("w0").expect("rect w0");
        assert_eq!((grown.x, grown.y, grown.w, grown.h), (0, 0, 6, 4));
        assert_eq!(store.rect("w1").map(|r| r.y), Some(4));
        assert_eq!(store.rect("w3").map(|r| (r.x, r.y)), Some((6, 0)));
        assert_on_grid_and_disjoint(&store);
    }

    #[test]
    fn resize_in_grid_holds_the_size_bounds() {
        let registry = WidgetRegistry::builtin();
        let mut store = LayoutStore::default();
        store.add(widget(&registry, "chart", "a"), None, &registry);

        store.resize_in_grid("a", GridSize::new(40, 0));
        let rect = store.rect("a").expect("rect a");
        assert_eq!((rect.x, rect.w, rect.h), (0, 12, 1));
    }

    #[test]
    fn dropping_onto_a_widget_pushes_it_down() {
        let registry = WidgetRegistry::builtin();
        let mut store = LayoutStore::default();
        store.add(widget(&registry, "chart", "a"), None, &registry);
        store.add(widget(&registry, "chart", "b"), None, &registry);

        let moved = vec![
            LayoutRect::new("a", GridPos { x: 2, y: 0 }, GridSize::new(2, 2)),
            LayoutRect::new("b", GridPos { x: 2, y: 0 }, GridSize::new(2, 2)),
        ];
        let change = store.replace_layout(moved).or(store.push_collisions("a"));
        assert_eq!(change, LayoutChange::Reflowed);
        assert_eq!(store.rect("a").map(|r| (r.x, r.y)), Some((2, 0)));
        assert_eq!(store.rect("b").map(|r| (r.x, r.y)), Some((2, 2)));
        assert_on_grid_and_disjoint(&store);

        assert_eq!(store.push_collisions("a"), LayoutChange::Unchanged);
    }

    #[test]
    fn update_descriptor_merges_fields() {
        let registry = WidgetRegistry::builtin();
        let mut store = LayoutStore::default();
        store.add(widget(&registry, "card", "card-1"), None, &registry);

        let change = store.update_descriptor(
            "card-1",
            DescriptorPatch {
                title: Some("Release Notes".to_string()),
                ..DescriptorPatch::default()
            },
        );
        assert_eq!(change, LayoutChange::Updated { id: "card-1".to_string() });
        let card = store.widget("card-1").expect("card");
        assert_eq!(card.title, "Release Notes");
        assert_eq!(card.widget_type, "card");
        assert!(matches!(card.content, WidgetContent::Card { .. }));

        assert_eq!(
            store.update_descriptor("nope", DescriptorPatch::default()),
            LayoutChange::Unchanged
        );
    }

    #[test]
    fn replace_layout_overwrites_positions() {
        let registry = WidgetRegistry::builtin();
        let mut store = LayoutStore::default();
        store.add(widget(&registry, "chart", "a"), None, &registry);
        let moved = vec![LayoutRect::new("a", GridPos { x: 5, y: 3 }, GridSize::new(2, 2))];

        assert_eq!(store.replace_layout(moved.clone()), LayoutChange::Reflowed);
        assert_eq!(store.layout(), moved.as_slice());
        assert_eq!(store.replace_layout(moved), LayoutChange::Unchanged);
    }

    #[test]
    fn restore_reconciles_ids() {
        let registry = WidgetRegistry::builtin();
        let mut store = LayoutStore::default();
        let widgets = vec![widget(&registry, "chart", "chart-1"), widget(&registry, "gauge", "gauge-2")];
        let rects = vec![
            LayoutRect::new("chart-1", GridPos { x: 0, y: 0 }, GridSize::new(4, 2)),
            LayoutRect::new("orphan", GridPos { x: 4, y: 0 }, GridSize::new(2, 2)),
        ];
        let chats = vec![
            ChatSession::new(ChatOwner::Widget("chart-1".to_string())),
            ChatSession::new(ChatOwner::Widget("orphan".to_string())),
            ChatSession::new(ChatOwner::Assistant),
        ];

        assert_eq!(store.restore(widgets, rects, chats, &registry), LayoutChange::Restored);
        assert_eq!(
            ids(&store),
            (
                vec!["chart-1".to_string(), "gauge-2".to_string()],
                vec!["chart-1".to_string(), "gauge-2".to_string()]
            )
        );
        assert_eq!(store.rect("gauge-2").map(|r| (r.x, r.y)), Some((4, 0)));
        assert!(store.chat(&ChatOwner::Widget("orphan".to_string())).is_none());
        assert!(store.chat(&ChatOwner::Assistant).is_some());
    }

    #[test]
    fn restore_replaces_unusable_rects() {
        let registry = WidgetRegistry::builtin();
        let mut store = LayoutStore::default();
        let widgets = vec![
            widget(&registry, "card", "far"),
            widget(&registry, "card", "kept"),
            widget(&registry, "card", "clash"),
            widget(&registry, "card", "wide"),
        ];
        let rects = vec![
            LayoutRect::new("far", GridPos { x: 0, y: u32::MAX }, GridSize::new(2, 2)),
            LayoutRect::new("kept", GridPos { x: 0, y: 0 }, GridSize::new(2, 2)),
            LayoutRect::new("clash", GridPos { x: 1, y: 1 }, GridSize::new(2, 2)),
            LayoutRect::new("wide", GridPos { x: 10, y: 0 }, GridSize::new(6, 2)),
        ];

        assert_eq!(store.restore(widgets, rects, Vec::new(), &registry), LayoutChange::Restored);
        assert_eq!(store.rect("kept").map(|r| (r.x, r.y)), Some((0, 0)));
        assert_eq!(store.layout().len(), 4);
        assert!(store.layout().iter().all(|r| r.y < 50));
        assert_on_grid_and_disjoint(&store);
    }

    #[test]
    fn open_chat_creates_lazily() {
        let mut store = LayoutStore::default();
        let owner = ChatOwner::Assistant;
        let (_, created) = store.open_chat(&owner);
        assert!(created);
        let (_, created) = store.open_chat(&owner);
        assert!(!created);
    }

    #[test]
    fn canvas_height_has_a_minimum() {
        assert_eq!(canvas_height(0, 40.0, 8.0, 8.0), 600.0);
        assert_eq!(canvas_height(4, 40.0, 8.0, 8.0), 600.0);
        assert_eq!(canvas_height(20, 40.0, 8.0, 8.0), 20.0 * 40.0 + 19.0 * 8.0 + 16.0);
    }
}
