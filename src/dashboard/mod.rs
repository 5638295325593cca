use crate::widgets::catalog::WidgetContent;
use serde::{Deserialize, Serialize};

pub mod placement;
pub mod store;

pub const GRID_COLUMNS: u32 = 12;
pub const MAX_ROWS_FLOOR: u32 = 50;

pub const DEFAULT_MIN_W: u32 = 1;
pub const DEFAULT_MAX_W: u32 = 12;
pub const DEFAULT_MIN_H: u32 = 1;
pub const DEFAULT_MAX_H: u32 = 50;

/// Deepest row a restored rect may start on.
pub const RESTORE_ROW_LIMIT: u32 = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSize {
    pub w: u32,
    pub h: u32,
}

impl GridSize {
    pub const fn new(w: u32, h: u32) -> Self {
        Self { w, h }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridPos {
    pub x: u32,
    pub y: u32,
}

/// A mounted dashboard panel. `content` is regenerated from `widget_type` and
/// `title` on restore and never written to storage.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetDescriptor {
    pub id: String,
    pub widget_type: String,
    pub title: String,
    pub content: WidgetContent,
}

impl WidgetDescriptor {
    pub fn stored(&self) -> StoredWidget {
        StoredWidget {
            id: self.id.clone(),
            widget_type: self.widget_type.clone(),
            title: self.title.clone(),
        }
    }
}

/// The recipe needed to rebuild a [`WidgetDescriptor`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredWidget {
    pub id: String,
    #[serde(rename = "type")]
    pub widget_type: String,
    pub title: String,
}

/// Partial update merged into a descriptor by [`store::LayoutStore::update_descriptor`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DescriptorPatch {
    pub widget_type: Option<String>,
    pub title: Option<String>,
    pub content: Option<WidgetContent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutRect {
    #[serde(rename = "i")]
    pub id: String,
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    #[serde(default = "default_min_w")]
    pub min_w: u32,
    #[serde(default = "default_max_w")]
    pub max_w: u32,
    #[serde(default = "default_min_h")]
    pub min_h: u32,
    #[serde(default = "default_max_h")]
    pub max_h: u32,
    #[serde(default = "default_true")]
    pub is_resizable: bool,
    #[serde(default = "default_true")]
    pub is_draggable: bool,
}

impl LayoutRect {
    pub fn new(id: impl Into<String>, pos: GridPos, size: GridSize) -> Self {
        Self {
            id: id.into(),
            x: pos.x,
            y: pos.y,
            w: size.w,
            h: size.h,
            min_w: DEFAULT_MIN_W,
            max_w: DEFAULT_MAX_W,
            min_h: DEFAULT_MIN_H,
            max_h: DEFAULT_MAX_H,
            is_resizable: true,
            is_draggable: true,
        }
    }

    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.h)
    }

    pub fn overlaps(&self, pos: GridPos, size: GridSize) -> bool {
        pos.x < self.x.saturating_add(self.w)
            && pos.x.saturating_add(size.w) > self.x
            && pos.y < self.bottom()
            && pos.y.saturating_add(size.h) > self.y
    }

    /// Whether a rect read from storage can be trusted on a grid of
    /// `columns`: positive size within its bounds, inside the grid, and not
    /// absurdly far down.
    pub fn is_sane(&self, columns: u32) -> bool {
        self.w >= 1
            && self.h >= 1
            && self.w <= self.max_w
            && self.h <= self.max_h
            && self.x.checked_add(self.w).is_some_and(|right| right <= columns)
            && self.y <= RESTORE_ROW_LIMIT
    }
}

fn default_min_w() -> u32 {
    DEFAULT_MIN_W
}

fn default_max_w() -> u32 {
    DEFAULT_MAX_W
}

fn default_min_h() -> u32 {
    DEFAULT_MIN_H
}

fn default_max_h() -> u32 {
    DEFAULT_MAX_H
}

fn default_true() -> bool {
    true
}
