use crate::dashboard::{GridPos, GridSize, LayoutRect};
use std::collections::VecDeque;

/// Rows scanned before giving up: enough to clear every existing rect plus
/// the new one, never less than `floor`.
pub fn scan_limit(existing: &[LayoutRect], size: GridSize, floor: u32) -> u32 {
    let bottom = existing.iter().map(LayoutRect::bottom).max().unwrap_or(0);
    bottom.saturating_add(size.h).max(floor)
}

/// Leftmost-topmost free cell for `size`, scanning row-major.
///
/// When nothing fits inside `max_rows` the rect is stacked below everything
/// at `x = 0`. The fallback ignores the column count, so a rect wider than
/// the grid overflows it there.
pub fn place(size: GridSize, existing: &[LayoutRect], columns: u32, max_rows: u32) -> GridPos {
    if size.w <= columns {
        for y in 0..max_rows {
            for x in 0..=(columns - size.w) {
                let candidate = GridPos { x, y };
                if !existing.iter().any(|rect| rect.overlaps(candidate, size)) {
                    return candidate;
                }
            }
        }
    }

    GridPos {
        x: 0,
        y: existing.iter().map(LayoutRect::bottom).max().unwrap_or(0),
    }
}

/// Pushes every rect that collides with `pinned` down until it clears the
/// rect that hit it, cascading through whatever the pushed rects land on.
/// `pinned` itself never moves. Returns whether anything moved.
pub fn push_down(rects: &mut [LayoutRect], pinned: &str) -> bool {
    let mut queue: VecDeque<usize> = rects.iter().position(|r| r.id == pinned).into_iter().collect();
    let mut moved = false;
    while let Some(mover) = queue.pop_front() {
        let pos = GridPos {
            x: rects[mover].x,
            y: rects[mover].y,
        };
        let size = GridSize::new(rects[mover].w, rects[mover].h);
        let bottom = rects[mover].bottom();
        for index in 0..rects.len() {
            if index == mover || rects[index].id == pinned {
                continue;
            }
            if rects[index].overlaps(pos, size) {
                rects[index].y = bottom;
                queue.push_back(index);
                moved = true;
            }
        }
    }
    moved
}
