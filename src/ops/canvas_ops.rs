// ============================================================================
// CANVAS-LEVEL OPERATIONS - new / clear / resize / replace / whole-grid move
// ============================================================================
//
// Every operation here replaces the buffer wholesale and returns the action
// that records both the old and the new state.

use crate::canvas::{GridSize, PixelBuffer, Point, Rect};
use crate::components::history::Action;
use crate::ops::transform::{place_on_new_grid, shift_pixels};

/// Swap in `next`, returning a `New` action that remembers the old buffer.
pub fn replace_canvas(buffer: &mut PixelBuffer, next: PixelBuffer) -> Action {
    let prev = std::mem::replace(buffer, next);
    Action::New {
        pixel_data: buffer.clone(),
        prev_pixel_data: prev,
    }
}

/// A fresh transparent grid of `size`.
pub fn new_canvas(buffer: &mut PixelBuffer, size: GridSize) -> Action {
    crate::log_info!("new canvas {}×{}", size.x, size.y);
    replace_canvas(buffer, PixelBuffer::new(size))
}

/// Resize to `size`, keeping the old content at `anchor`
/// (`(0|1|2, 0|1|2)` = start / centre / end per axis). Same size is a no-op.
pub fn resize_canvas(buffer: &mut PixelBuffer, size: GridSize, anchor: (u32, u32)) -> Option<Action> {
    if size == buffer.size() {
        return None;
    }
    crate::log_info!(
        "resize canvas {}×{} -> {}×{} (anchor {:?})",
        buffer.width(),
        buffer.height(),
        size.x,
        size.y,
        anchor
    );
    let next = place_on_new_grid(buffer, size, (anchor.0.min(2), anchor.1.min(2)));
    Some(replace_canvas(buffer, next))
}

/// Make every cell transparent. No-op on an already empty grid.
pub fn clear_canvas(buffer: &mut PixelBuffer) -> Option<Action> {
    if buffer.as_raw().iter().all(|b| *b == 0) {
        return None;
    }
    let empty = PixelBuffer::new(buffer.size());
    let prev = std::mem::replace(buffer, empty);
    Some(Action::Clear { prev_pixel_data: prev })
}

/// Live drag of the whole grid with the Move tool.
#[derive(Clone, Debug)]
pub struct CanvasDrag {
    start: Point,
    offset: Point,
    source: PixelBuffer,
}

impl CanvasDrag {
    pub fn begin(buffer: &PixelBuffer, start: Point) -> Self {
        Self {
            start,
            offset: Point::default(),
            source: buffer.clone(),
        }
    }

    pub fn offset(&self) -> Point {
        self.offset
    }

    /// Re-shift from the untouched source so repeated updates never
    /// accumulate clipping.
    pub fn update(&mut self, buffer: &mut PixelBuffer, p: Point) {
        let offset = Point::new(p.x - self.start.x, p.y - self.start.y);
        if offset == self.offset {
            return;
        }
        self.offset = offset;
        *buffer = shift_pixels(&self.source, offset);
    }

    /// Commit the drag as one `Move` action; a zero offset leaves no entry.
    pub fn finish(self, buffer: &PixelBuffer) -> Option<Action> {
        if self.offset == Point::default() {
            return None;
        }
        Some(Action::Move {
            area: Rect::of_grid(self.source.size()),
            offset: self.offset,
            source_pixels: self.source,
            dest_pixels: buffer.clone(),
        })
    }

    /// Abandon the drag and put the original content back.
    pub fn cancel(self, buffer: &mut PixelBuffer) {
        *buffer = self.source;
    }
}
