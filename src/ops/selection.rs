// ============================================================================
// SELECTION - rectangular / lasso / wand selection with move and resize
// ============================================================================
//
// A selection is a base rectangle (plus optional mask) with lazily applied
// move and resize offsets. Nothing touches the buffer until `apply` commits
// the pending transform; the effective rectangle is always derived from the
// base and the offsets, never stored.

use crate::canvas::{Color, GridSize, PixelBuffer, Point, Rect, SelectionMask};
use crate::components::history::{Action, stamp_transformed};
use crate::components::tools::SelectionMode;
use crate::ops::fill::wand_region;
use crate::ops::geometry::{are_adjacent, interpolate_between_points, is_point_in_polygon};
use crate::ops::transform::{capture_region, clear_region, resample_mask, resample_nearest, write_region};

/// Gesture currently being dragged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionAction {
    Select,
    Move,
    Resize(ResizeHandle),
}

/// The eight grab points around the effective rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResizeHandle {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl ResizeHandle {
    fn moves_north(self) -> bool {
        matches!(self, ResizeHandle::North | ResizeHandle::NorthEast | ResizeHandle::NorthWest)
    }

    fn moves_south(self) -> bool {
        matches!(self, ResizeHandle::South | ResizeHandle::SouthEast | ResizeHandle::SouthWest)
    }

    fn moves_west(self) -> bool {
        matches!(self, ResizeHandle::West | ResizeHandle::NorthWest | ResizeHandle::SouthWest)
    }

    fn moves_east(self) -> bool {
        matches!(self, ResizeHandle::East | ResizeHandle::NorthEast | ResizeHandle::SouthEast)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct MoveOffset {
    pub x: i32,
    pub y: i32,
}

/// Per-edge deltas. Positive `e`/`s` grow the rect, positive `n`/`w` shrink it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct ResizeOffset {
    pub n: i32,
    pub e: i32,
    pub s: i32,
    pub w: i32,
}

impl ResizeOffset {
    pub fn is_zero(&self) -> bool {
        *self == ResizeOffset::default()
    }
}

/// Selection state machine.
///
/// Idle: `selected_area == None`. Preview: `selected_area` set, `show_preview`
/// set, `action == None`. While dragging, `action` names the gesture.
#[derive(Clone, Debug, Default)]
pub struct SelectionState {
    pub action: Option<SelectionAction>,
    pub selected_area: Option<Rect>,
    /// Inclusion mask over `selected_area`; `None` selects every cell.
    pub mask: Option<SelectionMask>,
    pub move_offset: MoveOffset,
    pub resize_offset: ResizeOffset,
    pub show_preview: bool,
    pub is_pasting: bool,
    /// Clipboard content at `selected_area` size while pasting.
    pub paste_pixels: Vec<Color>,
    mode: SelectionMode,
    gesture_start: Point,
    start_move: MoveOffset,
    start_resize: ResizeOffset,
    dragged: bool,
    lasso_path: Vec<Point>,
}

fn clamp_to_grid(p: Point, grid: GridSize) -> Point {
    Point::new(
        p.x.clamp(0, grid.x.max(1) as i32 - 1),
        p.y.clamp(0, grid.y.max(1) as i32 - 1),
    )
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every bit of selection state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_idle(&self) -> bool {
        self.selected_area.is_none() && self.action.is_none()
    }

    /// An active selection awaiting commit.
    pub fn has_preview(&self) -> bool {
        self.show_preview && self.selected_area.is_some() && self.action.is_none()
    }

    /// Points of the lasso being drawn, for live feedback.
    pub fn lasso_path(&self) -> &[Point] {
        &self.lasso_path
    }

    /// `true` when applying would change the buffer.
    pub fn has_pending_change(&self) -> bool {
        self.is_pasting || self.move_offset != MoveOffset::default() || !self.resize_offset.is_zero()
    }

    /// The selection after move and resize offsets, never narrower than 1×1.
    pub fn effective_rect(&self) -> Option<Rect> {
        let base = self.selected_area?;
        let (m, r) = (self.move_offset, self.resize_offset);
        Some(Rect::new(
            base.x + m.x + r.w,
            base.y + m.y + r.n,
            (base.width + r.e - r.w).max(1),
            (base.height + r.s - r.n).max(1),
        ))
    }

    /// The handle under `p`, if any. Handles sit on the ring of cells just
    /// outside the effective rectangle.
    pub fn handle_at(&self, p: Point) -> Option<ResizeHandle> {
        let r = self.effective_rect()?;
        let (left, right) = (r.x - 1, r.right());
        let (top, bottom) = (r.y - 1, r.bottom());
        let (mid_x, mid_y) = (r.x + (r.width - 1) / 2, r.y + (r.height - 1) / 2);
        let handles = [
            (left, top, ResizeHandle::NorthWest),
            (right, top, ResizeHandle::NorthEast),
            (right, bottom, ResizeHandle::SouthEast),
            (left, bottom, ResizeHandle::SouthWest),
            (mid_x, top, ResizeHandle::North),
            (right, mid_y, ResizeHandle::East),
            (mid_x, bottom, ResizeHandle::South),
            (left, mid_y, ResizeHandle::West),
        ];
        handles
            .iter()
            .find(|(x, y, _)| p.x == *x && p.y == *y)
            .map(|(_, _, h)| *h)
    }

    // ========================================================================
    // POINTER GESTURES
    // ========================================================================

    /// Start a gesture at `p`. Grabbing a handle resizes, pressing inside the
    /// selection moves it; anywhere else commits the preview (the returned
    /// action) and starts a new selection in `mode`.
    pub fn pointer_down(&mut self, buffer: &mut PixelBuffer, p: Point, mode: SelectionMode) -> Option<Action> {
        if self.has_preview() {
            if let Some(handle) = self.handle_at(p) {
                self.begin_drag(SelectionAction::Resize(handle), p);
                return None;
            }
            if self.effective_rect().is_some_and(|r| r.contains(p)) {
                self.begin_drag(SelectionAction::Move, p);
                return None;
            }
        }

        let committed = self.apply(buffer);
        let grid = buffer.size();
        let start = clamp_to_grid(p, grid);
        self.mode = mode;
        self.gesture_start = start;

        match mode {
            SelectionMode::Rectangular => {
                self.action = Some(SelectionAction::Select);
                self.selected_area = Some(Rect::new(start.x, start.y, 1, 1));
            }
            SelectionMode::Lasso => {
                self.action = Some(SelectionAction::Select);
                self.lasso_path = vec![start];
            }
            SelectionMode::Wand => {
                if let Some((rect, mask)) = wand_region(buffer, p) {
                    self.selected_area = Some(rect);
                    self.mask = Some(mask);
                    self.show_preview = true;
                }
            }
        }
        committed
    }

    fn begin_drag(&mut self, action: SelectionAction, p: Point) {
        self.action = Some(action);
        self.gesture_start = p;
        self.start_move = self.move_offset;
        self.start_resize = self.resize_offset;
    }

    pub fn pointer_move(&mut self, p: Point, grid: GridSize) {
        let Some(action) = self.action else { return };
        match action {
            SelectionAction::Select => {
                let current = clamp_to_grid(p, grid);
                if current != self.gesture_start {
                    self.dragged = true;
                }
                match self.mode {
                    SelectionMode::Lasso => self.extend_lasso(current),
                    _ => self.selected_area = Some(Rect::from_corners(self.gesture_start, current)),
                }
            }
            SelectionAction::Move => {
                self.move_offset = MoveOffset {
                    x: self.start_move.x + p.x - self.gesture_start.x,
                    y: self.start_move.y + p.y - self.gesture_start.y,
                };
            }
            SelectionAction::Resize(handle) => self.drag_handle(handle, p),
        }
    }

    fn extend_lasso(&mut self, p: Point) {
        match self.lasso_path.last() {
            Some(last) if *last == p => {}
            Some(last) => {
                let segment = interpolate_between_points(*last, p);
                self.lasso_path.extend(segment);
            }
            None => self.lasso_path.push(p),
        }
    }

    /// Move the dragged edges, clamping each so the rect keeps at least one
    /// cell on both axes.
    fn drag_handle(&mut self, handle: ResizeHandle, p: Point) {
        let Some(base) = self.selected_area else { return };
        let (dx, dy) = (p.x - self.gesture_start.x, p.y - self.gesture_start.y);
        let start = self.start_resize;
        let r = &mut self.resize_offset;

        if handle.moves_north() {
            r.n = (start.n + dy).min(base.height + r.s - 1);
        }
        if handle.moves_south() {
            r.s = (start.s + dy).max(r.n - base.height + 1);
        }
        if handle.moves_west() {
            r.w = (start.w + dx).min(base.width + r.e - 1);
        }
        if handle.moves_east() {
            r.e = (start.e + dx).max(r.w - base.width + 1);
        }
    }

    /// Finish the current drag. Returns `true` when a selection is left active.
    pub fn pointer_up(&mut self) -> bool {
        match self.action {
            Some(SelectionAction::Select) => {
                self.action = None;
                match self.mode {
                    SelectionMode::Lasso => self.close_lasso(),
                    _ if self.dragged => {
                        self.mask = None;
                        self.show_preview = true;
                    }
                    _ => self.reset(),
                }
            }
            Some(SelectionAction::Move) | Some(SelectionAction::Resize(_)) => {
                self.action = None;
            }
            None => {}
        }
        self.dragged = false;
        self.has_preview()
    }

    /// Close the lasso path and rasterise it into a mask over its bounds.
    fn close_lasso(&mut self) {
        let mut path = std::mem::take(&mut self.lasso_path);
        let mut distinct = path.clone();
        distinct.sort_by_key(|p| (p.y, p.x));
        distinct.dedup();
        if distinct.len() < 3 {
            self.reset();
            return;
        }

        if let (Some(first), Some(last)) = (path.first().copied(), path.last().copied())
            && !are_adjacent(first, last)
        {
            path.extend(interpolate_between_points(last, first));
        }

        let (mut min_x, mut min_y) = (i32::MAX, i32::MAX);
        let (mut max_x, mut max_y) = (i32::MIN, i32::MIN);
        for p in &path {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        let bounds = Rect::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1);

        let mut mask = SelectionMask::new(bounds.width as u32, bounds.height as u32);
        for cell in bounds.cells() {
            if is_point_in_polygon(cell, &path) {
                mask.set((cell.x - bounds.x) as u32, (cell.y - bounds.y) as u32, true);
            }
        }

        self.selected_area = Some(bounds);
        self.mask = Some(mask);
        self.show_preview = true;
    }

    // ========================================================================
    // COMMIT / DELETE / PASTE
    // ========================================================================

    /// Content of the base selection: the paste payload while pasting,
    /// otherwise the buffer cells under the base rect.
    pub fn base_content(&self, buffer: &PixelBuffer) -> Option<Vec<Color>> {
        let base = self.selected_area?;
        if self.is_pasting {
            Some(self.paste_pixels.clone())
        } else {
            Some(capture_region(buffer, base))
        }
    }

    /// Content and mask resampled to the effective rect.
    pub fn effective_content(&self, buffer: &PixelBuffer) -> Option<(Rect, Vec<Color>, Option<SelectionMask>)> {
        let base = self.selected_area?;
        let dst = self.effective_rect()?;
        let content = self.base_content(buffer)?;
        let (dw, dh) = (dst.width as u32, dst.height as u32);
        let pixels = resample_nearest(&content, base.width.max(1) as u32, base.height.max(1) as u32, dw, dh);
        let mask = self.mask.as_ref().map(|m| resample_mask(m, dw, dh));
        Some((dst, pixels, mask))
    }

    /// Commit a pending move, resize or paste into `buffer`. The selection
    /// always ends up idle; an action is returned only when something changed.
    pub fn apply(&mut self, buffer: &mut PixelBuffer) -> Option<Action> {
        let action = self.build_commit(buffer);
        self.reset();
        action
    }

    fn build_commit(&self, buffer: &mut PixelBuffer) -> Option<Action> {
        let base = self.selected_area?;
        if !self.show_preview || !self.has_pending_change() {
            return None;
        }

        if self.is_pasting {
            let (dst, pixels, mask) = self.effective_content(buffer)?;
            let prev_pixels = capture_region(buffer, dst);
            write_region(buffer, dst, &pixels, mask.as_ref());
            return Some(Action::Paste {
                area: dst,
                pixels,
                prev_pixels,
                mask,
            });
        }

        let dst = self.effective_rect()?;
        let src_pixels = capture_region(buffer, base);
        clear_region(buffer, base, self.mask.as_ref());
        let dst_pixels = capture_region(buffer, dst);
        stamp_transformed(buffer, base, dst, &src_pixels, self.mask.as_ref());
        Some(Action::Transform {
            src_rect: base,
            dst_rect: dst,
            src_pixels,
            dst_pixels,
            mask: self.mask.clone(),
        })
    }

    /// Clear the selected cells. A pending paste is cancelled instead.
    pub fn delete(&mut self, buffer: &mut PixelBuffer) -> Option<Action> {
        if self.is_pasting {
            self.reset();
            return None;
        }
        let area = self.selected_area?;
        if !self.show_preview {
            return None;
        }
        let pixels = capture_region(buffer, area);
        clear_region(buffer, area, self.mask.as_ref());
        let mask = self.mask.take();
        self.reset();
        Some(Action::Delete { area, pixels, mask })
    }

    /// Enter the pasting preview with `pixels` laid out over `area`.
    pub fn start_paste(&mut self, area: Rect, pixels: Vec<Color>, mask: Option<SelectionMask>) {
        self.reset();
        self.selected_area = Some(area);
        self.paste_pixels = pixels;
        self.mask = mask;
        self.is_pasting = true;
        self.show_preview = true;
    }

    /// Select the whole grid.
    pub fn select_all(&mut self, grid: GridSize) {
        self.reset();
        self.selected_area = Some(Rect::of_grid(grid));
        self.show_preview = true;
    }
}
