use std::collections::VecDeque;

use crate::canvas::{Color, PixelBuffer, Point, Rect, SelectionMask};
use crate::ops::fill::flood_fill;
use crate::ops::transform::{clear_region, resample_mask, resample_nearest, write_region};

/// Default cap on the number of undo steps.
pub const MAX_HISTORY_SIZE: usize = 100;

// ============================================================================
// ACTIONS - self-contained records of one reversible edit
// ============================================================================

/// A single cell touched by a stroke, with the colour it had before.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelChange {
    pub x: i32,
    pub y: i32,
    pub color: Color,
    pub prev_color: Color,
}

/// One reversible edit. Each variant owns every byte it needs to both undo
/// and redo itself; nothing is re-derived from the live buffer except the
/// bucket redo, which replays the fill on the restored pre-fill state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    /// Freehand stroke, line, shape or shade stroke.
    Draw { pixels: Vec<PixelChange> },
    /// Flood fill from `(x, y)`.
    Bucket {
        x: i32,
        y: i32,
        color: Color,
        prev_pixel_data: PixelBuffer,
    },
    /// Selection moved and/or resized. `src_pixels` is the source rect before
    /// it was cleared, `dst_pixels` the destination rect before stamping.
    /// `mask` is in source-rect coordinates.
    Transform {
        src_rect: Rect,
        dst_rect: Rect,
        src_pixels: Vec<Color>,
        dst_pixels: Vec<Color>,
        mask: Option<SelectionMask>,
    },
    /// Whole-canvas shift by `offset`.
    Move {
        area: Rect,
        offset: Point,
        source_pixels: PixelBuffer,
        dest_pixels: PixelBuffer,
    },
    /// Selection cleared to transparent. `pixels` is the area before clearing.
    Delete {
        area: Rect,
        pixels: Vec<Color>,
        mask: Option<SelectionMask>,
    },
    /// Clipboard content stamped into `area` (`pixels` already at area size).
    Paste {
        area: Rect,
        pixels: Vec<Color>,
        prev_pixels: Vec<Color>,
        mask: Option<SelectionMask>,
    },
    /// New canvas, canvas resize or import. The grid size travels with the buffers.
    New {
        pixel_data: PixelBuffer,
        prev_pixel_data: PixelBuffer,
    },
    /// Every cell made transparent.
    Clear { prev_pixel_data: PixelBuffer },
}

/// Stamp `src_pixels` (laid out over `src_rect`) into `dst_rect`, resampling
/// pixels and mask when the sizes differ. Shared by the first application of a
/// selection transform and its redo so both produce identical buffers.
pub fn stamp_transformed(
    buffer: &mut PixelBuffer,
    src_rect: Rect,
    dst_rect: Rect,
    src_pixels: &[Color],
    mask: Option<&SelectionMask>,
) {
    let (sw, sh) = (src_rect.width.max(1) as u32, src_rect.height.max(1) as u32);
    let (dw, dh) = (dst_rect.width.max(1) as u32, dst_rect.height.max(1) as u32);
    let content = resample_nearest(src_pixels, sw, sh, dw, dh);
    let dst_mask = mask.map(|m| resample_mask(m, dw, dh));
    write_region(buffer, dst_rect, &content, dst_mask.as_ref());
}

impl Action {
    /// Restore the buffer to the state before this action.
    pub fn undo(&self, buffer: &mut PixelBuffer) {
        match self {
            Action::Draw { pixels } => {
                for change in pixels.iter().rev() {
                    buffer.set_color(change.x, change.y, change.prev_color);
                }
            }
            Action::Bucket { prev_pixel_data, .. } => {
                *buffer = prev_pixel_data.clone();
            }
            Action::Transform {
                src_rect,
                dst_rect,
                src_pixels,
                dst_pixels,
                ..
            } => {
                // Reverse order of application: un-stamp, then un-clear.
                write_region(buffer, *dst_rect, dst_pixels, None);
                write_region(buffer, *src_rect, src_pixels, None);
            }
            Action::Move { source_pixels, .. } => {
                *buffer = source_pixels.clone();
            }
            Action::Delete { area, pixels, .. } => {
                write_region(buffer, *area, pixels, None);
            }
            Action::Paste { area, prev_pixels, .. } => {
                write_region(buffer, *area, prev_pixels, None);
            }
            Action::New { prev_pixel_data, .. } | Action::Clear { prev_pixel_data } => {
                *buffer = prev_pixel_data.clone();
            }
        }
    }

    /// Re-apply this action on a buffer that is in its pre-action state.
    pub fn redo(&self, buffer: &mut PixelBuffer) {
        match self {
            Action::Draw { pixels } => {
                for change in pixels {
                    buffer.set_color(change.x, change.y, change.color);
                }
            }
            Action::Bucket { x, y, color, .. } => {
                flood_fill(buffer, Point::new(*x, *y), *color);
            }
            Action::Transform {
                src_rect,
                dst_rect,
                src_pixels,
                mask,
                ..
            } => {
                clear_region(buffer, *src_rect, mask.as_ref());
                stamp_transformed(buffer, *src_rect, *dst_rect, src_pixels, mask.as_ref());
            }
            Action::Move { dest_pixels, .. } => {
                *buffer = dest_pixels.clone();
            }
            Action::Delete { area, mask, .. } => {
                clear_region(buffer, *area, mask.as_ref());
            }
            Action::Paste { area, pixels, mask, .. } => {
                write_region(buffer, *area, pixels, mask.as_ref());
            }
            Action::New { pixel_data, .. } => {
                *buffer = pixel_data.clone();
            }
            Action::Clear { prev_pixel_data } => {
                *buffer = PixelBuffer::new(prev_pixel_data.size());
            }
        }
    }

    pub fn description(&self) -> String {
        match self {
            Action::Draw { pixels } => format!("Draw ({} px)", pixels.len()),
            Action::Bucket { x, y, .. } => format!("Fill at {},{}", x, y),
            Action::Transform { dst_rect, .. } => {
                format!("Transform Selection → {}×{}", dst_rect.width, dst_rect.height)
            }
            Action::Move { offset, .. } => format!("Move Canvas {:+},{:+}", offset.x, offset.y),
            Action::Delete { .. } => "Delete Selection".to_string(),
            Action::Paste { .. } => "Paste".to_string(),
            Action::New { pixel_data, .. } => {
                format!("New Canvas {}×{}", pixel_data.width(), pixel_data.height())
            }
            Action::Clear { .. } => "Clear Canvas".to_string(),
        }
    }

    /// Approximate bytes held by this record.
    pub fn memory_size(&self) -> usize {
        let colors = |v: &Vec<Color>| v.len() * 4;
        let mask = |m: &Option<SelectionMask>| m.as_ref().map_or(0, |m| m.bits().len());
        match self {
            Action::Draw { pixels } => pixels.len() * std::mem::size_of::<PixelChange>(),
            Action::Bucket { prev_pixel_data, .. } => prev_pixel_data.memory_bytes(),
            Action::Transform {
                src_pixels,
                dst_pixels,
                mask: m,
                ..
            } => colors(src_pixels) + colors(dst_pixels) + mask(m),
            Action::Move {
                source_pixels,
                dest_pixels,
                ..
            } => source_pixels.memory_bytes() + dest_pixels.memory_bytes(),
            Action::Delete { pixels, mask: m, .. } => colors(pixels) + mask(m),
            Action::Paste {
                pixels,
                prev_pixels,
                mask: m,
                ..
            } => colors(pixels) + colors(prev_pixels) + mask(m),
            Action::New {
                pixel_data,
                prev_pixel_data,
            } => pixel_data.memory_bytes() + prev_pixel_data.memory_bytes(),
            Action::Clear { prev_pixel_data } => prev_pixel_data.memory_bytes(),
        }
    }
}

// ============================================================================
// HISTORY MANAGER - Manages undo/redo stacks with a step cap
// ============================================================================

/// Bounded undo/redo log. The back of each deque is the most recent entry.
pub struct HistoryManager {
    undo_stack: VecDeque<Action>,
    redo_stack: VecDeque<Action>,
    max_history_size: usize,
    /// Optional memory cap in bytes, applied after the step cap.
    max_memory_bytes: Option<usize>,
    /// Running memory total across both stacks.
    total_memory: usize,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(MAX_HISTORY_SIZE)
    }
}

impl HistoryManager {
    pub fn new(max_history_size: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            max_history_size: max_history_size.max(1),
            max_memory_bytes: None,
            total_memory: 0,
        }
    }

    pub fn with_memory_limit(mut self, bytes: usize) -> Self {
        self.max_memory_bytes = Some(bytes);
        self
    }

    /// Record a freshly applied action. Clears the redo stack.
    pub fn push(&mut self, action: Action) {
        for old in self.redo_stack.drain(..) {
            self.total_memory = self.total_memory.saturating_sub(old.memory_size());
        }

        self.total_memory += action.memory_size();
        self.undo_stack.push_back(action);

        self.prune();
    }

    pub fn undo(&mut self, buffer: &mut PixelBuffer) -> Option<String> {
        let action = self.undo_stack.pop_back()?;
        let description = action.description();
        action.undo(buffer);
        crate::log_debug!("undo: {}", description);
        self.redo_stack.push_back(action);
        Some(description)
    }

    pub fn redo(&mut self, buffer: &mut PixelBuffer) -> Option<String> {
        let action = self.redo_stack.pop_back()?;
        let description = action.description();
        action.redo(buffer);
        crate::log_debug!("redo: {}", description);
        self.undo_stack.push_back(action);
        Some(description)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_description(&self) -> Option<String> {
        self.undo_stack.back().map(|a| a.description())
    }

    pub fn redo_description(&self) -> Option<String> {
        self.redo_stack.back().map(|a| a.description())
    }

    /// Undo entries, most recent first.
    pub fn undo_actions(&self) -> impl Iterator<Item = &Action> {
        self.undo_stack.iter().rev()
    }

    /// Redo entries, next-to-redo first.
    pub fn redo_actions(&self) -> impl Iterator<Item = &Action> {
        self.redo_stack.iter().rev()
    }

    /// Undo descriptions (most recent first).
    pub fn undo_history(&self) -> Vec<String> {
        self.undo_actions().map(|a| a.description()).collect()
    }

    pub fn memory_usage(&self) -> usize {
        self.total_memory
    }

    pub fn max_history_size(&self) -> usize {
        self.max_history_size
    }

    pub fn set_max_history_size(&mut self, size: usize) {
        self.max_history_size = size.max(1);
        self.prune();
    }

    /// Drop the oldest entries until both caps hold.
    fn prune(&mut self) {
        while self.undo_stack.len() > self.max_history_size {
            if let Some(removed) = self.undo_stack.pop_front() {
                self.total_memory = self.total_memory.saturating_sub(removed.memory_size());
                crate::log_debug!("history full, evicted: {}", removed.description());
            }
        }

        if let Some(max_bytes) = self.max_memory_bytes {
            while self.total_memory > max_bytes && self.undo_stack.len() > 1 {
                if let Some(removed) = self.undo_stack.pop_front() {
                    self.total_memory = self.total_memory.saturating_sub(removed.memory_size());
                }
            }
        }
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.total_memory = 0;
    }

    /// Undo `count` steps (stops early when the stack runs out).
    pub fn undo_to(&mut self, count: usize, buffer: &mut PixelBuffer) {
        for _ in 0..count {
            if self.undo(buffer).is_none() {
                break;
            }
        }
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }
}
