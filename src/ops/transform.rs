// ============================================================================
// TRANSFORM OPERATIONS - nearest-neighbour resampling and region blits
// ============================================================================
//
// Region helpers walk a *source* rectangle in row-major order. The source
// index always advances, even when the destination cell falls outside the
// buffer; out-of-bounds destination cells are simply skipped.

use crate::canvas::{Color, GridSize, PixelBuffer, Point, Rect, SelectionMask, TRANSPARENT};

/// Nearest-neighbour resample of a row-major `sw×sh` array to `dw×dh`.
///
/// Destination cell `(dx, dy)` reads source cell
/// `(floor(dx*sw/dw), floor(dy*sh/dh))`; the index is clamped to the source.
/// Returns an empty vector when either side is empty.
pub fn resample_nearest<T: Copy>(src: &[T], sw: u32, sh: u32, dw: u32, dh: u32) -> Vec<T> {
    if src.is_empty() || sw == 0 || sh == 0 || dw == 0 || dh == 0 {
        return Vec::new();
    }
    let last = src.len() - 1;
    let mut out = Vec::with_capacity(dw as usize * dh as usize);
    for dy in 0..dh as u64 {
        let sy = (dy * sh as u64 / dh as u64).min(sh as u64 - 1);
        for dx in 0..dw as u64 {
            let sx = (dx * sw as u64 / dw as u64).min(sw as u64 - 1);
            let idx = (sy * sw as u64 + sx) as usize;
            out.push(src[idx.min(last)]);
        }
    }
    out
}

/// Resample a selection mask to new dimensions (same rule as pixels).
pub fn resample_mask(mask: &SelectionMask, dw: u32, dh: u32) -> SelectionMask {
    if mask.width == dw && mask.height == dh {
        return mask.clone();
    }
    let bits = resample_nearest(mask.bits(), mask.width, mask.height, dw, dh);
    SelectionMask::from_bits(dw, dh, bits).unwrap_or_else(|| SelectionMask::new(dw, dh))
}

/// Copy every cell of `rect` out of `buffer` (row-major).
/// Cells outside the buffer read as transparent.
pub fn capture_region(buffer: &PixelBuffer, rect: Rect) -> Vec<Color> {
    rect.cells().map(|p| buffer.get_color(p.x, p.y)).collect()
}

/// Write `pixels` (row-major over `rect`) into `buffer`.
/// With a mask, only included cells are written.
pub fn write_region(buffer: &mut PixelBuffer, rect: Rect, pixels: &[Color], mask: Option<&SelectionMask>) {
    for (idx, p) in rect.cells().enumerate() {
        let Some(color) = pixels.get(idx) else { break };
        if mask.is_some_and(|m| !m.get_index(idx)) {
            continue;
        }
        buffer.set_color(p.x, p.y, *color);
    }
}

/// Make the cells of `rect` transparent, honouring `mask` when present.
pub fn clear_region(buffer: &mut PixelBuffer, rect: Rect, mask: Option<&SelectionMask>) {
    for (idx, p) in rect.cells().enumerate() {
        if mask.is_some_and(|m| !m.get_index(idx)) {
            continue;
        }
        buffer.set_color(p.x, p.y, TRANSPARENT);
    }
}

/// Return a copy of `buffer` with its content shifted by `offset`.
/// Content shifted past the edges is dropped; exposed cells are transparent.
pub fn shift_pixels(buffer: &PixelBuffer, offset: Point) -> PixelBuffer {
    let mut out = PixelBuffer::new(buffer.size());
    for p in Rect::of_grid(buffer.size()).cells() {
        let src = buffer.get_color(p.x - offset.x, p.y - offset.y);
        out.set_color(p.x, p.y, src);
    }
    out
}

/// Offset at which an `old` grid lands inside a `new` one for an anchor of
/// `(0|1|2, 0|1|2)` = start / centre / end on each axis.
pub fn anchor_offset(old: GridSize, new: GridSize, anchor: (u32, u32)) -> Point {
    let axis = |old: u32, new: u32, a: u32| -> i32 {
        match a {
            0 => 0,
            1 => (new as i32 - old as i32) / 2,
            _ => new as i32 - old as i32,
        }
    };
    Point::new(axis(old.x, new.x, anchor.0), axis(old.y, new.y, anchor.1))
}

/// Build a fresh transparent buffer of `size` and copy `buffer` into it at
/// `anchor`. Cells that fall outside are cropped.
pub fn place_on_new_grid(buffer: &PixelBuffer, size: GridSize, anchor: (u32, u32)) -> PixelBuffer {
    let offset = anchor_offset(buffer.size(), size, anchor);
    let mut out = PixelBuffer::new(size);
    for p in Rect::of_grid(buffer.size()).cells() {
        out.set_color(p.x + offset.x, p.y + offset.y, buffer.get_color(p.x, p.y));
    }
    out
}
