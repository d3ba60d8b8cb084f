// ============================================================================
// FLOOD FILL - bucket tool and magic-wand region search
// ============================================================================

use std::collections::VecDeque;

use crate::canvas::{Color, PixelBuffer, Point, Rect, SelectionMask};

const NEIGHBOURS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// 4-connected breadth-first fill from `seed` with `color`.
///
/// Returns the buffer as it was before the fill, or `None` when nothing was
/// done (seed out of bounds, or the seed already has `color`).
pub fn flood_fill(buffer: &mut PixelBuffer, seed: Point, color: Color) -> Option<PixelBuffer> {
    if !buffer.is_in_bounds(seed.x, seed.y) {
        return None;
    }
    let target = buffer.get_color(seed.x, seed.y);
    if target == color {
        return None;
    }

    let before = buffer.clone();
    let mut queue = VecDeque::from([seed]);
    while let Some(p) = queue.pop_front() {
        // Already-filled cells now hold `color` != target and drop out here.
        if !buffer.is_in_bounds(p.x, p.y) || buffer.get_color(p.x, p.y) != target {
            continue;
        }
        buffer.set_color(p.x, p.y, color);
        for (dx, dy) in NEIGHBOURS {
            let n = Point::new(p.x + dx, p.y + dy);
            if buffer.is_in_bounds(n.x, n.y) {
                queue.push_back(n);
            }
        }
    }
    Some(before)
}

/// Cells 4-connected to `seed` that share its exact colour, as a tight
/// bounding rectangle plus a mask of the matched cells.
pub fn wand_region(buffer: &PixelBuffer, seed: Point) -> Option<(Rect, SelectionMask)> {
    if !buffer.is_in_bounds(seed.x, seed.y) {
        return None;
    }
    let target = buffer.get_color(seed.x, seed.y);
    let w = buffer.width() as usize;
    let mut visited = vec![false; w * buffer.height() as usize];
    let mut matched = Vec::new();
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (seed.x, seed.y, seed.x, seed.y);

    visited[seed.y as usize * w + seed.x as usize] = true;
    let mut queue = VecDeque::from([seed]);
    while let Some(p) = queue.pop_front() {
        matched.push(p);
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
        for (dx, dy) in NEIGHBOURS {
            let n = Point::new(p.x + dx, p.y + dy);
            if !buffer.is_in_bounds(n.x, n.y) {
                continue;
            }
            let idx = n.y as usize * w + n.x as usize;
            if !visited[idx] && buffer.get_color(n.x, n.y) == target {
                visited[idx] = true;
                queue.push_back(n);
            }
        }
    }

    let rect = Rect::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1);
    let mut mask = SelectionMask::new(rect.width as u32, rect.height as u32);
    for p in matched {
        mask.set((p.x - rect.x) as u32, (p.y - rect.y) as u32, true);
    }
    Some((rect, mask))
}
