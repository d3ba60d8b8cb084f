// ============================================================================
// BRUSH - freehand stroke accumulation, line/shape commit, shading
// ============================================================================
//
// A stroke paints into the live buffer as the pointer moves, but its history
// entry is held back until release so the whole stroke undoes in one step.

use std::collections::HashSet;

use crate::canvas::{Color, PixelBuffer, Point};
use crate::components::colors::shade_color;
use crate::components::history::{Action, PixelChange};
use crate::ops::geometry::interpolate_between_points;

/// What a stamp writes into each cell it covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BrushPaint {
    /// Overwrite with a fixed colour (pencil, eraser, line, shape).
    Solid(Color),
    /// Darken or lighten the existing colour by `strength` percent.
    Shade { strength: u8, darken: bool },
}

impl BrushPaint {
    fn apply(&self, current: Color) -> Option<Color> {
        match *self {
            BrushPaint::Solid(c) => Some(c),
            BrushPaint::Shade { strength, darken } => {
                // Nothing to shade on an empty cell.
                (current[3] != 0).then(|| shade_color(current, strength, darken))
            }
        }
    }
}

/// In-flight stroke: cells touched so far and their pre-stroke colours.
#[derive(Clone, Debug, Default)]
pub struct StrokeState {
    last_point: Option<Point>,
    painted: HashSet<Point>,
    changes: Vec<PixelChange>,
}

impl StrokeState {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` between the first stamp and `finish`/`revert`.
    pub fn is_active(&self) -> bool {
        self.last_point.is_some()
    }

    pub fn last_point(&self) -> Option<Point> {
        self.last_point
    }

    /// Changes recorded so far, in paint order.
    pub fn pending(&self) -> &[PixelChange] {
        &self.changes
    }

    /// Stamp the brush at `point`, filling the gap from the previous point.
    pub fn paint_to(&mut self, buffer: &mut PixelBuffer, point: Point, size: u32, paint: BrushPaint) {
        match self.last_point {
            Some(prev) if prev == point => {}
            Some(prev) => {
                for p in interpolate_between_points(prev, point) {
                    self.stamp(buffer, p, size, paint);
                }
            }
            None => self.stamp(buffer, point, size, paint),
        }
        self.last_point = Some(point);
    }

    /// Paint an `size×size` square centred on `center`. Each cell is recorded
    /// and painted at most once per stroke.
    fn stamp(&mut self, buffer: &mut PixelBuffer, center: Point, size: u32, paint: BrushPaint) {
        let size = size.max(1) as i32;
        let half = size / 2;
        for dy in 0..size {
            for dx in 0..size {
                let p = Point::new(center.x - half + dx, center.y - half + dy);
                if !buffer.is_in_bounds(p.x, p.y) || !self.painted.insert(p) {
                    continue;
                }
                let prev_color = buffer.get_color(p.x, p.y);
                let Some(color) = paint.apply(prev_color) else {
                    continue;
                };
                buffer.set_color(p.x, p.y, color);
                self.changes.push(PixelChange {
                    x: p.x,
                    y: p.y,
                    color,
                    prev_color,
                });
            }
        }
    }

    /// End the stroke, turning its changes into one `Draw` action.
    /// Returns `None` when the stroke touched no cell.
    pub fn finish(&mut self) -> Option<Action> {
        let changes = std::mem::take(&mut self.changes);
        self.reset();
        (!changes.is_empty()).then_some(Action::Draw { pixels: changes })
    }

    /// Roll the buffer back to its pre-stroke state and drop the stroke.
    pub fn revert(&mut self, buffer: &mut PixelBuffer) {
        for change in self.changes.iter().rev() {
            buffer.set_color(change.x, change.y, change.prev_color);
        }
        self.changes.clear();
        self.reset();
    }

    fn reset(&mut self) {
        self.last_point = None;
        self.painted.clear();
    }
}

/// Stamp the brush once at every point of a pre-computed path (a line or
/// shape) and return the edit as a single `Draw` action.
pub fn stamp_points(buffer: &mut PixelBuffer, points: &[Point], size: u32, paint: BrushPaint) -> Option<Action> {
    let mut stroke = StrokeState::new();
    for p in points {
        stroke.stamp(buffer, *p, size, paint);
    }
    stroke.finish()
}

/// Cells of a straight line including both endpoints.
pub fn line_points(start: Point, end: Point) -> Vec<Point> {
    let mut points = vec![start];
    points.extend(interpolate_between_points(start, end));
    points
}
