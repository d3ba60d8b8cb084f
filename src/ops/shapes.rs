// ============================================================================
// SHAPES - rectangle / ellipse outline and fill point generation
// ============================================================================

use std::collections::HashSet;

use crate::canvas::{Point, Rect};

/// Available shape primitives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum ShapeKind {
    #[default]
    Rectangle,
    Ellipse,
}

impl ShapeKind {
    pub fn label(&self) -> &'static str {
        match self {
            ShapeKind::Rectangle => "Rectangle",
            ShapeKind::Ellipse => "Ellipse",
        }
    }

    pub fn all() -> &'static [ShapeKind] {
        &[ShapeKind::Rectangle, ShapeKind::Ellipse]
    }
}

/// Whether a shape is drawn as its outline only or filled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum ShapeFillMode {
    #[default]
    Outline,
    Filled,
}

impl ShapeFillMode {
    pub fn from_fill(fill: bool) -> Self {
        if fill { ShapeFillMode::Filled } else { ShapeFillMode::Outline }
    }
}

/// Cells of `kind` spanning the box between `start` and `end` (any quadrant).
pub fn shape_points(kind: ShapeKind, fill: ShapeFillMode, start: Point, end: Point) -> Vec<Point> {
    let bounds = Rect::from_corners(start, end);
    match (kind, fill) {
        (ShapeKind::Rectangle, ShapeFillMode::Outline) => rectangle_outline(bounds),
        (ShapeKind::Rectangle, ShapeFillMode::Filled) => bounds.cells().collect(),
        (ShapeKind::Ellipse, ShapeFillMode::Outline) => ellipse_outline(bounds),
        (ShapeKind::Ellipse, ShapeFillMode::Filled) => ellipse_fill(bounds),
    }
}

/// Perimeter cells of `r`, each listed once.
pub fn rectangle_outline(r: Rect) -> Vec<Point> {
    if r.width <= 0 || r.height <= 0 {
        return Vec::new();
    }
    let (x0, y0) = (r.x, r.y);
    let (x1, y1) = (r.right() - 1, r.bottom() - 1);
    let mut pts = Vec::with_capacity((r.width as usize + r.height as usize) * 2);
    for x in x0..=x1 {
        pts.push(Point::new(x, y0));
        if y1 != y0 {
            pts.push(Point::new(x, y1));
        }
    }
    for y in (y0 + 1)..y1 {
        pts.push(Point::new(x0, y));
        if x1 != x0 {
            pts.push(Point::new(x1, y));
        }
    }
    pts
}

/// Midpoint ellipse inscribed in `r`, stepped one quadrant at a time and
/// mirrored into the other three. Works for even and odd box sizes.
pub fn ellipse_outline(r: Rect) -> Vec<Point> {
    if r.width <= 0 || r.height <= 0 {
        return Vec::new();
    }
    let mut out = PointSet::default();

    let mut x0 = r.x as i64;
    let mut x1 = (r.right() - 1) as i64;
    let mut a = x1 - x0;
    let b = (r.bottom() - 1 - r.y) as i64;
    let mut b1 = b & 1;

    let mut dx = 4 * (1 - a) * b * b;
    let mut dy = 4 * (b1 + 1) * a * a;
    let mut err = dx + dy + b1 * a * a;

    let mut y0 = r.y as i64 + (b + 1) / 2;
    let mut y1 = y0 - b1;
    a *= 8 * a;
    b1 = 8 * b * b;

    loop {
        out.push(x1, y0);
        out.push(x0, y0);
        out.push(x0, y1);
        out.push(x1, y1);
        let e2 = 2 * err;
        if e2 <= dy {
            y0 += 1;
            y1 -= 1;
            dy += a;
            err += dy;
        }
        if e2 >= dx || 2 * err > dy {
            x0 += 1;
            x1 -= 1;
            dx += b1;
            err += dx;
        }
        if x0 > x1 {
            break;
        }
    }

    // Very flat ellipses stop early; finish the tips.
    while y0 - y1 <= b {
        out.push(x0 - 1, y0);
        out.push(x1 + 1, y0);
        y0 += 1;
        out.push(x0 - 1, y1);
        out.push(x1 + 1, y1);
        y1 -= 1;
    }

    out.into_vec()
}

/// Filled ellipse inscribed in `r`: each row's half-span comes from the
/// ellipse equation sampled at cell centres, unioned with the outline so the
/// fill always covers its own border.
pub fn ellipse_fill(r: Rect) -> Vec<Point> {
    if r.width <= 0 || r.height <= 0 {
        return Vec::new();
    }
    let mut out = PointSet::default();
    for p in ellipse_outline(r) {
        out.push(p.x as i64, p.y as i64);
    }

    let rx = r.width as f64 / 2.0;
    let ry = r.height as f64 / 2.0;
    let cx = r.x as f64 + rx;
    let cy = r.y as f64 + ry;

    for y in r.y..r.bottom() {
        let dy = (y as f64 + 0.5 - cy) / ry;
        let t = 1.0 - dy * dy;
        if t < 0.0 {
            continue;
        }
        let half = rx * t.sqrt();
        let start = (cx - half - 0.5).ceil() as i32;
        let end = (cx + half - 0.5).floor() as i32;
        for x in start.max(r.x)..=end.min(r.right() - 1) {
            out.push(x as i64, y as i64);
        }
    }
    out.into_vec()
}

/// Insertion-ordered set of cells.
#[derive(Default)]
struct PointSet {
    seen: HashSet<Point>,
    order: Vec<Point>,
}

impl PointSet {
    fn push(&mut self, x: i64, y: i64) {
        let p = Point::new(x as i32, y as i32);
        if self.seen.insert(p) {
            self.order.push(p);
        }
    }

    fn into_vec(self) -> Vec<Point> {
        self.order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(mut v: Vec<Point>) -> Vec<(i32, i32)> {
        v.sort_by_key(|p| (p.y, p.x));
        v.into_iter().map(|p| (p.x, p.y)).collect()
    }

    #[test]
    fn rectangle_outline_has_no_duplicates() {
        let pts = rectangle_outline(Rect::new(0, 0, 3, 3));
        assert_eq!(pts.len(), 8);
        assert!(!pts.contains(&Point::new(1, 1)));
    }

    #[test]
    fn single_row_rectangle_outline() {
        assert_eq!(rectangle_outline(Rect::new(2, 5, 4, 1)).len(), 4);
        assert_eq!(rectangle_outline(Rect::new(2, 5, 1, 1)), vec![Point::new(2, 5)]);
    }

    #[test]
    fn filled_rectangle_covers_area_in_any_quadrant() {
        let pts = shape_points(ShapeKind::Rectangle, ShapeFillMode::Filled, Point::new(3, 3), Point::new(1, 2));
        assert_eq!(pts.len(), 6);
    }

    #[test]
    fn ellipse_outline_stays_inside_its_box() {
        let r = Rect::new(1, 1, 7, 5);
        let pts = ellipse_outline(r);
        assert!(!pts.is_empty());
        assert!(pts.iter().all(|p| r.contains(*p)));
        // touches all four sides
        assert!(pts.iter().any(|p| p.x == 1));
        assert!(pts.iter().any(|p| p.x == 7));
        assert!(pts.iter().any(|p| p.y == 1));
        assert!(pts.iter().any(|p| p.y == 5));
    }

    #[test]
    fn ellipse_outline_is_symmetric() {
        let r = Rect::new(0, 0, 8, 6);
        let pts = ellipse_outline(r);
        for p in &pts {
            let mirrored = Point::new(r.right() - 1 - (p.x - r.x), p.y);
            assert!(pts.contains(&mirrored), "missing mirror of {:?}", p);
        }
    }

    #[test]
    fn tiny_ellipses_are_single_cells_or_lines() {
        assert_eq!(sorted(ellipse_outline(Rect::new(4, 4, 1, 1))), vec![(4, 4)]);
        assert_eq!(ellipse_outline(Rect::new(0, 0, 5, 1)).len(), 5);
    }

    #[test]
    fn ellipse_fill_contains_outline_and_centre() {
        let r = Rect::new(0, 0, 9, 7);
        let fill = ellipse_fill(r);
        for p in ellipse_outline(r) {
            assert!(fill.contains(&p));
        }
        assert!(fill.contains(&Point::new(4, 3)));
        assert!(!fill.contains(&Point::new(0, 0)));
    }
}
