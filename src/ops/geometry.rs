// ============================================================================
// GEOMETRY - line interpolation and polygon hit-testing on the cell grid
// ============================================================================

use crate::canvas::Point;

/// Integer Bresenham walk from `from` to `to`.
///
/// The start cell is excluded and the end cell included, so consecutive
/// segments of a polyline can be chained without repeating their joints.
pub fn interpolate_between_points(from: Point, to: Point) -> Vec<Point> {
    let mut points = Vec::new();
    let (mut x, mut y) = (from.x, from.y);
    let dx = (to.x - x).abs();
    let dy = -(to.y - y).abs();
    let sx = if x < to.x { 1 } else { -1 };
    let sy = if y < to.y { 1 } else { -1 };
    let mut err = dx + dy;

    while x != to.x || y != to.y {
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
        points.push(Point::new(x, y));
    }
    points
}

/// Even-odd ray-casting test of `p` against the closed polygon `vertices`.
/// A point that coincides with a vertex is always inside.
pub fn is_point_in_polygon(p: Point, vertices: &[Point]) -> bool {
    if vertices.iter().any(|v| *v == p) {
        return true;
    }
    if vertices.len() < 3 {
        return false;
    }

    let (px, py) = (p.x as f64, p.y as f64);
    let mut inside = false;
    let mut j = vertices.len() - 1;
    for i in 0..vertices.len() {
        let (xi, yi) = (vertices[i].x as f64, vertices[i].y as f64);
        let (xj, yj) = (vertices[j].x as f64, vertices[j].y as f64);
        if (yi > py) != (yj > py) && px < (xj - xi) * (py - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// `true` when two cells are at most one step apart on both axes.
pub fn are_adjacent(a: Point, b: Point) -> bool {
    (a.x - b.x).abs() < 2 && (a.y - b.y).abs() < 2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_excludes_start_includes_end() {
        let pts = interpolate_between_points(Point::new(0, 0), Point::new(3, 0));
        assert_eq!(pts, vec![Point::new(1, 0), Point::new(2, 0), Point::new(3, 0)]);
    }

    #[test]
    fn line_to_self_is_empty() {
        assert!(interpolate_between_points(Point::new(2, 2), Point::new(2, 2)).is_empty());
    }

    #[test]
    fn diagonal_line_has_no_gaps() {
        let pts = interpolate_between_points(Point::new(4, 4), Point::new(0, 1));
        assert_eq!(*pts.last().unwrap(), Point::new(0, 1));
        let mut prev = Point::new(4, 4);
        for p in pts {
            assert!(are_adjacent(prev, p));
            prev = p;
        }
    }

    #[test]
    fn polygon_contains_interior_and_vertices() {
        let square = [Point::new(0, 0), Point::new(4, 0), Point::new(4, 4), Point::new(0, 4)];
        assert!(is_point_in_polygon(Point::new(2, 2), &square));
        assert!(is_point_in_polygon(Point::new(4, 4), &square));
        assert!(!is_point_in_polygon(Point::new(5, 2), &square));
    }

    #[test]
    fn degenerate_polygon_only_matches_its_vertices() {
        let seg = [Point::new(0, 0), Point::new(3, 0)];
        assert!(is_point_in_polygon(Point::new(3, 0), &seg));
        assert!(!is_point_in_polygon(Point::new(1, 0), &seg));
    }
}
