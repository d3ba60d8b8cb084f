use crate::canvas::{GridSize, Point};

/// On-screen size of one cell at zoom 1.0, in screen pixels.
pub const BASE_PX_SIZE: f32 = 16.0;
pub const MIN_ZOOM_LEVEL: f32 = 0.25;
pub const MAX_ZOOM_LEVEL: f32 = 8.0;
/// Multiplier applied per zoom step.
pub const ZOOM_FACTOR: f32 = 1.25;

/// Pan and zoom shared by every tool for pointer-to-cell mapping.
/// `pan_offset` is the grid coordinate shown at the screen origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub pan_offset: (f32, f32),
    pub zoom_level: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            pan_offset: (0.0, 0.0),
            zoom_level: 1.0,
        }
    }
}

impl Viewport {
    /// Screen pixels per cell at the current zoom.
    pub fn px_size(&self) -> f32 {
        BASE_PX_SIZE * self.zoom_level
    }

    /// The one mapping from screen space to grid cells used by all tools.
    pub fn screen_to_grid(&self, screen_x: f32, screen_y: f32) -> Point {
        let px = self.px_size();
        Point::new(
            (screen_x / px + self.pan_offset.0).floor() as i32,
            (screen_y / px + self.pan_offset.1).floor() as i32,
        )
    }

    /// Top-left screen position of a cell.
    pub fn grid_to_screen(&self, p: Point) -> (f32, f32) {
        let px = self.px_size();
        ((p.x as f32 - self.pan_offset.0) * px, (p.y as f32 - self.pan_offset.1) * px)
    }

    pub fn set_zoom_level(&mut self, zoom: f32) {
        self.zoom_level = zoom.clamp(MIN_ZOOM_LEVEL, MAX_ZOOM_LEVEL);
    }

    /// Zoom to `zoom` keeping the cell under `(screen_x, screen_y)` fixed,
    /// then clamp the pan so the grid stays inside a `view` sized container.
    pub fn zoom_towards(&mut self, screen_x: f32, screen_y: f32, zoom: f32, grid: GridSize, view: (f32, f32)) {
        let world_x = screen_x / self.px_size() + self.pan_offset.0;
        let world_y = screen_y / self.px_size() + self.pan_offset.1;
        self.set_zoom_level(zoom);
        let px = self.px_size();
        self.pan_offset = (world_x - screen_x / px, world_y - screen_y / px);
        self.clamp_pan(grid, view);
    }

    /// One zoom step in or out around a screen point.
    pub fn zoom_step(&mut self, screen_x: f32, screen_y: f32, zoom_in: bool, grid: GridSize, view: (f32, f32)) {
        let zoom = if zoom_in {
            self.zoom_level * ZOOM_FACTOR
        } else {
            self.zoom_level / ZOOM_FACTOR
        };
        self.zoom_towards(screen_x, screen_y, zoom, grid, view);
    }

    /// Keep the pan within `[0, grid - visible]` on each axis.
    pub fn clamp_pan(&mut self, grid: GridSize, view: (f32, f32)) {
        let px = self.px_size();
        let visible_x = (grid.x as f32).min(view.0 / px);
        let visible_y = (grid.y as f32).min(view.1 / px);
        let max_x = (grid.x as f32 - visible_x).max(0.0);
        let max_y = (grid.y as f32 - visible_y).max(0.0);
        self.pan_offset = (self.pan_offset.0.clamp(0.0, max_x), self.pan_offset.1.clamp(0.0, max_y));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn screen_to_grid_floors() {
        let mut vp = Viewport::default();
        assert_eq!(vp.screen_to_grid(15.9, 16.0), Point::new(0, 1));
        assert_eq!(vp.screen_to_grid(-0.1, 0.0), Point::new(-1, 0));
        vp.set_zoom_level(2.0);
        vp.pan_offset = (3.0, 0.5);
        assert_eq!(vp.screen_to_grid(32.0, 0.0), Point::new(4, 0));
    }

    #[test]
    fn zoom_is_clamped() {
        let mut vp = Viewport::default();
        vp.set_zoom_level(100.0);
        assert_eq!(vp.zoom_level, MAX_ZOOM_LEVEL);
        vp.set_zoom_level(0.0);
        assert_eq!(vp.zoom_level, MIN_ZOOM_LEVEL);
    }

    #[test]
    fn zoom_towards_keeps_cursor_cell() {
        let mut vp = Viewport::default();
        let grid = GridSize::new(64, 64);
        let before = vp.screen_to_grid(100.0, 100.0);
        vp.zoom_towards(100.0, 100.0, 2.0, grid, (256.0, 256.0));
        assert_eq!(vp.screen_to_grid(100.0, 100.0), before);
    }
}
