use image::{Rgba, RgbaImage};

/// An RGBA colour. Channels are plain bytes, so they are always within 0..=255.
pub type Color = Rgba<u8>;

/// Fully transparent black, used by the eraser and for cleared cells.
pub const TRANSPARENT: Color = Rgba([0, 0, 0, 0]);

pub const DEFAULT_GRID_SIZE: GridSize = GridSize { x: 32, y: 32 };
pub const MIN_GRID_SIZE: u32 = 1;
pub const MAX_GRID_SIZE: u32 = 256;

// ============================================================================
// GRID COORDINATES
// ============================================================================

/// Dimensions of the pixel grid, in cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GridSize {
    pub x: u32,
    pub y: u32,
}

impl GridSize {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Clamp both axes into `[MIN_GRID_SIZE, max]`.
    pub fn clamped(self, max: u32) -> Self {
        let max = max.max(MIN_GRID_SIZE);
        Self {
            x: self.x.clamp(MIN_GRID_SIZE, max),
            y: self.y.clamp(MIN_GRID_SIZE, max),
        }
    }

    pub fn cell_count(&self) -> usize {
        self.x as usize * self.y as usize
    }
}

/// A grid cell. Signed because pointer input can land outside the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// `true` when `(x, y)` addresses a cell of a grid of `size`.
#[inline]
pub fn is_in_bounds(x: i32, y: i32, size: GridSize) -> bool {
    x >= 0 && y >= 0 && (x as i64) < size.x as i64 && (y as i64) < size.y as i64
}

/// Axis-aligned rectangle in grid coordinates. `width`/`height` are signed so
/// in-progress resize math can go through zero before it is clamped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// The rectangle covering the whole grid.
    pub fn of_grid(size: GridSize) -> Self {
        Self::new(0, 0, size.x as i32, size.y as i32)
    }

    /// Smallest rectangle containing both cells, whichever quadrant `b` is in.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (b.x - a.x).abs() + 1,
            height: (b.y - a.y).abs() + 1,
        }
    }

    #[inline]
    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Number of cells covered (0 for degenerate rectangles).
    pub fn area(&self) -> usize {
        if self.width <= 0 || self.height <= 0 {
            0
        } else {
            self.width as usize * self.height as usize
        }
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }

    /// Row-major iterator over every cell of the rectangle.
    pub fn cells(&self) -> impl Iterator<Item = Point> + '_ {
        let (x0, w) = (self.x, self.width.max(0));
        (self.y..self.y + self.height.max(0))
            .flat_map(move |y| (x0..x0 + w).map(move |x| Point::new(x, y)))
    }
}

// ============================================================================
// SELECTION MASK
// ============================================================================

/// Per-cell inclusion bitmap over a rectangle's local coordinates.
/// One byte per cell, 1 = included.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectionMask {
    pub width: u32,
    pub height: u32,
    bits: Vec<u8>,
}

impl SelectionMask {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            bits: vec![0; width as usize * height as usize],
        }
    }

    pub fn from_bits(width: u32, height: u32, bits: Vec<u8>) -> Option<Self> {
        (bits.len() == width as usize * height as usize).then_some(Self { width, height, bits })
    }

    /// Whether local cell `(x, y)` is included. Out-of-range cells are not.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        self.bits[y as usize * self.width as usize + x as usize] != 0
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, included: bool) {
        if x < self.width && y < self.height {
            self.bits[y as usize * self.width as usize + x as usize] = included as u8;
        }
    }

    /// Mask value at a flat row-major index (used when walking a source rect).
    #[inline]
    pub fn get_index(&self, idx: usize) -> bool {
        self.bits.get(idx).is_some_and(|b| *b != 0)
    }

    pub fn bits(&self) -> &[u8] {
        &self.bits
    }

    pub fn count(&self) -> usize {
        self.bits.iter().filter(|b| **b != 0).count()
    }
}

// ============================================================================
// PIXEL BUFFER
// ============================================================================

/// The W×H RGBA byte grid. Row-major, 4 bytes per cell.
///
/// `pixels.len() == width * height * 4` holds at all times; changing the
/// dimensions always goes through a fresh buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl PixelBuffer {
    /// A zero-filled (fully transparent) buffer.
    pub fn new(size: GridSize) -> Self {
        Self {
            width: size.x,
            height: size.y,
            pixels: vec![0; size.cell_count() * 4],
        }
    }

    /// Wrap raw RGBA bytes. Returns `None` when the length does not match.
    pub fn from_raw(size: GridSize, pixels: Vec<u8>) -> Option<Self> {
        if pixels.len() != size.cell_count() * 4 {
            return None;
        }
        Some(Self {
            width: size.x,
            height: size.y,
            pixels,
        })
    }

    pub fn from_rgba_image(img: &RgbaImage) -> Self {
        Self {
            width: img.width(),
            height: img.height(),
            pixels: img.as_raw().clone(),
        }
    }

    pub fn to_rgba_image(&self) -> RgbaImage {
        // Length invariant guarantees from_raw succeeds.
        RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
            .unwrap_or_else(|| RgbaImage::new(self.width, self.height))
    }

    pub fn size(&self) -> GridSize {
        GridSize::new(self.width, self.height)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_raw(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.pixels
    }

    #[inline]
    fn base_index(&self, x: i32, y: i32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }

    #[inline]
    pub fn is_in_bounds(&self, x: i32, y: i32) -> bool {
        is_in_bounds(x, y, self.size())
    }

    /// Colour at `(x, y)`; transparent when out of bounds.
    #[inline]
    pub fn get_color(&self, x: i32, y: i32) -> Color {
        if !self.is_in_bounds(x, y) {
            return TRANSPARENT;
        }
        let i = self.base_index(x, y);
        Rgba([self.pixels[i], self.pixels[i + 1], self.pixels[i + 2], self.pixels[i + 3]])
    }

    /// Write `(x, y)`. Out-of-bounds writes are ignored.
    #[inline]
    pub fn set_color(&mut self, x: i32, y: i32, color: Color) {
        if !self.is_in_bounds(x, y) {
            return;
        }
        let i = self.base_index(x, y);
        self.pixels[i..i + 4].copy_from_slice(&color.0);
    }

    /// Overwrite every cell with `color`.
    pub fn fill(&mut self, color: Color) {
        for px in self.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&color.0);
        }
    }

    /// Approximate heap footprint, for history accounting.
    pub fn memory_bytes(&self) -> usize {
        self.pixels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_buffer_is_transparent_and_sized() {
        let buf = PixelBuffer::new(GridSize::new(3, 2));
        assert_eq!(buf.as_raw().len(), 3 * 2 * 4);
        assert_eq!(buf.get_color(2, 1), TRANSPARENT);
    }

    #[test]
    fn out_of_bounds_access_is_silent() {
        let mut buf = PixelBuffer::new(GridSize::new(2, 2));
        buf.set_color(-1, 0, Rgba([1, 2, 3, 4]));
        buf.set_color(2, 0, Rgba([1, 2, 3, 4]));
        assert!(buf.as_raw().iter().all(|b| *b == 0));
        assert_eq!(buf.get_color(5, 5), TRANSPARENT);
    }

    #[test]
    fn set_then_get_round_trips() {
        let mut buf = PixelBuffer::new(GridSize::new(4, 4));
        buf.set_color(3, 2, Rgba([10, 20, 30, 255]));
        assert_eq!(buf.get_color(3, 2), Rgba([10, 20, 30, 255]));
        assert_eq!(&buf.as_raw()[(2 * 4 + 3) * 4..(2 * 4 + 3) * 4 + 4], &[10, 20, 30, 255]);
    }

    #[test]
    fn from_raw_rejects_wrong_length() {
        assert!(PixelBuffer::from_raw(GridSize::new(2, 2), vec![0; 15]).is_none());
        assert!(PixelBuffer::from_raw(GridSize::new(2, 2), vec![0; 16]).is_some());
    }

    #[test]
    fn rect_from_corners_normalizes_any_quadrant() {
        let r = Rect::from_corners(Point::new(5, 1), Point::new(2, 4));
        assert_eq!(r, Rect::new(2, 1, 4, 4));
        assert_eq!(r.cells().count(), 16);
        assert!(r.contains(Point::new(5, 4)));
        assert!(!r.contains(Point::new(6, 4)));
    }

    #[test]
    fn grid_size_clamps_to_limits() {
        assert_eq!(GridSize::new(0, 900).clamped(256), GridSize::new(1, 256));
    }
}
