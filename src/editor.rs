// ============================================================================
// EDITOR STATE - the single owner of buffer, history, selection and tools
// ============================================================================
//
// Hosts drive the engine through this type: pointer events in grid
// coordinates, tool and colour setters, undo/redo, canvas and file commands.
// Every call runs to completion before returning.

use image::RgbaImage;

use crate::canvas::{Color, GridSize, PixelBuffer, Point, TRANSPARENT};
use crate::components::colors::{extract_colors, hex_to_rgba};
use crate::components::history::{Action, HistoryManager};
use crate::components::palette::ColorPalette;
use crate::components::tools::{PointerButton, SelectionMode, Tool, ToolSettings};
use crate::io::{self, ExportError, ImportError};
use crate::ops::brush::{BrushPaint, StrokeState, line_points, stamp_points};
use crate::ops::canvas_ops::{self, CanvasDrag};
use crate::ops::clipboard::{Clipboard, copy_selection, paste_clipboard};
use crate::ops::fill::flood_fill;
use crate::ops::selection::SelectionState;
use crate::ops::shapes::{ShapeFillMode, ShapeKind, shape_points};
use crate::settings::EngineSettings;
use crate::viewport::Viewport;

/// Default cap for `palette`.
pub const MAX_PALETTE_COLORS: usize = 256;

/// Pointer gesture in progress.
#[derive(Clone, Debug, Default)]
enum Gesture {
    #[default]
    Idle,
    Stroke(BrushPaint),
    Line {
        start: Point,
        end: Point,
        color: Color,
    },
    Shape {
        start: Point,
        end: Point,
        color: Color,
    },
    Select,
    CanvasDrag(CanvasDrag),
}

pub struct EditorState {
    buffer: PixelBuffer,
    history: HistoryManager,
    selection: SelectionState,
    stroke: StrokeState,
    gesture: Gesture,
    clipboard: Option<Clipboard>,
    last_pointer: Point,
    pub tools: ToolSettings,
    pub viewport: Viewport,
    settings: EngineSettings,
}

impl Default for EditorState {
    fn default() -> Self {
        Self::with_settings(EngineSettings::default())
    }
}

impl EditorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: EngineSettings) -> Self {
        Self {
            buffer: PixelBuffer::new(settings.default_grid_size()),
            history: HistoryManager::new(settings.max_history_size),
            selection: SelectionState::new(),
            stroke: StrokeState::new(),
            gesture: Gesture::Idle,
            clipboard: None,
            last_pointer: Point::default(),
            tools: ToolSettings::default(),
            viewport: Viewport::default(),
            settings,
        }
    }

    /// Start from an existing buffer with empty history.
    pub fn from_buffer(buffer: PixelBuffer) -> Self {
        let mut state = Self::default();
        state.buffer = buffer;
        state
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn buffer(&self) -> &PixelBuffer {
        &self.buffer
    }

    pub fn grid_size(&self) -> GridSize {
        self.buffer.size()
    }

    pub fn get_color(&self, x: i32, y: i32) -> Color {
        self.buffer.get_color(x, y)
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn clipboard(&self) -> Option<&Clipboard> {
        self.clipboard.as_ref()
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn last_pointer(&self) -> Point {
        self.last_pointer
    }

    /// Record the pointer position without pressing (paste centres on it).
    pub fn set_pointer(&mut self, p: Point) {
        self.last_pointer = p;
    }

    pub fn screen_to_grid(&self, screen_x: f32, screen_y: f32) -> Point {
        self.viewport.screen_to_grid(screen_x, screen_y)
    }

    /// Cells the pending line or shape would cover, for live feedback.
    pub fn shape_preview(&self) -> Vec<Point> {
        match self.gesture {
            Gesture::Line { start, end, .. } => line_points(start, end),
            Gesture::Shape { start, end, .. } => {
                shape_points(self.tools.shape_kind, self.tools.shape_fill, start, end)
            }
            _ => Vec::new(),
        }
    }

    // ========================================================================
    // TOOL SETTINGS
    // ========================================================================

    /// Switch tools. Leaving the Select tool commits its preview.
    pub fn set_tool(&mut self, tool: Tool) {
        if tool == self.tools.tool {
            return;
        }
        self.pointer_up();
        if self.tools.tool == Tool::Select {
            self.apply_selection_action();
        }
        self.tools.tool = tool;
    }

    pub fn set_primary_color(&mut self, color: Color) {
        self.tools.primary_color = color;
    }

    pub fn set_secondary_color(&mut self, color: Color) {
        self.tools.secondary_color = color;
    }

    /// Set a colour from `#rrggbb`; returns `false` on malformed input.
    pub fn set_color_hex(&mut self, button: PointerButton, hex: &str) -> bool {
        let Some(color) = hex_to_rgba(hex) else { return false };
        match button {
            PointerButton::Primary => self.tools.primary_color = color,
            PointerButton::Secondary => self.tools.secondary_color = color,
        }
        true
    }

    pub fn set_brush_size(&mut self, size: u32) {
        self.tools.set_brush_size(size);
    }

    pub fn set_selection_mode(&mut self, mode: SelectionMode) {
        self.tools.selection_mode = mode;
    }

    pub fn set_shape(&mut self, kind: ShapeKind, filled: bool) {
        self.tools.shape_kind = kind;
        self.tools.shape_fill = ShapeFillMode::from_fill(filled);
    }

    pub fn set_shade_strength(&mut self, strength: u8) {
        self.tools.set_shade_strength(strength);
    }

    // ========================================================================
    // POINTER DISPATCH
    // ========================================================================

    /// Press at grid cell `p` with the active tool.
    pub fn pointer_down(&mut self, p: Point, button: PointerButton) {
        self.last_pointer = p;
        if !matches!(self.gesture, Gesture::Idle) {
            self.pointer_up();
        }
        let color = self.tools.color_for(button);
        match self.tools.tool {
            Tool::Pencil => self.begin_stroke(p, BrushPaint::Solid(color)),
            Tool::Eraser => self.begin_stroke(p, BrushPaint::Solid(TRANSPARENT)),
            Tool::Shade => {
                let paint = BrushPaint::Shade {
                    strength: self.tools.shade_strength,
                    darken: self.tools.shade_darkens(button),
                };
                self.begin_stroke(p, paint);
            }
            Tool::ColorPicker => {
                self.pick_color(p, button);
            }
            Tool::Bucket => {
                self.flood_fill(p, color);
            }
            Tool::Line => self.gesture = Gesture::Line { start: p, end: p, color },
            Tool::Shape => self.gesture = Gesture::Shape { start: p, end: p, color },
            Tool::Select => {
                self.select_start(p);
            }
            Tool::Move => {
                self.gesture = Gesture::CanvasDrag(CanvasDrag::begin(&self.buffer, p));
            }
        }
    }

    /// Pointer motion while pressed.
    pub fn pointer_move(&mut self, p: Point) {
        self.last_pointer = p;
        let size = self.tools.brush_size;
        match &mut self.gesture {
            Gesture::Idle => {}
            Gesture::Stroke(paint) => {
                let paint = *paint;
                self.stroke.paint_to(&mut self.buffer, p, size, paint);
            }
            Gesture::Line { end, .. } | Gesture::Shape { end, .. } => *end = p,
            Gesture::Select => self.selection.pointer_move(p, self.buffer.size()),
            Gesture::CanvasDrag(drag) => drag.update(&mut self.buffer, p),
        }
    }

    /// Release: commits whatever the gesture produced.
    pub fn pointer_up(&mut self) {
        match std::mem::take(&mut self.gesture) {
            Gesture::Idle => {}
            Gesture::Stroke(_) => {
                self.end_stroke();
            }
            Gesture::Line { start, end, color } => {
                self.draw_line(start, end, color);
            }
            Gesture::Shape { start, end, color } => {
                let (kind, fill) = (self.tools.shape_kind, self.tools.shape_fill);
                self.draw_shape(start, end, kind, fill, color);
            }
            Gesture::Select => {
                self.selection.pointer_up();
            }
            Gesture::CanvasDrag(drag) => {
                if let Some(action) = drag.finish(&self.buffer) {
                    self.commit(action);
                }
            }
        }
    }

    // ========================================================================
    // DRAWING
    // ========================================================================

    fn begin_stroke(&mut self, p: Point, paint: BrushPaint) {
        self.gesture = Gesture::Stroke(paint);
        self.stroke.paint_to(&mut self.buffer, p, self.tools.brush_size, paint);
    }

    /// Paint `color` at `p`, continuing the current stroke.
    pub fn draw(&mut self, p: Point, color: Color) {
        self.last_pointer = p;
        self.stroke
            .paint_to(&mut self.buffer, p, self.tools.brush_size, BrushPaint::Solid(color));
    }

    /// Erase at `p`, continuing the current stroke.
    pub fn erase(&mut self, p: Point) {
        self.draw(p, TRANSPARENT);
    }

    /// Close the current stroke as one history entry.
    pub fn end_stroke(&mut self) -> bool {
        match self.stroke.finish() {
            Some(action) => {
                self.commit(action);
                true
            }
            None => false,
        }
    }

    /// Bucket fill. Returns `false` when nothing changed.
    pub fn flood_fill(&mut self, p: Point, color: Color) -> bool {
        self.last_pointer = p;
        let Some(prev) = flood_fill(&mut self.buffer, p, color) else {
            return false;
        };
        self.commit(Action::Bucket {
            x: p.x,
            y: p.y,
            color,
            prev_pixel_data: prev,
        });
        true
    }

    /// Copy the colour under `p` into the button's colour slot.
    pub fn pick_color(&mut self, p: Point, button: PointerButton) -> Option<Color> {
        if !self.buffer.is_in_bounds(p.x, p.y) {
            return None;
        }
        let color = self.buffer.get_color(p.x, p.y);
        match button {
            PointerButton::Primary => self.tools.primary_color = color,
            PointerButton::Secondary => self.tools.secondary_color = color,
        }
        Some(color)
    }

    pub fn draw_line(&mut self, start: Point, end: Point, color: Color) -> bool {
        let points = line_points(start, end);
        self.stamp_and_commit(&points, BrushPaint::Solid(color))
    }

    pub fn draw_shape(&mut self, start: Point, end: Point, kind: ShapeKind, fill: ShapeFillMode, color: Color) -> bool {
        let points = shape_points(kind, fill, start, end);
        self.stamp_and_commit(&points, BrushPaint::Solid(color))
    }

    fn stamp_and_commit(&mut self, points: &[Point], paint: BrushPaint) -> bool {
        match stamp_points(&mut self.buffer, points, self.tools.brush_size, paint) {
            Some(action) => {
                self.commit(action);
                true
            }
            None => false,
        }
    }

    // ========================================================================
    // SELECTION / CLIPBOARD
    // ========================================================================

    /// Begin a select, move or resize gesture at `p`.
    pub fn select_start(&mut self, p: Point) {
        self.last_pointer = p;
        let mode = self.tools.selection_mode;
        if let Some(action) = self.selection.pointer_down(&mut self.buffer, p, mode) {
            self.commit(action);
        }
        self.gesture = Gesture::Select;
    }

    pub fn select_move(&mut self, p: Point) {
        self.last_pointer = p;
        self.selection.pointer_move(p, self.buffer.size());
    }

    pub fn select_end(&mut self) -> bool {
        self.gesture = Gesture::Idle;
        self.selection.pointer_up()
    }

    pub fn select_all(&mut self) {
        self.apply_selection_action();
        self.selection.select_all(self.buffer.size());
    }

    /// Commit a pending move/resize/paste. Always leaves the selection idle.
    pub fn apply_selection_action(&mut self) -> bool {
        match self.selection.apply(&mut self.buffer) {
            Some(action) => {
                self.commit(action);
                true
            }
            None => false,
        }
    }

    /// Drop the selection without committing anything.
    pub fn cancel_selection(&mut self) {
        self.selection.reset();
    }

    pub fn copy(&mut self) -> bool {
        match copy_selection(&self.selection, &self.buffer) {
            Some(clip) => {
                self.clipboard = Some(clip);
                true
            }
            None => false,
        }
    }

    /// Paste the clipboard centred on the last pointer position.
    pub fn paste(&mut self) -> bool {
        let Some(clip) = self.clipboard.as_ref() else { return false };
        if clip.width == 0 || clip.height == 0 {
            return false;
        }
        if let Some(action) = paste_clipboard(&mut self.selection, &mut self.buffer, clip, self.last_pointer) {
            self.commit(action);
        }
        true
    }

    pub fn delete_selection(&mut self) -> bool {
        match self.selection.delete(&mut self.buffer) {
            Some(action) => {
                self.commit(action);
                true
            }
            None => false,
        }
    }

    // ========================================================================
    // HISTORY
    // ========================================================================

    /// Record `action`. A stroke still open from direct `draw`/`erase` calls
    /// is closed first so it lands below the edit that followed it.
    fn commit(&mut self, action: Action) {
        if let Some(pending) = self.stroke.finish() {
            crate::log_debug!("commit: {}", pending.description());
            self.history.push(pending);
        }
        crate::log_debug!("commit: {}", action.description());
        self.history.push(action);
    }

    /// Drop transient gesture state before a history jump. An uncommitted
    /// stroke or canvas drag is rolled back so the buffer matches the top
    /// of the undo stack.
    fn reset_transient(&mut self) {
        if let Gesture::CanvasDrag(drag) = std::mem::take(&mut self.gesture) {
            drag.cancel(&mut self.buffer);
        }
        self.stroke.revert(&mut self.buffer);
        self.selection.reset();
    }

    pub fn undo(&mut self) -> Option<String> {
        self.reset_transient();
        self.history.undo(&mut self.buffer)
    }

    pub fn redo(&mut self) -> Option<String> {
        self.reset_transient();
        self.history.redo(&mut self.buffer)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // ========================================================================
    // CANVAS
    // ========================================================================

    fn clamp_size(&self, size: GridSize) -> GridSize {
        size.clamped(self.settings.max_grid_size)
    }

    fn replace(&mut self, next: PixelBuffer) {
        self.reset_transient();
        let action = canvas_ops::replace_canvas(&mut self.buffer, next);
        self.commit(action);
    }

    pub fn new_canvas(&mut self, size: GridSize) {
        self.reset_transient();
        let size = self.clamp_size(size);
        let action = canvas_ops::new_canvas(&mut self.buffer, size);
        self.commit(action);
    }

    pub fn clear_canvas(&mut self) -> bool {
        self.reset_transient();
        match canvas_ops::clear_canvas(&mut self.buffer) {
            Some(action) => {
                self.commit(action);
                true
            }
            None => false,
        }
    }

    pub fn resize_canvas(&mut self, size: GridSize, anchor: (u32, u32)) -> bool {
        self.reset_transient();
        let size = self.clamp_size(size);
        match canvas_ops::resize_canvas(&mut self.buffer, size, anchor) {
            Some(action) => {
                self.commit(action);
                true
            }
            None => false,
        }
    }

    // ========================================================================
    // IMPORT / EXPORT
    // ========================================================================

    /// Load project JSON. On error nothing changes.
    pub fn import_pxsm(&mut self, json: &str) -> Result<(), ImportError> {
        let next = io::parse_pxsm(json, self.settings.max_grid_size).inspect_err(|e| {
            crate::log_warn!("project import rejected: {}", e);
        })?;
        crate::log_info!("imported project {}×{}", next.width(), next.height());
        self.replace(next);
        Ok(())
    }

    pub fn export_pxsm(&self) -> Result<String, ExportError> {
        io::to_pxsm_string(&self.buffer)
    }

    /// Decode a raster image into the grid. On error nothing changes.
    pub fn import_image(&mut self, bytes: &[u8]) -> Result<(), ImportError> {
        let next = io::decode_image(bytes, self.settings.max_grid_size).inspect_err(|e| {
            crate::log_warn!("image import rejected: {}", e);
        })?;
        crate::log_info!("imported image {}×{}", next.width(), next.height());
        self.replace(next);
        Ok(())
    }

    pub fn export_image(&self, scale: f32) -> Result<RgbaImage, ExportError> {
        io::render_scaled(&self.buffer, scale, self.settings.max_export_size)
    }

    pub fn export_png(&self, scale: f32) -> Result<Vec<u8>, ExportError> {
        io::encode_png(&self.export_image(scale)?)
    }

    /// Colours in use, most frequent first.
    pub fn palette(&self, max_colors: usize) -> Vec<Color> {
        extract_colors(&self.buffer, max_colors)
    }

    /// Colours in use as GIMP palette text.
    pub fn export_gpl(&self, name: &str) -> String {
        ColorPalette::from_buffer(name, &self.buffer, MAX_PALETTE_COLORS).to_gpl()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use pretty_assertions::assert_eq;

    const BLACK: Color = Rgba([0, 0, 0, 255]);
    const RED: Color = Rgba([255, 0, 0, 255]);

    fn small() -> EditorState {
        EditorState::from_buffer(PixelBuffer::new(GridSize::new(4, 4)))
    }

    #[test]
    fn pencil_stroke_is_one_action() {
        let mut ed = small();
        ed.pointer_down(Point::new(0, 0), PointerButton::Primary);
        ed.pointer_move(Point::new(3, 0));
        ed.pointer_up();
        assert_eq!(ed.history().undo_count(), 1);
        assert_eq!(ed.get_color(2, 0), BLACK);
    }

    #[test]
    fn secondary_button_uses_secondary_colour() {
        let mut ed = small();
        ed.set_secondary_color(RED);
        ed.pointer_down(Point::new(1, 1), PointerButton::Secondary);
        ed.pointer_up();
        assert_eq!(ed.get_color(1, 1), RED);
    }

    #[test]
    fn line_tool_commits_on_release() {
        let mut ed = small();
        ed.set_tool(Tool::Line);
        ed.pointer_down(Point::new(0, 0), PointerButton::Primary);
        ed.pointer_move(Point::new(3, 3));
        assert_eq!(ed.shape_preview().len(), 4);
        assert_eq!(ed.get_color(1, 1), TRANSPARENT);
        ed.pointer_up();
        assert_eq!(ed.get_color(1, 1), BLACK);
        assert_eq!(ed.history().undo_count(), 1);
    }

    #[test]
    fn color_picker_reads_cell() {
        let mut ed = small();
        ed.draw(Point::new(2, 2), RED);
        ed.end_stroke();
        ed.set_tool(Tool::ColorPicker);
        ed.pointer_down(Point::new(2, 2), PointerButton::Secondary);
        ed.pointer_up();
        assert_eq!(ed.tools.secondary_color, RED);
        assert_eq!(ed.history().undo_count(), 1);
    }

    #[test]
    fn undo_mid_stroke_reverts_uncommitted_cells() {
        let mut ed = small();
        ed.draw(Point::new(0, 0), RED);
        ed.end_stroke();
        ed.pointer_down(Point::new(3, 3), PointerButton::Primary);
        assert_eq!(ed.get_color(3, 3), BLACK);
        ed.undo();
        assert_eq!(ed.get_color(3, 3), TRANSPARENT);
        assert_eq!(ed.get_color(0, 0), TRANSPARENT);
        assert!(ed.can_redo());
    }

    #[test]
    fn move_tool_shifts_whole_canvas() {
        let mut ed = small();
        ed.draw(Point::new(0, 0), RED);
        ed.end_stroke();
        ed.set_tool(Tool::Move);
        ed.pointer_down(Point::new(1, 1), PointerButton::Primary);
        ed.pointer_move(Point::new(2, 3));
        ed.pointer_up();
        assert_eq!(ed.get_color(1, 2), RED);
        assert_eq!(ed.get_color(0, 0), TRANSPARENT);
        ed.undo();
        assert_eq!(ed.get_color(0, 0), RED);
    }

    #[test]
    fn resize_is_clamped_to_settings() {
        let mut ed = small();
        assert!(ed.resize_canvas(GridSize::new(0, 9999), (0, 0)));
        assert_eq!(ed.grid_size(), GridSize::new(1, 256));
        ed.undo();
        assert_eq!(ed.grid_size(), GridSize::new(4, 4));
    }

    #[test]
    fn leaving_select_tool_commits_preview() {
        let mut ed = small();
        ed.draw(Point::new(0, 0), RED);
        ed.end_stroke();
        ed.set_tool(Tool::Select);
        ed.pointer_down(Point::new(0, 0), PointerButton::Primary);
        ed.pointer_move(Point::new(1, 0));
        ed.pointer_up();
        ed.pointer_down(Point::new(0, 0), PointerButton::Primary);
        ed.pointer_move(Point::new(0, 2));
        ed.pointer_up();
        ed.set_tool(Tool::Pencil);
        assert_eq!(ed.get_color(0, 2), RED);
        assert_eq!(ed.get_color(0, 0), TRANSPARENT);
        assert_eq!(ed.history().undo_count(), 2);
    }

    #[test]
    fn hex_setter_rejects_garbage() {
        let mut ed = small();
        assert!(ed.set_color_hex(PointerButton::Primary, "#ff0000"));
        assert_eq!(ed.tools.primary_color, RED);
        assert!(!ed.set_color_hex(PointerButton::Primary, "red"));
        assert_eq!(ed.tools.primary_color, RED);
    }

    #[test]
    fn canvas_palette_exports_as_gpl() {
        let mut ed = small();
        ed.draw(Point::new(0, 0), RED);
        ed.end_stroke();
        assert_eq!(ed.export_gpl("Sprite"), "GIMP Palette\nName: Sprite\n#\n255 0 0");
    }

    #[test]
    fn open_stroke_is_recorded_before_a_fill() {
        let mut ed = EditorState::from_buffer(PixelBuffer::new(GridSize::new(3, 1)));
        let before = ed.buffer().clone();
        ed.draw(Point::new(0, 0), RED);
        assert!(ed.flood_fill(Point::new(2, 0), BLACK));
        assert!(!ed.end_stroke());
        assert_eq!(ed.history().undo_count(), 2);
        assert!(matches!(ed.history().undo_actions().nth(1), Some(Action::Draw { .. })));
        while ed.undo().is_some() {}
        assert_eq!(ed.buffer(), &before);
    }

    #[test]
    fn empty_clipboard_does_not_paste() {
        let mut ed = small();
        ed.clipboard = Some(Clipboard {
            pixels: Vec::new(),
            width: 0,
            height: 0,
            mask: None,
        });
        assert!(!ed.paste());
        assert!(ed.selection().is_idle());
    }
}
