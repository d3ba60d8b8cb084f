// ============================================================================
// CLIPBOARD OPERATIONS - copy the selection, paste as a movable overlay
// ============================================================================

use crate::canvas::{Color, PixelBuffer, Point, Rect, SelectionMask};
use crate::components::history::Action;
use crate::ops::selection::SelectionState;

/// Single-slot clipboard owned by the editor. Overwritten on each copy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Clipboard {
    pub pixels: Vec<Color>,
    pub width: u32,
    pub height: u32,
    pub mask: Option<SelectionMask>,
}

impl Clipboard {
    /// Rectangle of clipboard size centred on `pointer`.
    pub fn area_centered_on(&self, pointer: Point) -> Rect {
        let (w, h) = (self.width as i32, self.height as i32);
        Rect::new(pointer.x - w / 2, pointer.y - h / 2, w, h)
    }
}

/// Snapshot the effective selection (content and mask resampled to the
/// effective size). `None` when nothing is selected.
pub fn copy_selection(selection: &SelectionState, buffer: &PixelBuffer) -> Option<Clipboard> {
    if !selection.show_preview {
        return None;
    }
    let (rect, pixels, mask) = selection.effective_content(buffer)?;
    crate::log_debug!("copied {}×{} selection", rect.width, rect.height);
    Some(Clipboard {
        pixels,
        width: rect.width as u32,
        height: rect.height as u32,
        mask,
    })
}

/// Start pasting `clipboard` centred on `pointer`. An active preview is
/// committed first and its action returned so the caller can record it.
pub fn paste_clipboard(
    selection: &mut SelectionState,
    buffer: &mut PixelBuffer,
    clipboard: &Clipboard,
    pointer: Point,
) -> Option<Action> {
    if clipboard.width == 0 || clipboard.height == 0 {
        return None;
    }
    let committed = if selection.has_preview() {
        selection.apply(buffer)
    } else {
        selection.reset();
        None
    };
    selection.start_paste(
        clipboard.area_centered_on(pointer),
        clipboard.pixels.clone(),
        clipboard.mask.clone(),
    );
    committed
}
