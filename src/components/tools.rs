use image::Rgba;

use crate::canvas::Color;
use crate::ops::shapes::{ShapeFillMode, ShapeKind};

/// Editing tools the engine knows how to drive from pointer input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Tool {
    #[default]
    Pencil,
    Eraser,
    ColorPicker,
    Bucket,
    Line,
    Shape,
    Shade,
    Select,
    Move,
}

impl Tool {
    pub fn label(&self) -> &'static str {
        match self {
            Tool::Pencil => "Pencil",
            Tool::Eraser => "Eraser",
            Tool::ColorPicker => "Color Picker",
            Tool::Bucket => "Bucket",
            Tool::Line => "Line",
            Tool::Shape => "Shape",
            Tool::Shade => "Shade",
            Tool::Select => "Select",
            Tool::Move => "Move",
        }
    }

    /// Single-key shortcut used by the editor front-end.
    pub fn shortcut(&self) -> char {
        match self {
            Tool::Pencil => 'p',
            Tool::Eraser => 'e',
            Tool::ColorPicker => 'c',
            Tool::Bucket => 'b',
            Tool::Line => 'l',
            Tool::Shape => 'h',
            Tool::Shade => 'd',
            Tool::Select => 's',
            Tool::Move => 'm',
        }
    }

    pub fn from_shortcut(key: char) -> Option<Tool> {
        let key = key.to_ascii_lowercase();
        Tool::all().iter().copied().find(|t| t.shortcut() == key)
    }

    pub fn all() -> &'static [Tool] {
        &[
            Tool::Pencil,
            Tool::Eraser,
            Tool::ColorPicker,
            Tool::Bucket,
            Tool::Line,
            Tool::Shape,
            Tool::Shade,
            Tool::Select,
            Tool::Move,
        ]
    }
}

/// Which pointer button started the gesture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PointerButton {
    #[default]
    Primary,
    Secondary,
}

/// How the Select tool builds a new selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SelectionMode {
    #[default]
    Rectangular,
    Lasso,
    Wand,
}

impl SelectionMode {
    pub fn label(&self) -> &'static str {
        match self {
            SelectionMode::Rectangular => "Rectangular",
            SelectionMode::Lasso => "Lasso",
            SelectionMode::Wand => "Wand",
        }
    }
}

/// Tool options shared by every tool.
#[derive(Clone, Debug, PartialEq)]
pub struct ToolSettings {
    pub tool: Tool,
    pub primary_color: Color,
    pub secondary_color: Color,
    /// Side length of the square brush stamp, in cells.
    pub brush_size: u32,
    pub selection_mode: SelectionMode,
    pub shape_kind: ShapeKind,
    pub shape_fill: ShapeFillMode,
    /// Percent (1–100) a shade stamp darkens or lightens by.
    pub shade_strength: u8,
    /// Swap which button darkens and which lightens.
    pub switch_darken_and_lighten: bool,
}

pub const MIN_BRUSH_SIZE: u32 = 1;
pub const MAX_BRUSH_SIZE: u32 = 64;

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            tool: Tool::Pencil,
            primary_color: Rgba([0, 0, 0, 255]),
            secondary_color: Rgba([255, 255, 255, 255]),
            brush_size: 1,
            selection_mode: SelectionMode::Rectangular,
            shape_kind: ShapeKind::Rectangle,
            shape_fill: ShapeFillMode::Outline,
            shade_strength: 10,
            switch_darken_and_lighten: false,
        }
    }
}

impl ToolSettings {
    pub fn set_brush_size(&mut self, size: u32) {
        self.brush_size = size.clamp(MIN_BRUSH_SIZE, MAX_BRUSH_SIZE);
    }

    pub fn set_shade_strength(&mut self, strength: u8) {
        self.shade_strength = strength.clamp(1, 100);
    }

    /// Colour painted by `button`.
    pub fn color_for(&self, button: PointerButton) -> Color {
        match button {
            PointerButton::Primary => self.primary_color,
            PointerButton::Secondary => self.secondary_color,
        }
    }

    /// `true` when `button` should darken under the Shade tool.
    pub fn shade_darkens(&self, button: PointerButton) -> bool {
        (button == PointerButton::Primary) != self.switch_darken_and_lighten
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shortcuts_round_trip() {
        for tool in Tool::all() {
            assert_eq!(Tool::from_shortcut(tool.shortcut()), Some(*tool));
        }
        assert_eq!(Tool::from_shortcut('S'), Some(Tool::Select));
        assert_eq!(Tool::from_shortcut('z'), None);
    }

    #[test]
    fn brush_size_is_clamped() {
        let mut s = ToolSettings::default();
        s.set_brush_size(0);
        assert_eq!(s.brush_size, 1);
        s.set_brush_size(1000);
        assert_eq!(s.brush_size, MAX_BRUSH_SIZE);
    }

    #[test]
    fn switch_swaps_shade_direction() {
        let mut s = ToolSettings::default();
        assert!(s.shade_darkens(PointerButton::Primary));
        s.switch_darken_and_lighten = true;
        assert!(!s.shade_darkens(PointerButton::Primary));
        assert!(s.shade_darkens(PointerButton::Secondary));
    }
}
