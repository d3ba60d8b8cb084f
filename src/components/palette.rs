// ============================================================================
// PALETTES - named colour lists and GIMP palette (.gpl) exchange
// ============================================================================
//
// File shape:
//   GIMP Palette
//   Name: <name>
//   #
//   R G B          (one decimal triple per line, optional trailing name)

use std::path::Path;

use image::Rgba;

use crate::canvas::{Color, PixelBuffer};
use crate::components::colors::{extract_colors, hex_to_rgba};
use crate::io::{ExportError, ImportError};

pub const GPL_HEADER: &str = "GIMP Palette";
pub const GPL_EXTENSION: &str = "gpl";
const IMPORTED_PALETTE_NAME: &str = "Imported palette";

const DEFAULT_COLORS: [&str; 32] = [
    "#be4a2f", "#d77643", "#ead4aa", "#e4a672", "#b86f50", "#733e39", "#3e2731", "#a22633", "#e43b44", "#f77622",
    "#feae34", "#fee761", "#63c74d", "#3e8948", "#265c42", "#193c3e", "#124e89", "#0099db", "#2ce8f5", "#ffffff",
    "#c0cbdc", "#8b9bb4", "#5a6988", "#3a4466", "#262b44", "#181425", "#ff0044", "#68386c", "#b55088", "#f6757a",
    "#e8b796", "#c28569",
];

const SUNSET_COLORS: [&str; 8] = [
    "#0d2b45", "#203c56", "#544e68", "#8d697a", "#d08159", "#ffaa5e", "#ffd4a3", "#ffecd6",
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColorPalette {
    pub name: String,
    /// Opaque colours in display order.
    pub colors: Vec<Color>,
}

impl ColorPalette {
    pub fn new(name: impl Into<String>, colors: Vec<Color>) -> Self {
        Self {
            name: name.into(),
            colors,
        }
    }

    /// Built-in palettes shipped with the editor.
    pub fn builtin() -> Vec<ColorPalette> {
        let from_hex = |list: &[&str]| list.iter().filter_map(|h| hex_to_rgba(h)).collect();
        vec![
            ColorPalette::new("Default", from_hex(&DEFAULT_COLORS)),
            ColorPalette::new("Sunset", from_hex(&SUNSET_COLORS)),
        ]
    }

    /// Palette of the colours used on `buffer`, most frequent first.
    pub fn from_buffer(name: impl Into<String>, buffer: &PixelBuffer, max_colors: usize) -> Self {
        Self::new(name, extract_colors(buffer, max_colors))
    }

    pub fn to_gpl(&self) -> String {
        let mut lines = vec![GPL_HEADER.to_string(), format!("Name: {}", self.name), "#".to_string()];
        lines.extend(self.colors.iter().map(|c| format!("{} {} {}", c[0], c[1], c[2])));
        lines.join("\n")
    }

    /// Parse GIMP palette text. The second line is the `Name:` slot and is
    /// never read as a colour. Only a missing header (or a file shorter than
    /// two lines) is fatal; comment lines and lines without a valid `R G B`
    /// triple are skipped.
    pub fn parse_gpl(content: &str) -> Result<Self, ImportError> {
        let lines: Vec<&str> = content.split('\n').map(|l| l.strip_suffix('\r').unwrap_or(l)).collect();
        if lines.len() < 2 || lines[0].trim() != GPL_HEADER {
            return Err(ImportError::NotAPalette);
        }

        let name = match lines[1].strip_prefix("Name:") {
            Some(rest) => rest.trim().to_string(),
            None => IMPORTED_PALETTE_NAME.to_string(),
        };
        let colors = lines[2..]
            .iter()
            .map(|line| line.trim())
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(parse_rgb_triple)
            .collect();
        Ok(Self { name, colors })
    }

    pub fn load(path: &Path) -> Result<Self, ImportError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_gpl(&content)
    }

    pub fn save(&self, path: &Path) -> Result<(), ExportError> {
        std::fs::write(path, self.to_gpl())?;
        Ok(())
    }
}

/// Leading `R G B` of a palette line; each channel is 1-3 decimal digits in 0..=255.
fn parse_rgb_triple(line: &str) -> Option<Color> {
    let mut parts = line.split_whitespace();
    let mut channel = || -> Option<u8> {
        let part = parts.next()?;
        if part.is_empty() || part.len() > 3 || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        part.parse::<u8>().ok()
    };
    Some(Rgba([channel()?, channel()?, channel()?, 255]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::GridSize;
    use pretty_assertions::assert_eq;

    #[test]
    fn gpl_text_round_trips() {
        let palette = ColorPalette::new("Mine", vec![Rgba([1, 2, 3, 255]), Rgba([255, 128, 0, 255])]);
        let text = palette.to_gpl();
        assert_eq!(text, "GIMP Palette\nName: Mine\n#\n1 2 3\n255 128 0");
        assert_eq!(ColorPalette::parse_gpl(&text).unwrap(), palette);
    }

    #[test]
    fn bad_lines_are_skipped() {
        let text = "GIMP Palette\r\nName: Odd\r\n# comment\r\n10 20 30\tNamed\r\n300 0 0\r\nfoo\r\n1 2\r\n\r\n4 5 6\r\n";
        let p = ColorPalette::parse_gpl(text).unwrap();
        assert_eq!(p.name, "Odd");
        assert_eq!(p.colors, vec![Rgba([10, 20, 30, 255]), Rgba([4, 5, 6, 255])]);
    }

    #[test]
    fn second_line_is_always_the_name_slot() {
        let p = ColorPalette::parse_gpl("GIMP Palette\n0 0 0\n1 1 1\n").unwrap();
        assert_eq!(p.name, IMPORTED_PALETTE_NAME);
        assert_eq!(p.colors, vec![Rgba([1, 1, 1, 255])]);
    }

    #[test]
    fn wrong_header_is_rejected() {
        assert!(matches!(ColorPalette::parse_gpl("JASC-PAL\n0100\n"), Err(ImportError::NotAPalette)));
        assert!(matches!(ColorPalette::parse_gpl(""), Err(ImportError::NotAPalette)));
    }

    #[test]
    fn header_alone_is_too_short() {
        assert!(matches!(ColorPalette::parse_gpl("GIMP Palette"), Err(ImportError::NotAPalette)));
        let p = ColorPalette::parse_gpl("GIMP Palette\n").unwrap();
        assert_eq!(p.name, IMPORTED_PALETTE_NAME);
        assert!(p.colors.is_empty());
    }

    #[test]
    fn builtins_parse_fully() {
        let builtin = ColorPalette::builtin();
        assert_eq!(builtin[0].colors.len(), 32);
        assert_eq!(builtin[1].colors.len(), 8);
    }

    #[test]
    fn palette_from_canvas() {
        let mut buf = PixelBuffer::new(GridSize::new(2, 1));
        buf.set_color(1, 0, Rgba([9, 8, 7, 200]));
        let p = ColorPalette::from_buffer("Canvas", &buf, 16);
        assert_eq!(p.colors, vec![Rgba([9, 8, 7, 255])]);
    }
}
