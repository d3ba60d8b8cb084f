// ============================================================================
// COLOUR HELPERS - hex conversion, shading, palette extraction
// ============================================================================

use std::collections::HashMap;

use image::Rgba;

use crate::canvas::{Color, PixelBuffer};

/// Parse `#rrggbb` (leading `#` optional) into an opaque colour.
pub fn hex_to_rgba(hex: &str) -> Option<Color> {
    let clean = hex.trim();
    let clean = clean.strip_prefix('#').unwrap_or(clean);
    if clean.len() != 6 || !clean.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&clean[i..i + 2], 16).ok();
    Some(Rgba([channel(0)?, channel(2)?, channel(4)?, 255]))
}

/// Format as lowercase `#rrggbb`; alpha is not encoded.
pub fn rgba_to_hex(color: Color) -> String {
    format!("#{:02x}{:02x}{:02x}", color[0], color[1], color[2])
}

/// Darken or lighten `color` by `strength` percent. Alpha is preserved and
/// fully transparent colours are returned unchanged.
pub fn shade_color(color: Color, strength: u8, darken: bool) -> Color {
    if color[3] == 0 {
        return color;
    }
    let t = strength.min(100) as f32 / 100.0;
    let shade = |c: u8| -> u8 {
        let c = c as f32;
        let v = if darken { c * (1.0 - t) } else { c + (255.0 - c) * t };
        v.round().clamp(0.0, 255.0) as u8
    };
    Rgba([shade(color[0]), shade(color[1]), shade(color[2]), color[3]])
}

/// Distinct colours of the buffer, most frequent first, ignoring alpha and
/// skipping fully transparent cells. Ties keep first-appearance order.
pub fn extract_colors(buffer: &PixelBuffer, max_colors: usize) -> Vec<Color> {
    let mut index: HashMap<[u8; 3], usize> = HashMap::new();
    let mut counts: Vec<([u8; 3], usize)> = Vec::new();

    for px in buffer.as_raw().chunks_exact(4) {
        if px[3] == 0 {
            continue;
        }
        let key = [px[0], px[1], px[2]];
        match index.get(&key) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(key, counts.len());
                counts.push((key, 1));
            }
        }
    }

    // Stable sort keeps first-appearance order among equal counts.
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .take(max_colors)
        .map(|(rgb, _)| Rgba([rgb[0], rgb[1], rgb[2], 255]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::GridSize;

    #[test]
    fn hex_round_trip() {
        assert_eq!(hex_to_rgba("#1a2B3c"), Some(Rgba([0x1a, 0x2b, 0x3c, 255])));
        assert_eq!(hex_to_rgba("ffffff"), Some(Rgba([255, 255, 255, 255])));
        assert_eq!(rgba_to_hex(Rgba([0x1a, 0x2b, 0x3c, 7])), "#1a2b3c");
        assert_eq!(hex_to_rgba("#12345"), None);
        assert_eq!(hex_to_rgba("#zz0000"), None);
    }

    #[test]
    fn shading_moves_towards_black_or_white() {
        let c = Rgba([100, 200, 0, 128]);
        assert_eq!(shade_color(c, 50, true), Rgba([50, 100, 0, 128]));
        assert_eq!(shade_color(c, 100, false), Rgba([255, 255, 255, 128]));
        assert_eq!(shade_color(Rgba([9, 9, 9, 0]), 50, true), Rgba([9, 9, 9, 0]));
    }

    #[test]
    fn palette_is_sorted_by_frequency() {
        let mut buf = PixelBuffer::new(GridSize::new(4, 1));
        buf.set_color(0, 0, Rgba([1, 1, 1, 255]));
        buf.set_color(1, 0, Rgba([2, 2, 2, 255]));
        buf.set_color(2, 0, Rgba([2, 2, 2, 40]));
        let palette = extract_colors(&buf, 256);
        assert_eq!(palette, vec![Rgba([2, 2, 2, 255]), Rgba([1, 1, 1, 255])]);
        assert_eq!(extract_colors(&buf, 1).len(), 1);
    }
}
