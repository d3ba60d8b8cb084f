// ============================================================================
// FILE I/O - .pxsm project JSON, raster import and scaled raster export
// ============================================================================

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::codecs::png::PngEncoder;
use image::imageops::{self, FilterType};
use image::{ColorType, DynamicImage, ImageEncoder, ImageError, RgbaImage};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::canvas::{GridSize, PixelBuffer};

/// Version string written into exported project files.
pub const PXSM_VERSION: &str = "1.0";

/// Project file extension.
pub const PXSM_EXTENSION: &str = "pxsm";

/// On-disk shape of a project file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PxsmData {
    pub version: String,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl PxsmData {
    pub fn from_buffer(buffer: &PixelBuffer) -> Self {
        Self {
            version: PXSM_VERSION.to_string(),
            width: buffer.width(),
            height: buffer.height(),
            pixels: buffer.as_raw().to_vec(),
        }
    }
}

/// Reasons an import is rejected. The editor state is untouched on any error.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("project data is not a JSON object")]
    NotAnObject,
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("field `{field}` must be a {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
    #[error("field `pixels` must be an array")]
    PixelsNotArray,
    #[error("pixel value at index {0} is not a number")]
    NonNumericPixel(usize),
    #[error("invalid grid dimensions {width}×{height} (max {max})")]
    InvalidDimensions { width: f64, height: f64, max: u32 },
    #[error("expected {expected} pixel values, found {actual}")]
    PixelCountMismatch { expected: usize, actual: usize },
    #[error("not a GIMP palette (missing `GIMP Palette` header)")]
    NotAPalette,
    #[error("image decode failed: {0}")]
    Image(#[from] ImageError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("image encode failed: {0}")]
    Image(#[from] ImageError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON encode failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid export scale {0}")]
    InvalidScale(f32),
}

// ============================================================================
// PROJECT FILES (.pxsm)
// ============================================================================

fn require<'a>(obj: &'a serde_json::Map<String, Value>, field: &'static str) -> Result<&'a Value, ImportError> {
    obj.get(field).ok_or(ImportError::MissingField(field))
}

/// Validate and decode project JSON into a buffer.
///
/// Besides the field/type checks, dimensions must be positive integers no
/// larger than `max_grid_size` and `pixels` must hold exactly `w*h*4`
/// numbers. Values are rounded and clamped into 0–255.
pub fn parse_pxsm(json: &str, max_grid_size: u32) -> Result<PixelBuffer, ImportError> {
    let value: Value = serde_json::from_str(json)?;
    let obj = value.as_object().ok_or(ImportError::NotAnObject)?;

    let version = require(obj, "version")?;
    let width = require(obj, "width")?;
    let height = require(obj, "height")?;
    let pixels = require(obj, "pixels")?;

    if !version.is_string() {
        return Err(ImportError::WrongType {
            field: "version",
            expected: "string",
        });
    }
    let width = width.as_f64().ok_or(ImportError::WrongType {
        field: "width",
        expected: "number",
    })?;
    let height = height.as_f64().ok_or(ImportError::WrongType {
        field: "height",
        expected: "number",
    })?;
    let pixels = pixels.as_array().ok_or(ImportError::PixelsNotArray)?;

    let mut bytes = Vec::with_capacity(pixels.len());
    for (i, v) in pixels.iter().enumerate() {
        let n = v.as_f64().ok_or(ImportError::NonNumericPixel(i))?;
        bytes.push(n.round().clamp(0.0, 255.0) as u8);
    }

    let valid_dim = |d: f64| d.fract() == 0.0 && d >= 1.0 && d <= max_grid_size as f64;
    if !valid_dim(width) || !valid_dim(height) {
        return Err(ImportError::InvalidDimensions {
            width,
            height,
            max: max_grid_size,
        });
    }

    let size = GridSize::new(width as u32, height as u32);
    let expected = size.cell_count() * 4;
    let actual = bytes.len();
    PixelBuffer::from_raw(size, bytes).ok_or(ImportError::PixelCountMismatch { expected, actual })
}

pub fn load_pxsm(path: &Path, max_grid_size: u32) -> Result<PixelBuffer, ImportError> {
    let json = std::fs::read_to_string(path)?;
    parse_pxsm(&json, max_grid_size)
}

pub fn to_pxsm_string(buffer: &PixelBuffer) -> Result<String, ExportError> {
    Ok(serde_json::to_string(&PxsmData::from_buffer(buffer))?)
}

pub fn save_pxsm(buffer: &PixelBuffer, path: &Path) -> Result<(), ExportError> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(writer, &PxsmData::from_buffer(buffer))?;
    Ok(())
}

// ============================================================================
// RASTER IMPORT
// ============================================================================

/// Fit `(w, h)` inside `max` on both axes, keeping the aspect ratio.
pub fn fit_within(w: u32, h: u32, max: u32) -> (u32, u32) {
    if w <= max && h <= max {
        return (w, h);
    }
    let scale = (max as f64 / w as f64).min(max as f64 / h as f64);
    let nw = ((w as f64 * scale).floor() as u32).clamp(1, max);
    let nh = ((h as f64 * scale).floor() as u32).clamp(1, max);
    (nw, nh)
}

/// Convert a decoded image into a grid, shrinking it with nearest-neighbour
/// sampling when an edge exceeds `max_grid_size`.
pub fn image_to_buffer(img: &DynamicImage, max_grid_size: u32) -> Result<PixelBuffer, ImportError> {
    let rgba = img.to_rgba8();
    let (w, h) = rgba.dimensions();
    if w == 0 || h == 0 {
        return Err(ImportError::InvalidDimensions {
            width: w as f64,
            height: h as f64,
            max: max_grid_size,
        });
    }
    let (nw, nh) = fit_within(w, h, max_grid_size.max(1));
    if (nw, nh) == (w, h) {
        return Ok(PixelBuffer::from_rgba_image(&rgba));
    }
    crate::log_info!("downscaling {}×{} image to {}×{}", w, h, nw, nh);
    let resized = imageops::resize(&rgba, nw, nh, FilterType::Nearest);
    Ok(PixelBuffer::from_rgba_image(&resized))
}

pub fn decode_image(bytes: &[u8], max_grid_size: u32) -> Result<PixelBuffer, ImportError> {
    let img = image::load_from_memory(bytes)?;
    image_to_buffer(&img, max_grid_size)
}

pub fn load_image(path: &Path, max_grid_size: u32) -> Result<PixelBuffer, ImportError> {
    let img = image::open(path)?;
    image_to_buffer(&img, max_grid_size)
}

// ============================================================================
// RASTER EXPORT
// ============================================================================

/// Largest scale at which neither output edge exceeds `max_export_size`.
pub fn max_export_scale(size: GridSize, max_export_size: u32) -> f32 {
    let longest = size.x.max(size.y).max(1);
    (max_export_size as f32 / longest as f32).max(f32::MIN_POSITIVE)
}

/// Output dimensions for `scale`: `floor(edge * scale)`, at least 1.
pub fn export_dimensions(size: GridSize, scale: f32) -> (u32, u32) {
    let edge = |e: u32| ((e as f64 * scale as f64).floor() as u32).max(1);
    (edge(size.x), edge(size.y))
}

/// Nearest-neighbour upscale of the grid by `scale`, clamped so the output
/// never exceeds `max_export_size` on its longest edge.
pub fn render_scaled(buffer: &PixelBuffer, scale: f32, max_export_size: u32) -> Result<RgbaImage, ExportError> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(ExportError::InvalidScale(scale));
    }
    let scale = scale.min(max_export_scale(buffer.size(), max_export_size));
    let (ow, oh) = export_dimensions(buffer.size(), scale);
    let (sw, sh) = (buffer.width() as u64, buffer.height() as u64);
    let src = buffer.as_raw();

    let mut out = vec![0u8; ow as usize * oh as usize * 4];
    if sw > 0 && sh > 0 {
        out.par_chunks_mut(ow as usize * 4).enumerate().for_each(|(dy, row)| {
            let sy = (dy as u64 * sh / oh as u64).min(sh - 1);
            for (dx, px) in row.chunks_exact_mut(4).enumerate() {
                let sx = (dx as u64 * sw / ow as u64).min(sw - 1);
                let i = ((sy * sw + sx) * 4) as usize;
                px.copy_from_slice(&src[i..i + 4]);
            }
        });
    }

    RgbaImage::from_raw(ow, oh, out).ok_or(ExportError::InvalidScale(scale))
}

/// Encode an RGBA image as PNG bytes.
pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>, ExportError> {
    let mut bytes = Vec::new();
    PngEncoder::new(&mut bytes).write_image(img.as_raw(), img.width(), img.height(), ColorType::Rgba8)?;
    Ok(bytes)
}

/// Render at `scale` and write to `path`; the format follows the extension.
pub fn save_image(buffer: &PixelBuffer, path: &Path, scale: f32, max_export_size: u32) -> Result<(), ExportError> {
    let img = render_scaled(buffer, scale, max_export_size)?;
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        // JPEG has no alpha channel.
        "jpg" | "jpeg" => DynamicImage::ImageRgba8(img).to_rgb8().save(path)?,
        "" => std::fs::write(path, encode_png(&img)?)?,
        _ => img.save(path)?,
    }
    Ok(())
}
