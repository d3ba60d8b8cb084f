// ============================================================================
// PixelSmith CLI - headless conversion between .pxsm projects and images
// ============================================================================
//
// Usage examples:
//   pixelsmith -i sprite.pxsm -o sprite.png --scale 8
//   pixelsmith -i art.png -o art.pxsm                 (downscaled to the max grid)
//   pixelsmith -i "tiles/*.pxsm" --output-dir out/ --format png --scale 4
//   pixelsmith -i sprite.pxsm --palette               (print colours, no output)
//   pixelsmith -i sprite.pxsm -o sprite.gpl           (palette as a GIMP palette)
//
// All processing runs synchronously on the current thread, one file at a time.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use crate::canvas::PixelBuffer;
use crate::components::colors::{extract_colors, rgba_to_hex};
use crate::components::palette::{ColorPalette, GPL_EXTENSION};
use crate::io::{PXSM_EXTENSION, load_image, load_pxsm, save_image, save_pxsm};
use crate::settings::EngineSettings;

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// PixelSmith headless converter.
#[derive(Parser, Debug)]
#[command(
    name = "pixelsmith",
    about = "PixelSmith headless pixel-art converter",
    long_about = "Convert between PixelSmith .pxsm projects and raster images without\n\
                  opening an editor. Raster inputs larger than the maximum grid are\n\
                  downscaled with nearest-neighbour sampling; raster outputs are\n\
                  upscaled by --scale.\n\n\
                  Example:\n  \
                  pixelsmith -i sprite.pxsm -o sprite.png --scale 8"
)]
pub struct CliArgs {
    /// Input file(s). Glob patterns accepted (e.g. "*.pxsm", "art/*.png").
    #[arg(short, long, required = true, num_args = 1..)]
    pub input: Vec<String>,

    /// Output file path. Only valid for single-file input.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output directory for batch processing.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Output format: pxsm, png, jpeg, bmp, gif, gpl (extracted palette).
    /// When omitted, the format is inferred from --output's extension, defaulting to png.
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<String>,

    /// Raster export scale factor (clamped to the maximum export size).
    #[arg(short, long, default_value_t = 1.0)]
    pub scale: f32,

    /// Print the extracted palette of each input instead of converting.
    #[arg(long)]
    pub palette: bool,

    /// Print per-file timing information.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Target of a conversion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Pxsm,
    Png,
    Jpeg,
    Bmp,
    Gif,
    Gpl,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Pxsm => PXSM_EXTENSION,
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Bmp => "bmp",
            OutputFormat::Gif => "gif",
            OutputFormat::Gpl => GPL_EXTENSION,
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "pxsm" => Some(OutputFormat::Pxsm),
            "png" => Some(OutputFormat::Png),
            "jpg" | "jpeg" => Some(OutputFormat::Jpeg),
            "bmp" => Some(OutputFormat::Bmp),
            "gif" => Some(OutputFormat::Gif),
            "gpl" => Some(OutputFormat::Gpl),
            _ => None,
        }
    }
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run all CLI processing and return an OS exit code.
/// `0` = all files succeeded, `1` = one or more files failed.
pub fn run(args: CliArgs, settings: &EngineSettings) -> ExitCode {
    let inputs = resolve_inputs(&args.input);
    if inputs.is_empty() {
        eprintln!("error: no input files matched the given pattern(s).");
        return ExitCode::FAILURE;
    }

    if inputs.len() > 1 && args.output.is_some() && args.output_dir.is_none() {
        eprintln!(
            "error: {} input files given but --output only accepts a single file path.\n\
             Use --output-dir to specify a destination directory for batch processing.",
            inputs.len()
        );
        return ExitCode::FAILURE;
    }

    let format = parse_format(args.format.as_deref(), args.output.as_deref());

    if let Some(dir) = &args.output_dir
        && let Err(e) = std::fs::create_dir_all(dir)
    {
        eprintln!("error: could not create output directory '{}': {}", dir.display(), e);
        return ExitCode::FAILURE;
    }

    let total = inputs.len();
    let multi = total > 1;
    let mut any_failure = false;

    for (idx, input_path) in inputs.iter().enumerate() {
        if multi || args.verbose {
            println!("[{}/{}] {}", idx + 1, total, input_path.display());
        }
        let file_start = Instant::now();

        let buffer = match load_input(input_path, settings) {
            Ok(b) => b,
            Err(e) => {
                eprintln!("  error: load failed: {}", e);
                crate::log_err!("cli: load failed for {}: {}", input_path.display(), e);
                any_failure = true;
                continue;
            }
        };

        if args.palette {
            let colors = extract_colors(&buffer, crate::editor::MAX_PALETTE_COLORS);
            for c in colors {
                println!("{}", rgba_to_hex(c));
            }
            continue;
        }

        let Some(output_path) = build_output_path(
            input_path,
            args.output.as_deref(),
            args.output_dir.as_deref(),
            format,
        ) else {
            eprintln!("  error: cannot determine output path for '{}'.", input_path.display());
            any_failure = true;
            continue;
        };

        let result = match format {
            OutputFormat::Pxsm => save_pxsm(&buffer, &output_path).map_err(|e| e.to_string()),
            OutputFormat::Gpl => {
                let name = input_path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
                ColorPalette::from_buffer(name, &buffer, crate::editor::MAX_PALETTE_COLORS)
                    .save(&output_path)
                    .map_err(|e| e.to_string())
            }
            _ => save_image(&buffer, &output_path, args.scale, settings.max_export_size).map_err(|e| e.to_string()),
        };

        match result {
            Ok(()) => {
                if args.verbose || multi {
                    println!(
                        "  -> {} ({:.0}ms)",
                        output_path.display(),
                        file_start.elapsed().as_secs_f64() * 1000.0
                    );
                }
            }
            Err(e) => {
                eprintln!("  error: save failed: {}", e);
                crate::log_err!("cli: save failed for {}: {}", output_path.display(), e);
                any_failure = true;
            }
        }
    }

    if any_failure { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

// ============================================================================
// Helpers
// ============================================================================

fn load_input(path: &Path, settings: &EngineSettings) -> Result<PixelBuffer, crate::io::ImportError> {
    let is_project = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(PXSM_EXTENSION));
    if is_project {
        load_pxsm(path, settings.max_grid_size)
    } else {
        load_image(path, settings.max_grid_size)
    }
}

/// Expand glob patterns and literal paths into a deduplicated, ordered list.
fn resolve_inputs(patterns: &[String]) -> Vec<PathBuf> {
    let mut result: Vec<PathBuf> = Vec::new();

    for pattern in patterns {
        let as_path = Path::new(pattern);

        if as_path.exists() {
            if !result.iter().any(|p| p.as_path() == as_path) {
                result.push(as_path.to_path_buf());
            }
            continue;
        }

        match glob::glob(pattern) {
            Ok(entries) => {
                let mut matched = false;
                for entry in entries.flatten() {
                    if !result.contains(&entry) {
                        result.push(entry);
                    }
                    matched = true;
                }
                if !matched {
                    eprintln!("warning: pattern '{}' matched no files.", pattern);
                }
            }
            Err(e) => {
                eprintln!("warning: invalid glob '{}': {}", pattern, e);
            }
        }
    }

    result
}

/// Choose the format from `--format` or infer it from the output extension.
/// Defaults to PNG when neither is known.
fn parse_format(format_arg: Option<&str>, output: Option<&Path>) -> OutputFormat {
    if let Some(f) = format_arg {
        return OutputFormat::from_name(f).unwrap_or(OutputFormat::Png);
    }
    output
        .and_then(|out| out.extension())
        .and_then(|e| e.to_str())
        .and_then(OutputFormat::from_name)
        .unwrap_or(OutputFormat::Png)
}

/// Compute the output path for a single input file.
///
/// Priority:
/// 1. `--output` (explicit path, used for single-file input)
/// 2. `--output-dir` (batch directory, derives filename from input stem)
/// 3. Fallback: next to the input, same stem, new extension
///    (appends `_out` to stem if it would collide with the input path)
fn build_output_path(
    input: &Path,
    output: Option<&Path>,
    output_dir: Option<&Path>,
    format: OutputFormat,
) -> Option<PathBuf> {
    if let Some(out) = output {
        return Some(out.to_path_buf());
    }

    let ext = format.extension();
    let stem = input.file_stem()?.to_string_lossy().into_owned();

    if let Some(dir) = output_dir {
        return Some(dir.join(format!("{}.{}", stem, ext)));
    }

    let parent = input.parent().unwrap_or(Path::new("."));
    let candidate = parent.join(format!("{}.{}", stem, ext));

    if candidate == input {
        Some(parent.join(format!("{}_out.{}", stem, ext)))
    } else {
        Some(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn format_prefers_flag_then_extension() {
        assert_eq!(parse_format(Some("PXSM"), Some(Path::new("a.png"))), OutputFormat::Pxsm);
        assert_eq!(parse_format(None, Some(Path::new("a.JPEG"))), OutputFormat::Jpeg);
        assert_eq!(parse_format(None, Some(Path::new("a.xyz"))), OutputFormat::Png);
        assert_eq!(parse_format(None, None), OutputFormat::Png);
        assert_eq!(parse_format(None, Some(Path::new("p.gpl"))), OutputFormat::Gpl);
    }

    #[test]
    fn output_path_avoids_overwriting_input() {
        let p = build_output_path(Path::new("art/sprite.png"), None, None, OutputFormat::Png);
        assert_eq!(p, Some(PathBuf::from("art/sprite_out.png")));
        let p = build_output_path(Path::new("art/sprite.png"), None, Some(Path::new("out")), OutputFormat::Pxsm);
        assert_eq!(p, Some(PathBuf::from("out/sprite.pxsm")));
    }

    #[test]
    fn args_parse() {
        let args = CliArgs::parse_from(["pixelsmith", "-i", "a.pxsm", "b.pxsm", "--output-dir", "out", "--scale", "4"]);
        assert_eq!(args.input, vec!["a.pxsm".to_string(), "b.pxsm".to_string()]);
        assert_eq!(args.scale, 4.0);
        assert!(!args.palette);
    }
}
