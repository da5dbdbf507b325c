//! Image pre-compression before upload.
//!
//! Downscales images so the pixel count stays within a budget and both sides
//! are multiples of a block size, then re-encodes them as JPEG in place.

use crate::discovery::FileDiscovery;
use crate::error::{CaptionerError, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Compression parameters.
#[derive(Debug, Clone, Copy)]
pub struct CompressOptions {
    pub max_pixels: u64,
    /// Both output sides are multiples of this
    pub multiple: u32,
    /// JPEG quality, 1-100
    pub quality: u8,
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self {
            max_pixels: 1024 * 1024,
            multiple: 32,
            quality: 90,
        }
    }
}

#[derive(Debug, Default)]
pub struct CompressReport {
    /// Output path and new dimensions
    pub compressed: Vec<(PathBuf, u32, u32)>,
    pub failures: Vec<(PathBuf, String)>,
}

/// Output size for a `width` x `height` image.
///
/// Keeps the aspect ratio, never upscales, and rounds each side down to a
/// multiple of `options.multiple` (at least one block).
pub fn target_dimensions(width: u32, height: u32, options: &CompressOptions) -> (u32, u32) {
    let pixels = u64::from(width) * u64::from(height);
    let scale = if pixels > options.max_pixels {
        (options.max_pixels as f64 / pixels as f64).sqrt()
    } else {
        1.0
    };
    let m = options.multiple.max(1);
    let round = |side: u32| {
        let scaled = (f64::from(side) * scale).floor() as u32;
        ((scaled / m) * m).max(m)
    };
    (round(width), round(height))
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Where the JPEG for `path` goes. JPEG inputs are rewritten in place.
fn output_path(path: &Path) -> PathBuf {
    let is_jpeg = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("jpg") || e.eq_ignore_ascii_case("jpeg"));
    if is_jpeg {
        path.to_path_buf()
    } else {
        path.with_extension("jpg")
    }
}

/// Compress one image; returns the written path and its dimensions.
///
/// Fails without touching anything when a different file already occupies
/// the output path. The JPEG is encoded to a temporary sibling and renamed
/// into place.
pub fn compress_image(path: &Path, options: &CompressOptions) -> Result<(PathBuf, u32, u32)> {
    let image_err = |message: String| CaptionerError::Image {
        path: path.to_path_buf(),
        message,
    };

    let output = output_path(path);
    let in_place = output == path || same_file(&output, path);
    if !in_place && output.exists() {
        return Err(image_err(format!(
            "{} already exists, not overwriting it",
            output.display()
        )));
    }

    let img = image::open(path).map_err(|e| image_err(e.to_string()))?;
    let (w, h) = target_dimensions(img.width(), img.height(), options);
    let resized = if (w, h) == (img.width(), img.height()) {
        img
    } else {
        img.resize_exact(w, h, FilterType::Lanczos3)
    };
    let rgb = resized.to_rgb8();

    let mut temp_name = output.file_name().unwrap_or_default().to_os_string();
    temp_name.push(".tmp");
    let temp = output.with_file_name(temp_name);
    let encoded = File::create(&temp).map_err(CaptionerError::from).and_then(|file| {
        let mut encoder =
            JpegEncoder::new_with_quality(BufWriter::new(file), options.quality.clamp(1, 100));
        encoder
            .encode_image(&rgb)
            .map_err(|e| image_err(e.to_string()))
    });
    if let Err(e) = encoded {
        let _ = std::fs::remove_file(&temp);
        return Err(e);
    }
    std::fs::rename(&temp, &output)?;

    if !in_place {
        std::fs::remove_file(path)?;
    }
    tracing::debug!("Compressed {:?} -> {:?} ({w}x{h})", path, output);
    Ok((output, w, h))
}

/// Compress every supported image under `folder`. Per-file failures are
/// collected in the report.
pub fn compress_folder(folder: &Path, discovery: &FileDiscovery, options: &CompressOptions) -> CompressReport {
    let mut report = CompressReport::default();
    for file in discovery.discover(folder) {
        match compress_image(&file.path, options) {
            Ok((out, w, h)) => report.compressed.push((out, w, h)),
            Err(e) => {
                tracing::warn!("Failed to compress {:?}: {e}", file.path);
                report.failures.push((file.path, e.to_string()));
            }
        }
    }
    tracing::info!(
        "Compressed {} image(s), {} failure(s)",
        report.compressed.len(),
        report.failures.len()
    );
    report
}
