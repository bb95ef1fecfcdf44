//! Photo optimisation after download.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;

use crate::error::Result;

/// Settings for [`optimize_photo`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptimizeOptions {
    /// Longest side allowed after resizing.
    pub max_dimension: u32,
    /// JPEG quality (1..=100).
    pub quality: u8,
}

impl Default for OptimizeOptions {
    fn default() -> Self {
        Self {
            max_dimension: 1920,
            quality: 85,
        }
    }
}

/// Downscale a JPEG to fit `max_dimension` and re-encode it.
///
/// Non-JPEG files are left alone. The re-encoded file replaces the original
/// only when it was resized or came out smaller. Returns whether the file changed.
pub fn optimize_photo(path: &Path, options: OptimizeOptions) -> Result<bool> {
    let is_jpeg = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| matches!(e.to_ascii_lowercase().as_str(), "jpg" | "jpeg"))
        .unwrap_or(false);
    if !is_jpeg {
        return Ok(false);
    }

    let original_size = std::fs::metadata(path)?.len();
    let img = image::open(path)?;

    let max = options.max_dimension.max(1);
    let resized = img.width() > max || img.height() > max;
    let img = if resized {
        img.resize(max, max, FilterType::Lanczos3)
    } else {
        img
    };

    let tmp = path.with_extension("jpg.opt");
    {
        let mut out = BufWriter::new(File::create(&tmp)?);
        let encoder = JpegEncoder::new_with_quality(&mut out, options.quality.clamp(1, 100));
        DynamicImage::ImageRgb8(img.to_rgb8()).write_with_encoder(encoder)?;
        out.flush()?;
    }

    let new_size = std::fs::metadata(&tmp)?.len();
    if resized || new_size < original_size {
        std::fs::rename(&tmp, path)?;
        tracing::debug!(
            "Optimized {}: {} -> {} bytes",
            path.display(),
            original_size,
            new_size
        );
        Ok(true)
    } else {
        std::fs::remove_file(&tmp)?;
        Ok(false)
    }
}
