use std::fs;
use std::path::{Path, PathBuf};

use certchain_types::Timestamp;
use qrcode::render::svg;
use qrcode::{EcLevel, QrCode};
use tracing::debug;

/// Errors from QR rendering.
#[derive(Debug, thiserror::Error)]
pub enum QrError {
    #[error("QR encoding failed: {0}")]
    Encode(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Renders a verification URL to an image artifact.
pub trait QrGenerator: Send + Sync {
    /// Render `url` and store it under `file_name`, returning where it went.
    fn generate(&self, url: &str, file_name: &str) -> Result<PathBuf, QrError>;
}

/// SVG QR codes written into one output directory.
#[derive(Clone, Debug)]
pub struct SvgQrGenerator {
    out_dir: PathBuf,
}

impl SvgQrGenerator {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }
}

/// Render `url` as an SVG document (high error correction, at least 256×256).
pub fn render_svg(url: &str) -> Result<String, QrError> {
    let code = QrCode::with_error_correction_level(url, EcLevel::H)
        .map_err(|e| QrError::Encode(e.to_string()))?;
    Ok(code
        .render::<svg::Color>()
        .min_dimensions(256, 256)
        .dark_color(svg::Color("#000000"))
        .light_color(svg::Color("#FFFFFF"))
        .build())
}

impl QrGenerator for SvgQrGenerator {
    fn generate(&self, url: &str, file_name: &str) -> Result<PathBuf, QrError> {
        let document = render_svg(url)?;
        fs::create_dir_all(&self.out_dir)?;
        let path = self.out_dir.join(file_name);
        fs::write(&path, document)?;
        debug!(path = %path.display(), "QR code written");
        Ok(path)
    }
}

/// File name for a student's QR code issued at `at`.
///
/// Spaces and path separators in the name become `_`, as do the separators
/// in the timestamp.
pub fn qr_file_name(student_name: &str, at: &Timestamp) -> String {
    let safe_name: String = student_name
        .chars()
        .map(|c| if matches!(c, ' ' | '/' | '\\') { '_' } else { c })
        .collect();
    format!("{safe_name}_{}.svg", at.file_safe())
}
