//! Output directory layout.

use std::path::{Path, PathBuf};

use crate::config::ExportFormat;
use crate::error::Result;

/// Directory for downloaded media, relative to the output root.
pub const MEDIA_DIR: &str = "media";

/// Directory for per-month Markdown files, relative to the output root.
pub const BY_MONTH_DIR: &str = "by_month";

/// Base name of every export file.
pub const EXPORT_STEM: &str = "likes";

/// Where everything produced by a run lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn media_dir(&self) -> PathBuf {
        self.root.join(MEDIA_DIR)
    }

    pub fn by_month_dir(&self) -> PathBuf {
        self.root.join(BY_MONTH_DIR)
    }

    /// `likes.<ext>` in the output root.
    pub fn export_path(&self, format: ExportFormat) -> PathBuf {
        self.root
            .join(format!("{}.{}", EXPORT_STEM, format.extension()))
    }

    /// `by_month/likes_YYYY-MM.md`.
    pub fn month_path(&self, year_month: &str) -> PathBuf {
        self.by_month_dir()
            .join(format!("{}_{}.md", EXPORT_STEM, year_month))
    }

    /// Path of a media file relative to the output root, as written into exports.
    pub fn relative_media_path(filename: &str) -> String {
        format!("{}/{}", MEDIA_DIR, filename)
    }
}

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_paths() {
        let layout = OutputLayout::new("/exports");
        assert_eq!(layout.media_dir(), PathBuf::from("/exports/media"));
        assert_eq!(
            layout.export_path(ExportFormat::Markdown),
            PathBuf::from("/exports/likes.md")
        );
        assert_eq!(
            layout.month_path("2025-11"),
            PathBuf::from("/exports/by_month/likes_2025-11.md")
        );
        assert_eq!(OutputLayout::relative_media_path("1_0.jpg"), "media/1_0.jpg");
    }

    #[test]
    fn test_ensure_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        ensure_dir(&nested).unwrap();
        assert!(nested.is_dir());
        ensure_dir(&nested).unwrap();
    }
}
