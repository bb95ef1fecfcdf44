//! Export module.
//!
//! Renders a read-only view of the collected records into:
//! - JSON
//! - CSV
//! - Markdown (single file and per month)
//! - HTML
//! - Excel

pub mod csv;
pub mod excel;
pub mod html;
pub mod json;
pub mod markdown;

use std::path::PathBuf;

use crate::config::{ExportConfig, ExportFormat};
use crate::error::Error;
use crate::fs::{ensure_dir, OutputLayout};
use crate::record::Record;

pub use self::csv::export_csv;
pub use self::excel::export_excel;
pub use self::html::export_html;
pub use self::json::export_json;
pub use self::markdown::{export_markdown, export_markdown_by_month};

/// Outcome of [`export_all`].
#[derive(Debug, Default)]
pub struct ExportReport {
    pub written: Vec<PathBuf>,
    pub errors: Vec<(ExportFormat, Error)>,
}

impl ExportReport {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Run every selected exporter. A failing exporter does not stop the others.
pub fn export_all(
    records: &[Record],
    layout: &OutputLayout,
    settings: &ExportConfig,
) -> ExportReport {
    let mut report = ExportReport::default();

    if let Err(e) = ensure_dir(layout.root()) {
        for format in &settings.formats {
            report.errors.push((*format, Error::Export(e.to_string())));
        }
        return report;
    }

    for &format in &settings.formats {
        let path = layout.export_path(format);
        let result = match format {
            ExportFormat::Json => export_json(records, &path, settings.include_raw),
            ExportFormat::Csv => export_csv(records, &path),
            ExportFormat::Markdown => export_markdown(records, &path).and_then(|()| {
                if settings.split_markdown_by_month {
                    let months = export_markdown_by_month(records, layout)?;
                    report.written.extend(months);
                }
                Ok(())
            }),
            ExportFormat::Html => export_html(records, &path),
            ExportFormat::Excel => export_excel(records, &path),
        };

        match result {
            Ok(()) => {
                tracing::info!("Exported {} records to {}", records.len(), path.display());
                report.written.push(path);
            }
            Err(e) => {
                tracing::error!("{} export failed: {}", format, e);
                report.errors.push((format, e));
            }
        }
    }

    report
}
