//! JSON export.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::record::Record;

/// Write `records` as a pretty-printed JSON array.
///
/// The raw API payload is kept only when `include_raw` is set.
pub fn export_json(records: &[Record], path: &Path, include_raw: bool) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);

    if include_raw {
        serde_json::to_writer_pretty(&mut out, records)?;
    } else {
        let stripped: Vec<Record> = records.iter().map(Record::without_raw).collect();
        serde_json::to_writer_pretty(&mut out, &stripped)?;
    }

    out.flush()?;
    tracing::debug!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}
