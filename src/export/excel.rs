//! Excel workbook export.

use std::path::Path;

use rust_xlsxwriter::{Format, Workbook, Worksheet};

use crate::error::Result;
use crate::export::csv::{LikeRow, COLUMNS};
use crate::record::Record;

const SHEET_NAME: &str = "Liked Posts";

/// Write one worksheet row per record, with the same columns as the CSV export.
pub fn export_excel(records: &[Record], path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    let header = Format::new().set_bold();
    for (col, name) in COLUMNS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *name, &header)?;
    }
    worksheet.set_freeze_panes(1, 0)?;

    for (i, record) in records.iter().enumerate() {
        write_row(worksheet, i as u32 + 1, &LikeRow::from(record))?;
    }

    workbook.save(path)?;
    tracing::debug!("Wrote {} rows to {}", records.len(), path.display());
    Ok(())
}

/// Typed cells: counters as numbers, flags as booleans. Unknown values stay empty.
fn write_row(sheet: &mut Worksheet, row: u32, like: &LikeRow<'_>) -> Result<()> {
    sheet.write_string(row, 0, like.tweet_id)?;
    sheet.write_string(row, 1, like.text)?;
    sheet.write_string(row, 2, like.created_at)?;
    sheet.write_string(row, 3, like.user_id)?;
    sheet.write_string(row, 4, like.user_screen_name)?;
    sheet.write_string(row, 5, like.user_name)?;
    sheet.write_boolean(row, 6, like.user_verified)?;

    let counters = [
        like.retweet_count,
        like.favorite_count,
        like.reply_count,
        like.quote_count,
        like.view_count,
    ];
    for (offset, count) in counters.into_iter().enumerate() {
        if let Some(count) = count {
            sheet.write_number(row, 7 + offset as u16, count as f64)?;
        }
    }

    if let Some(lang) = like.lang {
        sheet.write_string(row, 12, lang)?;
    }
    sheet.write_boolean(row, 13, like.is_retweet)?;
    sheet.write_boolean(row, 14, like.is_quote)?;
    sheet.write_boolean(row, 15, like.has_media)?;
    sheet.write_number(row, 16, like.media_count as f64)?;
    sheet.write_string(row, 17, &like.media_types)?;
    sheet.write_number(row, 18, like.url_count as f64)?;
    sheet.write_number(row, 19, like.hashtag_count as f64)?;
    sheet.write_string(row, 20, &like.hashtags)?;
    sheet.write_number(row, 21, like.mention_count as f64)?;
    sheet.write_string(row, 22, &like.tweet_url)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::item::fixtures::{photo, record};
    use tokio_test::assert_ok;

    /// Every xlsx file is a zip archive.
    fn is_zip(path: &Path) -> bool {
        std::fs::read(path)
            .map(|bytes| bytes.starts_with(b"PK"))
            .unwrap_or(false)
    }

    #[test]
    fn test_export_excel() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("likes.xlsx");

        let mut r = record("7");
        r.text = "héllo, \"world\"\nsecond line 🦀".to_string();
        r.engagement.favorite_count = Some(12);
        r.lang = None;
        r.media.push(photo("https://pbs.twimg.com/media/a.jpg"));

        assert_ok!(export_excel(&[r, record("8")], &path));
        assert!(is_zip(&path));
    }

    #[test]
    fn test_empty_export_still_writes_header_sheet() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("likes.xlsx");

        assert_ok!(export_excel(&[], &path));
        assert!(is_zip(&path));
    }

    #[test]
    fn test_unwritable_path_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("missing").join("likes.xlsx");

        assert!(export_excel(&[record("1")], &path).is_err());
    }
}
