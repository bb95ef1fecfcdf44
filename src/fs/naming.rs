//! Filename generation and manipulation.

use crate::error::{Error, Result};
use crate::record::MediaKind;

/// Validate and sanitize a filename by removing or replacing invalid characters.
///
/// Returns an error if the filename contains path traversal patterns.
pub fn sanitize_filename(name: &str) -> Result<String> {
    if name.contains("..") {
        return Err(Error::InvalidFilename(format!(
            "Path traversal detected: '{}'",
            name
        )));
    }

    if name.contains('/') || name.contains('\\') {
        return Err(Error::InvalidFilename(format!(
            "Path separators not allowed in filename: '{}'",
            name
        )));
    }

    if name.contains('\0') {
        return Err(Error::InvalidFilename(format!(
            "Null bytes not allowed in filename: '{}'",
            name
        )));
    }

    let sanitized: String = name
        .chars()
        .map(|c| match c {
            ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.trim().is_empty() {
        return Err(Error::InvalidFilename(
            "Filename cannot be empty or whitespace-only".to_string(),
        ));
    }

    Ok(sanitized)
}

/// Local filename of the `index`-th media item of a record: `{record_id}_{index}.{ext}`.
pub fn media_filename(record_id: &str, index: usize, extension: &str) -> Result<String> {
    let extension = extension.trim_start_matches('.');
    sanitize_filename(&format!("{}_{}.{}", record_id, index, extension))
}

/// Extension from the last path segment of a URL, ignoring the query string.
pub fn extension_from_url(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;

    // Image hosts carry the format in the query (`?format=jpg&name=orig`).
    if let Some((_, format)) = parsed.query_pairs().find(|(k, _)| k == "format") {
        if is_plain_extension(&format) {
            return Some(format.to_ascii_lowercase());
        }
    }

    let segment = parsed.path_segments()?.next_back()?;
    let (_, ext) = segment.rsplit_once('.')?;
    is_plain_extension(ext).then(|| ext.to_ascii_lowercase())
}

/// Extension registered for a `content-type` value.
pub fn extension_from_content_type(content_type: &str) -> Option<String> {
    let essence = content_type.split(';').next()?.trim().to_ascii_lowercase();
    let preferred = match essence.as_str() {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "video/mp4" => Some("mp4"),
        _ => None,
    };
    if let Some(ext) = preferred {
        return Some(ext.to_string());
    }

    mime_guess::get_mime_extensions_str(&essence)
        .and_then(|exts| exts.first())
        .map(|ext| ext.to_string())
}

/// Extension for a downloaded file: URL first, then content type, then the media kind.
pub fn resolve_extension(url: &str, content_type: Option<&str>, kind: MediaKind) -> String {
    extension_from_url(url)
        .or_else(|| content_type.and_then(extension_from_content_type))
        .unwrap_or_else(|| kind.default_extension().to_string())
}

fn is_plain_extension(ext: &str) -> bool {
    !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric())
}
