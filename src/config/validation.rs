//! Configuration validation logic.

use regex::Regex;

use crate::api::client::MAX_PAGE_SIZE;
use crate::config::loader::Config;
use crate::error::{Error, Result};

/// Upper bound on concurrent media downloads.
pub const MAX_WORKERS: usize = 16;

/// Validate the entire configuration.
pub fn validate_config(config: &Config) -> Result<()> {
    match &config.auth.cookies_file {
        Some(path) if !path.as_os_str().is_empty() => {}
        _ => return Err(Error::MissingConfig("cookies_file".to_string())),
    }

    match &config.auth.user_id {
        Some(user_id) => validate_user_id(user_id)?,
        None => return Err(Error::MissingConfig("user_id".to_string())),
    }

    if config.auth.user_agent.trim().is_empty() {
        return Err(Error::MissingConfig("user_agent".to_string()));
    }

    if config.auth.bearer_token.trim().is_empty() {
        return Err(Error::MissingConfig("bearer_token".to_string()));
    }

    validate_range("page_size", config.fetch.page_size as u64, 1, MAX_PAGE_SIZE as u64)?;
    validate_range("empty_page_limit", config.fetch.empty_page_limit as u64, 1, 100)?;
    validate_range("request_timeout_secs", config.fetch.request_timeout_secs, 1, 600)?;
    validate_range("workers", config.download.workers as u64, 1, MAX_WORKERS as u64)?;
    validate_range("jpeg_quality", config.download.jpeg_quality as u64, 1, 100)?;
    validate_range(
        "max_image_dimension",
        config.download.max_image_dimension as u64,
        16,
        16384,
    )?;

    if config.fetch.run_timeout_secs == Some(0) {
        return Err(Error::ConfigValidation {
            field: "run_timeout_secs".to_string(),
            message: "Run timeout must be greater than zero".to_string(),
        });
    }

    if config.export.formats.is_empty() {
        return Err(Error::ConfigValidation {
            field: "formats".to_string(),
            message: "At least one export format is required".to_string(),
        });
    }

    if config.export.output_directory.as_os_str().is_empty() {
        return Err(Error::MissingConfig("output_directory".to_string()));
    }

    Ok(())
}

/// Validate a numeric account id.
pub fn validate_user_id(user_id: &str) -> Result<()> {
    let pattern = Regex::new(r"^\d{1,20}$").map_err(|e| Error::Config(e.to_string()))?;

    if user_id.is_empty() {
        return Err(Error::MissingConfig("user_id".to_string()));
    }

    if !pattern.is_match(user_id) {
        return Err(Error::ConfigValidation {
            field: "user_id".to_string(),
            message: format!(
                "User id '{}' must be numeric (the account's rest id, not its @handle)",
                user_id
            ),
        });
    }

    Ok(())
}

fn validate_range(field: &str, value: u64, min: u64, max: u64) -> Result<()> {
    if value < min || value > max {
        return Err(Error::ConfigValidation {
            field: field.to_string(),
            message: format!("Must be between {} and {} (got {})", min, max, value),
        });
    }
    Ok(())
}
