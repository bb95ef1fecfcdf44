//! Console output utilities.

use console::{style, StyledObject};

use crate::config::Config;

fn status_line(label: StyledObject<&str>, message: &str) -> String {
    format!("{} {}", label, message)
}

/// Print an info message.
pub fn print_info(message: &str) {
    println!("{}", status_line(style("INFO").cyan().bold(), message));
}

/// Print a success message.
pub fn print_success(message: &str) {
    println!("{}", status_line(style("OK").green().bold(), message));
}

/// Print a warning message.
pub fn print_warning(message: &str) {
    println!("{}", status_line(style("WARN").yellow().bold(), message));
}

/// Print an error message to stderr.
pub fn print_error(message: &str) {
    eprintln!("{}", status_line(style("ERROR").red().bold(), message));
}

/// Print the application banner.
pub fn print_banner() {
    let banner = r#"
╔═══════════════════════════════════════════════════════╗
║     X Likes Exporter                                  ║
║     Liked posts to JSON, CSV, Markdown, HTML, Excel   ║
╚═══════════════════════════════════════════════════════╝
"#;
    println!("{}", style(banner).cyan());
}

/// Print the settings a run is about to use.
pub fn print_config_summary(user_id: &str, config: &Config) {
    let formats: Vec<String> = config.export.formats.iter().map(|f| f.to_string()).collect();
    let media = if config.download.enabled {
        format!("download ({} workers)", config.download.workers)
    } else {
        "skip".to_string()
    };

    println!();
    println!("{}", style("Configuration:").bold());
    println!("  User:      {}", user_id);
    println!("  Formats:   {}", formats.join(", "));
    println!("  Directory: {}", config.export.output_directory.display());
    println!("  Media:     {}", media);
    println!("  Page size: {}", config.fetch.page_size);
    if let Some(timeout) = config.fetch.run_timeout_secs {
        println!("  Timeout:   {}s", timeout);
    }
    println!();
}
