//! X Likes Exporter - CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use indicatif::MultiProgress;
use tracing_subscriber::{fmt, EnvFilter};

use x_likes_exporter::{
    api::{load_cookies, CredentialContext, XApi},
    cli::Args,
    config::{validate_config, Config},
    download::MediaDownloader,
    error::{exit_codes, Error, Result},
    export::export_all,
    fetch::{CheckpointStore, FetchEngine},
    fs::OutputLayout,
    output::{
        create_item_bar, create_spinner, fetch_message, print_banner, print_config_summary,
        print_error, print_info, print_stats, print_success, print_summary, print_warning,
        ExportStats,
    },
    record::Record,
    shutdown::{install_ctrl_c_handler, Shutdown},
};

/// How a run that did not fail ended.
enum RunStatus {
    Completed,
    Cancelled,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(RunStatus::Completed) => ExitCode::from(exit_codes::SUCCESS as u8),
        Ok(RunStatus::Cancelled) => ExitCode::from(exit_codes::ABORT as u8),
        Err(e) => {
            print_error(&format!("{}", e));
            ExitCode::from(exit_code(&e) as u8)
        }
    }
}

fn exit_code(error: &Error) -> i32 {
    match error {
        Error::Config(_)
        | Error::ConfigValidation { .. }
        | Error::MissingConfig(_)
        | Error::AuthConfig(_)
        | Error::TomlParse(_) => exit_codes::CONFIG_ERROR,
        Error::Authentication(_)
        | Error::Api(_)
        | Error::Transient(_)
        | Error::RateLimited { .. }
        | Error::Http(_) => exit_codes::API_ERROR,
        Error::FetchAborted(_) => exit_codes::FETCH_ABORTED,
        Error::Download(_) | Error::Image(_) => exit_codes::DOWNLOAD_ERROR,
        Error::Export(_) | Error::Csv(_) | Error::Excel(_) => exit_codes::EXPORT_ERROR,
        _ => exit_codes::UNEXPECTED_ERROR,
    }
}

async fn run() -> Result<RunStatus> {
    // Parse CLI arguments
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    fmt().with_env_filter(filter).with_target(false).init();

    print_banner();

    // Load configuration
    let (mut config, loaded) = Config::load_or_default(&args.config)?;
    if !loaded {
        print_warning(&format!(
            "Configuration file not found: {}",
            args.config.display()
        ));
        print_info("Using default configuration with CLI arguments");
    }

    args.merge_into_config(&mut config);
    validate_config(&config)?;

    let user_id = args.user_id.trim().to_string();
    let layout = config.output_layout();
    let checkpoints = CheckpointStore::new(layout.root());

    if args.checkpoint_info {
        show_checkpoint_info(&checkpoints);
        return Ok(RunStatus::Completed);
    }

    if args.clear_checkpoint {
        if checkpoints.exists() {
            checkpoints.clear()?;
            print_success("Checkpoint cleared");
        } else {
            print_info("No checkpoint to clear");
        }
        return Ok(RunStatus::Completed);
    }

    // Credentials are checked before any request is made.
    let cookies = load_cookies(&args.cookies)?;
    let credentials = CredentialContext::with_bearer(&cookies, &config.auth.bearer_token)?;
    tracing::debug!("Loaded {} cookies", cookies.len());

    print_config_summary(&user_id, &config);

    let mut shutdown = Shutdown::new();
    if let Some(timeout) = config.run_timeout() {
        shutdown = shutdown.with_timeout(timeout);
    }
    install_ctrl_c_handler(shutdown.clone());

    let resume = if args.resume {
        match checkpoints.load() {
            Some((checkpoint, records)) if checkpoint.is_valid_for(&user_id) => {
                print_info(&format!("Resuming: {}", checkpoint.progress_line()));
                Some((checkpoint.cursor, records))
            }
            Some(_) => {
                print_warning("Checkpoint belongs to a different user, starting fresh");
                checkpoints.clear()?;
                None
            }
            None => {
                print_info("No checkpoint found, starting fresh");
                None
            }
        }
    } else {
        if checkpoints.exists() {
            print_info("A checkpoint exists for this output directory; pass --resume to continue it");
        }
        None
    };

    print_info("Fetching liked posts...");

    // Media downloads run inside the engine while the fetch spinner is still up.
    let bars = MultiProgress::new();
    let spinner = bars.add(create_spinner("Fetching first page..."));
    let media_bar = bars.add(create_item_bar(0, "Media"));

    let api = XApi::new(credentials, config.client_options())?;
    let downloader = MediaDownloader::new(
        api.http_client().clone(),
        &layout,
        config.download_options(),
    )
    .with_progress(media_bar.clone());

    let download_media = config.download.enabled;
    let store = checkpoints.clone();
    let mut engine = FetchEngine::new(api, config.fetch_options(), shutdown.clone())
        .with_downloader(downloader)
        .with_checkpoint(Box::new(move |user, cursor, records| {
            if let Err(e) = store.save(user, cursor, records, download_media) {
                tracing::warn!("Failed to save checkpoint: {}", e);
            }
        }));
    if let Some((cursor, records)) = resume {
        engine = engine.with_resume(cursor, records);
    }

    let progress_spinner = spinner.clone();
    let mut on_progress = move |collected: usize, fetched: usize| {
        progress_spinner.set_message(fetch_message(collected, fetched));
    };

    let result = engine
        .run(
            &user_id,
            config.fetch.page_size,
            download_media,
            Some(&mut on_progress),
        )
        .await;
    spinner.finish_and_clear();
    media_bar.finish_and_clear();

    match result {
        Ok(outcome) => {
            let records = outcome.records.as_slice();
            let stats = ExportStats::from_records(records);
            print_summary(&outcome.report, &stats, outcome.downloads.as_ref());

            export_records(records, &layout, &config)?;

            if config.export.show_stats {
                print_stats(&stats);
            }

            if outcome.report.cancelled {
                print_warning(&format!(
                    "Run interrupted with {} posts; pass --resume to continue",
                    records.len()
                ));
                return Ok(RunStatus::Cancelled);
            }

            checkpoints.clear()?;
            print_success(&format!("Exported {} liked posts", records.len()));
            Ok(RunStatus::Completed)
        }
        Err(Error::FetchAborted(aborted)) => {
            print_error(&format!(
                "Fetch aborted: {}. Exporting the {} posts collected so far",
                aborted.reason,
                aborted.records.len()
            ));
            export_records(aborted.records.as_slice(), &layout, &config)?;
            print_info("Progress saved; pass --resume to continue");
            Err(Error::FetchAborted(aborted))
        }
        Err(e) => Err(e),
    }
}

fn export_records(records: &[Record], layout: &OutputLayout, config: &Config) -> Result<()> {
    let report = export_all(records, layout, &config.export);

    for path in &report.written {
        tracing::debug!("Wrote {}", path.display());
    }

    if report.is_success() {
        print_success(&format!(
            "Wrote {} file(s) to {}",
            report.written.len(),
            layout.root().display()
        ));
        return Ok(());
    }

    let failures: Vec<String> = report
        .errors
        .iter()
        .map(|(format, e)| format!("{}: {}", format, e))
        .collect();
    Err(Error::Export(failures.join("; ")))
}

fn show_checkpoint_info(checkpoints: &CheckpointStore) {
    match checkpoints.info() {
        Some(checkpoint) => {
            print_info(&format!("Checkpoint: {}", checkpoint.progress_line()));
            print_info(&format!(
                "Cursor: {}",
                checkpoint.cursor.as_deref().unwrap_or("(none)")
            ));
            print_info(&format!(
                "Media download: {}",
                if checkpoint.download_media { "yes" } else { "no" }
            ));
        }
        None => print_info("No checkpoint found"),
    }
}
