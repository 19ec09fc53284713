//! CLI entry point for the shopsync tool.

use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use shopsync_core::files::FileOutcome;
use shopsync_core::rewrite::clean_description;
use shopsync_core::sync::{MetafieldPurge, SyncEngine, SyncOutcome};
use shopsync_core::{ApiClient, StoreConfig, Uploader};
use tracing::{debug, info};

mod cli;

use cli::{Args, Command, StoreArgs};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Determine log level based on verbose/quiet flags
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");

    match args.command {
        Command::CleanDescriptions {
            store,
            continue_on_error,
        } => run_clean_descriptions(&store, continue_on_error).await,
        Command::UploadFiles {
            store,
            folder,
            fail_fast,
        } => run_upload_files(&store, &folder, fail_fast).await,
        Command::PurgeMetafields {
            store,
            kind,
            prefix,
            fail_fast,
        } => run_purge_metafields(&store, kind.into(), &prefix, fail_fast).await,
    }
}

/// Builds the API client for a subcommand's store arguments.
fn build_client(store: &StoreArgs) -> ApiClient {
    let config =
        StoreConfig::new(&store.store, &store.token).with_api_version(&store.api_version);
    info!(store = config.store(), api_version = config.api_version(), "connecting");
    ApiClient::new(config)
}

/// Spinner used while streaming items of unknown total count.
fn progress_spinner(message: &'static str) -> ProgressBar {
    let bar = ProgressBar::new_spinner().with_message(message);
    bar.set_style(
        ProgressStyle::with_template("{spinner} {msg} ({pos})")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar
}

async fn run_clean_descriptions(store: &StoreArgs, continue_on_error: bool) -> Result<()> {
    let client = build_client(store);
    let engine = SyncEngine::new(&client).continue_on_error(continue_on_error);

    let bar = progress_spinner("Cleaning descriptions");
    let report = engine
        .clean_descriptions(clean_description, |product, outcome| {
            match outcome {
                SyncOutcome::Updated => bar.println(format!("updated: {}", product.title)),
                SyncOutcome::Failed(error) => {
                    bar.println(format!("failed: {} ({error})", product.title));
                }
                SyncOutcome::Skipped => {}
            }
            bar.inc(1);
        })
        .await;
    bar.finish_and_clear();

    let report = report?;
    println!(
        "Done! {} updated, {} unchanged, {} failed, total {}.",
        report.updated,
        report.skipped,
        report.failed,
        report.total()
    );
    Ok(())
}

async fn run_upload_files(
    store: &StoreArgs,
    folder: &std::path::Path,
    fail_fast: bool,
) -> Result<()> {
    let client = build_client(store);
    let uploader = Uploader::new(&client).continue_on_error(!fail_fast);

    let bar = progress_spinner("Uploading files");
    let report = uploader
        .upload_folder(folder, |file, outcome| {
            match outcome {
                FileOutcome::Uploaded(_) => bar.println(format!("uploaded: {}", file.name)),
                FileOutcome::Failed(error) => {
                    bar.println(format!("failed: {} ({error})", file.name));
                }
                FileOutcome::Skipped => {}
            }
            bar.inc(1);
        })
        .await;
    bar.finish_and_clear();

    let report = report?;
    if report.total() == 0 {
        println!("Nothing to upload.");
    } else {
        println!(
            "Done! {} uploaded, {} already present, {} failed, total {}.",
            report.uploaded,
            report.skipped,
            report.failed,
            report.total()
        );
    }
    Ok(())
}

async fn run_purge_metafields(
    store: &StoreArgs,
    kind: shopsync_core::sync::ResourceKind,
    prefix: &str,
    fail_fast: bool,
) -> Result<()> {
    let client = build_client(store);
    let purge = MetafieldPurge::new(&client)
        .with_prefix(prefix)
        .continue_on_error(!fail_fast);

    let bar = progress_spinner("Scanning metafields");
    let report = purge.run(kind, |_| bar.inc(1)).await;
    bar.finish_and_clear();

    let report = report?;
    println!(
        "Done! {} scanned, {} metafields deleted, {} failed.",
        report.scanned, report.deleted, report.failed
    );
    Ok(())
}
