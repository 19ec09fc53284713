//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use shopsync_core::config::DEFAULT_API_VERSION;
use shopsync_core::sync::{DEFAULT_NAMESPACE_PREFIX, ResourceKind};

/// Bulk clean and upload tooling for the Shopify Admin API.
///
/// Shopsync enumerates a store's resources page by page, rewrites what needs
/// rewriting, uploads what is missing, and stays inside the API's request
/// quotas while doing it.
#[derive(Parser, Debug)]
#[command(name = "shopsync")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Store addressing shared by every subcommand.
#[derive(clap::Args, Debug, Clone)]
pub struct StoreArgs {
    /// Store handle ("mystore" or "mystore.myshopify.com")
    #[arg(short, long)]
    pub store: String,

    /// Admin API access token (shpat_...)
    #[arg(short, long)]
    pub token: String,

    /// Admin API version segment
    #[arg(long, default_value = DEFAULT_API_VERSION)]
    pub api_version: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Rewrite CDN .jpeg image URLs to .jpg across all product descriptions
    CleanDescriptions {
        #[command(flatten)]
        store: StoreArgs,

        /// Keep going past per-product write failures
        #[arg(long)]
        continue_on_error: bool,
    },

    /// Upload a folder to the Files library, skipping files already present
    UploadFiles {
        #[command(flatten)]
        store: StoreArgs,

        /// Local folder whose files should be pushed
        folder: PathBuf,

        /// Halt on the first per-file failure
        #[arg(long)]
        fail_fast: bool,
    },

    /// Delete namespaced metafields (e.g. woo.*) from products or collections
    PurgeMetafields {
        #[command(flatten)]
        store: StoreArgs,

        /// Resource family to clean
        #[arg(long = "type", value_enum)]
        kind: ResourceKindArg,

        /// Namespace prefix to match
        #[arg(long, default_value = DEFAULT_NAMESPACE_PREFIX)]
        prefix: String,

        /// Halt on the first per-resource failure
        #[arg(long)]
        fail_fast: bool,
    },
}

/// CLI surface for [`ResourceKind`].
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKindArg {
    /// Clean product metafields
    Products,
    /// Clean custom-collection metafields
    Collections,
}

impl From<ResourceKindArg> for ResourceKind {
    fn from(kind: ResourceKindArg) -> Self {
        match kind {
            ResourceKindArg::Products => Self::Products,
            ResourceKindArg::Collections => Self::CustomCollections,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_clean_descriptions_parses() {
        let args = Args::try_parse_from([
            "shopsync",
            "clean-descriptions",
            "--store",
            "mystore",
            "--token",
            "shpat_x",
        ])
        .unwrap();
        match args.command {
            Command::CleanDescriptions {
                store,
                continue_on_error,
            } => {
                assert_eq!(store.store, "mystore");
                assert_eq!(store.api_version, DEFAULT_API_VERSION);
                assert!(!continue_on_error);
            }
            other => panic!("Expected clean-descriptions, got: {other:?}"),
        }
    }

    #[test]
    fn test_cli_upload_files_requires_folder() {
        let result = Args::try_parse_from([
            "shopsync",
            "upload-files",
            "--store",
            "mystore",
            "--token",
            "shpat_x",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_purge_metafields_kind_and_prefix() {
        let args = Args::try_parse_from([
            "shopsync",
            "purge-metafields",
            "--store",
            "mystore",
            "--token",
            "shpat_x",
            "--type",
            "collections",
        ])
        .unwrap();
        match args.command {
            Command::PurgeMetafields { kind, prefix, .. } => {
                assert_eq!(kind, ResourceKindArg::Collections);
                assert_eq!(prefix, "woo");
            }
            other => panic!("Expected purge-metafields, got: {other:?}"),
        }
    }

    #[test]
    fn test_cli_missing_token_is_error() {
        let result =
            Args::try_parse_from(["shopsync", "clean-descriptions", "--store", "mystore"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_verbose_flag_is_global() {
        let args = Args::try_parse_from([
            "shopsync",
            "clean-descriptions",
            "--store",
            "mystore",
            "--token",
            "shpat_x",
            "-vv",
        ])
        .unwrap();
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let result = Args::try_parse_from(["shopsync", "--help"]);
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }
}
