//! Command implementations.

pub mod build;
pub mod init;
pub mod new;
pub mod serve;

use std::path::{Path, PathBuf};

use arbor_core::Config;
use arbor_generator::{BuildRequest, BuildStats};
use color_eyre::eyre::{Result, WrapErr};

/// Name of the site configuration file.
pub const CONFIG_FILE: &str = "config.toml";

/// Flags shared by `build` and `serve`.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct BuildArgs {
    /// Output directory (default: the configured output_dir)
    #[arg(short, long)]
    pub destination: Option<PathBuf>,

    /// Override the site base URL
    #[arg(short, long)]
    pub base_url: Option<String>,

    /// Remove the output directory before building
    #[arg(long)]
    pub clean_destination_dir: bool,

    /// Include content marked as draft
    #[arg(short = 'D', long)]
    pub build_drafts: bool,
}

/// Load `config.toml` from the site directory, with `ARBOR__` overrides.
pub fn load_config(site_dir: &Path) -> Result<Config> {
    let path = site_dir.join(CONFIG_FILE);
    Config::load_with_env(&path)
        .wrap_err_with(|| format!("Failed to load configuration from {}", path.display()))
}

/// Build request for a site directory with command-line overrides applied.
pub fn build_request(site_dir: &Path, args: &BuildArgs) -> Result<BuildRequest> {
    let mut config = load_config(site_dir)?;

    if let Some(base_url) = &args.base_url {
        tracing::info!(base_url = %base_url, "overriding base URL from CLI");
        config.site.base_url = base_url.clone();
    }

    let mut request = BuildRequest::new(site_dir, config);
    if let Some(destination) = &args.destination {
        request = request.with_destination(destination);
    }
    if args.build_drafts {
        request = request.with_drafts(true);
    }
    if args.clean_destination_dir {
        request = request.with_clean_destination(true);
    }

    tracing::debug!(?request, "build request");
    Ok(request)
}

/// Print build statistics in a user-friendly format.
pub fn print_build_stats(stats: &BuildStats, destination: &Path) {
    println!();
    println!("  Build Statistics:");
    println!("  ─────────────────────────────────");
    println!("  Pages:        {:>6}", stats.pages);
    println!("  List pages:   {:>6}", stats.list_pages);
    println!("  Taxonomies:   {:>6}", stats.taxonomy_pages);
    println!("  Resources:    {:>6}", stats.resources);
    println!("  ─────────────────────────────────");
    println!("  Duration:     {:>6}ms", stats.duration_ms);
    println!("  Output:       {}", destination.display());
    println!();
}
