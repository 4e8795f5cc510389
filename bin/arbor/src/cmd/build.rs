//! Build command - generates the site

use std::path::Path;

use arbor_generator::{BuildStats, Builder};
use color_eyre::eyre::{Result, WrapErr};

use super::{BuildArgs, build_request, print_build_stats};

/// Run the build command.
pub fn run(site_dir: &Path, args: &BuildArgs) -> Result<BuildStats> {
    tracing::info!(
        site = %site_dir.display(),
        drafts = args.build_drafts,
        "starting build"
    );

    let request = build_request(site_dir, args)?;
    let destination = request.destination.clone();
    let stats = Builder::new(request).build().wrap_err("Build failed")?;

    print_build_stats(&stats, &destination);
    Ok(stats)
}
