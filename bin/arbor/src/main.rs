//! Arbor CLI
//!
//! This is the binary entry point. The command implementations are in `lib.rs`.

use std::path::PathBuf;

use arbor::cmd::{self, BuildArgs};
use clap::Parser;
use color_eyre::eyre::Result;

/// Command-line interface for Arbor.
#[derive(Parser)]
#[command(name = "arbor", version, about = "A static site generator")]
struct Cli {
    /// Site directory holding config.toml
    #[arg(short, long, global = true, default_value = ".")]
    source: PathBuf,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(clap::Subcommand)]
enum Commands {
    /// Build the site
    Build(BuildArgs),
    /// Create a new content file
    New {
        /// Path under the content directory (e.g., posts/my-article)
        path: PathBuf,
        /// Archetype (post, page, section)
        #[arg(short, long, default_value = "post")]
        kind: String,
    },
    /// Create a new site skeleton
    Init {
        /// Overwrite files that already exist
        #[arg(long)]
        force: bool,
    },
    /// Build, serve and rebuild on change
    Serve {
        #[command(flatten)]
        build: BuildArgs,
        /// Port to listen on
        #[arg(short, long, default_value_t = 1313)]
        port: u16,
        /// Open browser automatically
        #[arg(long)]
        open: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    arbor::init_tracing(cli.verbose);

    match cli.command {
        Commands::Build(args) => {
            cmd::build::run(&cli.source, &args)?;
        }
        Commands::New { path, kind } => {
            cmd::new::run(&cli.source, &path, &kind)?;
        }
        Commands::Init { force } => {
            cmd::init::run(&cli.source, force)?;
        }
        Commands::Serve { build, port, open } => {
            cmd::serve::run(&cli.source, &build, port, open).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn test_cli_build_command_parsing() {
        let cli = Cli::parse_from(["arbor", "build", "--destination", "dist"]);

        assert_eq!(cli.source, PathBuf::from("."));
        assert_eq!(cli.verbose, 0);

        match cli.command {
            Commands::Build(args) => {
                assert_eq!(args.destination, Some(PathBuf::from("dist")));
                assert!(!args.build_drafts);
                assert!(!args.clean_destination_dir);
                assert!(args.base_url.is_none());
            }
            _ => panic!("Expected Build command"),
        }
    }

    #[test]
    fn test_cli_build_short_flags() {
        let cli = Cli::parse_from([
            "arbor",
            "build",
            "-D",
            "-d",
            "out",
            "-b",
            "https://example.org",
            "--clean-destination-dir",
        ]);

        match cli.command {
            Commands::Build(args) => {
                assert!(args.build_drafts);
                assert!(args.clean_destination_dir);
                assert_eq!(args.destination, Some(PathBuf::from("out")));
                assert_eq!(args.base_url.as_deref(), Some("https://example.org"));
            }
            _ => panic!("Expected Build command"),
        }
    }

    #[test]
    fn test_cli_global_source_after_subcommand() {
        let cli = Cli::parse_from(["arbor", "build", "-s", "site"]);
        assert_eq!(cli.source, PathBuf::from("site"));

        let cli = Cli::parse_from(["arbor", "--source", "docs-site", "init"]);
        assert_eq!(cli.source, PathBuf::from("docs-site"));
    }

    #[test]
    fn test_cli_serve_command_parsing() {
        let cli = Cli::parse_from(["arbor", "serve", "--port", "8080", "--open", "-D"]);

        match cli.command {
            Commands::Serve { build, port, open } => {
                assert_eq!(port, 8080);
                assert!(open);
                assert!(build.build_drafts);
            }
            _ => panic!("Expected Serve command"),
        }
    }

    #[test]
    fn test_cli_new_command_parsing() {
        let cli = Cli::parse_from(["arbor", "new", "posts/my-article", "--kind", "page"]);

        match cli.command {
            Commands::New { path, kind } => {
                assert_eq!(path, PathBuf::from("posts/my-article"));
                assert_eq!(kind, "page");
            }
            _ => panic!("Expected New command"),
        }
    }

    #[test]
    fn test_cli_verbosity_flags() {
        let cli = Cli::parse_from(["arbor", "-vvv", "build"]);
        assert_eq!(cli.verbose, 3);
    }
}
