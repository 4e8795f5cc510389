//! Arbor CLI Library
//!
//! Command implementations behind the `arbor` binary.
//!
//! # Modules
//!
//! - [`cmd`] - Command implementations (build, new, init, serve)
//! - [`server`] - Development server with live reload
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use arbor::cmd::{self, BuildArgs};
//!
//! cmd::build::run(Path::new("."), &BuildArgs::default()).unwrap();
//! ```

pub mod cmd;
pub mod server;

pub use arbor_core::Config;
pub use arbor_generator::{BuildRequest, BuildStats, Builder};

/// Initialize tracing with the specified verbosity level.
///
/// `verbose` maps 0 to WARN, 1 to INFO, 2 to DEBUG and 3+ to TRACE.
/// `RUST_LOG` directives are honored on top of it.
pub fn init_tracing(verbose: u8) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}
