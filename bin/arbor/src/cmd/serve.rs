//! Serve command - development server with rebuild on change

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, Instant},
};

use arbor_generator::{BuildRequest, BuildStats, Builder};
use color_eyre::eyre::{Result, WrapErr};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::{net::TcpListener, sync::mpsc};

use super::{BuildArgs, CONFIG_FILE, build_request, print_build_stats};
use crate::server::{ServerState, create_router, inject_livereload};

/// Debounce interval for file changes.
const DEBOUNCE_MS: u64 = 200;

/// Run the serve command.
pub async fn run(site_dir: &Path, args: &BuildArgs, port: u16, open_browser: bool) -> Result<()> {
    tracing::info!(site = %site_dir.display(), port, "starting dev server");

    let request = build_request(site_dir, args)?;
    let output_dir = request.destination.clone();
    let stats = build_and_inject(&request)?;
    print_build_stats(&stats, &output_dir);

    let state = Arc::new(ServerState::new());

    let (tx, mut rx) = mpsc::channel::<()>(16);
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<notify::Event>| {
            if let Ok(event) = res
                && matches!(
                    event.kind,
                    EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
                )
            {
                let _ = tx.blocking_send(());
            }
        },
        notify::Config::default(),
    )
    .wrap_err("Failed to create file watcher")?;

    for path in watched_paths(&request) {
        let mode = if path.is_dir() {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        watcher
            .watch(&path, mode)
            .wrap_err_with(|| format!("Failed to watch {}", path.display()))?;
        tracing::debug!(path = %path.display(), "watching");
    }

    let rebuild_state = state.clone();
    let rebuild_site = site_dir.to_path_buf();
    let rebuild_args = args.clone();
    tokio::spawn(async move {
        let mut last_rebuild = Instant::now();

        while rx.recv().await.is_some() {
            if last_rebuild.elapsed() < Duration::from_millis(DEBOUNCE_MS) {
                continue;
            }
            while rx.try_recv().is_ok() {}

            println!();
            println!("  File change detected, rebuilding...");

            // Config edits take effect on the next rebuild.
            let result = build_request(&rebuild_site, &rebuild_args)
                .and_then(|request| build_and_inject(&request));
            match result {
                Ok(stats) => {
                    println!(
                        "  ✓ Rebuilt {} pages in {}ms",
                        stats.pages + stats.list_pages + stats.taxonomy_pages,
                        stats.duration_ms
                    );
                    rebuild_state.notify_reload();
                }
                Err(e) => {
                    tracing::error!(error = %e, "rebuild failed");
                    eprintln!("  ✗ Rebuild failed: {e:#}");
                }
            }

            last_rebuild = Instant::now();
        }
    });

    let app = create_router(&output_dir, state);
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr)
        .await
        .wrap_err_with(|| format!("Failed to bind to {addr}"))?;

    println!();
    println!("  Dev server running at http://{addr}");
    println!("  Press Ctrl+C to stop");
    println!();

    if open_browser && let Err(e) = open::that(format!("http://{addr}")) {
        tracing::warn!(error = %e, "could not open browser");
    }

    // Dropping the watcher stops notifications.
    let _watcher = watcher;

    axum::serve(listener, app).await.wrap_err("Server error")?;
    Ok(())
}

/// Build, then add the reload script to the written pages.
fn build_and_inject(request: &BuildRequest) -> Result<BuildStats> {
    let stats = Builder::new(request.clone())
        .build()
        .wrap_err("Build failed")?;
    inject_livereload(&request.destination)?;
    Ok(stats)
}

/// Existing inputs of a build: config, content or docs mounts, layouts,
/// themes and static files.
fn watched_paths(request: &BuildRequest) -> Vec<PathBuf> {
    let site_dir = &request.site_dir;
    let build = &request.config.build;

    let mut paths = vec![site_dir.join(CONFIG_FILE)];
    match &request.config.docs {
        Some(docs) => paths.extend(docs.mounts.iter().map(|m| site_dir.join(&m.source_dir))),
        None => paths.push(request.content_dir()),
    }
    paths.push(site_dir.join(&build.layout_dir));
    paths.push(site_dir.join(&build.themes_dir));
    paths.push(request.static_dir());

    paths.retain(|path| path.exists() && !path.starts_with(&request.destination));
    paths
}
