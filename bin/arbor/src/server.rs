//! Development server with live reload support

use std::{convert::Infallible, fs, path::Path, sync::Arc, time::Duration};

use axum::{
    Router,
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
};
use color_eyre::eyre::{Result, WrapErr};
use tokio::sync::broadcast;
use tokio_stream::{Stream, StreamExt, wrappers::BroadcastStream};
use tower_http::services::ServeDir;

/// Path of the live reload event stream.
pub const LIVERELOAD_PATH: &str = "/__livereload";

/// Server state containing the reload broadcaster.
#[derive(Debug, Clone)]
pub struct ServerState {
    reload_tx: broadcast::Sender<()>,
}

impl ServerState {
    pub fn new() -> Self {
        let (reload_tx, _) = broadcast::channel(16);
        Self { reload_tx }
    }

    /// Tell every connected browser to reload.
    pub fn notify_reload(&self) {
        let _ = self.reload_tx.send(());
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.reload_tx.subscribe()
    }
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new()
    }
}

/// Router serving the output directory plus the reload stream.
pub fn create_router(output_dir: &Path, state: Arc<ServerState>) -> Router {
    Router::new()
        .route(LIVERELOAD_PATH, get(livereload_handler))
        .fallback_service(ServeDir::new(output_dir))
        .with_state(state)
}

async fn livereload_handler(
    State(state): State<Arc<ServerState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // Lagged receivers skip the missed notifications.
    let stream = BroadcastStream::new(state.subscribe())
        .filter_map(|msg| msg.ok().map(|()| Ok(Event::default().data("reload"))));

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(30)).text("ping"))
}

/// Script injected into served pages.
pub const LIVERELOAD_SCRIPT: &str = r#"<script>
(function() {
    const source = new EventSource('/__livereload');
    source.onmessage = function(event) {
        if (event.data === 'reload') {
            window.location.reload();
        }
    };
    source.onerror = function() {
        console.log('[livereload] Connection lost, retrying...');
    };
})();
</script>
"#;

/// Add the reload script to every HTML file under `output_dir`.
///
/// Returns the number of files changed.
pub fn inject_livereload(output_dir: &Path) -> Result<usize> {
    let mut injected = 0;
    for entry in walkdir::WalkDir::new(output_dir)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "html"))
    {
        let path = entry.path();
        let content = fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
        if content.contains(LIVERELOAD_PATH) {
            continue;
        }

        let modified = match content.rfind("</body>") {
            Some(pos) => {
                let mut modified = content.clone();
                modified.insert_str(pos, LIVERELOAD_SCRIPT);
                modified
            }
            None => format!("{content}{LIVERELOAD_SCRIPT}"),
        };
        fs::write(path, modified).wrap_err_with(|| format!("Failed to write {}", path.display()))?;
        injected += 1;
    }

    tracing::debug!(files = injected, "live reload script injected");
    Ok(injected)
}
