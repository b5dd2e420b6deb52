//! HTTP server exposing the answer tracker.
//!
//! Every route sits behind the Basic authentication gate. The server runs on
//! a spawned task and stops when its handle is told to.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::access_gate::{require_basic_auth, AccessGate};
use crate::commands;
use crate::AppState;

/// Handle for a running server
pub struct ServerHandle {
    /// Address the server is listening on
    pub addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl ServerHandle {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop accepting connections and wait for in-progress requests
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Err(e) = self.task.await {
            log::warn!("Server task ended abnormally: {}", e);
        }
    }
}

/// Build the application router
pub fn router(state: AppState, gate: AccessGate) -> Router {
    Router::new()
        .route("/answers", get(commands::list_answers))
        .route("/answers/correct", post(commands::add_correct_answer))
        .route("/answers/missed", post(commands::add_missed_answer))
        .route("/answers/{id}", get(commands::get_answer))
        .route("/answers/{id}/visibility", post(commands::toggle_visibility))
        .route(
            "/answers/{id}/study-material",
            post(commands::reveal_study_material),
        )
        .route("/answers/{id}/status", get(commands::lookup_status))
        .route("/answers/{id}/info", get(commands::additional_info))
        .layer(middleware::from_fn_with_state(
            Arc::new(gate),
            require_basic_auth,
        ))
        .with_state(state)
}

/// Bind `bind` and start serving.
pub async fn start_server(
    bind: &str,
    state: AppState,
    gate: AccessGate,
) -> std::io::Result<ServerHandle> {
    if !gate.is_configured() {
        log::warn!("AUTH_USER/AUTH_PASS are not set; every request will be rejected");
    }

    let app = router(state, gate);

    let listener = TcpListener::bind(bind).await?;
    let addr = listener.local_addr()?;

    log::info!("Answer tracker listening on http://{}", addr);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                log::info!("Answer tracker shutting down");
            })
            .await;
        if let Err(e) = result {
            log::error!("Server error: {}", e);
        }
    });

    Ok(ServerHandle {
        addr,
        shutdown_tx: Some(shutdown_tx),
        task,
    })
}
