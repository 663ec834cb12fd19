//! The single-page web form that labels an issue from its title and
//! description.

mod handlers;
mod page;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{routing::get, Router};
use log::info;

use crate::labeler::IssueLabeler;
use crate::model_manager::DEFAULT_MODEL_PATH;

pub use handlers::InputForm;
pub use page::IndexPage;

/// Settings for the web server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Model to serve; `None` runs the form without predictions
    pub model_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            model_path: Some(PathBuf::from(DEFAULT_MODEL_PATH)),
        }
    }
}

/// Shared state of the request handlers.
#[derive(Clone, Default)]
pub struct AppState {
    labeler: Option<Arc<IssueLabeler>>,
}

impl AppState {
    pub fn new(labeler: IssueLabeler) -> Self {
        Self {
            labeler: Some(Arc::new(labeler)),
        }
    }

    /// State for the form without a model: submissions render the page
    /// without attempting a prediction.
    pub fn starter() -> Self {
        Self::default()
    }

    pub fn has_model(&self) -> bool {
        self.labeler.is_some()
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index).post(handlers::submit))
        .with_state(state)
}

/// Binds `addr` and serves the form until the process is stopped.
pub async fn serve(state: AppState, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        "Serving issue labeler on http://{} ({})",
        listener.local_addr()?,
        if state.has_model() { "model loaded" } else { "starter mode, no model" }
    );
    axum::serve(listener, build_router(state)).await
}
