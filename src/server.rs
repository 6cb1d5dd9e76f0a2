//! Axum-based HTTP server for the gateway.

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Multipart, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::Instrument;
use uuid::Uuid;

use crate::ai::{mime, GenerativeModel};
use crate::gateway::ModelGateway;
use crate::models::{Answer, Config, Diagnostics, ImageQuery, Message, TextQuery};
use crate::{Error, Result};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub gateway: ModelGateway,
    pub config: Arc<Config>,
}

/// Gateway server.
pub struct GatewayServer {
    config: Arc<Config>,
    state: AppState,
}

impl GatewayServer {
    pub fn new(config: Config, model: Arc<dyn GenerativeModel>) -> Self {
        let config = Arc::new(config);
        Self {
            state: AppState {
                gateway: ModelGateway::new(model),
                config: config.clone(),
            },
            config,
        }
    }

    /// Build the Axum router.
    pub fn build_router(&self) -> Router {
        Router::new()
            .route("/", get(root_handler))
            .route("/api/hello", get(hello_handler))
            .route("/test", get(diagnostics_handler))
            .route("/api/solve/text", post(solve_text_handler))
            .route(
                "/api/solve/image",
                post(solve_image_handler)
                    .layer(DefaultBodyLimit::max(self.config.max_upload_bytes)),
            )
            .with_state(self.state.clone())
            .layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            )
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server until Ctrl+C or SIGTERM.
    pub async fn run(self) -> Result<()> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        tracing::info!(addr = %addr, "Gateway server starting");

        axum::serve(listener, self.build_router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Gateway server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        () = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}

// =============================================================================
// Handlers
// =============================================================================

async fn root_handler() -> impl IntoResponse {
    Json(Message {
        message: "Hello from FastAPI Backend!".to_string(),
    })
}

async fn hello_handler() -> impl IntoResponse {
    Json(Message {
        message: "Hello from the backend API!".to_string(),
    })
}

/// Backend and database availability report.
async fn diagnostics_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(Diagnostics::from_config(&state.config))
}

async fn solve_text_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<TextQuery>, JsonRejection>,
) -> Result<Json<Answer>> {
    let span = tracing::info_span!("solve_text", request_id = %Uuid::new_v4());

    async move {
        let Json(payload) = payload.map_err(|e| {
            Error::InvalidInput(format!("Invalid request body: {}", e.body_text()))
        })?;
        let answer = state.gateway.solve_text(&payload).await?;
        tracing::info!(answer_len = answer.answer.len(), "Text problem solved");
        Ok::<_, Error>(Json(answer))
    }
    .instrument(span)
    .await
}

async fn solve_image_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<Answer>> {
    let span = tracing::info_span!("solve_image", request_id = %Uuid::new_v4());

    async move {
        let query = read_image_upload(multipart).await?;
        let answer = state.gateway.solve_image(&query).await?;
        tracing::info!(answer_len = answer.answer.len(), "Image problem solved");
        Ok::<_, Error>(Json(answer))
    }
    .instrument(span)
    .await
}

/// Read the `image` file and optional `query` field, buffering the upload.
async fn read_image_upload(mut multipart: Multipart) -> Result<ImageQuery> {
    let mut image: Option<(Vec<u8>, Option<String>)> = None;
    let mut query: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::InvalidInput(format!("Invalid multipart body: {}", e.body_text())))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "image" => {
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(|e| {
                    Error::InvalidInput(format!("Failed to read image upload: {}", e.body_text()))
                })?;
                image = Some((bytes.to_vec(), content_type));
            }
            "query" => {
                let text = field.text().await.map_err(|e| {
                    Error::InvalidInput(format!("Failed to read query field: {}", e.body_text()))
                })?;
                query = Some(text);
            }
            _ => {
                tracing::trace!("Ignoring unknown multipart field: {}", name);
            }
        }
    }

    let (image, content_type) =
        image.ok_or_else(|| Error::InvalidInput("Missing image upload".to_string()))?;
    let media_type = mime::resolve_image_mime(content_type.as_deref(), &image);

    Ok(ImageQuery {
        image,
        media_type,
        query,
    })
}
