use crate::Config;
use anyhow::Result;
use axum::extract::multipart::MultipartError;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use iconpack::{IconPackager, SourceImage};
use std::sync::Arc;
use tokio::task::JoinError;
use tower_http::trace::TraceLayer;

static INDEX: &str = include_str!("../assets/index.html");

/// Form field carrying the uploaded image.
const IMAGE_FIELD: &str = "image";

#[derive(Clone)]
struct AppState {
    packager: Arc<IconPackager>,
}

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("invalid upload: {}", .0.body_text())]
    Upload(#[from] MultipartError),
    #[error("missing form field `{}`", IMAGE_FIELD)]
    MissingImage,
    #[error(transparent)]
    Pack(#[from] iconpack::Error),
    #[error("packaging aborted: {0}")]
    Worker(#[from] JoinError),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Upload(err) => err.status(),
            Self::MissingImage => StatusCode::BAD_REQUEST,
            Self::Pack(err) if err.is_client_error() => StatusCode::BAD_REQUEST,
            Self::Pack(_) | Self::Worker(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::info!("rejected upload: {}", self);
        }
        (status, self.to_string()).into_response()
    }
}

pub fn router(packager: Arc<IconPackager>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/iconize", post(iconize))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { packager })
}

pub async fn serve(config: Config) -> Result<()> {
    let packager = IconPackager::default()
        .compression(config.compression)
        .parallel(config.parallel);
    let router = router(Arc::new(packager), config.max_upload_bytes);
    let listener = tokio::net::TcpListener::bind(config.address).await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c().await.ok();
    tracing::info!("shutting down");
}

async fn index() -> Html<&'static str> {
    Html(INDEX)
}

async fn iconize(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, ServerError> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(IMAGE_FIELD) {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let bytes = field.bytes().await?;
            upload = Some((file_name, bytes));
            break;
        }
    }
    let (file_name, bytes) = upload.ok_or(ServerError::MissingImage)?;
    tracing::info!("iconizing {:?} ({} bytes)", file_name, bytes.len());

    let packager = state.packager.clone();
    let (archive_name, archive) = tokio::task::spawn_blocking(move || {
        let source = SourceImage::decode(&file_name, &bytes)?;
        let archive = packager.pack(&source)?;
        Ok::<_, iconpack::Error>((source.archive_name(), archive))
    })
    .await??;
    tracing::info!("sending {} ({} bytes)", archive_name, archive.len());

    let headers = [
        (header::CONTENT_TYPE, "application/zip".to_string()),
        (header::CONTENT_DISPOSITION, content_disposition(&archive_name)),
    ];
    Ok((headers, archive).into_response())
}

fn content_disposition(file_name: &str) -> String {
    let file_name: String = file_name
        .chars()
        .filter(|c| !c.is_control() && *c != '"' && *c != '\\')
        .collect();
    format!("inline; filename=\"{}\"", file_name)
}
