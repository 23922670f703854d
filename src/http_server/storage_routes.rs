//! Storage HTTP Routes
//!
//! - `POST /upload` (Basic auth, multipart field `file`)
//! - `GET /download/:hash`
//! - `DELETE /delete/:hash` (Basic auth, owner only)

use std::sync::Arc;

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequestParts, Multipart, Path, State},
    http::{header, request::Parts, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

use crate::auth::{
    AccountId, AuthError, Authenticator, Credentials, PasswordAuthenticator, SqliteUserRepository,
};
use crate::auth::crypto::PasswordPolicy;
use crate::config::StoreConfig;
use crate::database::{Database, DatabaseError};
use crate::file_storage::{FileService, LocalBackend, SqliteLedger, StorageError};

// ==================
// Shared State
// ==================

/// Storage state shared across handlers
pub struct StorageState {
    pub file_service: FileService<LocalBackend, SqliteLedger>,
    pub authenticator: Arc<dyn Authenticator>,
}

/// Failure to open the state at startup
#[derive(Debug, Error)]
pub enum StateError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl StorageState {
    pub fn new(
        file_service: FileService<LocalBackend, SqliteLedger>,
        authenticator: Arc<dyn Authenticator>,
    ) -> Self {
        Self {
            file_service,
            authenticator,
        }
    }

    /// Open the object root and database named by `config`
    pub fn open(config: &StoreConfig) -> Result<Self, StateError> {
        let db = Arc::new(Database::open(&config.database_path())?);
        let backend = LocalBackend::open(config.storage_dir())?;
        backend.sweep_temp()?;

        let authenticator = PasswordAuthenticator::new(
            SqliteUserRepository::new(db.clone()),
            PasswordPolicy::default(),
        );

        Ok(Self::new(
            FileService::new(backend, SqliteLedger::new(db)),
            Arc::new(authenticator),
        ))
    }
}

// ==================
// Request/Response Types
// ==================

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub hash: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

/// Error returned by every storage handler
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let message = match &err {
            // identical for "absent" and "not yours"
            StorageError::NotFound(_) => "File not found".to_string(),
            other => other.to_string(),
        };
        Self::new(status, message)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.message,
            code: self.status.as_u16(),
        });
        let mut response = (self.status, body).into_response();
        if self.status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static("Basic realm=\"hashvault\""),
            );
        }
        response
    }
}

// ==================
// Authentication
// ==================

/// Account of a request carrying valid Basic credentials
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedAccount(pub AccountId);

#[async_trait]
impl FromRequestParts<Arc<StorageState>> for AuthenticatedAccount {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<StorageState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or(AuthError::MissingCredentials)?;
        let header = header.to_str().map_err(|_| AuthError::MalformedHeader)?;
        let credentials = Credentials::from_basic_header(header)?;

        // argon2 verification is CPU-bound
        let state = state.clone();
        let account = run_blocking(move || {
            state.authenticator.verify(&credentials).map_err(|e| {
                warn!(username = %credentials.username, error = %e, "Authentication failed");
                ApiError::from(e)
            })
        })
        .await?;

        Ok(Self(account))
    }
}

// ==================
// Storage Routes
// ==================

/// Create storage routes
pub fn storage_routes(state: Arc<StorageState>) -> Router {
    Router::new()
        .route("/upload", post(upload_file_handler))
        .route("/download/:hash", get(download_file_handler))
        .route("/delete/:hash", delete(delete_file_handler))
        .with_state(state)
}

async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!(error = %e, "Blocking task failed");
        ApiError::internal("Internal error")
    })?
}

async fn upload_file_handler(
    State(state): State<Arc<StorageState>>,
    AuthenticatedAccount(account): AuthenticatedAccount,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let mut content: Option<Bytes> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        ApiError::new(e.status(), format!("Error reading file: {}", e.body_text()))
    })? {
        if field.name() != Some("file") {
            continue;
        }
        let data = field.bytes().await.map_err(|e| {
            ApiError::new(e.status(), format!("Error reading file: {}", e.body_text()))
        })?;
        content = Some(data);
        break;
    }

    let content = content.ok_or_else(|| {
        ApiError::from(StorageError::InvalidInput("No file part".to_string()))
    })?;

    let receipt = run_blocking(move || Ok(state.file_service.upload(&content, &account)?)).await?;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            hash: receipt.digest.to_string(),
            message: "File added successfully".to_string(),
        }),
    ))
}

async fn download_file_handler(
    State(state): State<Arc<StorageState>>,
    Path(hash): Path<String>,
) -> Result<Response, ApiError> {
    let disposition = format!("attachment; filename=\"{}\"", hash);
    let data = run_blocking(move || Ok(state.file_service.download(&hash)?)).await?;

    let mut response = (StatusCode::OK, Bytes::from(data)).into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    // only reached for valid hex digests, which are always valid header text
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    Ok(response)
}

async fn delete_file_handler(
    State(state): State<Arc<StorageState>>,
    AuthenticatedAccount(account): AuthenticatedAccount,
    Path(hash): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    run_blocking(move || Ok(state.file_service.delete(&hash, &account)?)).await?;

    Ok(Json(MessageResponse {
        message: "File deleted".to_string(),
    }))
}
