//! # Import API Handlers
//!
//! Submission and polling endpoints for the bulk-import pipeline. A
//! submission validates authorization and the uploaded file synchronously,
//! allocates a job in the registry, answers with the job id, and detaches
//! the actual run. All further observation goes through the polling
//! endpoint; there is no push notification and no cancellation.

use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::{AuthContext, Role};
use crate::error::{ApiError, not_found, validation_error};
use crate::import::{ImportMode, ImportRunner, ImportSnapshot};
use crate::repositories::CatalogItemRepository;
use crate::server::AppState;

/// Query parameters for the submit endpoint
#[derive(Debug, Deserialize)]
pub struct SubmitImportQuery {
    /// Import variant to run (one of: quantities, items, details)
    pub mode: String,
}

/// Response payload for a accepted import submission
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubmitImportResponse {
    /// Identifier used to poll the import's progress
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub import_id: Uuid,
}

/// Submit a tabular file for asynchronous import
#[utoipa::path(
    post,
    path = "/imports",
    security(("bearer_auth" = [])),
    params(
        ("mode" = String, Query, description = "Import variant: quantities, items or details")
    ),
    responses(
        (status = 202, description = "Import accepted; poll /imports/{id} for progress", body = SubmitImportResponse),
        (status = 400, description = "Missing file or invalid mode", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 403, description = "Caller role does not allow this variant", body = ApiError)
    ),
    tag = "imports"
)]
pub async fn submit_import(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(params): Query<SubmitImportQuery>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<SubmitImportResponse>), ApiError> {
    let Some(mode) = ImportMode::from_slug(&params.mode) else {
        return Err(validation_error(
            "Invalid import mode",
            serde_json::json!({ "mode": "Must be one of: quantities, items, details" }),
        ));
    };

    // Field updates may also be run by controllers; everything else is
    // admin-only.
    match mode {
        ImportMode::Details => auth.require_any(&[Role::Admin, Role::Controller])?,
        _ => auth.require_admin()?,
    }

    let mut file: Option<Vec<u8>> = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("file") {
            file = Some(field.bytes().await?.to_vec());
        }
    }

    let Some(data) = file.filter(|data| !data.is_empty()) else {
        return Err(validation_error(
            "Missing upload",
            serde_json::json!({ "file": "A non-empty 'file' part is required" }),
        ));
    };

    let job = state.imports.register(mode);
    let store = Arc::new(CatalogItemRepository::new(state.db.clone()));
    let runner = ImportRunner::new(store, Arc::clone(&job), state.config.import.batch_size);

    tracing::info!(
        import_id = %job.id,
        mode = %mode,
        bytes = data.len(),
        "Import accepted"
    );

    // Detached from the request lifecycle; the job record is the only
    // channel back to the HTTP layer.
    tokio::spawn(runner.run(data));

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitImportResponse { import_id: job.id }),
    ))
}

/// Poll the progress of an import run
#[utoipa::path(
    get,
    path = "/imports/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Import identifier returned by the submit endpoint")),
    responses(
        (status = 200, description = "Point-in-time snapshot of the import", body = ImportSnapshot),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Unknown import id (never existed, evicted, or process restarted)", body = ApiError)
    ),
    tag = "imports"
)]
pub async fn import_status(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<ImportSnapshot>, ApiError> {
    let job = state
        .imports
        .get(id)
        .ok_or_else(|| not_found("Import not found"))?;

    Ok(Json(job.snapshot()))
}
