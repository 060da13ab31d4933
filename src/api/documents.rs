//! Document endpoints. Responses carry the derived contract-expiry
//! flags, evaluated against the current date.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{DbPool, DocumentPayload, DocumentResponse, DocumentRow};
use crate::AppState;

use super::access::{self, caps, require_cap};
use super::auth::AuthUser;
use super::error::{ApiError, ValidationErrorBuilder};
use super::validation;

const DOC_SELECT: &str =
    "SELECT d.*, u.username AS uploaded_by_username
     FROM documents d
     LEFT JOIN users u ON u.id = d.uploaded_by";

fn validate_payload(payload: &DocumentPayload) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    if let Err(e) = validation::validate_required(&payload.title, "Title") {
        errors.add("title", e);
    }
    if let Err(e) = validation::parse_optional_date(&payload.effective_date, "Effective date") {
        errors.add("effective_date", e);
    }
    if let Err(e) =
        validation::parse_optional_date(&payload.contract_end_date, "Contract end date")
    {
        errors.add("contract_end_date", e);
    }
    errors.finish()
}

async fn fetch_document(pool: &DbPool, id: &str) -> Result<DocumentRow, ApiError> {
    let row: Option<DocumentRow> = sqlx::query_as(&format!("{} WHERE d.id = ?", DOC_SELECT))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.ok_or_else(|| ApiError::not_found("Document not found"))
}

/// List documents visible to the caller: everything for document
/// managers and staff, otherwise public documents plus ones linked to
/// the caller's employee profile or uploaded by the caller.
///
/// GET /api/documents
pub async fn list_documents(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<Vec<DocumentResponse>>, ApiError> {
    let rows: Vec<DocumentRow> = if access::can_view_all_documents(&user) {
        sqlx::query_as(&format!("{} ORDER BY d.uploaded_at DESC", DOC_SELECT))
            .fetch_all(&state.db)
            .await?
    } else {
        let employee_id = access::employee_id_for(&state.db, &user.user.id).await?;
        sqlx::query_as(&format!(
            "{} WHERE d.is_public = 1 OR d.uploaded_by = ? OR d.employee_id = ?
             ORDER BY d.uploaded_at DESC",
            DOC_SELECT
        ))
        .bind(&user.user.id)
        .bind(employee_id.unwrap_or_default())
        .fetch_all(&state.db)
        .await?
    };

    let today = Utc::now().date_naive();
    Ok(Json(
        rows.into_iter().map(|r| r.into_response(today)).collect(),
    ))
}

/// Upload a document record. The uploader is stamped from the caller.
///
/// POST /api/documents
pub async fn create_document(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<DocumentPayload>,
) -> Result<(StatusCode, Json<DocumentResponse>), ApiError> {
    require_cap(&user, caps::MANAGE_DOCUMENTS)?;
    validate_payload(&payload)?;

    let id = Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO documents
         (id, title, description, document_type, is_public, effective_date,
          contract_end_date, employee_id, uploaded_by, uploaded_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&payload.title)
    .bind(&payload.description)
    .bind(payload.document_type.to_string())
    .bind(payload.is_public)
    .bind(&payload.effective_date)
    .bind(&payload.contract_end_date)
    .bind(&payload.employee_id)
    .bind(&user.user.id)
    .bind(Utc::now().to_rfc3339())
    .execute(&state.db)
    .await?;

    tracing::info!(document_id = %id, "Document created");

    let row = fetch_document(&state.db, &id).await?;
    Ok((
        StatusCode::CREATED,
        Json(row.into_response(Utc::now().date_naive())),
    ))
}

/// Get a document
///
/// GET /api/documents/:id
pub async fn get_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    user: AuthUser,
) -> Result<Json<DocumentResponse>, ApiError> {
    let row = fetch_document(&state.db, &id).await?;

    if !access::can_view_all_documents(&user) && !row.is_public {
        let employee_id = access::employee_id_for(&state.db, &user.user.id).await?;
        let own_upload = row.uploaded_by.as_deref() == Some(&user.user.id);
        let own_employee =
            row.employee_id.is_some() && row.employee_id == employee_id;
        if !own_upload && !own_employee {
            return Err(ApiError::not_found("Document not found"));
        }
    }

    Ok(Json(row.into_response(Utc::now().date_naive())))
}

/// Replace a document's fields. The uploader and upload time never
/// change.
///
/// PUT /api/documents/:id
pub async fn update_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    user: AuthUser,
    Json(payload): Json<DocumentPayload>,
) -> Result<Json<DocumentResponse>, ApiError> {
    require_cap(&user, caps::MANAGE_DOCUMENTS)?;
    validate_payload(&payload)?;

    fetch_document(&state.db, &id).await?;

    sqlx::query(
        "UPDATE documents
         SET title = ?, description = ?, document_type = ?, is_public = ?,
             effective_date = ?, contract_end_date = ?, employee_id = ?
         WHERE id = ?",
    )
    .bind(&payload.title)
    .bind(&payload.description)
    .bind(payload.document_type.to_string())
    .bind(payload.is_public)
    .bind(&payload.effective_date)
    .bind(&payload.contract_end_date)
    .bind(&payload.employee_id)
    .bind(&id)
    .execute(&state.db)
    .await?;

    let row = fetch_document(&state.db, &id).await?;
    Ok(Json(row.into_response(Utc::now().date_naive())))
}

/// Delete a document
///
/// DELETE /api/documents/:id
pub async fn delete_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    user: AuthUser,
) -> Result<StatusCode, ApiError> {
    require_cap(&user, caps::MANAGE_DOCUMENTS)?;

    let result = sqlx::query("DELETE FROM documents WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Document not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}
