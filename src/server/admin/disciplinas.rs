use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::auth::RequireTenantAdmin;
use crate::error::Error;
use crate::server::AppState;
use crate::server::dto::DisciplinaRequest;
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};
use crate::server::validation::validate_name;
use crate::types::Disciplina;

const DUPLICATE_DISCIPLINA: &str = "Já existe uma disciplina com este nome.";

fn map_duplicate(err: Error) -> ApiError {
    match err {
        Error::AlreadyExists => ApiError::conflict(DUPLICATE_DISCIPLINA),
        other => other.into(),
    }
}

/// GET /admin/disciplinas
pub async fn list_disciplinas(
    RequireTenantAdmin(ctx): RequireTenantAdmin,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let disciplinas = state
        .store
        .list_disciplinas(&ctx.tenant)
        .api_err("Falha ao listar as disciplinas.")?;

    Ok(Json(ApiResponse::success(disciplinas)))
}

/// POST /admin/disciplinas
pub async fn create_disciplina(
    RequireTenantAdmin(ctx): RequireTenantAdmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<DisciplinaRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let disciplina = Disciplina {
        id: uuid::Uuid::new_v4().to_string(),
        escola_id: ctx.tenant.as_str().to_string(),
        nome: validate_name(&req.nome, "O nome da disciplina")?,
    };

    state
        .store
        .create_disciplina(&ctx.tenant, &disciplina)
        .map_err(map_duplicate)?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(disciplina))))
}

/// PATCH /admin/disciplinas/{id}
pub async fn update_disciplina(
    RequireTenantAdmin(ctx): RequireTenantAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<DisciplinaRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut disciplina = state
        .store
        .get_disciplina(&ctx.tenant, &id)
        .api_err("Falha ao carregar a disciplina.")?
        .or_not_found("Disciplina não encontrada.")?;

    disciplina.nome = validate_name(&req.nome, "O nome da disciplina")?;
    state
        .store
        .update_disciplina(&ctx.tenant, &disciplina)
        .map_err(map_duplicate)?;

    Ok(Json(ApiResponse::success(disciplina)))
}

/// DELETE /admin/disciplinas/{id}
pub async fn delete_disciplina(
    RequireTenantAdmin(ctx): RequireTenantAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state
        .store
        .delete_disciplina(&ctx.tenant, &id)
        .api_err("Falha ao remover a disciplina.")?;

    if !deleted {
        return Err(ApiError::not_found("Disciplina não encontrada."));
    }

    Ok(StatusCode::NO_CONTENT)
}
