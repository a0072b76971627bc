use std::sync::Arc;

use axum::{
    Json,
    extract::{Multipart, State},
    response::IntoResponse,
};

use crate::auth::RequireTenantAdmin;
use crate::error::Error;
use crate::server::AppState;
use crate::server::dto::{UpdateEscolaRequest, UploadResponse};
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};
use crate::server::uploads::{UploadKind, remove_image, save_image};
use crate::server::validation::validate_name;

pub async fn update_escola(
    RequireTenantAdmin(ctx): RequireTenantAdmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdateEscolaRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut escola = ctx.escola;

    if let Some(nome) = req.nome {
        escola.nome = validate_name(&nome, "O nome da escola")?;
    }
    if let Some(endereco) = req.endereco {
        escola.set_endereco(endereco);
    }

    state.store.update_escola(&escola).map_err(|e| match e {
        Error::AlreadyExists => ApiError::conflict("Já existe uma escola com este nome."),
        other => other.into(),
    })?;

    Ok(Json(ApiResponse::success(escola)))
}

/// POST /admin/escola/logo - multipart field `logo`
pub async fn upload_logo(
    RequireTenantAdmin(ctx): RequireTenantAdmin,
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let url = save_image(&state, UploadKind::Logos, &mut multipart, "logo").await?;

    let mut escola = ctx.escola;
    let previous = escola.logo_url.replace(url.clone());
    state
        .store
        .update_escola(&escola)
        .api_err("Falha ao atualizar o logo.")?;

    if let Some(previous) = previous {
        remove_image(&state, &previous).await;
    }

    Ok(Json(ApiResponse::success(UploadResponse { url })))
}
