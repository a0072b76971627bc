use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};

use super::agenda::remove_booking;
use super::uploads::{UploadKind, remove_image, save_image};
use crate::auth::{RequireTenant, RequireUser, hash_password, verify_password};
use crate::scheduling::{today, weekday_pt};
use crate::server::AppState;
use crate::server::dto::{
    ChangePasswordRequest, MeResponse, MessageResponse, MyBookingResponse, MyBookingsParams,
    SelectEscolaRequest, UpdateMeRequest, UploadResponse,
};
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};
use crate::server::validation::{optional_text, validate_name, validate_password};
use crate::types::{AccountState, Papel};

pub fn me_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(get_me).patch(update_me))
        .route("/password", post(change_password))
        .route("/foto", post(upload_foto))
        .route("/escolas", get(list_escolas))
        .route("/escola", post(select_escola))
        .route("/bookings", get(my_bookings))
        .route("/bookings/{id}", delete(delete_my_booking))
}

/// GET /me
pub async fn get_me(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let escolas = state
        .store
        .list_usuario_memberships(&auth.usuario.id)
        .api_err("Falha ao carregar as escolas.")?;

    let escola_id = auth.session.escola_id.clone();
    let is_admin = auth.usuario.is_superadmin
        || escolas.iter().any(|m| {
            Some(&m.membership.escola_id) == escola_id.as_ref() && m.membership.papel == Papel::Admin
        });

    Ok(Json(ApiResponse::success(MeResponse {
        usuario: auth.usuario,
        escolas,
        escola_id,
        is_admin,
    })))
}

/// PATCH /me
pub async fn update_me(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdateMeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut usuario = auth.usuario;

    if let Some(nome) = req.nome {
        usuario.nome = validate_name(&nome, "O nome")?;
    }
    if req.nome_curto.is_some() {
        usuario.nome_curto = optional_text(req.nome_curto);
    }

    state
        .store
        .update_usuario(&usuario)
        .api_err("Falha ao atualizar o perfil.")?;

    Ok(Json(ApiResponse::success(usuario)))
}

/// POST /me/password
pub async fn change_password(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut usuario = auth.usuario;

    if let Some(hash) = usuario.account_state.password_hash() {
        let current = req.current_password.as_deref().unwrap_or_default();
        if !verify_password(current, hash).api_err("Falha ao verificar a senha.")? {
            return Err(ApiError::bad_request("Senha atual incorreta."));
        }
    }

    validate_password(&req.new_password, Some(&req.confirm_password))?;

    let password_hash = hash_password(&req.new_password).api_err("Falha ao processar a senha.")?;
    usuario.account_state = AccountState::Active { password_hash };
    state
        .store
        .update_usuario(&usuario)
        .api_err("Falha ao atualizar a senha.")?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Senha alterada com sucesso!",
    ))))
}

/// POST /me/foto - multipart field `foto`
pub async fn upload_foto(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let url = save_image(&state, UploadKind::Perfil, &mut multipart, "foto").await?;

    let mut usuario = auth.usuario;
    let previous = usuario.foto_perfil.replace(url.clone());
    state
        .store
        .update_usuario(&usuario)
        .api_err("Falha ao atualizar a foto.")?;

    if let Some(previous) = previous {
        remove_image(&state, &previous).await;
    }

    Ok(Json(ApiResponse::success(UploadResponse { url })))
}

/// GET /me/escolas
pub async fn list_escolas(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let escolas = state
        .store
        .list_usuario_memberships(&auth.usuario.id)
        .api_err("Falha ao carregar as escolas.")?;

    Ok(Json(ApiResponse::success(escolas)))
}

/// POST /me/escola - Choose the school this session acts in
pub async fn select_escola(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<SelectEscolaRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let escola = state
        .store
        .get_escola(&req.escola_id)
        .api_err("Falha ao carregar a escola.")?
        .or_not_found("Escola não encontrada.")?;

    if !auth.usuario.is_superadmin {
        let tenant = crate::types::TenantId::from_escola(&escola);
        state
            .store
            .get_membership(&tenant, &auth.usuario.id)
            .api_err("Falha ao verificar a escola.")?
            .ok_or_else(|| ApiError::forbidden("Você não pertence a esta escola."))?;

        if !escola.is_active() {
            return Err(ApiError::forbidden("Esta escola está inativa."));
        }
    }

    state
        .store
        .set_session_escola(&auth.session.id, Some(&escola.id))
        .api_err("Falha ao selecionar a escola.")?;

    Ok(Json(ApiResponse::success(escola)))
}

/// GET /me/bookings
pub async fn my_bookings(
    RequireTenant(ctx): RequireTenant,
    State(state): State<Arc<AppState>>,
    Query(params): Query<MyBookingsParams>,
) -> Result<impl IntoResponse, ApiError> {
    let from = if params.all.unwrap_or(false) {
        None
    } else {
        Some(today())
    };

    let bookings = state
        .store
        .list_usuario_bookings(&ctx.tenant, &ctx.usuario.id, from)
        .api_err("Falha ao listar os agendamentos.")?;

    let response: Vec<MyBookingResponse> = bookings
        .into_iter()
        .map(|b| MyBookingResponse {
            weekday: weekday_pt(b.booking.date),
            date_formatted: b.booking.date.format("%d/%m/%Y").to_string(),
            booking: b,
        })
        .collect();

    Ok(Json(ApiResponse::success(response)))
}

/// DELETE /me/bookings/{id}
pub async fn delete_my_booking(
    RequireTenant(ctx): RequireTenant,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    remove_booking(&state, &ctx, &id)?;
    Ok(StatusCode::NO_CONTENT)
}
