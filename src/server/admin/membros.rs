use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use tracing::info;

use crate::auth::{RequireTenantAdmin, TenantContext, hash_password};
use crate::error::Error;
use crate::mail;
use crate::server::AppState;
use crate::server::auth::send_token_mail;
use crate::server::dto::{CreateMembroRequest, MembroResponse, MessageResponse, UpdateMembroRequest};
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};
use crate::server::validation::{optional_text, validate_email, validate_name, validate_password};
use crate::types::{AccountState, EmailTokenPurpose, Membro, Papel, Usuario, UsuarioEscola};

fn load_member(
    state: &AppState,
    ctx: &TenantContext,
    usuario_id: &str,
) -> Result<(UsuarioEscola, Usuario), ApiError> {
    let membership = state
        .store
        .get_membership(&ctx.tenant, usuario_id)
        .api_err("Falha ao carregar o membro.")?
        .or_not_found("Membro não encontrado.")?;
    let usuario = state
        .store
        .get_usuario(usuario_id)
        .api_err("Falha ao carregar o membro.")?
        .or_not_found("Membro não encontrado.")?;

    Ok((membership, usuario))
}

fn assign_disciplinas(
    state: &AppState,
    ctx: &TenantContext,
    usuario_id: &str,
    disciplina_ids: &[String],
) -> Result<(), ApiError> {
    state
        .store
        .set_membro_disciplinas(&ctx.tenant, usuario_id, disciplina_ids)
        .map_err(|e| match e {
            Error::NotFound => ApiError::bad_request("Disciplina inválida."),
            other => other.into(),
        })
}

/// Accounts that reach beyond this school: the super admin, or a user who
/// also belongs to another school.
fn is_shared_account(state: &AppState, usuario: &Usuario) -> Result<bool, ApiError> {
    if usuario.is_superadmin {
        return Ok(true);
    }
    let memberships = state
        .store
        .count_usuario_memberships(&usuario.id)
        .api_err("Falha ao verificar as escolas do usuário.")?;
    Ok(memberships > 1)
}

fn membro_response(
    state: &AppState,
    ctx: &TenantContext,
    membro: Membro,
) -> Result<MembroResponse, ApiError> {
    let disciplinas = state
        .store
        .list_membro_disciplinas(&ctx.tenant, &membro.usuario.id)
        .api_err("Falha ao carregar as disciplinas.")?;

    Ok(MembroResponse { membro, disciplinas })
}

/// GET /admin/membros
pub async fn list_membros(
    RequireTenantAdmin(ctx): RequireTenantAdmin,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let membros = state
        .store
        .list_membros(&ctx.tenant)
        .api_err("Falha ao listar os membros.")?;

    let response = membros
        .into_iter()
        .map(|m| membro_response(&state, &ctx, m))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(ApiResponse::success(response)))
}

/// POST /admin/membros - Add a member, creating or inviting the user as needed
pub async fn create_membro(
    RequireTenantAdmin(ctx): RequireTenantAdmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateMembroRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let nome = validate_name(&req.nome, "O nome")?;
    let email = validate_email(&req.email)?;
    let papel = req.papel.unwrap_or(Papel::Professor);
    let matricula = optional_text(req.matricula);
    let password = req.password.filter(|p| !p.is_empty());
    if let Some(password) = password.as_deref() {
        validate_password(password, None)?;
    }

    let existing = state
        .store
        .get_usuario_by_email(&email)
        .api_err("Falha ao verificar o e-mail.")?;

    let usuario = match existing {
        // Only the super admin may attach an account that already exists
        Some(_) if !ctx.usuario.is_superadmin => {
            return Err(Error::EmailTaken.into());
        }
        Some(usuario) => {
            if state
                .store
                .get_membership(&ctx.tenant, &usuario.id)
                .api_err("Falha ao verificar o membro.")?
                .is_some()
            {
                return Err(ApiError::conflict("Este usuário já pertence à escola."));
            }
            state
                .store
                .add_membership(&ctx.tenant, &usuario.id, papel, matricula.as_deref())?;
            usuario
        }
        None => {
            let account_state = match password.as_deref() {
                Some(password) => AccountState::Active {
                    password_hash: hash_password(password)
                        .api_err("Falha ao processar a senha.")?,
                },
                None => AccountState::Invited,
            };
            let now = Utc::now();
            let usuario = Usuario {
                id: uuid::Uuid::new_v4().to_string(),
                nome,
                nome_curto: optional_text(req.nome_curto),
                email,
                email_confirmado: matches!(account_state, AccountState::Active { .. }),
                account_state,
                is_superadmin: false,
                foto_perfil: None,
                created_at: now,
                updated_at: now,
            };

            state.store.create_usuario(&usuario)?;
            state
                .store
                .add_membership(&ctx.tenant, &usuario.id, papel, matricula.as_deref())?;

            if usuario.account_state == AccountState::Invited {
                send_token_mail(&state, &usuario, EmailTokenPurpose::Invite, |base, token| {
                    mail::invitation_email(base, &usuario, &ctx.escola.nome, token)
                });
            }
            usuario
        }
    };

    assign_disciplinas(&state, &ctx, &usuario.id, &req.disciplina_ids)?;

    info!(
        escola_id = %ctx.tenant,
        usuario_id = %usuario.id,
        papel = papel.as_str(),
        "member added"
    );

    let response = membro_response(
        &state,
        &ctx,
        Membro {
            usuario,
            papel,
            matricula,
        },
    )?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(response))))
}

/// PATCH /admin/membros/{usuario_id}
pub async fn update_membro(
    RequireTenantAdmin(ctx): RequireTenantAdmin,
    State(state): State<Arc<AppState>>,
    Path(usuario_id): Path<String>,
    Json(req): Json<UpdateMembroRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (membership, mut usuario) = load_member(&state, &ctx, &usuario_id)?;

    let papel = req.papel.unwrap_or(membership.papel);
    if usuario.id == ctx.usuario.id
        && papel != Papel::Admin
        && membership.papel == Papel::Admin
        && !ctx.usuario.is_superadmin
    {
        return Err(ApiError::bad_request(
            "Você não pode remover seu próprio acesso de administrador.",
        ));
    }

    let matricula = if req.matricula.is_some() {
        optional_text(req.matricula)
    } else {
        membership.matricula
    };

    let edits_identity = req.nome.is_some() || req.nome_curto.is_some() || req.email.is_some();
    if edits_identity && !ctx.usuario.is_superadmin && is_shared_account(&state, &usuario)? {
        return Err(ApiError::forbidden(
            "Os dados pessoais deste usuário só podem ser alterados por ele.",
        ));
    }

    let mut usuario_changed = false;
    if let Some(nome) = req.nome {
        usuario.nome = validate_name(&nome, "O nome")?;
        usuario_changed = true;
    }
    if req.nome_curto.is_some() {
        usuario.nome_curto = optional_text(req.nome_curto);
        usuario_changed = true;
    }
    if let Some(email) = req.email {
        usuario.email = validate_email(&email)?;
        usuario_changed = true;
    }

    if usuario_changed {
        state.store.update_usuario(&usuario)?;
    }

    state
        .store
        .update_membership(&ctx.tenant, &usuario.id, papel, matricula.as_deref())
        .api_err("Falha ao atualizar o membro.")?;

    if let Some(ids) = req.disciplina_ids.as_deref() {
        assign_disciplinas(&state, &ctx, &usuario.id, ids)?;
    }

    let response = membro_response(
        &state,
        &ctx,
        Membro {
            usuario,
            papel,
            matricula,
        },
    )?;

    Ok(Json(ApiResponse::success(response)))
}

/// DELETE /admin/membros/{usuario_id}
///
/// Removes the membership and the member's bookings in this school. A user
/// left without any school is deleted entirely.
pub async fn remove_membro(
    RequireTenantAdmin(ctx): RequireTenantAdmin,
    State(state): State<Arc<AppState>>,
    Path(usuario_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    if usuario_id == ctx.usuario.id {
        return Err(ApiError::bad_request(
            "Você não pode remover a si mesmo da escola.",
        ));
    }

    let (_, usuario) = load_member(&state, &ctx, &usuario_id)?;

    let removed = state
        .store
        .remove_membership(&ctx.tenant, &usuario.id)
        .api_err("Falha ao remover o membro.")?;
    if !removed {
        return Err(ApiError::not_found("Membro não encontrado."));
    }

    let remaining = state
        .store
        .count_usuario_memberships(&usuario.id)
        .api_err("Falha ao verificar as escolas do usuário.")?;
    if remaining == 0 && !usuario.is_superadmin {
        state
            .store
            .delete_usuario(&usuario.id)
            .api_err("Falha ao remover o usuário.")?;
        info!(usuario_id = %usuario.id, "user deleted with last membership");
    }

    info!(escola_id = %ctx.tenant, usuario_id = %usuario.id, "member removed");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /admin/membros/{usuario_id}/reset-link - Mail a password reset link
pub async fn send_reset_link(
    RequireTenantAdmin(ctx): RequireTenantAdmin,
    State(state): State<Arc<AppState>>,
    Path(usuario_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let (_, usuario) = load_member(&state, &ctx, &usuario_id)?;

    send_token_mail(&state, &usuario, EmailTokenPurpose::ResetPassword, |base, token| {
        mail::password_reset_email(base, &usuario, token)
    });

    Ok(Json(ApiResponse::success(MessageResponse::new(format!(
        "Link de redefinição de senha enviado para {}.",
        usuario.email
    )))))
}
