use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;
use tracing::{info, warn};

use crate::auth::{
    RequireUser, hash_password, issue_email_token, issue_session, redeem_email_token,
    verify_password,
};
use crate::error::Error;
use crate::mail::{self, deliver};
use crate::oauth::{self, OAuthProvider, Provider};
use crate::server::AppState;
use crate::server::dto::{
    AcceptInviteRequest, EmailRequest, LoginRequest, LoginResponse, MessageResponse,
    OAuthCallbackParams, OAuthStartResponse, RegisterRequest, RegisterResponse,
    ResetPasswordRequest, TokenRequest,
};
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};
use crate::server::validation::{optional_text, validate_email, validate_name, validate_password};
use crate::types::{
    AccountState, EmailTokenPurpose, Escola, EscolaStatus, Papel, TenantId, Usuario,
};

const INVALID_CREDENTIALS: &str = "E-mail ou senha inválidos.";

pub fn auth_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register))
        .route("/confirm", post(confirm_email))
        .route("/resend-confirmation", post(resend_confirmation))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
        .route("/invite/accept", post(accept_invite))
        .route("/oauth/{provider}/start", get(oauth_start))
        .route("/oauth/{provider}/callback", get(oauth_callback))
}

/// Issues a link token and mails it. Failures are logged, never returned.
pub(crate) fn send_token_mail<F>(state: &AppState, usuario: &Usuario, purpose: EmailTokenPurpose, build: F)
where
    F: FnOnce(&str, &str) -> mail::EmailMessage,
{
    match issue_email_token(state.store.as_ref(), &usuario.id, purpose) {
        Ok(token) => {
            deliver(state.mailer.as_ref(), &build(&state.public_base_url, &token));
        }
        Err(e) => warn!(usuario_id = %usuario.id, error = %e, "failed to issue email token"),
    }
}

/// Opens a session for the user with their first school preselected.
pub(crate) fn start_session(state: &AppState, usuario: Usuario) -> Result<LoginResponse, ApiError> {
    let memberships = state
        .store
        .list_usuario_memberships(&usuario.id)
        .api_err("Falha ao carregar as escolas do usuário.")?;

    let escola_id = memberships
        .iter()
        .find(|m| m.escola_status == EscolaStatus::Ativo)
        .or_else(|| memberships.first())
        .map(|m| m.membership.escola_id.clone());

    let token = issue_session(
        state.store.as_ref(),
        &usuario.id,
        escola_id.as_deref(),
        state.session_ttl,
    )
    .api_err("Falha ao criar a sessão.")?;

    Ok(LoginResponse {
        token,
        usuario,
        escola_id,
        expires_at: Utc::now() + state.session_ttl,
    })
}

/// POST /auth/register - Found a school with its first admin
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let escola_nome = validate_name(&req.escola_nome, "O nome da escola")?;
    let nome = validate_name(&req.nome, "O nome")?;
    let email = validate_email(&req.email)?;
    validate_password(&req.password, None)?;

    if state
        .store
        .get_usuario_by_email(&email)
        .api_err("Falha ao verificar o e-mail.")?
        .is_some()
    {
        return Err(ApiError::conflict("O e-mail informado já está cadastrado."));
    }

    let now = Utc::now();
    let mut escola = Escola {
        id: uuid::Uuid::new_v4().to_string(),
        nome: escola_nome,
        status: EscolaStatus::Ativo,
        cep: None,
        logradouro: None,
        numero: None,
        complemento: None,
        bairro: None,
        cidade: None,
        uf: None,
        logo_url: None,
        created_at: now,
    };
    escola.set_endereco(req.endereco);

    state.store.create_escola(&escola).map_err(|e| match e {
        Error::AlreadyExists => ApiError::conflict("Já existe uma escola com este nome."),
        other => other.into(),
    })?;

    let password_hash = hash_password(&req.password).api_err("Falha ao processar a senha.")?;
    let usuario = Usuario {
        id: uuid::Uuid::new_v4().to_string(),
        nome,
        nome_curto: optional_text(req.nome_curto),
        email,
        account_state: AccountState::Active { password_hash },
        is_superadmin: false,
        email_confirmado: false,
        foto_perfil: None,
        created_at: now,
        updated_at: now,
    };

    let tenant = TenantId::from_escola(&escola);
    let created = state.store.create_usuario(&usuario).and_then(|()| {
        state
            .store
            .add_membership(&tenant, &usuario.id, Papel::Admin, None)
    });
    if let Err(e) = created {
        // Leave no orphan school behind
        if let Err(cleanup) = state.store.delete_escola(&escola.id) {
            warn!(escola_id = %escola.id, error = %cleanup, "failed to roll back school");
        }
        return Err(e.into());
    }

    info!(escola_id = %escola.id, usuario_id = %usuario.id, "school registered");

    send_token_mail(&state, &usuario, EmailTokenPurpose::ConfirmEmail, |base, token| {
        mail::confirmation_email(base, &usuario, token)
    });

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(RegisterResponse { escola, usuario })),
    ))
}

/// POST /auth/confirm
pub async fn confirm_email(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TokenRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let token = redeem_email_token(
        state.store.as_ref(),
        &req.token,
        EmailTokenPurpose::ConfirmEmail,
    )?;

    let mut usuario = state.store.get_usuario(&token.usuario_id)?.ok_or_else(|| {
        ApiError::bad_request("Link inválido ou expirado.")
    })?;
    usuario.email_confirmado = true;
    state.store.update_usuario(&usuario)?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "E-mail confirmado com sucesso! Você já pode fazer login.",
    ))))
}

/// POST /auth/resend-confirmation
pub async fn resend_confirmation(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EmailRequest>,
) -> impl IntoResponse {
    if let Ok(email) = validate_email(&req.email) {
        match state.store.get_usuario_by_email(&email) {
            Ok(Some(usuario)) if !usuario.email_confirmado => {
                send_token_mail(&state, &usuario, EmailTokenPurpose::ConfirmEmail, |base, token| {
                    mail::confirmation_email(base, &usuario, token)
                });
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "failed to look up user for confirmation resend"),
        }
    }

    Json(ApiResponse::success(MessageResponse::new(
        "Se o e-mail estiver cadastrado e pendente de confirmação, um novo link foi enviado.",
    )))
}

/// POST /auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = validate_email(&req.email).map_err(|_| ApiError::unauthorized(INVALID_CREDENTIALS))?;

    let usuario = state
        .store
        .get_usuario_by_email(&email)
        .api_err("Falha ao verificar as credenciais.")?
        .ok_or_else(|| ApiError::unauthorized(INVALID_CREDENTIALS))?;

    let Some(hash) = usuario.account_state.password_hash() else {
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    };
    if !verify_password(&req.password, hash).api_err("Falha ao verificar as credenciais.")? {
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    }

    if !usuario.email_confirmado {
        return Err(ApiError::forbidden(
            "Confirme seu e-mail antes de fazer login.",
        ));
    }

    let response = start_session(&state, usuario)?;
    Ok(Json(ApiResponse::success(response)))
}

/// POST /auth/logout
pub async fn logout(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .store
        .delete_session(&auth.session.id)
        .api_err("Falha ao encerrar a sessão.")?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /auth/forgot-password
pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EmailRequest>,
) -> impl IntoResponse {
    if let Ok(email) = validate_email(&req.email) {
        match state.store.get_usuario_by_email(&email) {
            Ok(Some(usuario)) => {
                send_token_mail(&state, &usuario, EmailTokenPurpose::ResetPassword, |base, token| {
                    mail::password_reset_email(base, &usuario, token)
                });
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "failed to look up user for password reset"),
        }
    }

    Json(ApiResponse::success(MessageResponse::new(
        "Se um usuário com este e-mail existir em nosso sistema, um link de redefinição de senha foi enviado.",
    )))
}

/// POST /auth/reset-password
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_password(&req.new_password, Some(&req.confirm_password))?;

    let token = redeem_email_token(
        state.store.as_ref(),
        &req.token,
        EmailTokenPurpose::ResetPassword,
    )?;
    let mut usuario = state
        .store
        .get_usuario(&token.usuario_id)?
        .ok_or_else(|| ApiError::bad_request("Link inválido ou expirado."))?;

    let password_hash = hash_password(&req.new_password).api_err("Falha ao processar a senha.")?;
    usuario.account_state = AccountState::Active { password_hash };
    usuario.email_confirmado = true;
    state.store.update_usuario(&usuario)?;

    if let Err(e) = state.store.delete_usuario_sessions(&usuario.id) {
        warn!(usuario_id = %usuario.id, error = %e, "failed to revoke sessions after reset");
    }

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Sua senha foi redefinida com sucesso! Você já pode fazer login.",
    ))))
}

/// POST /auth/invite/accept
pub async fn accept_invite(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AcceptInviteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_password(&req.password, req.confirm_password.as_deref())?;

    let token = redeem_email_token(state.store.as_ref(), &req.token, EmailTokenPurpose::Invite)?;
    let mut usuario = state
        .store
        .get_usuario(&token.usuario_id)?
        .ok_or_else(|| ApiError::bad_request("Link inválido ou expirado."))?;

    let password_hash = hash_password(&req.password).api_err("Falha ao processar a senha.")?;
    usuario.account_state = AccountState::Active { password_hash };
    usuario.email_confirmado = true;
    state.store.update_usuario(&usuario)?;

    info!(usuario_id = %usuario.id, "invitation accepted");

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Conta ativada com sucesso! Você já pode fazer login.",
    ))))
}

fn oauth_provider<'a>(state: &'a AppState, name: &str) -> Result<&'a OAuthProvider, ApiError> {
    let provider = Provider::parse(name)
        .ok_or_else(|| ApiError::not_found("Provedor de login não suportado."))?;
    state
        .oauth
        .get(provider)
        .ok_or_else(|| ApiError::not_found(format!("Login com {provider} não está configurado.")))
}

fn oauth_redirect_uri(state: &AppState, provider: Provider) -> String {
    format!(
        "{}/api/v1/auth/oauth/{}/callback",
        state.public_base_url, provider
    )
}

/// GET /auth/oauth/{provider}/start
pub async fn oauth_start(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let provider = oauth_provider(&state, &provider)?;
    let redirect_uri = oauth_redirect_uri(&state, provider.provider);

    let authorization_url = oauth::start(state.store.as_ref(), provider, &redirect_uri)
        .api_err("Falha ao iniciar o login.")?;

    Ok(Json(ApiResponse::success(OAuthStartResponse {
        authorization_url,
    })))
}

/// GET /auth/oauth/{provider}/callback
pub async fn oauth_callback(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
    Query(params): Query<OAuthCallbackParams>,
) -> Result<impl IntoResponse, ApiError> {
    let provider = oauth_provider(&state, &provider)?;
    let redirect_uri = oauth_redirect_uri(&state, provider.provider);

    let usuario = oauth::callback(
        state.store.as_ref(),
        &state.http,
        provider,
        &params.code,
        &params.state,
        &redirect_uri,
    )
    .await
    .map_err(|e| match e {
        Error::Unauthorized => {
            ApiError::bad_request("Sessão de login expirada. Tente novamente.")
        }
        Error::Forbidden => ApiError::forbidden(
            "Nenhuma conta encontrada para este e-mail. Peça um convite ao administrador da sua escola.",
        ),
        other => {
            warn!(provider = %provider.provider, error = %other, "oauth callback failed");
            ApiError::bad_gateway("Não foi possível concluir o login. Tente novamente.")
        }
    })?;

    let response = start_session(&state, usuario)?;
    Ok(Json(ApiResponse::success(response)))
}
