use std::sync::Arc;

use axum::{
    Json,
    extract::FromRequestParts,
    http::{HeaderValue, StatusCode, header::AUTHORIZATION, header::WWW_AUTHENTICATE, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;

use super::helpers::{TokenValidationError, extract_token_from_header, validate_session};
use crate::server::AppState;
use crate::types::{Escola, Papel, Session, TenantId, Usuario};

/// Extractor that requires any valid session
pub struct RequireUser {
    pub session: Session,
    pub usuario: Usuario,
}

/// A session bound to the school it selected.
pub struct TenantContext {
    pub session: Session,
    pub usuario: Usuario,
    pub escola: Escola,
    pub tenant: TenantId,
    /// None for superadmins acting in a school they are not a member of.
    pub papel: Option<Papel>,
}

impl TenantContext {
    /// Admin rights inside this school.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.usuario.is_superadmin || self.papel == Some(Papel::Admin)
    }
}

/// Extractor that requires a session with a selected school the user belongs to
pub struct RequireTenant(pub TenantContext);

/// Extractor that requires admin rights in the selected school
pub struct RequireTenantAdmin(pub TenantContext);

/// Extractor that requires a superadmin session
pub struct RequireSuperadmin {
    pub session: Session,
    pub usuario: Usuario,
}

#[derive(Debug)]
pub enum AuthError {
    MissingAuth,
    InvalidScheme,
    InvalidToken,
    TokenExpired,
    NoSchoolSelected,
    NotMember,
    SchoolInactive,
    NotAdmin,
    NotSuperadmin,
    InternalError,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingAuth => (StatusCode::UNAUTHORIZED, "Autenticação necessária."),
            AuthError::InvalidScheme => (
                StatusCode::UNAUTHORIZED,
                "Esquema de autorização inválido.",
            ),
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "Sessão inválida."),
            AuthError::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                "Sessão expirada. Faça login novamente.",
            ),
            AuthError::NoSchoolSelected => (StatusCode::BAD_REQUEST, "Nenhuma escola selecionada."),
            AuthError::NotMember => (
                StatusCode::FORBIDDEN,
                "Você não pertence a esta escola.",
            ),
            AuthError::SchoolInactive => (StatusCode::FORBIDDEN, "Esta escola está inativa."),
            AuthError::NotAdmin => (StatusCode::FORBIDDEN, "Acesso negado."),
            AuthError::NotSuperadmin => (
                StatusCode::FORBIDDEN,
                "Acesso restrito ao super administrador.",
            ),
            AuthError::InternalError => (StatusCode::INTERNAL_SERVER_ERROR, "Erro interno."),
        };

        let body = json!({ "data": null, "error": message });

        let mut response = (status, Json(body)).into_response();

        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                WWW_AUTHENTICATE,
                HeaderValue::from_static("Bearer realm=\"agenda\""),
            );
        }

        response
    }
}

impl FromRequestParts<Arc<AppState>> for RequireUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let (session, usuario) = extract_and_validate_session(parts, state)?;
        Ok(RequireUser { session, usuario })
    }
}

impl FromRequestParts<Arc<AppState>> for RequireTenant {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let (session, usuario) = extract_and_validate_session(parts, state)?;
        tenant_context(state, session, usuario).map(RequireTenant)
    }
}

impl FromRequestParts<Arc<AppState>> for RequireTenantAdmin {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let (session, usuario) = extract_and_validate_session(parts, state)?;
        let ctx = tenant_context(state, session, usuario)?;

        if !ctx.is_admin() {
            return Err(AuthError::NotAdmin);
        }

        Ok(RequireTenantAdmin(ctx))
    }
}

impl FromRequestParts<Arc<AppState>> for RequireSuperadmin {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let (session, usuario) = extract_and_validate_session(parts, state)?;

        if !usuario.is_superadmin {
            return Err(AuthError::NotSuperadmin);
        }

        Ok(RequireSuperadmin { session, usuario })
    }
}

fn tenant_context(
    state: &Arc<AppState>,
    session: Session,
    usuario: Usuario,
) -> Result<TenantContext, AuthError> {
    let escola_id = session
        .escola_id
        .clone()
        .ok_or(AuthError::NoSchoolSelected)?;

    let escola = state
        .store
        .get_escola(&escola_id)
        .map_err(|_| AuthError::InternalError)?
        .ok_or(AuthError::NoSchoolSelected)?;

    let tenant = TenantId::from_escola(&escola);
    let membership = state
        .store
        .get_membership(&tenant, &usuario.id)
        .map_err(|_| AuthError::InternalError)?;

    if !usuario.is_superadmin {
        if membership.is_none() {
            return Err(AuthError::NotMember);
        }
        if !escola.is_active() {
            return Err(AuthError::SchoolInactive);
        }
    }

    Ok(TenantContext {
        session,
        usuario,
        escola,
        tenant,
        papel: membership.map(|m| m.papel),
    })
}

fn extract_and_validate_session(
    parts: &Parts,
    state: &Arc<AppState>,
) -> Result<(Session, Usuario), AuthError> {
    let auth_header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let raw_token = extract_token_from_header(auth_header)
        .map_err(|e| match e {
            TokenValidationError::InvalidScheme => AuthError::InvalidScheme,
            TokenValidationError::InvalidToken => AuthError::InvalidToken,
            _ => AuthError::InternalError,
        })?
        .ok_or(AuthError::MissingAuth)?;

    let validated = validate_session(state.store.as_ref(), &raw_token).map_err(|e| match e {
        TokenValidationError::InvalidScheme => AuthError::InvalidScheme,
        TokenValidationError::InvalidToken => AuthError::InvalidToken,
        TokenValidationError::TokenExpired => AuthError::TokenExpired,
        TokenValidationError::InternalError => AuthError::InternalError,
    })?;

    Ok((validated.session, validated.usuario))
}
